use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

use cricket_live::{CricketClient, ReconnectPolicy, SyncConfig};

#[tokio::main]
async fn main() -> cricket_live::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let config = SyncConfig::from_env().with_reconnect(ReconnectPolicy::default());
    let client = CricketClient::with_config(config);

    let match_id = match std::env::args().nth(1) {
        Some(id) => id,
        None => {
            let matches = client.list_matches().await?;
            for summary in &matches {
                println!(
                    "{:>8}  {}  {}  {}",
                    summary.match_id, summary.teams, summary.score, summary.status
                );
            }
            let Some(first) = matches.into_iter().next() else {
                println!("No matches right now");
                return Ok(());
            };
            first.match_id
        }
    };

    let mut live = client.subscribe(&match_id).await?;
    let (home, away) = live.current().team_names();
    println!("Following {home} vs {away}");

    let mut view = live.watch();
    let mut events = live.events();
    loop {
        tokio::select! {
            _ = tokio::signal::ctrl_c() => break,
            changed = view.changed() => {
                if changed.is_err() {
                    break;
                }
                let model = view.borrow_and_update().clone();
                println!(
                    "[{}] {}  {}  CRR {}  {}",
                    live.connection_state(),
                    model.teams,
                    model.score,
                    model.run_rate,
                    model.status,
                );
            }
            event = events.recv() => match event {
                Ok(event) => println!("*** {} ***", event.kind.to_uppercase()),
                Err(RecvError::Lagged(missed)) => println!("({missed} events missed)"),
                Err(RecvError::Closed) => break,
            },
        }
    }

    live.unsubscribe().await;
    Ok(())
}
