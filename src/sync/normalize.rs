//! Adapts every payload shape the cricket backends emit to [`MatchUpdate`].
//!
//! Both the stream and the snapshot endpoint go through here, so the
//! reconciler only ever sees one schema. Empty strings and empty lists are
//! treated as absent.

use itertools::Itertools;
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::warn;

use crate::error::{Result, SyncError};
use crate::model::{
    BattingRow, BowlingRow, LogosUpdate, MatchSummary, MatchUpdate, ScorecardUpdate,
    SquadsUpdate, TEAMS_DELIMITER,
};

/// Parse one raw stream message into an update.
pub fn parse_update(raw: &str) -> Result<MatchUpdate> {
    let value: Value = serde_json::from_str(raw).map_err(|e| SyncError::Json {
        context: "update",
        source: e,
    })?;
    update_from_value(value)
}

/// Normalize an already-decoded JSON payload.
pub fn update_from_value(value: Value) -> Result<MatchUpdate> {
    let Value::Object(object) = value else {
        return Err(SyncError::format("update", "expected a JSON object"));
    };
    let body = unwrap_envelope(object);
    let raw: RawUpdate =
        serde_json::from_value(Value::Object(body)).map_err(|e| SyncError::Json {
            context: "update",
            source: e,
        })?;
    Ok(raw.into_update())
}

/// Parse a `/matches/{id}` response body.
///
/// Some deployments answer unknown ids with `200 {"error": "Match not found"}`
/// instead of a 404.
pub(crate) fn parse_snapshot(body: &str, url: &str) -> Result<MatchUpdate> {
    let value: Value = serde_json::from_str(body).map_err(|e| SyncError::Json {
        context: "snapshot",
        source: e,
    })?;
    if let Some(message) = service_error(&value) {
        if message.to_lowercase().contains("not found") {
            return Err(SyncError::NotFound {
                url: url.to_owned(),
            });
        }
        return Err(SyncError::format("snapshot", message));
    }
    update_from_value(value)
}

/// Parse a `/matches/{id}/commentary` body: `{"commentary": [...]}` or a bare list.
pub(crate) fn parse_commentary(body: &str) -> Result<Vec<String>> {
    let value: Value = serde_json::from_str(body).map_err(|e| SyncError::Json {
        context: "commentary",
        source: e,
    })?;
    let items = match value {
        Value::Array(items) => items,
        Value::Object(mut object) => match object.remove("commentary") {
            Some(Value::Array(items)) => items,
            Some(Value::Null) | None => Vec::new(),
            Some(_) => return Err(SyncError::format("commentary", "expected a list")),
        },
        _ => return Err(SyncError::format("commentary", "expected a list")),
    };
    let lines: Vec<RawCommentary> =
        serde_json::from_value(Value::Array(items)).map_err(|e| SyncError::Json {
            context: "commentary",
            source: e,
        })?;
    Ok(commentary_lines(lines))
}

/// Parse the `/matches` list. Anything but a JSON array yields no matches.
pub(crate) fn parse_match_list(body: &str) -> Result<Vec<MatchSummary>> {
    let value: Value = serde_json::from_str(body).map_err(|e| SyncError::Json {
        context: "match list",
        source: e,
    })?;
    let Value::Array(items) = value else {
        warn!("match list is not an array, treating as empty");
        return Ok(Vec::new());
    };
    let matches = items
        .into_iter()
        .map(|item| match item {
            Value::Object(mut object) => match object.remove("matchInfo") {
                Some(Value::Object(info)) => Value::Object(info),
                _ => Value::Object(object),
            },
            other => other,
        })
        .filter_map(|item| match serde_json::from_value::<RawSummary>(item) {
            Ok(raw) => Some(raw.into_summary()),
            Err(e) => {
                warn!(error = %e, "skipping malformed match list entry");
                None
            }
        })
        .collect_vec();
    Ok(matches)
}

fn service_error(value: &Value) -> Option<String> {
    let object = value.as_object()?;
    if object.contains_key("matchId") || object.contains_key("teams") {
        return None;
    }
    object
        .get("error")
        .or_else(|| object.get("message"))
        .and_then(Value::as_str)
        .map(str::to_owned)
}

/// Strip `{"type": ..., "data": {...}}` and `{"matchData": {...}}` wrappers.
fn unwrap_envelope(mut object: Map<String, Value>) -> Map<String, Value> {
    if let Some(Value::Object(data)) = object.get("matchData") {
        return data.clone();
    }
    let kind = object.get("type").and_then(Value::as_str).map(str::to_owned);
    match (kind.as_deref(), object.remove("data")) {
        (Some("commentary_update"), Some(Value::Object(mut data))) => {
            let mut body = Map::new();
            if let Some(commentary) = data.remove("commentary") {
                body.insert("commentary".to_owned(), commentary);
            }
            body
        }
        (Some(_), Some(Value::Object(data))) => data,
        (_, Some(data)) => {
            object.insert("data".to_owned(), data);
            object
        }
        (_, None) => object,
    }
}

/// A display value that some backends send as a number.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Text(String),
    Int(i64),
    Float(f64),
    Bool(bool),
}

impl Scalar {
    fn into_string(self) -> String {
        match self {
            Scalar::Text(s) => s,
            Scalar::Int(i) => i.to_string(),
            Scalar::Float(f) => f.to_string(),
            Scalar::Bool(b) => b.to_string(),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawTeams {
    Label(String),
    Pair { team1: String, team2: String },
}

impl RawTeams {
    fn into_label(self) -> String {
        match self {
            RawTeams::Label(label) => label,
            RawTeams::Pair { team1, team2 } => format!("{team1}{TEAMS_DELIMITER}{team2}"),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawScore {
    Display(Scalar),
    Detailed {
        runs: Scalar,
        wickets: Option<Scalar>,
        overs: Option<Scalar>,
    },
}

impl RawScore {
    fn into_display(self) -> String {
        match self {
            RawScore::Display(s) => s.into_string(),
            RawScore::Detailed {
                runs,
                wickets,
                overs,
            } => {
                let mut score = runs.into_string();
                if let Some(wickets) = wickets {
                    score = format!("{score}/{}", wickets.into_string());
                }
                if let Some(overs) = overs {
                    score = format!("{score} ({})", overs.into_string());
                }
                score
            }
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawCommentary {
    Line(String),
    Entry { text: String, over: Option<Scalar> },
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawLogos {
    team1: Option<String>,
    team2: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawScorecard {
    batting: Option<Vec<RawBattingRow>>,
    bowling: Option<Vec<RawBowlingRow>>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawBattingRow {
    name: Option<Scalar>,
    team: Option<Scalar>,
    #[serde(alias = "status")]
    dismissal: Option<Scalar>,
    runs: Option<Scalar>,
    balls: Option<Scalar>,
    fours: Option<Scalar>,
    sixes: Option<Scalar>,
    #[serde(alias = "sr")]
    strike_rate: Option<Scalar>,
}

impl From<RawBattingRow> for BattingRow {
    fn from(raw: RawBattingRow) -> Self {
        Self {
            name: display(raw.name),
            team: display(raw.team),
            dismissal: display(raw.dismissal),
            runs: display(raw.runs),
            balls: display(raw.balls),
            fours: display(raw.fours),
            sixes: display(raw.sixes),
            strike_rate: display(raw.strike_rate),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawBowlingRow {
    name: Option<Scalar>,
    team: Option<Scalar>,
    overs: Option<Scalar>,
    maidens: Option<Scalar>,
    runs: Option<Scalar>,
    wickets: Option<Scalar>,
    #[serde(alias = "noballs")]
    no_balls: Option<Scalar>,
    wides: Option<Scalar>,
    #[serde(alias = "econ")]
    economy: Option<Scalar>,
}

impl From<RawBowlingRow> for BowlingRow {
    fn from(raw: RawBowlingRow) -> Self {
        Self {
            name: display(raw.name),
            team: display(raw.team),
            overs: display(raw.overs),
            maidens: display(raw.maidens),
            runs: display(raw.runs),
            wickets: display(raw.wickets),
            no_balls: display(raw.no_balls),
            wides: display(raw.wides),
            economy: display(raw.economy),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawUpdate {
    #[serde(alias = "match_id")]
    match_id: Option<Scalar>,
    teams: Option<RawTeams>,
    score: Option<RawScore>,
    #[serde(alias = "run_rate")]
    run_rate: Option<Scalar>,
    crr: Option<Scalar>,
    status: Option<Scalar>,
    series: Option<Scalar>,
    venue: Option<Scalar>,
    recent_overs: Option<Scalar>,
    logos: Option<RawLogos>,
    commentary: Option<Vec<RawCommentary>>,
    scorecard: Option<RawScorecard>,
    batting_stats: Option<Vec<RawBattingRow>>,
    bowling_stats: Option<Vec<RawBowlingRow>>,
    squads: Option<Map<String, Value>>,
    last_event: Option<String>,
    event: Option<String>,
}

impl RawUpdate {
    fn into_update(self) -> MatchUpdate {
        let logos = self.logos.and_then(|logos| {
            let update = LogosUpdate {
                team1: logos.team1.and_then(non_empty),
                team2: logos.team2.and_then(non_empty),
            };
            (update != LogosUpdate::default()).then_some(update)
        });

        let (batting, bowling) = match self.scorecard {
            Some(card) => (card.batting, card.bowling),
            None => (None, None),
        };
        let scorecard = ScorecardUpdate {
            batting: rows(batting.or(self.batting_stats)),
            bowling: rows(bowling.or(self.bowling_stats)),
        };
        let scorecard = (scorecard != ScorecardUpdate::default()).then_some(scorecard);

        let teams = self.teams.map(RawTeams::into_label).and_then(non_empty);
        let squads = self
            .squads
            .and_then(|map| squads_update(map, teams.as_deref()));

        MatchUpdate {
            match_id: text(self.match_id),
            teams,
            score: self.score.map(RawScore::into_display).and_then(non_empty),
            run_rate: text(self.run_rate).or_else(|| text(self.crr)),
            status: text(self.status),
            series: text(self.series),
            venue: text(self.venue),
            recent_overs: text(self.recent_overs),
            logos,
            commentary: self.commentary.map(commentary_lines).and_then(non_empty_list),
            scorecard,
            squads,
            last_event: self
                .last_event
                .and_then(non_empty)
                .or_else(|| self.event.and_then(non_empty)),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct RawSummary {
    #[serde(alias = "id")]
    match_id: Option<Scalar>,
    teams: Option<RawTeams>,
    score: Option<RawScore>,
    status: Option<Scalar>,
}

impl RawSummary {
    fn into_summary(self) -> MatchSummary {
        MatchSummary {
            match_id: display(self.match_id),
            teams: self.teams.map(RawTeams::into_label).unwrap_or_default(),
            score: self.score.map(RawScore::into_display).unwrap_or_default(),
            status: display(self.status),
        }
    }
}

fn commentary_lines(items: Vec<RawCommentary>) -> Vec<String> {
    items
        .into_iter()
        .map(|item| match item {
            RawCommentary::Line(line) => line,
            RawCommentary::Entry {
                text,
                over: Some(over),
            } => format!("{}: {text}", over.into_string()),
            RawCommentary::Entry { text, over: None } => text,
        })
        .filter(|line| !line.trim().is_empty())
        .collect_vec()
}

/// `{team1, team2}` or `{"<team name>": [...], ...}`.
///
/// Name-keyed squads follow the order of the `teams` label when its names are
/// keys of the map, and payload order otherwise.
fn squads_update(map: Map<String, Value>, teams: Option<&str>) -> Option<SquadsUpdate> {
    let players = |value: &Value| -> Option<Vec<String>> {
        let list = value
            .as_array()?
            .iter()
            .filter_map(Value::as_str)
            .map(str::to_owned)
            .collect_vec();
        non_empty_list(list)
    };

    let update = if map.contains_key("team1") || map.contains_key("team2") {
        SquadsUpdate {
            team1: map.get("team1").and_then(players),
            team2: map.get("team2").and_then(players),
        }
    } else if let Some((home, away)) = teams
        .and_then(|label| label.split_once(TEAMS_DELIMITER))
        .map(|(home, away)| (home.trim(), away.trim()))
        .filter(|(home, away)| map.contains_key(*home) || map.contains_key(*away))
    {
        SquadsUpdate {
            team1: map.get(home).and_then(players),
            team2: map.get(away).and_then(players),
        }
    } else {
        let mut values = map.values();
        SquadsUpdate {
            team1: values.next().and_then(players),
            team2: values.next().and_then(players),
        }
    };
    (update != SquadsUpdate::default()).then_some(update)
}

fn rows<R, T: From<R>>(raw: Option<Vec<R>>) -> Option<Vec<T>> {
    raw.map(|rows| rows.into_iter().map(T::from).collect_vec())
        .and_then(non_empty_list)
}

fn display(value: Option<Scalar>) -> String {
    value.map(Scalar::into_string).unwrap_or_default()
}

fn text(value: Option<Scalar>) -> Option<String> {
    value.map(Scalar::into_string).and_then(non_empty)
}

fn non_empty(s: String) -> Option<String> {
    (!s.trim().is_empty()).then_some(s)
}

fn non_empty_list<T>(list: Vec<T>) -> Option<Vec<T>> {
    (!list.is_empty()).then_some(list)
}
