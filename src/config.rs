use std::str::FromStr;
use std::time::Duration;

use tracing::warn;

pub const DEFAULT_API_URL: &str = "https://cricket-backend-efj4.onrender.com";
pub const DEFAULT_WS_URL: &str = "wss://cricket-backend-efj4.onrender.com/matches";
/// Shortest accepted poll cadence.
pub const MIN_POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Which key carries the verb in subscribe/unsubscribe control messages.
///
/// Deployed backends disagree: some expect `{"action": "subscribe", ...}`,
/// others `{"type": "subscribe", ...}`.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, strum_macros::Display, strum_macros::EnumString,
)]
#[strum(serialize_all = "snake_case", ascii_case_insensitive)]
pub enum ControlKey {
    Action,
    #[default]
    Type,
}

/// Bounded exponential backoff for re-promoting a polling subscription back
/// to the stream.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReconnectPolicy {
    /// Attempts per outage before settling on polling for good.
    pub max_attempts: u32,
    pub initial_delay: Duration,
    pub max_delay: Duration,
}

impl ReconnectPolicy {
    /// Delay before reconnect attempt number `attempt` (zero based).
    pub fn delay_for(&self, attempt: u32) -> Duration {
        let factor = 2u32.saturating_pow(attempt);
        self.initial_delay.saturating_mul(factor).min(self.max_delay)
    }
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 5,
            initial_delay: Duration::from_secs(5),
            max_delay: Duration::from_secs(60),
        }
    }
}

/// Settings shared by the HTTP client, the stream subscriber and the
/// connection supervisor.
#[derive(Debug, Clone)]
pub struct SyncConfig {
    /// Base URL of the REST API, without a trailing slash.
    pub api_url: String,
    /// WebSocket endpoint that accepts subscribe control messages.
    pub ws_url: String,
    /// Cadence of the pull fallback.
    pub poll_interval: Duration,
    /// How long a transient event stays on the view model.
    pub event_display_window: Duration,
    pub connect_timeout: Duration,
    pub request_timeout: Duration,
    pub control_key: ControlKey,
    /// Send a second `subscribe_commentary` message after subscribing.
    pub subscribe_commentary: bool,
    /// Fetch `/matches/{id}/commentary` alongside each snapshot that lacks it.
    pub poll_commentary: bool,
    /// `None` keeps a polling subscription on polling until it is closed.
    pub reconnect: Option<ReconnectPolicy>,
    /// Capacity of the transient event broadcast buffer.
    pub event_buffer: usize,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            api_url: DEFAULT_API_URL.to_string(),
            ws_url: DEFAULT_WS_URL.to_string(),
            poll_interval: Duration::from_secs(10),
            event_display_window: Duration::from_millis(3000),
            connect_timeout: Duration::from_secs(10),
            request_timeout: Duration::from_secs(15),
            control_key: ControlKey::default(),
            subscribe_commentary: false,
            poll_commentary: false,
            reconnect: None,
            event_buffer: 16,
        }
    }
}

impl SyncConfig {
    /// Defaults overridden by `CRICKET_*` environment variables.
    ///
    /// Values that fail to parse are ignored with a warning.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut cfg = Self::default();

        if let Some(v) = lookup("CRICKET_API_URL") {
            cfg = cfg.with_api_url(v);
        }
        if let Some(v) = lookup("CRICKET_WS_URL") {
            cfg.ws_url = v;
        }
        if let Some(interval) = parse_duration(&lookup, "CRICKET_POLL_INTERVAL_MS") {
            cfg = cfg.with_poll_interval(interval);
        }
        if let Some(duration) = parse_duration(&lookup, "CRICKET_EVENT_WINDOW_MS") {
            cfg.event_display_window = duration;
        }
        if let Some(duration) = parse_duration(&lookup, "CRICKET_CONNECT_TIMEOUT_MS") {
            cfg.connect_timeout = duration;
        }
        if let Some(duration) = parse_duration(&lookup, "CRICKET_REQUEST_TIMEOUT_MS") {
            cfg.request_timeout = duration;
        }
        if let Some(key) = parse_var::<ControlKey>(&lookup, "CRICKET_CONTROL_KEY") {
            cfg.control_key = key;
        }
        if let Some(flag) = parse_var::<bool>(&lookup, "CRICKET_SUBSCRIBE_COMMENTARY") {
            cfg.subscribe_commentary = flag;
        }
        if let Some(flag) = parse_var::<bool>(&lookup, "CRICKET_POLL_COMMENTARY") {
            cfg.poll_commentary = flag;
        }

        cfg
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_ws_url(mut self, url: impl Into<String>) -> Self {
        self.ws_url = url.into();
        self
    }

    /// Intervals below [`MIN_POLL_INTERVAL`] are raised to it.
    pub fn with_poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval.max(MIN_POLL_INTERVAL);
        self
    }

    pub fn with_event_display_window(mut self, window: Duration) -> Self {
        self.event_display_window = window;
        self
    }

    pub fn with_connect_timeout(mut self, timeout: Duration) -> Self {
        self.connect_timeout = timeout;
        self
    }

    pub fn with_control_key(mut self, key: ControlKey) -> Self {
        self.control_key = key;
        self
    }

    pub fn with_commentary_subscription(mut self, enabled: bool) -> Self {
        self.subscribe_commentary = enabled;
        self
    }

    pub fn with_commentary_polling(mut self, enabled: bool) -> Self {
        self.poll_commentary = enabled;
        self
    }

    pub fn with_reconnect(mut self, policy: ReconnectPolicy) -> Self {
        self.reconnect = Some(policy);
        self
    }

    pub(crate) fn match_url(&self, match_id: &str) -> String {
        format!("{}/matches/{match_id}", self.api_url)
    }

    pub(crate) fn commentary_url(&self, match_id: &str) -> String {
        format!("{}/matches/{match_id}/commentary", self.api_url)
    }

    pub(crate) fn matches_url(&self) -> String {
        format!("{}/matches", self.api_url)
    }
}

fn parse_var<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<T> {
    let raw = lookup(key)?;
    match raw.trim().parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!(key, value = %raw, "ignoring unparsable config value");
            None
        }
    }
}

/// A millisecond count; zero is rejected like any other bad value.
fn parse_duration(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<Duration> {
    match parse_var::<u64>(lookup, key)? {
        0 => {
            warn!(key, "ignoring zero duration");
            None
        }
        ms => Some(Duration::from_millis(ms)),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_match_live_page_timings() {
        let cfg = SyncConfig::default();
        assert_eq!(cfg.poll_interval, Duration::from_secs(10));
        assert_eq!(cfg.event_display_window, Duration::from_millis(3000));
        assert!(cfg.reconnect.is_none());
        assert_eq!(cfg.control_key, ControlKey::Type);
    }

    #[test]
    fn test_env_overrides() {
        let cfg = SyncConfig::from_lookup(lookup(&[
            ("CRICKET_API_URL", "http://localhost:3001/api/"),
            ("CRICKET_POLL_INTERVAL_MS", "2500"),
            ("CRICKET_CONTROL_KEY", "Action"),
            ("CRICKET_SUBSCRIBE_COMMENTARY", "true"),
        ]));
        assert_eq!(cfg.api_url, "http://localhost:3001/api");
        assert_eq!(cfg.match_url("42"), "http://localhost:3001/api/matches/42");
        assert_eq!(cfg.poll_interval, Duration::from_millis(2500));
        assert_eq!(cfg.control_key, ControlKey::Action);
        assert!(cfg.subscribe_commentary);
    }

    #[test]
    fn test_unparsable_values_keep_defaults() {
        let cfg = SyncConfig::from_lookup(lookup(&[
            ("CRICKET_POLL_INTERVAL_MS", "soon"),
            ("CRICKET_CONTROL_KEY", "verb"),
        ]));
        assert_eq!(cfg.poll_interval, Duration::from_secs(10));
        assert_eq!(cfg.control_key, ControlKey::Type);
    }

    #[test]
    fn test_zero_durations_are_rejected() {
        let cfg = SyncConfig::from_lookup(lookup(&[
            ("CRICKET_POLL_INTERVAL_MS", "0"),
            ("CRICKET_EVENT_WINDOW_MS", "0"),
            ("CRICKET_CONNECT_TIMEOUT_MS", "0"),
            ("CRICKET_REQUEST_TIMEOUT_MS", "0"),
        ]));
        let defaults = SyncConfig::default();
        assert_eq!(cfg.poll_interval, defaults.poll_interval);
        assert_eq!(cfg.event_display_window, defaults.event_display_window);
        assert_eq!(cfg.connect_timeout, defaults.connect_timeout);
        assert_eq!(cfg.request_timeout, defaults.request_timeout);

        let cfg = SyncConfig::from_lookup(lookup(&[("CRICKET_POLL_INTERVAL_MS", "1")]));
        assert_eq!(cfg.poll_interval, MIN_POLL_INTERVAL);
        let cfg = SyncConfig::default().with_poll_interval(Duration::ZERO);
        assert_eq!(cfg.poll_interval, MIN_POLL_INTERVAL);
    }

    #[test]
    fn test_reconnect_backoff_is_bounded() {
        let policy = ReconnectPolicy {
            max_attempts: 10,
            initial_delay: Duration::from_secs(2),
            max_delay: Duration::from_secs(30),
        };
        assert_eq!(policy.delay_for(0), Duration::from_secs(2));
        assert_eq!(policy.delay_for(1), Duration::from_secs(4));
        assert_eq!(policy.delay_for(3), Duration::from_secs(16));
        assert_eq!(policy.delay_for(4), Duration::from_secs(30));
        assert_eq!(policy.delay_for(40), Duration::from_secs(30));
    }
}
