use serde::{Deserialize, Serialize};

/// Separator between the two team names in [`MatchViewModel::teams`].
pub const TEAMS_DELIMITER: &str = " vs ";
/// Team name used when the teams label cannot be split.
pub const UNKNOWN_TEAM: &str = "Unknown";
/// Image shown when the backend has no logo for a team.
pub const DEFAULT_LOGO: &str = "/cricket-ball.png";

/// The accumulated, displayable state of one match.
///
/// Every string is an opaque display value. Fields keep their last known
/// value until an update replaces them; see [`crate::sync::reconciler`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatchViewModel {
    pub match_id: String,
    /// `"TeamA vs TeamB"`.
    pub teams: String,
    pub score: String,
    pub run_rate: String,
    pub status: String,
    pub series: String,
    pub venue: String,
    pub recent_overs: String,
    pub logos: Logos,
    /// Oldest first.
    pub commentary: Vec<String>,
    pub scorecard: Scorecard,
    pub squads: Squads,
    /// Most recent transient event tag, e.g. `"wicket"` or `"six"`.
    pub last_event: Option<String>,
}

impl MatchViewModel {
    /// An empty view model for `match_id`.
    pub fn new(match_id: impl Into<String>) -> Self {
        Self {
            match_id: match_id.into(),
            ..Default::default()
        }
    }

    /// Both team names split out of the `teams` label.
    ///
    /// Falls back to `("Unknown", "Unknown")` when the label has no `" vs "`.
    pub fn team_names(&self) -> (String, String) {
        match self.teams.split_once(TEAMS_DELIMITER) {
            Some((home, away)) => (home.trim().to_string(), away.trim().to_string()),
            None => (UNKNOWN_TEAM.to_string(), UNKNOWN_TEAM.to_string()),
        }
    }

    pub fn is_live(&self) -> bool {
        self.status.to_lowercase().contains("live")
    }
}

/// Team logo URLs as delivered by the backend.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Logos {
    pub team1: Option<String>,
    pub team2: Option<String>,
}

impl Logos {
    pub fn team1_or_default(&self) -> &str {
        self.team1.as_deref().unwrap_or(DEFAULT_LOGO)
    }

    pub fn team2_or_default(&self) -> &str {
        self.team2.as_deref().unwrap_or(DEFAULT_LOGO)
    }
}

/// Batting and bowling figures for the current innings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Scorecard {
    pub batting: Vec<BattingRow>,
    pub bowling: Vec<BowlingRow>,
}

/// One batter's line. Figures stay display strings.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BattingRow {
    pub name: String,
    pub team: String,
    /// How the batter got out, or `"not out"`.
    pub dismissal: String,
    pub runs: String,
    pub balls: String,
    pub fours: String,
    pub sixes: String,
    pub strike_rate: String,
}

/// One bowler's line.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BowlingRow {
    pub name: String,
    pub team: String,
    pub overs: String,
    pub maidens: String,
    pub runs: String,
    pub wickets: String,
    pub no_balls: String,
    pub wides: String,
    pub economy: String,
}

/// Playing squads in the same order as the `teams` label.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Squads {
    pub team1: Vec<String>,
    pub team2: Vec<String>,
}
