use serde::Serialize;

use super::{BattingRow, BowlingRow};

/// A partial view model: only the fields that changed.
///
/// Produced by [`crate::sync::normalize`] from every wire shape the backends
/// send, so a full snapshot is simply an update with every field set. `None`
/// means "leave the current value alone".
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MatchUpdate {
    pub match_id: Option<String>,
    pub teams: Option<String>,
    pub score: Option<String>,
    pub run_rate: Option<String>,
    pub status: Option<String>,
    pub series: Option<String>,
    pub venue: Option<String>,
    pub recent_overs: Option<String>,
    pub logos: Option<LogosUpdate>,
    pub commentary: Option<Vec<String>>,
    pub scorecard: Option<ScorecardUpdate>,
    pub squads: Option<SquadsUpdate>,
    pub last_event: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LogosUpdate {
    pub team1: Option<String>,
    pub team2: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ScorecardUpdate {
    pub batting: Option<Vec<BattingRow>>,
    pub bowling: Option<Vec<BowlingRow>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SquadsUpdate {
    pub team1: Option<Vec<String>>,
    pub team2: Option<Vec<String>>,
}

impl MatchUpdate {
    /// An update that carries only commentary.
    pub fn commentary(lines: Vec<String>) -> Self {
        Self {
            commentary: (!lines.is_empty()).then_some(lines),
            ..Default::default()
        }
    }

    /// True when merging this update would change nothing.
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }
}
