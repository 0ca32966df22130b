use serde::{Deserialize, Serialize};

/// One row of the live match list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MatchSummary {
    pub match_id: String,
    pub teams: String,
    pub score: String,
    pub status: String,
}
