//! Merges partial updates into the accumulated view model.
//!
//! The rule is a shallow, field-level overwrite: every field present in the
//! update replaces the current one, absent fields are left alone. Blank
//! strings and empty lists count as absent. Nested
//! objects follow the same rule one level down and lists are replaced whole.
//! Snapshots and stream messages share this single code path.

use chrono::Utc;

use crate::model::{MatchUpdate, MatchViewModel, TransientEvent};

/// Merge `update` into a copy of `current`.
///
/// Returns the merged state and, when the update carries an event marker, the
/// transient event to celebrate.
pub fn merge(
    current: &MatchViewModel,
    update: &MatchUpdate,
) -> (MatchViewModel, Option<TransientEvent>) {
    let mut merged = current.clone();
    let event = merged.apply(update);
    (merged, event)
}

impl MatchViewModel {
    /// In-place form of [`merge`].
    ///
    /// `match_id` is never overwritten.
    pub fn apply(&mut self, update: &MatchUpdate) -> Option<TransientEvent> {
        overwrite(&mut self.teams, &update.teams);
        overwrite(&mut self.score, &update.score);
        overwrite(&mut self.run_rate, &update.run_rate);
        overwrite(&mut self.status, &update.status);
        overwrite(&mut self.series, &update.series);
        overwrite(&mut self.venue, &update.venue);
        overwrite(&mut self.recent_overs, &update.recent_overs);
        overwrite(&mut self.commentary, &update.commentary);

        if let Some(logos) = &update.logos {
            if let Some(team1) = non_blank(&logos.team1) {
                self.logos.team1 = Some(team1.clone());
            }
            if let Some(team2) = non_blank(&logos.team2) {
                self.logos.team2 = Some(team2.clone());
            }
        }
        if let Some(scorecard) = &update.scorecard {
            overwrite(&mut self.scorecard.batting, &scorecard.batting);
            overwrite(&mut self.scorecard.bowling, &scorecard.bowling);
        }
        if let Some(squads) = &update.squads {
            overwrite(&mut self.squads.team1, &squads.team1);
            overwrite(&mut self.squads.team2, &squads.team2);
        }

        let kind = non_blank(&update.last_event)?;
        self.last_event = Some(kind.clone());
        Some(TransientEvent {
            kind: kind.clone(),
            at: Utc::now(),
        })
    }
}

/// Values that count as absent in an update.
trait Blank {
    fn is_blank(&self) -> bool;
}

impl Blank for String {
    fn is_blank(&self) -> bool {
        self.trim().is_empty()
    }
}

impl<T> Blank for Vec<T> {
    fn is_blank(&self) -> bool {
        self.is_empty()
    }
}

fn non_blank<T: Blank>(value: &Option<T>) -> Option<&T> {
    value.as_ref().filter(|v| !v.is_blank())
}

fn overwrite<T: Clone + Blank>(field: &mut T, value: &Option<T>) {
    if let Some(value) = non_blank(value) {
        field.clone_from(value);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BattingRow, LogosUpdate, ScorecardUpdate, SquadsUpdate};

    fn seeded() -> MatchViewModel {
        MatchViewModel {
            teams: "India vs Australia".to_string(),
            score: "0/0".to_string(),
            run_rate: "0.00".to_string(),
            status: "Live".to_string(),
            commentary: vec!["First ball".to_string()],
            ..MatchViewModel::new("m1")
        }
    }

    #[test]
    fn test_boundary_scenario() {
        let update = MatchUpdate {
            score: Some("45/1".to_string()),
            last_event: Some("four".to_string()),
            ..Default::default()
        };
        let (merged, event) = merge(&seeded(), &update);
        assert_eq!(merged.score, "45/1");
        assert_eq!(merged.teams, "India vs Australia");
        assert_eq!(merged.last_event.as_deref(), Some("four"));
        assert_eq!(event.map(|e| e.kind).as_deref(), Some("four"));
    }

    #[test]
    fn test_absent_fields_untouched() {
        let current = seeded();
        let (merged, event) = merge(&current, &MatchUpdate::default());
        assert_eq!(merged, current);
        assert!(event.is_none());

        let update = MatchUpdate {
            status: Some("Drinks".to_string()),
            ..Default::default()
        };
        let (merged, _) = merge(&current, &update);
        assert_eq!(merged.status, "Drinks");
        assert_eq!(merged.score, current.score);
        assert_eq!(merged.run_rate, current.run_rate);
        assert_eq!(merged.commentary, current.commentary);
    }

    #[test]
    fn test_wicket_marker_raises_event_without_marker_none() {
        let wicket = MatchUpdate {
            last_event: Some("wicket".to_string()),
            ..Default::default()
        };
        let (_, event) = merge(&seeded(), &wicket);
        assert_eq!(event.unwrap().kind, "wicket");

        let quiet = MatchUpdate {
            score: Some("1/0".to_string()),
            ..Default::default()
        };
        assert!(merge(&seeded(), &quiet).1.is_none());
    }

    #[test]
    fn test_merge_is_idempotent_on_state() {
        let update = MatchUpdate {
            score: Some("88/2".to_string()),
            commentary: Some(vec!["a".to_string(), "b".to_string()]),
            squads: Some(SquadsUpdate {
                team1: Some(vec!["Rohit".to_string()]),
                team2: None,
            }),
            last_event: Some("six".to_string()),
            ..Default::default()
        };
        let (once, first) = merge(&seeded(), &update);
        let (twice, second) = merge(&once, &update);
        assert_eq!(once, twice);
        assert!(first.is_some());
        assert!(second.is_some());
    }

    #[test]
    fn test_nested_objects_merge_one_level_down() {
        let mut current = seeded();
        current.logos.team1 = Some("ind.png".to_string());
        current.logos.team2 = Some("aus.png".to_string());
        current.scorecard.bowling = vec![Default::default()];
        current.squads.team2 = vec!["Cummins".to_string()];

        let update = MatchUpdate {
            logos: Some(LogosUpdate {
                team1: None,
                team2: Some("aus-new.png".to_string()),
            }),
            scorecard: Some(ScorecardUpdate {
                batting: Some(vec![BattingRow {
                    name: "Gill".to_string(),
                    runs: "12".to_string(),
                    ..Default::default()
                }]),
                bowling: None,
            }),
            squads: Some(SquadsUpdate {
                team1: Some(vec!["Rohit".to_string()]),
                team2: None,
            }),
            ..Default::default()
        };
        let (merged, _) = merge(&current, &update);
        assert_eq!(merged.logos.team1.as_deref(), Some("ind.png"));
        assert_eq!(merged.logos.team2.as_deref(), Some("aus-new.png"));
        assert_eq!(merged.scorecard.batting.len(), 1);
        assert_eq!(merged.scorecard.bowling.len(), 1);
        assert_eq!(merged.squads.team1, vec!["Rohit"]);
        assert_eq!(merged.squads.team2, vec!["Cummins"]);
    }

    #[test]
    fn test_lists_replaced_wholesale() {
        let update = MatchUpdate::commentary(vec!["Over 2".to_string()]);
        let (merged, _) = merge(&seeded(), &update);
        assert_eq!(merged.commentary, vec!["Over 2"]);
    }

    #[test]
    fn test_blank_values_never_clear_state() {
        let mut current = seeded();
        current.logos.team1 = Some("ind.png".to_string());
        current.squads.team1 = vec!["Rohit".to_string()];
        let update = MatchUpdate {
            score: Some(String::new()),
            status: Some("  ".to_string()),
            commentary: Some(Vec::new()),
            logos: Some(LogosUpdate {
                team1: Some(String::new()),
                team2: None,
            }),
            squads: Some(SquadsUpdate {
                team1: Some(Vec::new()),
                team2: None,
            }),
            last_event: Some(String::new()),
            ..Default::default()
        };

        let (merged, event) = merge(&current, &update);
        assert_eq!(merged, current);
        assert!(event.is_none());
    }

    #[test]
    fn test_match_id_is_immutable() {
        let update = MatchUpdate {
            match_id: Some("other".to_string()),
            ..Default::default()
        };
        let (merged, _) = merge(&seeded(), &update);
        assert_eq!(merged.match_id, "m1");
    }

    #[test]
    fn test_cleared_event_not_reintroduced() {
        let mut model = seeded();
        model.apply(&MatchUpdate {
            last_event: Some("wicket".to_string()),
            ..Default::default()
        });
        model.last_event = None;
        model.apply(&MatchUpdate {
            score: Some("46/2".to_string()),
            ..Default::default()
        });
        assert!(model.last_event.is_none());
    }
}
