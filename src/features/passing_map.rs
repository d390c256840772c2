//! Passing map: every pass of a team drawn as a segment

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::data::sources::open_data::{MatchEvent, PitchPoint};

/// Label used for passes without an outcome
pub const COMPLETED: &str = "completed";

/// All passes made by `team`, in event order
pub fn team_passes<'a>(events: &'a [MatchEvent], team: &str) -> Vec<&'a MatchEvent> {
    events
        .iter()
        .filter(|e| e.is_pass() && e.team_name == team)
        .collect()
}

/// Completed vs failed counts for the donut
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PassingSummary {
    pub completed: u32,
    pub failed: u32,
    pub total: u32,
    pub completion_pct: f64,
}

impl PassingSummary {
    pub fn from_passes(passes: &[&MatchEvent]) -> Self {
        let completed = passes.iter().filter(|p| p.outcome_name.is_none()).count() as u32;
        let total = passes.len() as u32;
        let completion_pct = if total == 0 {
            0.0
        } else {
            completed as f64 / total as f64 * 100.0
        };
        PassingSummary {
            completed,
            failed: total - completed,
            total,
            completion_pct,
        }
    }
}

/// One pass from origin to end location
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassSegment {
    pub minute: u32,
    pub start: PitchPoint,
    pub end: PitchPoint,
    /// Direction of travel, degrees counter-clockwise from the x axis
    pub angle: f64,
    pub player: String,
    pub recipient: Option<String>,
    pub outcome: String,
}

impl PassSegment {
    /// `None` when the pass lacks either location
    pub fn from_event(event: &MatchEvent) -> Option<Self> {
        let start = event.location?;
        let end = event.pass_end_location?;
        Some(PassSegment {
            minute: event.minute,
            start,
            end,
            angle: (end.y - start.y).atan2(end.x - start.x).to_degrees(),
            player: event.player_name.clone().unwrap_or_default(),
            recipient: event.pass_recipient_name.clone(),
            outcome: event
                .outcome_name
                .clone()
                .unwrap_or_else(|| COMPLETED.to_string()),
        })
    }

    pub fn is_completed(&self) -> bool {
        self.outcome == COMPLETED
    }
}

/// Segments for a list of passes; passes without coordinates are skipped
pub fn pass_segments(passes: &[&MatchEvent]) -> Vec<PassSegment> {
    let segments: Vec<PassSegment> = passes
        .iter()
        .filter_map(|p| PassSegment::from_event(p))
        .collect();
    if segments.len() < passes.len() {
        log::debug!("{} passes without coordinates", passes.len() - segments.len());
    }
    segments
}

/// Passes made by one player
pub fn passes_by_player<'a>(passes: &[&'a MatchEvent], player: &str) -> Vec<&'a MatchEvent> {
    passes
        .iter()
        .copied()
        .filter(|p| p.player_name.as_deref() == Some(player))
        .collect()
}

/// Players who made at least one pass, in first-seen order
pub fn players_with_passes(passes: &[&MatchEvent]) -> Vec<String> {
    let mut seen = HashSet::new();
    passes
        .iter()
        .filter_map(|p| p.player_name.as_deref())
        .filter(|name| seen.insert(*name))
        .map(str::to_string)
        .collect()
}
