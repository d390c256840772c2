//! Match passing analysis page

use serde::Serialize;

use super::PageOutcome;
use crate::data::sources::open_data::{MatchDataSource, MatchInfo};
use crate::features::pass_network::{build_pass_network, CutoffPolicy, PassNetwork};
use crate::features::passing_map::{
    pass_segments, passes_by_player, players_with_passes, team_passes, PassSegment,
    PassingSummary,
};
use crate::Result;

/// Passing map, pass network and one player's passes for a team
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TeamPassingReport {
    pub team: String,
    pub summary: PassingSummary,
    pub segments: Vec<PassSegment>,
    pub network: PassNetwork,
    /// Players with at least one pass, for the player selector
    pub players: Vec<String>,
    pub player: String,
    pub player_summary: PassingSummary,
    pub player_segments: Vec<PassSegment>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PassingReport {
    pub match_label: String,
    /// Home team first
    pub teams: Vec<(String, PageOutcome<TeamPassingReport>)>,
}

/// Passing analysis of both teams of a match.
///
/// `player` picks the player whose passes are shown; a team without that
/// player shows its first passer instead.
pub fn passing_analysis<D: MatchDataSource>(
    source: &D,
    match_info: &MatchInfo,
    policy: CutoffPolicy,
    player: Option<&str>,
) -> Result<PassingReport> {
    let events = source.events(match_info.match_id)?;
    let roster = source.lineups(match_info.match_id)?;

    let mut teams = Vec::with_capacity(2);
    for team in match_info.teams() {
        let passes = team_passes(&events, team);
        if passes.is_empty() {
            log::warn!("No passes for {} in match {}", team, match_info.match_id);
            teams.push((
                team.to_string(),
                PageOutcome::NoData(format!("No passes found for {} in this match", team)),
            ));
            continue;
        }

        let players = players_with_passes(&passes);
        let selected = match player {
            Some(name) if players.iter().any(|p| p == name) => name.to_string(),
            _ => players.first().cloned().unwrap_or_default(),
        };
        let player_passes = passes_by_player(&passes, &selected);

        let report = TeamPassingReport {
            team: team.to_string(),
            summary: PassingSummary::from_passes(&passes),
            segments: pass_segments(&passes),
            network: build_pass_network(&events, &roster, team, policy)?,
            players,
            player: selected,
            player_summary: PassingSummary::from_passes(&player_passes),
            player_segments: pass_segments(&player_passes),
        };
        teams.push((team.to_string(), PageOutcome::Ready(report)));
    }

    Ok(PassingReport {
        match_label: match_info.label(),
        teams,
    })
}
