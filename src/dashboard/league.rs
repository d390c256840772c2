//! Football league analytics page

use serde::Serialize;

use super::PageOutcome;
use crate::data::client::JsonSource;
use crate::data::sources::football::{FootballApi, Fixture, League, TeamInfo};
use crate::features::league::{
    cumulative_points, goals_for_against, home_away_win_pct, side_records, team_trend,
    wins_per_weekday, GoalTally, PointsRow, Side, SideRecord, TrendRow, WeekdayWins, WinPct,
};
use crate::{Result, SportsError};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LeagueReport {
    pub league: League,
    pub season: i32,
    pub seasons: Vec<i32>,
    pub fixtures: Vec<Fixture>,
    pub teams: Vec<TeamInfo>,
    pub home_records: Vec<SideRecord>,
    pub away_records: Vec<SideRecord>,
    pub cumulative_points: Vec<PointsRow>,
    pub win_pct: Vec<WinPct>,
    pub goals: Vec<GoalTally>,
    pub weekday_wins: Vec<WeekdayWins>,
    pub team: String,
    pub trend: Vec<TrendRow>,
}

/// Season shown when none is requested: the one before the latest, since
/// the latest is usually still being played.
pub fn default_season(seasons: &[i32]) -> Option<i32> {
    let mut sorted = seasons.to_vec();
    sorted.sort_unstable_by(|a, b| b.cmp(a));
    sorted.get(1).or_else(|| sorted.first()).copied()
}

/// Every league chart for one competition season.
///
/// `season` and `team` default to [`default_season`] and the first listed
/// team. A league, season or team that is not on offer is an
/// `UnknownSelection`; a season without fixtures or teams has no data.
pub fn league_analytics<S: JsonSource>(
    api: &FootballApi<S>,
    country: &str,
    league_name: &str,
    season: Option<i32>,
    team: Option<&str>,
) -> Result<PageOutcome<LeagueReport>> {
    let league = api
        .leagues(country)?
        .into_iter()
        .find(|l| l.name == league_name)
        .ok_or_else(|| {
            SportsError::UnknownSelection(format!("no league {} in {}", league_name, country))
        })?;

    let seasons = api.seasons(league.id)?;
    let season = match season {
        Some(s) if seasons.contains(&s) => s,
        Some(s) => {
            return Err(SportsError::UnknownSelection(format!(
                "{} has no {} season",
                league.name, s
            )))
        }
        None => match default_season(&seasons) {
            Some(s) => s,
            None => return Ok(PageOutcome::no_data()),
        },
    };

    let fixtures = api.fixtures(league.id, season)?;
    let teams = api.teams(league.id, season)?;
    if fixtures.is_empty() || teams.is_empty() {
        log::info!(
            "{} {}: {} fixtures, {} teams",
            league.name,
            season,
            fixtures.len(),
            teams.len()
        );
        return Ok(PageOutcome::no_data());
    }

    let team = match team {
        Some(name) => teams.iter().find(|t| t.name == name).ok_or_else(|| {
            SportsError::UnknownSelection(format!("no team {} in {}", name, league.name))
        })?,
        None => &teams[0],
    }
    .name
    .clone();

    Ok(PageOutcome::Ready(LeagueReport {
        home_records: side_records(&fixtures, Side::Home),
        away_records: side_records(&fixtures, Side::Away),
        cumulative_points: cumulative_points(&fixtures)?,
        win_pct: home_away_win_pct(&fixtures, teams.len()),
        goals: goals_for_against(&fixtures),
        weekday_wins: wins_per_weekday(&fixtures)?,
        trend: team_trend(&fixtures, &team)?,
        team,
        league,
        season,
        seasons,
        fixtures,
        teams,
    }))
}
