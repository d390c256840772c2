//! Formula 1 season analysis page

use serde::Serialize;

use super::PageOutcome;
use crate::data::client::JsonSource;
use crate::data::sources::formula1::Formula1Api;
use crate::features::standings::{team_rows, top_driver_rows, RankingRow, SeasonSummary};
use crate::features::super_time::{build_super_time_table, EntityKind, SuperTimeRow};
use crate::Result;

/// Drivers shown in the championship table
pub const TOP_DRIVERS: usize = 10;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SeasonReport {
    pub season: i32,
    pub by: EntityKind,
    pub summary: SeasonSummary,
    pub top_drivers: Vec<RankingRow>,
    pub teams: Vec<RankingRow>,
    pub super_times: Vec<SuperTimeRow>,
}

/// KPIs, championship tables and Super Time rows of a season.
///
/// A season with no races yet has nothing to show.
pub fn season_analysis<S: JsonSource>(
    api: &Formula1Api<S>,
    season: i32,
    by: EntityKind,
) -> Result<PageOutcome<SeasonReport>> {
    let races = api.races(season)?;
    if races.is_empty() {
        log::info!("No races listed for {}", season);
        return Ok(PageOutcome::no_data());
    }

    let drivers = api.driver_rankings(season)?;
    let teams = api.team_rankings(season)?;
    let laps = api.laps_for_races(&races)?;
    let super_times = build_super_time_table(&laps, by)?;

    Ok(PageOutcome::Ready(SeasonReport {
        season,
        by,
        summary: SeasonSummary::new(&races, &drivers, &teams),
        top_drivers: top_driver_rows(&drivers, TOP_DRIVERS),
        teams: team_rows(&teams),
        super_times,
    }))
}
