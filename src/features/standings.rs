//! Season KPIs and championship tables

use serde::{Deserialize, Serialize};

use crate::data::sources::formula1::{DriverStanding, Race, TeamStanding};

/// Headline figures of a season
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SeasonSummary {
    pub race_count: usize,
    pub champion_driver: Option<DriverStanding>,
    pub champion_team: Option<TeamStanding>,
}

impl SeasonSummary {
    /// Champions are the first entries of the published rankings
    pub fn new(races: &[Race], drivers: &[DriverStanding], teams: &[TeamStanding]) -> Self {
        SeasonSummary {
            race_count: races.len(),
            champion_driver: drivers.first().cloned(),
            champion_team: teams.first().cloned(),
        }
    }
}

/// A row of a rendered ranking table
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankingRow {
    pub rank: u32,
    pub name: String,
    pub image_url: Option<String>,
    pub team_name: Option<String>,
    pub team_logo: Option<String>,
    pub points: f64,
    pub id: i64,
}

/// The first `n` drivers of the championship
pub fn top_driver_rows(rankings: &[DriverStanding], n: usize) -> Vec<RankingRow> {
    rankings
        .iter()
        .take(n)
        .map(|d| RankingRow {
            rank: d.position,
            name: d.driver_name.clone(),
            image_url: d.driver_image.clone(),
            team_name: d.team_name.clone(),
            team_logo: d.team_logo.clone(),
            points: d.points,
            id: d.driver_id,
        })
        .collect()
}

/// The whole constructors' championship
pub fn team_rows(rankings: &[TeamStanding]) -> Vec<RankingRow> {
    rankings
        .iter()
        .map(|t| RankingRow {
            rank: t.position,
            name: t.team_name.clone(),
            image_url: t.team_logo.clone(),
            team_name: None,
            team_logo: None,
            points: t.points,
            id: t.team_id,
        })
        .collect()
}
