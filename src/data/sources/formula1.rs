//! Formula 1 API client
//!
//! Races, championship standings and per-race fastest-lap rankings.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::data::client::JsonSource;
use crate::data::normalize::{flatten, FlatRecord};
use crate::Result;

/// A Grand Prix of a season
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Race {
    pub id: i64,
    pub competition_name: String,
    pub circuit_name: Option<String>,
    pub season: Option<i32>,
    pub date: Option<String>,
    pub status: Option<String>,
}

impl Race {
    pub fn from_record(record: &FlatRecord) -> Result<Self> {
        Ok(Race {
            id: record.i64_field("id")?,
            competition_name: record.str_field("competition.name")?,
            circuit_name: record.opt_str("circuit.name")?,
            season: record.opt_i64("season")?.map(|s| s as i32),
            date: record.opt_str("date")?,
            status: record.opt_str("status")?,
        })
    }

    /// "Bahrain Grand Prix - Bahrain International Circuit"
    pub fn full_name(&self) -> String {
        match &self.circuit_name {
            Some(circuit) => format!("{} - {}", self.competition_name, circuit),
            None => self.competition_name.clone(),
        }
    }
}

/// One entry of a race's fastest-lap ranking
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FastestLap {
    pub driver_id: Option<i64>,
    pub driver_name: String,
    pub driver_image: Option<String>,
    pub team_id: Option<i64>,
    pub team_name: String,
    pub team_logo: Option<String>,
    pub position: Option<u32>,
    /// Lap time as published, e.g. "1:32.608"
    pub time: String,
}

impl FastestLap {
    pub fn from_record(record: &FlatRecord) -> Result<Self> {
        Ok(FastestLap {
            driver_id: record.opt_i64("driver.id")?,
            driver_name: record.str_field("driver.name")?,
            driver_image: record.opt_str("driver.image")?,
            team_id: record.opt_i64("team.id")?,
            team_name: record.str_field("team.name")?,
            team_logo: record.opt_str("team.logo")?,
            position: record.opt_i64("position")?.map(|p| p as u32),
            time: record.str_field("time")?,
        })
    }
}

/// Drivers' championship entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DriverStanding {
    pub position: u32,
    pub driver_id: i64,
    pub driver_name: String,
    pub driver_image: Option<String>,
    pub team_name: Option<String>,
    pub team_logo: Option<String>,
    pub points: f64,
    pub wins: Option<u32>,
}

impl DriverStanding {
    pub fn from_record(record: &FlatRecord) -> Result<Self> {
        Ok(DriverStanding {
            position: record.i64_field("position")? as u32,
            driver_id: record.i64_field("driver.id")?,
            driver_name: record.str_field("driver.name")?,
            driver_image: record.opt_str("driver.image")?,
            team_name: record.opt_str("team.name")?,
            team_logo: record.opt_str("team.logo")?,
            points: record.opt_f64("points")?.unwrap_or(0.0),
            wins: record.opt_i64("wins")?.map(|w| w as u32),
        })
    }
}

/// Constructors' championship entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamStanding {
    pub position: u32,
    pub team_id: i64,
    pub team_name: String,
    pub team_logo: Option<String>,
    pub points: f64,
}

impl TeamStanding {
    pub fn from_record(record: &FlatRecord) -> Result<Self> {
        Ok(TeamStanding {
            position: record.i64_field("position")? as u32,
            team_id: record.i64_field("team.id")?,
            team_name: record.str_field("team.name")?,
            team_logo: record.opt_str("team.logo")?,
            points: record.opt_f64("points")?.unwrap_or(0.0),
        })
    }
}

/// Fastest laps of one race, in ranking order
#[derive(Debug, Clone, PartialEq)]
pub struct RaceLaps {
    pub race_id: i64,
    pub race_name: String,
    pub laps: Vec<FastestLap>,
}

fn parse_all<T>(records: &[Value], parse: fn(&FlatRecord) -> Result<T>) -> Result<Vec<T>> {
    records.iter().map(|r| parse(&flatten(r))).collect()
}

/// Formula 1 endpoints over any JSON source
pub struct Formula1Api<S: JsonSource> {
    source: S,
}

impl<S: JsonSource> Formula1Api<S> {
    pub fn new(source: S) -> Self {
        Formula1Api { source }
    }

    /// Races (not practice or qualifying sessions) of a season
    pub fn races(&self, season: i32) -> Result<Vec<Race>> {
        let records = self.source.get(
            "races",
            &[("season", season.to_string()), ("type", "Race".to_string())],
        )?;
        parse_all(&records, Race::from_record)
    }

    pub fn driver_rankings(&self, season: i32) -> Result<Vec<DriverStanding>> {
        let records = self
            .source
            .get("rankings/drivers", &[("season", season.to_string())])?;
        parse_all(&records, DriverStanding::from_record)
    }

    pub fn team_rankings(&self, season: i32) -> Result<Vec<TeamStanding>> {
        let records = self
            .source
            .get("rankings/teams", &[("season", season.to_string())])?;
        parse_all(&records, TeamStanding::from_record)
    }

    pub fn fastest_laps(&self, race_id: i64) -> Result<Vec<FastestLap>> {
        let records = self
            .source
            .get("rankings/fastestlaps", &[("race", race_id.to_string())])?;
        parse_all(&records, FastestLap::from_record)
    }

    /// Fastest laps for every race of a season, one request per race.
    ///
    /// Failing to list the races is fatal. A race whose ranking request fails
    /// at the source is logged and left out, as is a race with no laps yet.
    /// Malformed lap records are returned as errors.
    pub fn season_fastest_laps(&self, season: i32) -> Result<Vec<RaceLaps>> {
        let races = self.races(season)?;
        log::info!("Fetching fastest laps for {} races of {}", races.len(), season);
        self.laps_for_races(&races)
    }

    /// Fastest laps of already listed races, with the same skipping rules
    /// as [`Formula1Api::season_fastest_laps`]
    pub fn laps_for_races(&self, races: &[Race]) -> Result<Vec<RaceLaps>> {
        let mut season_laps = Vec::with_capacity(races.len());
        for race in races {
            let laps = match self.fastest_laps(race.id) {
                Ok(laps) => laps,
                Err(e) if e.is_source_failure() => {
                    log::warn!(
                        "Skipping race {} ({}): fastest laps unavailable: {}",
                        race.id,
                        race.competition_name,
                        e
                    );
                    continue;
                }
                Err(e) => return Err(e),
            };

            if laps.is_empty() {
                log::debug!("No fastest laps for race {} yet", race.id);
                continue;
            }

            season_laps.push(RaceLaps {
                race_id: race.id,
                race_name: race.competition_name.clone(),
                laps,
            });
        }

        log::info!(
            "Collected fastest laps for {}/{} races",
            season_laps.len(),
            races.len()
        );
        Ok(season_laps)
    }
}
