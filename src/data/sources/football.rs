//! Football API client
//!
//! Countries, leagues, seasons, fixtures and teams of API-Football v3.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::data::client::JsonSource;
use crate::data::normalize::{flatten, FlatRecord};
use crate::{Result, SportsError};

/// A competition as listed for a country
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct League {
    pub id: i64,
    pub name: String,
    pub kind: Option<String>,
    pub logo: Option<String>,
    pub country: Option<String>,
    /// Season years, oldest first as published
    pub seasons: Vec<i32>,
}

impl League {
    pub fn from_record(record: &FlatRecord) -> Result<Self> {
        let seasons = record
            .array("seasons")?
            .iter()
            .filter_map(|s| s.get("year").and_then(Value::as_i64))
            .map(|y| y as i32)
            .collect();

        Ok(League {
            id: record.i64_field("league.id")?,
            name: record.str_field("league.name")?,
            kind: record.opt_str("league.type")?,
            logo: record.opt_str("league.logo")?,
            country: record.opt_str("country.name")?,
            seasons,
        })
    }
}

/// A scheduled or played match
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Fixture {
    pub id: i64,
    /// Kick-off as RFC 3339 text
    pub date: String,
    pub venue: Option<String>,
    pub status: Option<String>,
    pub round: Option<String>,
    pub home_team_id: Option<i64>,
    pub home_team: String,
    pub away_team_id: Option<i64>,
    pub away_team: String,
    /// `None` for a draw or an unplayed fixture
    pub home_winner: Option<bool>,
    pub away_winner: Option<bool>,
    pub home_goals: Option<u32>,
    pub away_goals: Option<u32>,
}

impl Fixture {
    pub fn from_record(record: &FlatRecord) -> Result<Self> {
        let goals = |key: &str| -> Result<Option<u32>> {
            match record.opt_i64(key)? {
                Some(g) if g < 0 => Err(SportsError::malformed(key, "negative goal count")),
                other => Ok(other.map(|g| g as u32)),
            }
        };

        Ok(Fixture {
            id: record.i64_field("fixture.id")?,
            date: record.str_field("fixture.date")?,
            venue: record.opt_str("fixture.venue.name")?,
            status: record.opt_str("fixture.status.short")?,
            round: record.opt_str("league.round")?,
            home_team_id: record.opt_i64("teams.home.id")?,
            home_team: record.str_field("teams.home.name")?,
            away_team_id: record.opt_i64("teams.away.id")?,
            away_team: record.str_field("teams.away.name")?,
            home_winner: record.opt_bool("teams.home.winner")?,
            away_winner: record.opt_bool("teams.away.winner")?,
            home_goals: goals("goals.home")?,
            away_goals: goals("goals.away")?,
        })
    }

    /// Parsed kick-off time
    pub fn kick_off(&self) -> Result<DateTime<FixedOffset>> {
        DateTime::parse_from_rfc3339(&self.date)
            .map_err(|e| SportsError::malformed("fixture.date", e.to_string()))
    }

    /// Both scores are known
    pub fn is_played(&self) -> bool {
        self.home_goals.is_some() && self.away_goals.is_some()
    }
}

/// A team taking part in a league season
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TeamInfo {
    pub id: i64,
    pub name: String,
    pub code: Option<String>,
    pub founded: Option<i32>,
    pub logo: Option<String>,
    pub venue: Option<String>,
}

impl TeamInfo {
    pub fn from_record(record: &FlatRecord) -> Result<Self> {
        Ok(TeamInfo {
            id: record.i64_field("team.id")?,
            name: record.str_field("team.name")?,
            code: record.opt_str("team.code")?,
            founded: record.opt_i64("team.founded")?.map(|y| y as i32),
            logo: record.opt_str("team.logo")?,
            venue: record.opt_str("venue.name")?,
        })
    }
}

fn parse_all<T>(records: &[Value], parse: fn(&FlatRecord) -> Result<T>) -> Result<Vec<T>> {
    records.iter().map(|r| parse(&flatten(r))).collect()
}

/// Football endpoints over any JSON source
pub struct FootballApi<S: JsonSource> {
    source: S,
}

impl<S: JsonSource> FootballApi<S> {
    pub fn new(source: S) -> Self {
        FootballApi { source }
    }

    pub fn countries(&self) -> Result<Vec<String>> {
        let records = self.source.get("countries", &[])?;
        records
            .iter()
            .map(|r| flatten(r).str_field("name"))
            .collect()
    }

    pub fn leagues(&self, country: &str) -> Result<Vec<League>> {
        let records = self
            .source
            .get("leagues", &[("country", country.to_string())])?;
        parse_all(&records, League::from_record)
    }

    /// Season years available for a league
    pub fn seasons(&self, league_id: i64) -> Result<Vec<i32>> {
        let records = self
            .source
            .get("leagues", &[("id", league_id.to_string())])?;
        let first = records
            .first()
            .ok_or_else(|| SportsError::UnknownSelection(format!("league {}", league_id)))?;
        Ok(League::from_record(&flatten(first))?.seasons)
    }

    pub fn fixtures(&self, league_id: i64, season: i32) -> Result<Vec<Fixture>> {
        let records = self.source.get(
            "fixtures",
            &[("league", league_id.to_string()), ("season", season.to_string())],
        )?;
        parse_all(&records, Fixture::from_record)
    }

    pub fn teams(&self, league_id: i64, season: i32) -> Result<Vec<TeamInfo>> {
        let records = self.source.get(
            "teams",
            &[("league", league_id.to_string()), ("season", season.to_string())],
        )?;
        parse_all(&records, TeamInfo::from_record)
    }
}
