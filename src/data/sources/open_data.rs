//! StatsBomb open-data reader
//!
//! Competitions, matches, event streams and lineups published as JSON files.
//! Files can be served from a local cache directory for offline use.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::data::normalize::{flatten, FlatRecord};
use crate::{OpenDataConfig, Result, SportsError};

/// A point on the 120 x 80 StatsBomb pitch
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PitchPoint {
    pub x: f64,
    pub y: f64,
}

impl PitchPoint {
    pub fn new(x: f64, y: f64) -> Self {
        PitchPoint { x, y }
    }

    fn from_value(key: &str, value: &Value) -> Result<Self> {
        let coords = value
            .as_array()
            .ok_or_else(|| SportsError::malformed(key, "expected [x, y]"))?;
        match (
            coords.first().and_then(Value::as_f64),
            coords.get(1).and_then(Value::as_f64),
        ) {
            (Some(x), Some(y)) => Ok(PitchPoint { x, y }),
            _ => Err(SportsError::malformed(key, format!("bad coordinates: {}", value))),
        }
    }

    fn from_field(record: &FlatRecord, key: &str) -> Result<Option<Self>> {
        match record.get(key) {
            None | Some(Value::Null) => Ok(None),
            Some(value) => Self::from_value(key, value).map(Some),
        }
    }
}

/// One competition season
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Competition {
    pub competition_id: i64,
    pub season_id: i64,
    pub country_name: String,
    pub competition_name: String,
    pub competition_gender: String,
    pub season_name: String,
}

impl Competition {
    pub fn from_record(record: &FlatRecord) -> Result<Self> {
        Ok(Competition {
            competition_id: record.i64_field("competition_id")?,
            season_id: record.i64_field("season_id")?,
            country_name: record.str_field("country_name")?,
            competition_name: record.str_field("competition_name")?,
            competition_gender: record.str_field("competition_gender")?,
            season_name: record.str_field("season_name")?,
        })
    }
}

/// A match of a competition season
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchInfo {
    pub match_id: i64,
    pub match_date: String,
    pub kick_off: Option<String>,
    pub match_week: Option<u32>,
    pub home_team: String,
    pub away_team: String,
    pub home_score: Option<u32>,
    pub away_score: Option<u32>,
}

impl MatchInfo {
    pub fn from_record(record: &FlatRecord) -> Result<Self> {
        Ok(MatchInfo {
            match_id: record.i64_field("match_id")?,
            match_date: record.str_field("match_date")?,
            kick_off: record.opt_str("kick_off")?,
            match_week: record.opt_i64("match_week")?.map(|w| w as u32),
            home_team: record.str_field("home_team.home_team_name")?,
            away_team: record.str_field("away_team.away_team_name")?,
            home_score: record.opt_i64("home_score")?.map(|s| s as u32),
            away_score: record.opt_i64("away_score")?.map(|s| s as u32),
        })
    }

    /// Selector label, e.g. "21:00:00.000 | gw 1 | Tottenham - Liverpool | 0 - 2"
    pub fn label(&self) -> String {
        let score = |s: Option<u32>| s.map(|v| v.to_string()).unwrap_or_else(|| "-".to_string());
        format!(
            "{} | gw {} | {} - {} | {} - {}",
            self.kick_off.as_deref().unwrap_or(&self.match_date),
            self.match_week.map(|w| w.to_string()).unwrap_or_else(|| "-".to_string()),
            self.home_team,
            self.away_team,
            score(self.home_score),
            score(self.away_score),
        )
    }

    pub fn teams(&self) -> [&str; 2] {
        [&self.home_team, &self.away_team]
    }
}

/// Order matches by game week, keeping source order within a week
pub fn sort_matches_by_week(matches: &mut [MatchInfo]) {
    matches.sort_by_key(|m| m.match_week.unwrap_or(u32::MAX));
}

/// A single on-ball event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchEvent {
    pub id: String,
    pub index: u32,
    pub period: u8,
    pub minute: u32,
    pub second: u32,
    pub type_name: String,
    pub team_name: String,
    pub player_id: Option<i64>,
    pub player_name: Option<String>,
    pub location: Option<PitchPoint>,
    pub pass_recipient_id: Option<i64>,
    pub pass_recipient_name: Option<String>,
    pub pass_end_location: Option<PitchPoint>,
    /// Present only for unsuccessful passes
    pub outcome_name: Option<String>,
}

impl MatchEvent {
    pub const PASS: &'static str = "Pass";
    pub const SUBSTITUTION: &'static str = "Substitution";

    pub fn from_record(record: &FlatRecord) -> Result<Self> {
        Ok(MatchEvent {
            id: record.str_field("id")?,
            index: record.opt_i64("index")?.unwrap_or(0) as u32,
            period: record.opt_i64("period")?.unwrap_or(1) as u8,
            minute: record.i64_field("minute")? as u32,
            second: record.opt_i64("second")?.unwrap_or(0) as u32,
            type_name: record.str_field("type.name")?,
            team_name: record.str_field("team.name")?,
            player_id: record.opt_i64("player.id")?,
            player_name: record.opt_str("player.name")?,
            location: PitchPoint::from_field(record, "location")?,
            pass_recipient_id: record.opt_i64("pass.recipient.id")?,
            pass_recipient_name: record.opt_str("pass.recipient.name")?,
            pass_end_location: PitchPoint::from_field(record, "pass.end_location")?,
            outcome_name: record.opt_str("pass.outcome.name")?,
        })
    }

    pub fn is_pass(&self) -> bool {
        self.type_name == Self::PASS
    }

    pub fn is_substitution(&self) -> bool {
        self.type_name == Self::SUBSTITUTION
    }

    pub fn is_completed_pass(&self) -> bool {
        self.is_pass() && self.outcome_name.is_none()
    }
}

/// A player listed in a match lineup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub player_id: i64,
    pub player_name: String,
    pub jersey_number: u32,
    pub team_name: String,
}

/// Parse a lineups file: one entry per team, each holding its players
pub fn parse_lineups(records: &[Value]) -> Result<Vec<RosterEntry>> {
    let mut roster = Vec::new();
    for team in records {
        let team_record = flatten(team);
        let team_name = team_record.str_field("team_name")?;
        for player in team_record.array("lineup")? {
            let player = flatten(&player);
            roster.push(RosterEntry {
                player_id: player.i64_field("player_id")?,
                player_name: player.str_field("player_name")?,
                jersey_number: player.i64_field("jersey_number")? as u32,
                team_name: team_name.clone(),
            });
        }
    }
    Ok(roster)
}

pub fn parse_events(records: &[Value]) -> Result<Vec<MatchEvent>> {
    records
        .iter()
        .map(|r| MatchEvent::from_record(&flatten(r)))
        .collect()
}

/// Cascading competition selectors: country, competition, season, gender
#[derive(Debug, Clone, Default)]
pub struct CompetitionCatalog {
    competitions: Vec<Competition>,
}

fn unique<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|v| seen.insert(*v))
        .map(str::to_string)
        .collect()
}

impl CompetitionCatalog {
    pub fn new(competitions: Vec<Competition>) -> Self {
        CompetitionCatalog { competitions }
    }

    pub fn all(&self) -> &[Competition] {
        &self.competitions
    }

    pub fn countries(&self) -> Vec<String> {
        unique(self.competitions.iter().map(|c| c.country_name.as_str()))
    }

    pub fn competitions(&self, country: &str) -> Vec<String> {
        unique(
            self.competitions
                .iter()
                .filter(|c| c.country_name == country)
                .map(|c| c.competition_name.as_str()),
        )
    }

    pub fn seasons(&self, country: &str, competition: &str) -> Vec<String> {
        unique(
            self.competitions
                .iter()
                .filter(|c| c.country_name == country && c.competition_name == competition)
                .map(|c| c.season_name.as_str()),
        )
    }

    pub fn genders(&self, country: &str, competition: &str, season: &str) -> Vec<String> {
        unique(
            self.competitions
                .iter()
                .filter(|c| {
                    c.country_name == country
                        && c.competition_name == competition
                        && c.season_name == season
                })
                .map(|c| c.competition_gender.as_str()),
        )
    }

    /// The competition season matching every selector
    pub fn select(
        &self,
        country: &str,
        competition: &str,
        season: &str,
        gender: &str,
    ) -> Result<&Competition> {
        self.competitions
            .iter()
            .find(|c| {
                c.country_name == country
                    && c.competition_name == competition
                    && c.season_name == season
                    && c.competition_gender == gender
            })
            .ok_or_else(|| {
                SportsError::UnknownSelection(format!(
                    "no competition matches {} / {} / {} / {}",
                    country, competition, season, gender
                ))
            })
    }
}

/// Per-match event data
pub trait MatchDataSource {
    fn events(&self, match_id: i64) -> Result<Vec<MatchEvent>>;
    fn lineups(&self, match_id: i64) -> Result<Vec<RosterEntry>>;
}

/// Reader for the open-data repository layout
pub struct OpenDataSource {
    client: reqwest::blocking::Client,
    base_url: String,
    /// Optional cache directory for downloaded JSON files
    cache_dir: Option<PathBuf>,
    /// If true, only use cache (no network requests)
    offline_only: bool,
}

impl Default for OpenDataSource {
    fn default() -> Self {
        Self::new(&OpenDataConfig::default().base_url)
    }
}

impl OpenDataSource {
    pub fn new(base_url: &str) -> Self {
        let client = reqwest::blocking::Client::builder()
            .user_agent("sportboard/0.1")
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .expect("Failed to create HTTP client");

        OpenDataSource {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            cache_dir: None,
            offline_only: false,
        }
    }

    pub fn from_config(config: &OpenDataConfig) -> Self {
        let mut source = Self::new(&config.base_url).offline_only(config.offline);
        if let Some(dir) = &config.cache_dir {
            source = source.with_cache(dir);
        }
        source
    }

    /// Create source with a cache directory
    pub fn with_cache<P: AsRef<Path>>(mut self, cache_dir: P) -> Self {
        self.cache_dir = Some(cache_dir.as_ref().to_path_buf());
        self
    }

    /// Set offline-only mode (no network requests, cache must exist)
    pub fn offline_only(mut self, offline: bool) -> Self {
        self.offline_only = offline;
        self
    }

    fn cache_path(&self, path: &str) -> Option<PathBuf> {
        self.cache_dir.as_ref().map(|dir| dir.join(path))
    }

    fn load_from_cache(&self, path: &str) -> Option<String> {
        let file = self.cache_path(path)?;
        if file.exists() {
            log::debug!("Loading from cache: {}", file.display());
            std::fs::read_to_string(&file).ok()
        } else {
            None
        }
    }

    fn save_to_cache(&self, path: &str, body: &str) -> Result<()> {
        if let Some(file) = self.cache_path(path) {
            if let Some(parent) = file.parent() {
                std::fs::create_dir_all(parent)?;
            }
            std::fs::write(&file, body)?;
            log::debug!("Saved to cache: {}", file.display());
        }
        Ok(())
    }

    /// Fetch a JSON array by its path relative to the data root
    fn fetch(&self, path: &str) -> Result<Vec<Value>> {
        let body = match self.load_from_cache(path) {
            Some(body) => body,
            None if self.offline_only => {
                return Err(SportsError::SourceUnavailable {
                    endpoint: path.to_string(),
                    message: "not in cache and offline mode is on".to_string(),
                });
            }
            None => {
                let url = format!("{}/{}", self.base_url, path);
                log::info!("Fetching {}", url);
                let response = self.client.get(&url).send()?;
                if !response.status().is_success() {
                    return Err(SportsError::SourceUnavailable {
                        endpoint: path.to_string(),
                        message: format!("HTTP {}", response.status()),
                    });
                }
                let body = response.text()?;
                self.save_to_cache(path, &body)?;
                body
            }
        };

        match serde_json::from_str::<Value>(&body)? {
            Value::Array(records) => Ok(records),
            _ => Err(SportsError::SourceUnavailable {
                endpoint: path.to_string(),
                message: "expected a JSON array".to_string(),
            }),
        }
    }

    pub fn competitions(&self) -> Result<CompetitionCatalog> {
        let records = self.fetch("competitions.json")?;
        let competitions = records
            .iter()
            .map(|r| Competition::from_record(&flatten(r)))
            .collect::<Result<Vec<_>>>()?;
        Ok(CompetitionCatalog::new(competitions))
    }

    pub fn matches(&self, competition_id: i64, season_id: i64) -> Result<Vec<MatchInfo>> {
        let records = self.fetch(&format!("matches/{}/{}.json", competition_id, season_id))?;
        records
            .iter()
            .map(|r| MatchInfo::from_record(&flatten(r)))
            .collect()
    }
}

impl MatchDataSource for OpenDataSource {
    fn events(&self, match_id: i64) -> Result<Vec<MatchEvent>> {
        let records = self.fetch(&format!("events/{}.json", match_id))?;
        let events = parse_events(&records)?;
        log::info!("Parsed {} events for match {}", events.len(), match_id);
        Ok(events)
    }

    fn lineups(&self, match_id: i64) -> Result<Vec<RosterEntry>> {
        let records = self.fetch(&format!("lineups/{}.json", match_id))?;
        parse_lineups(&records)
    }
}
