//! Super Time: each entrant's fastest lap relative to the race's fastest
//!
//! For a race, `ratio = time_ms / min(time_ms)` and
//! `delta% = round((ratio - 1) * 100, 2)`. The fastest entrant always has a
//! ratio of exactly 1.0.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::lap_time::parse_lap_time;
use crate::data::sources::formula1::{FastestLap, RaceLaps};
use crate::Result;

/// Whose laps are compared
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    #[default]
    Driver,
    Team,
}

impl std::str::FromStr for EntityKind {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "driver" | "drivers" => Ok(EntityKind::Driver),
            "team" | "teams" => Ok(EntityKind::Team),
            _ => Err(format!("Unknown entity: {}. Use driver or team", s)),
        }
    }
}

/// One entrant of one race
#[derive(Debug, Clone, PartialEq)]
pub struct SuperTimeEntry {
    pub entity_name: String,
    pub image_url: Option<String>,
    pub time: String,
    pub time_ms: f64,
    pub ratio: f64,
    pub delta_pct: f64,
}

/// Season row, one per (race, entity)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SuperTimeRow {
    pub race_index: usize,
    pub race_name: String,
    pub entity_name: String,
    pub image_url: Option<String>,
    pub time: String,
    pub time_ms: f64,
    #[serde(rename = "superTimeRatio")]
    pub super_time_ratio: f64,
    #[serde(rename = "superTimeDelta%")]
    pub super_time_delta_pct: f64,
}

/// Round to two decimal places
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Percentage delta from a ratio
pub fn delta_pct(ratio: f64) -> f64 {
    round2((ratio - 1.0) * 100.0)
}

struct Timed<'a> {
    lap: &'a FastestLap,
    time_ms: f64,
}

impl Timed<'_> {
    fn entity(&self, by: EntityKind) -> (&str, Option<&String>) {
        match by {
            EntityKind::Driver => (&self.lap.driver_name, self.lap.driver_image.as_ref()),
            EntityKind::Team => (&self.lap.team_name, self.lap.team_logo.as_ref()),
        }
    }
}

/// Keep each team's fastest lap, in order of the team's first appearance.
/// On equal times the earlier lap is kept.
fn fastest_per_team(timed: Vec<Timed<'_>>) -> Vec<Timed<'_>> {
    let mut slot: HashMap<&str, usize> = HashMap::new();
    let mut kept: Vec<Timed<'_>> = Vec::new();

    for entry in timed {
        match slot.get(entry.lap.team_name.as_str()) {
            Some(&i) => {
                if entry.time_ms < kept[i].time_ms {
                    kept[i] = entry;
                }
            }
            None => {
                slot.insert(entry.lap.team_name.as_str(), kept.len());
                kept.push(entry);
            }
        }
    }
    kept
}

/// Super Time entries of one race, in ranking order.
///
/// Any unparseable lap time fails the whole race. A race without laps
/// gives no entries.
pub fn compute_race(race: &RaceLaps, by: EntityKind) -> Result<Vec<SuperTimeEntry>> {
    let mut timed = race
        .laps
        .iter()
        .map(|lap| {
            Ok(Timed {
                lap,
                time_ms: parse_lap_time(&lap.time)?,
            })
        })
        .collect::<Result<Vec<_>>>()?;

    if by == EntityKind::Team {
        timed = fastest_per_team(timed);
    }

    let fastest = timed
        .iter()
        .map(|t| t.time_ms)
        .fold(f64::INFINITY, f64::min);

    Ok(timed
        .iter()
        .map(|t| {
            let (name, image) = t.entity(by);
            let ratio = t.time_ms / fastest;
            SuperTimeEntry {
                entity_name: name.to_string(),
                image_url: image.cloned(),
                time: t.lap.time.clone(),
                time_ms: t.time_ms,
                ratio,
                delta_pct: delta_pct(ratio),
            }
        })
        .collect())
}

/// Flatten a season into rows. Races without laps are left out and
/// `race_index` counts only the races kept, starting at 1.
pub fn build_super_time_table(races: &[RaceLaps], by: EntityKind) -> Result<Vec<SuperTimeRow>> {
    let mut rows = Vec::new();
    let mut race_index = 0;

    for race in races.iter().filter(|r| !r.laps.is_empty()) {
        race_index += 1;
        let race_name = if race.race_name.trim().is_empty() {
            format!("GP {}", race_index)
        } else {
            race.race_name.clone()
        };

        for entry in compute_race(race, by)? {
            rows.push(SuperTimeRow {
                race_index,
                race_name: race_name.clone(),
                entity_name: entry.entity_name,
                image_url: entry.image_url,
                time: entry.time,
                time_ms: entry.time_ms,
                super_time_ratio: entry.ratio,
                super_time_delta_pct: entry.delta_pct,
            });
        }
    }

    log::debug!("Built {} super time rows over {} races", rows.len(), race_index);
    Ok(rows)
}

/// Rows of one driver or team across the season
#[derive(Debug, Clone, PartialEq)]
pub struct EntitySeries<'a> {
    pub entity_name: &'a str,
    pub rows: Vec<&'a SuperTimeRow>,
}

/// Group rows per entity, entities in first-seen order
pub fn series_by_entity(rows: &[SuperTimeRow]) -> Vec<EntitySeries<'_>> {
    let mut slot: HashMap<&str, usize> = HashMap::new();
    let mut series: Vec<EntitySeries<'_>> = Vec::new();

    for row in rows {
        let i = *slot.entry(row.entity_name.as_str()).or_insert_with(|| {
            series.push(EntitySeries {
                entity_name: &row.entity_name,
                rows: Vec::new(),
            });
            series.len() - 1
        });
        series[i].rows.push(row);
    }
    series
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::features::lap_time::format_lap_time;
    use crate::SportsError;
    use proptest::prelude::*;

    fn lap(driver: &str, team: &str, time: &str) -> FastestLap {
        FastestLap {
            driver_id: None,
            driver_name: driver.to_string(),
            driver_image: Some(format!("{}.png", driver)),
            team_id: None,
            team_name: team.to_string(),
            team_logo: Some(format!("{}.svg", team)),
            position: None,
            time: time.to_string(),
        }
    }

    fn race(id: i64, name: &str, laps: Vec<FastestLap>) -> RaceLaps {
        RaceLaps {
            race_id: id,
            race_name: name.to_string(),
            laps,
        }
    }

    #[test]
    fn test_two_driver_race() {
        let r = race(
            1,
            "Bahrain Grand Prix",
            vec![lap("Leclerc", "Ferrari", "01:23.456"), lap("Sainz", "Ferrari", "01:24.000")],
        );
        let entries = compute_race(&r, EntityKind::Driver).unwrap();

        assert_eq!(entries[0].ratio, 1.0);
        assert!((entries[1].ratio - 1.0065).abs() < 1e-4);
        assert_eq!(entries[0].delta_pct, 0.0);
        assert_eq!(entries[1].delta_pct, 0.65);
        assert_eq!(entries[1].time_ms, 84_000.0);
        assert_eq!(entries[1].image_url.as_deref(), Some("Sainz.png"));
    }

    #[test]
    fn test_single_entrant() {
        let r = race(1, "Monaco Grand Prix", vec![lap("Norris", "McLaren", "1:14.693")]);
        let entries = compute_race(&r, EntityKind::Driver).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].ratio, 1.0);
        assert_eq!(entries[0].delta_pct, 0.0);
    }

    #[test]
    fn test_malformed_time_fails_race() {
        let r = race(
            1,
            "Bahrain Grand Prix",
            vec![lap("Leclerc", "Ferrari", "01:23.456"), lap("Sainz", "Ferrari", "abc")],
        );
        let err = compute_race(&r, EntityKind::Driver).unwrap_err();
        assert!(matches!(err, SportsError::Parse(_)));

        let err = build_super_time_table(&[r], EntityKind::Team).unwrap_err();
        assert!(matches!(err, SportsError::Parse(_)));
    }

    #[test]
    fn test_zero_lap_time_fails_race() {
        let r = race(
            1,
            "Bahrain Grand Prix",
            vec![lap("Leclerc", "Ferrari", "0:00.000"), lap("Sainz", "Ferrari", "1:20.000")],
        );
        let err = compute_race(&r, EntityKind::Driver).unwrap_err();
        assert!(matches!(err, SportsError::Parse(_)));
    }

    #[test]
    fn test_team_view_keeps_fastest_driver() {
        let r = race(
            1,
            "Italian Grand Prix",
            vec![
                lap("Sainz", "Ferrari", "1:25.072"),
                lap("Verstappen", "Red Bull", "1:25.100"),
                lap("Leclerc", "Ferrari", "1:24.990"),
                lap("Perez", "Red Bull", "1:25.100"),
            ],
        );
        let entries = compute_race(&r, EntityKind::Team).unwrap();

        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].entity_name, "Ferrari");
        assert_eq!(entries[0].time, "1:24.990");
        assert_eq!(entries[0].image_url.as_deref(), Some("Ferrari.svg"));
        assert_eq!(entries[0].ratio, 1.0);
        assert_eq!(entries[1].entity_name, "Red Bull");
        assert!(entries[1].ratio > 1.0);
    }

    #[test]
    fn test_team_tie_keeps_first_occurrence() {
        let laps = vec![
            lap("Verstappen", "Red Bull", "1:25.100"),
            lap("Perez", "Red Bull", "1:25.100"),
        ];
        let timed: Vec<Timed<'_>> = laps
            .iter()
            .map(|l| Timed {
                lap: l,
                time_ms: parse_lap_time(&l.time).unwrap(),
            })
            .collect();
        let kept = fastest_per_team(timed);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].lap.driver_name, "Verstappen");
    }

    #[test]
    fn test_season_table_skips_empty_races() {
        let season = vec![
            race(
                10,
                "Bahrain Grand Prix",
                vec![lap("Leclerc", "Ferrari", "01:23.456"), lap("Sainz", "Ferrari", "01:24.000")],
            ),
            race(11, "Saudi Arabian Grand Prix", vec![]),
            race(12, "", vec![lap("Russell", "Mercedes", "1:20.235")]),
        ];
        let rows = build_super_time_table(&season, EntityKind::Driver).unwrap();

        assert_eq!(rows.len(), 3);
        assert_eq!(rows[0].race_index, 1);
        assert_eq!(rows[2].race_index, 2);
        assert_eq!(rows[2].race_name, "GP 2");
        assert_eq!(rows[1].super_time_delta_pct, 0.65);
    }

    #[test]
    fn test_row_column_names() {
        let rows = build_super_time_table(
            &[race(1, "Bahrain Grand Prix", vec![lap("Zhou", "Alfa Romeo", "1:33.996")])],
            EntityKind::Driver,
        )
        .unwrap();
        let json = serde_json::to_value(&rows[0]).unwrap();
        let keys: Vec<&str> = json.as_object().unwrap().keys().map(String::as_str).collect();
        assert_eq!(
            keys,
            vec![
                "race_index",
                "race_name",
                "entity_name",
                "image_url",
                "time",
                "time_ms",
                "superTimeRatio",
                "superTimeDelta%"
            ]
        );
    }

    #[test]
    fn test_series_by_entity() {
        let season = vec![
            race(
                1,
                "A",
                vec![lap("Hamilton", "Mercedes", "1:30.000"), lap("Alonso", "Aston Martin", "1:30.500")],
            ),
            race(
                2,
                "B",
                vec![lap("Alonso", "Aston Martin", "1:29.000"), lap("Hamilton", "Mercedes", "1:29.100")],
            ),
        ];
        let rows = build_super_time_table(&season, EntityKind::Driver).unwrap();
        let series = series_by_entity(&rows);

        assert_eq!(series.len(), 2);
        assert_eq!(series[0].entity_name, "Hamilton");
        let indexes: Vec<usize> = series[0].rows.iter().map(|r| r.race_index).collect();
        assert_eq!(indexes, vec![1, 2]);
    }

    #[test]
    fn test_entity_kind_from_str() {
        assert_eq!("Team".parse::<EntityKind>().unwrap(), EntityKind::Team);
        assert_eq!("driver".parse::<EntityKind>().unwrap(), EntityKind::Driver);
        assert!("car".parse::<EntityKind>().is_err());
    }

    fn lap_times() -> impl Strategy<Value = Vec<String>> {
        prop::collection::vec(
            (60_000u64..120_000).prop_map(|ms| format_lap_time(ms as f64)),
            1..20,
        )
    }

    proptest! {
        #[test]
        fn prop_fastest_ratio_is_one(times in lap_times(), team in prop::bool::ANY) {
            let laps = times
                .iter()
                .enumerate()
                .map(|(i, t)| lap(&format!("D{}", i), &format!("T{}", i % 4), t))
                .collect();
            let by = if team { EntityKind::Team } else { EntityKind::Driver };
            let entries = compute_race(&race(1, "R", laps), by).unwrap();

            let min = entries.iter().map(|e| e.ratio).fold(f64::INFINITY, f64::min);
            prop_assert_eq!(min, 1.0);
            prop_assert!(entries.iter().all(|e| e.ratio >= 1.0));
        }

        #[test]
        fn prop_delta_matches_ratio(times in lap_times()) {
            let laps = times.iter().map(|t| lap("D", "T", t)).collect();
            for entry in compute_race(&race(1, "R", laps), EntityKind::Driver).unwrap() {
                prop_assert_eq!(entry.delta_pct, round2((entry.ratio - 1.0) * 100.0));
            }
        }
    }
}
