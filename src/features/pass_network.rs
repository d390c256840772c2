//! Pass network
//!
//! Completed passes of one team before its first substitution, counted per
//! (passer, recipient) pair, with every passer's average origin location.
//! Players are identified by jersey number.

use std::collections::{BTreeMap, HashMap};

use serde::{Deserialize, Serialize};

use crate::data::sources::open_data::{MatchEvent, PitchPoint, RosterEntry};
use crate::{Result, SportsError};

/// Which substitution closes the window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CutoffPolicy {
    /// First substitution made by the team itself
    #[default]
    TeamFirstSubstitution,
    /// First substitution made by either team
    MatchFirstSubstitution,
}

impl std::str::FromStr for CutoffPolicy {
    type Err = String;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "team" => Ok(CutoffPolicy::TeamFirstSubstitution),
            "match" => Ok(CutoffPolicy::MatchFirstSubstitution),
            _ => Err(format!("Unknown cutoff: {}. Use team or match", s)),
        }
    }
}

/// Minute of the first substitution under `policy`; `None` if nobody was
/// substituted, meaning the window is unbounded.
pub fn substitution_cutoff(events: &[MatchEvent], team: &str, policy: CutoffPolicy) -> Option<u32> {
    events
        .iter()
        .filter(|e| e.is_substitution())
        .filter(|e| policy == CutoffPolicy::MatchFirstSubstitution || e.team_name == team)
        .map(|e| e.minute)
        .min()
}

/// Events strictly before the cutoff minute
pub fn filter_before_cutoff<'a, I>(events: I, cutoff: Option<u32>) -> Vec<&'a MatchEvent>
where
    I: IntoIterator<Item = &'a MatchEvent>,
{
    events
        .into_iter()
        .filter(|e| cutoff.map_or(true, |minute| e.minute < minute))
        .collect()
}

/// Completed passes between two players
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PassPair {
    pub passer: u32,
    pub recipient: u32,
    pub pass_count: u32,
    /// Passer's average origin over all of their completed passes
    pub passer_location: PitchPoint,
    /// Recipient's own average origin; `None` if they made no pass
    #[serde(with = "optional_point")]
    pub recipient_location: Option<PitchPoint>,
}

/// Always written as `{x, y}` so every pair has the same columns once
/// flattened; a missing point has null coordinates.
mod optional_point {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use crate::data::sources::open_data::PitchPoint;

    #[derive(Serialize, Deserialize)]
    struct Coords {
        x: Option<f64>,
        y: Option<f64>,
    }

    pub fn serialize<S: Serializer>(
        point: &Option<PitchPoint>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        Coords {
            x: point.map(|p| p.x),
            y: point.map(|p| p.y),
        }
        .serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<PitchPoint>, D::Error> {
        let coords = Coords::deserialize(deserializer)?;
        Ok(match (coords.x, coords.y) {
            (Some(x), Some(y)) => Some(PitchPoint::new(x, y)),
            _ => None,
        })
    }
}

/// A passer's node in the network
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AverageLocation {
    pub jersey: u32,
    pub player_name: String,
    pub x: f64,
    pub y: f64,
    pub count: u32,
}

impl AverageLocation {
    pub fn point(&self) -> PitchPoint {
        PitchPoint::new(self.x, self.y)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PassNetwork {
    pub team: String,
    pub cutoff_minute: Option<u32>,
    pub pairs: Vec<PassPair>,
    pub positions: Vec<AverageLocation>,
}

impl PassNetwork {
    /// No completed pass in the window
    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty() && self.positions.is_empty()
    }

    pub fn positions_for(&self, jersey: u32) -> Option<&AverageLocation> {
        self.positions.iter().find(|p| p.jersey == jersey)
    }

    /// Heaviest outgoing link of a player; earliest pair in jersey order on ties
    pub fn top_pass_to(&self, jersey: u32) -> Option<&PassPair> {
        heaviest(self.pairs.iter().filter(|p| p.passer == jersey))
    }

    /// Heaviest incoming link of a player
    pub fn top_pass_from(&self, jersey: u32) -> Option<&PassPair> {
        heaviest(self.pairs.iter().filter(|p| p.recipient == jersey))
    }
}

fn heaviest<'a>(pairs: impl Iterator<Item = &'a PassPair>) -> Option<&'a PassPair> {
    pairs.fold(None, |best: Option<&PassPair>, pair| match best {
        Some(b) if b.pass_count >= pair.pass_count => Some(b),
        _ => Some(pair),
    })
}

#[derive(Default)]
struct LocationSum {
    x: f64,
    y: f64,
    count: u32,
}

/// Build the pass network of `team`.
///
/// Passers and recipients absent from the roster are left out. Failed
/// passes never count. A completed pass without an origin location is a
/// malformed record.
pub fn build_pass_network(
    events: &[MatchEvent],
    roster: &[RosterEntry],
    team: &str,
    policy: CutoffPolicy,
) -> Result<PassNetwork> {
    let mut jerseys: HashMap<i64, &RosterEntry> = HashMap::new();
    for entry in roster {
        jerseys.entry(entry.player_id).or_insert(entry);
    }

    let cutoff = substitution_cutoff(events, team, policy);
    let window = filter_before_cutoff(
        events.iter().filter(|e| e.team_name == team && e.is_completed_pass()),
        cutoff,
    );

    let mut locations: BTreeMap<u32, (LocationSum, &str)> = BTreeMap::new();
    let mut counts: BTreeMap<(u32, u32), u32> = BTreeMap::new();

    for pass in window {
        let passer = match pass.player_id.and_then(|id| jerseys.get(&id)) {
            Some(p) => *p,
            None => continue,
        };
        let recipient = match pass.pass_recipient_id.and_then(|id| jerseys.get(&id)) {
            Some(r) => *r,
            None => continue,
        };
        let origin = pass.location.ok_or_else(|| {
            SportsError::malformed("location", format!("pass {} has none", pass.id))
        })?;

        let (sum, _) = locations
            .entry(passer.jersey_number)
            .or_insert_with(|| (LocationSum::default(), passer.player_name.as_str()));
        sum.x += origin.x;
        sum.y += origin.y;
        sum.count += 1;

        *counts
            .entry((passer.jersey_number, recipient.jersey_number))
            .or_insert(0) += 1;
    }

    let positions: Vec<AverageLocation> = locations
        .into_iter()
        .map(|(jersey, (sum, name))| AverageLocation {
            jersey,
            player_name: name.to_string(),
            x: sum.x / sum.count as f64,
            y: sum.y / sum.count as f64,
            count: sum.count,
        })
        .collect();

    let point_of = |jersey: u32| {
        positions
            .iter()
            .find(|p| p.jersey == jersey)
            .map(AverageLocation::point)
    };

    let mut pairs = Vec::with_capacity(counts.len());
    for ((passer, recipient), pass_count) in counts {
        let Some(passer_location) = point_of(passer) else {
            continue;
        };
        pairs.push(PassPair {
            passer,
            recipient,
            pass_count,
            passer_location,
            recipient_location: point_of(recipient),
        });
    }

    log::debug!(
        "{}: {} passers, {} pass pairs, cutoff {:?}",
        team,
        positions.len(),
        pairs.len(),
        cutoff
    );

    Ok(PassNetwork {
        team: team.to_string(),
        cutoff_minute: cutoff,
        pairs,
        positions,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn roster() -> Vec<RosterEntry> {
        let entry = |id: i64, name: &str, jersey: u32, team: &str| RosterEntry {
            player_id: id,
            player_name: name.to_string(),
            jersey_number: jersey,
            team_name: team.to_string(),
        };
        vec![
            entry(1, "Alisson", 13, "Liverpool"),
            entry(2, "Virgil van Dijk", 4, "Liverpool"),
            entry(3, "Jordan Henderson", 14, "Liverpool"),
            entry(4, "Mohamed Salah", 11, "Liverpool"),
            entry(10, "Harry Kane", 10, "Tottenham Hotspur"),
            entry(11, "Son Heung-Min", 7, "Tottenham Hotspur"),
        ]
    }

    fn pass(team: &str, minute: u32, from: i64, to: i64, at: (f64, f64), failed: bool) -> MatchEvent {
        MatchEvent {
            id: format!("{}-{}-{}", minute, from, to),
            index: 0,
            period: 1,
            minute,
            second: 0,
            type_name: MatchEvent::PASS.to_string(),
            team_name: team.to_string(),
            player_id: Some(from),
            player_name: None,
            location: Some(PitchPoint::new(at.0, at.1)),
            pass_recipient_id: Some(to),
            pass_recipient_name: None,
            pass_end_location: Some(PitchPoint::new(at.0 + 10.0, at.1)),
            outcome_name: failed.then(|| "Incomplete".to_string()),
        }
    }

    fn substitution(team: &str, minute: u32) -> MatchEvent {
        MatchEvent {
            id: format!("sub-{}-{}", team, minute),
            index: 0,
            period: 2,
            minute,
            second: 0,
            type_name: MatchEvent::SUBSTITUTION.to_string(),
            team_name: team.to_string(),
            player_id: None,
            player_name: None,
            location: None,
            pass_recipient_id: None,
            pass_recipient_name: None,
            pass_end_location: None,
            outcome_name: None,
        }
    }

    fn match_events() -> Vec<MatchEvent> {
        vec![
            pass("Liverpool", 2, 1, 2, (10.0, 40.0), false),
            pass("Liverpool", 5, 2, 3, (30.0, 30.0), false),
            pass("Liverpool", 9, 2, 3, (40.0, 20.0), false),
            pass("Liverpool", 12, 3, 4, (60.0, 50.0), false),
            pass("Liverpool", 14, 3, 4, (62.0, 48.0), true),
            pass("Tottenham Hotspur", 20, 10, 11, (70.0, 40.0), false),
            substitution("Tottenham Hotspur", 55),
            pass("Liverpool", 58, 4, 3, (90.0, 30.0), false),
            substitution("Liverpool", 60),
            pass("Liverpool", 60, 3, 2, (50.0, 40.0), false),
            pass("Liverpool", 70, 2, 1, (20.0, 40.0), false),
        ]
    }

    #[test]
    fn test_cutoff_policies() {
        let events = match_events();
        assert_eq!(
            substitution_cutoff(&events, "Liverpool", CutoffPolicy::TeamFirstSubstitution),
            Some(60)
        );
        assert_eq!(
            substitution_cutoff(&events, "Liverpool", CutoffPolicy::MatchFirstSubstitution),
            Some(55)
        );
    }

    #[test]
    fn test_network_pairs_and_positions() {
        let network = build_pass_network(
            &match_events(),
            &roster(),
            "Liverpool",
            CutoffPolicy::TeamFirstSubstitution,
        )
        .unwrap();

        assert_eq!(network.cutoff_minute, Some(60));
        let pairs: Vec<(u32, u32, u32)> = network
            .pairs
            .iter()
            .map(|p| (p.passer, p.recipient, p.pass_count))
            .collect();
        assert_eq!(pairs, vec![(4, 14, 2), (11, 14, 1), (13, 4, 1), (14, 11, 1)]);

        let vvd = network.positions_for(4).unwrap();
        assert_eq!(vvd.player_name, "Virgil van Dijk");
        assert_eq!((vvd.x, vvd.y, vvd.count), (35.0, 25.0, 2));

        // failed pass at minute 14 does not move Henderson's average
        let hendo = network.positions_for(14).unwrap();
        assert_eq!((hendo.x, hendo.count), (60.0, 1));

        let to_hendo = &network.pairs[0];
        assert_eq!(to_hendo.passer_location, PitchPoint::new(35.0, 25.0));
        assert_eq!(to_hendo.recipient_location, Some(PitchPoint::new(60.0, 50.0)));
    }

    #[test]
    fn test_match_wide_cutoff_is_tighter() {
        let network = build_pass_network(
            &match_events(),
            &roster(),
            "Liverpool",
            CutoffPolicy::MatchFirstSubstitution,
        )
        .unwrap();
        assert!(network.positions_for(11).is_none());
        assert!(network.pairs.iter().all(|p| p.passer != 11));
    }

    #[test]
    fn test_recipient_without_passes_keeps_pair() {
        let events = vec![pass("Tottenham Hotspur", 20, 10, 11, (70.0, 40.0), false)];
        let network = build_pass_network(
            &events,
            &roster(),
            "Tottenham Hotspur",
            CutoffPolicy::TeamFirstSubstitution,
        )
        .unwrap();

        assert_eq!(network.pairs.len(), 1);
        assert_eq!(network.pairs[0].recipient_location, None);
        assert!(network.positions_for(7).is_none());
    }

    #[test]
    fn test_pairs_flatten_to_fixed_columns() {
        let events = vec![
            pass("Tottenham Hotspur", 20, 10, 11, (70.0, 40.0), false),
            pass("Tottenham Hotspur", 21, 11, 10, (60.0, 30.0), false),
            pass("Tottenham Hotspur", 22, 10, 11, (80.0, 50.0), false),
        ];
        let mut network = build_pass_network(
            &events,
            &roster(),
            "Tottenham Hotspur",
            CutoffPolicy::TeamFirstSubstitution,
        )
        .unwrap();
        network.pairs[1].recipient_location = None;

        let mut out = Vec::new();
        crate::report::write_rows(&network.pairs, crate::report::OutputFormat::Csv, &mut out)
            .unwrap();
        let csv = String::from_utf8(out).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(
            lines[0],
            "passer,recipient,pass_count,passer_location.x,passer_location.y,\
             recipient_location.x,recipient_location.y"
        );
        assert!(lines[2].ends_with(",,"));
        assert_eq!(lines[1].split(',').count(), lines[2].split(',').count());

        let json = serde_json::to_value(&network.pairs[1]).unwrap();
        assert!(json["recipient_location"]["x"].is_null());
        let back: PassPair = serde_json::from_value(json).unwrap();
        assert_eq!(back.recipient_location, None);
    }

    #[test]
    fn test_no_substitution_is_unbounded() {
        let events: Vec<MatchEvent> = match_events()
            .into_iter()
            .filter(|e| !e.is_substitution())
            .collect();
        let network = build_pass_network(
            &events,
            &roster(),
            "Liverpool",
            CutoffPolicy::TeamFirstSubstitution,
        )
        .unwrap();

        assert_eq!(network.cutoff_minute, None);
        let total: u32 = network.positions.iter().map(|p| p.count).sum();
        assert_eq!(total, 7);
    }

    #[test]
    fn test_no_passes_before_cutoff_is_empty() {
        let events = vec![
            substitution("Liverpool", 0),
            pass("Liverpool", 3, 1, 2, (10.0, 40.0), false),
        ];
        let network = build_pass_network(
            &events,
            &roster(),
            "Liverpool",
            CutoffPolicy::TeamFirstSubstitution,
        )
        .unwrap();
        assert!(network.is_empty());
        assert!(network.pairs.is_empty());
    }

    #[test]
    fn test_unknown_team_is_empty() {
        let network =
            build_pass_network(&match_events(), &roster(), "Arsenal", CutoffPolicy::default()).unwrap();
        assert!(network.is_empty());
        assert_eq!(network.cutoff_minute, None);
    }

    #[test]
    fn test_off_roster_players_are_dropped() {
        let events = vec![
            pass("Liverpool", 3, 1, 99, (10.0, 40.0), false),
            pass("Liverpool", 4, 99, 2, (10.0, 40.0), false),
        ];
        let network =
            build_pass_network(&events, &roster(), "Liverpool", CutoffPolicy::default()).unwrap();
        assert!(network.is_empty());
    }

    #[test]
    fn test_pass_without_location_is_malformed() {
        let mut event = pass("Liverpool", 3, 1, 2, (10.0, 40.0), false);
        event.location = None;
        let err = build_pass_network(&[event], &roster(), "Liverpool", CutoffPolicy::default())
            .unwrap_err();
        assert!(matches!(err, SportsError::MalformedRecord { .. }));
    }

    #[test]
    fn test_top_links() {
        let network = build_pass_network(
            &match_events(),
            &roster(),
            "Liverpool",
            CutoffPolicy::TeamFirstSubstitution,
        )
        .unwrap();
        let to = network.top_pass_to(4).unwrap();
        assert_eq!((to.recipient, to.pass_count), (14, 2));
        let from = network.top_pass_from(14).unwrap();
        assert_eq!(from.passer, 4);
        assert!(network.top_pass_from(13).is_none());
    }

    fn random_events() -> impl Strategy<Value = Vec<MatchEvent>> {
        let event = (
            0u32..95,
            1i64..5,
            1i64..5,
            (0.0f64..120.0, 0.0f64..80.0),
            prop::bool::weighted(0.2),
            prop::bool::weighted(0.05),
        )
            .prop_map(|(minute, from, to, at, failed, sub)| {
                if sub {
                    substitution("Liverpool", minute)
                } else {
                    pass("Liverpool", minute, from, to, at, failed)
                }
            });
        prop::collection::vec(event, 0..60)
    }

    proptest! {
        #[test]
        fn prop_pair_counts_sum_to_passer_count(events in random_events()) {
            let network = build_pass_network(&events, &roster(), "Liverpool", CutoffPolicy::default()).unwrap();
            for position in &network.positions {
                let sum: u32 = network
                    .pairs
                    .iter()
                    .filter(|p| p.passer == position.jersey)
                    .map(|p| p.pass_count)
                    .sum();
                prop_assert_eq!(sum, position.count);
            }
        }

        #[test]
        fn prop_cutoff_filter_is_idempotent(events in random_events(), cutoff in prop::option::of(0u32..95)) {
            let once = filter_before_cutoff(&events, cutoff);
            let twice = filter_before_cutoff(once.iter().copied(), cutoff);
            prop_assert_eq!(once, twice);
        }
    }
}
