//! League analytics over a season's fixtures
//!
//! A win is worth 3 points, a draw 1 and a loss 0. Fixtures without a
//! final score are not counted anywhere.

use std::collections::{BTreeMap, BTreeSet, HashMap};

use chrono::{DateTime, Datelike, FixedOffset, Weekday};
use serde::{Deserialize, Serialize};

use crate::data::sources::football::Fixture;
use crate::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Home,
    Away,
}

impl Side {
    fn team<'a>(&self, fixture: &'a Fixture) -> &'a str {
        match self {
            Side::Home => &fixture.home_team,
            Side::Away => &fixture.away_team,
        }
    }

    fn opponent<'a>(&self, fixture: &'a Fixture) -> &'a str {
        match self {
            Side::Home => &fixture.away_team,
            Side::Away => &fixture.home_team,
        }
    }

    fn winner(&self, fixture: &Fixture) -> Option<bool> {
        match self {
            Side::Home => fixture.home_winner,
            Side::Away => fixture.away_winner,
        }
    }

    fn goals(&self, fixture: &Fixture) -> Option<(u32, u32)> {
        let (home, away) = (fixture.home_goals?, fixture.away_goals?);
        Some(match self {
            Side::Home => (home, away),
            Side::Away => (away, home),
        })
    }
}

impl std::fmt::Display for Side {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Side::Home => write!(f, "Home"),
            Side::Away => write!(f, "Away"),
        }
    }
}

/// Points earned from a winner flag
pub fn points_for(winner: Option<bool>) -> u32 {
    match winner {
        Some(true) => 3,
        Some(false) => 0,
        None => 1,
    }
}

fn played(fixtures: &[Fixture]) -> impl Iterator<Item = &Fixture> {
    fixtures.iter().filter(|f| f.is_played())
}

/// Win/draw/loss record of each team on one side
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SideRecord {
    pub team: String,
    pub wins: u32,
    pub draws: u32,
    pub losses: u32,
    pub points: u32,
}

/// Records of every team playing on `side`, sorted by team name
pub fn side_records(fixtures: &[Fixture], side: Side) -> Vec<SideRecord> {
    let mut records: BTreeMap<&str, SideRecord> = BTreeMap::new();
    for fixture in played(fixtures) {
        let team = side.team(fixture);
        let record = records.entry(team).or_insert_with(|| SideRecord {
            team: team.to_string(),
            wins: 0,
            draws: 0,
            losses: 0,
            points: 0,
        });
        let winner = side.winner(fixture);
        match winner {
            Some(true) => record.wins += 1,
            Some(false) => record.losses += 1,
            None => record.draws += 1,
        }
        record.points += points_for(winner);
    }
    records.into_values().collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalTally {
    pub team: String,
    pub scored: u32,
    pub conceded: u32,
}

/// Goals scored and conceded per team, sorted by team name
pub fn goals_for_against(fixtures: &[Fixture]) -> Vec<GoalTally> {
    let mut tallies: BTreeMap<&str, (u32, u32)> = BTreeMap::new();
    for fixture in played(fixtures) {
        for side in [Side::Home, Side::Away] {
            if let Some((scored, conceded)) = side.goals(fixture) {
                let tally = tallies.entry(side.team(fixture)).or_default();
                tally.0 += scored;
                tally.1 += conceded;
            }
        }
    }
    tallies
        .into_iter()
        .map(|(team, (scored, conceded))| GoalTally {
            team: team.to_string(),
            scored,
            conceded,
        })
        .collect()
}

/// Points after one fixture, with the team's running total
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PointsRow {
    pub date: String,
    pub team: String,
    pub points: u32,
    pub cum_points: u32,
}

fn dated(fixtures: &[Fixture]) -> Result<Vec<(DateTime<FixedOffset>, &Fixture)>> {
    let mut dated = played(fixtures)
        .map(|f| Ok((f.kick_off()?, f)))
        .collect::<Result<Vec<_>>>()?;
    dated.sort_by_key(|(kick_off, _)| *kick_off);
    Ok(dated)
}

/// Running points per team in kick-off order
pub fn cumulative_points(fixtures: &[Fixture]) -> Result<Vec<PointsRow>> {
    let mut totals: HashMap<&str, u32> = HashMap::new();
    let mut rows = Vec::new();

    for (_, fixture) in dated(fixtures)? {
        for side in [Side::Home, Side::Away] {
            let team = side.team(fixture);
            let points = points_for(side.winner(fixture));
            let total = totals.entry(team).or_insert(0);
            *total += points;
            rows.push(PointsRow {
                date: fixture.date.clone(),
                team: team.to_string(),
                points,
                cum_points: *total,
            });
        }
    }
    Ok(rows)
}

/// Share of possible home and away wins, one opponent per side
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WinPct {
    pub team: String,
    pub home_win_pct: f64,
    pub away_win_pct: f64,
}

/// Home and away win percentage, `wins / (n_teams - 1) * 100`.
///
/// Empty with fewer than two teams.
pub fn home_away_win_pct(fixtures: &[Fixture], n_teams: usize) -> Vec<WinPct> {
    if n_teams < 2 {
        return Vec::new();
    }
    let opponents = (n_teams - 1) as f64;

    let mut teams: BTreeSet<&str> = BTreeSet::new();
    let mut home_wins: HashMap<&str, u32> = HashMap::new();
    let mut away_wins: HashMap<&str, u32> = HashMap::new();
    for fixture in played(fixtures) {
        teams.insert(&fixture.home_team);
        teams.insert(&fixture.away_team);
        if fixture.home_winner == Some(true) {
            *home_wins.entry(&fixture.home_team).or_insert(0) += 1;
        }
        if fixture.away_winner == Some(true) {
            *away_wins.entry(&fixture.away_team).or_insert(0) += 1;
        }
    }

    teams
        .into_iter()
        .map(|team| WinPct {
            team: team.to_string(),
            home_win_pct: home_wins.get(team).copied().unwrap_or(0) as f64 / opponents * 100.0,
            away_win_pct: away_wins.get(team).copied().unwrap_or(0) as f64 / opponents * 100.0,
        })
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekdayWins {
    pub weekday: String,
    pub home_wins: u32,
    pub away_wins: u32,
}

const WEEK: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

/// Home and away wins per kick-off weekday, Monday first.
/// The weekday is taken in the fixture's own UTC offset.
pub fn wins_per_weekday(fixtures: &[Fixture]) -> Result<Vec<WeekdayWins>> {
    let mut counts = [(0u32, 0u32); 7];
    for (kick_off, fixture) in dated(fixtures)? {
        let slot = &mut counts[kick_off.weekday().num_days_from_monday() as usize];
        if fixture.home_winner == Some(true) {
            slot.0 += 1;
        }
        if fixture.away_winner == Some(true) {
            slot.1 += 1;
        }
    }

    Ok(WEEK
        .iter()
        .zip(counts)
        .map(|(day, (home_wins, away_wins))| WeekdayWins {
            weekday: weekday_name(*day).to_string(),
            home_wins,
            away_wins,
        })
        .collect())
}

/// One game of a team's season
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrendRow {
    pub date: String,
    pub opponent: String,
    pub home_away: String,
    pub points: u32,
    pub label: String,
    /// Bar height: 3 for a win, 1 for a draw, a sliver for a loss
    pub level: f64,
}

fn level_for(points: u32) -> f64 {
    match points {
        3 => 3.0,
        1 => 1.0,
        _ => 0.1,
    }
}

/// Results of `team` in kick-off order
pub fn team_trend(fixtures: &[Fixture], team: &str) -> Result<Vec<TrendRow>> {
    let mut rows = Vec::new();
    for (_, fixture) in dated(fixtures)? {
        let side = if fixture.home_team == team {
            Side::Home
        } else if fixture.away_team == team {
            Side::Away
        } else {
            continue;
        };

        let points = points_for(side.winner(fixture));
        rows.push(TrendRow {
            date: fixture.date.clone(),
            opponent: side.opponent(fixture).to_string(),
            home_away: match side {
                Side::Home => "H".to_string(),
                Side::Away => "A".to_string(),
            },
            points,
            label: format!(
                "{} vs {} | {}-{}",
                fixture.home_team,
                fixture.away_team,
                fixture.home_goals.unwrap_or(0),
                fixture.away_goals.unwrap_or(0)
            ),
            level: level_for(points),
        });
    }
    Ok(rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::normalize::flatten;
    use crate::data::sources::football::tests::fixture_json;
    use crate::SportsError;

    fn fixture(id: i64, date: &str, home: &str, away: &str, goals: Option<(u32, u32)>) -> Fixture {
        Fixture::from_record(&flatten(&fixture_json(id, date, home, away, goals))).unwrap()
    }

    // Mon 2023-08-21, Sat 2023-08-19, Sun 2023-08-20, Sat 2023-08-26
    fn season() -> Vec<Fixture> {
        vec![
            fixture(1, "2023-08-21T18:45:00+00:00", "Inter", "Monza", Some((2, 0))),
            fixture(2, "2023-08-19T16:30:00+00:00", "Empoli", "Verona", Some((0, 1))),
            fixture(3, "2023-08-20T18:45:00+00:00", "Monza", "Empoli", Some((1, 1))),
            fixture(4, "2023-08-26T18:45:00+00:00", "Verona", "Inter", Some((0, 3))),
            fixture(5, "2024-05-26T18:45:00+00:00", "Inter", "Verona", None),
        ]
    }

    #[test]
    fn test_side_records() {
        let home = side_records(&season(), Side::Home);
        let teams: Vec<&str> = home.iter().map(|r| r.team.as_str()).collect();
        assert_eq!(teams, vec!["Empoli", "Inter", "Monza", "Verona"]);

        let inter = &home[1];
        assert_eq!((inter.wins, inter.draws, inter.losses, inter.points), (1, 0, 0, 3));
        let monza = &home[2];
        assert_eq!((monza.draws, monza.points), (1, 1));
        assert_eq!(home[3].losses, 1);

        let away = side_records(&season(), Side::Away);
        assert_eq!(away.iter().find(|r| r.team == "Verona").unwrap().wins, 1);
    }

    #[test]
    fn test_goals_for_against() {
        let goals = goals_for_against(&season());
        let inter = goals.iter().find(|g| g.team == "Inter").unwrap();
        assert_eq!((inter.scored, inter.conceded), (5, 0));
        let empoli = goals.iter().find(|g| g.team == "Empoli").unwrap();
        assert_eq!((empoli.scored, empoli.conceded), (1, 2));
    }

    #[test]
    fn test_cumulative_points() {
        let rows = cumulative_points(&season()).unwrap();
        assert_eq!(rows.len(), 8);
        assert_eq!(rows[0].team, "Empoli");
        assert!(rows.windows(2).all(|w| w[0].date <= w[1].date));

        let inter: Vec<u32> = rows
            .iter()
            .filter(|r| r.team == "Inter")
            .map(|r| r.cum_points)
            .collect();
        assert_eq!(inter, vec![3, 6]);
        let monza: Vec<u32> = rows
            .iter()
            .filter(|r| r.team == "Monza")
            .map(|r| r.cum_points)
            .collect();
        assert_eq!(monza, vec![1, 1]);
    }

    #[test]
    fn test_home_away_win_pct() {
        let pct = home_away_win_pct(&season(), 5);
        let inter = pct.iter().find(|p| p.team == "Inter").unwrap();
        assert_eq!(inter.home_win_pct, 25.0);
        assert_eq!(inter.away_win_pct, 25.0);
        let empoli = pct.iter().find(|p| p.team == "Empoli").unwrap();
        assert_eq!(empoli.home_win_pct, 0.0);

        assert!(home_away_win_pct(&season(), 1).is_empty());
        assert!(home_away_win_pct(&season(), 0).is_empty());
    }

    #[test]
    fn test_wins_per_weekday() {
        let wins = wins_per_weekday(&season()).unwrap();
        assert_eq!(wins.len(), 7);
        assert_eq!(wins[0].weekday, "Monday");
        assert_eq!(wins[0].home_wins, 1);
        assert_eq!(wins[5].weekday, "Saturday");
        assert_eq!((wins[5].home_wins, wins[5].away_wins), (0, 2));
        assert_eq!((wins[6].home_wins, wins[6].away_wins), (0, 0));
    }

    #[test]
    fn test_team_trend() {
        let trend = team_trend(&season(), "Inter").unwrap();
        assert_eq!(trend.len(), 2);
        assert_eq!(trend[0].home_away, "H");
        assert_eq!(trend[0].label, "Inter vs Monza | 2-0");
        assert_eq!(trend[1].home_away, "A");
        assert_eq!(trend[1].opponent, "Verona");
        assert_eq!(trend[1].label, "Verona vs Inter | 0-3");

        let empoli = team_trend(&season(), "Empoli").unwrap();
        let levels: Vec<f64> = empoli.iter().map(|r| r.level).collect();
        assert_eq!(levels, vec![0.1, 1.0]);
    }

    #[test]
    fn test_bad_kick_off_is_malformed() {
        let mut fixtures = season();
        fixtures[0].date = "yesterday".to_string();
        let err = team_trend(&fixtures, "Inter").unwrap_err();
        assert!(matches!(err, SportsError::MalformedRecord { .. }));
    }

    #[test]
    fn test_empty_fixtures() {
        assert!(side_records(&[], Side::Home).is_empty());
        assert!(cumulative_points(&[]).unwrap().is_empty());
        assert!(wins_per_weekday(&[]).unwrap().iter().all(|w| w.home_wins == 0));
    }
}
