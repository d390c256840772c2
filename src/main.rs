//! Sportboard CLI
//!
//! Prints the tables behind the Formula 1, football league and passing
//! network dashboards.

use clap::{Parser, Subcommand};
use sportboard::features::{CutoffPolicy, EntityKind};
use sportboard::report::OutputFormat;
use sportboard::{Config, Result};

#[derive(Parser)]
#[command(name = "sportboard")]
#[command(about = "Formula 1, football league and passing network analytics", long_about = None)]
struct Cli {
    /// Config file path
    #[arg(short, long, default_value = "config.toml")]
    config: String,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Formula 1 season analysis
    F1 {
        #[command(subcommand)]
        action: F1Commands,
    },
    /// Football league analytics
    Football {
        #[command(subcommand)]
        action: FootballCommands,
    },
    /// Match passing maps and pass networks
    Passing {
        #[command(subcommand)]
        action: PassingCommands,
    },
    /// Write a default config file
    Init,
}

#[derive(Subcommand)]
enum F1Commands {
    /// Season KPIs, championship tables and Super Times
    Season {
        season: i32,
        /// Compare drivers or teams
        #[arg(long, default_value = "driver")]
        by: EntityKind,
        /// Only show the Super Times of this driver or team
        #[arg(long)]
        entity: Option<String>,
        /// Output format
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
}

#[derive(Subcommand)]
enum FootballCommands {
    /// List countries with leagues
    Countries {
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// List the leagues of a country
    Leagues {
        country: String,
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Standings, points and trends of a league season
    Analytics {
        country: String,
        league: String,
        /// Defaults to the last completed season
        #[arg(long)]
        season: Option<i32>,
        /// Team for the trend table, defaults to the first listed
        #[arg(long)]
        team: Option<String>,
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
}

#[derive(clap::Args)]
struct CompetitionArgs {
    country: String,
    competition: String,
    season: String,
    /// male or female
    #[arg(long, default_value = "male")]
    gender: String,
}

#[derive(Subcommand)]
enum PassingCommands {
    /// List the competitions in the event-data repository
    Competitions {
        /// Only competitions of this country
        #[arg(long)]
        country: Option<String>,
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// List the matches of a competition season
    Matches {
        #[command(flatten)]
        competition: CompetitionArgs,
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
    /// Passing summary, pass network and player passes of a match
    Network {
        #[command(flatten)]
        competition: CompetitionArgs,
        /// Match to analyse, defaults to the first of the season
        #[arg(long)]
        match_id: Option<i64>,
        /// Substitution cutoff: team or match
        #[arg(long, default_value = "team")]
        policy: CutoffPolicy,
        /// Player whose passes are listed
        #[arg(long)]
        player: Option<String>,
        #[arg(long, default_value = "table")]
        format: OutputFormat,
    },
}

fn main() {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level))
        .format_timestamp(None)
        .init();

    // Load or create config
    let config = if std::path::Path::new(&cli.config).exists() {
        match Config::load(&cli.config) {
            Ok(c) => c,
            Err(e) => {
                eprintln!("Error loading config: {}", e);
                std::process::exit(1);
            }
        }
    } else {
        Config::default()
    };

    let result = match cli.command {
        Commands::F1 { action } => match action {
            F1Commands::Season {
                season,
                by,
                entity,
                format,
            } => commands::f1_season(&config, season, by, entity.as_deref(), format),
        },
        Commands::Football { action } => match action {
            FootballCommands::Countries { format } => commands::football_countries(&config, format),
            FootballCommands::Leagues { country, format } => {
                commands::football_leagues(&config, &country, format)
            }
            FootballCommands::Analytics {
                country,
                league,
                season,
                team,
                format,
            } => commands::football_analytics(
                &config,
                &country,
                &league,
                season,
                team.as_deref(),
                format,
            ),
        },
        Commands::Passing { action } => match action {
            PassingCommands::Competitions { country, format } => {
                commands::passing_competitions(&config, country.as_deref(), format)
            }
            PassingCommands::Matches {
                competition,
                format,
            } => commands::passing_matches(&config, &competition, format),
            PassingCommands::Network {
                competition,
                match_id,
                policy,
                player,
                format,
            } => commands::passing_network(
                &config,
                &competition,
                match_id,
                policy,
                player.as_deref(),
                format,
            ),
        },
        Commands::Init => commands::init(&cli.config),
    };

    if let Err(e) = result {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

mod commands {
    use super::*;
    use serde::Serialize;
    use std::io::Write;
    use sportboard::dashboard::{league_analytics, passing_analysis, season_analysis, PageOutcome};
    use sportboard::data::sources::open_data::{sort_matches_by_week, MatchInfo};
    use sportboard::data::sources::{FootballApi, Formula1Api, OpenDataSource};
    use sportboard::data::ApiClient;
    use sportboard::features::super_time::series_by_entity;
    use sportboard::report::write_rows;
    use sportboard::SportsError;

    /// One table of a page; the heading is only printed for table output
    fn section<T: Serialize>(title: &str, rows: &[T], format: OutputFormat) -> Result<()> {
        let mut out = std::io::stdout().lock();
        if format == OutputFormat::Table {
            writeln!(out, "\n{}", title)?;
        }
        write_rows(rows, format, &mut out)
    }

    fn no_data(message: &str) -> Result<()> {
        println!("{}", message);
        Ok(())
    }

    pub fn init(config_path: &str) -> Result<()> {
        let config = Config::default();
        config.save(config_path)?;
        println!("Created default config at {}", config_path);

        println!("\nNext steps:");
        println!(
            "  1. Set api_key under [formula1] and [football] in {}, or export {}",
            config_path,
            sportboard::API_KEY_ENV
        );
        println!("  2. Run 'sportboard f1 season 2023'");
        println!("  3. Run 'sportboard football analytics Italy \"Serie A\"'");

        Ok(())
    }

    pub fn f1_season(
        config: &Config,
        season: i32,
        by: EntityKind,
        entity: Option<&str>,
        format: OutputFormat,
    ) -> Result<()> {
        let client = ApiClient::from_config(&config.formula1, &config.cache)?;
        let api = Formula1Api::new(client);

        let report = match season_analysis(&api, season, by)? {
            PageOutcome::Ready(report) => report,
            PageOutcome::NoData(message) => return no_data(&message),
        };

        if let Some(name) = entity {
            let series = series_by_entity(&report.super_times);
            let rows = series
                .into_iter()
                .find(|s| s.entity_name == name)
                .map(|s| s.rows)
                .ok_or_else(|| {
                    SportsError::UnknownSelection(format!("no Super Times for {}", name))
                })?;
            return section(&format!("Super Times of {}", name), &rows, format);
        }

        section(&format!("{} season", season), &[&report.summary], format)?;
        section("Drivers championship", &report.top_drivers, format)?;
        section("Teams championship", &report.teams, format)?;
        section("Super Times", &report.super_times, format)
    }

    fn football_api(config: &Config) -> Result<FootballApi<ApiClient>> {
        let client = ApiClient::from_config(&config.football, &config.cache)?;
        Ok(FootballApi::new(client))
    }

    pub fn football_countries(config: &Config, format: OutputFormat) -> Result<()> {
        #[derive(Serialize)]
        struct Country {
            country: String,
        }

        let countries: Vec<Country> = football_api(config)?
            .countries()?
            .into_iter()
            .map(|country| Country { country })
            .collect();
        section("Countries", &countries, format)
    }

    pub fn football_leagues(config: &Config, country: &str, format: OutputFormat) -> Result<()> {
        let leagues = football_api(config)?.leagues(country)?;
        section(&format!("Leagues in {}", country), &leagues, format)
    }

    pub fn football_analytics(
        config: &Config,
        country: &str,
        league: &str,
        season: Option<i32>,
        team: Option<&str>,
        format: OutputFormat,
    ) -> Result<()> {
        let api = football_api(config)?;
        let report = match league_analytics(&api, country, league, season, team)? {
            PageOutcome::Ready(report) => report,
            PageOutcome::NoData(message) => return no_data(&message),
        };

        log::info!(
            "{} {}: {} fixtures, {} teams",
            report.league.name,
            report.season,
            report.fixtures.len(),
            report.teams.len()
        );
        section("Home results", &report.home_records, format)?;
        section("Away results", &report.away_records, format)?;
        section("Cumulative points", &report.cumulative_points, format)?;
        section("Home and away win %", &report.win_pct, format)?;
        section("Goals scored and conceded", &report.goals, format)?;
        section("Wins per weekday", &report.weekday_wins, format)?;
        section(&format!("{} trend", report.team), &report.trend, format)
    }

    fn select_matches(
        source: &OpenDataSource,
        args: &CompetitionArgs,
    ) -> Result<Vec<MatchInfo>> {
        let catalog = source.competitions()?;
        let competition =
            catalog.select(&args.country, &args.competition, &args.season, &args.gender)?;
        let mut matches = source.matches(competition.competition_id, competition.season_id)?;
        sort_matches_by_week(&mut matches);
        Ok(matches)
    }

    pub fn passing_competitions(
        config: &Config,
        country: Option<&str>,
        format: OutputFormat,
    ) -> Result<()> {
        let catalog = OpenDataSource::from_config(&config.open_data).competitions()?;
        let competitions: Vec<_> = catalog
            .all()
            .iter()
            .filter(|c| country.map_or(true, |name| c.country_name == name))
            .collect();
        section("Competitions", &competitions, format)
    }

    pub fn passing_matches(
        config: &Config,
        args: &CompetitionArgs,
        format: OutputFormat,
    ) -> Result<()> {
        let source = OpenDataSource::from_config(&config.open_data);
        let matches = select_matches(&source, args)?;
        section(
            &format!("{} {} matches", args.competition, args.season),
            &matches,
            format,
        )
    }

    pub fn passing_network(
        config: &Config,
        args: &CompetitionArgs,
        match_id: Option<i64>,
        policy: CutoffPolicy,
        player: Option<&str>,
        format: OutputFormat,
    ) -> Result<()> {
        let source = OpenDataSource::from_config(&config.open_data);
        let matches = select_matches(&source, args)?;
        let match_info = match match_id {
            Some(id) => matches.iter().find(|m| m.match_id == id).ok_or_else(|| {
                SportsError::UnknownSelection(format!("no match {} in {}", id, args.competition))
            })?,
            None => match matches.first() {
                Some(m) => m,
                None => return no_data(sportboard::dashboard::NO_DATA),
            },
        };

        let report = passing_analysis(&source, match_info, policy, player)?;
        if format == OutputFormat::Table {
            println!("{}", report.match_label);
        }

        for (team, outcome) in &report.teams {
            let team_report = match outcome {
                PageOutcome::Ready(r) => r,
                PageOutcome::NoData(message) => {
                    println!("\n{}: {}", team, message);
                    continue;
                }
            };

            section(&format!("{} passing", team), &[&team_report.summary], format)?;
            let title = match team_report.network.cutoff_minute {
                Some(minute) => format!("{} pass network (before minute {})", team, minute),
                None => format!("{} pass network", team),
            };
            section(&title, &team_report.network.pairs, format)?;
            section(
                &format!("{} average positions", team),
                &team_report.network.positions,
                format,
            )?;
            section(
                &format!("{} passes", team_report.player),
                &team_report.player_segments,
                format,
            )?;
        }
        Ok(())
    }
}
