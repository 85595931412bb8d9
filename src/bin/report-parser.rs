//! Dota 2 replay report parser CLI
//!
//! A command-line interface for reading replay trailers and reconstructing
//! report timelines from recorded event streams.
//!
//! ## Commands
//!
//! - `date` - Print the match completion time from the replay trailer
//! - `info` - Display the game summary carried by the trailer
//! - `reports` - Reconstruct reports from a recorded event stream
//! - `players` - Resolve the ten-slot roster from a recorded event stream
//!
//! Logging is controlled with `RUST_LOG` and written to stderr.

use chrono::{DateTime, Utc};
use clap::{Parser, Subcommand, ValueEnum};
use dota_report_parser::analysis::{extract_player_info, parse_replay, ReportTarget};
use dota_report_parser::header::{read_file_info, read_match_date};
use dota_report_parser::{
    MatchSummary, ParseResult, ParserConfig, PlayerResource, RecordedSource, Result,
};
use serde::Serialize;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Dota 2 replay (.dem) report parser
#[derive(Parser)]
#[command(name = "report-parser")]
#[command(about = "Dota 2 replay (.dem) report parser", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the match completion time
    Date {
        /// Path to the replay file
        file: PathBuf,
        /// Output format: json, pretty
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },
    /// Display the trailer's game summary
    Info {
        /// Path to the replay file
        file: PathBuf,
        /// Output format: json, pretty
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },
    /// Reconstruct reports from a recorded event stream
    Reports {
        /// Path to the JSON-lines event stream
        events: PathBuf,
        /// Match id to put in the result
        #[arg(long, default_value_t = 0)]
        match_id: i64,
        /// Slot of the reported player
        #[arg(long, conflicts_with = "steam_id")]
        slot: Option<usize>,
        /// SteamID of the reported player
        #[arg(long)]
        steam_id: Option<u64>,
        /// Ticks a confirmation may follow the last hover
        #[arg(long)]
        confirm_window: Option<u32>,
        /// Output format: json, pretty
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },
    /// Resolve the roster from a recorded event stream
    Players {
        /// Path to the JSON-lines event stream
        events: PathBuf,
        /// Tick after which an incomplete roster is an error
        #[arg(long)]
        tick_limit: Option<u32>,
        /// Output format: json, pretty
        #[arg(short, long, default_value = "pretty")]
        output: OutputFormat,
    },
}

/// Output format options
#[derive(Clone, Copy, Debug, ValueEnum)]
enum OutputFormat {
    Json,
    Pretty,
}

#[derive(Serialize)]
struct DateOutput {
    end_time: DateTime<Utc>,
    unix_seconds: i64,
}

// ============================================================================
// Main Entry Point
// ============================================================================

fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match cli.command {
        Commands::Date { file, output } => cmd_date(&file, output),
        Commands::Info { file, output } => cmd_info(&file, output),
        Commands::Reports {
            events,
            match_id,
            slot,
            steam_id,
            confirm_window,
            output,
        } => {
            let target = match (slot, steam_id) {
                (Some(slot), _) => ReportTarget::Slot(slot),
                (None, Some(steam_id)) => ReportTarget::SteamId(steam_id),
                (None, None) => ReportTarget::All,
            };
            let mut config = ParserConfig::default();
            if let Some(ticks) = confirm_window {
                config = config.with_confirm_window(ticks);
            }
            cmd_reports(&events, match_id, target, &config, output)
        }
        Commands::Players {
            events,
            tick_limit,
            output,
        } => {
            let mut config = ParserConfig::default();
            if let Some(ticks) = tick_limit {
                config = config.with_resolution_tick_limit(ticks);
            }
            cmd_players(&events, &config, output)
        }
    }
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn finish(result: Result<()>, context: &str) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error {context}: {e}");
            ExitCode::FAILURE
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    let json = serde_json::to_string_pretty(value).map_err(std::io::Error::from)?;
    println!("{json}");
    Ok(())
}

// ============================================================================
// Trailer Commands
// ============================================================================

fn cmd_date(file: &Path, output: OutputFormat) -> ExitCode {
    let run = || -> Result<()> {
        let end_time = read_match_date(&mut File::open(file)?)?;
        match output {
            OutputFormat::Json => print_json(&DateOutput {
                end_time,
                unix_seconds: end_time.timestamp(),
            }),
            OutputFormat::Pretty => {
                println!("{}", end_time.to_rfc3339());
                Ok(())
            }
        }
    };
    finish(run(), "reading match date")
}

fn cmd_info(file: &Path, output: OutputFormat) -> ExitCode {
    let run = || -> Result<()> {
        let info = read_file_info(&mut File::open(file)?)?;
        let summary = MatchSummary::from_file_info(&info);
        match output {
            OutputFormat::Json => print_json(&summary),
            OutputFormat::Pretty => {
                print_summary(&summary);
                Ok(())
            }
        }
    };
    finish(run(), "reading trailer")
}

fn print_summary(summary: &MatchSummary) {
    println!("=== Replay Information ===\n");

    println!("Match:");
    if let Some(match_id) = summary.match_id {
        println!("  Match ID: {match_id}");
    }
    if let Some(mode) = summary.game_mode {
        println!("  Game Mode: {mode}");
    }
    if let Some(winner) = summary.game_winner {
        println!("  Winner: {}", team_name(winner));
    }
    if let Some(end_time) = summary.end_time {
        println!("  Finished: {}", end_time.to_rfc3339());
    }
    if let Some(seconds) = summary.playback_seconds {
        println!("  Playback: {seconds:.1}s");
    }
    if let Some(ticks) = summary.playback_ticks {
        println!("  Ticks: {ticks}");
    }

    println!();

    println!("Players:");
    for player in &summary.players {
        let bot = if player.is_bot { " [bot]" } else { "" };
        println!(
            "  - {} ({}) {} {}{}",
            player.name,
            team_name(player.team),
            player.hero,
            player.steam_id,
            bot
        );
    }
}

fn team_name(team: i32) -> &'static str {
    match team {
        2 => "Radiant",
        3 => "Dire",
        _ => "Unknown",
    }
}

// ============================================================================
// Stream Commands
// ============================================================================

fn cmd_reports(
    events: &Path,
    match_id: i64,
    target: ReportTarget,
    config: &ParserConfig,
    output: OutputFormat,
) -> ExitCode {
    let run = || -> Result<()> {
        let mut source = RecordedSource::from_path(events)?;
        let result = parse_replay(match_id, &mut source, target, config)?;
        match output {
            OutputFormat::Json => print_json(&result),
            OutputFormat::Pretty => {
                print_reports(&result, target);
                Ok(())
            }
        }
    };
    finish(run(), "parsing reports")
}

fn print_reports(result: &ParseResult, target: ReportTarget) {
    println!("=== Reports ({target}) ===\n");
    println!("Match ID: {}", result.match_id);
    println!("Team reports: {}", result.team_report_count);
    println!("Enemy reports: {}", result.enemy_report_count);
    println!();

    if result.reports.is_empty() {
        println!("No reports found.");
        return;
    }

    for report in &result.reports {
        println!(
            "  [{}] {} (slot {}, {}) -> {} (slot {}, {}) {}",
            report.time,
            report.reporter_name,
            report.reporter_slot,
            display_hero(&report.reporter_hero),
            report.target_name,
            report.target_slot,
            display_hero(&report.target_hero),
            report.reporter_team_label
        );
    }
}

fn cmd_players(events: &Path, config: &ParserConfig, output: OutputFormat) -> ExitCode {
    let run = || -> Result<()> {
        let mut source = RecordedSource::from_path(events)?;
        let players = extract_player_info(&mut source, config)?;
        match output {
            OutputFormat::Json => print_json(&players),
            OutputFormat::Pretty => {
                print_players(&players);
                Ok(())
            }
        }
    };
    finish(run(), "resolving players")
}

fn print_players(players: &[PlayerResource]) {
    println!("=== Players ===\n");
    for player in players {
        if player.name.is_empty() {
            println!("  {:>2}: <empty>", player.slot);
            continue;
        }
        println!(
            "  {:>2}: {} ({}) {} {}",
            player.slot,
            player.name,
            team_name(player.team),
            display_hero(&player.hero),
            player.steam_id
        );
    }
}

fn display_hero(hero: &str) -> &str {
    if hero.is_empty() {
        "unknown hero"
    } else {
        hero
    }
}
