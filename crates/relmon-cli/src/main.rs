//! Relmon CLI
//!
//! Command-line interface for the relation tracker:
//! - `run`: process a command stream (stdin or file) and print report lines
//! - `check`: parse-check a command script without executing it
//! - `stats`: process a stream, then print tracker statistics
//! - `perf`: deterministic synthetic workload harness

use std::fs;
use std::io::{self, BufRead, BufReader, BufWriter};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use serde::Serialize;

use relmon_cmd::{parse_line, session};
use relmon_graph::{RelGraph, ReportRow};

mod perf;

#[derive(Parser)]
#[command(name = "relmon")]
#[command(
    author,
    version,
    about = "Relmon: command-driven, in-memory relation tracker"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Process a command stream and write report lines to stdout.
    ///
    /// Reads from INPUT, or from stdin when INPUT is `-` or omitted.
    /// Running `relmon` with no subcommand does the same.
    Run {
        /// Input command stream (`-` = stdin).
        input: Option<PathBuf>,
    },

    /// Parse-check a command script without executing it.
    ///
    /// Malformed lines are diagnosed with their line numbers; execution
    /// semantics (unknown entities, absent relations) are not checked,
    /// since those are silent no-ops by design.
    Check {
        /// Input command stream (`-` = stdin).
        input: Option<PathBuf>,
        /// Exit non-zero if any line is malformed.
        #[arg(long)]
        strict: bool,
        /// Only print the summary line.
        #[arg(long)]
        quiet: bool,
    },

    /// Process a stream, then print tracker statistics instead of reports.
    Stats {
        /// Input command stream (`-` = stdin).
        input: Option<PathBuf>,
        /// Emit machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Synthetic workload harness (deterministic, seeded).
    Perf(perf::PerfArgs),
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    match cli.command.unwrap_or(Commands::Run { input: None }) {
        Commands::Run { input } => cmd_run(input.as_ref()),
        Commands::Check {
            input,
            strict,
            quiet,
        } => cmd_check(input.as_ref(), strict, quiet),
        Commands::Stats { input, json } => cmd_stats(input.as_ref(), json),
        Commands::Perf(args) => perf::cmd_perf(&args),
    }
}

fn open_input(path: Option<&PathBuf>) -> Result<Box<dyn BufRead>> {
    match path {
        Some(p) if p.as_os_str() != "-" => {
            let file = fs::File::open(p)
                .with_context(|| format!("failed to open {}", p.display()))?;
            Ok(Box::new(BufReader::new(file)))
        }
        _ => Ok(Box::new(io::stdin().lock())),
    }
}

fn cmd_run(input: Option<&PathBuf>) -> Result<()> {
    let reader = open_input(input)?;
    let writer = BufWriter::new(io::stdout().lock());
    let mut graph = RelGraph::new();
    session::run(reader, writer, &mut graph)?;
    Ok(())
}

fn cmd_check(input: Option<&PathBuf>, strict: bool, quiet: bool) -> Result<()> {
    let reader = open_input(input)?;
    let mut total = 0u64;
    let mut malformed = 0u64;
    for (index, line) in reader.lines().enumerate() {
        let line = line?;
        total += 1;
        if let Err(e) = parse_line(&line) {
            malformed += 1;
            if !quiet {
                eprintln!("{} line {}: {e}", "error:".red().bold(), index + 1);
            }
        }
    }

    if malformed == 0 {
        println!("{} {total} lines", "ok:".green().bold());
    } else {
        println!(
            "{} {malformed} of {total} lines malformed",
            "malformed:".red().bold()
        );
        if strict {
            return Err(anyhow!("{malformed} malformed line(s)"));
        }
    }
    Ok(())
}

#[derive(Serialize)]
struct StatsReport {
    entities: usize,
    relations: usize,
    types: usize,
    rows: Vec<ReportRow>,
    executed: u64,
    ignored: u64,
}

fn cmd_stats(input: Option<&PathBuf>, json: bool) -> Result<()> {
    let reader = open_input(input)?;
    let mut graph = RelGraph::new();
    let summary = session::run(reader, io::sink(), &mut graph)?;

    let stats = StatsReport {
        entities: graph.entity_count(),
        relations: graph.relation_count(),
        types: graph.type_count(),
        rows: graph.report().rows,
        executed: summary.executed,
        ignored: summary.ignored,
    };

    if json {
        println!("{}", serde_json::to_string_pretty(&stats)?);
        return Ok(());
    }

    println!("{}", "tracker state".bold());
    println!("  entities:  {}", stats.entities);
    println!("  relations: {}", stats.relations);
    println!("  types:     {}", stats.types);
    for row in &stats.rows {
        println!(
            "    {} -> {} @ {}",
            row.rel_type,
            row.destinations.join(", "),
            row.maximum
        );
    }
    println!(
        "  commands:  {} executed, {} ignored",
        stats.executed, stats.ignored
    );
    Ok(())
}
