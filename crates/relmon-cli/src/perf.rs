//! Synthetic workload harness.
//!
//! This is intentionally **not** a microbenchmark framework. It's a
//! practical tool to answer questions like:
//! - How fast does the tracker ingest N entities + M relations?
//! - What does a delete-heavy tail (recompute pressure) cost?
//! - What is the end-to-end line throughput of the session driver?
//!
//! Run in release mode for meaningful results:
//!
//! ```bash
//! cargo run -p relmon-cli --release -- perf --entities 100000 --relations 500000
//! ```

use std::fmt::Write as _;
use std::io;
use std::time::Instant;

use anyhow::{anyhow, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;

use relmon_cmd::session;
use relmon_graph::RelGraph;

#[derive(Args)]
pub struct PerfArgs {
    /// Number of entities to declare.
    #[arg(long, default_value_t = 100_000)]
    pub entities: usize,

    /// Number of addrel commands to generate (endpoints drawn uniformly).
    #[arg(long, default_value_t = 500_000)]
    pub relations: usize,

    /// Number of relation types to draw from.
    #[arg(long, default_value_t = 8)]
    pub rel_types: usize,

    /// Number of delete commands appended after the adds (a mix of delrel
    /// and delent; delent exercises the full recompute path).
    #[arg(long, default_value_t = 50_000)]
    pub deletes: usize,

    /// Number of report commands interleaved through the stream.
    #[arg(long, default_value_t = 16)]
    pub reports: usize,

    /// RNG seed (deterministic).
    #[arg(long, default_value_t = 1)]
    pub seed: u64,

    /// Print the result as JSON.
    #[arg(long)]
    pub json: bool,
}

/// xorshift64* (simple, fast, deterministic).
#[derive(Debug, Clone)]
struct XorShift64 {
    state: u64,
}

impl XorShift64 {
    fn new(seed: u64) -> Self {
        // Avoid the degenerate all-zero state.
        let state = if seed == 0 { 0x9e3779b97f4a7c15 } else { seed };
        Self { state }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545_f491_4f6c_dd1d)
    }

    fn gen_range(&mut self, upper: usize) -> usize {
        if upper == 0 {
            return 0;
        }
        (self.next_u64() % (upper as u64)) as usize
    }
}

#[derive(Serialize)]
struct PerfReport {
    seed: u64,
    lines_total: u64,
    generate_ms: f64,
    run_ms: f64,
    lines_per_sec: f64,
    reports_emitted: u64,
    final_entities: usize,
    final_relations: usize,
    final_types: usize,
}

pub fn cmd_perf(args: &PerfArgs) -> Result<()> {
    if args.entities == 0 {
        return Err(anyhow!("--entities must be > 0"));
    }
    if args.rel_types == 0 {
        return Err(anyhow!("--rel-types must be > 0"));
    }

    let generate_start = Instant::now();
    let stream = build_stream(args);
    let generate_ms = generate_start.elapsed().as_secs_f64() * 1e3;
    let lines_total = stream.lines().count() as u64;

    let mut graph = RelGraph::new();
    let run_start = Instant::now();
    let summary = session::run(stream.as_bytes(), io::sink(), &mut graph)?;
    let run_secs = run_start.elapsed().as_secs_f64();

    let report = PerfReport {
        seed: args.seed,
        lines_total,
        generate_ms,
        run_ms: run_secs * 1e3,
        lines_per_sec: lines_total as f64 / run_secs.max(f64::EPSILON),
        reports_emitted: summary.reports,
        final_entities: graph.entity_count(),
        final_relations: graph.relation_count(),
        final_types: graph.type_count(),
    };

    if args.json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{}", "perf: synthetic command stream".bold());
    println!("  seed:       {}", report.seed);
    println!("  lines:      {}", report.lines_total);
    println!("  generate:   {:.1} ms", report.generate_ms);
    println!("  run:        {:.1} ms", report.run_ms);
    println!("  throughput: {:.0} lines/s", report.lines_per_sec);
    println!(
        "  final:      {} entities, {} relations, {} types ({} reports)",
        report.final_entities, report.final_relations, report.final_types, report.reports_emitted
    );
    Ok(())
}

fn build_stream(args: &PerfArgs) -> String {
    let mut rng = XorShift64::new(args.seed);
    let mut out = String::new();

    for i in 0..args.entities {
        let _ = writeln!(out, "addent \"ent_{i:07}\"");
    }

    // Interleave reports through the mutation phase.
    let report_every = (args.relations + args.deletes)
        .checked_div(args.reports)
        .unwrap_or(0)
        .max(1);

    let mut mutations = 0usize;
    for _ in 0..args.relations {
        let from = rng.gen_range(args.entities);
        let to = rng.gen_range(args.entities);
        let ty = rng.gen_range(args.rel_types);
        let _ = writeln!(out, "addrel \"ent_{from:07}\" \"ent_{to:07}\" \"rel_{ty}\"");
        mutations += 1;
        if args.reports > 0 && mutations % report_every == 0 {
            out.push_str("report\n");
        }
    }

    for _ in 0..args.deletes {
        // Mostly delrel; one in eight is a delent, which forces the full
        // per-type recompute and frees a slot for later reuse.
        if rng.gen_range(8) == 0 {
            let victim = rng.gen_range(args.entities);
            let _ = writeln!(out, "delent \"ent_{victim:07}\"");
        } else {
            let from = rng.gen_range(args.entities);
            let to = rng.gen_range(args.entities);
            let ty = rng.gen_range(args.rel_types);
            let _ = writeln!(out, "delrel \"ent_{from:07}\" \"ent_{to:07}\" \"rel_{ty}\"");
        }
        mutations += 1;
        if args.reports > 0 && mutations % report_every == 0 {
            out.push_str("report\n");
        }
    }

    out.push_str("report\nend\n");
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small_args() -> PerfArgs {
        PerfArgs {
            entities: 40,
            relations: 200,
            rel_types: 3,
            deletes: 60,
            reports: 4,
            seed: 7,
            json: false,
        }
    }

    #[test]
    fn streams_are_deterministic_per_seed() {
        assert_eq!(build_stream(&small_args()), build_stream(&small_args()));

        let other = PerfArgs {
            seed: 8,
            ..small_args()
        };
        assert_ne!(build_stream(&small_args()), build_stream(&other));
    }

    #[test]
    fn generated_streams_run_clean() {
        let stream = build_stream(&small_args());
        let mut graph = RelGraph::new();
        let summary =
            session::run(stream.as_bytes(), io::sink(), &mut graph).expect("session runs");
        assert!(summary.ended);
        assert_eq!(summary.ignored, 0);
        graph.check_invariants().expect("invariants hold");
    }
}
