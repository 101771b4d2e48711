//! Stream session: drive a [`RelGraph`] from a line-oriented reader.
//!
//! The driver owns the byte boundaries: it reads command lines, hands
//! parsed commands to the tracker, and writes each report line (with its
//! terminating newline) to the writer as it is produced. The tracker itself
//! never touches the streams.

use std::io::{BufRead, Write};

use anyhow::Result;
use serde::{Deserialize, Serialize};

use relmon_graph::RelGraph;

use crate::command::{parse_line, Command};

/// Counters for one processed stream.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionSummary {
    /// Well-formed commands dispatched (including `report` and `end`).
    pub executed: u64,
    /// Malformed lines skipped.
    pub ignored: u64,
    /// Report lines written.
    pub reports: u64,
    /// Whether the stream terminated with an explicit `end`.
    pub ended: bool,
}

/// Process commands from `reader` until `end` or EOF, writing report lines
/// to `writer`. Malformed lines are counted and skipped. The writer is
/// flushed before returning.
pub fn run(
    mut reader: impl BufRead,
    mut writer: impl Write,
    graph: &mut RelGraph,
) -> Result<SessionSummary> {
    let mut summary = SessionSummary::default();
    let mut line = String::new();
    loop {
        line.clear();
        if reader.read_line(&mut line)? == 0 {
            break;
        }
        match parse_line(line.trim_end_matches('\n').trim_end_matches('\r')) {
            Ok(Command::AddEnt { id }) => {
                graph.add_entity(&id);
                summary.executed += 1;
            }
            Ok(Command::DelEnt { id }) => {
                graph.del_entity(&id);
                summary.executed += 1;
            }
            Ok(Command::AddRel { from, to, rel_type }) => {
                graph.add_relation(&from, &to, &rel_type);
                summary.executed += 1;
            }
            Ok(Command::DelRel { from, to, rel_type }) => {
                graph.del_relation(&from, &to, &rel_type);
                summary.executed += 1;
            }
            Ok(Command::Report) => {
                writeln!(writer, "{}", graph.report())?;
                summary.executed += 1;
                summary.reports += 1;
            }
            Ok(Command::End) => {
                summary.executed += 1;
                summary.ended = true;
                break;
            }
            Err(_) => summary.ignored += 1,
        }
    }
    writer.flush()?;
    Ok(summary)
}
