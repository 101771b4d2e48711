//! Command surface for the relmon tracker.
//!
//! Two pieces, kept separate from the core on purpose:
//!
//! - [`command`]: the line language (`addent` / `delent` / `addrel` /
//!   `delrel` / `report` / `end`) with a nom parser and a typed AST.
//! - [`session`]: the stream driver that feeds a
//!   [`RelGraph`](relmon_graph::RelGraph) from a `BufRead` and writes report
//!   lines to an `io::Write`.
//!
//! The core tracker consumes parsed commands and produces report values; it
//! never reads or writes bytes. This crate owns both byte boundaries.

pub mod command;
pub mod session;

pub use command::{parse_line, Command, CommandParseError};
pub use session::{run, SessionSummary};
