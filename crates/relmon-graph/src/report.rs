//! Report values: the observable output of the tracker.
//!
//! [`RelGraph::report`](crate::RelGraph::report) walks the global type
//! registry and materializes one row per live type, types ascending by name
//! and destinations ascending by identifier. `Display` renders the exact
//! wire line *without* the trailing newline; whoever owns the output stream
//! owns the newline, which keeps byte I/O out of the core.

use std::fmt;

use serde::{Deserialize, Serialize};

/// One live relation type: its top destinations and the count they share.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReportRow {
    pub rel_type: String,
    /// Ascending by identifier.
    pub destinations: Vec<String>,
    pub maximum: u32,
}

/// A full report: rows ascending by type name. Empty means "no type has any
/// relation", rendered as the literal `none`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Report {
    pub rows: Vec<ReportRow>,
}

impl Report {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.rows.is_empty() {
            return f.write_str("none");
        }
        for row in &self.rows {
            write!(f, "\"{}\" ", row.rel_type)?;
            for dest in &row.destinations {
                write!(f, "\"{dest}\" ")?;
            }
            write!(f, "{}; ", row.maximum)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_report_renders_none() {
        assert_eq!(Report::default().to_string(), "none");
    }

    #[test]
    fn rows_render_quoted_with_trailing_separator() {
        let report = Report {
            rows: vec![
                ReportRow {
                    rel_type: "alpha".to_string(),
                    destinations: vec!["y".to_string()],
                    maximum: 1,
                },
                ReportRow {
                    rel_type: "zeta".to_string(),
                    destinations: vec!["b".to_string(), "c".to_string()],
                    maximum: 12,
                },
            ],
        };
        assert_eq!(report.to_string(), "\"alpha\" \"y\" 1; \"zeta\" \"b\" \"c\" 12; ");
    }
}
