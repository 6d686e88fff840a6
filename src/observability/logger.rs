//! JSON log lines for index events
//!
//! Every maintenance run, query and rejection is reported as one line:
//!
//! ```text
//! {"event":"QUERY_EXECUTED","severity":"INFO","candidates":"2","collection":"Product",...}
//! ```
//!
//! `event` and `severity` lead, the remaining fields follow sorted by name,
//! so two runs over the same data print identical lines. Lines are written
//! and flushed immediately. Maintenance failures go to stderr, everything
//! else to stdout.

use std::fmt;
use std::io::{self, Write};

/// How much attention an index event needs
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    /// Writes, plans and queries that went as expected
    Info = 1,
    /// Stale entries skipped, queries rejected at plan time
    Warn = 2,
    /// Indexes may now disagree with primary storage
    Error = 3,
}

impl Severity {
    pub fn as_str(&self) -> &'static str {
        match self {
            Severity::Info => "INFO",
            Severity::Warn => "WARN",
            Severity::Error => "ERROR",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Writer of index event lines
pub struct Logger;

impl Logger {
    /// Writes one event line to stdout, or stderr for `Severity::Error`
    pub fn log(severity: Severity, event: &str, fields: &[(&str, &str)]) {
        let line = Self::line(severity, event, fields);
        match severity {
            Severity::Error => emit(&mut io::stderr(), &line),
            Severity::Info | Severity::Warn => emit(&mut io::stdout(), &line),
        }
    }

    /// Renders an event line, newline included
    fn line(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
        let mut line = String::with_capacity(64 + fields.len() * 24);
        line.push_str("{\"event\":");
        push_json_str(&mut line, event);
        line.push_str(",\"severity\":\"");
        line.push_str(severity.as_str());
        line.push('"');

        let mut fields: Vec<&(&str, &str)> = fields.iter().collect();
        fields.sort_by_key(|(name, _)| *name);
        for (name, value) in fields {
            line.push(',');
            push_json_str(&mut line, name);
            line.push(':');
            push_json_str(&mut line, value);
        }

        line.push_str("}\n");
        line
    }
}

// A failed log write never fails the index operation that produced it.
fn emit<W: Write>(writer: &mut W, line: &str) {
    let _ = writer.write_all(line.as_bytes());
    let _ = writer.flush();
}

fn push_json_str(line: &mut String, s: &str) {
    match serde_json::to_string(s) {
        Ok(quoted) => line.push_str(&quoted),
        Err(_) => line.push_str("\"\""),
    }
}

/// Renders an event line without writing it (tests only)
#[cfg(test)]
pub fn capture_log(severity: Severity, event: &str, fields: &[(&str, &str)]) -> String {
    Logger::line(severity, event, fields)
}
