//! Human-readable rendering of a trace log.
//!
//! Lossy: values of targeted reads/writes and all provenance are dropped.

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![warn(
    missing_docs,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    clippy::unwrap_used,
    clippy::expect_used
)]

use std::fmt::Write as _;

use crate::format::TraceLog;

/// Render one line per declared variable, a blank line, then the body
/// numbered from 1.
#[must_use]
pub fn render_simple_log(log: &TraceLog) -> String {
    let mut out = String::new();
    for var in log.header.annotated_variables.values() {
        let _ = write!(out, "{}: {}", var.identifier, var.raw_type);
        if let Some(abs) = &var.abstract_type {
            let _ = write!(out, " ({abs})");
        }
        out.push('\n');
    }
    if !log.header.annotated_variables.is_empty() {
        out.push('\n');
    }
    let width = log.len().to_string().len();
    for (i, op) in log.body.iter().enumerate() {
        let _ = writeln!(out, "{:>width$}  {op}", i + 1);
    }
    out
}
