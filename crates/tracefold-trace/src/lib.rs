//! Trace log envelope, wire adapter and helpers around the tracefold engine.
//!
//! Building blocks, none of which pattern-match anything themselves:
//!
//! - `format`: the versioned `TraceLog` (header + body) and its
//!   header types; `TraceLog::consolidate` runs the engine over the body.
//! - `wire`: the body's record shape (`operation` / `operationBody` /
//!   provenance), with unknown kinds skipped and values flattened.
//! - `io`: JSON/CBOR read/write helpers and in-memory `decode`/`encode`.
//! - `generator`: deterministic synthetic traces for sims and tests.
//! - `tally` / `simple`: per-kind counts and a human-readable rendering.
//!
//! We intentionally avoid broad re-exports so callers use stable paths like
//! `tracefold_trace::io::read_trace_log_auto`.

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

/// Versioned trace envelope and header types.
pub mod format;
/// Deterministic synthetic trace generator.
pub mod generator;
/// JSON/CBOR I/O helpers for `TraceLog`.
pub mod io;
/// Simple, human-readable log rendering.
pub mod simple;
/// Per-kind operation counts.
pub mod tally;
/// Serde adapter for the operation body.
pub mod wire;
