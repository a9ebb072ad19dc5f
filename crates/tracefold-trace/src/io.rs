//! I/O helpers for the `TraceLog` envelope.
//!
//! Everything goes through two byte-level pairs: [`decode`]/[`encode`] for
//! JSON and [`decode_cbor`]/[`encode_cbor`] for CBOR. The file helpers only
//! add paths, context and extension-based dispatch on top. None of these
//! consolidate; they only move the `TraceLog` across the wire.

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

use crate::format::TraceLog;
use anyhow::{anyhow, Context, Result};
use std::fs;
use std::path::Path;
use tracing::debug;

/// Wire encoding of a trace log file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Encoding {
    /// Pretty-printed JSON.
    Json,
    /// CBOR.
    Cbor,
}

impl Encoding {
    /// Pick the encoding from a path's extension (case-insensitive).
    ///
    /// # Errors
    /// Missing or unsupported extension.
    pub fn from_path(path: &Path) -> Result<Self> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase);
        match ext.as_deref() {
            Some("json") => Ok(Self::Json),
            Some("cbor") => Ok(Self::Cbor),
            Some(other) => Err(anyhow!(
                "unsupported trace extension: {other} (supported: .json, .cbor)"
            )),
            None => Err(anyhow!("path has no extension (expected .json or .cbor)")),
        }
    }

    fn decode(self, bytes: &[u8]) -> Result<TraceLog> {
        match self {
            Self::Json => decode(bytes),
            Self::Cbor => decode_cbor(bytes),
        }
    }

    fn encode(self, log: &TraceLog) -> Result<Vec<u8>> {
        match self {
            Self::Json => encode(log),
            Self::Cbor => encode_cbor(log),
        }
    }
}

/* ---------------- Bytes ---------------- */

/// Decode a `TraceLog` from JSON bytes.
pub fn decode(bytes: &[u8]) -> Result<TraceLog> {
    serde_json::from_slice(bytes).context("deserialize JSON trace log")
}

/// Encode a `TraceLog` as pretty JSON bytes.
pub fn encode(log: &TraceLog) -> Result<Vec<u8>> {
    serde_json::to_vec_pretty(log).context("serialize JSON trace log")
}

/// Decode a `TraceLog` from CBOR bytes.
pub fn decode_cbor(bytes: &[u8]) -> Result<TraceLog> {
    ciborium::de::from_reader(bytes).context("deserialize CBOR trace log")
}

/// Encode a `TraceLog` as CBOR bytes.
pub fn encode_cbor(log: &TraceLog) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    ciborium::ser::into_writer(log, &mut out).context("serialize CBOR trace log")?;
    Ok(out)
}

/* ---------------- Files ---------------- */

fn read_as(path: &Path, enc: Encoding) -> Result<TraceLog> {
    let bytes = fs::read(path).with_context(|| format!("open {}", path.display()))?;
    let log = enc
        .decode(&bytes)
        .with_context(|| format!("decode {}", path.display()))?;
    debug!(path = %path.display(), ?enc, ops = log.len(), "read trace log");
    Ok(log)
}

fn write_as(path: &Path, log: &TraceLog, enc: Encoding) -> Result<()> {
    let bytes = enc.encode(log)?;
    fs::write(path, &bytes).with_context(|| format!("write {}", path.display()))?;
    debug!(path = %path.display(), ?enc, bytes = bytes.len(), "wrote trace log");
    Ok(())
}

/// Read a `TraceLog` from a **JSON** file.
pub fn read_trace_log_json<P: AsRef<Path>>(path: P) -> Result<TraceLog> {
    read_as(path.as_ref(), Encoding::Json)
}

/// Write a `TraceLog` to a **JSON** file (pretty).
pub fn write_trace_log_json<P: AsRef<Path>>(path: P, v: &TraceLog) -> Result<()> {
    write_as(path.as_ref(), v, Encoding::Json)
}

/// Read a `TraceLog` from a **CBOR** file.
pub fn read_trace_log_cbor<P: AsRef<Path>>(path: P) -> Result<TraceLog> {
    read_as(path.as_ref(), Encoding::Cbor)
}

/// Write a `TraceLog` to a **CBOR** file.
pub fn write_trace_log_cbor<P: AsRef<Path>>(path: P, v: &TraceLog) -> Result<()> {
    write_as(path.as_ref(), v, Encoding::Cbor)
}

/// Read by extension (`.json` / `.cbor`); anything else is an error.
pub fn read_trace_log_auto<P: AsRef<Path>>(path: P) -> Result<TraceLog> {
    let path = path.as_ref();
    read_as(path, Encoding::from_path(path)?)
}

/// Write by extension; JSON unless the extension is `.cbor`.
pub fn write_trace_log_auto<P: AsRef<Path>>(path: P, v: &TraceLog) -> Result<()> {
    let path = path.as_ref();
    let enc = Encoding::from_path(path).unwrap_or(Encoding::Json);
    write_as(path, v, enc)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracefold_core::{Locator, Operation};

    fn sample() -> TraceLog {
        TraceLog {
            body: vec![Operation::init(Locator::scalar("n")).with_value(vec![5.0])],
            ..TraceLog::default()
        }
    }

    #[test]
    fn decode_rejects_garbage() {
        assert!(decode(b"{not json").is_err());
        assert!(decode_cbor(b"\xff\x00").is_err());
    }

    #[test]
    fn encoding_follows_extension() {
        assert_eq!(Encoding::from_path(Path::new("a.JSON")).unwrap(), Encoding::Json);
        assert_eq!(Encoding::from_path(Path::new("a.cbor")).unwrap(), Encoding::Cbor);
        let err = read_trace_log_auto("trace.yaml").unwrap_err().to_string();
        assert!(err.contains("unsupported trace extension"), "{err}");
        assert!(Encoding::from_path(Path::new("trace")).is_err());
    }

    #[test]
    fn bytes_round_trip_in_both_encodings() {
        let log = sample();
        assert_eq!(decode(&encode(&log).unwrap()).unwrap(), log);
        assert_eq!(decode_cbor(&encode_cbor(&log).unwrap()).unwrap(), log);
    }

    #[test]
    fn file_helpers_log_and_round_trip() {
        // Installs a subscriber so the `debug!` fields are actually formatted.
        let _guard = tracing::subscriber::set_default(
            tracing_subscriber::fmt()
                .with_max_level(tracing::Level::DEBUG)
                .with_test_writer()
                .finish(),
        );
        let dir = std::env::temp_dir().join(format!("tracefold-io-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();
        let log = sample();

        let unknown = dir.join("log.txt");
        write_trace_log_auto(&unknown, &log).unwrap();
        assert_eq!(read_trace_log_json(&unknown).unwrap(), log);

        let cbor = dir.join("log.cbor");
        write_trace_log_cbor(&cbor, &log).unwrap();
        assert_eq!(read_trace_log_auto(&cbor).unwrap(), log);

        let err = read_trace_log_json(dir.join("missing.json")).unwrap_err();
        assert!(format!("{err:#}").contains("missing.json"), "{err:#}");
        fs::remove_dir_all(&dir).unwrap();
    }
}
