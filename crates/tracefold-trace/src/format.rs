// crates/tracefold-trace/src/format.rs

//! Trace log envelope: a versioned header plus the operation body.
//!
//! The header (variable declarations and source listings) is opaque to the
//! engine and passes through consolidation untouched; only the body is
//! rewritten. The body's wire shape is handled by [`crate::wire`].

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

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;
use tracefold_core::{ConsolidationStats, Consolidator, Operation};

/// Header version reserved for "unknown".
pub const VERSION_UNKNOWN: u32 = 0;

/// Declaration of an observed variable.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AnnotatedVariable {
    /// Identifier as used by operation locators.
    pub identifier: String,
    /// Basic storage shape (e.g. `array`, `independentElement`).
    pub raw_type: String,
    /// Logical structure the storage represents (e.g. `binaryTree`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub abstract_type: Option<String>,
    /// Preferred visual representation (e.g. `bar`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visual: Option<String>,
    /// Free-form attributes such as maximum size.
    #[serde(default, deserialize_with = "null_as_default")]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl AnnotatedVariable {
    /// A declaration with no abstract type, visual or attributes.
    #[must_use]
    pub fn new(identifier: impl Into<String>, raw_type: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            raw_type: raw_type.into(),
            abstract_type: None,
            visual: None,
            attributes: BTreeMap::new(),
        }
    }
}

/// Trace header.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Header {
    /// Format/version tag; [`VERSION_UNKNOWN`] if not known.
    #[serde(default)]
    pub version: u32,
    /// Observed variables keyed by identifier.
    #[serde(default, deserialize_with = "null_as_default")]
    pub annotated_variables: BTreeMap<String, AnnotatedVariable>,
    /// Source listings keyed by file name.
    #[serde(default, deserialize_with = "null_as_default")]
    pub sources: BTreeMap<String, Vec<String>>,
}

impl Header {
    /// Declare a variable, keyed by its identifier.
    pub fn declare(&mut self, var: AnnotatedVariable) {
        self.annotated_variables.insert(var.identifier.clone(), var);
    }
}

/// Trace envelope.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq)]
pub struct TraceLog {
    /// Versioned header; never touched by the engine.
    #[serde(default)]
    pub header: Header,
    /// Operation sequence.
    #[serde(default, with = "crate::wire")]
    pub body: Vec<Operation>,
}

impl TraceLog {
    /// Number of operations.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.body.len()
    }

    /// Whether the body is empty.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.body.is_empty()
    }

    /// Consolidate the body with `engine`; the header is carried over as is.
    ///
    /// # Errors
    /// Propagates the engine's [`tracefold_core::ConsolidationError`].
    pub fn consolidate(
        self,
        engine: &Consolidator,
    ) -> tracefold_core::Result<(Self, ConsolidationStats)> {
        let Self { header, body } = self;
        let (body, stats) = engine.consolidate_with_stats(body)?;
        Ok((Self { header, body }, stats))
    }
}

/// `null` and missing both mean "empty".
fn null_as_default<'de, D, T>(d: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(d)?.unwrap_or_default())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracefold_core::Locator;

    #[test]
    fn missing_header_fields_default() {
        let log: TraceLog =
            serde_json::from_str(r#"{"header":{"sources":null},"body":[]}"#).unwrap();
        assert_eq!(log.header.version, VERSION_UNKNOWN);
        assert!(log.header.sources.is_empty());
        assert!(log.is_empty());
    }

    #[test]
    fn consolidate_keeps_header() {
        let mut header = Header { version: 2, ..Header::default() };
        header.declare(AnnotatedVariable::new("a", "array"));
        let a = |i| Locator::indexed("a", vec![i]);
        let t = Locator::scalar("t");
        let log = TraceLog {
            header: header.clone(),
            body: vec![
                Operation::read(a(0), Some(t.clone())),
                Operation::write(Some(a(1)), a(0)),
                Operation::write(Some(t), a(1)),
            ],
        };
        let (out, stats) = log.consolidate(&Consolidator::default()).unwrap();
        assert_eq!(out.header, header);
        assert_eq!(out.body, vec![Operation::swap(a(0), a(1))]);
        assert_eq!(stats.composites_total(), 1);
    }
}
