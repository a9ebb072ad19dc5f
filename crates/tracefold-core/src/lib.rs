//! tracefold-core: operation model, recognizers, and the consolidation engine.
//!
//! This crate defines the **stable boundary** used across tracefold crates:
//! - canonical data types ([`Locator`], [`Operation`], [`Provenance`], …),
//! - the [`Recognizer`] contract and its size-keyed [`RecognizerRegistry`],
//! - the sliding-window [`Consolidator`] that folds primitive reads/writes
//!   into composite operations such as [`Swap`].
//!
//! ```rust
//! use tracefold_core::{consolidate, Locator, Operation};
//!
//! let a = |i| Locator::indexed("a", vec![i]);
//! let tmp = Locator::scalar("tmp");
//! let ops = vec![
//!     Operation::read(a(0), Some(tmp.clone())),
//!     Operation::write(Some(a(1)), a(0)),
//!     Operation::write(Some(tmp), a(1)),
//! ];
//! let out = consolidate(ops, 3, 3)?;
//! assert_eq!(out, vec![Operation::swap(a(0), a(1))]);
//! # Ok::<(), tracefold_core::ConsolidationError>(())
//! ```

#![forbid(unsafe_code)]
#![deny(rust_2018_idioms)]
#![deny(missing_docs)]
#![warn(clippy::all, clippy::pedantic, clippy::nursery)]
// Small, explicit allowlist to keep docs readable and APIs ergonomic.
#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::module_name_repetitions,
    clippy::doc_markdown
)]

/// Sliding-window consolidation engine and its configuration.
pub mod engine;
/// Typed engine errors.
pub mod error;
/// Storage locations (`identifier` + optional index).
pub mod locator;
/// Closed operation model and provenance.
pub mod operation;
/// Recognizer contract, the swap recognizer, and the registry.
pub mod recognizer;

// ---- Re-exports for workspace compatibility ----
pub use engine::*;
pub use error::*;
pub use locator::*;
pub use operation::*;
pub use recognizer::*;

/// Commonly-used items for quick imports.
///
/// ```rust
/// use tracefold_core::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        engine::{consolidate, Consolidator, EngineConfig, HighLevelPolicy},
        error::ConsolidationError,
        locator::Locator,
        operation::{Operation, OperationKind, Provenance},
        recognizer::{Recognizer, RecognizerRegistry, SwapRecognizer},
    };
}
