//! Engine errors.

use crate::operation::OperationKind;
use thiserror::Error;

/// Engine result type.
pub type Result<T> = std::result::Result<T, ConsolidationError>;

/// Fatal conditions for a consolidation run.
///
/// A run that fails commits nothing; the caller only receives the error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConsolidationError {
    /// Window bounds must satisfy `1 <= min_size <= max_size`.
    #[error("invalid window bounds: min_size={min_size}, max_size={max_size}")]
    InvalidWindow {
        /// Requested lower bound.
        min_size: usize,
        /// Requested upper bound.
        max_size: usize,
    },

    /// A recognizer was handed a window it does not accept.
    #[error("recognizer {recognizer} expects a window of {expected} operations, got {actual}")]
    WindowSize {
        /// Recognizer name.
        recognizer: &'static str,
        /// Size it was registered for.
        expected: usize,
        /// Size it received.
        actual: usize,
    },

    /// A composite operation appeared in the input under `HighLevelPolicy::Reject`.
    #[error("composite operation {kind} at position {position} in input")]
    CompositeInInput {
        /// Zero-based position in the input sequence.
        position: usize,
        /// Offending kind.
        kind: OperationKind,
    },

    /// A recognizer produced something other than a composite operation.
    #[error("recognizer {recognizer} produced non-composite operation {kind}")]
    RecognizerContract {
        /// Recognizer name.
        recognizer: &'static str,
        /// Kind it returned.
        kind: OperationKind,
    },
}
