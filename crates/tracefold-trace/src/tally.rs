//! Per-kind operation counts.

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

use std::collections::BTreeMap;
use std::fmt;
use tracefold_core::{Operation, OperationKind};

/// How many operations of each kind a trace holds.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct OperationTally {
    counts: BTreeMap<OperationKind, usize>,
}

impl OperationTally {
    /// Tally `ops`.
    #[must_use]
    pub fn from_operations<'a, I>(ops: I) -> Self
    where
        I: IntoIterator<Item = &'a Operation>,
    {
        let mut t = Self::default();
        for op in ops {
            t.count(op);
        }
        t
    }

    /// Count one more operation.
    pub fn count(&mut self, op: &Operation) {
        *self.counts.entry(op.kind()).or_default() += 1;
    }

    /// Operations of `kind` seen so far.
    #[must_use]
    pub fn get(&self, kind: OperationKind) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    /// Operations of any kind.
    #[must_use]
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }
}

impl fmt::Display for OperationTally {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use OperationKind::{Init, Message, Read, Swap, Write};
        write!(
            f,
            "read={} write={} swap={} init={} message={}",
            self.get(Read),
            self.get(Write),
            self.get(Swap),
            self.get(Init),
            self.get(Message)
        )
    }
}
