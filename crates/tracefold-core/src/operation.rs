//! The closed operation model.
//!
//! Every trace entry is an [`Operation`]. The variants split into three groups:
//!
//! - **primitive**: [`Operation::Read`], [`Operation::Write`]: the only
//!   operations a recognizer ever sees;
//! - **control**: [`Operation::Init`], [`Operation::Message`]: never
//!   pattern-matched, they break or bypass the window;
//! - **composite**: [`Operation::Swap`]: produced by recognizers only.
//!
//! Each payload also carries a [`Provenance`] which the engine copies through
//! without looking at it.

use crate::locator::Locator;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Source position an operation originates from.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Provenance {
    /// Name of the source file.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// First line (1-based).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub begin_line: Option<u32>,
    /// Last line (inclusive).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_line: Option<u32>,
    /// First column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub begin_column: Option<u32>,
    /// Last column.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_column: Option<u32>,
}

impl Provenance {
    /// Provenance pointing at a single line of `source`.
    #[must_use]
    pub fn line(source: impl Into<String>, line: u32) -> Self {
        Self {
            source: Some(source.into()),
            begin_line: Some(line),
            end_line: Some(line),
            begin_column: None,
            end_column: None,
        }
    }

    /// Returns `true` if no field is set.
    #[must_use]
    pub const fn is_unknown(&self) -> bool {
        self.source.is_none()
            && self.begin_line.is_none()
            && self.end_line.is_none()
            && self.begin_column.is_none()
            && self.end_column.is_none()
    }
}

/// Wire name of an operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum OperationKind {
    /// Variable declaration / initialization.
    Init,
    /// Out-of-band annotation.
    Message,
    /// Primitive read.
    Read,
    /// Primitive write.
    Write,
    /// Composite value exchange.
    Swap,
}

impl OperationKind {
    /// Every kind, in wire-table order.
    pub const ALL: [Self; 5] = [Self::Init, Self::Message, Self::Read, Self::Write, Self::Swap];

    /// The lowercase name used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Init => "init",
            Self::Message => "message",
            Self::Read => "read",
            Self::Write => "write",
            Self::Swap => "swap",
        }
    }

    /// `Read` or `Write`.
    #[must_use]
    pub const fn is_primitive(self) -> bool {
        matches!(self, Self::Read | Self::Write)
    }

    /// `Init` or `Message`.
    #[must_use]
    pub const fn is_control(self) -> bool {
        matches!(self, Self::Init | Self::Message)
    }

    /// Produced by a recognizer.
    #[must_use]
    pub const fn is_composite(self) -> bool {
        matches!(self, Self::Swap)
    }
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when parsing an unknown operation name.
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("unknown operation kind: {0:?}")]
pub struct UnknownKind(pub String);

impl FromStr for OperationKind {
    type Err = UnknownKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|k| k.as_str() == s)
            .ok_or_else(|| UnknownKind(s.to_owned()))
    }
}

/// Declares a variable's backing storage.
#[derive(Clone, Debug, PartialEq)]
pub struct Init {
    /// Declared variable.
    pub target: Locator,
    /// Dimensions, if any.
    pub size: Option<Vec<i64>>,
    /// Initial contents (flattened row-major).
    pub value: Option<Vec<f64>>,
    /// Where it came from.
    pub provenance: Provenance,
}

/// Annotation with no effect on variable state.
#[derive(Clone, Debug, PartialEq)]
pub struct Message {
    /// Free text.
    pub text: String,
    /// Where it came from.
    pub provenance: Provenance,
}

/// Value read from `source`, optionally into `target`.
#[derive(Clone, Debug, PartialEq)]
pub struct Read {
    /// Location read from.
    pub source: Locator,
    /// Location the value flows into, when known.
    pub target: Option<Locator>,
    /// Value(s) read.
    pub value: Option<Vec<f64>>,
    /// Where it came from.
    pub provenance: Provenance,
}

/// Value written to `target`, optionally from `source`.
#[derive(Clone, Debug, PartialEq)]
pub struct Write {
    /// Location the value came from, when known.
    pub source: Option<Locator>,
    /// Location written to.
    pub target: Locator,
    /// Value(s) at `target` after the write.
    pub value: Option<Vec<f64>>,
    /// Where it came from.
    pub provenance: Provenance,
}

/// Exchange of the values held at `var1` and `var2`.
#[derive(Clone, Debug, PartialEq)]
pub struct Swap {
    /// First location.
    pub var1: Locator,
    /// Second location.
    pub var2: Locator,
    /// Values at `var1` and `var2` after the swap, when computed.
    pub value: Option<Vec<f64>>,
    /// Where it came from.
    pub provenance: Provenance,
}

/// A single trace entry.
#[derive(Clone, Debug, PartialEq)]
pub enum Operation {
    /// See [`Init`].
    Init(Init),
    /// See [`Message`].
    Message(Message),
    /// See [`Read`].
    Read(Read),
    /// See [`Write`].
    Write(Write),
    /// See [`Swap`].
    Swap(Swap),
}

impl Operation {
    /// `Init` with no size or value.
    #[must_use]
    pub fn init(target: Locator) -> Self {
        Self::Init(Init {
            target,
            size: None,
            value: None,
            provenance: Provenance::default(),
        })
    }

    /// `Message` carrying `text`.
    #[must_use]
    pub fn message(text: impl Into<String>) -> Self {
        Self::Message(Message {
            text: text.into(),
            provenance: Provenance::default(),
        })
    }

    /// `Read` from `source` into `target`.
    #[must_use]
    pub fn read(source: Locator, target: Option<Locator>) -> Self {
        Self::Read(Read {
            source,
            target,
            value: None,
            provenance: Provenance::default(),
        })
    }

    /// `Write` to `target` from `source`.
    #[must_use]
    pub fn write(source: Option<Locator>, target: Locator) -> Self {
        Self::Write(Write {
            source,
            target,
            value: None,
            provenance: Provenance::default(),
        })
    }

    /// `Swap` of `var1` and `var2` with no post-swap values.
    #[must_use]
    pub fn swap(var1: Locator, var2: Locator) -> Self {
        Self::Swap(Swap {
            var1,
            var2,
            value: None,
            provenance: Provenance::default(),
        })
    }

    /// Replace the value payload (no-op for `Message`).
    #[must_use]
    pub fn with_value(mut self, value: Vec<f64>) -> Self {
        match &mut self {
            Self::Init(x) => x.value = Some(value),
            Self::Read(x) => x.value = Some(value),
            Self::Write(x) => x.value = Some(value),
            Self::Swap(x) => x.value = Some(value),
            Self::Message(_) => {}
        }
        self
    }

    /// Replace the provenance.
    #[must_use]
    pub fn with_provenance(mut self, provenance: Provenance) -> Self {
        *self.provenance_mut() = provenance;
        self
    }

    /// Kind tag of this operation.
    #[must_use]
    pub const fn kind(&self) -> OperationKind {
        match self {
            Self::Init(_) => OperationKind::Init,
            Self::Message(_) => OperationKind::Message,
            Self::Read(_) => OperationKind::Read,
            Self::Write(_) => OperationKind::Write,
            Self::Swap(_) => OperationKind::Swap,
        }
    }

    /// See [`OperationKind::is_primitive`].
    #[must_use]
    pub const fn is_primitive(&self) -> bool {
        self.kind().is_primitive()
    }

    /// See [`OperationKind::is_control`].
    #[must_use]
    pub const fn is_control(&self) -> bool {
        self.kind().is_control()
    }

    /// See [`OperationKind::is_composite`].
    #[must_use]
    pub const fn is_composite(&self) -> bool {
        self.kind().is_composite()
    }

    /// Source locator of a primitive operation.
    #[must_use]
    pub const fn source(&self) -> Option<&Locator> {
        match self {
            Self::Read(r) => Some(&r.source),
            Self::Write(w) => w.source.as_ref(),
            _ => None,
        }
    }

    /// Target locator of a primitive or `Init` operation.
    #[must_use]
    pub const fn target(&self) -> Option<&Locator> {
        match self {
            Self::Init(i) => Some(&i.target),
            Self::Read(r) => r.target.as_ref(),
            Self::Write(w) => Some(&w.target),
            _ => None,
        }
    }

    /// Value payload, if any.
    #[must_use]
    pub fn value(&self) -> Option<&[f64]> {
        match self {
            Self::Init(x) => x.value.as_deref(),
            Self::Read(x) => x.value.as_deref(),
            Self::Write(x) => x.value.as_deref(),
            Self::Swap(x) => x.value.as_deref(),
            Self::Message(_) => None,
        }
    }

    /// Positional provenance.
    #[must_use]
    pub const fn provenance(&self) -> &Provenance {
        match self {
            Self::Init(x) => &x.provenance,
            Self::Message(x) => &x.provenance,
            Self::Read(x) => &x.provenance,
            Self::Write(x) => &x.provenance,
            Self::Swap(x) => &x.provenance,
        }
    }

    fn provenance_mut(&mut self) -> &mut Provenance {
        match self {
            Self::Init(x) => &mut x.provenance,
            Self::Message(x) => &mut x.provenance,
            Self::Read(x) => &mut x.provenance,
            Self::Write(x) => &mut x.provenance,
            Self::Swap(x) => &mut x.provenance,
        }
    }
}

struct Values<'a>(Option<&'a [f64]>);

impl fmt::Display for Values<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.0 {
            None => f.write_str("?"),
            Some(v) => {
                f.write_str("[")?;
                for (i, x) in v.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{x}")?;
                }
                f.write_str("]")
            }
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Init(i) => write!(f, "INIT: {} := {}", i.target, Values(i.value.as_deref())),
            Self::Message(m) => write!(f, "MESSAGE: {}", m.text),
            Self::Read(r) => match &r.target {
                Some(t) => write!(f, "READ: {} --> {t}", r.source),
                None => write!(f, "READ: {} --> {}", r.source, Values(r.value.as_deref())),
            },
            Self::Write(w) => match &w.source {
                Some(s) => write!(f, "WRITE: {s} --> {}", w.target),
                None => write!(f, "WRITE: {} <-- {}", w.target, Values(w.value.as_deref())),
            },
            Self::Swap(s) => write!(f, "SWAP: {} <-> {}", s.var1, s.var2),
        }
    }
}
