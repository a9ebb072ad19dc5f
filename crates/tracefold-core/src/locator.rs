//! Storage locations named by operations.
//!
//! A [`Locator`] is an identifier plus an optional multi-dimensional index.
//! Equality is structural: identifiers must match and the index sequences must
//! match element-wise. An absent index is never equal to a present one, not
//! even an empty one.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier + optional index naming a storage location.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Locator {
    /// Variable identifier; usually a key of the header's `annotatedVariables`.
    pub identifier: String,
    /// Position inside the variable (`None` for scalars).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub index: Option<Vec<i64>>,
}

impl Locator {
    /// A scalar locator (no index).
    #[inline]
    #[must_use]
    pub fn scalar(identifier: impl Into<String>) -> Self {
        Self {
            identifier: identifier.into(),
            index: None,
        }
    }

    /// An indexed locator, e.g. `a[3]` or `m[1, 2]`.
    #[inline]
    #[must_use]
    pub fn indexed(identifier: impl Into<String>, index: impl Into<Vec<i64>>) -> Self {
        Self {
            identifier: identifier.into(),
            index: Some(index.into()),
        }
    }

    /// Returns `true` if this locator carries no index.
    #[inline]
    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        self.index.is_none()
    }

    /// Compares the index only, ignoring the identifier.
    #[inline]
    #[must_use]
    pub fn index_eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl fmt::Display for Locator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.identifier)?;
        if let Some(index) = &self.index {
            f.write_str("[")?;
            for (i, x) in index.iter().enumerate() {
                if i > 0 {
                    f.write_str(", ")?;
                }
                write!(f, "{x}")?;
            }
            f.write_str("]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn equality_is_structural() {
        assert_eq!(Locator::indexed("a", vec![1, 2]), Locator::indexed("a", vec![1, 2]));
        assert_ne!(Locator::indexed("a", vec![1, 2]), Locator::indexed("a", vec![2, 1]));
        assert_ne!(Locator::indexed("a", vec![1]), Locator::indexed("b", vec![1]));
        assert_eq!(Locator::scalar("t"), Locator::scalar("t"));
    }

    #[test]
    fn absent_index_differs_from_empty_index() {
        let scalar = Locator::scalar("a");
        let empty = Locator::indexed("a", Vec::new());
        assert_ne!(scalar, empty);
        assert!(!scalar.index_eq(&empty));
    }

    #[test]
    fn display_renders_index() {
        assert_eq!(Locator::scalar("tmp").to_string(), "tmp");
        assert_eq!(Locator::indexed("m", vec![1, 2]).to_string(), "m[1, 2]");
    }
}
