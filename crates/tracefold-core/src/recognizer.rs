//! Pattern recognizers and their registry.
//!
//! A [`Recognizer`] folds a fixed-size window of primitive operations into a
//! single composite operation, or declines. Recognizers are keyed by the window
//! size they accept; the engine only ever hands a recognizer a window of
//! exactly [`Recognizer::window_size`] operations.
//!
//! ## Contract
//! - `recognize` must be pure: same window, same answer, no side effects.
//! - Declining (`Ok(None)`) is not an error.
//! - A window of the wrong size is a programming error and is reported as
//!   [`ConsolidationError::WindowSize`].
//! - A produced operation must be composite (see [`Operation::is_composite`]);
//!   the engine rejects anything else.

use crate::error::{ConsolidationError, Result};
use crate::locator::Locator;
use crate::operation::{Operation, Swap};
use std::collections::BTreeMap;
use std::fmt;
use tracing::debug;

/// Folds a window of primitive operations into a composite one.
pub trait Recognizer: Send + Sync {
    /// Stable name, unique within a registry.
    fn name(&self) -> &'static str;

    /// Exact number of primitive operations this recognizer inspects.
    fn window_size(&self) -> usize;

    /// Inspect `window` and produce a composite operation, or decline.
    ///
    /// # Errors
    /// [`ConsolidationError::WindowSize`] if `window.len() != self.window_size()`.
    fn recognize(&self, window: &[Operation]) -> Result<Option<Operation>>;
}

/// Recognizes `tmp = var1; var1 = var2; var2 = tmp` as a [`Swap`].
///
/// The three primitive operations must be
/// `[var1 -> tmp, var2 -> var1, tmp -> var2]` with `tmp` a scalar.
#[derive(Clone, Copy, Debug, Default)]
pub struct SwapRecognizer {
    with_values: bool,
}

impl SwapRecognizer {
    /// Window size of the swap idiom.
    pub const WINDOW: usize = 3;

    /// Produces swaps without post-swap values.
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self { with_values: false }
    }

    /// Produces swaps whose `value` is `[op1.value[0], op0.value[0]]`, i.e. the
    /// values held at `var1` and `var2` afterwards, when both are known.
    #[inline]
    #[must_use]
    pub const fn with_values() -> Self {
        Self { with_values: true }
    }

    fn post_swap_values(op0: &Operation, op1: &Operation) -> Option<Vec<f64>> {
        let first = op1.value()?.first().copied()?;
        let second = op0.value()?.first().copied()?;
        Some(vec![first, second])
    }
}

impl Recognizer for SwapRecognizer {
    fn name(&self) -> &'static str {
        "swap"
    }

    fn window_size(&self) -> usize {
        Self::WINDOW
    }

    fn recognize(&self, window: &[Operation]) -> Result<Option<Operation>> {
        let [op0, op1, op2] = window else {
            return Err(ConsolidationError::WindowSize {
                recognizer: self.name(),
                expected: Self::WINDOW,
                actual: window.len(),
            });
        };

        // All sources and targets must be known.
        let ends = |op: &Operation| -> Option<(Locator, Locator)> {
            Some((op.source()?.clone(), op.target()?.clone()))
        };
        let (Some((var1, tmp)), Some((var2, t1)), Some((s2, t2))) = (ends(op0), ends(op1), ends(op2))
        else {
            return Ok(None);
        };

        if !tmp.is_scalar() {
            return Ok(None);
        }
        if t1 != var1 {
            return Ok(None);
        }
        if s2 != tmp || t2 != var2 {
            return Ok(None);
        }

        let value = if self.with_values {
            Self::post_swap_values(op0, op1)
        } else {
            None
        };
        Ok(Some(Operation::Swap(Swap {
            var1,
            var2,
            value,
            provenance: op0.provenance().clone(),
        })))
    }
}

/// Recognizers keyed by window size, evaluated in registration order.
#[derive(Default)]
pub struct RecognizerRegistry {
    by_size: BTreeMap<usize, Vec<Box<dyn Recognizer>>>,
}

impl RecognizerRegistry {
    /// An empty registry (the engine then only flushes).
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding [`SwapRecognizer`].
    #[must_use]
    pub fn with_defaults() -> Self {
        let mut r = Self::new();
        r.register(SwapRecognizer::new());
        r
    }

    /// Add a recognizer. A recognizer whose name is already registered is ignored.
    ///
    /// Returns `true` if it was added.
    pub fn register<R: Recognizer + 'static>(&mut self, recognizer: R) -> bool {
        self.register_boxed(Box::new(recognizer))
    }

    /// Boxed form of [`register`](Self::register).
    pub fn register_boxed(&mut self, recognizer: Box<dyn Recognizer>) -> bool {
        let name = recognizer.name();
        if self.contains(name) {
            debug!(name, "recognizer already registered");
            return false;
        }
        let size = recognizer.window_size();
        debug!(name, size, "registering recognizer");
        self.by_size.entry(size).or_default().push(recognizer);
        true
    }

    /// Remove the recognizer called `name`. Returns `true` if one was removed.
    pub fn remove(&mut self, name: &str) -> bool {
        let mut removed = false;
        for list in self.by_size.values_mut() {
            let before = list.len();
            list.retain(|r| r.name() != name);
            removed |= list.len() != before;
        }
        self.by_size.retain(|_, list| !list.is_empty());
        removed
    }

    /// Returns `true` if a recognizer called `name` is registered.
    #[must_use]
    pub fn contains(&self, name: &str) -> bool {
        self.by_size.values().flatten().any(|r| r.name() == name)
    }

    /// Names by ascending window size, then registration order.
    #[must_use]
    pub fn names(&self) -> Vec<&'static str> {
        self.by_size.values().flatten().map(|r| r.name()).collect()
    }

    /// Window sizes that have at least one recognizer.
    #[must_use]
    pub fn sizes(&self) -> Vec<usize> {
        self.by_size.keys().copied().collect()
    }

    /// Returns `true` if nothing is registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_size.is_empty()
    }

    /// Try every recognizer registered for `window.len()`; first match wins.
    ///
    /// Returns the winning recognizer's name with its composite.
    ///
    /// # Errors
    /// Propagates recognizer errors, and returns
    /// [`ConsolidationError::RecognizerContract`] if a recognizer produced a
    /// non-composite operation.
    pub fn attempt(&self, window: &[Operation]) -> Result<Option<(&'static str, Operation)>> {
        let Some(list) = self.by_size.get(&window.len()) else {
            return Ok(None);
        };
        for r in list {
            if let Some(op) = r.recognize(window)? {
                if !op.is_composite() {
                    return Err(ConsolidationError::RecognizerContract {
                        recognizer: r.name(),
                        kind: op.kind(),
                    });
                }
                return Ok(Some((r.name(), op)));
            }
        }
        Ok(None)
    }
}

impl fmt::Debug for RecognizerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut m = f.debug_map();
        for (size, list) in &self.by_size {
            m.entry(size, &list.iter().map(|r| r.name()).collect::<Vec<_>>());
        }
        m.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn a(i: i64) -> Locator {
        Locator::indexed("a", vec![i])
    }

    fn tmp() -> Locator {
        Locator::scalar("tmp")
    }

    fn swap_window() -> Vec<Operation> {
        vec![
            Operation::read(a(1), Some(tmp())).with_value(vec![5.0]),
            Operation::write(Some(a(2)), a(1)).with_value(vec![9.0]),
            Operation::write(Some(tmp()), a(2)).with_value(vec![5.0]),
        ]
    }

    #[test]
    fn swap_matches_idiom() {
        let op = SwapRecognizer::new().recognize(&swap_window()).unwrap().unwrap();
        assert_eq!(op, Operation::swap(a(1), a(2)));
    }

    #[test]
    fn swap_with_values_reports_post_state() {
        let op = SwapRecognizer::with_values()
            .recognize(&swap_window())
            .unwrap()
            .unwrap();
        assert_eq!(op.value(), Some(&[9.0, 5.0][..]));
    }

    #[test]
    fn swap_rejects_missing_locators() {
        let mut w = swap_window();
        w[1] = Operation::write(None, a(1));
        assert!(SwapRecognizer::new().recognize(&w).unwrap().is_none());

        let mut w = swap_window();
        w[0] = Operation::read(a(1), None);
        assert!(SwapRecognizer::new().recognize(&w).unwrap().is_none());
    }

    #[test]
    fn swap_rejects_indexed_temporary() {
        let t = Locator::indexed("b", vec![0]);
        let w = vec![
            Operation::read(a(1), Some(t.clone())),
            Operation::write(Some(a(2)), a(1)),
            Operation::write(Some(t), a(2)),
        ];
        assert!(SwapRecognizer::new().recognize(&w).unwrap().is_none());
    }

    #[test]
    fn swap_rejects_wrong_second_target() {
        let mut w = swap_window();
        w[1] = Operation::write(Some(a(2)), a(3));
        assert!(SwapRecognizer::new().recognize(&w).unwrap().is_none());
    }

    #[test]
    fn swap_rejects_wrong_third_source_or_target() {
        let mut w = swap_window();
        w[2] = Operation::write(Some(a(7)), a(2));
        assert!(SwapRecognizer::new().recognize(&w).unwrap().is_none());

        let mut w = swap_window();
        w[2] = Operation::write(Some(tmp()), a(7));
        assert!(SwapRecognizer::new().recognize(&w).unwrap().is_none());
    }

    #[test]
    fn swap_window_size_is_a_contract() {
        let w = &swap_window()[..2];
        let err = SwapRecognizer::new().recognize(w).unwrap_err();
        assert_eq!(
            err,
            ConsolidationError::WindowSize { recognizer: "swap", expected: 3, actual: 2 }
        );
    }

    struct Echo;

    impl Recognizer for Echo {
        fn name(&self) -> &'static str {
            "echo"
        }
        fn window_size(&self) -> usize {
            1
        }
        fn recognize(&self, window: &[Operation]) -> Result<Option<Operation>> {
            Ok(window.first().cloned())
        }
    }

    #[test]
    fn registry_deduplicates_and_removes() {
        let mut r = RecognizerRegistry::with_defaults();
        assert!(!r.register(SwapRecognizer::with_values()));
        assert_eq!(r.names(), vec!["swap"]);
        assert_eq!(r.sizes(), vec![3]);
        assert!(r.remove("swap"));
        assert!(!r.remove("swap"));
        assert!(r.is_empty());
    }

    #[test]
    fn registry_dispatches_by_size() {
        let r = RecognizerRegistry::with_defaults();
        let w = swap_window();
        let (name, _) = r.attempt(&w).unwrap().unwrap();
        assert_eq!(name, "swap");
        assert!(r.attempt(&w[..2]).unwrap().is_none());
    }

    #[test]
    fn registry_rejects_primitive_output() {
        let mut r = RecognizerRegistry::new();
        r.register(Echo);
        let err = r.attempt(&swap_window()[..1]).unwrap_err();
        assert!(matches!(err, ConsolidationError::RecognizerContract { recognizer: "echo", .. }));
    }
}
