//! Sliding-window consolidation engine.
//!
//! The engine keeps three sequences per run:
//!
//! - `pending`: input not processed yet (front = next);
//! - `window`: primitive operations currently under consideration, bounded by
//!   `[min_size, max_size]`;
//! - `output`: the append-only consolidated sequence.
//!
//! The window is filled to `min_size`, offered to every recognizer registered
//! for its current size, and grown one operation at a time up to `max_size`.
//! When nothing matches at `max_size` the oldest member is committed and the
//! window shrinks back to `min_size` (trailing members return to `pending`).
//! A match replaces the whole window with one composite operation.
//!
//! Control operations never enter the window. A `Message` is committed
//! directly when the window is empty; otherwise it rides along behind the
//! newest window member and is committed with it, so input order survives. An
//! `Init` flushes the window and is committed after it. Composite operations
//! found in the input are handled by [`HighLevelPolicy`].

use crate::error::{ConsolidationError, Result};
use crate::operation::Operation;
use crate::recognizer::RecognizerRegistry;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, VecDeque};
use tracing::{debug, warn};

/// What to do with a composite operation found in the input.
#[derive(Clone, Copy, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HighLevelPolicy {
    /// Flush the window, then commit the composite (it breaks any pattern).
    #[default]
    Flush,
    /// Commit the composite like a `Message`; the window is kept.
    Keep,
    /// Drop the composite.
    Discard,
    /// Fail the run before committing anything.
    Reject,
}

/// Engine knobs.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct EngineConfig {
    /// Smallest window offered to recognizers.
    pub min_size: usize,
    /// Largest window offered to recognizers.
    pub max_size: usize,
    /// Handling of composite operations in the input.
    #[serde(default)]
    pub high_level: HighLevelPolicy,
    /// Treat a `Write` carrying more than one value like an `Init`.
    #[serde(default)]
    pub bulk_write_barrier: bool,
}

impl EngineConfig {
    /// Validated bounds with default policies.
    ///
    /// # Errors
    /// [`ConsolidationError::InvalidWindow`] unless `1 <= min_size <= max_size`.
    pub fn new(min_size: usize, max_size: usize) -> Result<Self> {
        let cfg = Self {
            min_size,
            max_size,
            ..Self::default()
        };
        cfg.validate()?;
        Ok(cfg)
    }

    /// Check the window bounds.
    ///
    /// # Errors
    /// [`ConsolidationError::InvalidWindow`] unless `1 <= min_size <= max_size`.
    pub const fn validate(&self) -> Result<()> {
        if self.min_size == 0 || self.min_size > self.max_size {
            return Err(ConsolidationError::InvalidWindow {
                min_size: self.min_size,
                max_size: self.max_size,
            });
        }
        Ok(())
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_size: 3,
            max_size: 3,
            high_level: HighLevelPolicy::Flush,
            bulk_write_barrier: false,
        }
    }
}

/// Counters for one run.
#[derive(Clone, Debug, Default, Serialize, PartialEq, Eq)]
pub struct ConsolidationStats {
    /// Operations consumed.
    pub input_len: usize,
    /// Operations produced.
    pub output_len: usize,
    /// Composites produced, per recognizer name.
    pub composites: BTreeMap<&'static str, usize>,
    /// Composites from the input dropped under [`HighLevelPolicy::Discard`].
    pub discarded: usize,
}

impl ConsolidationStats {
    /// Total composites produced.
    #[must_use]
    pub fn composites_total(&self) -> usize {
        self.composites.values().sum()
    }
}

/// Consolidate `ops` with the default recognizers and policies.
///
/// # Errors
/// [`ConsolidationError::InvalidWindow`] for bad bounds.
pub fn consolidate(ops: Vec<Operation>, min_size: usize, max_size: usize) -> Result<Vec<Operation>> {
    let cfg = EngineConfig::new(min_size, max_size)?;
    Consolidator::new(RecognizerRegistry::with_defaults(), cfg).consolidate(ops)
}

/// Recognizer registry + configuration. Holds no per-run state.
#[derive(Debug)]
pub struct Consolidator {
    registry: RecognizerRegistry,
    cfg: EngineConfig,
}

impl Default for Consolidator {
    fn default() -> Self {
        Self::new(RecognizerRegistry::with_defaults(), EngineConfig::default())
    }
}

impl Consolidator {
    /// Construct an engine.
    #[must_use]
    pub fn new(registry: RecognizerRegistry, cfg: EngineConfig) -> Self {
        for size in registry.sizes() {
            if size < cfg.min_size || size > cfg.max_size {
                warn!(
                    size,
                    min_size = cfg.min_size,
                    max_size = cfg.max_size,
                    "recognizer window size outside engine bounds; it will never fire"
                );
            }
        }
        Self { registry, cfg }
    }

    /// The active configuration.
    #[must_use]
    pub const fn config(&self) -> &EngineConfig {
        &self.cfg
    }

    /// The registered recognizers.
    #[must_use]
    pub const fn registry(&self) -> &RecognizerRegistry {
        &self.registry
    }

    /// Mutable access to the recognizers.
    pub fn registry_mut(&mut self) -> &mut RecognizerRegistry {
        &mut self.registry
    }

    /// Consolidate `ops`, consuming them.
    ///
    /// # Errors
    /// See [`ConsolidationError`]; nothing is returned on failure.
    pub fn consolidate(&self, ops: Vec<Operation>) -> Result<Vec<Operation>> {
        self.consolidate_with_stats(ops).map(|(out, _)| out)
    }

    /// Consolidate a copy of `ops`, leaving the input untouched.
    ///
    /// # Errors
    /// See [`Consolidator::consolidate`].
    pub fn consolidate_slice(&self, ops: &[Operation]) -> Result<Vec<Operation>> {
        self.consolidate(ops.to_vec())
    }

    /// Consolidate `ops` and report what happened.
    ///
    /// # Errors
    /// See [`Consolidator::consolidate`].
    pub fn consolidate_with_stats(
        &self,
        ops: Vec<Operation>,
    ) -> Result<(Vec<Operation>, ConsolidationStats)> {
        self.cfg.validate()?;
        if self.cfg.high_level == HighLevelPolicy::Reject {
            if let Some((position, op)) = ops.iter().enumerate().find(|(_, op)| op.is_composite()) {
                return Err(ConsolidationError::CompositeInInput {
                    position,
                    kind: op.kind(),
                });
            }
        }

        let input_len = ops.len();
        let mut run = Run {
            engine: self,
            pending: ops.into(),
            window: VecDeque::with_capacity(self.cfg.max_size + 1),
            held: VecDeque::with_capacity(self.cfg.max_size + 1),
            output: Vec::with_capacity(input_len),
            stats: ConsolidationStats {
                input_len,
                ..ConsolidationStats::default()
            },
        };
        run.scan()?;

        let Run {
            output, mut stats, ..
        } = run;
        stats.output_len = output.len();
        debug!(
            input = stats.input_len,
            output = stats.output_len,
            composites = stats.composites_total(),
            "consolidation finished"
        );
        Ok((output, stats))
    }
}

/// Outcome of pulling from `pending`.
enum Pull {
    /// A primitive operation joined the window.
    Grew,
    /// `pending` is empty.
    Exhausted,
}

/// Per-call state; dropped when the call returns.
///
/// `held[i]` holds the operations pulled after `window[i]` that bypass the
/// window (messages, kept composites). They are committed right after
/// `window[i]` so the output keeps the input order.
struct Run<'a> {
    engine: &'a Consolidator,
    pending: VecDeque<Operation>,
    window: VecDeque<Operation>,
    held: VecDeque<Vec<Operation>>,
    output: Vec<Operation>,
    stats: ConsolidationStats,
}

impl Run<'_> {
    fn scan(&mut self) -> Result<()> {
        let EngineConfig {
            min_size, max_size, ..
        } = self.engine.cfg;

        'outer: while !self.pending.is_empty() || !self.window.is_empty() {
            // Fill.
            while self.window.len() < min_size {
                if let Pull::Exhausted = self.pull() {
                    break 'outer;
                }
            }

            // Attempt, then grow up to max_size (inclusive).
            loop {
                if self.window.len() < min_size {
                    // An Init or barrier emptied the window while growing.
                    continue 'outer;
                }
                if self.attempt()? {
                    continue 'outer;
                }
                if self.window.len() >= max_size {
                    break;
                }
                if let Pull::Exhausted = self.pull() {
                    break 'outer;
                }
            }

            // No match at max_size: commit the oldest, shrink back to min_size.
            self.commit_front();
            while self.window.len() > min_size {
                self.push_back_last();
            }
        }

        self.flush();
        Ok(())
    }

    /// Offer the window to the recognizers; on a match commit the composite.
    fn attempt(&mut self) -> Result<bool> {
        let window = self.window.make_contiguous();
        match self.engine.registry.attempt(window)? {
            Some((name, composite)) => {
                debug!(recognizer = name, op = %composite, "window consolidated");
                *self.stats.composites.entry(name).or_default() += 1;
                self.window.clear();
                self.output.push(composite);
                let held: Vec<_> = self.held.drain(..).flatten().collect();
                self.output.extend(held);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Pull until one primitive joins the window or `pending` runs out.
    fn pull(&mut self) -> Pull {
        while let Some(op) = self.pending.pop_front() {
            if self.is_barrier(&op) {
                self.flush_then(op);
                continue;
            }
            match op {
                Operation::Message(_) => self.hold(op),
                Operation::Init(_) => self.flush_then(op),
                Operation::Read(_) | Operation::Write(_) => {
                    self.window.push_back(op);
                    self.held.push_back(Vec::new());
                    return Pull::Grew;
                }
                Operation::Swap(_) => self.high_level(op),
            }
        }
        Pull::Exhausted
    }

    /// Multi-valued write under `bulk_write_barrier`.
    fn is_barrier(&self, op: &Operation) -> bool {
        self.engine.cfg.bulk_write_barrier
            && matches!(op, Operation::Write(w) if w.value.as_ref().is_some_and(|v| v.len() > 1))
    }

    fn high_level(&mut self, op: Operation) {
        match self.engine.cfg.high_level {
            HighLevelPolicy::Flush => self.flush_then(op),
            HighLevelPolicy::Keep => self.hold(op),
            HighLevelPolicy::Discard => {
                debug!(op = %op, "discarding composite operation from input");
                self.stats.discarded += 1;
            }
            // Rejected up front; nothing composite is left in `pending`.
            HighLevelPolicy::Reject => self.flush_then(op),
        }
    }

    /// Commit `op` after the newest window member, or now if the window is empty.
    fn hold(&mut self, op: Operation) {
        match self.held.back_mut() {
            Some(after_last) => after_last.push(op),
            None => self.output.push(op),
        }
    }

    fn commit_front(&mut self) {
        if let Some(oldest) = self.window.pop_front() {
            self.output.push(oldest);
        }
        if let Some(after) = self.held.pop_front() {
            self.output.extend(after);
        }
    }

    /// Return the newest window member (and what followed it) to `pending`.
    fn push_back_last(&mut self) {
        if let Some(after) = self.held.pop_back() {
            for op in after.into_iter().rev() {
                self.pending.push_front(op);
            }
        }
        if let Some(op) = self.window.pop_back() {
            self.pending.push_front(op);
        }
    }

    fn flush_then(&mut self, op: Operation) {
        self.flush();
        self.output.push(op);
    }

    fn flush(&mut self) {
        while !self.window.is_empty() {
            self.commit_front();
        }
    }
}
