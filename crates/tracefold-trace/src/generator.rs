// crates/tracefold-trace/src/generator.rs

//! Synthetic trace generator used by the CLI `simulate` subcommand and tests.
//!
//! Traces work on an 8-slot array `a` and a scalar `tmp`. Values are tracked
//! so every read/write carries the value it would have observed.

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

use rand::{rngs::StdRng, Rng as _, SeedableRng};
use tracefold_core::{Locator, Operation};

use crate::format::{AnnotatedVariable, Header, TraceLog};

const SLOTS: usize = 8;

fn slot(i: usize) -> Locator {
    Locator::indexed("a", vec![i as i64])
}

fn tmp() -> Locator {
    Locator::scalar("tmp")
}

/// Generate a deterministic trace of roughly `len` operations.
///
/// The body starts with `Init` of `a` and `tmp`. Each later step is, with
/// probability `swap_ratio` (clamped to `[0, 1]`), a planted swap idiom
/// `[Read{a[i]->tmp}, Write{a[j]->a[i]}, Write{tmp->a[j]}]`; otherwise a random
/// read, write, or (rarely) a message. The last step may overshoot `len` by up
/// to two operations so planted idioms are never cut.
#[must_use]
pub fn generate_trace(len: usize, seed: u64, swap_ratio: f64) -> TraceLog {
    let swap_ratio = if swap_ratio.is_nan() {
        0.0
    } else {
        swap_ratio.clamp(0.0, 1.0)
    };
    let mut rng = StdRng::seed_from_u64(seed);
    let mut a: Vec<f64> = (0..SLOTS).map(|_| f64::from(rng.random_range(0u8..100))).collect();
    let mut t = 0.0_f64;

    let mut header = Header { version: 2, ..Header::default() };
    header.declare(AnnotatedVariable::new("a", "array"));
    header.declare(AnnotatedVariable::new("tmp", "independentElement"));

    let mut body = Vec::with_capacity(len + 2);
    if len > 0 {
        let mut init = Operation::init(Locator::scalar("a")).with_value(a.clone());
        if let Operation::Init(i) = &mut init {
            i.size = Some(vec![SLOTS as i64]);
        }
        body.push(init);
    }
    if len > 1 {
        body.push(Operation::init(tmp()).with_value(vec![t]));
    }

    while body.len() < len {
        if rng.random_bool(swap_ratio) {
            let i = rng.random_range(0..SLOTS);
            let j = rng.random_range(0..SLOTS);
            t = a[i];
            body.push(Operation::read(slot(i), Some(tmp())).with_value(vec![t]));
            a[i] = a[j];
            body.push(Operation::write(Some(slot(j)), slot(i)).with_value(vec![a[i]]));
            a[j] = t;
            body.push(Operation::write(Some(tmp()), slot(j)).with_value(vec![a[j]]));
            continue;
        }
        match rng.random_range(0..20) {
            0 => body.push(Operation::message(format!("step {}", body.len()))),
            1..=9 => {
                let i = rng.random_range(0..SLOTS);
                body.push(Operation::read(slot(i), None).with_value(vec![a[i]]));
            }
            _ => {
                let i = rng.random_range(0..SLOTS);
                a[i] = f64::from(rng.random_range(0u8..100));
                body.push(Operation::write(None, slot(i)).with_value(vec![a[i]]));
            }
        }
    }

    TraceLog { header, body }
}
