//! tracefold-bench-harness
//!
//! Run small end-to-end benchmarks (generate -> encode -> decode -> consolidate)
//! and append CSV rows into `benchmarks/reports/bench-<unix>.csv`.
//!
//! Usage examples:
//!   cargo run --release -p tracefold-bench-harness -- --profile benchmarks/profiles/small.toml
//!   cargo run --release -p tracefold-bench-harness -- --profile benchmarks/profiles/wide.toml

use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use anyhow::{Context, Result};
use serde::Deserialize;

use tracefold_core::{Consolidator, EngineConfig, RecognizerRegistry};
use tracefold_trace::{
    generator::generate_trace,
    io::{decode, encode},
};

#[derive(Debug, Deserialize)]
struct Profile {
    /// Operations in the synthetic trace
    len: usize,
    /// RNG seed
    seed: u64,
    /// Fraction of steps that plant a swap idiom
    swap_ratio: f64,
    /// Engine window bounds
    min_size: usize,
    max_size: usize,
    /// Repetitions of the whole pipeline
    repeats: u32,
}

fn parse_flag(name: &str, default: &str) -> String {
    let mut it = std::env::args().skip(1);
    while let Some(k) = it.next() {
        if k == format!("--{name}") {
            return it.next().unwrap_or_else(|| default.to_string());
        }
    }
    default.to_string()
}

fn dur_ms(d: Duration) -> u128 {
    d.as_millis()
}

fn main() -> Result<()> {
    let profile_path = PathBuf::from(parse_flag("profile", "benchmarks/profiles/small.toml"));
    let profile_src = fs::read_to_string(&profile_path)
        .with_context(|| format!("read profile {}", profile_path.display()))?;
    let profile: Profile = toml::from_str(&profile_src).context("parse profile toml")?;
    println!(
        "Profile: len={}, seed={}, swap_ratio={}, window={}..={}, repeats={}",
        profile.len,
        profile.seed,
        profile.swap_ratio,
        profile.min_size,
        profile.max_size,
        profile.repeats
    );

    let cfg = EngineConfig::new(profile.min_size, profile.max_size)
        .context("invalid window bounds in profile")?;
    let engine = Consolidator::new(RecognizerRegistry::with_defaults(), cfg);

    fs::create_dir_all("benchmarks/reports").context("create benchmarks/reports")?;
    let ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map_or(0, |d| d.as_secs());
    let csv_path = PathBuf::from(format!("benchmarks/reports/bench-{ts}.csv"));
    let mut csv = fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(&csv_path)
        .with_context(|| format!("open {}", csv_path.display()))?;
    writeln!(csv, "timestamp,len,min,max,repeat,stage,ms,extra")?;

    let row = |csv: &mut fs::File, rep: u32, stage: &str, d: Duration, extra: String| {
        writeln!(
            csv,
            "{ts},{},{},{},{rep},{stage},{},{extra}",
            profile.len,
            profile.min_size,
            profile.max_size,
            dur_ms(d)
        )
    };

    for rep in 0..profile.repeats {
        // 1) generate trace
        let t0 = Instant::now();
        let log = generate_trace(profile.len, profile.seed, profile.swap_ratio);
        row(&mut csv, rep, "gen", t0.elapsed(), format!("ops={}", log.len()))?;

        // 2) encode
        let t0 = Instant::now();
        let bytes = encode(&log)?;
        row(&mut csv, rep, "encode", t0.elapsed(), format!("bytes={}", bytes.len()))?;

        // 3) decode
        let t0 = Instant::now();
        let log = decode(&bytes)?;
        row(&mut csv, rep, "decode", t0.elapsed(), String::new())?;

        // 4) consolidate
        let t0 = Instant::now();
        let (out, stats) = log.consolidate(&engine)?;
        row(
            &mut csv,
            rep,
            "consolidate",
            t0.elapsed(),
            format!("out={} swaps={}", out.len(), stats.composites_total()),
        )?;
    }

    println!("Wrote report → {}", csv_path.display());
    Ok(())
}
