// crates/tracefold-cli/src/main.rs

#![forbid(unsafe_code)]
#![deny(
    rust_2018_idioms,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::panic,
    clippy::todo
)]

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use std::fs::File;
use std::io::{BufReader, Write};
use std::path::{Path, PathBuf};
use tracefold_core::{Consolidator, EngineConfig, HighLevelPolicy, RecognizerRegistry, SwapRecognizer};
use tracefold_trace::{
    io::{read_trace_log_auto, write_trace_log_auto},
    simple::render_simple_log,
    tally::OperationTally,
};
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(
    name = "tracefold",
    about = "Trace log consolidation CLI",
    long_about = "Trace log consolidation CLI.\n\nUse this tool to fold primitive read/write sequences in a trace log into composite operations (swaps), generate synthetic traces, and inspect logs.",
    version = env!("CARGO_PKG_VERSION"),
    disable_help_subcommand = true
)]
struct Cli {
    #[command(subcommand)]
    cmd: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Consolidate a trace log's body and write the result.
    Consolidate {
        /// Input trace log (JSON/CBOR)
        #[arg(long)]
        input: PathBuf,

        /// Output trace log (JSON/CBOR; JSON if the extension is unknown)
        #[arg(long)]
        output: PathBuf,

        /// Engine configuration (JSON); flags below override its fields
        #[arg(long)]
        config: Option<PathBuf>,

        /// Smallest window a recognizer is tried on (default 3)
        #[arg(long)]
        min: Option<usize>,

        /// Largest window before the oldest operation is committed (default 3)
        #[arg(long)]
        max: Option<usize>,

        /// What to do with composite operations already in the input
        #[arg(long, value_enum)]
        high_level: Option<HighLevelOpt>,

        /// Treat writes carrying more than one value as pattern barriers
        #[arg(long, default_value_t = false)]
        bulk_write_barrier: bool,

        /// Attach post-swap values to recognized swaps
        #[arg(long, default_value_t = false)]
        with_swap_values: bool,

        /// Print run statistics as JSON instead of a summary line
        #[arg(long, default_value_t = false)]
        stats_json: bool,
    },

    /// Write a deterministic synthetic trace log.
    Simulate {
        /// Approximate number of operations (>0)
        #[arg(long, default_value_t = 64, value_parser = clap::value_parser!(u32).range(1..))]
        len: u32,

        /// RNG seed
        #[arg(long, default_value_t = 42)]
        seed: u64,

        /// Fraction of steps that plant a swap idiom, in [0, 1]
        #[arg(long, default_value_t = 0.2)]
        swap_ratio: f64,

        /// Output trace log (JSON/CBOR)
        #[arg(long, default_value = "trace.json")]
        out: PathBuf,
    },

    /// Print per-kind operation counts of a trace log.
    Stats {
        /// Input trace log (JSON/CBOR)
        #[arg(long)]
        input: PathBuf,
    },

    /// Render a trace log as a numbered, human-readable listing.
    Simple {
        /// Input trace log (JSON/CBOR)
        #[arg(long)]
        input: PathBuf,

        /// Output file (stdout if omitted)
        #[arg(long)]
        out: Option<PathBuf>,
    },
}

#[derive(Copy, Clone, Eq, PartialEq, Debug, ValueEnum)]
enum HighLevelOpt {
    /// Commit composites unchanged and close the window
    Flush,
    /// Carry composites through in place
    Keep,
    /// Drop composites
    Discard,
    /// Fail on the first composite
    Reject,
}

impl From<HighLevelOpt> for HighLevelPolicy {
    fn from(o: HighLevelOpt) -> Self {
        match o {
            HighLevelOpt::Flush => Self::Flush,
            HighLevelOpt::Keep => Self::Keep,
            HighLevelOpt::Discard => Self::Discard,
            HighLevelOpt::Reject => Self::Reject,
        }
    }
}

fn main() -> Result<()> {
    init_tracing();

    let cli = Cli::parse();
    match cli.cmd {
        Cmd::Consolidate {
            input,
            output,
            config,
            min,
            max,
            high_level,
            bulk_write_barrier,
            with_swap_values,
            stats_json,
        } => {
            let mut cfg = match config {
                Some(p) => read_engine_config(&p)?,
                None => EngineConfig::default(),
            };
            cfg.min_size = min.unwrap_or(cfg.min_size);
            cfg.max_size = max.unwrap_or(cfg.max_size);
            if let Some(h) = high_level {
                cfg.high_level = h.into();
            }
            cfg.bulk_write_barrier |= bulk_write_barrier;
            consolidate(&input, &output, cfg, with_swap_values, stats_json)
        }

        Cmd::Simulate {
            len,
            seed,
            swap_ratio,
            out,
        } => simulate(len, seed, swap_ratio, &out),

        Cmd::Stats { input } => stats(&input),

        Cmd::Simple { input, out } => simple(&input, out.as_deref()),
    }
}

/// Initialize tracing with an env-driven filter (default INFO).
fn init_tracing() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let fmt_layer = fmt::layer()
        .with_target(false)
        .with_level(true)
        .with_writer(std::io::stderr)
        .compact();

    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .try_init();
}

/// Ensure the parent directory for a file exists.
fn ensure_parent_dir(path: &Path) -> Result<()> {
    if let Some(dir) = path.parent() {
        if !dir.as_os_str().is_empty() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("creating parent directory {}", dir.display()))?;
        }
    }
    Ok(())
}

fn read_engine_config(path: &Path) -> Result<EngineConfig> {
    let f = File::open(path).with_context(|| format!("open {}", path.display()))?;
    serde_json::from_reader(BufReader::new(f))
        .with_context(|| format!("parsing engine config {}", path.display()))
}

fn consolidate(
    input: &Path,
    output: &Path,
    cfg: EngineConfig,
    with_swap_values: bool,
    stats_json: bool,
) -> Result<()> {
    cfg.validate().context("invalid engine configuration")?;

    let mut registry = RecognizerRegistry::new();
    registry.register(if with_swap_values {
        SwapRecognizer::with_values()
    } else {
        SwapRecognizer::new()
    });
    let engine = Consolidator::new(registry, cfg);

    info!(input=%input.display(), output=%output.display(), ?cfg, "consolidating");
    let log = read_trace_log_auto(input)
        .with_context(|| format!("reading trace log {}", input.display()))?;
    let (log, stats) = log
        .consolidate(&engine)
        .with_context(|| format!("consolidating {}", input.display()))?;

    ensure_parent_dir(output)?;
    write_trace_log_auto(output, &log)
        .with_context(|| format!("writing trace log to {}", output.display()))?;

    if stats_json {
        let s = serde_json::to_string_pretty(&stats).context("serialize stats")?;
        println!("{s}");
    } else {
        println!(
            "Consolidated {} → {} operations ({} composites, {} discarded) → {}",
            stats.input_len,
            stats.output_len,
            stats.composites_total(),
            stats.discarded,
            output.display()
        );
    }
    Ok(())
}

fn simulate(len: u32, seed: u64, swap_ratio: f64, out: &Path) -> Result<()> {
    use tracefold_trace::generator::generate_trace;

    if !(0.0..=1.0).contains(&swap_ratio) {
        bail!("swap ratio ({swap_ratio}) must lie in [0, 1]");
    }

    info!(len, seed, swap_ratio, "generating synthetic trace");
    let log = generate_trace(len as usize, seed, swap_ratio);

    ensure_parent_dir(out)?;
    write_trace_log_auto(out, &log)
        .with_context(|| format!("writing trace log to {}", out.display()))?;

    println!(
        "Simulated trace: len={}, seed={seed}, swap-ratio={swap_ratio} → {} operations → {}",
        len,
        log.len(),
        out.display()
    );
    Ok(())
}

fn stats(input: &Path) -> Result<()> {
    let log = read_trace_log_auto(input)
        .with_context(|| format!("reading trace log {}", input.display()))?;
    let tally = OperationTally::from_operations(&log.body);
    println!("{} operations: {tally}", tally.total());
    Ok(())
}

fn simple(input: &Path, out: Option<&Path>) -> Result<()> {
    let log = read_trace_log_auto(input)
        .with_context(|| format!("reading trace log {}", input.display()))?;
    let text = render_simple_log(&log);

    match out {
        Some(p) => {
            ensure_parent_dir(p)?;
            std::fs::write(p, text).with_context(|| format!("writing {}", p.display()))?;
            println!("Wrote simple log → {}", p.display());
        }
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(text.as_bytes())?;
            stdout.flush()?;
        }
    }
    Ok(())
}
