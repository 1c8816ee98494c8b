//! halo-node binary — filter a PNM image across a pool of local workers.
//!
//! ```bash
//! # Smooth, then emboss, on four workers
//! RUST_LOG=info cargo run --bin halo-node -- in.ppm out.ppm smooth emboss --workers 4
//!
//! # Worker count from the environment; unknown filter names are dropped
//! HALO_WORKERS=8 cargo run --bin halo-node -- in.pgm out.pgm blur sobel --skip-unknown
//! ```

use std::path::PathBuf;
use std::time::Instant;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use halo_pipeline::{FilterCoordinator, PassSchedule};
use halo_types::config::{ClusterConfig, FilterConfig, UnknownFilterPolicy};

// ── CLI ───────────────────────────────────────────────────────────────────────

#[derive(Parser)]
#[command(
    name    = "halo-node",
    version = env!("CARGO_PKG_VERSION"),
    about   = "Row-partitioned 3x3 image filtering"
)]
struct Cli {
    /// Binary PNM input (P5 or P6).
    input: PathBuf,

    /// Output path; parent directories are created.
    output: PathBuf,

    /// Filters applied left to right: smooth, blur, sharpen, mean, emboss.
    filters: Vec<String>,

    /// Worker threads, coordinator included. Defaults to available parallelism.
    #[arg(short, long, env = "HALO_WORKERS")]
    workers: Option<usize>,

    /// Drop unknown filter names with a warning instead of failing.
    #[arg(long)]
    skip_unknown: bool,
}

impl Cli {
    fn cluster_config(&self) -> ClusterConfig {
        let mut config = ClusterConfig::default();
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        config
    }

    fn filter_config(&self) -> FilterConfig {
        let mut config = FilterConfig::default();
        if self.skip_unknown {
            config.unknown_filter = UnknownFilterPolicy::Skip;
        }
        config
    }
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    // Default log level: INFO. Override with RUST_LOG=halo_pipeline=debug etc.
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let started = Instant::now();

    let schedule = PassSchedule::from_names(&cli.filters, cli.filter_config().unknown_filter)
        .context("invalid filter chain")?;

    let image = halo_io::read_image(&cli.input)
        .with_context(|| format!("reading {}", cli.input.display()))?;

    let coordinator = FilterCoordinator::new(cli.cluster_config());
    let (output, session) = coordinator
        .run(&image, &schedule)
        .context("filtering failed")?;

    halo_io::write_image(&cli.output, &output)
        .with_context(|| format!("writing {}", cli.output.display()))?;

    info!(
        run_id   = %session.run_id,
        workers  = session.workers,
        passes   = session.passes_completed,
        elapsed  = ?started.elapsed(),
        output   = %cli.output.display(),
        "done"
    );
    Ok(())
}
