use std::path::{Path, PathBuf};

use clap::Parser;
use tracing::error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "min_tetra")]
#[command(version, about = "Find the smallest tetrahedron whose point labels sum to 100", long_about = None)]
struct Cli {
    /// Small point set
    #[arg(long, default_value = "data/points_small.txt")]
    small: PathBuf,

    /// Large point set
    #[arg(long, default_value = "data/points_large.txt")]
    large: PathBuf,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

fn report(dataset: &str, path: &Path) -> bool {
    match min_tetra::solve(path) {
        Ok(found) => {
            let indices = found.map(|m| m.indices().to_vec()).unwrap_or_default();
            println!("Smallest valid tetrahedron indices for {dataset}: {indices:?}");
            true
        }
        Err(e) => {
            error!(dataset, "{:#}", anyhow::Error::from(e));
            false
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter_layer = if cli.debug {
        tracing_subscriber::EnvFilter::new("debug")
    } else if cli.verbose {
        tracing_subscriber::EnvFilter::new("info")
    } else {
        tracing_subscriber::EnvFilter::new("warn")
    };

    tracing_subscriber::registry()
        .with(filter_layer)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // Each dataset runs even if the other fails.
    let small_ok = report("small points", &cli.small);
    let large_ok = report("large points", &cli.large);

    if !(small_ok && large_ok) {
        anyhow::bail!("failed to process one or more point sets");
    }

    Ok(())
}
