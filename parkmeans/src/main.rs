//! parkmeans CLI
//!
//! - `local`: run every worker in this process over loopback TCP
//! - `seed`: assign ranks to workers joining a multi-process run
//! - `worker`: join a run; the worker given rank 0 loads the data and prints the report

use anyhow::{Context, bail};
use clap::{Args, Parser, Subcommand};
use parkmeans::kmeans::DEFAULT_INPUT;
use parkmeans::{
    AggregateLayout, Communicator, Dataset, KMeansConfig, ParkmeansConfig, SeedNode, WorkerNode,
    run_local, run_worker,
};
use std::net::SocketAddr;
use std::path::PathBuf;
use tracing_subscriber::{EnvFilter, fmt};

/// Distributed k-means over single-byte observations.
#[derive(Parser)]
#[command(name = "parkmeans")]
#[command(version)]
#[command(about = "Distributed k-means over single-byte observations")]
#[command(propagate_version = true)]
struct Cli {
    /// Verbosity level (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run all workers in this process
    Local {
        /// Number of workers; one observation each
        #[arg(short, long)]
        workers: u32,

        /// Binary file of u8 observations
        #[arg(short, long, default_value = DEFAULT_INPUT)]
        input: PathBuf,

        #[command(flatten)]
        kmeans: KMeansArgs,
    },
    /// Form a cluster of worker processes
    Seed {
        /// Address workers connect to
        #[arg(short, long)]
        bind: SocketAddr,

        /// Number of workers to wait for
        #[arg(short, long)]
        workers: u32,
    },
    /// Join a cluster formed by a seed
    Worker {
        /// Seed address
        #[arg(short, long)]
        seed: SocketAddr,

        /// Address for mesh connections from other workers
        #[arg(short, long, default_value = "0.0.0.0:0")]
        listen: SocketAddr,

        /// Binary file of u8 observations, read only by rank 0
        #[arg(short, long, default_value = DEFAULT_INPUT)]
        input: PathBuf,

        #[command(flatten)]
        kmeans: KMeansArgs,
    },
}

/// Clustering parameters; flags override `PARKMEANS_*` environment variables.
#[derive(Args)]
struct KMeansArgs {
    /// Number of clusters
    #[arg(short = 'k', long)]
    clusters: Option<usize>,

    /// Largest centroid movement that still counts as converged
    #[arg(short, long)]
    epsilon: Option<f32>,

    /// Stop after this many rounds even if not converged
    #[arg(long)]
    max_rounds: Option<u64>,

    /// Reduction layout: interleaved or separate-counts
    #[arg(long)]
    layout: Option<AggregateLayout>,
}

impl KMeansArgs {
    fn resolve(self) -> anyhow::Result<KMeansConfig> {
        let mut cfg = KMeansConfig::from_env();
        if let Some(k) = self.clusters {
            cfg.clusters = k;
        }
        if let Some(eps) = self.epsilon {
            cfg.epsilon = eps;
        }
        if self.max_rounds.is_some() {
            cfg.max_rounds = self.max_rounds;
        }
        if let Some(layout) = self.layout {
            cfg.layout = layout;
        }
        cfg.validate()?;
        Ok(cfg)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter = match cli.verbose {
        0 => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    };
    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let runtime = ParkmeansConfig::from_env();

    match cli.command {
        Commands::Local {
            workers,
            input,
            kmeans,
        } => {
            let config = kmeans.resolve()?;
            let dataset = Dataset::load_for_run(&input, workers as usize, config.clusters)
                .await
                .with_context(|| format!("loading {}", input.display()))?;
            let outcomes = run_local(dataset, workers, runtime, config)
                .await
                .context("k-means run failed")?;
            match outcomes.first().and_then(|o| o.report.as_ref()) {
                Some(report) => print!("{report}"),
                None => bail!("root worker produced no report"),
            }
        }
        Commands::Seed { bind, workers } => {
            let seed = SeedNode::bind(bind, workers)
                .await
                .with_context(|| format!("binding seed on {bind}"))?
                .with_formation_timeout(runtime.formation_timeout);
            tracing::info!(addr = %seed.local_addr(), workers, "waiting for workers");
            let map = seed.form_cluster().await.context("cluster formation failed")?;
            tracing::info!(workers = map.len(), "cluster formed");
        }
        Commands::Worker {
            seed,
            listen,
            input,
            kmeans,
        } => {
            let config = kmeans.resolve()?;
            let node = WorkerNode::connect(seed, listen, runtime.formation_timeout)
                .await
                .with_context(|| format!("joining cluster at {seed}"))?;
            let world = node.world_size as usize;
            let comm = Communicator::join(node, runtime).await?;

            let dataset = if comm.is_root() {
                match Dataset::load_for_run(&input, world, config.clusters).await {
                    Ok(ds) => Some(ds),
                    Err(e) => {
                        comm.abort(&e.to_string()).await;
                        return Err(e).with_context(|| format!("loading {}", input.display()));
                    }
                }
            } else {
                None
            };

            let outcome = run_worker(&comm, dataset.as_ref(), &config)
                .await
                .with_context(|| format!("rank {} failed", comm.rank()))?;
            if let Some(report) = outcome.report {
                print!("{report}");
            }
        }
    }

    Ok(())
}
