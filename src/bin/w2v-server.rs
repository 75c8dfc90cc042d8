//! w2v-similar Server Binary
//!
//! Word embedding nearest-neighbor inference server.

use clap::Parser;
use std::path::PathBuf;
use tracing::info;
use tracing_subscriber::{fmt, EnvFilter};
use w2v_similar::server::{Config, DEFAULT_MAX_BODY_BYTES, DEFAULT_MODEL_PATH};
use w2v_similar::Server;

/// w2v-similar Server - Word Embedding Nearest Neighbors
#[derive(Parser, Debug)]
#[command(author, version, about)]
struct Args {
    /// Bind address
    #[arg(short, long, default_value = "0.0.0.0")]
    bind: String,

    /// Port number
    #[arg(short, long, default_value_t = 8080)]
    port: u16,

    /// word2vec text model file
    #[arg(short, long, env = "MODEL_PATH", default_value = DEFAULT_MODEL_PATH)]
    model_path: PathBuf,

    /// Number of worker threads (0 = auto-detect based on CPU cores)
    #[arg(long, default_value_t = 0)]
    workers: usize,

    /// Load the model before accepting requests
    #[arg(long, default_value_t = false)]
    preload: bool,

    /// Largest accepted request body in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_BODY_BYTES)]
    max_body_bytes: usize,
}

fn main() -> anyhow::Result<()> {
    // Initialize logging
    fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("w2v_similar=info".parse()?))
        .init();

    let args = Args::parse();

    let config = Config::default()
        .with_bind(&args.bind)
        .with_port(args.port)
        .with_model_path(args.model_path)
        .with_workers(args.workers)
        .with_preload(args.preload)
        .with_max_body_bytes(args.max_body_bytes);

    let workers = config.worker_threads();
    info!(
        "Starting w2v-similar server on {} with {} workers",
        config.addr(),
        workers
    );

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(workers)
        .enable_all()
        .build()?;

    runtime.block_on(Server::new(config).run())?;

    Ok(())
}
