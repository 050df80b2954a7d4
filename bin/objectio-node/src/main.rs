//! ObjectIO Node - storage node binary
//!
//! Bootstraps the object pipeline over a set of local disk roots and
//! runs a demo PUT/GET/DELETE round trip to prove the wiring end to end.

use clap::Parser;
use objectio_common::Config;
use objectio_pipeline::Service;
use objectio_registry::Registry;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser, Debug)]
#[command(name = "objectio-node")]
#[command(about = "ObjectIO storage node")]
#[command(version)]
struct Args {
    /// Configuration file path (TOML)
    #[arg(short, long, default_value = "/etc/objectio/node.toml")]
    config: String,

    /// Disk roots to use for storage (overrides config file)
    #[arg(long)]
    disks: Vec<PathBuf>,

    /// Log level override (falls back to BUCKETS_LOG_LEVEL, then config)
    #[arg(long)]
    log_level: Option<String>,
}

/// Exit codes: 0 success, 1 initialization error, 2 invalid configuration.
const EXIT_INIT_ERROR: i32 = 1;
const EXIT_INVALID_CONFIG: i32 = 2;

fn load_config(path: &str) -> Result<Config, i32> {
    if !std::path::Path::new(path).exists() {
        return Ok(Config::default());
    }
    let raw = std::fs::read_to_string(path).map_err(|e| {
        eprintln!("failed to read config file {path}: {e}");
        EXIT_INIT_ERROR
    })?;
    toml::from_str(&raw).map_err(|e| {
        eprintln!("invalid configuration in {path}: {e}");
        EXIT_INVALID_CONFIG
    })
}

fn init_logging(level: &str) {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_env("BUCKETS_LOG_LEVEL")
                .unwrap_or_else(|_| level.to_string().into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() {
    std::process::exit(run().await);
}

async fn run() -> i32 {
    let args = Args::parse();

    let config = match load_config(&args.config) {
        Ok(c) => c,
        Err(code) => return code,
    };

    let log_level = args.log_level.unwrap_or_else(|| config.log_level.clone());
    init_logging(&log_level);

    let disk_roots = if args.disks.is_empty() {
        config.storage.disk_roots.clone()
    } else {
        args.disks.clone()
    };
    if disk_roots.is_empty() {
        error!("no disk roots configured; pass --disks or set storage.disk_roots in the config file");
        return EXIT_INVALID_CONFIG;
    }

    info!(disks = disk_roots.len(), "starting objectio-node");
    for root in &disk_roots {
        if let Err(e) = std::fs::create_dir_all(root) {
            error!(?root, error = %e, "failed to create disk root");
            return EXIT_INIT_ERROR;
        }
    }

    let registry_root = disk_roots[0].join(".registry");
    if let Err(e) = std::fs::create_dir_all(&registry_root) {
        error!(error = %e, "failed to create registry root");
        return EXIT_INIT_ERROR;
    }
    let registry = Registry::new(
        vec![registry_root],
        config.registry.max_entries,
        Duration::from_secs(config.registry.ttl_secs),
    );

    let deployment_id = config.node.deployment_id();
    let service = match Service::new(deployment_id, disk_roots, registry) {
        Ok(s) => s,
        Err(e) => {
            error!(error = %e, "failed to initialize object pipeline");
            return EXIT_INIT_ERROR;
        }
    };

    if let Err(e) = demo_round_trip(&service).await {
        error!(error = %e, "demo round trip failed");
        return EXIT_INIT_ERROR;
    }

    info!("objectio-node ready");
    0
}

async fn demo_round_trip(service: &Service) -> objectio_common::Result<()> {
    let payload = b"Hello, World!";
    let put = service
        .put_object("demo-bucket", "hello.txt", payload, Some("text/plain".to_string()))
        .await?;
    let got = service.get_object("demo-bucket", "hello.txt").await?;
    if got.data != payload || got.etag != put.etag {
        return Err(objectio_common::Error::internal(
            "demo round trip returned mismatched data",
        ));
    }
    info!(etag = %put.etag, size = put.size, "demo round trip succeeded");
    Ok(())
}
