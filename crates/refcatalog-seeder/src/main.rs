use std::process::ExitCode;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::Directive;

use refcatalog_seeder::{Cli, Pipeline};
use refcatalog_store::MemoryCatalog;

const RUN_DEADLINE: Duration = Duration::from_secs(30 * 60);
const DEFAULT_LOG_TARGETS: [&str; 4] = [
    "refcatalog_seed",
    "refcatalog_seeder",
    "refcatalog_datasets",
    "refcatalog_store",
];

#[tokio::main]
async fn main() -> ExitCode {
    init_tracing();

    match run().await {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(err) => {
            error!("{err:#}");
            ExitCode::FAILURE
        }
    }
}

/// Returns whether every phase succeeded.
async fn run() -> anyhow::Result<bool> {
    let cli = Cli::parse();
    let (cfg, phases) = cli.resolve().context("load seeder config")?;
    info!(
        store = %cli.store.display(),
        dry_run = cfg.dry_run,
        load_mode = %cfg.load_mode,
        batch_size = cfg.batch_size,
        top_n = cfg.top_n,
        "seeder configured"
    );

    let start = Instant::now();
    let store = Arc::new(
        MemoryCatalog::open(&cli.store)
            .with_context(|| format!("open catalog {}", cli.store.display()))?,
    );
    let before = store.counts();
    info!("catalog loaded in {} ms: {:?}", start.elapsed().as_millis(), before);

    let cancel = CancellationToken::new();
    spawn_cancel_triggers(cancel.clone());

    let dry_run = cfg.dry_run;
    let mut pipeline = Pipeline::new(Arc::clone(&store), cfg).with_cancellation(cancel.clone());
    pipeline.run(&phases).await.context("seeding pipeline")?;
    cancel.cancel();

    for line in pipeline.summary().lines() {
        info!("{line}");
    }

    if !dry_run {
        store
            .persist()
            .with_context(|| format!("persist catalog {}", cli.store.display()))?;
        info!("catalog saved: {:?}", store.counts());
    }

    if pipeline.has_errors() {
        warn!("pipeline completed with errors");
        return Ok(false);
    }
    info!("pipeline completed successfully");
    Ok(true)
}

/// Cancel on Ctrl-C or when the run deadline passes.
fn spawn_cancel_triggers(cancel: CancellationToken) {
    tokio::spawn(async move {
        tokio::select! {
            _ = cancel.cancelled() => {}
            res = tokio::signal::ctrl_c() => {
                if let Err(err) = res {
                    warn!("ctrl-c handler unavailable: {err}");
                    return;
                }
                warn!("interrupt received, stopping after the current batch");
                cancel.cancel();
            }
            _ = tokio::time::sleep(RUN_DEADLINE) => {
                warn!("run deadline of {} minutes reached", RUN_DEADLINE.as_secs() / 60);
                cancel.cancel();
            }
        }
    });
}

/// `RUST_LOG` wins; otherwise the refcatalog crates log at info and
/// dependencies only warn.
fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        DEFAULT_LOG_TARGETS
            .iter()
            .filter_map(|target| format!("{target}=info").parse::<Directive>().ok())
            .fold(EnvFilter::new("warn"), EnvFilter::add_directive)
    });
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_level(true)
        .init();
}
