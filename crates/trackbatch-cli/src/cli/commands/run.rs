//! `trackbatch run` – submit every track number in a file.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use trackbatch_core::batch::{plan_batches, read_track_file};
use trackbatch_core::config::TrackbatchConfig;
use trackbatch_core::control::RunControl;
use trackbatch_core::proxy::{NoProxy, ProxyList, ProxySelector};
use trackbatch_core::retry::{RetryOrchestrator, RetryPolicy};
use trackbatch_core::scheduler::{self, BatchRunner, RunSummary};
use trackbatch_core::storage::ResultStore;
use trackbatch_core::tracking::{BatchClient, RequestProfile};
use trackbatch_core::transport::{CurlSettings, CurlTransport, EasyPool, PoolSettings};

#[derive(Debug, Clone)]
pub struct RunArgs {
    pub input: PathBuf,
    pub proxies: Option<PathBuf>,
    pub output_dir: PathBuf,
    pub jobs: Option<usize>,
}

pub async fn run_batches(cfg: &TrackbatchConfig, args: RunArgs) -> Result<()> {
    let numbers = read_track_file(&args.input)?;
    if numbers.is_empty() {
        println!("No track numbers in {}.", args.input.display());
        return Ok(());
    }
    let batches = plan_batches(&numbers, cfg.batch_size);

    let proxies: Arc<dyn ProxySelector> = match &args.proxies {
        Some(path) => Arc::new(ProxyList::load(path)?),
        None => Arc::new(NoProxy),
    };

    let run_ts = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .context("system clock before Unix epoch")?
        .as_secs();
    let store = ResultStore::open(&args.output_dir, run_ts)?;

    let control = RunControl::new();
    tokio::spawn({
        let control = control.clone();
        async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::warn!("interrupt received, cancelling run");
                eprintln!("\nCancelling...");
                control.cancel();
            }
        }
    });

    let pool = EasyPool::new(PoolSettings::from(&cfg.pool_config()));
    let transport = CurlTransport::new(Arc::clone(&pool), CurlSettings::from(cfg));
    let client = BatchClient::new(
        transport,
        RequestProfile::new(&cfg.endpoint)?,
        proxies,
        control.clone(),
    );
    let orchestrator =
        RetryOrchestrator::new(RetryPolicy::from(&cfg.retry_config()), control.clone());
    let runner = Arc::new(BatchRunner::new(client, orchestrator, store.clone(), control.clone()));

    let jobs = args.jobs.unwrap_or(cfg.max_concurrent_batches).max(1);
    tracing::info!(
        numbers = numbers.len(),
        batches = batches.len(),
        jobs,
        "starting run {}",
        run_ts
    );
    println!(
        "{} track numbers in {} batches, {} in flight",
        numbers.len(),
        batches.len(),
        jobs
    );

    let (progress_tx, mut progress_rx) = tokio::sync::mpsc::channel::<RunSummary>(16);
    const PROGRESS_INTERVAL_MS: u64 = 500;
    let progress_handle = tokio::spawn(async move {
        let mut last_print = Instant::now();
        while let Some(stats) = progress_rx.recv().await {
            let now = Instant::now();
            if now.duration_since(last_print).as_millis() as u64 >= PROGRESS_INTERVAL_MS
                || stats.batches_done() >= stats.batches_total
            {
                println!(
                    "  batches {}/{} ({:.1}%)  resolved {}  partial {}  not found {}  unchecked {}",
                    stats.batches_done(),
                    stats.batches_total,
                    stats.fraction() * 100.0,
                    stats.resolved,
                    stats.partial,
                    stats.unresolved,
                    stats.unchecked
                );
                last_print = now;
            }
        }
    });

    let summary = scheduler::run_batches_parallel(runner, batches, jobs, Some(progress_tx)).await;
    let _ = progress_handle.await;
    pool.close();

    if control.is_cancelled() {
        println!(
            "Run cancelled: {} batch(es) not completed.",
            summary.batches_aborted
        );
    }
    print_summary(&summary, &store);
    Ok(())
}

fn print_summary(summary: &RunSummary, store: &ResultStore) {
    let paths = store.paths();
    println!("resolved:  {:>6}  {}", summary.resolved, paths.resolved.display());
    println!("partial:   {:>6}  {}", summary.partial, paths.partial.display());
    println!("not found: {:>6}  {}", summary.unresolved, paths.not_found.display());
    if summary.unchecked > 0 {
        println!("unchecked: {:>6}  {}", summary.unchecked, paths.unchecked.display());
    }
}
