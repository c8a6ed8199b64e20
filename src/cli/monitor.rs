//! Monitor command implementation

use crate::cli::output::{candidate_views, format_pool_json, format_pool_table};
use crate::cli::runtime::{
    apply_sources, build_crawler, build_pool, build_probe, install_metrics_exporter, load_config,
    populate_pool, shutdown_signal,
};
use crate::cli::MonitorArgs;
use crate::logging::init_tracing;
use crate::pool::{PoolEvent, Replenisher, StreamPool};
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

/// Render the pool's current ranking.
pub fn render_round(pool: &StreamPool, json: bool) -> Result<String, Box<dyn std::error::Error>> {
    let views = candidate_views(&pool.candidates(), pool.active().as_deref());
    if json {
        Ok(format_pool_json(pool.snapshot().tick(), &views)?)
    } else {
        Ok(format!(
            "Round {} ({} live of {})\n{}",
            pool.snapshot().tick(),
            pool.live_count(),
            pool.len(),
            format_pool_table(&views)
        ))
    }
}

/// Handle `streamfox monitor` command
pub async fn run_monitor(args: MonitorArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(&args.config)?;
    apply_sources(&mut config, &args.sources);
    config.validate()?;
    init_tracing(&config.logging)?;
    install_metrics_exporter(&config.metrics)?;

    let probe = build_probe(&config)?;
    let pool = build_pool(&config, probe)?;
    let crawler = if config.seeds.is_empty() {
        None
    } else {
        Some(build_crawler(&config)?)
    };

    let size = populate_pool(&pool, &config, crawler.as_deref()).await;
    if size == 0 && crawler.is_none() {
        return Err("No streams to monitor. Pass stream URLs or --seed pages.".into());
    }
    tracing::info!(candidates = size, "Monitoring stream pool");

    let cancel = CancellationToken::new();
    let replenish_handle = crawler.map(|crawler| {
        Replenisher::new(pool.clone(), crawler, config.seeds.clone(), config.crawler.max_depth)
            .start(cancel.clone())
    });
    let signal_handle = tokio::spawn(shutdown_signal(cancel.clone()));

    let mut events = pool.subscribe();
    pool.start_monitoring();

    let mut rounds = 0u64;
    loop {
        tokio::select! {
            _ = cancel.cancelled() => break,
            event = events.recv() => match event {
                Ok(PoolEvent::Updated { .. }) => {
                    println!("{}", render_round(&pool, args.json)?);
                    rounds += 1;
                    if args.rounds.is_some_and(|limit| rounds >= limit) {
                        break;
                    }
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!(skipped, "Output lagged behind pool events");
                }
                Err(RecvError::Closed) => break,
            }
        }
    }

    cancel.cancel();
    pool.stop_monitoring().await;
    if let Some(handle) = replenish_handle {
        handle.await?;
    }
    signal_handle.await?;

    tracing::info!(rounds, "Monitoring stopped");
    Ok(())
}
