//! Watch command implementation

use crate::cli::runtime::{
    apply_sources, build_crawler, build_pool, build_probe, install_metrics_exporter, load_config,
    populate_pool, shutdown_signal,
};
use crate::cli::WatchArgs;
use crate::config::StreamfoxConfig;
use crate::failover::{FailoverController, PlaybackEvent, PlayerExecutor, StopReason};
use crate::logging::init_tracing;
use crate::player::ProcessPlayer;
use crate::pool::{Replenisher, StreamPool};
use colored::Colorize;
use std::sync::Arc;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

/// Apply watch-only flags on top of the loaded configuration.
pub fn apply_watch_overrides(config: &mut StreamfoxConfig, args: &WatchArgs) {
    apply_sources(config, &args.sources);
    if let Some(threshold) = args.threshold {
        config.quality.switch_threshold_score = threshold;
    }
    if let Some(ref player) = args.player {
        config.player.players = vec![player.clone()];
    }
}

/// One status line per playback event.
pub fn describe_event(event: &PlaybackEvent) -> String {
    match event {
        PlaybackEvent::Started { url } => format!("{} Playing {}", "▶".green(), url),
        PlaybackEvent::SwitchStarted { from, to } => {
            format!("{} Switching {} -> {}", "⇄".cyan(), from, to)
        }
        PlaybackEvent::SwitchCompleted { to, .. } => format!("{} Playing {}", "▶".green(), to),
        PlaybackEvent::RolledBack { from, failed } => format!(
            "{} {} failed to start, back on {}",
            "↺".yellow(),
            failed,
            from
        ),
        PlaybackEvent::FellBack { failed, to } => format!(
            "{} {} failed to start, playing {}",
            "↺".yellow(),
            failed.join(", "),
            to
        ),
        PlaybackEvent::PlayerExited { url } => {
            format!("{} Player exited on {}", "✗".red(), url)
        }
        PlaybackEvent::Stopped { reason } => match reason {
            StopReason::Requested => format!("{} Stopped", "■".normal()),
            StopReason::Exhausted => format!("{} All streams failed", "■".red()),
            StopReason::ExhaustionTimeout => {
                format!("{} No live stream left, giving up", "■".red())
            }
        },
    }
}

/// Stream to start with: the best live candidate, else the first one added.
fn initial_stream(pool: &StreamPool) -> Option<String> {
    pool.best()
        .or_else(|| pool.rank().into_iter().next().map(|(url, _)| url))
}

/// Handle `streamfox watch` command
pub async fn run_watch(args: WatchArgs) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = load_config(&args.config)?;
    apply_watch_overrides(&mut config, &args);
    config.validate()?;
    init_tracing(&config.logging)?;
    install_metrics_exporter(&config.metrics)?;

    let player = match ProcessPlayer::detect(&config.player) {
        Ok(player) => player,
        Err(e) => {
            tracing::error!("No video player found! Install mpv, vlc, or ffplay");
            return Err(e.into());
        }
    };
    let player: Arc<dyn PlayerExecutor> = Arc::new(player);

    let probe = build_probe(&config)?;
    let pool = build_pool(&config, probe)?;
    let crawler = if config.seeds.is_empty() {
        None
    } else {
        Some(build_crawler(&config)?)
    };

    populate_pool(&pool, &config, crawler.as_deref()).await;
    if pool.is_empty() {
        return Err("No stream URLs to play. Pass stream URLs or --seed pages.".into());
    }

    // Score everything once so playback starts on the best stream
    pool.refresh().await;
    let initial = initial_stream(&pool);
    tracing::info!(
        candidates = pool.len(),
        live = pool.live_count(),
        "Initial probe round complete"
    );

    let controller = Arc::new(
        FailoverController::launch(
            Arc::clone(&pool),
            player,
            initial.as_deref(),
            config.player.exhaustion_timeout(),
        )
        .await?,
    );
    if let Some(url) = controller.active_url() {
        println!("{}", describe_event(&PlaybackEvent::Started { url }));
    }
    let mut events = controller.subscribe();

    let cancel = CancellationToken::new();
    pool.start_monitoring();
    let replenish_handle = crawler.map(|crawler| {
        Replenisher::new(
            Arc::clone(&pool),
            crawler,
            config.seeds.clone(),
            config.crawler.max_depth,
        )
        .start(cancel.clone())
    });
    let signal_handle = tokio::spawn(shutdown_signal(cancel.clone()));
    let control_handle = Arc::clone(&controller).run(cancel.clone());

    let stop_reason = loop {
        match events.recv().await {
            Ok(event) => {
                println!("{}", describe_event(&event));
                if let PlaybackEvent::Stopped { reason } = event {
                    break Some(reason);
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                tracing::debug!(skipped, "Output lagged behind playback events");
            }
            Err(RecvError::Closed) => break None,
        }
    };

    cancel.cancel();
    control_handle.await?;
    pool.stop_monitoring().await;
    if let Some(handle) = replenish_handle {
        handle.await?;
    }
    signal_handle.await?;

    match stop_reason {
        Some(StopReason::Exhausted) | Some(StopReason::ExhaustionTimeout) => {
            Err("All streams failed".into())
        }
        _ => Ok(()),
    }
}
