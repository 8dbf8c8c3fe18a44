mod api;
mod config;
mod duration;
mod event;
mod modes;
mod paths;
mod status;
mod stream_events;
mod sync;

use std::sync::Arc;
use tokio::io::BufReader;
use tokio::sync::mpsc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::api::{DryRunModeApi, LogNotifier};
use crate::event::DaemonEvent;
use crate::sync::ModeSync;

#[tokio::main]
async fn main() {
    // ── Logging ───────────────────────────────────────────────────────────────
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "chatstates_daemon=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    // ── App data directory ────────────────────────────────────────────────────
    let app_dir = paths::app_data_dir();
    if let Err(e) = std::fs::create_dir_all(&app_dir) {
        tracing::error!("Failed to create data directory {}: {e}", app_dir.display());
        std::process::exit(1);
    }

    // ── Configuration ─────────────────────────────────────────────────────────
    let config_path = paths::config_file_path();
    let (mut config, config_error) = match config::load_or_default(&config_path) {
        Ok(config) => (config, None),
        Err(e) => {
            tracing::error!("Config error (using defaults): {e:#}");
            (config::Config::default(), Some(format!("{e:#}")))
        }
    };

    // ── Initial status ────────────────────────────────────────────────────────
    let status_path = paths::status_file_path();
    let mut current_status = status::DaemonStatus::new(config.session.is_some());
    if let Some(reason) = config_error {
        current_status.record_config_error(reason);
    }
    status::write_status(&status_path, &current_status);

    let (event_tx, mut event_rx) = mpsc::channel::<DaemonEvent>(32);

    // ── Background tasks ──────────────────────────────────────────────────────
    tokio::spawn(config::watch_config(config_path, event_tx.clone()));
    tokio::spawn(stream_events::run(
        BufReader::new(tokio::io::stdin()),
        event_tx.clone(),
    ));

    // Graceful shutdown on Ctrl+C.
    {
        let tx = event_tx.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                let _ = tx.send(DaemonEvent::Shutdown).await;
            }
        });
    }
    drop(event_tx);

    // No platform client is linked into this binary; updates are logged instead.
    let mode_sync = ModeSync::new(Arc::new(DryRunModeApi), Arc::new(LogNotifier));

    tracing::info!("chatstates-daemon v{} started", env!("CARGO_PKG_VERSION"));
    if config.session.is_none() {
        tracing::warn!("No [session] configured; stream events will not change chat modes");
    }

    // ── Event loop ────────────────────────────────────────────────────────────
    while let Some(evt) = event_rx.recv().await {
        match evt {
            DaemonEvent::Stream(notification) => {
                if !notification.concerns(config.session.as_ref()) {
                    tracing::debug!(
                        "Ignoring {:?} for broadcaster {:?}",
                        notification.event,
                        notification.broadcaster_id
                    );
                    continue;
                }

                tracing::info!("Stream event: {:?}", notification.event);
                let report = mode_sync
                    .handle(
                        notification.event,
                        &config.chat_states,
                        config.session.as_ref(),
                    )
                    .await;
                if report.failures() > 0 {
                    tracing::warn!(
                        "{} of {} chat mode update(s) failed",
                        report.failures(),
                        report.results.len()
                    );
                }

                current_status.record_sync(notification.event, &report);
                status::write_status(&status_path, &current_status);
            }

            DaemonEvent::ConfigReloaded(new_config) => {
                tracing::info!("Config reloaded");
                current_status.record_config(&new_config);
                status::write_status(&status_path, &current_status);
                config = new_config;
            }

            DaemonEvent::ConfigRejected(reason) => {
                current_status.record_config_error(reason);
                status::write_status(&status_path, &current_status);
            }

            DaemonEvent::Shutdown => {
                tracing::info!("Shutting down");
                status::write_status(&status_path, &current_status);
                break;
            }
        }
    }
}
