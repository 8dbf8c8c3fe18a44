use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::config::Config;
use crate::event::LifecycleEvent;
use crate::modes::ChatMode;
use crate::sync::{SyncOutcome, SyncReport};

/// Last known state of the watched stream.
#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "lowercase")]
pub enum StreamState {
    /// No stream notification has been received since startup.
    Unknown,
    Live,
    Offline,
}

impl From<LifecycleEvent> for StreamState {
    fn from(event: LifecycleEvent) -> Self {
        match event {
            LifecycleEvent::StreamStarted => StreamState::Live,
            LifecycleEvent::StreamStopped => StreamState::Offline,
        }
    }
}

#[derive(Debug, Serialize, Deserialize, PartialEq, Clone)]
#[serde(rename_all = "lowercase")]
pub enum ModeOutcome {
    Applied,
    Unauthorized,
    Failed,
}

/// Result of one chat-mode update from the most recent sync.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ModeStatus {
    pub mode: ChatMode,
    pub outcome: ModeOutcome,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

/// Runtime status written by the daemon to `<data dir>/status.toml`.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DaemonStatus {
    /// Daemon binary version (set from Cargo.toml at compile time).
    pub version: String,
    pub stream: StreamState,
    /// Whether a bot session is configured; without one no mode can be changed.
    pub session_configured: bool,
    /// RFC 3339 timestamp of the most recent sync, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_sync: Option<String>,
    /// Human-readable summary of the most recent problem, if any.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Why the config file on disk is not in effect, if it was rejected.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub config_error: Option<String>,
    /// Chat notices sent during the most recent sync.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub notices: Vec<String>,
    /// Modes touched by the most recent sync.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub modes: Vec<ModeStatus>,
}

impl DaemonStatus {
    /// Constructs the initial status on daemon startup.
    pub fn new(session_configured: bool) -> Self {
        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            stream: StreamState::Unknown,
            session_configured,
            last_sync: None,
            error: None,
            config_error: None,
            notices: Vec::new(),
            modes: Vec::new(),
        }
    }

    /// Notes that `config` is now the active configuration.
    pub fn record_config(&mut self, config: &Config) {
        self.session_configured = config.session.is_some();
        self.config_error = None;
    }

    /// Notes that the config file was rejected; the active settings are unchanged.
    pub fn record_config_error(&mut self, reason: impl Into<String>) {
        self.config_error = Some(reason.into());
    }

    /// Replaces the previous sync results with those of `report`.
    pub fn record_sync(&mut self, event: LifecycleEvent, report: &SyncReport) {
        self.stream = event.into();
        self.last_sync = Some(chrono::Local::now().to_rfc3339());
        self.notices = report.notices.clone();
        self.modes = report
            .results
            .iter()
            .map(|r| {
                let (outcome, detail) = match &r.outcome {
                    SyncOutcome::Applied => (ModeOutcome::Applied, None),
                    SyncOutcome::Unauthorized(d) => (ModeOutcome::Unauthorized, Some(d.clone())),
                    SyncOutcome::Failed(d) => (ModeOutcome::Failed, Some(d.clone())),
                };
                ModeStatus {
                    mode: r.mode,
                    outcome,
                    detail,
                }
            })
            .collect();

        let failures = report.failures();
        self.error = if report.missing_context {
            Some("No bot session configured; chat states were not applied".to_string())
        } else if failures > 0 {
            Some(format!("{failures} chat mode update(s) failed"))
        } else {
            None
        };
    }
}

/// Writes `status` to `path` as TOML, creating the parent directory if needed.
/// A failed write is logged and otherwise ignored.
pub fn write_status(path: &Path, status: &DaemonStatus) {
    if let Err(e) = try_write_status(path, status) {
        tracing::error!("Failed to write status: {e:#}");
    }
}

/// Writes to a sibling temp file and renames it over `path`, so readers never see
/// a half-written status.
fn try_write_status(path: &Path, status: &DaemonStatus) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    let content = toml::to_string_pretty(status).context("Failed to serialize status")?;
    let tmp = path.with_extension("toml.tmp");
    std::fs::write(&tmp, content)
        .with_context(|| format!("Failed to write {}", tmp.display()))?;
    std::fs::rename(&tmp, path)
        .with_context(|| format!("Failed to replace status file {}", path.display()))?;
    Ok(())
}
