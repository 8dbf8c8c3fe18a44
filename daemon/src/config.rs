use anyhow::{bail, Context, Result};
use notify::{Config as NotifyConfig, RecommendedWatcher, RecursiveMode, Watcher};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use tokio::sync::mpsc;

use crate::event::{DaemonEvent, LifecycleEvent};

pub const MIN_SLOW_SECONDS: u16 = 1;
pub const MAX_SLOW_SECONDS: u16 = 1800;
pub const DEFAULT_SLOW_SECONDS: u16 = 30;

/// Root configuration structure. Deserialized from `<data dir>/config.toml`.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    /// Bot/session context. Without it, stream events are acknowledged but no
    /// chat mode is touched.
    #[serde(default)]
    pub session: Option<Session>,
    #[serde(default)]
    pub chat_states: ChatStateSettings,
}

/// Which stream transition, if any, enables a chat mode.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Trigger {
    #[serde(alias = "Goes Online")]
    Online,
    #[serde(alias = "Goes Offline")]
    Offline,
    #[default]
    #[serde(alias = "Never")]
    Never,
}

impl Trigger {
    /// Returns true when this trigger selects `event`.
    pub fn fires_on(self, event: LifecycleEvent) -> bool {
        matches!(
            (self, event),
            (Trigger::Online, LifecycleEvent::StreamStarted)
                | (Trigger::Offline, LifecycleEvent::StreamStopped)
        )
    }
}

/// Per-mode triggers plus the parameters used when slow or followers-only mode fires.
///
/// The aliases accept the setting keys of the original bot module so existing
/// settings exports can be pasted in unchanged.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct ChatStateSettings {
    #[serde(default, alias = "emoteonly")]
    pub emote_only: Trigger,
    #[serde(default, alias = "subonly")]
    pub subscriber_only: Trigger,
    #[serde(default, alias = "r9k")]
    pub unique_chat: Trigger,
    #[serde(default, alias = "slow_option")]
    pub slow: Trigger,
    /// Seconds a chatter must wait between messages. Must be within [1, 1800].
    #[serde(default = "default_slow_seconds", alias = "slow_time")]
    pub slow_seconds: u16,
    #[serde(default, alias = "followersonly_option")]
    pub followers_only: Trigger,
    /// Free-form minimum follow age, e.g. "30m" or "1 week". Empty uses the platform default.
    #[serde(default, alias = "followersonly_time")]
    pub followers_duration: String,
}

impl Default for ChatStateSettings {
    fn default() -> Self {
        Self {
            emote_only: Trigger::Never,
            subscriber_only: Trigger::Never,
            unique_chat: Trigger::Never,
            slow: Trigger::Never,
            slow_seconds: DEFAULT_SLOW_SECONDS,
            followers_only: Trigger::Never,
            followers_duration: String::new(),
        }
    }
}

/// The streamer's channel and the bot account acting on it.
#[derive(Debug, Deserialize, Clone, PartialEq)]
pub struct Session {
    pub broadcaster_id: String,
    pub bot_id: String,
    #[serde(rename = "access_token")]
    pub auth: BotAuth,
}

/// The bot's stored authorization. Never printed.
#[derive(Deserialize, Clone, PartialEq)]
#[serde(transparent)]
pub struct BotAuth(String);

impl BotAuth {
    #[cfg(test)]
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn token(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for BotAuth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BotAuth(<redacted>)")
    }
}

impl Config {
    /// Rejects values the platform would refuse.
    pub fn validate(&self) -> Result<()> {
        let slow = self.chat_states.slow_seconds;
        if !(MIN_SLOW_SECONDS..=MAX_SLOW_SECONDS).contains(&slow) {
            bail!(
                "slow_seconds must be between {MIN_SLOW_SECONDS} and {MAX_SLOW_SECONDS}, got {slow}"
            );
        }
        if let Some(session) = &self.session {
            if session.broadcaster_id.trim().is_empty() {
                bail!("session.broadcaster_id must not be empty");
            }
            if session.bot_id.trim().is_empty() {
                bail!("session.bot_id must not be empty");
            }
        }
        Ok(())
    }
}

/// Loads the config file at `path`, returning `Config::default()` if the file does not exist.
/// Returns an error if the file exists but cannot be read, parsed, or validated.
pub fn load_or_default(path: &Path) -> Result<Config> {
    if !path.exists() {
        return Ok(Config::default());
    }
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;
    let config: Config = toml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))?;
    config
        .validate()
        .with_context(|| format!("Invalid config file: {}", path.display()))?;
    Ok(config)
}

/// Watches the directory holding `path` and reports every change to the config file
/// as [`DaemonEvent::ConfigReloaded`] or, when the new file is unusable,
/// [`DaemonEvent::ConfigRejected`].  The previous settings stay active on rejection.
pub async fn watch_config(path: PathBuf, tx: mpsc::Sender<DaemonEvent>) {
    // Editors save by write + rename, so the file itself cannot be watched.
    let Some(watch_dir) = path.parent().map(Path::to_path_buf) else {
        tracing::error!("Config path {} has no parent directory", path.display());
        return;
    };

    let (fs_tx, mut fs_rx) = mpsc::channel::<notify::Event>(16);
    let watcher = RecommendedWatcher::new(
        move |res: notify::Result<notify::Event>| match res {
            Ok(event) => {
                let _ = fs_tx.blocking_send(event);
            }
            Err(e) => tracing::warn!("Config watcher error: {e}"),
        },
        NotifyConfig::default(),
    )
    .and_then(|mut w| w.watch(&watch_dir, RecursiveMode::NonRecursive).map(|()| w));
    // Dropping the watcher stops the notifications, so keep it bound for the loop.
    let _watcher = match watcher {
        Ok(w) => w,
        Err(e) => {
            tracing::error!("Config hot reload disabled for {}: {e}", watch_dir.display());
            return;
        }
    };

    while let Some(event) = fs_rx.recv().await {
        if !touches_config(&event, &path) {
            continue;
        }
        if tx.send(reload_event(&path)).await.is_err() {
            break;
        }
    }
}

fn touches_config(event: &notify::Event, path: &Path) -> bool {
    matches!(
        event.kind,
        notify::EventKind::Create(_) | notify::EventKind::Modify(_)
    ) && event.paths.iter().any(|p| p == path)
}

/// Re-reads the config file and turns the outcome into the event the daemon loop consumes.
fn reload_event(path: &Path) -> DaemonEvent {
    match load_or_default(path) {
        Ok(config) => DaemonEvent::ConfigReloaded(config),
        Err(e) => {
            let reason = format!("{e:#}");
            tracing::error!("Failed to reload config, keeping previous settings: {reason}");
            DaemonEvent::ConfigRejected(reason)
        }
    }
}

fn default_slow_seconds() -> u16 {
    DEFAULT_SLOW_SECONDS
}
