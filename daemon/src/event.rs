use crate::config::Config;
use crate::stream_events::StreamNotification;

/// A stream transition reported by the platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleEvent {
    StreamStarted,
    StreamStopped,
}

pub enum DaemonEvent {
    /// The watched channel went online or offline.
    Stream(StreamNotification),
    /// The config file changed on disk and was successfully re-parsed.
    ConfigReloaded(Config),
    /// The config file changed on disk but could not be loaded; carries the reason.
    ConfigRejected(String),
    /// Ctrl+C received; the daemon should write its final status and exit.
    Shutdown,
}
