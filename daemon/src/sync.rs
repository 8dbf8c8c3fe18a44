/// Applies the configured default chat states when the stream goes online or offline.
///
/// [`ModeSync::handle`] walks [`CHAT_MODES`] once per event.  Every mode is handled
/// on its own: a failed update is logged (and, for credential failures, announced
/// in chat) and the next mode is still attempted.  Nothing is returned as an error;
/// the caller gets a [`SyncReport`] describing what happened.
use std::sync::Arc;

use crate::api::{send_update, ModeApi, ModeApiError, Notifier};
use crate::config::{ChatStateSettings, Session};
use crate::event::LifecycleEvent;
use crate::modes::{ChatMode, CHAT_MODES};

/// How a single mode update ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncOutcome {
    Applied,
    Unauthorized(String),
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModeResult {
    pub mode: ChatMode,
    pub outcome: SyncOutcome,
}

/// Everything one lifecycle event caused.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SyncReport {
    /// No bot/session was available, so no mode was attempted.
    pub missing_context: bool,
    /// One entry per mode whose trigger fired, in table order.
    pub results: Vec<ModeResult>,
    /// Chat notices sent while handling the event.
    pub notices: Vec<String>,
}

impl SyncReport {
    pub fn failures(&self) -> usize {
        self.results
            .iter()
            .filter(|r| r.outcome != SyncOutcome::Applied)
            .count()
    }
}

/// Chat notice asking the streamer to re-authorize the bot for `mode`.
pub fn reauth_notice(mode: ChatMode) -> String {
    format!("Error: The bot must be re-authed in order to update {mode}.")
}

pub struct ModeSync {
    api: Arc<dyn ModeApi>,
    notifier: Arc<dyn Notifier>,
}

impl ModeSync {
    pub fn new(api: Arc<dyn ModeApi>, notifier: Arc<dyn Notifier>) -> Self {
        Self { api, notifier }
    }

    /// Enables every mode whose trigger matches `event`.
    pub async fn handle(
        &self,
        event: LifecycleEvent,
        settings: &ChatStateSettings,
        session: Option<&Session>,
    ) -> SyncReport {
        let mut report = SyncReport::default();

        let Some(session) = session else {
            tracing::warn!("Cannot apply chat states on {event:?}: no bot session is configured");
            report.missing_context = true;
            return report;
        };

        for row in &CHAT_MODES {
            let Some(update) = row.update_for(event, settings) else {
                continue;
            };
            let mode = row.mode;

            let outcome = match send_update(self.api.as_ref(), session, &update).await {
                Ok(()) => {
                    tracing::debug!("Updated {mode} on {event:?}");
                    SyncOutcome::Applied
                }
                Err(ModeApiError::Unauthorized(detail)) => {
                    tracing::error!("Failed to update {mode}, unauthorized: {detail}");
                    let notice = reauth_notice(mode);
                    if let Err(e) = self.notifier.send_message(&notice).await {
                        tracing::error!("Failed to send re-auth notice for {mode}: {e:#}");
                    }
                    report.notices.push(notice);
                    SyncOutcome::Unauthorized(detail)
                }
                Err(ModeApiError::Failed(detail)) => {
                    tracing::error!("Failed to update {mode}: {detail}");
                    SyncOutcome::Failed(detail)
                }
            };
            report.results.push(ModeResult { mode, outcome });
        }

        report
    }
}
