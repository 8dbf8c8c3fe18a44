/// Seams to the streaming platform: the chat-settings API and the chat notifier.
///
/// The platform HTTP client lives outside this daemon.  What the daemon needs from
/// it is captured by [`ModeApi`]; an implementation classifies its own failures
/// into [`ModeApiError`] so callers never inspect status codes.
use async_trait::async_trait;
use thiserror::Error;

use crate::config::Session;
use crate::modes::ModeUpdate;

// Constructed by platform clients; the dry-run client never fails.
#[allow(dead_code)]
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModeApiError {
    /// The bot's credentials were rejected (expired, revoked or missing scope).
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("{0}")]
    Failed(String),
}

pub type ModeApiResult = std::result::Result<(), ModeApiError>;

/// Chat-settings operations, each acting on `session.broadcaster_id`'s channel as
/// `session.bot_id` using `session.auth`.
#[async_trait]
pub trait ModeApi: Send + Sync {
    async fn set_emote_only(&self, session: &Session, enabled: bool) -> ModeApiResult;

    async fn set_subscriber_only(&self, session: &Session, enabled: bool) -> ModeApiResult;

    async fn set_unique_chat(&self, session: &Session, enabled: bool) -> ModeApiResult;

    /// `wait_seconds` is within [1, 1800].
    async fn set_slow(&self, session: &Session, enabled: bool, wait_seconds: u16)
        -> ModeApiResult;

    /// `duration_minutes` is within [0, 129600]; `None` keeps the platform default.
    async fn set_followers_only(
        &self,
        session: &Session,
        enabled: bool,
        duration_minutes: Option<u32>,
    ) -> ModeApiResult;
}

/// Sends `update` through the matching [`ModeApi`] operation.
pub async fn send_update(
    api: &dyn ModeApi,
    session: &Session,
    update: &ModeUpdate,
) -> ModeApiResult {
    tracing::trace!(mode = %update.mode(), "Sending {update:?}");
    match *update {
        ModeUpdate::EmoteOnly { enabled } => api.set_emote_only(session, enabled).await,
        ModeUpdate::SubscriberOnly { enabled } => api.set_subscriber_only(session, enabled).await,
        ModeUpdate::UniqueChat { enabled } => api.set_unique_chat(session, enabled).await,
        ModeUpdate::Slow {
            enabled,
            wait_seconds,
        } => api.set_slow(session, enabled, wait_seconds).await,
        ModeUpdate::FollowersOnly {
            enabled,
            duration_minutes,
        } => {
            api.set_followers_only(session, enabled, duration_minutes)
                .await
        }
    }
}

/// Posts a message in the streamer's chat.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send_message(&self, text: &str) -> anyhow::Result<()>;
}

/// [`ModeApi`] that logs each request and reports success without contacting the platform.
///
/// Used by the daemon when no platform client is wired in; the log shows exactly
/// which settings a stream transition would apply.
#[derive(Debug, Default)]
pub struct DryRunModeApi;

impl DryRunModeApi {
    fn log(session: &Session, what: &str, enabled: bool) -> ModeApiResult {
        tracing::info!(
            broadcaster = %session.broadcaster_id,
            moderator = %session.bot_id,
            authorized = !session.auth.token().is_empty(),
            "[dry-run] set {what} enabled={enabled}"
        );
        Ok(())
    }
}

#[async_trait]
impl ModeApi for DryRunModeApi {
    async fn set_emote_only(&self, session: &Session, enabled: bool) -> ModeApiResult {
        Self::log(session, "emote only mode", enabled)
    }

    async fn set_subscriber_only(&self, session: &Session, enabled: bool) -> ModeApiResult {
        Self::log(session, "subscriber only mode", enabled)
    }

    async fn set_unique_chat(&self, session: &Session, enabled: bool) -> ModeApiResult {
        Self::log(session, "unique chat mode", enabled)
    }

    async fn set_slow(
        &self,
        session: &Session,
        enabled: bool,
        wait_seconds: u16,
    ) -> ModeApiResult {
        Self::log(session, &format!("slow mode ({wait_seconds}s)"), enabled)
    }

    async fn set_followers_only(
        &self,
        session: &Session,
        enabled: bool,
        duration_minutes: Option<u32>,
    ) -> ModeApiResult {
        let what = match duration_minutes {
            Some(minutes) => format!("follower mode ({minutes}m)"),
            None => "follower mode (platform default)".to_string(),
        };
        Self::log(session, &what, enabled)
    }
}

/// [`Notifier`] that writes chat notices to the log.
#[derive(Debug, Default)]
pub struct LogNotifier;

#[async_trait]
impl Notifier for LogNotifier {
    async fn send_message(&self, text: &str) -> anyhow::Result<()> {
        tracing::warn!("[chat] {text}");
        Ok(())
    }
}
