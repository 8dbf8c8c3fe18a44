/// Chat modes the daemon manages and the table that maps settings onto mode updates.
///
/// Each row of [`CHAT_MODES`] pairs a mode with the setting that selects its trigger
/// and a builder for the update to send.  The sync loop iterates the table; adding a
/// mode means adding a row here and an operation on [`crate::api::ModeApi`].
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::config::{ChatStateSettings, Trigger};
use crate::duration::normalize_follower_duration;
use crate::event::LifecycleEvent;

/// Stream transitions only ever switch modes on.
const ENABLE: bool = true;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChatMode {
    EmoteOnly,
    SubscriberOnly,
    UniqueChat,
    Slow,
    FollowersOnly,
}

impl ChatMode {
    /// Human-readable name used in logs and chat notices.
    pub fn label(self) -> &'static str {
        match self {
            ChatMode::EmoteOnly => "emote only mode",
            ChatMode::SubscriberOnly => "subscriber only mode",
            ChatMode::UniqueChat => "unique chat mode",
            ChatMode::Slow => "slow mode",
            ChatMode::FollowersOnly => "follower mode",
        }
    }
}

impl fmt::Display for ChatMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A single chat-settings change to request from the platform.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ModeUpdate {
    EmoteOnly { enabled: bool },
    SubscriberOnly { enabled: bool },
    UniqueChat { enabled: bool },
    Slow { enabled: bool, wait_seconds: u16 },
    /// `duration_minutes: None` leaves the follow-age requirement at the platform default.
    FollowersOnly { enabled: bool, duration_minutes: Option<u32> },
}

impl ModeUpdate {
    pub fn mode(&self) -> ChatMode {
        match self {
            ModeUpdate::EmoteOnly { .. } => ChatMode::EmoteOnly,
            ModeUpdate::SubscriberOnly { .. } => ChatMode::SubscriberOnly,
            ModeUpdate::UniqueChat { .. } => ChatMode::UniqueChat,
            ModeUpdate::Slow { .. } => ChatMode::Slow,
            ModeUpdate::FollowersOnly { .. } => ChatMode::FollowersOnly,
        }
    }
}

/// One chat mode's entry in the sync table.
pub struct ModeRow {
    pub mode: ChatMode,
    trigger: fn(&ChatStateSettings) -> Trigger,
    build: fn(&ChatStateSettings) -> ModeUpdate,
}

impl ModeRow {
    pub fn trigger(&self, settings: &ChatStateSettings) -> Trigger {
        (self.trigger)(settings)
    }

    /// The update to send for `event`, or `None` if this mode's trigger does not fire.
    pub fn update_for(
        &self,
        event: LifecycleEvent,
        settings: &ChatStateSettings,
    ) -> Option<ModeUpdate> {
        self.trigger(settings)
            .fires_on(event)
            .then(|| (self.build)(settings))
    }
}

pub const CHAT_MODES: [ModeRow; 5] = [
    ModeRow {
        mode: ChatMode::EmoteOnly,
        trigger: |s| s.emote_only,
        build: |_| ModeUpdate::EmoteOnly { enabled: ENABLE },
    },
    ModeRow {
        mode: ChatMode::SubscriberOnly,
        trigger: |s| s.subscriber_only,
        build: |_| ModeUpdate::SubscriberOnly { enabled: ENABLE },
    },
    ModeRow {
        mode: ChatMode::UniqueChat,
        trigger: |s| s.unique_chat,
        build: |_| ModeUpdate::UniqueChat { enabled: ENABLE },
    },
    ModeRow {
        mode: ChatMode::Slow,
        trigger: |s| s.slow,
        build: |s| ModeUpdate::Slow {
            enabled: ENABLE,
            wait_seconds: s.slow_seconds,
        },
    },
    ModeRow {
        mode: ChatMode::FollowersOnly,
        trigger: |s| s.followers_only,
        build: |s| ModeUpdate::FollowersOnly {
            enabled: ENABLE,
            duration_minutes: normalize_follower_duration(&s.followers_duration),
        },
    },
];
