/// Reads stream online/offline notifications and forwards them to the event loop.
///
/// The host bot relays its EventSub notifications as newline-delimited JSON, one
/// message per line:
///
/// ```text
/// {"subscription":{"type":"stream.online"},"event":{"broadcaster_user_id":"1337"}}
/// ```
///
/// Only `stream.online` and `stream.offline` are acted on; any other subscription
/// type is ignored.
use serde::Deserialize;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;

use crate::config::Session;
use crate::event::{DaemonEvent, LifecycleEvent};

#[derive(Debug, Deserialize)]
struct Envelope {
    subscription: Subscription,
    #[serde(default)]
    event: Option<StreamEventBody>,
}

#[derive(Debug, Deserialize)]
struct Subscription {
    #[serde(rename = "type")]
    kind: String,
}

#[derive(Debug, Deserialize)]
struct StreamEventBody {
    #[serde(default)]
    broadcaster_user_id: Option<String>,
}

/// A stream transition for a specific channel.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamNotification {
    pub event: LifecycleEvent,
    pub broadcaster_id: Option<String>,
}

impl StreamNotification {
    /// Whether this notification is about the configured channel.
    ///
    /// Without a session every notification is accepted; the sync step then
    /// reports the missing context.  A notification that names no broadcaster is
    /// assumed to be for ours.
    pub fn concerns(&self, session: Option<&Session>) -> bool {
        match (session, &self.broadcaster_id) {
            (Some(session), Some(id)) => *id == session.broadcaster_id,
            _ => true,
        }
    }
}

/// Parses one notification line.
///
/// Returns `Ok(None)` for blank lines and subscription types other than
/// `stream.online` / `stream.offline`.
pub fn parse_line(line: &str) -> Result<Option<StreamNotification>, serde_json::Error> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }
    let envelope: Envelope = serde_json::from_str(line)?;
    let event = match envelope.subscription.kind.as_str() {
        "stream.online" => LifecycleEvent::StreamStarted,
        "stream.offline" => LifecycleEvent::StreamStopped,
        other => {
            tracing::debug!("Ignoring notification of type {other}");
            return Ok(None);
        }
    };
    Ok(Some(StreamNotification {
        event,
        broadcaster_id: envelope.event.and_then(|e| e.broadcaster_user_id),
    }))
}

/// Reads notifications from `reader` until end of input and forwards stream
/// transitions as [`DaemonEvent::Stream`].
///
/// Malformed lines are logged and skipped.  End of input ends this task only;
/// the daemon keeps running so config reloads and Ctrl+C still work.
pub async fn run<R>(reader: R, tx: mpsc::Sender<DaemonEvent>)
where
    R: AsyncBufRead + Unpin,
{
    let mut lines = reader.lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => {
                tracing::info!("Notification input closed");
                break;
            }
            Err(e) => {
                tracing::error!("Failed to read notification input: {e}");
                break;
            }
        };

        match parse_line(&line) {
            Ok(Some(notification)) => {
                tracing::debug!(?notification, "Stream notification received");
                if tx.send(DaemonEvent::Stream(notification)).await.is_err() {
                    break;
                }
            }
            Ok(None) => {}
            Err(e) => tracing::warn!("Skipping malformed notification {line:?}: {e}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::BotAuth;

    fn session(broadcaster_id: &str) -> Session {
        Session {
            broadcaster_id: broadcaster_id.to_string(),
            bot_id: "4242".to_string(),
            auth: BotAuth::new("token"),
        }
    }

    // ── parse_line ────────────────────────────────────────────────────────────

    #[test]
    fn parses_online_and_offline() {
        let online = parse_line(
            r#"{"subscription":{"type":"stream.online"},"event":{"broadcaster_user_id":"1337","type":"live"}}"#,
        )
        .unwrap()
        .unwrap();
        assert_eq!(online.event, LifecycleEvent::StreamStarted);
        assert_eq!(online.broadcaster_id.as_deref(), Some("1337"));

        let offline = parse_line(r#"{"subscription":{"type":"stream.offline"}}"#)
            .unwrap()
            .unwrap();
        assert_eq!(offline.event, LifecycleEvent::StreamStopped);
        assert!(offline.broadcaster_id.is_none());
    }

    #[test]
    fn ignores_other_types_and_blank_lines() {
        assert_eq!(
            parse_line(r#"{"subscription":{"type":"channel.follow"},"event":{}}"#).unwrap(),
            None
        );
        assert_eq!(parse_line("   ").unwrap(), None);
    }

    #[test]
    fn malformed_lines_are_errors() {
        assert!(parse_line("stream.online").is_err());
        assert!(parse_line(r#"{"event":{}}"#).is_err());
    }

    // ── concerns ──────────────────────────────────────────────────────────────

    #[test]
    fn concerns_matches_broadcaster() {
        let n = StreamNotification {
            event: LifecycleEvent::StreamStarted,
            broadcaster_id: Some("1337".to_string()),
        };
        assert!(n.concerns(Some(&session("1337"))));
        assert!(!n.concerns(Some(&session("9001"))));
        assert!(n.concerns(None));
    }

    #[test]
    fn concerns_accepts_anonymous_notifications() {
        let n = StreamNotification {
            event: LifecycleEvent::StreamStopped,
            broadcaster_id: None,
        };
        assert!(n.concerns(Some(&session("1337"))));
    }

    // ── run ───────────────────────────────────────────────────────────────────

    #[tokio::test]
    async fn run_forwards_stream_events_and_skips_the_rest() {
        let input = concat!(
            r#"{"subscription":{"type":"stream.online"},"event":{"broadcaster_user_id":"1"}}"#,
            "\n",
            "not json\n",
            "\n",
            r#"{"subscription":{"type":"channel.raid"},"event":{}}"#,
            "\n",
            r#"{"subscription":{"type":"stream.offline"},"event":{"broadcaster_user_id":"1"}}"#,
            "\n",
        );
        let (tx, mut rx) = mpsc::channel(8);
        run(input.as_bytes(), tx).await;

        let mut events = Vec::new();
        while let Some(evt) = rx.recv().await {
            match evt {
                DaemonEvent::Stream(n) => events.push(n.event),
                _ => panic!("unexpected daemon event"),
            }
        }
        assert_eq!(
            events,
            [LifecycleEvent::StreamStarted, LifecycleEvent::StreamStopped]
        );
    }
}
