use std::sync::Arc;

use anyhow::{Result, bail};
use futures_util::{SinkExt as _, StreamExt as _};
use serde::Deserialize;
use serde_json::Value;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::Message as WsMessage;
use tracing::{debug, error, info, warn};

use handler_core::{JoinEvent, MessageEvent, RetryPolicy};

use super::api::SlackApi;

/// Something the dispatcher cares about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum InboundEvent {
    Message(MessageEvent),
    Join(JoinEvent),
}

/// One Socket Mode frame, decoded.
#[derive(Debug, PartialEq, Eq)]
pub(crate) enum Frame {
    Hello,
    Disconnect(String),
    /// Must be acknowledged whether or not it carries an event we handle.
    Envelope {
        envelope_id: String,
        event: Option<InboundEvent>,
    },
    Ignored,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    envelope_id: String,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    payload: Value,
}

#[derive(Debug, Deserialize)]
struct JoinedUser {
    id: String,
    #[serde(default)]
    name: String,
}

pub(crate) fn parse_frame(text: &str) -> Frame {
    let Ok(value) = serde_json::from_str::<Value>(text) else {
        debug!("Ignoring non-JSON frame");
        return Frame::Ignored;
    };
    match value["type"].as_str() {
        Some("hello") => return Frame::Hello,
        Some("disconnect") => {
            let reason = value["reason"].as_str().unwrap_or("unknown");
            return Frame::Disconnect(reason.to_owned());
        }
        _ => {}
    }
    let envelope: Envelope = match serde_json::from_value(value) {
        Ok(envelope) => envelope,
        Err(e) => {
            debug!(error = %e, "Ignoring frame without envelope");
            return Frame::Ignored;
        }
    };
    let event = if envelope.kind == "events_api" {
        parse_event(&envelope.payload["event"])
    } else {
        debug!(kind = %envelope.kind, "Ignoring envelope type");
        None
    };
    Frame::Envelope {
        envelope_id: envelope.envelope_id,
        event,
    }
}

fn parse_event(event: &Value) -> Option<InboundEvent> {
    let kind = event["type"].as_str()?;
    let parsed = match kind {
        "message" => MessageEvent::deserialize(event).map(InboundEvent::Message),
        "team_join" => JoinedUser::deserialize(&event["user"]).map(|user| {
            InboundEvent::Join(JoinEvent {
                user_id: user.id,
                user_name: user.name,
            })
        }),
        _ => {
            debug!(kind, "Ignoring event type");
            return None;
        }
    };
    parsed
        .map_err(|e| warn!(error = %e, kind, "Malformed event"))
        .ok()
}

fn ack(envelope_id: &str) -> String {
    serde_json::json!({ "envelope_id": envelope_id }).to_string()
}

/// Reads Socket Mode events and forwards them, reconnecting when Slack
/// drops the connection.
#[derive(Debug)]
pub(crate) struct SocketMode {
    api: Arc<SlackApi>,
    events: mpsc::Sender<InboundEvent>,
    policy: RetryPolicy,
}

impl SocketMode {
    pub(crate) const fn new(
        api: Arc<SlackApi>,
        events: mpsc::Sender<InboundEvent>,
        policy: RetryPolicy,
    ) -> Self {
        Self {
            api,
            events,
            policy,
        }
    }

    /// Runs until the receiving side goes away or reconnecting keeps failing.
    pub(crate) async fn run(self) -> Result<()> {
        let mut attempts = 0_u32;
        loop {
            if self.policy.exhausted(attempts) {
                bail!("giving up after {attempts} Socket Mode connection attempts");
            }
            if attempts > 0 {
                let delay = self.policy.backoff(attempts);
                info!(attempt = attempts, ?delay, "Reconnecting to Socket Mode");
                tokio::time::sleep(delay).await;
            }

            let url = match self.api.open_connection().await {
                Ok(url) => url,
                Err(e) => {
                    error!(error = %e, "Could not get Socket Mode URL");
                    attempts += 1;
                    continue;
                }
            };
            let mut ws = match tokio_tungstenite::connect_async(url.as_str()).await {
                Ok((ws, _)) => ws,
                Err(e) => {
                    error!(error = %e, "Socket Mode connect failed");
                    attempts += 1;
                    continue;
                }
            };
            info!("Connected to Socket Mode");
            attempts = 0;

            while let Some(next) = ws.next().await {
                let text = match next {
                    Ok(WsMessage::Text(text)) => text,
                    Ok(WsMessage::Close(_)) => {
                        info!("Socket Mode connection closed");
                        break;
                    }
                    Ok(
                        WsMessage::Binary(_)
                        | WsMessage::Ping(_)
                        | WsMessage::Pong(_)
                        | WsMessage::Frame(_),
                    ) => continue,
                    Err(e) => {
                        warn!(error = %e, "Socket Mode read failed");
                        break;
                    }
                };

                match parse_frame(&text) {
                    Frame::Hello => debug!("Socket Mode hello"),
                    Frame::Disconnect(reason) => {
                        info!(reason = %reason, "Slack asked to reconnect");
                        break;
                    }
                    Frame::Envelope { envelope_id, event } => {
                        if let Err(e) = ws.send(WsMessage::Text(ack(&envelope_id))).await {
                            warn!(error = %e, envelope = %envelope_id, "Could not acknowledge envelope");
                        }
                        if let Some(event) = event
                            && self.events.send(event).await.is_err()
                        {
                            info!("Event receiver dropped, stopping Socket Mode");
                            return Ok(());
                        }
                    }
                    Frame::Ignored => {}
                }
            }
            attempts += 1;
        }
    }
}
