//! Live-update channel
//!
//! Subscribes to the server's `text/event-stream` and forwards every
//! `{"type":"update"}` notice to a channel. Framing and UTF-8 decoding are
//! left to `reqwest-eventsource`. Drops are handled here: the stream is
//! reopened with a doubling, capped delay, and the rest of the system only
//! ever sees notices or silence.

use std::sync::Arc;
use std::time::Duration;

use futures_util::StreamExt;
use reqwest_eventsource::{Event, EventSource};
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use rollcall_core::ports::ChangeNotice;

use crate::client::KioskClient;

/// Why a subscription ended
enum StreamEnd {
    Cancelled,
    ReceiverGone,
    Dropped { reason: String, connected: bool },
}

/// Auto-reconnecting subscription to the server push stream
pub struct LiveUpdateChannel {
    client: Arc<KioskClient>,
    initial_delay: Duration,
    max_delay: Duration,
}

impl LiveUpdateChannel {
    pub fn new(client: Arc<KioskClient>, initial_delay: Duration, max_delay: Duration) -> Self {
        Self {
            client,
            initial_delay,
            max_delay,
        }
    }

    /// Runs until `cancel` fires or the receiver is dropped
    pub async fn run(self, notices: mpsc::Sender<ChangeNotice>, cancel: CancellationToken) {
        let mut delay = self.initial_delay;

        loop {
            let outcome = match self.client.event_source() {
                Ok(mut source) => {
                    let outcome = self.consume(&mut source, &notices, &cancel).await;
                    source.close();
                    outcome
                }
                Err(e) => StreamEnd::Dropped {
                    reason: e.to_string(),
                    connected: false,
                },
            };

            match outcome {
                StreamEnd::Cancelled => {
                    debug!("Live-update channel cancelled");
                    return;
                }
                StreamEnd::ReceiverGone => {
                    debug!("Live-update receiver dropped, stopping");
                    return;
                }
                StreamEnd::Dropped { reason, connected } => {
                    if connected {
                        delay = self.initial_delay;
                    }
                    warn!(
                        reason = %reason,
                        retry_in_ms = delay.as_millis() as u64,
                        "Live-update stream lost"
                    );
                }
            }

            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
            delay = (delay * 2).min(self.max_delay);
        }
    }

    async fn consume(
        &self,
        source: &mut EventSource,
        notices: &mpsc::Sender<ChangeNotice>,
        cancel: &CancellationToken,
    ) -> StreamEnd {
        let mut connected = false;

        loop {
            let event = tokio::select! {
                _ = cancel.cancelled() => return StreamEnd::Cancelled,
                event = source.next() => event,
            };

            let message = match event {
                Some(Ok(Event::Open)) => {
                    connected = true;
                    info!(client_id = %self.client.client_id(), "Live-update stream connected");
                    continue;
                }
                Some(Ok(Event::Message(message))) => message,
                Some(Err(e)) => {
                    return StreamEnd::Dropped {
                        reason: e.to_string(),
                        connected,
                    }
                }
                None => {
                    return StreamEnd::Dropped {
                        reason: "stream closed".to_string(),
                        connected,
                    }
                }
            };

            match serde_json::from_str::<ChangeNotice>(&message.data) {
                Ok(notice) if notice.is_update() => {
                    debug!(message = ?notice.message, "Received update notice");
                    if notices.send(notice).await.is_err() {
                        return StreamEnd::ReceiverGone;
                    }
                }
                Ok(notice) => {
                    debug!(event_type = %notice.event_type, "Ignoring push event");
                }
                Err(e) => {
                    warn!(error = %e, payload = %message.data, "Unparseable push event");
                }
            }
        }
    }
}
