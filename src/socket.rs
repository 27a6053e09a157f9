//! Live push channel lifecycle.
//!
//! A supervisor task owns the connection: it dials, routes inbound frames,
//! and cycles the socket once its forced lifetime elapses. The cycle is
//! timer-based, not event-based: if the server hangs up early the
//! supervisor waits out the remainder of the window before redialing.

use std::sync::{Arc, Mutex, MutexGuard};

use futures_util::{SinkExt, StreamExt};
use tokio::sync::watch;
use tokio::time::sleep;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, warn};

use crate::config::ClientConfig;
use crate::types::{NewNotificationsPayload, ROUTE_NEW_NOTIFICATIONS};

/// Maintains at most one live push channel for a session.
///
/// Policy for repeated opens: `connect()` on an already-open channel
/// closes the prior connection first, so a configuration never holds two
/// sockets. `disconnect()` also cancels the pending forced reconnect, so
/// teardown leaves nothing scheduled behind.
pub struct PushChannel {
    config: Arc<ClientConfig>,
    live: Mutex<Option<LiveChannel>>,
}

struct LiveChannel {
    shutdown: watch::Sender<bool>,
    supervisor: tokio::task::JoinHandle<()>,
}

impl PushChannel {
    pub fn new(config: Arc<ClientConfig>) -> Self {
        Self {
            config,
            live: Mutex::new(None),
        }
    }

    /// Socket URL with the session identity as query parameters.
    pub fn socket_url(&self) -> String {
        let host = &self.config.socket_host;
        // Local hosts get plain ws so in-process fixtures work.
        let scheme = if crate::config::is_local_host(host) {
            "ws"
        } else {
            "wss"
        };
        let mut url = format!(
            "{scheme}://{host}?userId={}&envId={}",
            urlencoding::encode(&self.config.user_id),
            urlencoding::encode(&self.config.client_id),
        );
        if let Some(hash) = &self.config.user_id_hash {
            url.push_str("&userIdHash=");
            url.push_str(&urlencoding::encode(hash));
        }
        url
    }

    /// Opens the channel and returns immediately; the handshake completes
    /// inside the spawned supervisor. Any prior connection is closed first.
    pub fn connect(&self) {
        self.disconnect();
        let (shutdown, shutdown_rx) = watch::channel(false);
        let supervisor = tokio::spawn(run_channel(
            self.config.clone(),
            self.socket_url(),
            shutdown_rx,
        ));
        *self.live_slot() = Some(LiveChannel {
            shutdown,
            supervisor,
        });
    }

    /// Closes the channel if one is open and cancels the pending forced
    /// reconnect. No-op when already closed.
    pub fn disconnect(&self) {
        if let Some(live) = self.live_slot().take() {
            let _ = live.shutdown.send(true);
            drop(live.supervisor);
        }
    }

    /// Whether a supervisor currently owns a connection cycle. The dial
    /// itself may still be in flight.
    pub fn is_live(&self) -> bool {
        self.live_slot()
            .as_ref()
            .map(|live| !live.supervisor.is_finished())
            .unwrap_or(false)
    }

    fn live_slot(&self) -> MutexGuard<'_, Option<LiveChannel>> {
        self.live.lock().unwrap_or_else(|err| err.into_inner())
    }
}

impl Drop for PushChannel {
    fn drop(&mut self) {
        self.disconnect();
    }
}

async fn run_channel(
    config: Arc<ClientConfig>,
    url: String,
    mut shutdown: watch::Receiver<bool>,
) {
    loop {
        let dial = connect_async(url.as_str());
        let stream = tokio::select! {
            _ = shutdown.changed() => return,
            dialed = dial => match dialed {
                Ok((stream, _)) => stream,
                Err(err) => {
                    // No retry policy here; redialing is the caller's call.
                    warn!(target: "inapp.socket", error = %err, "socket dial failed");
                    return;
                }
            },
        };
        debug!(target: "inapp.socket", "channel open");

        let (mut sink, mut inbound) = stream.split();
        let lifetime = sleep(config.socket_lifetime);
        tokio::pin!(lifetime);

        // Reads frames until shutdown, the lifetime timer, or stream end.
        let stream_alive = loop {
            tokio::select! {
                _ = shutdown.changed() => {
                    let _ = sink.close().await;
                    return;
                }
                _ = &mut lifetime => {
                    let _ = sink.close().await;
                    break false;
                }
                frame = inbound.next() => match frame {
                    Some(Ok(Message::Text(text))) => dispatch_frame(&config, &text),
                    Some(Ok(Message::Close(_))) | None => break true,
                    Some(Ok(_)) => {}
                    Some(Err(err)) => {
                        warn!(target: "inapp.socket", error = %err, "socket stream error");
                        break true;
                    }
                },
            }
        };

        if stream_alive {
            // Server went away before the window closed; the timer still
            // owns the redial.
            tokio::select! {
                _ = shutdown.changed() => return,
                _ = &mut lifetime => {}
            }
        }
        debug!(target: "inapp.socket", "channel lifetime reached, reconnecting");
    }
}

/// Parses one inbound frame and dispatches recognized routes.
///
/// Frames that are not JSON or carry no `route` are ignored without
/// surfacing anything; unknown routes must never crash the client.
fn dispatch_frame(config: &ClientConfig, raw: &str) {
    let Ok(frame) = serde_json::from_str::<serde_json::Value>(raw) else {
        return;
    };
    let Some(route) = frame.get("route").and_then(|route| route.as_str()) else {
        return;
    };
    if route != ROUTE_NEW_NOTIFICATIONS {
        debug!(target: "inapp.socket", route, "ignoring unrecognized route");
        return;
    }
    let payload = frame.get("payload").cloned().unwrap_or_default();
    let Ok(payload) = serde_json::from_value::<NewNotificationsPayload>(payload) else {
        return;
    };
    if let Some(handler) = &config.on_new_notifications {
        handler(payload.notifications);
    }
}
