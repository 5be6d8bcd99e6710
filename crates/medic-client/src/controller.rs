use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_tungstenite::connect_async;
use tokio_tungstenite::tungstenite::Message;
use tracing::{debug, info, warn};

use medic_types::api::RetrieveCodeResponse;
use medic_types::events::{GatewayCommand, GatewayEvent};

use crate::state::RevealState;

/// How often the controller re-checks code availability on its own.
pub const POLL_INTERVAL: Duration = Duration::from_secs(30);

/// Brief pause between receiving a code and showing it, so the reveal
/// animation has a frame to start from.
pub const REVEAL_DELAY: Duration = Duration::from_millis(100);

/// Pause before retrying a failed gateway connection.
const RECONNECT_DELAY: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Base URL of the HTTP API, e.g. `http://localhost:3000`.
    pub base_url: String,
    /// WebSocket URL of the gateway, e.g. `ws://localhost:3000/gateway`.
    pub gateway_url: String,
    /// Bearer token identifying this user.
    pub token: String,
    pub poll_interval: Duration,
    pub reveal_delay: Duration,
}

impl ControllerConfig {
    pub fn new(base_url: impl Into<String>, gateway_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            gateway_url: gateway_url.into(),
            token: token.into(),
            poll_interval: POLL_INTERVAL,
            reveal_delay: REVEAL_DELAY,
        }
    }
}

/// Drives the reveal state machine from two triggers: a fixed-interval poll
/// and gateway wake-ups. Both funnel into [`Inner::check_for_code`], so a
/// push arriving mid-poll cannot double-apply a transition.
pub struct RevealController {
    inner: Arc<Inner>,
    poll_task: Mutex<Option<JoinHandle<()>>>,
    push_task: Mutex<Option<JoinHandle<()>>>,
}

struct Inner {
    config: ControllerConfig,
    http: reqwest::Client,
    state: Mutex<RevealState>,
    watch_tx: watch::Sender<RevealState>,
}

impl RevealController {
    /// Start polling and the gateway subscription. The first availability
    /// check fires immediately.
    pub fn spawn(config: ControllerConfig) -> Self {
        let (watch_tx, _) = watch::channel(RevealState::new());

        let inner = Arc::new(Inner {
            config,
            http: reqwest::Client::new(),
            state: Mutex::new(RevealState::new()),
            watch_tx,
        });

        let poll_inner = inner.clone();
        let poll_task = tokio::spawn(async move {
            let mut interval = tokio::time::interval(poll_inner.config.poll_interval);
            loop {
                // First tick completes immediately: check on startup.
                interval.tick().await;
                poll_inner.check_for_code().await;
            }
        });

        let push_inner = inner.clone();
        let push_task = tokio::spawn(async move {
            loop {
                if let Err(e) = push_inner.run_gateway_subscription().await {
                    debug!("Gateway subscription ended: {:#}", e);
                }
                tokio::time::sleep(RECONNECT_DELAY).await;
            }
        });

        Self {
            inner,
            poll_task: Mutex::new(Some(poll_task)),
            push_task: Mutex::new(Some(push_task)),
        }
    }

    /// Watch reveal state snapshots; the render loop hangs off this.
    pub fn subscribe(&self) -> watch::Receiver<RevealState> {
        self.inner.watch_tx.subscribe()
    }

    pub fn current_state(&self) -> RevealState {
        self.inner.state.lock().expect("state lock poisoned").clone()
    }

    /// Debug/reset path: clear the stored code and return to Locked.
    pub async fn delete_code(&self) -> Result<()> {
        let url = format!("{}/api/delete-code", self.inner.config.base_url);
        let response = self
            .inner
            .http
            .post(&url)
            .bearer_auth(&self.inner.config.token)
            .send()
            .await
            .context("delete request failed")?;

        if !response.status().is_success() {
            anyhow::bail!("delete request returned {}", response.status());
        }

        self.inner
            .state
            .lock()
            .expect("state lock poisoned")
            .reset();
        self.inner.publish();
        info!("Code deleted, reveal state reset");
        Ok(())
    }

    /// Tear down the poll and subscription tasks. Idempotent and safe to
    /// call even if the gateway connection never came up.
    pub fn shutdown(&self) {
        for task in [&self.poll_task, &self.push_task] {
            if let Some(handle) = task.lock().expect("task lock poisoned").take() {
                handle.abort();
            }
        }
    }
}

impl Drop for RevealController {
    fn drop(&mut self) {
        self.shutdown();
    }
}

impl Inner {
    fn publish(&self) {
        let snapshot = self.state.lock().expect("state lock poisoned").clone();
        let _ = self.watch_tx.send(snapshot);
    }

    /// The single reconciliation point. Transport failures are swallowed:
    /// a failed fetch means "not available yet" and the next interval (or
    /// the next push) retries.
    async fn check_for_code(self: &Arc<Self>) {
        let url = format!("{}/api/retrieve-code", self.config.base_url);
        let response = match self
            .http
            .get(&url)
            .bearer_auth(&self.config.token)
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                debug!("Code not available yet: {}", e);
                return;
            }
        };

        if !response.status().is_success() {
            debug!("Code check returned {}", response.status());
            return;
        }

        let body: RetrieveCodeResponse = match response.json().await {
            Ok(body) => body,
            Err(e) => {
                debug!("Malformed code response: {}", e);
                return;
            }
        };

        let started_animating = self
            .state
            .lock()
            .expect("state lock poisoned")
            .observe(body.status, body.code);

        if started_animating {
            self.publish();

            // Reveal after the brief delay.
            let inner = self.clone();
            tokio::spawn(async move {
                tokio::time::sleep(inner.config.reveal_delay).await;
                let revealed = inner
                    .state
                    .lock()
                    .expect("state lock poisoned")
                    .finish_reveal();
                if revealed {
                    inner.publish();
                }
            });
        }
    }

    /// One gateway session: connect, identify, then treat every
    /// CodeAvailable push as a wake-up for an immediate re-check. The push
    /// never mutates reveal state directly.
    async fn run_gateway_subscription(self: &Arc<Self>) -> Result<()> {
        let (socket, _) = connect_async(self.config.gateway_url.as_str())
            .await
            .context("gateway connect failed")?;
        let (mut sender, mut receiver) = socket.split();

        let identify = GatewayCommand::Identify {
            token: self.config.token.clone(),
        };
        sender
            .send(Message::Text(serde_json::to_string(&identify)?.into()))
            .await
            .context("identify send failed")?;

        while let Some(msg) = receiver.next().await {
            let msg = msg.context("gateway stream error")?;
            let Message::Text(text) = msg else {
                continue;
            };

            match serde_json::from_str::<GatewayEvent>(&text) {
                Ok(GatewayEvent::Ready { channel, .. }) => {
                    info!("Connected to realtime channel: {}", channel);
                }
                Ok(GatewayEvent::CodeAvailable) => {
                    debug!("Received code availability push");
                    self.check_for_code().await;
                }
                Err(e) => {
                    warn!("Unrecognized gateway frame: {}", e);
                }
            }
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unreachable_config() -> ControllerConfig {
        // Nothing listens here; the controller must stay quietly Locked.
        ControllerConfig::new(
            "http://127.0.0.1:9",
            "ws://127.0.0.1:9/gateway",
            "test-token",
        )
    }

    #[tokio::test]
    async fn transport_failures_leave_the_state_locked() {
        let controller = RevealController::spawn(unreachable_config());

        tokio::time::sleep(Duration::from_millis(50)).await;
        let state = controller.current_state();
        assert_eq!(state, RevealState::new());

        controller.shutdown();
    }

    #[tokio::test]
    async fn shutdown_is_idempotent() {
        let controller = RevealController::spawn(unreachable_config());
        controller.shutdown();
        controller.shutdown();
        // Drop runs shutdown a third time.
    }
}
