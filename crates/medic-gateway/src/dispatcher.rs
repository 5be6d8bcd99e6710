use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use uuid::Uuid;

use medic_types::events::GatewayEvent;

/// Manages connected clients and delivers targeted per-user events.
///
/// Each user has at most one live push channel (named `code_{userId}` on the
/// wire). Delivery is best-effort: a user with no live connection simply
/// misses the push and catches up on their next poll.
#[derive(Clone)]
pub struct Dispatcher {
    inner: Arc<DispatcherInner>,
}

struct DispatcherInner {
    /// Per-user targeted send channels: user_id -> (conn_id, sender)
    user_channels: RwLock<HashMap<Uuid, (Uuid, mpsc::UnboundedSender<GatewayEvent>)>>,
}

impl Dispatcher {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(DispatcherInner {
                user_channels: RwLock::new(HashMap::new()),
            }),
        }
    }

    /// Register a per-user targeted channel. Returns (conn_id, receiver).
    /// A newer connection for the same user displaces the old sender.
    pub async fn register_user_channel(
        &self,
        user_id: Uuid,
    ) -> (Uuid, mpsc::UnboundedReceiver<GatewayEvent>) {
        let conn_id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner
            .user_channels
            .write()
            .await
            .insert(user_id, (conn_id, tx));
        (conn_id, rx)
    }

    /// Unregister a per-user targeted channel, but only if conn_id matches.
    /// A stale disconnect must not tear down a newer connection's channel.
    pub async fn unregister_user_channel(&self, user_id: Uuid, conn_id: Uuid) {
        let mut channels = self.inner.user_channels.write().await;
        if let Some((stored_conn_id, _)) = channels.get(&user_id) {
            if *stored_conn_id == conn_id {
                channels.remove(&user_id);
            }
        }
    }

    /// Send a targeted event to a specific user. Silently drops the event
    /// when the user has no live connection.
    pub async fn send_to_user(&self, user_id: Uuid, event: GatewayEvent) {
        let channels = self.inner.user_channels.read().await;
        if let Some((_, tx)) = channels.get(&user_id) {
            let _ = tx.send(event);
        }
    }
}

impl Default for Dispatcher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn delivers_targeted_events() {
        let dispatcher = Dispatcher::new();
        let user_id = Uuid::new_v4();

        let (_conn_id, mut rx) = dispatcher.register_user_channel(user_id).await;
        dispatcher
            .send_to_user(user_id, GatewayEvent::CodeAvailable)
            .await;

        assert!(matches!(rx.recv().await, Some(GatewayEvent::CodeAvailable)));
    }

    #[tokio::test]
    async fn send_to_unknown_user_is_a_noop() {
        let dispatcher = Dispatcher::new();
        // No panic, no error: the event is just dropped.
        dispatcher
            .send_to_user(Uuid::new_v4(), GatewayEvent::CodeAvailable)
            .await;
    }

    #[tokio::test]
    async fn newer_connection_displaces_older_one() {
        let dispatcher = Dispatcher::new();
        let user_id = Uuid::new_v4();

        let (old_conn_id, mut old_rx) = dispatcher.register_user_channel(user_id).await;
        let (_new_conn_id, mut new_rx) = dispatcher.register_user_channel(user_id).await;

        dispatcher
            .send_to_user(user_id, GatewayEvent::CodeAvailable)
            .await;

        // Old receiver's sender was dropped on displacement.
        assert!(old_rx.recv().await.is_none());
        assert!(matches!(
            new_rx.recv().await,
            Some(GatewayEvent::CodeAvailable)
        ));

        // A stale unregister from the old connection must not remove the
        // new connection's channel.
        dispatcher.unregister_user_channel(user_id, old_conn_id).await;
        dispatcher
            .send_to_user(user_id, GatewayEvent::CodeAvailable)
            .await;
        assert!(matches!(
            new_rx.recv().await,
            Some(GatewayEvent::CodeAvailable)
        ));
    }

    #[tokio::test]
    async fn unregister_with_matching_conn_id_removes_channel() {
        let dispatcher = Dispatcher::new();
        let user_id = Uuid::new_v4();

        let (conn_id, mut rx) = dispatcher.register_user_channel(user_id).await;
        dispatcher.unregister_user_channel(user_id, conn_id).await;

        dispatcher
            .send_to_user(user_id, GatewayEvent::CodeAvailable)
            .await;
        assert!(rx.recv().await.is_none());
    }
}
