use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Events sent over the WebSocket gateway.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayEvent {
    /// Server confirms successful authentication and names the per-user
    /// channel this connection is now subscribed to.
    Ready {
        user_id: Uuid,
        username: String,
        channel: String,
    },

    /// A code just became available for this user. Deliberately carries no
    /// payload: the client fetches the code through the retrieval endpoint,
    /// so a push lost in transit is recovered by the next poll.
    CodeAvailable,
}

/// Commands sent FROM client TO server over WebSocket.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", content = "data")]
pub enum GatewayCommand {
    /// Authenticate the WebSocket connection
    Identify { token: String },
}

/// Name of the per-user push channel.
pub fn code_channel(user_id: Uuid) -> String {
    format!("code_{}", user_id)
}
