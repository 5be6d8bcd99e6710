use tracing::{info, warn};
use uuid::Uuid;

use medic_types::events::{GatewayEvent, code_channel};

use crate::AppState;

/// Notify a user that their code is ready. Two independent effects:
///
///  a. an empty-marker push on the user's `code_{userId}` channel, so a
///     connected client re-checks immediately instead of waiting for its
///     next poll;
///  b. a private inbox message spelling the code out.
///
/// Both are best-effort. The code is already durably stored by the time we
/// get here, so a failed notification just means the client finds out on
/// its next poll — nothing is rolled back.
pub async fn notify_code_ready(state: &AppState, user_id: Uuid, username: &str, code: &str) {
    state
        .dispatcher
        .send_to_user(user_id, GatewayEvent::CodeAvailable)
        .await;
    info!("Pushed code availability to channel {}", code_channel(user_id));

    let db = state.clone();
    let message_id = Uuid::new_v4().to_string();
    let to_user_id = user_id.to_string();
    let body = format!("Your medic code is {}", code);

    let result = tokio::task::spawn_blocking(move || {
        db.db
            .insert_inbox_message(&message_id, &to_user_id, "Your code is ready!", &body)
    })
    .await;

    match result {
        Ok(Ok(())) => info!("Sent code message to {} ({})", username, user_id),
        Ok(Err(e)) => warn!("Failed to send code message to {}: {:#}", username, e),
        Err(e) => warn!("Inbox write task panicked for {}: {}", username, e),
    }
}
