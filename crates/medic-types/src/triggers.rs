use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Payload of the platform-invoked comment-creation trigger.
///
/// Every field is optional: the platform makes no promises about payload
/// completeness and the handler is expected to no-op rather than reject.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentCreateEvent {
    pub comment: Option<CommentData>,
    pub author: Option<AuthorData>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CommentData {
    pub body: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AuthorData {
    pub id: Option<Uuid>,
    pub username: Option<String>,
}

/// Confirmation body for the install trigger.
#[derive(Debug, Serialize, Deserialize)]
pub struct InstallResponse {
    pub status: String,
    pub message: String,
}
