use anyhow::{Context, Result};
use axum::{Json, extract::State, http::StatusCode};
use tracing::{debug, error, info};
use uuid::Uuid;

use medic_types::triggers::{CommentCreateEvent, InstallResponse};

use crate::error::ApiError;
use crate::{AppState, issue, notify};

/// The command token that triggers issuance, matched case-insensitively
/// anywhere in the comment body.
pub const TRIGGER_TOKEN: &str = "!medic";

const POST_TITLE: &str = "Code Reveal";

/// Platform-invoked comment-creation trigger. Fire-and-forget: the platform
/// has no use for a response, so this always answers 200 and failures are
/// only logged. Nothing on this path may panic its way out.
pub async fn on_comment_create(
    State(state): State<AppState>,
    Json(event): Json<CommentCreateEvent>,
) -> StatusCode {
    if let Err(e) = process_comment(&state, event).await {
        error!("Error handling comment trigger: {:#}", e);
    }
    StatusCode::OK
}

/// The issuance pipeline: trigger match -> username resolution -> atomic
/// insert-if-absent -> notification.
pub async fn process_comment(state: &AppState, event: CommentCreateEvent) -> Result<()> {
    let Some(body) = event.comment.as_ref().and_then(|c| c.body.as_deref()) else {
        return Ok(());
    };
    debug!("Comment text received: {}", body);

    if !body.to_lowercase().contains(TRIGGER_TOKEN) {
        return Ok(());
    }

    let author = event.author.unwrap_or_default();
    let Some(user_id) = author.id else {
        error!("No user id found in comment trigger");
        return Ok(());
    };

    let Some(username) = resolve_username(state, user_id, author.username).await? else {
        error!("No username found for user {}", user_id);
        return Ok(());
    };

    let db = state.clone();
    let (code, newly_issued) = tokio::task::spawn_blocking(move || issue::issue_code(&db.db, user_id))
        .await
        .context("issuance task panicked")??;

    info!(
        "{} code for user {}: {}",
        if newly_issued { "Issued" } else { "Reusing" },
        user_id,
        code
    );

    notify::notify_code_ready(state, user_id, &username, &code).await;
    Ok(())
}

/// Prefer the username the platform sent with the event (remembering it for
/// later), otherwise fall back to the local directory.
async fn resolve_username(
    state: &AppState,
    user_id: Uuid,
    payload_username: Option<String>,
) -> Result<Option<String>> {
    let db = state.clone();
    tokio::task::spawn_blocking(move || {
        let uid = user_id.to_string();
        if let Some(username) = payload_username {
            db.db.upsert_user(&uid, &username)?;
            return Ok(Some(username));
        }
        db.db.get_username_by_id(&uid)
    })
    .await
    .context("username resolution task panicked")?
}

/// Platform-invoked install trigger: seed the post that hosts the app.
pub async fn on_app_install(
    State(state): State<AppState>,
) -> Result<Json<InstallResponse>, ApiError> {
    let post_id = Uuid::new_v4().to_string();

    let db = state.clone();
    let pid = post_id.clone();
    let created = tokio::task::spawn_blocking(move || db.db.create_post(&pid, POST_TITLE)).await;

    match created {
        Ok(Ok(())) => Ok(Json(InstallResponse {
            status: "success".into(),
            message: format!("Post created with id {}", post_id),
        })),
        Ok(Err(e)) => {
            error!("Error creating post: {:#}", e);
            Err(ApiError::BadRequest("Failed to create post".into()))
        }
        Err(e) => {
            error!("Post creation task panicked: {}", e);
            Err(ApiError::BadRequest("Failed to create post".into()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use medic_db::Database;
    use medic_gateway::dispatcher::Dispatcher;
    use medic_types::events::GatewayEvent;
    use medic_types::triggers::{AuthorData, CommentData};

    use crate::AppStateInner;

    fn test_state() -> AppState {
        Arc::new(AppStateInner {
            db: Database::open_in_memory().unwrap(),
            dispatcher: Dispatcher::new(),
            jwt_secret: "test-secret".into(),
        })
    }

    fn comment_event(body: Option<&str>, author: Option<AuthorData>) -> CommentCreateEvent {
        CommentCreateEvent {
            comment: Some(CommentData {
                body: body.map(str::to_string),
            }),
            author,
        }
    }

    fn author(user_id: Uuid, username: &str) -> AuthorData {
        AuthorData {
            id: Some(user_id),
            username: Some(username.to_string()),
        }
    }

    #[tokio::test]
    async fn trigger_issues_stores_and_notifies() {
        let state = test_state();
        let user_id = Uuid::new_v4();

        let (_conn_id, mut rx) = state.dispatcher.register_user_channel(user_id).await;

        let event = comment_event(Some("please !medic now"), Some(author(user_id, "medic_fan")));
        process_comment(&state, event).await.unwrap();

        // Code stored, 8 uppercase letters.
        let code = state.db.get_code(&user_id.to_string()).unwrap().unwrap();
        assert_eq!(code.len(), 8);
        assert!(code.chars().all(|c| c.is_ascii_uppercase()));

        // Push landed on the per-user channel.
        assert!(matches!(rx.try_recv(), Ok(GatewayEvent::CodeAvailable)));

        // Private message carries the code.
        let inbox = state.db.get_inbox_for_user(&user_id.to_string()).unwrap();
        assert_eq!(inbox.len(), 1);
        assert_eq!(inbox[0].subject, "Your code is ready!");
        assert_eq!(inbox[0].body, format!("Your medic code is {}", code));
    }

    #[tokio::test]
    async fn repeat_trigger_reuses_the_stored_code() {
        let state = test_state();
        let user_id = Uuid::new_v4();

        let event = comment_event(Some("!medic"), Some(author(user_id, "medic_fan")));
        process_comment(&state, event.clone()).await.unwrap();
        let first = state.db.get_code(&user_id.to_string()).unwrap().unwrap();

        process_comment(&state, event).await.unwrap();
        let second = state.db.get_code(&user_id.to_string()).unwrap().unwrap();

        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn trigger_match_is_case_insensitive() {
        let state = test_state();
        let user_id = Uuid::new_v4();

        let event = comment_event(Some("PLEASE !MeDiC"), Some(author(user_id, "medic_fan")));
        process_comment(&state, event).await.unwrap();

        assert!(state.db.get_code(&user_id.to_string()).unwrap().is_some());
    }

    #[tokio::test]
    async fn non_trigger_and_empty_comments_are_noops() {
        let state = test_state();
        let user_id = Uuid::new_v4();

        let plain = comment_event(Some("nice post!"), Some(author(user_id, "medic_fan")));
        process_comment(&state, plain).await.unwrap();

        let empty = CommentCreateEvent::default();
        process_comment(&state, empty).await.unwrap();

        assert!(state.db.get_code(&user_id.to_string()).unwrap().is_none());
    }

    #[tokio::test]
    async fn missing_author_id_aborts_silently() {
        let state = test_state();

        let event = comment_event(
            Some("!medic"),
            Some(AuthorData {
                id: None,
                username: Some("medic_fan".into()),
            }),
        );
        // No error escapes; nothing is stored anywhere.
        process_comment(&state, event).await.unwrap();
    }

    #[tokio::test]
    async fn unresolvable_username_aborts_without_issuing() {
        let state = test_state();
        let user_id = Uuid::new_v4();

        let event = comment_event(
            Some("!medic"),
            Some(AuthorData {
                id: Some(user_id),
                username: None,
            }),
        );
        process_comment(&state, event).await.unwrap();

        assert!(state.db.get_code(&user_id.to_string()).unwrap().is_none());
    }

    #[tokio::test]
    async fn username_from_an_earlier_event_is_remembered() {
        let state = test_state();
        let user_id = Uuid::new_v4();

        // A prior trigger event recorded the username in the directory.
        let intro = comment_event(Some("!medic"), Some(author(user_id, "medic_fan")));
        process_comment(&state, intro).await.unwrap();
        state.db.delete_code(&user_id.to_string()).unwrap();

        let event = comment_event(
            Some("!medic"),
            Some(AuthorData {
                id: Some(user_id),
                username: None,
            }),
        );
        process_comment(&state, event).await.unwrap();

        assert!(state.db.get_code(&user_id.to_string()).unwrap().is_some());
    }

    #[tokio::test]
    async fn install_creates_a_post() {
        let state = test_state();

        let Json(response) = on_app_install(State(state.clone())).await.unwrap();
        assert_eq!(response.status, "success");

        let post_id = response.message.strip_prefix("Post created with id ").unwrap();
        assert!(state.db.get_post(post_id).unwrap().is_some());
    }
}
