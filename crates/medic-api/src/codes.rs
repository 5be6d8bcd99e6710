use anyhow::Context;
use axum::{Extension, Json, extract::State};

use medic_types::api::{Claims, CodeStatus, DeleteCodeResponse, RetrieveCodeResponse};

use crate::error::ApiError;
use crate::AppState;

/// Current code status for the authenticated caller. Read-only and
/// poll-safe: the client hits this every 30 seconds.
pub async fn retrieve_code(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<RetrieveCodeResponse>, ApiError> {
    let db = state.clone();
    let user_id = claims.sub.to_string();

    // Run blocking DB read off the async runtime
    let code = tokio::task::spawn_blocking(move || db.db.get_code(&user_id))
        .await
        .context("code read task panicked")??;

    let response = match code {
        Some(code) => RetrieveCodeResponse {
            status: CodeStatus::Available,
            code: Some(code),
        },
        None => RetrieveCodeResponse {
            status: CodeStatus::Unavailable,
            code: None,
        },
    };

    Ok(Json(response))
}

/// Clear the caller's stored code. Deleting an absent code still succeeds;
/// the next trigger comment will issue a fresh one.
pub async fn delete_code(
    State(state): State<AppState>,
    Extension(claims): Extension<Claims>,
) -> Result<Json<DeleteCodeResponse>, ApiError> {
    let db = state.clone();
    let user_id = claims.sub.to_string();

    tokio::task::spawn_blocking(move || db.db.delete_code(&user_id))
        .await
        .context("code delete task panicked")??;

    Ok(Json(DeleteCodeResponse {
        status: "success".into(),
        message: "Code deleted successfully".into(),
    }))
}
