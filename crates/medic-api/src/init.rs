use anyhow::Context;
use axum::{
    Json,
    extract::{Query, State},
    http::HeaderMap,
};
use serde::Deserialize;

use medic_types::api::InitResponse;

use crate::error::ApiError;
use crate::middleware::claims_from_headers;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct InitQuery {
    pub post_id: Option<String>,
}

/// Bootstrap call made by the web view on load. Post context is required;
/// caller identity is optional and falls back to an anonymous username.
pub async fn init(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(query): Query<InitQuery>,
) -> Result<Json<InitResponse>, ApiError> {
    let post_id = query.post_id.ok_or(ApiError::MissingPostId)?;

    let db = state.clone();
    let pid = post_id.clone();
    let post = tokio::task::spawn_blocking(move || db.db.get_post(&pid))
        .await
        .context("post lookup task panicked")??;

    if post.is_none() {
        return Err(ApiError::UnknownPost(post_id));
    }

    let username = claims_from_headers(&headers, &state.jwt_secret)
        .map(|claims| claims.username)
        .unwrap_or_else(|| "anonymous".into());

    Ok(Json(InitResponse {
        kind: "init".into(),
        post_id,
        username,
    }))
}
