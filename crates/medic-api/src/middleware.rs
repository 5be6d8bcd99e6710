use axum::{
    extract::{Request, State},
    http::{HeaderMap, header},
    middleware::Next,
    response::Response,
};
use jsonwebtoken::{DecodingKey, Validation, decode};

use medic_types::api::Claims;

use crate::{AppState, error::ApiError};

/// Extract and validate JWT from the Authorization header. The validated
/// claims are attached as a request extension for downstream handlers.
pub async fn require_auth(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let claims =
        claims_from_headers(req.headers(), &state.jwt_secret).ok_or(ApiError::Unauthenticated)?;

    req.extensions_mut().insert(claims);
    Ok(next.run(req).await)
}

/// Best-effort claims extraction for endpoints where identity is optional
/// (the init endpoint falls back to an anonymous username).
pub fn claims_from_headers(headers: &HeaderMap, jwt_secret: &str) -> Option<Claims> {
    let auth_header = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = auth_header.strip_prefix("Bearer ")?;

    let token_data = decode::<Claims>(
        token,
        &DecodingKey::from_secret(jwt_secret.as_bytes()),
        &Validation::default(),
    )
    .ok()?;

    Some(token_data.claims)
}
