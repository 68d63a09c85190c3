// src/middleware/auth.rs
use crate::error::AppError;
use crate::AppState;
use axum::{
    extract::{Extension, Request},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use subtle::ConstantTimeEq;

/// Checks `Authorization: Bearer <token>` against the configured server key
pub async fn auth_middleware(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let auth_str = headers
        .get(header::AUTHORIZATION)
        .ok_or(AppError::Unauthorized("Not authenticated"))?
        .to_str()
        .map_err(|_| AppError::Unauthorized("Invalid authentication scheme."))?;

    let token = match auth_str.split_once(' ') {
        Some((scheme, token)) if scheme.eq_ignore_ascii_case("Bearer") => token.trim(),
        _ => return Err(AppError::Unauthorized("Invalid authentication scheme.")),
    };

    if !keys_match(token, &state.config.server.api_key) {
        tracing::warn!("🔒 Rejected request with invalid API key");
        return Err(AppError::Unauthorized("Invalid API Key"));
    }

    Ok(next.run(request).await)
}

fn keys_match(token: &str, expected: &str) -> bool {
    let (token, expected) = (token.as_bytes(), expected.as_bytes());
    // Length leaks, content does not
    token.len() == expected.len() && token.ct_eq(expected).unwrap_u8() == 1
}
