//! Shared-secret check for the rent-roll endpoint.

use super::error::ApiError;
use super::RentRollState;
use crate::error::AuthError;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

/// Header carrying the caller's copy of the shared secret.
pub const TOKEN_HEADER: &str = "x-internal-token";

/// Compare the presented token with the configured secret.
///
/// An unconfigured secret rejects every request, whatever was presented.
/// An empty header counts as missing.
pub fn verify_token(expected: Option<&str>, presented: Option<&[u8]>) -> Result<(), AuthError> {
    let expected = match expected {
        Some(secret) if !secret.is_empty() => secret,
        _ => return Err(AuthError::SecretNotConfigured),
    };
    match presented {
        None | Some([]) => Err(AuthError::MissingToken),
        Some(token) if token == expected.as_bytes() => Ok(()),
        Some(_) => Err(AuthError::InvalidToken),
    }
}

/// Middleware rejecting requests before the body is read.
pub async fn require_internal_token(
    State(state): State<RentRollState>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    let presented = request.headers().get(TOKEN_HEADER).map(|v| v.as_bytes());
    verify_token(state.config.internal_token.as_deref(), presented)?;
    Ok(next.run(request).await)
}
