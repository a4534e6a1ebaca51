use axum::extract::FromRequestParts;
use axum::http::request::Parts;

use crate::auth::jwt::{self, Claims};
use crate::error::AppError;
use crate::state::AppState;

/// Decoded bearer-token claims, extracted from the
/// `Authorization: Bearer <token>` header.
///
/// The claims live only for the duration of the request; nothing is stored
/// server-side. A missing header rejects with 401, an invalid or expired
/// signature with 403 (a distinct signal, so clients can tell "log in" from
/// "token went stale").
///
/// Use as an extractor in handler parameters to require authentication:
/// ```ignore
/// async fn handler(AuthClaims(claims): AuthClaims) -> impl IntoResponse { ... }
/// ```
#[derive(Debug, Clone)]
pub struct AuthClaims(pub Claims);

impl FromRequestParts<AppState> for AuthClaims {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| AppError::Unauthorized("Missing authorization header".to_string()))?;

        let token = header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Unauthorized("Invalid authorization header format".to_string())
        })?;

        let claims = jwt::validate_token(token, &state.config.jwt_secret)
            .map_err(|_| AppError::Forbidden("Invalid or expired token".to_string()))?;

        Ok(Self(claims))
    }
}

/// Requires the caller's token to carry the admin flag.
#[derive(Debug, Clone)]
pub struct AdminClaims(pub Claims);

impl FromRequestParts<AppState> for AdminClaims {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let AuthClaims(claims) = AuthClaims::from_request_parts(parts, state).await?;

        if !claims.is_admin {
            return Err(AppError::Forbidden("Admin access only".to_string()));
        }

        Ok(Self(claims))
    }
}
