use axum::routing::post;
use axum::{Json, Router};
use axum::extract::State;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};
use serde::{Deserialize, Serialize};

use crate::auth::{jwt, password};
use crate::entities::user;
use crate::error::AppError;
use crate::state::AppState;

/// Build the auth route group: `/auth/...`
pub fn router() -> Router<AppState> {
    Router::new().route("/login", post(login))
}

// ─────────────────────────────────────────────────────────────────────────────
// DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: LoginUser,
}

/// Public-safe projection returned on login. Never carries the hash.
#[derive(Serialize)]
pub struct LoginUser {
    pub id: i32,
    pub username: String,
    pub email: String,
    #[serde(rename = "isAdmin")]
    pub is_admin: bool,
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// `POST /auth/login`
///
/// Email lookup is a case-sensitive exact match. Unknown email and wrong
/// password produce the identical generic rejection, so the response never
/// reveals whether an email is registered. The blocked check runs only after
/// the credential is verified.
async fn login(
    State(state): State<AppState>,
    Json(body): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    let user_model = user::Entity::find()
        .filter(user::Column::Email.eq(&body.email))
        .one(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .ok_or_else(|| AppError::Unauthorized("Invalid email or password".to_string()))?;

    let valid = password::verify_password(&body.password, &user_model.password_hash)?;
    if !valid {
        return Err(AppError::Unauthorized(
            "Invalid email or password".to_string(),
        ));
    }

    if user_model.is_blocked {
        return Err(AppError::Forbidden("User account is blocked".to_string()));
    }

    let token = jwt::generate_token(user_model.id, user_model.is_admin, &state.config)?;

    Ok(Json(LoginResponse {
        token,
        user: LoginUser {
            id: user_model.id,
            username: user_model.username,
            email: user_model.email,
            is_admin: user_model.is_admin,
        },
    }))
}
