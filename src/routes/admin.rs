use axum::extract::{Path, State};
use axum::routing::{get, post};
use axum::{Json, Router};
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::Expr;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::Serialize;
use serde_json::json;

use crate::auth::middleware::AdminClaims;
use crate::entities::user;
use crate::error::AppError;
use crate::state::AppState;

/// Build the admin route group: `/admin/...`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route("/users/{id}/block", post(block_user))
        .route("/users/{id}/unblock", post(unblock_user))
}

/// Privileged user projection, includes the moderation flags the public
/// projection omits.
#[derive(Serialize)]
struct AdminUserView {
    id: i32,
    username: String,
    email: String,
    is_admin: bool,
    is_blocked: bool,
}

/// `GET /admin/users`
async fn list_users(
    State(state): State<AppState>,
    AdminClaims(_): AdminClaims,
) -> Result<Json<Vec<AdminUserView>>, AppError> {
    let users = user::Entity::find()
        .order_by_asc(user::Column::Id)
        .all(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    let views = users
        .into_iter()
        .map(|u| AdminUserView {
            id: u.id,
            username: u.username,
            email: u.email,
            is_admin: u.is_admin,
            is_blocked: u.is_blocked,
        })
        .collect();

    Ok(Json(views))
}

/// `POST /admin/users/{id}/block`
///
/// Idempotent: blocking an already-blocked (or absent) user is a harmless
/// no-op.
async fn block_user(
    State(state): State<AppState>,
    AdminClaims(claims): AdminClaims,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>, AppError> {
    user::Entity::update_many()
        .col_expr(user::Column::IsBlocked, Expr::value(true))
        .filter(user::Column::Id.eq(id))
        .exec(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    tracing::info!(target_id = id, admin_id = claims.user_id, "User blocked");

    Ok(Json(json!({ "message": "User blocked successfully" })))
}

/// `POST /admin/users/{id}/unblock`
async fn unblock_user(
    State(state): State<AppState>,
    AdminClaims(claims): AdminClaims,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>, AppError> {
    let user_model = user::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let mut active: user::ActiveModel = user_model.into();
    active.is_blocked = Set(false);
    let updated = active
        .update(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    tracing::info!(target_id = id, admin_id = claims.user_id, "User unblocked");

    Ok(Json(json!({
        "message": "User unblocked",
        "user": {
            "id": updated.id,
            "username": updated.username,
            "is_blocked": updated.is_blocked,
        }
    })))
}
