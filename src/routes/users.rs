use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, patch};
use axum::{Json, Router};
use sea_orm::ActiveValue::Set;
use sea_orm::{ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QueryOrder};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::middleware::AuthClaims;
use crate::auth::{password, require_self};
use crate::entities::{game, rsvp, user};
use crate::error::AppError;
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// Build the user route group: `/users/...`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_users).post(register))
        .route("/{id}", get(get_user).put(update_user))
        .route("/{id}/profile-pic", patch(update_profile_pic))
        .route("/{id}/rsvps", get(list_user_rsvps))
}

// ─────────────────────────────────────────────────────────────────────────────
// DTOs
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub bio: Option<String>,
    pub location: Option<String>,
    pub profile_pic: Option<String>,
}

/// Projection returned on registration: id and identity fields only,
/// never the credential hash.
#[derive(Serialize)]
struct RegisterResponse {
    id: i32,
    username: String,
    email: String,
    profile_pic: Option<String>,
}

/// Public profile projection, safe for unauthenticated callers.
#[derive(Serialize)]
struct PublicUser {
    id: i32,
    username: String,
    email: String,
    bio: Option<String>,
    location: Option<String>,
    profile_pic: Option<String>,
}

impl From<user::Model> for PublicUser {
    fn from(u: user::Model) -> Self {
        Self {
            id: u.id,
            username: u.username,
            email: u.email,
            bio: u.bio,
            location: u.location,
            profile_pic: u.profile_pic,
        }
    }
}

#[derive(Deserialize)]
pub struct UpdateUserRequest {
    pub username: Option<String>,
    pub bio: Option<String>,
    pub password: Option<String>,
    pub profile_pic: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateProfilePicRequest {
    pub profile_pic: Option<String>,
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Partial-update semantics: only present, non-empty values count as an
/// update request. An intentionally empty string therefore cannot clear a
/// field; this mirrors the documented contract and is not to be "fixed".
fn non_empty(value: Option<&String>) -> Option<&String> {
    value.filter(|v| !v.is_empty())
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /users`
async fn list_users(State(state): State<AppState>) -> Result<Json<Vec<PublicUser>>, AppError> {
    let users = user::Entity::find()
        .order_by_asc(user::Column::Id)
        .all(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}

/// `GET /users/{id}`
async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<PublicUser>, AppError> {
    let user_model = user::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    Ok(Json(PublicUser::from(user_model)))
}

/// `POST /users`
///
/// Duplicate username/email surfaces as 409 rather than a generic failure;
/// the store's unique constraints remain the last line of defense for
/// concurrent registrations.
async fn register(
    State(state): State<AppState>,
    Json(body): Json<RegisterRequest>,
) -> Result<Response, AppError> {
    let existing_username = user::Entity::find()
        .filter(user::Column::Username.eq(&body.username))
        .one(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    if existing_username.is_some() {
        return Err(AppError::Conflict("Username already taken".to_string()));
    }

    let existing_email = user::Entity::find()
        .filter(user::Column::Email.eq(&body.email))
        .one(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    if existing_email.is_some() {
        return Err(AppError::Conflict("Email already registered".to_string()));
    }

    let password_hash = password::hash_password(&body.password)?;

    let new_user = user::ActiveModel {
        username: Set(body.username),
        email: Set(body.email),
        password_hash: Set(password_hash),
        bio: Set(body.bio),
        location: Set(body.location),
        profile_pic: Set(body.profile_pic),
        is_admin: Set(false),
        is_blocked: Set(false),
        ..Default::default()
    };
    let user_model = new_user
        .insert(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    tracing::info!(user_id = user_model.id, "User registered");

    let response = RegisterResponse {
        id: user_model.id,
        username: user_model.username,
        email: user_model.email,
        profile_pic: user_model.profile_pic,
    };

    Ok((StatusCode::CREATED, Json(response)).into_response())
}

/// `PUT /users/{id}`
///
/// Self-only partial update; admins get no bypass here.
async fn update_user(
    State(state): State<AppState>,
    AuthClaims(claims): AuthClaims,
    Path(id): Path<i32>,
    Json(body): Json<UpdateUserRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_self(&claims, id)?;

    let user_model = user::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let mut active: user::ActiveModel = user_model.into();
    let mut changed = false;

    if let Some(username) = non_empty(body.username.as_ref()) {
        active.username = Set(username.clone());
        changed = true;
    }

    if let Some(bio) = non_empty(body.bio.as_ref()) {
        active.bio = Set(Some(bio.clone()));
        changed = true;
    }

    if let Some(pw) = non_empty(body.password.as_ref()) {
        active.password_hash = Set(password::hash_password(pw)?);
        changed = true;
    }

    if let Some(pic) = non_empty(body.profile_pic.as_ref()) {
        active.profile_pic = Set(Some(pic.clone()));
        changed = true;
    }

    if !changed {
        return Err(AppError::BadRequest("Nothing to update".to_string()));
    }

    let updated = active
        .update(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok(Json(json!({
        "message": "Profile updated",
        "user": {
            "id": updated.id,
            "username": updated.username,
            "bio": updated.bio,
            "profile_pic": updated.profile_pic,
        }
    })))
}

/// `PATCH /users/{id}/profile-pic`
async fn update_profile_pic(
    State(state): State<AppState>,
    AuthClaims(claims): AuthClaims,
    Path(id): Path<i32>,
    Json(body): Json<UpdateProfilePicRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    require_self(&claims, id)?;

    let user_model = user::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    let mut active: user::ActiveModel = user_model.into();
    active.profile_pic = Set(body.profile_pic);

    let updated = active
        .update(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok(Json(json!({
        "message": "Profile picture updated",
        "user": {
            "id": updated.id,
            "profile_pic": updated.profile_pic,
        }
    })))
}

/// `GET /users/{id}/rsvps`
///
/// Games the user has RSVP'd to, soonest first.
async fn list_user_rsvps(
    State(state): State<AppState>,
    AuthClaims(claims): AuthClaims,
    Path(id): Path<i32>,
) -> Result<Json<Vec<game::Model>>, AppError> {
    require_self(&claims, id)?;

    let rows = rsvp::Entity::find()
        .filter(rsvp::Column::UserId.eq(id))
        .find_also_related(game::Entity)
        .order_by_asc(game::Column::Datetime)
        .all(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    let games = rows.into_iter().filter_map(|(_, g)| g).collect();
    Ok(Json(games))
}
