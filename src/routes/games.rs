use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use sea_orm::ActiveValue::Set;
use sea_orm::sea_query::OnConflict;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, DbErr, EntityTrait, ModelTrait, QueryFilter, QueryOrder,
};
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::auth::middleware::AuthClaims;
use crate::auth::require_owner_or_admin;
use crate::entities::{game, rsvp, user};
use crate::error::AppError;
use crate::state::AppState;

// ─────────────────────────────────────────────────────────────────────────────
// Router
// ─────────────────────────────────────────────────────────────────────────────

/// Build the game route group: `/games/...`
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_games).post(create_game))
        .route(
            "/{id}",
            get(get_game).put(update_game).delete(delete_game),
        )
        .route("/{id}/rsvp", post(join_game).delete(cancel_rsvp))
        .route("/{id}/rsvps", get(list_game_rsvps))
}

// ─────────────────────────────────────────────────────────────────────────────
// DTOs
// ─────────────────────────────────────────────────────────────────────────────

/// Game row joined with the creator's username, the shape every public
/// listing returns.
#[derive(Serialize)]
struct GameWithCreator {
    #[serde(flatten)]
    game: game::Model,
    username: String,
}

#[derive(Deserialize)]
pub struct CreateGameRequest {
    pub title: String,
    pub datetime: chrono::DateTime<chrono::FixedOffset>,
    pub location: String,
    pub skill_level: Option<String>,
}

#[derive(Deserialize)]
pub struct UpdateGameRequest {
    pub title: String,
    pub datetime: chrono::DateTime<chrono::FixedOffset>,
    pub location: String,
    pub skill_level: Option<String>,
}

/// Attendee projection for a game's RSVP list.
#[derive(Serialize)]
struct Attendee {
    id: i32,
    username: String,
}

// ─────────────────────────────────────────────────────────────────────────────
// Helpers
// ─────────────────────────────────────────────────────────────────────────────

/// Load a game or map its absence to the canonical 404.
async fn find_game(state: &AppState, id: i32) -> Result<game::Model, AppError> {
    game::Entity::find_by_id(id)
        .one(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .ok_or_else(|| AppError::NotFound("Game not found".to_string()))
}

/// Blocked users get no RSVP writes, on the join and cancel paths alike.
async fn ensure_not_blocked(state: &AppState, user_id: i32) -> Result<(), AppError> {
    let user_model = user::Entity::find_by_id(user_id)
        .one(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .ok_or_else(|| AppError::NotFound("User not found".to_string()))?;

    if user_model.is_blocked {
        return Err(AppError::Forbidden("Blocked users cannot RSVP".to_string()));
    }
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Handlers
// ─────────────────────────────────────────────────────────────────────────────

/// `GET /games`
async fn list_games(State(state): State<AppState>) -> Result<Json<Vec<GameWithCreator>>, AppError> {
    let rows = game::Entity::find()
        .find_also_related(user::Entity)
        .order_by_asc(game::Column::Datetime)
        .all(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    let games = rows
        .into_iter()
        .map(|(g, creator)| GameWithCreator {
            game: g,
            username: creator.map(|u| u.username).unwrap_or_default(),
        })
        .collect();

    Ok(Json(games))
}

/// `GET /games/{id}`
async fn get_game(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<GameWithCreator>, AppError> {
    let (game_model, creator) = game::Entity::find_by_id(id)
        .find_also_related(user::Entity)
        .one(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .ok_or_else(|| AppError::NotFound("Game not found".to_string()))?;

    Ok(Json(GameWithCreator {
        game: game_model,
        username: creator.map(|u| u.username).unwrap_or_default(),
    }))
}

/// `POST /games`
///
/// The caller becomes the creator. The free-text location is resolved to
/// coordinates through the geocoding interface; a miss or a provider failure
/// defaults to (0, 0), with failures logged rather than silently swallowed.
async fn create_game(
    State(state): State<AppState>,
    AuthClaims(claims): AuthClaims,
    Json(body): Json<CreateGameRequest>,
) -> Result<Response, AppError> {
    let (longitude, latitude) = match state.geocoder.lookup(&body.location).await {
        Ok(Some(coords)) => coords,
        Ok(None) => (0.0, 0.0),
        Err(err) => {
            tracing::warn!(
                location = %body.location,
                error = %err,
                "Geocoding failed, defaulting coordinates"
            );
            (0.0, 0.0)
        }
    };

    let new_game = game::ActiveModel {
        title: Set(body.title),
        datetime: Set(body.datetime),
        location: Set(body.location),
        skill_level: Set(body.skill_level),
        created_by: Set(claims.user_id),
        latitude: Set(latitude),
        longitude: Set(longitude),
        ..Default::default()
    };
    let game_model = new_game
        .insert(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    tracing::info!(game_id = game_model.id, creator = claims.user_id, "Game created");

    Ok((StatusCode::CREATED, Json(game_model)).into_response())
}

/// `PUT /games/{id}`
///
/// Creator-or-admin only. Coordinates are not re-derived on update.
async fn update_game(
    State(state): State<AppState>,
    AuthClaims(claims): AuthClaims,
    Path(id): Path<i32>,
    Json(body): Json<UpdateGameRequest>,
) -> Result<Json<serde_json::Value>, AppError> {
    let game_model = find_game(&state, id).await?;
    require_owner_or_admin(&claims, game_model.created_by)?;

    let mut active: game::ActiveModel = game_model.into();
    active.title = Set(body.title);
    active.datetime = Set(body.datetime);
    active.location = Set(body.location);
    active.skill_level = Set(body.skill_level);

    let updated = active
        .update(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok(Json(json!({ "message": "Game updated", "game": updated })))
}

/// `DELETE /games/{id}`
///
/// Returns a confirmation, not the deleted row. No orphan check; the store's
/// foreign keys handle dependent RSVPs.
async fn delete_game(
    State(state): State<AppState>,
    AuthClaims(claims): AuthClaims,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>, AppError> {
    let game_model = find_game(&state, id).await?;
    require_owner_or_admin(&claims, game_model.created_by)?;

    game_model
        .delete(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    Ok(Json(json!({ "message": "Game deleted" })))
}

/// `POST /games/{id}/rsvp`
///
/// Idempotent join: the insert defers to the (`user_id`, `game_id`) unique
/// constraint, so a repeat join is a no-op success rather than an error.
async fn join_game(
    State(state): State<AppState>,
    AuthClaims(claims): AuthClaims,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>, AppError> {
    ensure_not_blocked(&state, claims.user_id).await?;
    find_game(&state, id).await?;

    let new_rsvp = rsvp::ActiveModel {
        user_id: Set(claims.user_id),
        game_id: Set(id),
        ..Default::default()
    };

    let result = rsvp::Entity::insert(new_rsvp)
        .on_conflict(
            OnConflict::columns([rsvp::Column::UserId, rsvp::Column::GameId])
                .do_nothing()
                .to_owned(),
        )
        .exec(&state.db)
        .await;

    match result {
        Ok(_) => Ok(Json(json!({ "message": "RSVP successful" }))),
        Err(DbErr::RecordNotInserted) => Ok(Json(json!({ "message": "Already RSVP'd" }))),
        Err(e) => Err(AppError::Internal(e.into())),
    }
}

/// `DELETE /games/{id}/rsvp`
async fn cancel_rsvp(
    State(state): State<AppState>,
    AuthClaims(claims): AuthClaims,
    Path(id): Path<i32>,
) -> Result<Json<serde_json::Value>, AppError> {
    ensure_not_blocked(&state, claims.user_id).await?;

    let result = rsvp::Entity::delete_many()
        .filter(rsvp::Column::UserId.eq(claims.user_id))
        .filter(rsvp::Column::GameId.eq(id))
        .exec(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    if result.rows_affected == 0 {
        return Err(AppError::NotFound("RSVP not found".to_string()));
    }

    Ok(Json(json!({ "message": "RSVP cancelled" })))
}

/// `GET /games/{id}/rsvps`
///
/// Attendees ordered alphabetically by username for deterministic output.
async fn list_game_rsvps(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> Result<Json<Vec<Attendee>>, AppError> {
    let rows = rsvp::Entity::find()
        .filter(rsvp::Column::GameId.eq(id))
        .find_also_related(user::Entity)
        .order_by_asc(user::Column::Username)
        .all(&state.db)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;

    let attendees = rows
        .into_iter()
        .filter_map(|(_, u)| u)
        .map(|u| Attendee {
            id: u.id,
            username: u.username,
        })
        .collect();

    Ok(Json(attendees))
}
