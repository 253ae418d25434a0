use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::jwt::AuthUser, error::ApiError, state::AppState, user_pictures::repo::UserPicture,
};

pub fn user_picture_routes() -> Router<AppState> {
    Router::new()
        .route("/userPictures", get(list_user_pictures))
        .route("/userPictures", post(add_user_picture))
}

/// Body for promoting a processed result. `userId` is informational; the
/// owning user always comes from the bearer token.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddUserPictureRequest {
    pub user_id: Option<Uuid>,
    pub url: String,
}

#[instrument(skip(state))]
pub async fn list_user_pictures(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<Vec<UserPicture>>, ApiError> {
    let pictures = state
        .user_pictures
        .list_by_user(user_id)
        .await
        .map_err(ApiError::Persistence)?;
    Ok(Json(pictures))
}

#[instrument(skip(state, payload))]
pub async fn add_user_picture(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(payload): Json<AddUserPictureRequest>,
) -> Result<(StatusCode, Json<UserPicture>), ApiError> {
    if payload.url.trim().is_empty() {
        return Err(ApiError::Validation("url is required".into()));
    }
    let picture = state
        .user_pictures
        .create(user_id, &payload.url)
        .await
        .map_err(ApiError::Persistence)?;

    info!(user_id = %user_id, picture_id = %picture.id, "user picture saved");
    Ok((StatusCode::CREATED, Json(picture)))
}
