use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    backgrounds::repo::Background, error::ApiError, state::AppState, storage::upload_key,
};

pub fn background_routes() -> Router<AppState> {
    Router::new()
        .route("/backgrounds", get(list_backgrounds))
        .route(
            "/backgrounds",
            post(add_background).layer(DefaultBodyLimit::max(20 * 1024 * 1024)),
        )
}

#[instrument(skip(state))]
pub async fn list_backgrounds(
    State(state): State<AppState>,
) -> Result<Json<Vec<Background>>, ApiError> {
    let backgrounds = state
        .backgrounds
        .list()
        .await
        .map_err(ApiError::Persistence)?;
    Ok(Json(backgrounds))
}

/// Multipart `photo` + `backgroundName`. Names are unique across the
/// catalog.
#[instrument(skip(state, multipart))]
pub async fn add_background(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Background>), ApiError> {
    let mut photo = None;
    let mut name: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(e.to_string()))?
    {
        match field.name() {
            Some("photo") => {
                let file_name = field.file_name().unwrap_or("background").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Validation(e.to_string()))?;
                photo = Some((file_name, data));
            }
            Some("backgroundName") => {
                name = Some(
                    field
                        .text()
                        .await
                        .map_err(|e| ApiError::Validation(e.to_string()))?,
                );
            }
            _ => {}
        }
    }

    let (file_name, data) =
        photo.ok_or_else(|| ApiError::Validation("No file uploaded".into()))?;
    let name = name
        .map(|n| n.trim().to_string())
        .filter(|n| !n.is_empty())
        .ok_or_else(|| ApiError::Validation("backgroundName is required".into()))?;

    if state
        .backgrounds
        .find_by_name(&name)
        .await
        .map_err(ApiError::Persistence)?
        .is_some()
    {
        return Err(ApiError::Conflict("Background name already exists".into()));
    }

    let key = upload_key(&file_name);
    state
        .storage
        .put_object(&key, data)
        .await
        .map_err(ApiError::Persistence)?;
    let background = state
        .backgrounds
        .create(&format!("/uploads/{key}"), &name)
        .await
        .map_err(ApiError::Persistence)?;

    info!(background_id = %background.id, name = %background.background_name, "background added");
    Ok((StatusCode::CREATED, Json(background)))
}
