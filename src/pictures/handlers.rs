use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{error::ApiError, pictures::repo::Picture, state::AppState, storage::upload_key};

pub fn picture_routes() -> Router<AppState> {
    Router::new()
        .route("/pictures", get(list_pictures))
        .route(
            "/pictures",
            post(upload_picture).layer(DefaultBodyLimit::max(20 * 1024 * 1024)),
        )
}

#[instrument(skip(state))]
pub async fn list_pictures(
    State(state): State<AppState>,
) -> Result<Json<Vec<Picture>>, ApiError> {
    let pictures = state.pictures.list().await.map_err(ApiError::Persistence)?;
    Ok(Json(pictures))
}

/// Anonymous multipart upload, field `photo`.
#[instrument(skip(state, multipart))]
pub async fn upload_picture(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<Picture>), ApiError> {
    let mut photo = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(e.to_string()))?
    {
        if field.name() == Some("photo") {
            let name = field.file_name().unwrap_or("photo").to_string();
            let data = field
                .bytes()
                .await
                .map_err(|e| ApiError::Validation(e.to_string()))?;
            photo = Some((name, data));
        }
    }
    let (file_name, data) =
        photo.ok_or_else(|| ApiError::Validation("No file uploaded".into()))?;

    let key = upload_key(&file_name);
    state
        .storage
        .put_object(&key, data)
        .await
        .map_err(ApiError::Persistence)?;
    let picture = state
        .pictures
        .create(&format!("/uploads/{key}"))
        .await
        .map_err(ApiError::Persistence)?;

    info!(picture_id = %picture.id, url = %picture.url, "picture uploaded");
    Ok((StatusCode::CREATED, Json(picture)))
}
