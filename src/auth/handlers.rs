use axum::{
    extract::{DefaultBodyLimit, FromRef, Multipart, State},
    routing::{get, post},
    Json, Router,
};
use bytes::Bytes;
use rand::RngCore;
use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};

use crate::{
    auth::{
        dto::{
            AutoLoginRequest, AutoLoginResponse, ChangePhotoResponse, ForgotPasswordRequest,
            LoginRequest, LoginResponse, PublicUser, RegisterRequest, RegisterResponse,
            SimpleResponse, UploadedFile,
        },
        jwt::{AuthUser, JwtKeys},
        password::{hash_password, verify_password},
        service::{is_valid_email, password_meets_complexity},
    },
    error::ApiError,
    state::AppState,
    storage::upload_key,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/register", post(register))
        .route("/auth/login", post(login))
        .route("/auth/auto-login", post(auto_login))
        .route("/auth/logout", get(logout))
        .route("/auth/forgot-password", post(forgot_password))
        .route(
            "/auth/change-user-photo",
            post(change_user_photo).layer(DefaultBodyLimit::max(20 * 1024 * 1024)),
        )
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(mut payload): Json<RegisterRequest>,
) -> Result<Json<RegisterResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if !is_valid_email(&payload.email) {
        warn!(email = %payload.email, "invalid email");
        return Err(ApiError::Validation("Invalid email".into()));
    }
    if payload.password.len() < 8 {
        warn!("password too short");
        return Err(ApiError::Validation("Password too short".into()));
    }
    if let Some(_existing) = state
        .users
        .find_by_email(&payload.email)
        .await
        .map_err(ApiError::Persistence)?
    {
        warn!(email = %payload.email, "email already registered");
        return Err(ApiError::Conflict("Email already registered".into()));
    }

    let hash = hash_password(&payload.password).map_err(|e| {
        error!(error = %e, "hash_password failed");
        ApiError::Internal(e)
    })?;
    let user = state
        .users
        .create(&payload.email, &hash)
        .await
        .map_err(ApiError::Persistence)?;

    let keys = JwtKeys::from_ref(&state);
    let token = keys.sign(user.id)?;

    info!(user_id = %user.id, email = %user.email, "user registered");
    Ok(Json(RegisterResponse {
        success: true,
        message: "Registration successful".into(),
        token,
        user: PublicUser::from(&user),
    }))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(mut payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    payload.email = payload.email.trim().to_lowercase();

    if payload.email.is_empty() || payload.password.is_empty() {
        return Err(ApiError::Auth("incorrect password or email".into()));
    }

    let user = match state
        .users
        .find_by_email(&payload.email)
        .await
        .map_err(ApiError::Persistence)?
    {
        Some(u) => u,
        None => {
            warn!(email = %payload.email, "login unknown email");
            return Err(ApiError::Auth("incorrect password or email".into()));
        }
    };

    let ok = verify_password(&payload.password, &user.password_hash).map_err(|e| {
        error!(error = %e, "verify_password failed");
        ApiError::Internal(e)
    })?;
    if !ok {
        warn!(email = %payload.email, user_id = %user.id, "login invalid password");
        return Err(ApiError::Auth("incorrect password or email".into()));
    }

    let keys = JwtKeys::from_ref(&state);
    let access_token = keys.sign(user.id)?;

    info!(user_id = %user.id, email = %user.email, "user logged in");
    Ok(Json(LoginResponse {
        success: true,
        message: "Login successful".into(),
        access_token,
        user: PublicUser::from(&user),
    }))
}

/// Resolves the bearer token back to its user on app bootstrap. The body
/// carries a copy of the token but only the Authorization header is trusted.
#[instrument(skip(state, _payload))]
pub async fn auto_login(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Json(_payload): Json<AutoLoginRequest>,
) -> Result<Json<AutoLoginResponse>, ApiError> {
    let user = state
        .users
        .find_by_id(user_id)
        .await
        .map_err(ApiError::Persistence)?
        .ok_or_else(|| ApiError::Auth("Not authorized, token failed".into()))?;

    Ok(Json(AutoLoginResponse {
        success: true,
        user: PublicUser::from(&user),
    }))
}

/// Stateless: token invalidation happens client-side, the server just
/// acknowledges.
pub async fn logout() -> Json<SimpleResponse> {
    Json(SimpleResponse {
        success: true,
        message: "Logged out successfully".into(),
    })
}

/// Two-phase reset: `{email}` issues a reset token valid for one hour,
/// `{token, newPassword}` redeems it. Mail delivery is out of scope; the
/// issued token is logged for the operator.
#[instrument(skip(state, payload))]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(payload): Json<ForgotPasswordRequest>,
) -> Result<Json<SimpleResponse>, ApiError> {
    match payload.token {
        None => {
            let email = payload
                .email
                .ok_or_else(|| ApiError::Validation("email is required".into()))?;
            let user = state
                .users
                .find_by_email(email.trim())
                .await
                .map_err(ApiError::Persistence)?
                .ok_or_else(|| {
                    ApiError::NotFound("There's no user with that email".into())
                })?;

            let mut bytes = [0u8; 32];
            rand::thread_rng().fill_bytes(&mut bytes);
            let token: String = bytes.iter().map(|b| format!("{b:02x}")).collect();
            let expire = OffsetDateTime::now_utc() + time::Duration::hours(1);
            state
                .users
                .set_reset_token(user.id, &token, expire)
                .await
                .map_err(ApiError::Persistence)?;

            info!(user_id = %user.id, reset_token = %token, "password reset token issued");
            Ok(Json(SimpleResponse {
                success: true,
                message: "Reset token issued".into(),
            }))
        }
        Some(token) => {
            let new_password = payload
                .new_password
                .ok_or_else(|| ApiError::Validation("newPassword is required".into()))?;
            if !password_meets_complexity(&new_password) {
                return Err(ApiError::Validation(
                    "Password does not meet complexity requirements.".into(),
                ));
            }
            let user = state
                .users
                .find_by_reset_token(&token)
                .await
                .map_err(ApiError::Persistence)?
                .ok_or_else(|| ApiError::NotFound("Link Expired".into()))?;
            let still_valid = user
                .reset_token_expire
                .map(|t| t > OffsetDateTime::now_utc())
                .unwrap_or(false);
            if !still_valid {
                return Err(ApiError::NotFound("Link Expired".into()));
            }

            let hash = hash_password(&new_password)?;
            state
                .users
                .update_password(user.id, &hash)
                .await
                .map_err(ApiError::Persistence)?;

            info!(user_id = %user.id, "password reset completed");
            Ok(Json(SimpleResponse {
                success: true,
                message: "Password updated successfully".into(),
            }))
        }
    }
}

/// Multipart `photo` + `email`. Replaces the user's profile picture and
/// removes the previous file from storage.
#[instrument(skip(state, multipart))]
pub async fn change_user_photo(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<Json<ChangePhotoResponse>, ApiError> {
    let mut photo: Option<(String, Bytes)> = None;
    let mut email: Option<String> = None;

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::Validation(e.to_string()))?
    {
        match field.name() {
            Some("photo") => {
                let name = field.file_name().unwrap_or("photo").to_string();
                let data = field
                    .bytes()
                    .await
                    .map_err(|e| ApiError::Validation(e.to_string()))?;
                photo = Some((name, data));
            }
            Some("email") => {
                email = Some(
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
    let email = email.ok_or_else(|| ApiError::Validation("email is required".into()))?;

    let user = state
        .users
        .find_by_email(email.trim())
        .await
        .map_err(ApiError::Persistence)?
        .ok_or_else(|| ApiError::NotFound("User not found".into()))?;

    // Best-effort removal of the superseded file.
    if let Some(old) = user.profile_picture.as_deref() {
        if let Some(key) = old.strip_prefix("/uploads/") {
            if let Err(e) = state.storage.delete_object(key).await {
                warn!(error = %e, key, "failed to delete old profile picture");
            }
        }
    }

    let key = upload_key(&file_name);
    state
        .storage
        .put_object(&key, data)
        .await
        .map_err(ApiError::Persistence)?;
    let url = format!("/uploads/{key}");
    state
        .users
        .update_profile_picture(user.id, &url)
        .await
        .map_err(ApiError::Persistence)?;

    info!(user_id = %user.id, %url, "profile picture updated");
    Ok(Json(ChangePhotoResponse {
        message: "Profile picture updated successfully".into(),
        file: UploadedFile {
            file_name: key,
            url,
        },
    }))
}
