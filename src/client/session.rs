use std::sync::{Arc, Mutex};

use tokio::sync::mpsc;
use tracing::{info, warn};

use crate::auth::dto::{
    AutoLoginRequest, AutoLoginResponse, ChangePhotoResponse, ForgotPasswordRequest,
    LoginRequest, LoginResponse, PublicUser, RegisterRequest, RegisterResponse, SimpleResponse,
};
use crate::auth::service::is_valid_email;
use crate::client::error::ClientError;
use crate::client::gateway::{Gateway, GatewayError, SessionEvent};
use crate::client::notify::Notices;
use crate::client::processor::ImageUpload;
use crate::client::token::TokenStore;

/// Authenticated/unauthenticated gate deciding which route table is live.
#[derive(Debug, Clone)]
pub enum SessionState {
    Unauthenticated,
    Authenticated { user: PublicUser },
}

/// Orchestrates register/login/auto-login/logout and consumes the
/// gateway's invalidation events.
pub struct SessionController {
    gateway: Arc<Gateway>,
    tokens: Arc<TokenStore>,
    notices: Notices,
    state: Mutex<SessionState>,
    events: Mutex<mpsc::UnboundedReceiver<SessionEvent>>,
}

impl SessionController {
    pub fn new(
        gateway: Arc<Gateway>,
        tokens: Arc<TokenStore>,
        notices: Notices,
        events: mpsc::UnboundedReceiver<SessionEvent>,
    ) -> Self {
        Self {
            gateway,
            tokens,
            notices,
            state: Mutex::new(SessionState::Unauthenticated),
            events: Mutex::new(events),
        }
    }

    pub fn state(&self) -> SessionState {
        self.state.lock().unwrap().clone()
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(*self.state.lock().unwrap(), SessionState::Authenticated { .. })
    }

    pub fn current_user(&self) -> Option<PublicUser> {
        match &*self.state.lock().unwrap() {
            SessionState::Authenticated { user } => Some(user.clone()),
            SessionState::Unauthenticated => None,
        }
    }

    fn authenticate(&self, token: &str, user: PublicUser) {
        self.tokens.set(token);
        *self.state.lock().unwrap() = SessionState::Authenticated { user };
    }

    fn deauthenticate(&self) {
        self.tokens.clear();
        *self.state.lock().unwrap() = SessionState::Unauthenticated;
    }

    /// Creates an account and signs in. Registration always authenticates
    /// on success.
    pub async fn register(&self, email: &str, password: &str) -> Result<PublicUser, ClientError> {
        let email = email.trim().to_lowercase();
        if !is_valid_email(&email) {
            return Err(ClientError::Validation("Invalid email".into()));
        }
        if password.len() < 8 {
            return Err(ClientError::Validation("Password too short".into()));
        }

        let response: RegisterResponse = self
            .gateway
            .post_json(
                "/api/auth/register",
                &RegisterRequest {
                    email,
                    password: password.to_string(),
                },
            )
            .await
            .map_err(|e| {
                self.notices.error("Registration failed");
                e.into_auth()
            })?;

        self.authenticate(&response.token, response.user.clone());
        self.notices.success("Registration successful");
        info!(user_id = %response.user.id, "registered");
        Ok(response.user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<PublicUser, ClientError> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || password.is_empty() {
            return Err(ClientError::Validation(
                "email and password are required".into(),
            ));
        }

        let response: LoginResponse = self
            .gateway
            .post_json(
                "/api/auth/login",
                &LoginRequest {
                    email,
                    password: password.to_string(),
                },
            )
            .await
            .map_err(|e| {
                self.notices.error("incorrect password or email");
                e.into_auth()
            })?;

        self.authenticate(&response.access_token, response.user.clone());
        self.notices.success("Login successful");
        info!(user_id = %response.user.id, "logged in");
        Ok(response.user)
    }

    /// Bootstrap path: presents the stored token and restores the session.
    /// Any failure silently clears the token store and leaves the session
    /// unauthenticated. This is the sole automatic recovery path.
    pub async fn auto_login(&self) -> Option<PublicUser> {
        let token = self.tokens.get()?;

        let result: Result<AutoLoginResponse, _> = self
            .gateway
            .post_json(
                "/api/auth/auto-login",
                &AutoLoginRequest { token: Some(token) },
            )
            .await;

        match result {
            Ok(response) => {
                *self.state.lock().unwrap() = SessionState::Authenticated {
                    user: response.user.clone(),
                };
                info!(user_id = %response.user.id, "auto login");
                Some(response.user)
            }
            Err(e) => {
                warn!(error = %e, "auto login failed, clearing session");
                self.deauthenticate();
                None
            }
        }
    }

    /// Never fails: the server call is best-effort, local state is cleared
    /// unconditionally.
    pub async fn logout(&self) {
        let _: Result<SimpleResponse, _> = self.gateway.get_json("/api/auth/logout").await;
        self.deauthenticate();
        self.notices.success("Logged out successfully");
        info!("logged out");
    }

    /// Drains pending gateway invalidation events. Each one performs the
    /// same clear-token transition as a failed auto-login.
    pub fn process_events(&self) {
        let mut events = self.events.lock().unwrap();
        let mut invalidated = false;
        while let Ok(event) = events.try_recv() {
            match event {
                SessionEvent::Invalidated => invalidated = true,
            }
        }
        if invalidated && self.is_authenticated() {
            warn!("session invalidated by server");
            self.deauthenticate();
            self.notices.error("Session expired, please sign in again");
        } else if invalidated {
            // Not signed in: just make sure no stale token lingers.
            self.tokens.clear();
        }
    }

    /// Requests a password-reset token for `email`.
    pub async fn forgot_password(&self, email: &str) -> Result<(), ClientError> {
        if !is_valid_email(email.trim()) {
            return Err(ClientError::Validation("Invalid email".into()));
        }
        let response: SimpleResponse = self
            .gateway
            .post_json(
                "/api/auth/forgot-password",
                &ForgotPasswordRequest {
                    email: Some(email.trim().to_string()),
                    ..Default::default()
                },
            )
            .await
            .map_err(GatewayError::into_persistence)?;
        self.notices.success(response.message);
        Ok(())
    }

    /// Redeems a reset token with a new password.
    pub async fn reset_password(
        &self,
        token: &str,
        new_password: &str,
    ) -> Result<(), ClientError> {
        if token.trim().is_empty() || new_password.is_empty() {
            return Err(ClientError::Validation(
                "token and new password are required".into(),
            ));
        }
        let response: SimpleResponse = self
            .gateway
            .post_json(
                "/api/auth/forgot-password",
                &ForgotPasswordRequest {
                    token: Some(token.trim().to_string()),
                    new_password: Some(new_password.to_string()),
                    ..Default::default()
                },
            )
            .await
            .map_err(GatewayError::into_persistence)?;
        self.notices.success(response.message);
        Ok(())
    }

    /// Uploads a new profile photo for the signed-in user.
    pub async fn change_profile_photo(
        &self,
        file: &ImageUpload,
    ) -> Result<ChangePhotoResponse, ClientError> {
        let user = self
            .current_user()
            .ok_or_else(|| ClientError::Validation("not signed in".into()))?;
        if !file.is_image() {
            return Err(ClientError::Validation(
                "only image files can be uploaded".into(),
            ));
        }

        let form = reqwest::multipart::Form::new()
            .part("photo", file.to_part()?)
            .text("email", user.email.clone());
        let response: ChangePhotoResponse = self
            .gateway
            .post_multipart("/api/auth/change-user-photo", form)
            .await
            .map_err(GatewayError::into_persistence)
            .map_err(|e| {
                self.notices.error("Upload failed");
                e
            })?;

        // Reflect the new picture locally without refetching the user.
        if let SessionState::Authenticated { user } = &mut *self.state.lock().unwrap() {
            user.profile_picture = Some(response.file.url.clone());
        }
        self.notices.success("Profile picture updated");
        Ok(response)
    }
}
