use std::sync::Arc;

use axum::http::StatusCode;
use serde::de::DeserializeOwned;
use serde::Serialize;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, warn};

use crate::client::error::ClientError;
use crate::client::token::TokenStore;

/// Emitted by the gateway when the backend rejects a bearer token. The
/// session controller consumes these and performs the normal
/// clear-token-and-unauthenticate transition; navigation stays with the
/// embedding UI.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionEvent {
    Invalidated,
}

#[derive(Error, Debug)]
pub enum GatewayError {
    #[error("{message}")]
    Unauthorized { message: String },

    #[error("{message}")]
    Status { status: StatusCode, message: String },

    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

impl GatewayError {
    /// Classification for session operations: everything is an auth
    /// failure except transport faults, which are persistence.
    pub fn into_auth(self) -> ClientError {
        match self {
            GatewayError::Unauthorized { message } => ClientError::Auth(message),
            GatewayError::Status { message, .. } => ClientError::Auth(message),
            GatewayError::Transport(e) => ClientError::Persistence(e.to_string()),
        }
    }

    /// Classification for record-store operations: unauthorized stays an
    /// auth failure, everything else is persistence.
    pub fn into_persistence(self) -> ClientError {
        match self {
            GatewayError::Unauthorized { message } => ClientError::Auth(message),
            GatewayError::Status { message, .. } => ClientError::Persistence(message),
            GatewayError::Transport(e) => ClientError::Persistence(e.to_string()),
        }
    }
}

/// Single configured request pipeline to the backend: attaches the bearer
/// token to every request and turns `401`s into session events.
pub struct Gateway {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<TokenStore>,
    events: mpsc::UnboundedSender<SessionEvent>,
}

impl Gateway {
    pub fn new(
        base_url: impl Into<String>,
        tokens: Arc<TokenStore>,
    ) -> (Self, mpsc::UnboundedReceiver<SessionEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let gateway = Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            tokens,
            events: tx,
        };
        (gateway, rx)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorize(&self, req: reqwest::RequestBuilder) -> reqwest::RequestBuilder {
        match self.tokens.get() {
            Some(token) => req.bearer_auth(token),
            None => req,
        }
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, GatewayError> {
        let req = self.authorize(self.http.get(self.url(path)));
        self.dispatch(req).await
    }

    pub async fn post_json<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, GatewayError> {
        let req = self.authorize(self.http.post(self.url(path)).json(body));
        self.dispatch(req).await
    }

    /// reqwest derives the multipart boundary content-type itself.
    pub async fn post_multipart<T: DeserializeOwned>(
        &self,
        path: &str,
        form: reqwest::multipart::Form,
    ) -> Result<T, GatewayError> {
        let req = self.authorize(self.http.post(self.url(path)).multipart(form));
        self.dispatch(req).await
    }

    async fn dispatch<T: DeserializeOwned>(
        &self,
        req: reqwest::RequestBuilder,
    ) -> Result<T, GatewayError> {
        let response = req.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::UNAUTHORIZED {
            warn!("request unauthorized, emitting session invalidation");
            let _ = self.events.send(SessionEvent::Invalidated);
            let message = extract_message(response).await;
            return Err(GatewayError::Unauthorized { message });
        }
        if !status.is_success() {
            let message = extract_message(response).await;
            debug!(%status, %message, "request rejected");
            return Err(GatewayError::Status {
                status: StatusCode::from_u16(status.as_u16())
                    .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR),
                message,
            });
        }

        Ok(response.json::<T>().await?)
    }
}

/// Pulls the server's `{message}` out of an error body, falling back to the
/// status line.
async fn extract_message(response: reqwest::Response) -> String {
    let status = response.status();
    match response.json::<serde_json::Value>().await {
        Ok(body) => body
            .get("message")
            .and_then(|m| m.as_str())
            .map(|s| s.to_string())
            .unwrap_or_else(|| status.to_string()),
        Err(_) => status.to_string(),
    }
}
