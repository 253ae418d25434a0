use thiserror::Error;

/// Closed error taxonomy for every client-side operation. Validation is
/// always raised before any network call; everything else classifies a
/// failed request.
#[derive(Error, Debug)]
pub enum ClientError {
    /// Rejected locally: empty required fields, wrong file type, missing
    /// selection.
    #[error("{0}")]
    Validation(String),

    /// Invalid credentials or an invalid/expired token.
    #[error("{0}")]
    Auth(String),

    /// Backend read/write failure (including transport faults reaching it).
    #[error("{0}")]
    Persistence(String),

    /// External processor failure. Detail is opaque and surfaced as-is.
    #[error("{0}")]
    Upstream(String),
}

impl ClientError {
    pub fn is_validation(&self) -> bool {
        matches!(self, ClientError::Validation(_))
    }

    pub fn is_auth(&self) -> bool {
        matches!(self, ClientError::Auth(_))
    }
}
