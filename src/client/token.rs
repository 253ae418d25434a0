use std::path::PathBuf;
use std::sync::RwLock;

use tracing::warn;

/// Holds the bearer credential. With a backing path the token survives
/// restarts; without one it lives for the session only.
pub struct TokenStore {
    path: Option<PathBuf>,
    token: RwLock<Option<String>>,
}

impl TokenStore {
    pub fn ephemeral() -> Self {
        Self {
            path: None,
            token: RwLock::new(None),
        }
    }

    /// Loads any previously persisted token from `path`.
    pub fn persisted(path: PathBuf) -> Self {
        let token = match std::fs::read_to_string(&path) {
            Ok(contents) => {
                let trimmed = contents.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Err(_) => None,
        };
        Self {
            path: Some(path),
            token: RwLock::new(token),
        }
    }

    pub fn get(&self) -> Option<String> {
        self.token.read().unwrap().clone()
    }

    pub fn is_present(&self) -> bool {
        self.token.read().unwrap().is_some()
    }

    pub fn set(&self, token: &str) {
        *self.token.write().unwrap() = Some(token.to_string());
        if let Some(path) = &self.path {
            if let Err(e) = std::fs::write(path, token) {
                warn!(error = %e, "failed to persist token");
            }
        }
    }

    pub fn clear(&self) {
        *self.token.write().unwrap() = None;
        if let Some(path) = &self.path {
            if let Err(e) = std::fs::remove_file(path) {
                if e.kind() != std::io::ErrorKind::NotFound {
                    warn!(error = %e, "failed to remove persisted token");
                }
            }
        }
    }
}
