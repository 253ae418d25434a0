//! PhotoGlow: a photo-enhancement application split into the REST backend
//! (auth, uploads, galleries, background catalog) and the client core that
//! drives it (session controller, job orchestrator, record maps).

pub mod app;
pub mod auth;
pub mod backgrounds;
pub mod client;
pub mod config;
pub mod error;
pub mod pictures;
pub mod state;
pub mod storage;
pub mod user_pictures;
