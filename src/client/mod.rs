//! Client core: the state the UI drives. Owns the bearer token, the single
//! in-flight job slot, the session state machine and the normalized record
//! caches mirroring server collections.

pub mod context;
pub mod error;
pub mod gateway;
pub mod jobs;
pub mod notify;
pub mod picker;
pub mod processor;
pub mod records;
pub mod session;
pub mod token;

pub use context::AppContext;
pub use error::ClientError;
pub use gateway::{Gateway, SessionEvent};
pub use jobs::{JobOrchestrator, JobState};
pub use notify::{Notice, NoticeLevel, Notices};
pub use picker::BackgroundPicker;
pub use processor::{AestheticAnalysis, ImageUpload, OperationKind, ProcessorOutput};
pub use records::RecordMap;
pub use session::{SessionController, SessionState};
pub use token::TokenStore;
