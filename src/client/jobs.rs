use std::sync::{Arc, Mutex};

use serde_json::json;
use tracing::{debug, info};
use uuid::Uuid;

use crate::client::error::ClientError;
use crate::client::gateway::{Gateway, GatewayError};
use crate::client::notify::Notices;
use crate::client::processor::{ImageUpload, OperationKind, ProcessorClient, ProcessorOutput};
use crate::client::records::RecordMap;
use crate::user_pictures::repo::UserPicture;

/// The single job slot. Starting any operation moves it to `Pending`,
/// discarding whatever the previous operation left behind.
#[derive(Debug, Clone)]
pub enum JobState {
    Idle,
    Pending,
    Success(ProcessorOutput),
    Failed(String),
}

impl JobState {
    pub fn is_pending(&self) -> bool {
        matches!(self, JobState::Pending)
    }

    pub fn result_ref(&self) -> Option<&str> {
        match self {
            JobState::Success(output) => output.image_ref(),
            _ => None,
        }
    }
}

struct JobSlot {
    seq: u64,
    state: JobState,
}

/// Coordinates the one outstanding processing request. Submissions are
/// stamped with a sequence number; a response whose stamp is no longer
/// current is dropped instead of clobbering a newer submission.
pub struct JobOrchestrator {
    processor: ProcessorClient,
    gateway: Arc<Gateway>,
    notices: Notices,
    slot: Mutex<JobSlot>,
    user_pictures: Arc<Mutex<RecordMap<UserPicture>>>,
}

impl JobOrchestrator {
    pub fn new(
        processor: ProcessorClient,
        gateway: Arc<Gateway>,
        notices: Notices,
        user_pictures: Arc<Mutex<RecordMap<UserPicture>>>,
    ) -> Self {
        Self {
            processor,
            gateway,
            notices,
            slot: Mutex::new(JobSlot {
                seq: 0,
                state: JobState::Idle,
            }),
            user_pictures,
        }
    }

    pub fn state(&self) -> JobState {
        self.slot.lock().unwrap().state.clone()
    }

    /// Part of session teardown.
    pub fn reset(&self) {
        self.slot.lock().unwrap().state = JobState::Idle;
    }

    /// Submits one operation. The slot goes `Pending` immediately (clearing
    /// any previous success or error data), then `Success`/`Failed` when
    /// this submission's response lands, unless a newer submission has
    /// taken the slot in the meantime.
    pub async fn submit(
        &self,
        kind: OperationKind,
        image: ImageUpload,
        background: Option<String>,
    ) {
        let my_seq = {
            let mut slot = self.slot.lock().unwrap();
            slot.seq += 1;
            slot.state = JobState::Pending;
            slot.seq
        };

        let result = self
            .processor
            .process(kind, &image, background.as_deref())
            .await;

        let mut slot = self.slot.lock().unwrap();
        if slot.seq != my_seq {
            debug!(?kind, stale_seq = my_seq, current_seq = slot.seq, "discarding stale response");
            return;
        }
        match result {
            Ok(output) => {
                if let ProcessorOutput::Analysis(analysis) = &output {
                    self.notices.success(analysis.summary());
                }
                info!(?kind, "operation completed");
                slot.state = JobState::Success(output);
            }
            Err(e) => {
                self.notices.error("operation failed");
                slot.state = JobState::Failed(e.to_string());
            }
        }
    }

    /// Persists a success result as a permanent `UserPicture` and refreshes
    /// the user's collection. Not deduplicated: promoting twice stores two
    /// records.
    pub async fn promote(&self, user_id: Uuid, url: &str) -> Result<UserPicture, ClientError> {
        let created: UserPicture = self
            .gateway
            .post_json(
                "/api/userPictures",
                &json!({ "userId": user_id, "url": url }),
            )
            .await
            .map_err(GatewayError::into_persistence)?;

        let all: Vec<UserPicture> = self
            .gateway
            .get_json("/api/userPictures")
            .await
            .map_err(GatewayError::into_persistence)?;
        self.user_pictures.lock().unwrap().set_all(all);

        self.notices.success("Photo saved to your gallery");
        info!(user_picture_id = %created.id, "result promoted");
        Ok(created)
    }
}
