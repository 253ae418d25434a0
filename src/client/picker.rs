use std::collections::HashSet;
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};

use tracing::info;
use uuid::Uuid;

use crate::backgrounds::repo::Background;
use crate::client::error::ClientError;
use crate::client::gateway::{Gateway, GatewayError};
use crate::client::jobs::JobOrchestrator;
use crate::client::notify::Notices;
use crate::client::processor::{ImageUpload, OperationKind};
use crate::client::records::RecordMap;

/// The background-replacement dialog: a read-only catalog, a
/// single-selection set over it, and the add-new-background sub-flow.
pub struct BackgroundPicker {
    gateway: Arc<Gateway>,
    notices: Notices,
    jobs: Arc<JobOrchestrator>,
    catalog: Mutex<RecordMap<Background>>,
    // Set semantics with at most one member.
    selection: Mutex<HashSet<Uuid>>,
    open: AtomicBool,
    add_form_open: AtomicBool,
}

impl BackgroundPicker {
    pub fn new(gateway: Arc<Gateway>, notices: Notices, jobs: Arc<JobOrchestrator>) -> Self {
        Self {
            gateway,
            notices,
            jobs,
            catalog: Mutex::new(RecordMap::new()),
            selection: Mutex::new(HashSet::new()),
            open: AtomicBool::new(false),
            add_form_open: AtomicBool::new(false),
        }
    }

    pub fn open(&self) {
        self.open.store(true, Ordering::SeqCst);
    }

    /// Closing the dialog drops the selection and the add sub-form.
    pub fn close(&self) {
        self.open.store(false, Ordering::SeqCst);
        self.add_form_open.store(false, Ordering::SeqCst);
        self.selection.lock().unwrap().clear();
    }

    pub fn is_open(&self) -> bool {
        self.open.load(Ordering::SeqCst)
    }

    pub fn open_add_form(&self) {
        self.add_form_open.store(true, Ordering::SeqCst);
    }

    pub fn is_add_form_open(&self) -> bool {
        self.add_form_open.load(Ordering::SeqCst)
    }

    pub async fn refresh_catalog(&self) -> Result<(), ClientError> {
        let backgrounds: Vec<Background> = self
            .gateway
            .get_json("/api/backgrounds")
            .await
            .map_err(GatewayError::into_persistence)?;
        self.catalog.lock().unwrap().set_all(backgrounds);
        Ok(())
    }

    pub fn catalog_ids(&self) -> Vec<Uuid> {
        self.catalog.lock().unwrap().ids().to_vec()
    }

    /// Single-selection set: a new id replaces the previous one,
    /// re-selecting the current id toggles it off.
    pub fn select(&self, id: Uuid) {
        let mut selection = self.selection.lock().unwrap();
        if selection.contains(&id) {
            selection.remove(&id);
        } else {
            selection.clear();
            selection.insert(id);
        }
    }

    pub fn selected(&self) -> Option<Uuid> {
        self.selection.lock().unwrap().iter().next().copied()
    }

    pub fn selection_len(&self) -> usize {
        self.selection.lock().unwrap().len()
    }

    /// Uploads a new catalog entry. Name and file type are checked before
    /// any network call; success appends to the catalog and closes the add
    /// sub-form (the dialog itself stays open).
    pub async fn add_background(
        &self,
        name: &str,
        file: &ImageUpload,
    ) -> Result<Background, ClientError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(ClientError::Validation("Background name is required".into()));
        }
        if !file.is_image() {
            return Err(ClientError::Validation(
                "Only image files can be uploaded".into(),
            ));
        }

        let form = reqwest::multipart::Form::new()
            .part("photo", file.to_part()?)
            .text("backgroundName", name.to_string());
        let background: Background = self
            .gateway
            .post_multipart("/api/backgrounds", form)
            .await
            .map_err(GatewayError::into_persistence)
            .map_err(|e| {
                self.notices.error("Failed to add background");
                e
            })?;

        self.catalog.lock().unwrap().add_one(background.clone());
        self.add_form_open.store(false, Ordering::SeqCst);
        self.notices.success("Background added");
        info!(background_id = %background.id, "background added to catalog");
        Ok(background)
    }

    /// Delegates to the job orchestrator's replace-background kind. Both
    /// the source image and a selection must be present; checked locally
    /// before anything goes on the wire.
    pub async fn apply_replacement(
        &self,
        image: Option<&ImageUpload>,
    ) -> Result<(), ClientError> {
        let missing = || ClientError::Validation("Select a photo and a background first".into());
        let image = image.ok_or_else(missing)?;
        let selected = self.selected().ok_or_else(missing)?;
        let background_url = self
            .catalog
            .lock()
            .unwrap()
            .get(&selected)
            .map(|b| b.url.clone())
            .ok_or_else(missing)?;

        self.jobs
            .submit(
                OperationKind::ReplaceBackground,
                image.clone(),
                Some(background_url),
            )
            .await;
        self.close();
        Ok(())
    }
}
