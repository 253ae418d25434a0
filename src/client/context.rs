use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tracing::info;

use crate::auth::dto::PublicUser;
use crate::client::error::ClientError;
use crate::client::gateway::{Gateway, GatewayError};
use crate::client::jobs::JobOrchestrator;
use crate::client::notify::Notices;
use crate::client::picker::BackgroundPicker;
use crate::client::processor::{ImageUpload, ProcessorClient};
use crate::client::records::RecordMap;
use crate::client::session::SessionController;
use crate::client::token::TokenStore;
use crate::pictures::repo::Picture;
use crate::user_pictures::repo::UserPicture;

/// The whole client session in one place: token store, gateway, session
/// state, the job slot and the record caches. Built once at startup,
/// discarded on reload.
pub struct AppContext {
    pub tokens: Arc<TokenStore>,
    pub gateway: Arc<Gateway>,
    pub notices: Notices,
    pub session: SessionController,
    pub jobs: Arc<JobOrchestrator>,
    pub picker: BackgroundPicker,
    pub pictures: Arc<Mutex<RecordMap<Picture>>>,
    pub user_pictures: Arc<Mutex<RecordMap<UserPicture>>>,
}

impl AppContext {
    /// `token_path` enables cross-session persistence of the bearer token;
    /// `None` keeps it in memory (tests).
    pub fn new(
        api_base_url: impl Into<String>,
        processor_base_url: impl Into<String>,
        token_path: Option<PathBuf>,
    ) -> Self {
        let tokens = Arc::new(match token_path {
            Some(path) => TokenStore::persisted(path),
            None => TokenStore::ephemeral(),
        });
        let notices = Notices::new();
        let (gateway, events) = Gateway::new(api_base_url, tokens.clone());
        let gateway = Arc::new(gateway);

        let user_pictures = Arc::new(Mutex::new(RecordMap::new()));
        let jobs = Arc::new(JobOrchestrator::new(
            ProcessorClient::new(processor_base_url),
            gateway.clone(),
            notices.clone(),
            user_pictures.clone(),
        ));
        let session =
            SessionController::new(gateway.clone(), tokens.clone(), notices.clone(), events);
        let picker = BackgroundPicker::new(gateway.clone(), notices.clone(), jobs.clone());

        Self {
            tokens,
            gateway,
            notices,
            session,
            jobs,
            picker,
            pictures: Arc::new(Mutex::new(RecordMap::new())),
            user_pictures,
        }
    }

    /// App bootstrap: attempt auto-login when a persisted token exists.
    pub async fn bootstrap(&self) -> Option<PublicUser> {
        if !self.tokens.is_present() {
            return None;
        }
        self.session.auto_login().await
    }

    pub async fn refresh_pictures(&self) -> Result<(), ClientError> {
        let pictures: Vec<Picture> = self
            .gateway
            .get_json("/api/pictures")
            .await
            .map_err(GatewayError::into_persistence)?;
        self.pictures.lock().unwrap().set_all(pictures);
        Ok(())
    }

    pub async fn refresh_user_pictures(&self) -> Result<(), ClientError> {
        let pictures: Vec<UserPicture> = self
            .gateway
            .get_json("/api/userPictures")
            .await
            .map_err(GatewayError::into_persistence)?;
        self.user_pictures.lock().unwrap().set_all(pictures);
        Ok(())
    }

    /// Anonymous upload into the shared pictures collection.
    pub async fn upload_picture(&self, file: &ImageUpload) -> Result<Picture, ClientError> {
        if !file.is_image() {
            return Err(ClientError::Validation(
                "Only image files can be uploaded".into(),
            ));
        }
        let form = reqwest::multipart::Form::new().part("photo", file.to_part()?);
        let picture: Picture = self
            .gateway
            .post_multipart("/api/pictures", form)
            .await
            .map_err(GatewayError::into_persistence)
            .map_err(|e| {
                self.notices.error("Failed to upload photo");
                e
            })?;
        self.pictures.lock().unwrap().add_one(picture.clone());
        self.notices.success("Photo uploaded");
        Ok(picture)
    }

    /// Logout plus teardown of every piece of session-derived state.
    pub async fn logout(&self) {
        self.session.logout().await;
        self.jobs.reset();
        self.picker.close();
        self.user_pictures.lock().unwrap().clear();
        info!("session torn down");
    }
}
