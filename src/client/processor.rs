use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::client::error::ClientError;

/// The fixed set of image transformations the external processor offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OperationKind {
    AutoEnhance,
    AestheticAnalysis,
    StyleTransfer,
    RemoveBackground,
    ReplaceBackground,
    FaceEnhance,
}

impl OperationKind {
    pub fn endpoint(&self) -> &'static str {
        match self {
            OperationKind::AutoEnhance => "/auto-enhance",
            OperationKind::AestheticAnalysis => "/analyze-aesthetic",
            OperationKind::StyleTransfer => "/vangogh-style",
            OperationKind::RemoveBackground => "/remove-background",
            OperationKind::ReplaceBackground => "/replace-background",
            OperationKind::FaceEnhance => "/enhance-face",
        }
    }

    /// The analysis kind answers with a structured score object instead of
    /// a processed-image reference.
    pub fn is_analysis(&self) -> bool {
        matches!(self, OperationKind::AestheticAnalysis)
    }
}

/// Binary payload handed to the processor (and to the upload endpoints).
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(
        file_name: impl Into<String>,
        content_type: impl Into<String>,
        bytes: Vec<u8>,
    ) -> Self {
        Self {
            file_name: file_name.into(),
            content_type: content_type.into(),
            bytes,
        }
    }

    pub fn is_image(&self) -> bool {
        self.content_type.starts_with("image/")
    }

    pub(crate) fn to_part(&self) -> Result<reqwest::multipart::Part, ClientError> {
        reqwest::multipart::Part::bytes(self.bytes.clone())
            .file_name(self.file_name.clone())
            .mime_str(&self.content_type)
            .map_err(|e| ClientError::Validation(e.to_string()))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Composition {
    pub aspect_ratio: f64,
    pub follows_rule_of_thirds: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Exposure {
    pub brightness: f64,
    pub is_well_exposed: bool,
}

/// Structured result of the aesthetic-analysis kind.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AestheticAnalysis {
    pub score: f64,
    pub composition: Composition,
    pub exposure: Exposure,
    pub suggestions: Vec<String>,
}

impl AestheticAnalysis {
    /// One-line rendering for the transient notice.
    pub fn summary(&self) -> String {
        if self.suggestions.is_empty() {
            format!("Aesthetic score {:.1}/10", self.score)
        } else {
            format!(
                "Aesthetic score {:.1}/10 — {}",
                self.score,
                self.suggestions.join("; ")
            )
        }
    }
}

/// What a completed job produced.
#[derive(Debug, Clone)]
pub enum ProcessorOutput {
    /// Path reference to the processed image on the processor's store.
    Image(String),
    Analysis(AestheticAnalysis),
}

impl ProcessorOutput {
    pub fn image_ref(&self) -> Option<&str> {
        match self {
            ProcessorOutput::Image(path) => Some(path),
            ProcessorOutput::Analysis(_) => None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct ProcessedImageResponse {
    processed_image: String,
}

#[derive(Debug, Deserialize)]
struct ProcessorErrorBody {
    error: Option<String>,
}

/// Thin client over the six fixed processor endpoints. No auth, no retry;
/// failures are opaque `Upstream` errors.
pub struct ProcessorClient {
    http: reqwest::Client,
    base_url: String,
}

impl ProcessorClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub async fn process(
        &self,
        kind: OperationKind,
        image: &ImageUpload,
        background: Option<&str>,
    ) -> Result<ProcessorOutput, ClientError> {
        let mut form = reqwest::multipart::Form::new().part("photo", image.to_part()?);
        if let Some(background) = background {
            form = form.text("background", background.to_string());
        }

        let url = format!("{}{}", self.base_url, kind.endpoint());
        debug!(%url, ?kind, "submitting to processor");
        let response = self
            .http
            .post(&url)
            .multipart(form)
            .send()
            .await
            .map_err(|e| ClientError::Upstream(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let detail = response
                .json::<ProcessorErrorBody>()
                .await
                .ok()
                .and_then(|b| b.error)
                .unwrap_or_else(|| status.to_string());
            return Err(ClientError::Upstream(detail));
        }

        if kind.is_analysis() {
            let analysis = response
                .json::<AestheticAnalysis>()
                .await
                .map_err(|e| ClientError::Upstream(e.to_string()))?;
            Ok(ProcessorOutput::Analysis(analysis))
        } else {
            let body = response
                .json::<ProcessedImageResponse>()
                .await
                .map_err(|e| ClientError::Upstream(e.to_string()))?;
            Ok(ProcessorOutput::Image(body.processed_image))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_are_fixed() {
        assert_eq!(OperationKind::AutoEnhance.endpoint(), "/auto-enhance");
        assert_eq!(
            OperationKind::AestheticAnalysis.endpoint(),
            "/analyze-aesthetic"
        );
        assert_eq!(OperationKind::StyleTransfer.endpoint(), "/vangogh-style");
        assert_eq!(
            OperationKind::RemoveBackground.endpoint(),
            "/remove-background"
        );
        assert_eq!(
            OperationKind::ReplaceBackground.endpoint(),
            "/replace-background"
        );
        assert_eq!(OperationKind::FaceEnhance.endpoint(), "/enhance-face");
        assert!(OperationKind::AestheticAnalysis.is_analysis());
        assert!(!OperationKind::AutoEnhance.is_analysis());
    }

    #[test]
    fn analysis_summary_includes_suggestions() {
        let analysis = AestheticAnalysis {
            score: 7.2,
            composition: Composition {
                aspect_ratio: 1.5,
                follows_rule_of_thirds: true,
            },
            exposure: Exposure {
                brightness: 120.0,
                is_well_exposed: true,
            },
            suggestions: vec!["Consider recomposing using the rule of thirds".into()],
        };
        let summary = analysis.summary();
        assert!(summary.contains("7.2"));
        assert!(summary.contains("rule of thirds"));
    }
}
