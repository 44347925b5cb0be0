//! Vision model abstraction for photo arbitration.
//!
//! This module provides a trait-based abstraction over multimodal models
//! (Gemini today) so the pipeline can be tested without network access.

mod fake;
mod gemini;

pub use fake::FakeVisionModel;
pub use gemini::{GeminiClient, GeminiConfig};

use async_trait::async_trait;
use std::fmt;
use thiserror::Error;

/// Error type for vision model operations.
#[derive(Debug, Error)]
pub enum VisionError {
    #[error("API request failed: {0}")]
    RequestFailed(String),

    #[error("API returned error: {status} - {message}")]
    ApiError { status: u16, message: String },

    #[error("Failed to parse response: {0}")]
    ParseError(String),

    #[error("Model not configured: {0}")]
    NotConfigured(String),
}

/// An inline image attached to a prompt.
#[derive(Debug, Clone)]
pub struct ImagePart {
    pub mime_type: String,
    pub data: Vec<u8>,
}

/// Trait for multimodal vision models.
///
/// Implementations should be stateless and thread-safe. The model is
/// responsible for making API calls and returning the raw text response.
#[async_trait]
pub trait VisionModel: Send + Sync + fmt::Debug {
    /// Send a prompt plus inline images and get a text response.
    async fn generate(&self, prompt: &str, images: &[ImagePart]) -> Result<String, VisionError>;

    /// Get the model name (e.g., "gemini-2.0-flash").
    fn model_name(&self) -> &str;
}

/// Build a vision model from the environment, if one is configured.
///
/// Arbitration is strictly optional: an unset GEMINI_API_KEY means the
/// pipeline runs on the ranking heuristic alone, so an unconfigured model
/// is `None` rather than an error.
pub fn vision_model_from_env() -> Option<Box<dyn VisionModel>> {
    match GeminiConfig::from_env() {
        Ok(config) => Some(Box::new(GeminiClient::new(config))),
        Err(e) => {
            tracing::debug!("vision model not configured: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    // The server converts the factory's boxed model into the shared handle
    // the pipeline holds; the binding needs the explicit type.
    #[test]
    fn boxed_model_converts_to_shared_handle() {
        let boxed: Option<Box<dyn VisionModel>> = Some(Box::new(FakeVisionModel::default()));
        let shared: Option<Arc<dyn VisionModel>> = boxed.map(Arc::from);
        let name = shared.map(|model| model.model_name().to_string());
        assert_eq!(name.as_deref(), Some("fake-vision"));
    }
}
