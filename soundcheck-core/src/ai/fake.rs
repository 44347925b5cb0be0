//! Fake vision model for testing.
//!
//! Returns deterministic responses based on prompt matching, allowing tests
//! to run without network access or API costs.

use super::{ImagePart, VisionError, VisionModel};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::RwLock;

/// A fake vision model for testing.
///
/// Responses are matched by checking if the prompt contains a registered
/// substring. If no match is found, returns a default response or error.
/// Calls are counted so tests can assert the model was (or was not) consulted.
#[derive(Debug)]
pub struct FakeVisionModel {
    /// Map of prompt substring -> response
    responses: RwLock<HashMap<String, String>>,
    /// Default response if no match found
    default_response: Option<String>,
    /// If set, every call fails with this message
    error: Option<String>,
    calls: AtomicUsize,
}

impl Default for FakeVisionModel {
    fn default() -> Self {
        Self {
            responses: RwLock::new(HashMap::new()),
            default_response: Some("{}".to_string()),
            error: None,
            calls: AtomicUsize::new(0),
        }
    }
}

#[allow(dead_code)]
impl FakeVisionModel {
    /// Create a new FakeVisionModel with no registered responses.
    pub fn new() -> Self {
        Self {
            responses: RwLock::new(HashMap::new()),
            default_response: None,
            error: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Create a FakeVisionModel that returns a specific response for prompts
    /// containing a substring.
    pub fn with_response(prompt_contains: &str, response: &str) -> Self {
        let mut model = Self::new();
        model.add_response(prompt_contains, response);
        model
    }

    /// Add a response for prompts containing a specific substring.
    pub fn add_response(&mut self, prompt_contains: &str, response: &str) {
        self.responses
            .write()
            .unwrap()
            .insert(prompt_contains.to_string(), response.to_string());
    }

    /// Set the default response when no pattern matches.
    pub fn with_default_response(mut self, response: &str) -> Self {
        self.default_response = Some(response.to_string());
        self
    }

    /// Create a FakeVisionModel whose every call fails.
    pub fn failing(error: &str) -> Self {
        Self {
            responses: RwLock::new(HashMap::new()),
            default_response: None,
            error: Some(error.to_string()),
            calls: AtomicUsize::new(0),
        }
    }

    /// How many times generate() has been called.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl VisionModel for FakeVisionModel {
    async fn generate(&self, prompt: &str, _images: &[ImagePart]) -> Result<String, VisionError> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = &self.error {
            return Err(VisionError::RequestFailed(error.clone()));
        }

        let responses = self.responses.read().unwrap();

        // Find first matching pattern (case-insensitive)
        let prompt_lower = prompt.to_lowercase();
        for (pattern, response) in responses.iter() {
            if prompt_lower.contains(&pattern.to_lowercase()) {
                return Ok(response.clone());
            }
        }

        // Return default or error
        match &self.default_response {
            Some(response) => Ok(response.clone()),
            None => Err(VisionError::RequestFailed(format!(
                "FakeVisionModel: No response configured for prompt (first 100 chars): {}",
                &prompt[..prompt.len().min(100)]
            ))),
        }
    }

    fn model_name(&self) -> &str {
        "fake-vision"
    }
}
