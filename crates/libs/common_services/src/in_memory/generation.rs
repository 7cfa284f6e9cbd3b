use crate::api::recap::error::RecapError;
use crate::api::recap::interfaces::{GenerationRequest, GenerationService};
use crate::utils::lock;
use async_trait::async_trait;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, Ordering};

/// Accepts generation requests and keeps them, completion is up to the caller.
#[derive(Default)]
pub struct RecordingGenerationService {
    requests: Mutex<Vec<GenerationRequest>>,
    rejecting: AtomicBool,
}

impl RecordingGenerationService {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_rejecting(&self, rejecting: bool) {
        self.rejecting.store(rejecting, Ordering::SeqCst);
    }

    #[must_use]
    pub fn requests(&self) -> Vec<GenerationRequest> {
        lock(&self.requests).clone()
    }
}

#[async_trait]
impl GenerationService for RecordingGenerationService {
    async fn request_generation(&self, request: GenerationRequest) -> Result<(), RecapError> {
        if self.rejecting.load(Ordering::SeqCst) {
            return Err(RecapError::GenerationRejected(
                "generation queue is full".to_owned(),
            ));
        }
        lock(&self.requests).push(request);
        Ok(())
    }
}
