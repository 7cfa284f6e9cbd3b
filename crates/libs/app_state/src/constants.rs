use crate::{RawConstants, ResolutionFallback};
use std::time::Duration;

/// Lower bound for configured recap id lengths.
pub const MIN_RECAP_ID_LENGTH: usize = 8;

#[derive(Debug, Clone)]
pub struct AppConstants {
    pub provider_timeout: Duration,
    pub identity_event_buffer: usize,
    pub recap_id_length: usize,
    pub resolution_fallback: ResolutionFallback,
}

impl From<RawConstants> for AppConstants {
    fn from(raw: RawConstants) -> Self {
        Self {
            provider_timeout: Duration::from_millis(raw.provider_timeout_ms),
            identity_event_buffer: raw.identity_event_buffer.max(1),
            recap_id_length: raw.recap_id_length.max(MIN_RECAP_ID_LENGTH),
            resolution_fallback: raw.resolution_fallback,
        }
    }
}

impl Default for AppConstants {
    fn default() -> Self {
        Self {
            provider_timeout: Duration::from_secs(10),
            identity_event_buffer: 64,
            recap_id_length: 12,
            resolution_fallback: ResolutionFallback::FullAccess,
        }
    }
}
