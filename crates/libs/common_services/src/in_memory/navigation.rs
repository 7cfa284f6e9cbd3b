use crate::api::premium::interfaces::Navigator;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

/// Counts upsell redirects instead of navigating.
#[derive(Default)]
pub struct RecordingNavigator {
    upsells: AtomicUsize,
}

impl RecordingNavigator {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn upsell_count(&self) -> usize {
        self.upsells.load(Ordering::SeqCst)
    }
}

impl Navigator for RecordingNavigator {
    fn navigate_to_upsell(&self) {
        let count = self.upsells.fetch_add(1, Ordering::SeqCst) + 1;
        debug!("Navigating to upsell ({count})");
    }
}
