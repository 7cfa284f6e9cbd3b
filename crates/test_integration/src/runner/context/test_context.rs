use app_state::{AppSettings, load_settings_from_path};
use color_eyre::Result;
use std::path::Path;
use tracing::info;

/// Shared configuration for the integration suite. Every test builds its own session from it.
pub struct TestContext {
    pub settings: AppSettings,
}

impl TestContext {
    pub fn new() -> Result<Self> {
        info!("Setting up test environment...");
        let settings_path = Path::new(env!("CARGO_MANIFEST_DIR")).join("assets/settings.yaml");
        let settings = load_settings_from_path(&settings_path, false)?;
        info!(
            "Test environment is ready (provider timeout {:?}).",
            settings.constants.provider_timeout
        );
        Ok(Self { settings })
    }
}
