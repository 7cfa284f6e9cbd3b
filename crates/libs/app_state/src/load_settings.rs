use crate::{AppSettings, RawSettings};
use color_eyre::eyre::{Result, WrapErr};
use std::path::Path;
use std::sync::LazyLock;
use tracing::debug;

const DEFAULT_SETTINGS_PATH: &str = "config/settings.yaml";

/// Loads settings from a yaml file, optionally overridden by `APP__`-prefixed env vars.
pub fn load_settings_from_path(path: &Path, load_env: bool) -> Result<AppSettings> {
    let config_path = path
        .canonicalize()
        .wrap_err_with(|| format!("Settings file not found: {}", path.display()))?;

    let mut builder = config::Config::builder().add_source(config::File::from(config_path));
    if load_env {
        // Need to load from dotenv to get it to overwrite the api key from env.
        dotenv::from_path(".env").ok();
        builder = builder.add_source(
            config::Environment::with_prefix("APP")
                .separator("__")
                .try_parsing(true),
        );
    }

    let raw_settings = builder.build()?.try_deserialize::<RawSettings>()?;
    debug!("Loaded settings from {}", path.display());
    Ok(raw_settings.into())
}

pub fn load_app_settings() -> Result<AppSettings> {
    load_settings_from_path(Path::new(DEFAULT_SETTINGS_PATH), true)
}

pub static SETTINGS: LazyLock<AppSettings> =
    LazyLock::new(|| load_app_settings().expect("Cannot load app settings."));

#[must_use]
pub fn settings() -> &'static AppSettings {
    &SETTINGS
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MIN_RECAP_ID_LENGTH, ResolutionFallback};
    use std::io::Write;
    use std::time::Duration;

    #[test]
    fn test_load_from_path() -> Result<()> {
        let mut file = tempfile::Builder::new().suffix(".yaml").tempfile()?;
        writeln!(
            file,
            r#"
logging:
  level: debug
entitlement:
  api_key: "  "
constants:
  provider_timeout_ms: 2500
  identity_event_buffer: 0
  recap_id_length: 0
  resolution_fallback: shared_only
"#
        )?;

        let settings = load_settings_from_path(file.path(), false)?;

        assert_eq!(settings.logging.level, "debug");
        assert_eq!(settings.entitlement.api_key, None);
        assert_eq!(settings.constants.provider_timeout, Duration::from_millis(2500));
        assert_eq!(settings.constants.identity_event_buffer, 1);
        assert_eq!(settings.constants.recap_id_length, MIN_RECAP_ID_LENGTH);
        assert_eq!(
            settings.constants.resolution_fallback,
            ResolutionFallback::SharedOnly
        );
        Ok(())
    }

    #[test]
    fn test_missing_file_is_an_error() {
        assert!(load_settings_from_path(Path::new("does/not/exist.yaml"), false).is_err());
    }
}
