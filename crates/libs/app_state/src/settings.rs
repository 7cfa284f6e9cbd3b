use crate::{AppConstants, EntitlementSettings, LoggingSettings, RawSettings};

#[derive(Debug, Clone)]
pub struct AppSettings {
    pub logging: LoggingSettings,
    pub entitlement: EntitlementSettings,
    pub constants: AppConstants,
}

impl From<RawSettings> for AppSettings {
    fn from(raw: RawSettings) -> Self {
        // An empty env override means "no key", same as leaving it out.
        let api_key = raw
            .entitlement
            .api_key
            .map(|k| k.trim().to_owned())
            .filter(|k| !k.is_empty());

        Self {
            logging: raw.logging,
            entitlement: EntitlementSettings { api_key },
            constants: raw.constants.into(),
        }
    }
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            logging: LoggingSettings {
                level: "info".to_owned(),
            },
            entitlement: EntitlementSettings::default(),
            constants: AppConstants::default(),
        }
    }
}
