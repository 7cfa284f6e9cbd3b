use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct RawSettings {
    pub logging: LoggingSettings,
    pub entitlement: EntitlementSettings,
    pub constants: RawConstants,
}

/// Logging configuration.
#[derive(Debug, Deserialize, Clone)]
pub struct LoggingSettings {
    pub level: String,
}

/// Credentials for the subscription provider.
#[derive(Debug, Deserialize, Clone, Default)]
pub struct EntitlementSettings {
    /// Absent until a build provisions the key, sync stays dormant until then.
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct RawConstants {
    /// Upper bound for a single call into an external provider.
    pub provider_timeout_ms: u64,
    /// Capacity of the identity-change broadcast channel.
    pub identity_event_buffer: usize,
    /// Length of generated recap and notification ids.
    pub recap_id_length: usize,
    pub resolution_fallback: ResolutionFallback,
}

/// What the account resolver assumes when the account-status lookup fails.
#[derive(Debug, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ResolutionFallback {
    /// Treat the user as a full account with no shared access, so nobody gets locked out.
    #[default]
    FullAccess,
    /// Treat the user as a shared account, the most restrictive tier.
    SharedOnly,
}
