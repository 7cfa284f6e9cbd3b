use serde::Serialize;

/// The navigation collaborator. Implementations must not block, navigation is fire-and-forget.
pub trait Navigator: Send + Sync {
    fn navigate_to_upsell(&self);
}

/// What a gate shows for a given entitlement snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GateDecision {
    /// Entitlement is still loading, show neither children nor fallback.
    Nothing,
    Children,
    Fallback,
}
