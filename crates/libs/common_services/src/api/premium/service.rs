use crate::api::premium::interfaces::{GateDecision, Navigator};
use common_types::EntitlementView;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum GatePhase {
    Loading,
    Granted,
    Denied,
}

/// Guards premium content behind an active entitlement.
///
/// The upsell redirect fires on the edge into the settled-and-inactive phase, so repeated
/// evaluations with an unchanged snapshot never navigate twice.
pub struct PremiumGate<T> {
    children: T,
    fallback: Option<T>,
    navigator: Arc<dyn Navigator>,
    phase: GatePhase,
}

impl<T> PremiumGate<T> {
    pub fn new(children: T, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            children,
            fallback: None,
            navigator,
            phase: GatePhase::Loading,
        }
    }

    #[must_use]
    pub fn with_fallback(mut self, fallback: T) -> Self {
        self.fallback = Some(fallback);
        self
    }

    pub fn evaluate(&mut self, view: &EntitlementView) -> GateDecision {
        let next = if view.loading {
            GatePhase::Loading
        } else if view.is_active() {
            GatePhase::Granted
        } else {
            GatePhase::Denied
        };

        if next == GatePhase::Denied && self.phase != GatePhase::Denied {
            info!("Premium content locked, redirecting to upsell");
            self.navigator.navigate_to_upsell();
        }
        self.phase = next;

        match next {
            GatePhase::Loading => GateDecision::Nothing,
            GatePhase::Granted => GateDecision::Children,
            GatePhase::Denied => GateDecision::Fallback,
        }
    }

    /// Evaluates `view` and returns the content to show, if any.
    pub fn render(&mut self, view: &EntitlementView) -> Option<&T> {
        match self.evaluate(view) {
            GateDecision::Nothing => None,
            GateDecision::Children => Some(&self.children),
            GateDecision::Fallback => self.fallback.as_ref(),
        }
    }
}
