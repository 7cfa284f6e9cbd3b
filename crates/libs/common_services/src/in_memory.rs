//! In-memory collaborators for the developer harness and tests.
//!
//! Each one records the calls it receives and can be told to fail or to answer slowly, which
//! is how the failure and race paths of the services are exercised.

mod account;
mod entitlement;
mod generation;
mod identity;
mod navigation;
mod notification;

pub use account::*;
pub use entitlement::*;
pub use generation::*;
pub use identity::*;
pub use navigation::*;
pub use notification::*;
