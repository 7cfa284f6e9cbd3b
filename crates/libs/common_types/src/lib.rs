#![allow(
    clippy::missing_errors_doc,
    clippy::missing_panics_doc,
    clippy::struct_excessive_bools
)]
mod account;
mod entitlement;
mod identity;
mod notification;
mod recap;

pub use account::*;
pub use entitlement::*;
pub use identity::*;
pub use notification::*;
pub use recap::*;
