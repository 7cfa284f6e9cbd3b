pub mod account;
pub mod entitlement;
pub mod identity;
pub mod notification;
pub mod premium;
pub mod recap;
