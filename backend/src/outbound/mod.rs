//! Outbound adapters implementing the domain's driven ports.

pub mod identity;
pub mod mailer;
pub mod persistence;
