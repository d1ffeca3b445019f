//! `addrconfirm-core` — domain foundation shared by every crate.
//!
//! Pure domain primitives, no infrastructure concerns: the business partner
//! key and the domain error model.

pub mod error;
pub mod id;

pub use error::{DomainError, DomainResult};
pub use id::{PARTNER_KEY_MAX_LEN, PartnerKey};
