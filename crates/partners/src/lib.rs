//! Business partner domain module.
//!
//! The ERP owns partner records; this crate models the slice of them the
//! address confirmation flow reads and writes, plus the address fingerprint
//! used to detect address changes. Pure domain logic, no IO.

pub mod address;
pub mod checksum;
pub mod contact;
pub mod partner;

pub use address::{Address, PostalField};
pub use checksum::{AddressChecksum, AddressHasher};
pub use contact::Contact;
pub use partner::{AddressConfirmationState, BusinessPartner, PartnerCategory};
