use serde::{Deserialize, Serialize};

use addrconfirm_core::PartnerKey;

/// Responsible contact of a business partner, as selected by the ERP.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Contact {
    /// The contact person (itself a business partner of category person).
    pub contact_person: PartnerKey,
    pub email: Option<String>,
}

impl Contact {
    pub fn new(contact_person: PartnerKey, email: Option<String>) -> Self {
        Self {
            contact_person,
            email,
        }
    }

    /// Email address, treating a blank value as absent.
    pub fn email_address(&self) -> Option<&str> {
        self.email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
    }
}
