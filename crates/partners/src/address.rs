use serde::{Deserialize, Serialize};

use addrconfirm_core::{DomainError, DomainResult, PartnerKey};

/// The postal fields that make up an address's identity, in canonical order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostalField {
    Street,
    HouseNumber,
    PostalCode,
    City,
    Country,
    Region,
}

impl PostalField {
    /// Canonical order used by the hasher and the token codec.
    pub const ALL: [PostalField; 6] = [
        PostalField::Street,
        PostalField::HouseNumber,
        PostalField::PostalCode,
        PostalField::City,
        PostalField::Country,
        PostalField::Region,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PostalField::Street => "street",
            PostalField::HouseNumber => "house_number",
            PostalField::PostalCode => "postal_code",
            PostalField::City => "city",
            PostalField::Country => "country",
            PostalField::Region => "region",
        }
    }

    /// Maximum length in bytes (ERP column width).
    pub const fn max_len(self) -> usize {
        match self {
            PostalField::Street => 60,
            PostalField::HouseNumber => 10,
            PostalField::PostalCode => 10,
            PostalField::City => 40,
            PostalField::Country => 3,
            PostalField::Region => 3,
        }
    }
}

/// Current postal address of a business partner.
///
/// Equality is by postal fields only; `partner` is a back-reference and not
/// part of the address's identity.
#[derive(Debug, Clone, Eq, Serialize, Deserialize)]
pub struct Address {
    pub partner: PartnerKey,
    pub street: String,
    pub house_number: String,
    pub postal_code: String,
    pub city: String,
    pub country: String,
    pub region: String,
}

impl Address {
    /// An address for `partner` with all postal fields empty.
    pub fn empty(partner: PartnerKey) -> Self {
        Self {
            partner,
            street: String::new(),
            house_number: String::new(),
            postal_code: String::new(),
            city: String::new(),
            country: String::new(),
            region: String::new(),
        }
    }

    pub fn field(&self, field: PostalField) -> &str {
        match field {
            PostalField::Street => &self.street,
            PostalField::HouseNumber => &self.house_number,
            PostalField::PostalCode => &self.postal_code,
            PostalField::City => &self.city,
            PostalField::Country => &self.country,
            PostalField::Region => &self.region,
        }
    }

    pub fn field_mut(&mut self, field: PostalField) -> &mut String {
        match field {
            PostalField::Street => &mut self.street,
            PostalField::HouseNumber => &mut self.house_number,
            PostalField::PostalCode => &mut self.postal_code,
            PostalField::City => &mut self.city,
            PostalField::Country => &mut self.country,
            PostalField::Region => &mut self.region,
        }
    }

    /// Postal fields in canonical order.
    pub fn postal_fields(&self) -> impl Iterator<Item = (PostalField, &str)> {
        PostalField::ALL.into_iter().map(|f| (f, self.field(f)))
    }

    /// Check every postal field against its ERP column width.
    pub fn validate(&self) -> DomainResult<()> {
        for (field, value) in self.postal_fields() {
            if value.len() > field.max_len() {
                return Err(DomainError::validation(format!(
                    "{} exceeds {} bytes",
                    field.name(),
                    field.max_len()
                )));
            }
        }
        Ok(())
    }
}

impl PartialEq for Address {
    fn eq(&self, other: &Self) -> bool {
        PostalField::ALL
            .into_iter()
            .all(|f| self.field(f) == other.field(f))
    }
}

/// Single-line rendering used in mails: `Street 1, 12345 City, Region, CC`.
impl core::fmt::Display for Address {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let street_line = join_non_empty(&[self.street.as_str(), self.house_number.as_str()], " ");
        let city_line = join_non_empty(&[self.postal_code.as_str(), self.city.as_str()], " ");
        let line = join_non_empty(
            &[
                street_line.as_str(),
                city_line.as_str(),
                self.region.as_str(),
                self.country.as_str(),
            ],
            ", ",
        );
        f.write_str(&line)
    }
}

fn join_non_empty(parts: &[&str], sep: &str) -> String {
    parts
        .iter()
        .map(|p| p.trim())
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(sep)
}
