use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use addrconfirm_core::PartnerKey;

/// ERP object name carried in business partner event types
/// (e.g. `BO.BusinessPartner.Changed`).
const BUSINESS_PARTNER_OBJECT: &str = "BusinessPartner";

/// What the confirmation core needs to know about an inbound event.
///
/// Everything else about the event (transport metadata, payload shape) stays
/// with the broker adapter.
pub trait InboundEvent {
    /// Whether this event describes a business partner.
    fn is_business_partner_event(&self) -> bool;

    /// Key of the business partner the event refers to, if present and valid.
    fn business_partner_key(&self) -> Option<PartnerKey>;
}

impl<E: InboundEvent + ?Sized> InboundEvent for &E {
    fn is_business_partner_event(&self) -> bool {
        (**self).is_business_partner_event()
    }

    fn business_partner_key(&self) -> Option<PartnerKey> {
        (**self).business_partner_key()
    }
}

#[derive(Debug, Error)]
pub enum EventDecodeError {
    #[error("event payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// Decoded ERP event message.
///
/// Wire shape (JSON):
///
/// ```json
/// {
///   "eventType": "BO.BusinessPartner.Changed",
///   "eventId": "0190c8f6-5d1e-7c4b-8a8e-0f6a1c2b3d4e",
///   "eventTime": "2024-05-02T09:30:00Z",
///   "data": { "KEY": [ { "BUSINESSPARTNER": "17100001" } ] }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageEvent {
    #[serde(default)]
    event_id: Option<Uuid>,
    event_type: String,
    #[serde(default)]
    event_time: Option<DateTime<Utc>>,
    #[serde(default)]
    data: EventData,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
struct EventData {
    #[serde(rename = "KEY", default)]
    key: Vec<EventKey>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
struct EventKey {
    #[serde(rename = "BUSINESSPARTNER", default)]
    business_partner: Option<String>,
}

impl MessageEvent {
    /// Build an event of the given type, optionally keyed by a business partner.
    pub fn new(event_type: impl Into<String>, partner: Option<&PartnerKey>) -> Self {
        let key = partner
            .map(|p| {
                vec![EventKey {
                    business_partner: Some(p.to_string()),
                }]
            })
            .unwrap_or_default();

        Self {
            event_id: Some(Uuid::now_v7()),
            event_type: event_type.into(),
            event_time: Some(Utc::now()),
            data: EventData { key },
        }
    }

    /// `BO.BusinessPartner.Changed` for the given partner.
    pub fn business_partner_changed(partner: &PartnerKey) -> Self {
        Self::new("BO.BusinessPartner.Changed", Some(partner))
    }

    /// Decode an event from its JSON wire form.
    pub fn from_json(bytes: &[u8]) -> Result<Self, EventDecodeError> {
        Ok(serde_json::from_slice(bytes)?)
    }

    pub fn event_id(&self) -> Option<Uuid> {
        self.event_id
    }

    pub fn event_type(&self) -> &str {
        &self.event_type
    }

    pub fn event_time(&self) -> Option<DateTime<Utc>> {
        self.event_time
    }

    /// ERP object named by the event type, with an optional `BO.` prefix stripped.
    fn object_name(&self) -> &str {
        let ty = self.event_type.strip_prefix("BO.").unwrap_or(&self.event_type);
        ty.split('.').next().unwrap_or_default()
    }
}

impl InboundEvent for MessageEvent {
    fn is_business_partner_event(&self) -> bool {
        self.object_name().eq_ignore_ascii_case(BUSINESS_PARTNER_OBJECT)
    }

    fn business_partner_key(&self) -> Option<PartnerKey> {
        self.data
            .key
            .iter()
            .find_map(|k| k.business_partner.as_deref())
            .and_then(|raw| PartnerKey::new(raw).ok())
    }
}
