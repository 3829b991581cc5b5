//! Live events pushed by the backend over the admin orders channel
//!
//! Frames are JSON envelopes of the form `{"type": "...", "data": ...}`. Only
//! `order_update` and `low_stock_alert` mean anything to the dashboard; every
//! other type decodes to `None` and is dropped by the caller.

use crate::types::{LowStockAlert, OrderId};
use serde::{Deserialize, Serialize};

/// Envelope `type` of an order change notification
pub const ORDER_UPDATE: &str = "order_update";

/// Envelope `type` of a low stock notification
pub const LOW_STOCK_ALERT: &str = "low_stock_alert";

/// Payload of an `order_update` event
///
/// Informational only: the dashboard re-fetches instead of trusting it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct OrderUpdate {
    /// Order that changed
    #[serde(default)]
    pub order_id: Option<OrderId>,

    /// What happened (`new_order`, `accepted`, `cancelled`)
    #[serde(default)]
    pub action: Option<String>,

    /// New status spelling
    #[serde(default)]
    pub status: Option<String>,
}

/// A decoded push notification
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LiveEvent {
    /// Some order changed; all order-derived lists are stale
    OrderUpdate(OrderUpdate),
    /// A product dropped to or below its threshold
    LowStockAlert(LowStockAlert),
}

#[derive(Deserialize)]
struct Envelope {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    data: serde_json::Value,
}

impl LiveEvent {
    /// Decode one text frame
    ///
    /// Returns `Ok(None)` for well-formed envelopes of an unrecognized type.
    ///
    /// # Errors
    ///
    /// Returns [`crate::Error::Serialization`] if the frame is not an envelope
    /// or the payload of a known type is malformed.
    pub fn decode(text: &str) -> crate::Result<Option<Self>> {
        let envelope: Envelope = serde_json::from_str(text)?;

        match envelope.kind.as_str() {
            ORDER_UPDATE => {
                let update = if envelope.data.is_null() {
                    OrderUpdate::default()
                } else {
                    serde_json::from_value(envelope.data)?
                };
                Ok(Some(Self::OrderUpdate(update)))
            }
            LOW_STOCK_ALERT => {
                let alert = serde_json::from_value(envelope.data)?;
                Ok(Some(Self::LowStockAlert(alert)))
            }
            _ => Ok(None),
        }
    }

    /// Envelope type this event was decoded from
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::OrderUpdate(_) => ORDER_UPDATE,
            Self::LowStockAlert(_) => LOW_STOCK_ALERT,
        }
    }

    /// Encode back into an envelope, as the backend would send it
    #[must_use]
    pub fn to_envelope(&self) -> serde_json::Value {
        let data = match self {
            Self::OrderUpdate(update) => serde_json::to_value(update),
            Self::LowStockAlert(alert) => serde_json::to_value(alert),
        }
        .unwrap_or(serde_json::Value::Null);

        serde_json::json!({ "type": self.kind(), "data": data })
    }
}
