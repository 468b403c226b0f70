//! RIS Live wire format: subscribe frames and incoming envelopes.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Outbound subscription frame.
///
/// One frame is sent per monitored ASN, declaring interest in UPDATE
/// messages filtered by peer ASN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeFrame {
    #[serde(rename = "type")]
    pub kind: String,
    pub data: SubscribeData,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscribeData {
    #[serde(rename = "type")]
    pub kind: String,
    pub peer_asn: String,
    #[serde(rename = "socketOptions")]
    pub socket_options: SocketOptions,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SocketOptions {
    pub include_raw: bool,
    pub acknowledge: bool,
}

impl SubscribeFrame {
    /// Subscription for UPDATE messages from one peer ASN, given as the
    /// bare decimal number.
    #[must_use]
    pub fn updates_for(asn_number: &str) -> Self {
        Self {
            kind: String::from("ris_subscribe"),
            data: SubscribeData {
                kind: String::from("UPDATE"),
                peer_asn: asn_number.to_string(),
                socket_options: SocketOptions {
                    include_raw: false,
                    acknowledge: false,
                },
            },
        }
    }
}

/// Incoming message envelope; `data` is decoded per `kind`.
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
}

/// Inner payload of a `ris_message` envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct UpdateMessage {
    /// Unix float seconds
    #[serde(default)]
    pub timestamp: f64,
    /// Decimal peer ASN
    #[serde(default)]
    pub peer_asn: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    /// AS path: a mixed array of numbers, strings and sets (sub-arrays)
    #[serde(default)]
    pub path: Vec<Value>,
}

/// Inner payload of a `ris_error` envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ErrorMessage {
    #[serde(default)]
    pub message: String,
}

impl UpdateMessage {
    /// The update's timestamp as UTC.
    #[must_use]
    pub fn seen_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.timestamp as i64, 0)
            .single()
            .unwrap_or_else(Utc::now)
    }

    /// Whether the update originates at or traverses the given ASN
    /// (bare decimal number): peer match, or anywhere in the path
    /// including inside AS_SET sub-arrays.
    #[must_use]
    pub fn mentions(&self, asn_number: &str) -> bool {
        if self.peer_asn == asn_number {
            return true;
        }
        self.path
            .iter()
            .any(|element| path_element_matches(element, asn_number))
    }
}

/// Normalize one path element to decimal-string form and compare.
/// Sets are flattened; nested sets are handled the same way.
fn path_element_matches(element: &Value, asn_number: &str) -> bool {
    match element {
        Value::Number(n) => match n.as_u64() {
            Some(v) => v.to_string() == asn_number,
            None => n
                .as_f64()
                .is_some_and(|f| format!("{}", f.trunc() as u64) == asn_number),
        },
        Value::String(s) => s == asn_number,
        Value::Array(set) => set.iter().any(|e| path_element_matches(e, asn_number)),
        _ => false,
    }
}
