use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Device metadata as returned by the device-access client's discovery call.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DeviceInfo {
    pub device_type: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
}

/// The raw payload of one command response, prior to filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResponsePayload {
    Text(String),
    Binary(Vec<u8>),
}

impl ResponsePayload {
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            Self::Binary(_) => None,
        }
    }
}

/// The result of executing one action against one device, used as input
/// to the filter pipeline.
///
/// This struct carries only the data needed for filtering and status
/// derivation — process/transport machinery lives behind the
/// `DeviceClient` trait in `notch-core`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceResponse {
    pub device_name: String,
    pub payload: ResponsePayload,
    /// Set when the device-access client reports a transport or
    /// device-reported error instead of a payload.
    pub error: Option<String>,
}

impl DeviceResponse {
    #[must_use]
    pub fn ok_text(device_name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            device_name: device_name.into(),
            payload: ResponsePayload::Text(text.into()),
            error: None,
        }
    }

    #[must_use]
    pub fn ok_binary(device_name: impl Into<String>, data: Vec<u8>) -> Self {
        Self {
            device_name: device_name.into(),
            payload: ResponsePayload::Binary(data),
            error: None,
        }
    }

    #[must_use]
    pub fn error(device_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            device_name: device_name.into(),
            payload: ResponsePayload::Text(String::new()),
            error: Some(message.into()),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn ok_text_has_no_error() {
        let r = DeviceResponse::ok_text("r1", "hello");
        assert!(r.error.is_none());
        assert_eq!(r.payload.as_text(), Some("hello"));
    }

    #[test]
    fn binary_payload_as_text_is_none() {
        let r = DeviceResponse::ok_binary("r1", vec![1, 2, 3]);
        assert_eq!(r.payload.as_text(), None);
    }

    #[test]
    fn error_response_carries_message() {
        let r = DeviceResponse::error("r1", "timeout");
        assert_eq!(r.error.as_deref(), Some("timeout"));
    }

    #[test]
    fn device_info_round_trips_through_json() {
        let mut attributes = BTreeMap::new();
        attributes.insert("model".to_string(), "MX960".to_string());
        let info = DeviceInfo {
            device_type: "juniper".to_string(),
            attributes,
        };
        let encoded = serde_json::to_string(&info).unwrap();
        let decoded: DeviceInfo = serde_json::from_str(&encoded).unwrap();
        assert_eq!(info, decoded);
    }

    #[test]
    fn device_info_attributes_default_when_absent() {
        let decoded: DeviceInfo =
            serde_json::from_str(r#"{"device_type":"cisco"}"#).unwrap();
        assert!(decoded.attributes.is_empty());
    }
}
