//! In-memory `DeviceClient` test double: a mock sibling lives next to the
//! real implementation rather than behind a generic fake framework. Backs
//! the scheduler/collection/collator integration tests, including the
//! collection-timeout scenario, via an optional artificial delay per
//! canned response.

use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use notch_common::device::{DeviceInfo, DeviceResponse};
use tokio::time::sleep;

use crate::error::DeviceClientError;
use crate::external::{DeviceClient, DeviceRequest};

#[derive(Debug, Clone)]
pub struct CannedResponse {
    pub response: DeviceResponse,
    /// Artificial delay before the response resolves; `None` (or a very
    /// long delay) simulates a device that never responds within the
    /// collection's timeout window.
    pub delay: Option<Duration>,
}

impl From<DeviceResponse> for CannedResponse {
    fn from(response: DeviceResponse) -> Self {
        Self {
            response,
            delay: None,
        }
    }
}

/// Canned per-device/per-method responses, optionally delayed, with a
/// static device-discovery map. Never touches real I/O.
#[derive(Debug, Default)]
pub struct MockDeviceClient {
    pub devices: HashMap<String, DeviceInfo>,
    pub responses: HashMap<(String, String), CannedResponse>,
    /// Devices in this set never produce a response at all — their
    /// `exec_request` future only resolves if the caller races it against
    /// a timeout, exactly like a real hung device-access session.
    pub hung_devices: std::collections::HashSet<String>,
}

impl MockDeviceClient {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_device(mut self, name: &str, device_type: &str) -> Self {
        self.devices.insert(
            name.to_string(),
            DeviceInfo {
                device_type: device_type.to_string(),
                attributes: std::collections::BTreeMap::new(),
            },
        );
        self
    }

    #[must_use]
    pub fn with_response(
        mut self,
        device: &str,
        method: &str,
        response: impl Into<CannedResponse>,
    ) -> Self {
        self.responses
            .insert((device.to_string(), method.to_string()), response.into());
        self
    }

    #[must_use]
    pub fn with_hung_device(mut self, device: &str) -> Self {
        self.hung_devices.insert(device.to_string());
        self
    }
}

#[async_trait]
impl DeviceClient for MockDeviceClient {
    async fn devices_info(
        &self,
        regex: &str,
    ) -> Result<HashMap<String, DeviceInfo>, DeviceClientError> {
        let re = regex::Regex::new(regex)
            .map_err(|e| DeviceClientError::Transport(e.to_string()))?;
        Ok(self
            .devices
            .iter()
            .filter(|(name, _)| re.is_match(name))
            .map(|(name, info)| (name.clone(), info.clone()))
            .collect())
    }

    async fn exec_request(&self, req: DeviceRequest) -> Result<DeviceResponse, DeviceClientError> {
        if self.hung_devices.contains(&req.device_name) {
            std::future::pending::<()>().await;
        }
        let key = (req.device_name.clone(), req.method.clone());
        let canned = self
            .responses
            .get(&key)
            .ok_or_else(|| DeviceClientError::Transport(format!("no canned response for {key:?}")))?;
        if let Some(delay) = canned.delay {
            sleep(delay).await;
        }
        Ok(canned.response.clone())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn devices_info_filters_by_regex() {
        let client = MockDeviceClient::new()
            .with_device("r1", "cisco")
            .with_device("sw1", "cisco");
        let found = client.devices_info("^r").await.unwrap();
        assert_eq!(found.len(), 1);
        assert!(found.contains_key("r1"));
    }

    #[tokio::test]
    async fn exec_request_returns_canned_response() {
        let client = MockDeviceClient::new().with_response(
            "r1",
            "command",
            DeviceResponse::ok_text("r1", "hostname r1"),
        );
        let resp = client
            .exec_request(DeviceRequest {
                device_name: "r1".to_string(),
                method: "command".to_string(),
                command: Some("show version".to_string()),
                timeout: None,
            })
            .await
            .unwrap();
        assert_eq!(resp.payload.as_text(), Some("hostname r1"));
    }

    #[tokio::test]
    async fn hung_device_never_resolves_within_a_short_timeout() {
        let client = MockDeviceClient::new().with_hung_device("stuck1");
        let result = tokio::time::timeout(
            Duration::from_millis(20),
            client.exec_request(DeviceRequest {
                device_name: "stuck1".to_string(),
                method: "command".to_string(),
                command: None,
                timeout: None,
            }),
        )
        .await;
        assert!(result.is_err());
    }
}
