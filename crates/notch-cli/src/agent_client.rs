//! Concrete `DeviceClient`: talks to one or more `notch-agent`
//! device-access processes over HTTP.
//!
//! Fans the discovery call out across every configured `-a/--agent`
//! address and remembers which agent answered for each device, so
//! `exec_request` routes to the right one. The wire format is this
//! workspace's own realization of the device-access service contract:
//! the service itself is external, so this client speaks the simplest
//! JSON-over-HTTP shape that satisfies it.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use notch_common::device::{DeviceInfo, DeviceResponse, ResponsePayload};
use notch_core::error::DeviceClientError;
use notch_core::external::{DeviceClient, DeviceRequest};
use serde::Deserialize;

const CONNECT_TIMEOUT_SECS: u64 = 5;
const DISCOVERY_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Deserialize)]
struct DiscoveryEntry {
    device_type: String,
    #[serde(default)]
    attributes: std::collections::BTreeMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct ExecResponseBody {
    #[serde(default)]
    text: Option<String>,
    #[serde(default)]
    binary: Option<Vec<u8>>,
    #[serde(default)]
    error: Option<String>,
}

/// Talks to one or more `notch-agent` device-access processes over HTTP.
///
/// `devices_info` is fanned out to every configured agent and the results
/// merged; each response is used to remember which agent owns which
/// device, so a later `exec_request` for that device goes straight to it
/// instead of guessing.
pub struct HttpAgentClient {
    agents: Vec<String>,
    http: reqwest::Client,
    device_agent: Mutex<HashMap<String, String>>,
}

impl HttpAgentClient {
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(agents: Vec<String>) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .build()?;
        Ok(Self {
            agents,
            http,
            device_agent: Mutex::new(HashMap::new()),
        })
    }

    fn agent_for(&self, device_name: &str) -> Option<String> {
        self.device_agent
            .lock()
            .ok()
            .and_then(|m| m.get(device_name).cloned())
            .or_else(|| self.agents.first().cloned())
    }
}

#[async_trait]
impl DeviceClient for HttpAgentClient {
    async fn devices_info(
        &self,
        regex: &str,
    ) -> Result<HashMap<String, DeviceInfo>, DeviceClientError> {
        let mut merged = HashMap::new();
        for agent in &self.agents {
            let url = format!("http://{agent}/devices");
            let resp = self
                .http
                .get(&url)
                .query(&[("regex", regex)])
                .timeout(Duration::from_secs(DISCOVERY_TIMEOUT_SECS))
                .send()
                .await
                .map_err(|e| DeviceClientError::Transport(format!("{agent}: {e}")))?;
            let body: HashMap<String, DiscoveryEntry> = resp
                .json()
                .await
                .map_err(|e| DeviceClientError::Transport(format!("{agent}: {e}")))?;

            if let Ok(mut map) = self.device_agent.lock() {
                for name in body.keys() {
                    map.insert(name.clone(), agent.clone());
                }
            }
            merged.extend(body.into_iter().map(|(name, entry)| {
                (
                    name,
                    DeviceInfo {
                        device_type: entry.device_type,
                        attributes: entry.attributes,
                    },
                )
            }));
        }
        Ok(merged)
    }

    async fn exec_request(&self, req: DeviceRequest) -> Result<DeviceResponse, DeviceClientError> {
        let agent = self
            .agent_for(&req.device_name)
            .ok_or(DeviceClientError::NoAgents)?;
        let url = format!("http://{agent}/exec");
        let mut builder = self.http.post(&url).json(&serde_json::json!({
            "device_name": req.device_name,
            "method": req.method,
            "command": req.command,
        }));
        if let Some(timeout) = req.timeout {
            builder = builder.timeout(timeout);
        }
        let resp = builder
            .send()
            .await
            .map_err(|e| DeviceClientError::Transport(e.to_string()))?;
        let body: ExecResponseBody = resp
            .json()
            .await
            .map_err(|e| DeviceClientError::Transport(e.to_string()))?;

        if let Some(err) = body.error {
            return Ok(DeviceResponse {
                device_name: req.device_name,
                payload: ResponsePayload::Text(String::new()),
                error: Some(err),
            });
        }
        if let Some(bytes) = body.binary {
            return Ok(DeviceResponse {
                device_name: req.device_name,
                payload: ResponsePayload::Binary(bytes),
                error: None,
            });
        }
        Ok(DeviceResponse {
            device_name: req.device_name,
            payload: ResponsePayload::Text(body.text.unwrap_or_default()),
            error: None,
        })
    }
}
