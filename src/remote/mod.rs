//! DPU Command Channel
//!
//! Sends JSON command envelopes to a DPU's HTTP control endpoint and
//! decodes the result. Stateless and safe to call concurrently against
//! different DPU addresses; retry policy belongs to callers.

use crate::config::RemoteConfig;
use crate::domain::ports::CommandSender;
use crate::error::{Error, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Fixed command path on the DPU agent
pub const COMMAND_PATH: &str = "/v1/commands/";

/// Connect a remote volume to the node
pub const CMD_CONNECT_CLOUD_DISK: &str = "cloud_disk.connect_cloud_disk";

/// Disconnect a remote volume from the node
pub const CMD_DISCONNECT_CLOUD_DISK: &str = "cloud_disk.disconnect_cloud_disk";

/// Liveness probe
pub const CMD_CHECK_HEARTBEAT: &str = "cloud_disk.check_heartbeat";

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Serialize)]
struct CommandEnvelope<'a> {
    name: &'a str,
    params: &'a serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct CommandResponse {
    #[serde(default)]
    result: Option<serde_json::Value>,
    #[serde(default)]
    message: Option<String>,
}

// =============================================================================
// Client
// =============================================================================

/// Client for the DPU agent's command endpoint
#[derive(Debug, Clone)]
pub struct DpuCommandClient {
    config: RemoteConfig,
    http: reqwest::Client,
}

impl DpuCommandClient {
    /// Create a new command client
    pub fn new(config: RemoteConfig) -> Self {
        Self {
            config,
            http: reqwest::Client::new(),
        }
    }

    fn command_url(&self, dpu_address: &str) -> String {
        format!(
            "http://{}:{}{}",
            dpu_address, self.config.command_port, COMMAND_PATH
        )
    }

    fn remote_error(dpu_address: &str, command: &str, reason: impl Into<String>) -> Error {
        Error::RemoteCommand {
            dpu_addr: dpu_address.to_string(),
            command: command.to_string(),
            reason: reason.into(),
        }
    }

    /// Decode a parsed response body into the command result.
    ///
    /// A non-success HTTP status or a `message` field both signal failure;
    /// the `result` field is the success payload.
    fn decode(
        dpu_address: &str,
        command: &str,
        http_success: bool,
        body: CommandResponse,
    ) -> Result<serde_json::Value> {
        if !http_success {
            return Err(Self::remote_error(
                dpu_address,
                command,
                body.message.unwrap_or_default(),
            ));
        }
        if let Some(message) = body.message {
            return Err(Self::remote_error(dpu_address, command, message));
        }
        Ok(body.result.unwrap_or(serde_json::Value::Null))
    }
}

#[async_trait]
impl CommandSender for DpuCommandClient {
    async fn send(
        &self,
        dpu_address: &str,
        command: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value> {
        let url = self.command_url(dpu_address);
        let envelope = CommandEnvelope {
            name: command,
            params: &params,
        };

        info!("Sending command {} to DPU {}", command, dpu_address);

        let response = self
            .http
            .post(&url)
            .json(&envelope)
            .timeout(self.config.command_timeout)
            .send()
            .await
            .map_err(|err| Self::remote_error(dpu_address, command, err.to_string()))?;

        let http_success = response.status().is_success();
        let body: CommandResponse = response.json().await.map_err(|err| {
            Self::remote_error(
                dpu_address,
                command,
                format!("malformed response body: {}", err),
            )
        })?;

        let result = Self::decode(dpu_address, command, http_success, body)?;
        debug!("Command {} on DPU {} returned {}", command, dpu_address, result);
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assert_matches::assert_matches;

    #[test]
    fn test_command_url() {
        let client = DpuCommandClient::new(RemoteConfig::default());
        assert_eq!(
            client.command_url("192.168.3.18"),
            "http://192.168.3.18:9999/v1/commands/"
        );
    }

    #[test]
    fn test_envelope_shape() {
        let params = serde_json::json!({"iqn": "iqn.1993-08.org.debian:01:abc", "ip": "10.0.0.2"});
        let envelope = CommandEnvelope {
            name: CMD_CONNECT_CLOUD_DISK,
            params: &params,
        };
        let wire = serde_json::to_value(&envelope).unwrap();
        assert_eq!(
            wire,
            serde_json::json!({
                "name": "cloud_disk.connect_cloud_disk",
                "params": {"iqn": "iqn.1993-08.org.debian:01:abc", "ip": "10.0.0.2"},
            })
        );
    }

    #[test]
    fn test_decode_success_returns_result() {
        let body: CommandResponse =
            serde_json::from_str(r#"{"result": "ok"}"#).unwrap();
        let result = DpuCommandClient::decode("10.0.0.5", CMD_CHECK_HEARTBEAT, true, body);
        assert_eq!(result.unwrap(), serde_json::Value::String("ok".into()));
    }

    #[test]
    fn test_decode_message_field_is_failure() {
        let body: CommandResponse =
            serde_json::from_str(r#"{"message": "no such disk"}"#).unwrap();
        let err =
            DpuCommandClient::decode("10.0.0.5", CMD_CONNECT_CLOUD_DISK, true, body).unwrap_err();
        assert_matches!(err, Error::RemoteCommand { reason, .. } if reason == "no such disk");
    }

    #[test]
    fn test_decode_http_failure() {
        let body: CommandResponse =
            serde_json::from_str(r#"{"message": "boom"}"#).unwrap();
        let err =
            DpuCommandClient::decode("10.0.0.5", CMD_DISCONNECT_CLOUD_DISK, false, body)
                .unwrap_err();
        assert_matches!(
            err,
            Error::RemoteCommand { dpu_addr, command, reason }
                if dpu_addr == "10.0.0.5"
                    && command == CMD_DISCONNECT_CLOUD_DISK
                    && reason == "boom"
        );
    }

    #[test]
    fn test_decode_missing_result_is_null() {
        let body: CommandResponse = serde_json::from_str("{}").unwrap();
        let result = DpuCommandClient::decode("10.0.0.5", CMD_CHECK_HEARTBEAT, true, body);
        assert_eq!(result.unwrap(), serde_json::Value::Null);
    }
}
