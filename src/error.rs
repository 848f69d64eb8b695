//! Error types for the DPU storage operator
//!
//! Provides structured error types for all operator components including
//! storage validation, connector resolution, the DPU command channel, and
//! deploy orchestration.

use thiserror::Error;

/// Unified error type for the operator
#[derive(Error, Debug)]
pub enum Error {
    // =========================================================================
    // Internal Errors
    // =========================================================================
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("Configuration error: {0}")]
    Configuration(String),

    // =========================================================================
    // Validation Errors
    // =========================================================================
    #[error("Failed to validate DPU storage interface for node {node}. {reason}")]
    InvalidParameter { node: String, reason: String },

    #[error(
        "Insufficient or incompatible volume connection records for node {node}. \
         Valid connector types: {valid_types}"
    )]
    StorageConfig { node: String, valid_types: String },

    // =========================================================================
    // DPU Command Channel Errors
    // =========================================================================
    #[error("Remote command '{command}' failed against DPU {dpu_addr}: {reason}")]
    RemoteCommand {
        dpu_addr: String,
        command: String,
        reason: String,
    },

    #[error("Heartbeat check failed for DPU {dpu_addr}: {reason}")]
    HeartbeatFailed { dpu_addr: String, reason: String },

    // =========================================================================
    // Storage Errors
    // =========================================================================
    #[error("Storage operation failed for node {node}: {reason}")]
    Storage { node: String, reason: String },

    // =========================================================================
    // Deploy Errors
    // =========================================================================
    #[error("Missing IP address for the DPU of node {node}")]
    MissingDpuAddress { node: String },

    #[error("Deploy failure for node {node}: {reason}")]
    DeployFailed { node: String, reason: String },

    // =========================================================================
    // Hardware Type Errors
    // =========================================================================
    #[error("Unknown hardware type: {name}")]
    HardwareTypeUnknown { name: String },
}

impl Error {
    /// Whether the detach loop should retry after this error.
    ///
    /// Only storage-level failures are retried; every other kind propagates
    /// to the caller immediately.
    pub fn is_retryable_during_detach(&self) -> bool {
        matches!(self, Error::Storage { .. })
    }

    /// Check if this error came from the DPU command channel
    pub fn is_remote(&self) -> bool {
        matches!(
            self,
            Error::RemoteCommand { .. } | Error::HeartbeatFailed { .. }
        )
    }
}

/// Result type alias for the operator
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_detach_retry_classification() {
        let storage = Error::Storage {
            node: "node-1".into(),
            reason: "disconnect failed".into(),
        };
        assert!(storage.is_retryable_during_detach());

        let remote = Error::RemoteCommand {
            dpu_addr: "10.0.0.5".into(),
            command: "cloud_disk.disconnect_cloud_disk".into(),
            reason: "connection refused".into(),
        };
        assert!(!remote.is_retryable_during_detach());

        let config = Error::StorageConfig {
            node: "node-1".into(),
            valid_types: "iqn".into(),
        };
        assert!(!config.is_retryable_during_detach());
    }

    #[test]
    fn test_remote_classification() {
        let heartbeat = Error::HeartbeatFailed {
            dpu_addr: "10.0.0.5".into(),
            reason: "timeout".into(),
        };
        assert!(heartbeat.is_remote());

        let deploy = Error::DeployFailed {
            node: "node-1".into(),
            reason: "no volumes attached".into(),
        };
        assert!(!deploy.is_remote());
    }
}
