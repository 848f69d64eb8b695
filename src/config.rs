//! Operator configuration
//!
//! Plain configuration structs with defaults matching the DPU agent
//! deployment conventions. Retry and timeout policy is configuration-driven
//! so tests can inject near-zero delays.

use std::time::Duration;

// =============================================================================
// Remote Command Channel
// =============================================================================

/// Configuration for the DPU command channel
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// TCP port of the DPU command endpoint
    pub command_port: u16,
    /// Bound on each command round-trip, including connect time
    pub command_timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            command_port: 9999,
            command_timeout: Duration::from_secs(30),
        }
    }
}

// =============================================================================
// Storage Interface
// =============================================================================

/// Trigger condition for marking a connection descriptor multipath
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MultipathPolicy {
    /// More than one connector supplied AND more than one descriptor field
    /// populated
    ConnectorAndFieldCount,
    /// More than one connector supplied
    ConnectorCount,
    /// Never mark multipath
    Disabled,
}

/// Configuration for the storage interface
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Number of detach retries after the initial attempt
    pub action_retries: u32,
    /// Fixed delay between detach attempts
    pub action_retry_interval: Duration,
    /// When a connection descriptor is marked multipath
    pub multipath_policy: MultipathPolicy,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            action_retries: 3,
            action_retry_interval: Duration::from_secs(5),
            multipath_policy: MultipathPolicy::ConnectorAndFieldCount,
        }
    }
}

// =============================================================================
// Deploy Interface
// =============================================================================

/// Configuration for the deploy interface
#[derive(Debug, Clone)]
pub struct DeployConfig {
    /// Pause between volume attachment and network reconfiguration, giving
    /// the DPU time to surface the new block device
    pub post_attach_settle: Duration,
}

impl Default for DeployConfig {
    fn default() -> Self {
        Self {
            post_attach_settle: Duration::from_secs(5),
        }
    }
}

// =============================================================================
// Combined Configuration
// =============================================================================

/// Combined operator configuration
#[derive(Debug, Clone, Default)]
pub struct DpuConfig {
    pub remote: RemoteConfig,
    pub storage: StorageConfig,
    pub deploy: DeployConfig,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = DpuConfig::default();
        assert_eq!(config.remote.command_port, 9999);
        assert_eq!(config.remote.command_timeout, Duration::from_secs(30));
        assert_eq!(config.storage.action_retries, 3);
        assert_eq!(
            config.storage.action_retry_interval,
            Duration::from_secs(5)
        );
        assert_eq!(
            config.storage.multipath_policy,
            MultipathPolicy::ConnectorAndFieldCount
        );
        assert_eq!(config.deploy.post_attach_settle, Duration::from_secs(5));
    }
}
