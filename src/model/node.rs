//! Bare-metal node model
//!
//! Mirrors the subset of the framework's node record that the DPU
//! interfaces read: provision state, capabilities, the DPU side-car
//! address, and instance/driver info bags.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

// =============================================================================
// Provision State
// =============================================================================

/// Externally-defined provision state machine, restricted to the states
/// this crate reads or returns
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProvisionState {
    Active,
    Available,
    Deploying,
    DeployWait,
    Deleting,
    Deleted,
    Cleaning,
    CleanWait,
    Error,
}

impl std::fmt::Display for ProvisionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProvisionState::Active => write!(f, "active"),
            ProvisionState::Available => write!(f, "available"),
            ProvisionState::Deploying => write!(f, "deploying"),
            ProvisionState::DeployWait => write!(f, "deploywait"),
            ProvisionState::Deleting => write!(f, "deleting"),
            ProvisionState::Deleted => write!(f, "deleted"),
            ProvisionState::Cleaning => write!(f, "cleaning"),
            ProvisionState::CleanWait => write!(f, "cleanwait"),
            ProvisionState::Error => write!(f, "error"),
        }
    }
}

// =============================================================================
// Node
// =============================================================================

/// DPU side-car data carried in the node's extra bag
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DpuExtra {
    /// Network address of the node's DPU command endpoint
    #[serde(default)]
    pub ip_addr: String,
}

/// Free-form extra data attached to a node
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeExtra {
    #[serde(default)]
    pub dpu: Option<DpuExtra>,
}

/// Hardware properties declared for a node
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct NodeProperties {
    /// Capability name to value mapping (e.g. `dpu_boot` -> `true`)
    #[serde(default)]
    pub capabilities: BTreeMap<String, String>,
}

/// The bare-metal entity being provisioned
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Node {
    pub uuid: String,
    pub provision_state: ProvisionState,
    #[serde(default)]
    pub properties: NodeProperties,
    #[serde(default)]
    pub extra: NodeExtra,
    /// Instance parameters; presence of `image_source` decides whether an
    /// image must be written
    #[serde(default)]
    pub instance_info: BTreeMap<String, serde_json::Value>,
    /// Driver parameters consumed by the power executor
    #[serde(default)]
    pub driver_info: BTreeMap<String, String>,
}

impl Default for Node {
    fn default() -> Self {
        Self {
            uuid: String::new(),
            provision_state: ProvisionState::Available,
            properties: NodeProperties::default(),
            extra: NodeExtra::default(),
            instance_info: BTreeMap::new(),
            driver_info: BTreeMap::new(),
        }
    }
}

impl Node {
    /// Address of the node's DPU command endpoint, if configured.
    ///
    /// An empty address counts as absent.
    pub fn dpu_address(&self) -> Option<&str> {
        self.extra
            .dpu
            .as_ref()
            .map(|dpu| dpu.ip_addr.as_str())
            .filter(|addr| !addr.is_empty())
    }

    /// Raw capability value by name
    pub fn capability(&self, name: &str) -> Option<&str> {
        self.properties
            .capabilities
            .get(name)
            .map(String::as_str)
    }

    /// Whether a capability is declared at all, regardless of value
    pub fn has_capability(&self, name: &str) -> bool {
        self.properties.capabilities.contains_key(name)
    }

    /// Capability parsed as a boolean; absent or unparsable values are false
    pub fn bool_capability(&self, name: &str) -> bool {
        self.capability(name)
            .map(|value| {
                matches!(
                    value.to_ascii_lowercase().as_str(),
                    "true" | "t" | "yes" | "y" | "on" | "1"
                )
            })
            .unwrap_or(false)
    }
}
