//! Domain Ports - Core trait definitions for the DPU operator
//!
//! These traits define the boundaries between this crate and the
//! provisioning framework. The storage, deploy, and boot interfaces are
//! implemented HERE and consumed by the framework; the remaining ports are
//! implemented by the framework (or by test doubles) and consumed here.

use crate::error::Result;
use crate::model::{AttachmentRecord, ConnectionDescriptor, ProvisionState, VolumeTarget};
use async_trait::async_trait;
use std::sync::Arc;

use super::task::Task;

// =============================================================================
// Outcomes
// =============================================================================

/// Result of a deploy invocation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeployOutcome {
    /// Deployment continues asynchronously; the framework transitions the
    /// node once it reports readiness
    Wait,
    /// Deployment finished synchronously
    Done,
}

/// Boot device selector passed to the boot-device manager
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BootDevice {
    Disk,
    Pxe,
    Cdrom,
}

impl std::fmt::Display for BootDevice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BootDevice::Disk => write!(f, "disk"),
            BootDevice::Pxe => write!(f, "pxe"),
            BootDevice::Cdrom => write!(f, "cdrom"),
        }
    }
}

// =============================================================================
// Interfaces exposed to the framework
// =============================================================================

/// Storage role of a hardware type
#[async_trait]
pub trait StorageInterface: Send + Sync {
    /// Validate the node's volume configuration against DPU-boot
    /// requirements; no side effects
    async fn validate(&self, task: &Task) -> Result<()>;

    /// Attach all declared volumes, all-or-nothing
    async fn attach_volumes(&self, task: &Task) -> Result<Vec<AttachmentRecord>>;

    /// Detach all declared volumes, best-effort with bounded retries
    async fn detach_volumes(
        &self,
        task: &Task,
        connector: Option<&ConnectionDescriptor>,
        aborting_attach: bool,
    ) -> Result<()>;

    /// Whether the deploy must still write an image to the node
    fn should_write_image(&self, task: &Task) -> bool;

    /// Liveness probe against the DPU command endpoint
    async fn check_heartbeat(&self, ip_address: &str) -> Result<()>;
}

/// Deploy role of a hardware type
#[async_trait]
pub trait DeployInterface: Send + Sync {
    async fn validate(&self, task: &Task) -> Result<()>;

    /// Drive the deploy sequence to the power reset and return the
    /// asynchronous wait outcome
    async fn deploy(&self, task: &Task) -> Result<DeployOutcome>;

    /// Tear down a previous deployment, returning the terminal state
    async fn tear_down(&self, task: &Task) -> Result<ProvisionState>;

    async fn prepare(&self, task: &Task) -> Result<()>;

    async fn clean_up(&self, task: &Task) -> Result<()>;

    async fn take_over(&self, task: &Task) -> Result<()>;

    /// Prepare in-band cleaning; `Some(state)` asks the framework to wait
    async fn prepare_cleaning(&self, task: &Task) -> Result<Option<ProvisionState>>;

    async fn tear_down_cleaning(&self, task: &Task) -> Result<()>;
}

/// Boot role of a hardware type
#[async_trait]
pub trait BootInterface: Send + Sync {
    async fn validate(&self, task: &Task) -> Result<()>;

    async fn prepare_ramdisk(&self, task: &Task) -> Result<()>;

    async fn clean_up_ramdisk(&self, task: &Task) -> Result<()>;

    async fn prepare_instance(&self, task: &Task) -> Result<()>;

    async fn clean_up_instance(&self, task: &Task) -> Result<()>;
}

// =============================================================================
// Collaborator ports consumed from the framework
// =============================================================================

/// Sends one JSON command to a DPU's control endpoint.
///
/// No retry at this layer; retry policy belongs to callers.
#[async_trait]
pub trait CommandSender: Send + Sync {
    async fn send(
        &self,
        dpu_address: &str,
        command: &str,
        params: serde_json::Value,
    ) -> Result<serde_json::Value>;
}

/// Network reconfiguration operations
#[async_trait]
pub trait NetworkProvider: Send + Sync {
    async fn remove_provisioning_network(&self, task: &Task) -> Result<()>;

    async fn configure_tenant_networks(&self, task: &Task) -> Result<()>;

    async fn unconfigure_tenant_networks(&self, task: &Task) -> Result<()>;
}

/// Sets the node's boot device through the management channel
#[async_trait]
pub trait BootDeviceManager: Send + Sync {
    async fn set_boot_device(
        &self,
        task: &Task,
        device: BootDevice,
        persistent: bool,
    ) -> Result<()>;
}

/// Opaque remote power-control executor, keyed by node driver info
#[async_trait]
pub trait PowerExecutor: Send + Sync {
    /// Immediate power cycle
    async fn reset(&self, task: &Task) -> Result<()>;

    /// Hold a network-safe power state; must be paired with
    /// [`PowerExecutor::end_network_configuration`] on every path
    async fn begin_network_configuration(&self, task: &Task) -> Result<()>;

    async fn end_network_configuration(&self, task: &Task) -> Result<()>;
}

/// Persistence of volume target records (owned by the framework registry)
#[async_trait]
pub trait VolumeTargetStore: Send + Sync {
    async fn list_by_volume_id(&self, volume_id: &str) -> Result<Vec<VolumeTarget>>;

    async fn save(&self, target: &VolumeTarget) -> Result<()>;
}

/// Generic deploy utilities implemented by the framework
#[async_trait]
pub trait DeployUtils: Send + Sync {
    /// Check generic capability values (boot mode, disk label, ...) on the
    /// node
    async fn validate_capabilities(&self, task: &Task) -> Result<()>;

    async fn tear_down_storage_configuration(&self, task: &Task) -> Result<()>;

    async fn prepare_inband_cleaning(
        &self,
        task: &Task,
        manage_boot: bool,
    ) -> Result<Option<ProvisionState>>;

    async fn tear_down_inband_cleaning(&self, task: &Task, manage_boot: bool) -> Result<()>;
}

/// DHCP lease cleanup
#[async_trait]
pub trait DhcpProvider: Send + Sync {
    async fn clean_dhcp(&self, task: &Task) -> Result<()>;
}

/// Cached deploy image cleanup
#[async_trait]
pub trait ImageStore: Send + Sync {
    async fn destroy_images(&self, node_uuid: &str) -> Result<()>;
}

// =============================================================================
// Type Aliases for Arc'd Traits
// =============================================================================

/// Bundle of framework-implemented ports handed to the composition root
#[derive(Clone)]
pub struct FrameworkPorts {
    pub network: NetworkProviderRef,
    pub boot_device: BootDeviceManagerRef,
    pub power: PowerExecutorRef,
    pub volume_targets: VolumeTargetStoreRef,
    pub deploy_utils: DeployUtilsRef,
    pub dhcp: DhcpProviderRef,
    pub images: ImageStoreRef,
}

pub type StorageInterfaceRef = Arc<dyn StorageInterface>;
pub type DeployInterfaceRef = Arc<dyn DeployInterface>;
pub type BootInterfaceRef = Arc<dyn BootInterface>;
pub type CommandSenderRef = Arc<dyn CommandSender>;
pub type NetworkProviderRef = Arc<dyn NetworkProvider>;
pub type BootDeviceManagerRef = Arc<dyn BootDeviceManager>;
pub type PowerExecutorRef = Arc<dyn PowerExecutor>;
pub type VolumeTargetStoreRef = Arc<dyn VolumeTargetStore>;
pub type DeployUtilsRef = Arc<dyn DeployUtils>;
pub type DhcpProviderRef = Arc<dyn DhcpProvider>;
pub type ImageStoreRef = Arc<dyn ImageStore>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_boot_device_display() {
        assert_eq!(format!("{}", BootDevice::Disk), "disk");
        assert_eq!(format!("{}", BootDevice::Pxe), "pxe");
        assert_eq!(format!("{}", BootDevice::Cdrom), "cdrom");
    }
}
