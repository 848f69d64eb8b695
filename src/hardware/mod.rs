//! Hardware Type Registry
//!
//! Static composition table mapping hardware-type identifiers to the
//! interface variants they support. The table is resolved at process start
//! and never patched afterwards; the factory builds the composed driver for
//! a registered type from configuration and collaborator ports.

use crate::boot::DpuBoot;
use crate::config::DpuConfig;
use crate::deploy::DpuDeploy;
use crate::domain::ports::{
    BootInterfaceRef, CommandSenderRef, DeployInterfaceRef, FrameworkPorts, StorageInterfaceRef,
};
use crate::error::{Error, Result};
use crate::remote::DpuCommandClient;
use crate::storage::DpuStorage;
use parking_lot::RwLock;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Hardware type using ipmitool for power and management and a DPU side-car
/// for storage
pub const DPU_IPMITOOL: &str = "dpu-ipmitool";

/// Variant name of the DPU-backed interfaces
pub const DPU_VARIANT: &str = "dpu";

// =============================================================================
// Descriptors
// =============================================================================

/// Interface variants a hardware type composes, per role, in preference
/// order
#[derive(Debug, Clone, Default)]
pub struct HardwareDescriptor {
    pub power: Vec<String>,
    pub management: Vec<String>,
    pub console: Vec<String>,
    pub vendor: Vec<String>,
    pub boot: Vec<String>,
    pub deploy: Vec<String>,
    pub storage: Vec<String>,
}

impl HardwareDescriptor {
    /// Whether the DPU interface variants are available for every role this
    /// crate implements
    pub fn supports_dpu(&self) -> bool {
        [&self.boot, &self.deploy, &self.storage]
            .iter()
            .all(|variants| variants.iter().any(|variant| variant == DPU_VARIANT))
    }
}

fn dpu_ipmitool_descriptor() -> HardwareDescriptor {
    HardwareDescriptor {
        power: vec!["ipmitool".into()],
        management: vec!["ipmitool".into(), "noop".into()],
        console: vec![
            "ipmitool-socat".into(),
            "ipmitool-shellinabox".into(),
            "no-console".into(),
        ],
        vendor: vec!["ipmitool".into(), "no-vendor".into()],
        boot: vec!["pxe".into(), DPU_VARIANT.into()],
        deploy: vec!["agent".into(), DPU_VARIANT.into()],
        storage: vec!["noop".into(), DPU_VARIANT.into()],
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Registry of hardware types known to this process
pub struct HardwareRegistry {
    types: RwLock<BTreeMap<String, HardwareDescriptor>>,
}

impl HardwareRegistry {
    /// Create an empty registry
    pub fn new() -> Arc<Self> {
        Arc::new(Self {
            types: RwLock::new(BTreeMap::new()),
        })
    }

    /// Registry pre-loaded with the built-in hardware types
    pub fn with_defaults() -> Arc<Self> {
        let registry = Self::new();
        registry.register(DPU_IPMITOOL, dpu_ipmitool_descriptor());
        registry
    }

    /// Register a hardware type
    pub fn register(&self, name: impl Into<String>, descriptor: HardwareDescriptor) {
        let name = name.into();
        info!("Registering hardware type: {}", name);
        self.types.write().insert(name, descriptor);
    }

    /// Descriptor for a hardware type, if registered
    pub fn get(&self, name: &str) -> Option<HardwareDescriptor> {
        self.types.read().get(name).cloned()
    }

    /// Registered hardware type names
    pub fn names(&self) -> Vec<String> {
        self.types.read().keys().cloned().collect()
    }
}

// =============================================================================
// Driver Factory
// =============================================================================

/// Composed driver for one hardware type
#[derive(Clone)]
pub struct Driver {
    pub storage: StorageInterfaceRef,
    pub deploy: DeployInterfaceRef,
    pub boot: BootInterfaceRef,
}

impl std::fmt::Debug for Driver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Driver").finish_non_exhaustive()
    }
}

/// Factory building composed drivers from the registry
pub struct DriverFactory;

impl DriverFactory {
    /// Build the composed DPU driver for a registered hardware type
    pub fn create(
        registry: &HardwareRegistry,
        hardware_type: &str,
        config: DpuConfig,
        ports: FrameworkPorts,
    ) -> Result<Driver> {
        let descriptor = registry.get(hardware_type).ok_or_else(|| {
            Error::HardwareTypeUnknown {
                name: hardware_type.to_string(),
            }
        })?;

        if !descriptor.supports_dpu() {
            return Err(Error::Configuration(format!(
                "hardware type '{}' does not compose the '{}' interface variants",
                hardware_type, DPU_VARIANT
            )));
        }

        let sender: CommandSenderRef = Arc::new(DpuCommandClient::new(config.remote.clone()));
        let storage: StorageInterfaceRef = Arc::new(DpuStorage::new(
            config.storage.clone(),
            sender,
            ports.volume_targets.clone(),
        ));
        let boot: BootInterfaceRef = Arc::new(DpuBoot::new(ports.boot_device.clone()));
        let deploy: DeployInterfaceRef = Arc::new(DpuDeploy::new(
            config.deploy.clone(),
            storage.clone(),
            boot.clone(),
            ports.clone(),
        ));

        Ok(Driver {
            storage,
            deploy,
            boot,
        })
    }
}
