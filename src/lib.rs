//! DPU Storage Operator
//!
//! Volume attachment and deploy orchestration for bare-metal nodes whose
//! storage is fronted by a DPU side-car. The provisioning framework itself
//! (locking, state persistence, task scheduling) stays outside this crate
//! and is reached through the collaborator ports in [`domain`].
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                      Provisioning Framework                          │
//! │        (task locks · node persistence · state transitions)           │
//! └───────────────┬────────────────────────────────────┬────────────────┘
//!                 │ storage / deploy / boot interfaces │ collaborator ports
//! ┌───────────────┴────────────────────────────────────┴────────────────┐
//! │                        Hardware Type Registry                        │
//! │              (static table, resolved at process start)               │
//! ├─────────────────────────────────────────────────────────────────────┤
//! │  ┌───────────────────┐  ┌───────────────────┐  ┌─────────────────┐  │
//! │  │    DpuStorage     │  │     DpuDeploy     │  │     DpuBoot     │  │
//! │  │ validate · attach │  │ deploy · teardown │  │ boot device to  │  │
//! │  │ rollback · detach │  │ heartbeat gating  │  │ disk before the │  │
//! │  │ retry budget      │  │ power reset       │  │ engaging reset  │  │
//! │  └─────────┬─────────┘  └─────────┬─────────┘  └─────────────────┘  │
//! │            └──────────┬───────────┘                                 │
//! │                ┌──────┴────────┐                                    │
//! │                │ DpuCommand-   │   POST /v1/commands/               │
//! │                │ Client        │──────────────────────▶ DPU agent   │
//! │                └───────────────┘                                    │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`hardware`]: hardware-type registry and driver factory
//! - [`storage`]: validation, connector resolution, attach/detach engine
//! - [`deploy`]: deploy and tear-down orchestration
//! - [`boot`]: boot-device preparation
//! - [`remote`]: DPU command channel
//! - [`domain`]: interface traits and the per-node task
//! - [`model`]: node and volume records
//! - [`config`]: retry, timeout, and policy knobs
//! - [`error`]: error types and handling

pub mod boot;
pub mod config;
pub mod deploy;
pub mod domain;
pub mod error;
pub mod hardware;
pub mod model;
pub mod remote;
pub mod storage;

// Re-export commonly used types
pub use boot::DpuBoot;
pub use config::{DeployConfig, DpuConfig, MultipathPolicy, RemoteConfig, StorageConfig};
pub use deploy::DpuDeploy;
pub use domain::ports::{
    BootDevice, BootDeviceManager, BootInterface, CommandSender, DeployInterface, DeployOutcome,
    DeployUtils, DhcpProvider, FrameworkPorts, ImageStore, NetworkProvider, PowerExecutor,
    StorageInterface, VolumeTargetStore,
};
pub use domain::task::Task;
pub use error::{Error, Result};
pub use hardware::{
    Driver, DriverFactory, HardwareDescriptor, HardwareRegistry, DPU_IPMITOOL,
};
pub use model::{
    AttachmentRecord, ConnectionDescriptor, ConnectorType, DpuExtra, Node, ProvisionState,
    VolumeConnector, VolumeTarget, DPU_VOLUME_TYPE,
};
pub use remote::DpuCommandClient;
pub use storage::DpuStorage;

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
