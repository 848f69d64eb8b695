//! DPU Deploy Interface
//!
//! Drives the end-to-end deploy and tear-down sequences for DPU-backed
//! nodes: heartbeat gating, volume attachment, network reconfiguration,
//! boot-device preparation, and the engaging power cycle. Composes the
//! storage and boot interfaces it needs rather than inheriting them.
//!
//! Deploy walks VALIDATING -> CHECK_HEARTBEAT -> ATTACHING ->
//! NETWORK_RECONFIG -> BOOT_PREP -> POWER_RESET -> DONE; a failure in any
//! step is terminal for the invocation.

use crate::config::DeployConfig;
use crate::domain::ports::{
    BootInterfaceRef, DeployInterface, DeployOutcome, FrameworkPorts, StorageInterfaceRef,
};
use crate::domain::task::Task;
use crate::error::{Error, Result};
use crate::model::ProvisionState;
use async_trait::async_trait;
use tokio::time::sleep;
use tracing::{debug, error, info};

/// Deploy interface backed by a DPU side-car
pub struct DpuDeploy {
    config: DeployConfig,
    storage: StorageInterfaceRef,
    boot: BootInterfaceRef,
    ports: FrameworkPorts,
}

impl DpuDeploy {
    pub fn new(
        config: DeployConfig,
        storage: StorageInterfaceRef,
        boot: BootInterfaceRef,
        ports: FrameworkPorts,
    ) -> Self {
        Self {
            config,
            storage,
            boot,
            ports,
        }
    }

    fn require_dpu_address(task: &Task) -> Result<String> {
        task.node
            .dpu_address()
            .map(str::to_string)
            .ok_or_else(|| Error::MissingDpuAddress {
                node: task.node.uuid.clone(),
            })
    }

    fn require_dpu_boot(task: &Task) -> Result<()> {
        if task.node.has_capability("dpu_boot") {
            return Ok(());
        }
        Err(Error::DeployFailed {
            node: task.node.uuid.clone(),
            reason: "Node lacks the capability for dpu_boot".into(),
        })
    }

    /// Best-effort immediate power cycle.
    ///
    /// A failed reset must not abort an otherwise-successful attach/detach
    /// sequence; errors are logged and swallowed.
    async fn power_reset(&self, task: &Task) {
        match self.ports.power.reset(task).await {
            Ok(()) => info!("Successfully reset power for node {}", task.node.uuid),
            Err(err) => error!(
                "Power reset failed for node {} with error: {}",
                task.node.uuid, err
            ),
        }
    }
}

#[async_trait]
impl DeployInterface for DpuDeploy {
    async fn validate(&self, task: &Task) -> Result<()> {
        self.boot.validate(task).await?;
        self.ports.deploy_utils.validate_capabilities(task).await?;

        if !self.storage.should_write_image(task) {
            debug!(
                "Skipping complete deployment interface validation for node {} as \
                 it is set to boot from a remote volume.",
                task.node.uuid
            );
        }
        Ok(())
    }

    async fn deploy(&self, task: &Task) -> Result<DeployOutcome> {
        let node_uuid = task.node.uuid.clone();
        info!(
            "Initiating deployment for node {} with {} target volume(s)",
            node_uuid,
            task.volume_targets.len()
        );

        let dpu_addr = Self::require_dpu_address(task)?;
        self.storage.check_heartbeat(&dpu_addr).await?;
        Self::require_dpu_boot(task)?;

        let connected =
            self.storage
                .attach_volumes(task)
                .await
                .map_err(|err| Error::DeployFailed {
                    node: node_uuid.clone(),
                    reason: format!(
                        "Encountered an issue while trying to attach volumes: {}",
                        err
                    ),
                })?;

        if connected.is_empty() && !task.volume_targets.is_empty() {
            return Err(Error::DeployFailed {
                node: node_uuid,
                reason: "Node has no volumes attached post-operation".into(),
            });
        }

        // Give the DPU time to surface the new block device before the
        // network flips over.
        sleep(self.config.post_attach_settle).await;
        info!("Successfully completed attach_volumes for node {}", node_uuid);

        self.ports.network.remove_provisioning_network(task).await?;
        self.ports.network.configure_tenant_networks(task).await?;
        info!(
            "Successfully completed network operations for node {}",
            node_uuid
        );

        self.boot.prepare_instance(task).await?;
        info!("Starting soft reboot for node {}", node_uuid);

        self.power_reset(task).await;
        info!("Successfully completed deployment for node {}", node_uuid);

        Ok(DeployOutcome::Wait)
    }

    async fn tear_down(&self, task: &Task) -> Result<ProvisionState> {
        let node_uuid = task.node.uuid.clone();
        info!(
            "Initiating teardown for node {} with {} target volume(s)",
            node_uuid,
            task.volume_targets.len()
        );

        let dpu_addr = Self::require_dpu_address(task)?;
        self.storage.check_heartbeat(&dpu_addr).await?;
        Self::require_dpu_boot(task)?;

        if let Err(err) = self.storage.detach_volumes(task, None, false).await {
            return Err(Error::DeployFailed {
                node: node_uuid,
                reason: format!(
                    "Encountered an issue while trying to detach volumes: {}",
                    err
                ),
            });
        }
        if let Err(err) = self.storage.check_heartbeat(&dpu_addr).await {
            return Err(Error::DeployFailed {
                node: node_uuid,
                reason: format!("DPU unreachable after volume detach: {}", err),
            });
        }
        info!("Successfully completed detach_volumes for node {}", node_uuid);

        self.ports
            .deploy_utils
            .tear_down_storage_configuration(task)
            .await?;

        // The node must not power off while its tenant networks are being
        // unwound; hold the power state across the whole block.
        self.ports.power.begin_network_configuration(task).await?;
        let network_result = {
            match self.ports.network.unconfigure_tenant_networks(task).await {
                // An unsuccessful deployment may have left ports on the
                // provisioning network which were not deleted.
                Ok(()) => self.ports.network.remove_provisioning_network(task).await,
                Err(err) => Err(err),
            }
        };
        let release_result = self.ports.power.end_network_configuration(task).await;
        network_result?;
        release_result?;
        info!(
            "Successfully completed network teardown for node {}",
            node_uuid
        );

        self.power_reset(task).await;
        info!("Successfully completed teardown for node {}", node_uuid);

        Ok(ProvisionState::Deleted)
    }

    async fn prepare(&self, _task: &Task) -> Result<()> {
        // Volumes attach during deploy itself; nothing to stage beforehand.
        Ok(())
    }

    async fn clean_up(&self, task: &Task) -> Result<()> {
        info!("Starting clean_up for node {}", task.node.uuid);
        self.ports.images.destroy_images(&task.node.uuid).await?;
        self.boot.clean_up_ramdisk(task).await?;
        self.boot.clean_up_instance(task).await?;
        self.ports.dhcp.clean_dhcp(task).await?;
        Ok(())
    }

    async fn take_over(&self, _task: &Task) -> Result<()> {
        // nothing to do
        Ok(())
    }

    async fn prepare_cleaning(&self, task: &Task) -> Result<Option<ProvisionState>> {
        info!("Starting prepare_cleaning for node {}", task.node.uuid);
        self.ports
            .deploy_utils
            .prepare_inband_cleaning(task, true)
            .await
    }

    async fn tear_down_cleaning(&self, task: &Task) -> Result<()> {
        info!("Starting tear_down_cleaning for node {}", task.node.uuid);
        self.ports
            .deploy_utils
            .tear_down_inband_cleaning(task, true)
            .await
    }
}
