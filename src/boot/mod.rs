//! DPU Boot Interface
//!
//! Boot role of the DPU hardware type. The DPU presents the attached remote
//! volume as a local disk, so the only real work is pointing the node at
//! that disk before the engaging power cycle; ramdisk handling is not used.

use crate::domain::ports::{BootDevice, BootDeviceManagerRef, BootInterface};
use crate::domain::task::Task;
use crate::error::Result;
use async_trait::async_trait;
use tracing::{debug, warn};

use crate::model::ProvisionState;

/// Boot interface backed by a DPU-attached disk
pub struct DpuBoot {
    boot_device: BootDeviceManagerRef,
}

impl DpuBoot {
    pub fn new(boot_device: BootDeviceManagerRef) -> Self {
        Self { boot_device }
    }
}

#[async_trait]
impl BootInterface for DpuBoot {
    async fn validate(&self, _task: &Task) -> Result<()> {
        // nothing to do
        Ok(())
    }

    async fn prepare_ramdisk(&self, _task: &Task) -> Result<()> {
        // nothing to do
        Ok(())
    }

    async fn clean_up_ramdisk(&self, _task: &Task) -> Result<()> {
        // nothing to do
        Ok(())
    }

    /// Point the node at its disk unless it is already active.
    async fn prepare_instance(&self, task: &Task) -> Result<()> {
        if task.node.provision_state == ProvisionState::Active {
            warn!(
                "Node {} boot preparation skipped as it's already in active state",
                task.node.uuid
            );
            return Ok(());
        }

        self.boot_device
            .set_boot_device(task, BootDevice::Disk, true)
            .await?;
        debug!(
            "Node {} is set to boot from {}",
            task.node.uuid,
            BootDevice::Disk
        );
        Ok(())
    }

    async fn clean_up_instance(&self, _task: &Task) -> Result<()> {
        // nothing to do
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::BootDeviceManager;
    use parking_lot::Mutex;
    use std::sync::Arc;

    #[derive(Default)]
    struct RecordingBootDevice {
        calls: Mutex<Vec<(BootDevice, bool)>>,
    }

    #[async_trait]
    impl BootDeviceManager for RecordingBootDevice {
        async fn set_boot_device(
            &self,
            _task: &Task,
            device: BootDevice,
            persistent: bool,
        ) -> Result<()> {
            self.calls.lock().push((device, persistent));
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_prepare_instance_sets_disk_persistent() {
        let manager = Arc::new(RecordingBootDevice::default());
        let boot = DpuBoot::new(manager.clone());

        let mut task = Task::default();
        task.node.uuid = "node-1".into();
        task.node.provision_state = ProvisionState::DeployWait;

        boot.prepare_instance(&task).await.unwrap();
        assert_eq!(*manager.calls.lock(), vec![(BootDevice::Disk, true)]);
    }

    #[tokio::test]
    async fn test_prepare_instance_skips_active_node() {
        let manager = Arc::new(RecordingBootDevice::default());
        let boot = DpuBoot::new(manager.clone());

        let mut task = Task::default();
        task.node.provision_state = ProvisionState::Active;

        boot.prepare_instance(&task).await.unwrap();
        assert!(manager.calls.lock().is_empty());
    }
}
