//! DPU Storage Interface
//!
//! The storage role of the DPU hardware type: configuration validation,
//! all-or-nothing volume attachment with rollback, best-effort detach, and
//! the heartbeat probe against the DPU command endpoint.

pub mod attachment;
pub mod connector;
pub mod validate;

pub use attachment::AttachmentEngine;
pub use connector::resolve_connection;
pub use validate::validate_storage;

use crate::config::StorageConfig;
use crate::domain::ports::{CommandSenderRef, StorageInterface, VolumeTargetStoreRef};
use crate::domain::task::Task;
use crate::error::{Error, Result};
use crate::model::{AttachmentRecord, ConnectionDescriptor};
use crate::remote::CMD_CHECK_HEARTBEAT;
use async_trait::async_trait;
use serde_json::json;
use tracing::info;

/// Storage interface backed by a DPU side-car
pub struct DpuStorage {
    engine: AttachmentEngine,
    sender: CommandSenderRef,
}

impl DpuStorage {
    pub fn new(
        config: StorageConfig,
        sender: CommandSenderRef,
        targets: VolumeTargetStoreRef,
    ) -> Self {
        Self {
            engine: AttachmentEngine::new(config, sender.clone(), targets),
            sender,
        }
    }
}

#[async_trait]
impl StorageInterface for DpuStorage {
    async fn validate(&self, task: &Task) -> Result<()> {
        validate_storage(task)
    }

    async fn attach_volumes(&self, task: &Task) -> Result<Vec<AttachmentRecord>> {
        self.engine.attach_all(task).await
    }

    async fn detach_volumes(
        &self,
        task: &Task,
        connector: Option<&ConnectionDescriptor>,
        aborting_attach: bool,
    ) -> Result<()> {
        self.engine.detach_all(task, connector, aborting_attach).await
    }

    fn should_write_image(&self, task: &Task) -> bool {
        if !task.node.instance_info.contains_key("image_source") {
            for target in &task.volume_targets {
                if target.boot_index == 0 {
                    return false;
                }
            }
        }
        true
    }

    async fn check_heartbeat(&self, ip_address: &str) -> Result<()> {
        info!("Checking heartbeat for DPU {}", ip_address);
        self.sender
            .send(ip_address, CMD_CHECK_HEARTBEAT, json!({"ip": ip_address}))
            .await
            .map_err(|err| Error::HeartbeatFailed {
                dpu_addr: ip_address.to_string(),
                reason: err.to_string(),
            })?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ports::{CommandSender, VolumeTargetStore};
    use crate::model::VolumeTarget;
    use assert_matches::assert_matches;
    use parking_lot::Mutex;
    use std::sync::Arc;

    struct FixedSender {
        fail: bool,
        calls: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl CommandSender for FixedSender {
        async fn send(
            &self,
            dpu_address: &str,
            command: &str,
            _params: serde_json::Value,
        ) -> Result<serde_json::Value> {
            self.calls
                .lock()
                .push((dpu_address.into(), command.into()));
            if self.fail {
                return Err(Error::RemoteCommand {
                    dpu_addr: dpu_address.into(),
                    command: command.into(),
                    reason: "unreachable".into(),
                });
            }
            Ok(serde_json::Value::String("ok".into()))
        }
    }

    struct NullStore;

    #[async_trait]
    impl VolumeTargetStore for NullStore {
        async fn list_by_volume_id(&self, _volume_id: &str) -> Result<Vec<VolumeTarget>> {
            Ok(Vec::new())
        }

        async fn save(&self, _target: &VolumeTarget) -> Result<()> {
            Ok(())
        }
    }

    fn storage_with(fail: bool) -> (DpuStorage, Arc<FixedSender>) {
        let sender = Arc::new(FixedSender {
            fail,
            calls: Mutex::new(Vec::new()),
        });
        let storage = DpuStorage::new(
            StorageConfig::default(),
            sender.clone(),
            Arc::new(NullStore),
        );
        (storage, sender)
    }

    fn boot_target() -> VolumeTarget {
        VolumeTarget {
            uuid: "t-1".into(),
            volume_id: Some("vol-1".into()),
            volume_type: "DPU".into(),
            boot_index: 0,
            properties: Default::default(),
        }
    }

    #[tokio::test]
    async fn test_check_heartbeat_sends_probe() {
        let (storage, sender) = storage_with(false);
        storage.check_heartbeat("192.168.3.18").await.unwrap();

        let calls = sender.calls.lock();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "192.168.3.18");
        assert_eq!(calls[0].1, CMD_CHECK_HEARTBEAT);
    }

    #[tokio::test]
    async fn test_check_heartbeat_failure() {
        let (storage, _sender) = storage_with(true);
        let err = storage.check_heartbeat("192.168.3.18").await.unwrap_err();
        assert_matches!(
            err,
            Error::HeartbeatFailed { dpu_addr, .. } if dpu_addr == "192.168.3.18"
        );
    }

    #[tokio::test]
    async fn test_should_write_image_false_for_remote_boot_volume() {
        let (storage, _sender) = storage_with(false);
        let mut task = Task::default();
        task.volume_targets.push(boot_target());
        assert!(!storage.should_write_image(&task));
    }

    #[tokio::test]
    async fn test_should_write_image_true_with_image_source() {
        let (storage, _sender) = storage_with(false);
        let mut task = Task::default();
        task.node
            .instance_info
            .insert("image_source".into(), serde_json::json!("http://image"));
        task.volume_targets.push(boot_target());
        assert!(storage.should_write_image(&task));
    }

    #[tokio::test]
    async fn test_should_write_image_true_without_boot_volume() {
        let (storage, _sender) = storage_with(false);
        let mut task = Task::default();
        let mut target = boot_target();
        target.boot_index = 1;
        task.volume_targets.push(target);
        assert!(storage.should_write_image(&task));
    }
}
