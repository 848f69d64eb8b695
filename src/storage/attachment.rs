//! Volume attachment engine
//!
//! Orchestrates attach/detach of a node's declared volumes against its DPU.
//! Attach is all-or-nothing: any failure rolls the whole batch back with the
//! same connection descriptor before the error surfaces. Detach is
//! best-effort cleanup with a bounded fixed-delay retry budget and never
//! propagates past it.

use crate::config::StorageConfig;
use crate::domain::ports::{CommandSenderRef, VolumeTargetStoreRef};
use crate::domain::task::Task;
use crate::error::{Error, Result};
use crate::model::{AttachmentRecord, ConnectionDescriptor, Node, ProvisionState};
use crate::remote::{CMD_CONNECT_CLOUD_DISK, CMD_DISCONNECT_CLOUD_DISK};
use crate::storage::connector::resolve_connection;
use serde_json::json;
use tokio::time::sleep;
use tracing::{error, info, warn};

/// Attach/detach orchestration against a single DPU
pub struct AttachmentEngine {
    config: StorageConfig,
    sender: CommandSenderRef,
    targets: VolumeTargetStoreRef,
}

impl AttachmentEngine {
    pub fn new(
        config: StorageConfig,
        sender: CommandSenderRef,
        targets: VolumeTargetStoreRef,
    ) -> Self {
        Self {
            config,
            sender,
            targets,
        }
    }

    /// Command parameters shared by connect and disconnect.
    ///
    /// A descriptor without an ip connector cannot address the volume
    /// session; surfaced as a storage error before any command goes out.
    fn connection_params(
        &self,
        descriptor: &ConnectionDescriptor,
        node_uuid: &str,
    ) -> Result<serde_json::Value> {
        let ip = descriptor.ip.as_deref().ok_or_else(|| Error::Storage {
            node: node_uuid.to_string(),
            reason: "connection descriptor has no ip connector; cannot address the \
                     volume session"
                .into(),
        })?;
        Ok(json!({"iqn": descriptor.initiator, "ip": ip}))
    }

    /// Attach all declared volumes for the task's node.
    ///
    /// No-op when no targets are declared. Never returns a partial success:
    /// on any failure the already-connected volumes are detached with the
    /// SAME descriptor and the original error is re-raised.
    pub async fn attach_all(&self, task: &Task) -> Result<Vec<AttachmentRecord>> {
        let node = &task.node;
        let volume_ids = task.target_volume_ids();
        if volume_ids.is_empty() {
            return Ok(Vec::new());
        }

        let descriptor = resolve_connection(
            &task.volume_connectors,
            &node.uuid,
            self.config.multipath_policy,
        )?;
        let dpu_addr = node
            .dpu_address()
            .ok_or_else(|| Error::MissingDpuAddress {
                node: node.uuid.clone(),
            })?
            .to_string();
        let params = self.connection_params(&descriptor, &node.uuid)?;

        let connected = match self
            .connect_batch(node, &dpu_addr, &volume_ids, &params)
            .await
        {
            Ok(connected) => connected,
            Err(err) => {
                error!("Error attaching volumes for node {}: {}", node.uuid, err);
                if let Err(detach_err) = self.detach_all(task, Some(&descriptor), true).await {
                    error!(
                        "Rollback detach failed for node {}: {}",
                        node.uuid, detach_err
                    );
                }
                return Err(err);
            }
        };

        if connected.len() != volume_ids.len() {
            error!(
                "The number of volumes defined for node {} does not match the number \
                 of attached volumes. Attempting detach and abort operation.",
                node.uuid
            );
            if let Err(detach_err) = self.detach_all(task, Some(&descriptor), true).await {
                error!(
                    "Rollback detach failed for node {}: {}",
                    node.uuid, detach_err
                );
            }
            return Err(Error::Storage {
                node: node.uuid.clone(),
                reason: "Mismatch between the number of configured volume targets and \
                         the number of completed attachments"
                    .into(),
            });
        }

        for record in &connected {
            let targets = self.targets.list_by_volume_id(&record.volume_id).await?;
            for mut target in targets {
                target.properties = record.connection_data.clone();
                self.targets.save(&target).await?;
            }
        }

        Ok(connected)
    }

    async fn connect_batch(
        &self,
        node: &Node,
        dpu_addr: &str,
        volume_ids: &[String],
        params: &serde_json::Value,
    ) -> Result<Vec<AttachmentRecord>> {
        let mut connected = Vec::with_capacity(volume_ids.len());
        for volume_id in volume_ids {
            self.sender
                .send(dpu_addr, CMD_CONNECT_CLOUD_DISK, params.clone())
                .await
                .map_err(|err| {
                    let wrapped = Error::Storage {
                        node: node.uuid.clone(),
                        reason: format!("Failed to connect volume {}: {}", volume_id, err),
                    };
                    error!("{}", wrapped);
                    wrapped
                })?;

            info!(
                "Successfully initialized volume {} for node {}",
                volume_id, node.uuid
            );
            connected.push(AttachmentRecord::new(volume_id.clone()));
        }
        Ok(connected)
    }

    /// Detach all declared volumes for the task's node.
    ///
    /// No-op when no targets are declared; resolves a fresh descriptor when
    /// none is supplied. Storage-level failures are retried on a fixed
    /// delay; after the budget is exhausted the failure is logged, not
    /// raised, so teardown can complete. Other error kinds propagate
    /// immediately.
    pub async fn detach_all(
        &self,
        task: &Task,
        connector: Option<&ConnectionDescriptor>,
        aborting_attach: bool,
    ) -> Result<()> {
        let node = &task.node;
        let volume_ids = task.target_volume_ids();
        if volume_ids.is_empty() {
            return Ok(());
        }

        let resolved;
        let descriptor = match connector {
            Some(descriptor) => descriptor,
            None => {
                resolved = resolve_connection(
                    &task.volume_connectors,
                    &node.uuid,
                    self.config.multipath_policy,
                )?;
                &resolved
            }
        };
        let dpu_addr = node
            .dpu_address()
            .ok_or_else(|| Error::MissingDpuAddress {
                node: node.uuid.clone(),
            })?
            .to_string();

        let max_attempts = self.config.action_retries.saturating_add(1);
        for attempt in 0..max_attempts {
            let err = match self
                .disconnect_batch(node, &dpu_addr, &volume_ids, descriptor)
                .await
            {
                Ok(()) => return Ok(()),
                Err(err) if err.is_retryable_during_detach() => err,
                Err(err) => return Err(err),
            };

            let message = if aborting_attach {
                format!(
                    "Error on aborting volume detach for node {}: {}.",
                    node.uuid, err
                )
            } else {
                format!("Error detaching volume for node {}: {}.", node.uuid, err)
            };

            if attempt + 1 < max_attempts {
                warn!("{} Re-attempting detachment.", message);
                sleep(self.config.action_retry_interval).await;
            } else {
                // Budget exhausted: log and continue, teardown must complete.
                let allow_errors = node.provision_state == ProvisionState::Active
                    || (aborting_attach && attempt > 0);
                if allow_errors {
                    warn!("{}", message);
                } else {
                    error!("{}", message);
                }
                return Ok(());
            }
        }

        Ok(())
    }

    async fn disconnect_batch(
        &self,
        node: &Node,
        dpu_addr: &str,
        volume_ids: &[String],
        descriptor: &ConnectionDescriptor,
    ) -> Result<()> {
        let params = self.connection_params(descriptor, &node.uuid)?;
        for volume_id in volume_ids {
            self.sender
                .send(dpu_addr, CMD_DISCONNECT_CLOUD_DISK, params.clone())
                .await
                .map_err(|err| {
                    let wrapped = Error::Storage {
                        node: node.uuid.clone(),
                        reason: format!("Failed to disconnect volume {}: {}", volume_id, err),
                    };
                    error!("{}", wrapped);
                    wrapped
                })?;

            info!(
                "Successfully detached volume {} for node {}",
                volume_id, node.uuid
            );
        }
        Ok(())
    }
}
