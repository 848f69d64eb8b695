//! Storage configuration validation
//!
//! State-independent checks run before any attach occurs, ordinarily during
//! the framework's validation phase. The first failing check aborts
//! validation; no check has side effects.

use crate::domain::task::Task;
use crate::error::{Error, Result};
use crate::model::{valid_dpu_types_label, DPU_VOLUME_TYPE, VALID_DPU_TYPES};
use tracing::{error, warn};

fn fail_validation(node_uuid: &str, reason: String) -> Error {
    let err = Error::InvalidParameter {
        node: node_uuid.to_string(),
        reason,
    };
    error!("{}", err);
    err
}

/// Census of the node's DPU-usable connectors.
///
/// More than one match is a warning, not an error; the first one wins.
fn dpu_connector_found(task: &Task) -> bool {
    let found: Vec<&str> = task
        .volume_connectors
        .iter()
        .filter(|connector| {
            VALID_DPU_TYPES.contains(&connector.connector_type)
                && connector.connector_id.is_some()
        })
        .map(|connector| connector.uuid.as_str())
        .collect();

    if found.len() > 1 {
        warn!(
            "Multiple possible DPU connectors, {:?} found, for node {}. \
             Only the first DPU connector, {}, will be utilized.",
            found, task.node.uuid, found[0]
        );
    }

    !found.is_empty()
}

fn validate_targets(task: &Task, dpu_found: bool, dpu_boot: bool) -> Result<()> {
    for target in &task.volume_targets {
        if target.volume_id.is_none() {
            return Err(fail_validation(
                &task.node.uuid,
                format!("volume_id missing from target {}.", target.uuid),
            ));
        }

        if target.volume_type == DPU_VOLUME_TYPE {
            if !dpu_boot && target.boot_index == 0 {
                return Err(fail_validation(
                    &task.node.uuid,
                    format!(
                        "Volume target {} is configured for 'DPU', however the \
                         capability 'dpu_boot' is not set for the node.",
                        target.uuid
                    ),
                ));
            }
            if !dpu_found {
                return Err(fail_validation(
                    &task.node.uuid,
                    format!(
                        "Volume target {} is configured for 'DPU', however no DPU \
                         connectors are configured for the node.",
                        target.uuid
                    ),
                ));
            }
        } else {
            return Err(fail_validation(
                &task.node.uuid,
                format!(
                    "Volume target {} is of an unknown type '{}'. Supported types: 'DPU'",
                    target.uuid, target.volume_type
                ),
            ));
        }
    }

    Ok(())
}

/// Validate the node's volume target/connector configuration against
/// DPU-boot capability requirements.
pub fn validate_storage(task: &Task) -> Result<()> {
    let dpu_found = dpu_connector_found(task);
    let dpu_boot = task.node.bool_capability("dpu_boot");

    if dpu_boot && !dpu_found {
        return Err(fail_validation(
            &task.node.uuid,
            format!(
                "In order to enable the 'dpu_boot' capability for the node, an \
                 associated volume_connector type must be valid for DPU ({}).",
                valid_dpu_types_label()
            ),
        ));
    }

    validate_targets(task, dpu_found, dpu_boot)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConnectorType, Node, VolumeConnector, VolumeTarget};
    use assert_matches::assert_matches;

    fn iqn_connector() -> VolumeConnector {
        VolumeConnector {
            uuid: "c-1".into(),
            connector_type: ConnectorType::Iqn,
            connector_id: Some("iqn.1993-08.org.debian:01:abc".into()),
        }
    }

    fn dpu_target(uuid: &str, boot_index: i64) -> VolumeTarget {
        VolumeTarget {
            uuid: uuid.into(),
            volume_id: Some(format!("vol-{}", uuid)),
            volume_type: DPU_VOLUME_TYPE.into(),
            boot_index,
            properties: Default::default(),
        }
    }

    fn task_with(dpu_boot: Option<&str>) -> Task {
        let mut node = Node::default();
        node.uuid = "node-1".into();
        if let Some(value) = dpu_boot {
            node.properties
                .capabilities
                .insert("dpu_boot".into(), value.into());
        }
        Task::new(node)
    }

    #[test]
    fn test_no_capability_no_connectors_passes() {
        let task = task_with(None);
        assert!(validate_storage(&task).is_ok());
    }

    #[test]
    fn test_capability_without_connector_fails() {
        let task = task_with(Some("true"));
        let err = validate_storage(&task).unwrap_err();
        assert_matches!(err, Error::InvalidParameter { node, .. } if node == "node-1");
    }

    #[test]
    fn test_capability_with_connector_passes() {
        let mut task = task_with(Some("true"));
        task.volume_connectors.push(iqn_connector());
        task.volume_targets.push(dpu_target("t-1", 0));
        assert!(validate_storage(&task).is_ok());
    }

    #[test]
    fn test_target_missing_volume_id_fails() {
        let mut task = task_with(Some("true"));
        task.volume_connectors.push(iqn_connector());
        let mut target = dpu_target("t-1", 0);
        target.volume_id = None;
        task.volume_targets.push(target);

        let err = validate_storage(&task).unwrap_err();
        assert_matches!(
            err,
            Error::InvalidParameter { reason, .. } if reason.contains("volume_id missing")
        );
    }

    #[test]
    fn test_boot_volume_requires_capability() {
        let mut task = task_with(None);
        task.volume_connectors.push(iqn_connector());
        task.volume_targets.push(dpu_target("t-1", 0));

        let err = validate_storage(&task).unwrap_err();
        assert_matches!(
            err,
            Error::InvalidParameter { reason, .. } if reason.contains("dpu_boot")
        );
    }

    #[test]
    fn test_non_boot_volume_without_capability_passes() {
        let mut task = task_with(None);
        task.volume_connectors.push(iqn_connector());
        task.volume_targets.push(dpu_target("t-1", 1));
        assert!(validate_storage(&task).is_ok());
    }

    #[test]
    fn test_dpu_target_without_connector_fails() {
        let mut task = task_with(None);
        task.volume_targets.push(dpu_target("t-1", 1));

        let err = validate_storage(&task).unwrap_err();
        assert_matches!(
            err,
            Error::InvalidParameter { reason, .. } if reason.contains("no DPU connectors")
        );
    }

    #[test]
    fn test_unknown_volume_type_fails() {
        let mut task = task_with(Some("true"));
        task.volume_connectors.push(iqn_connector());
        let mut target = dpu_target("t-1", 0);
        target.volume_type = "iscsi".into();
        task.volume_targets.push(target);

        let err = validate_storage(&task).unwrap_err();
        assert_matches!(
            err,
            Error::InvalidParameter { reason, .. } if reason.contains("unknown type 'iscsi'")
        );
    }

    #[test]
    fn test_connector_without_id_does_not_count() {
        let mut task = task_with(Some("true"));
        task.volume_connectors.push(VolumeConnector {
            uuid: "c-1".into(),
            connector_type: ConnectorType::Iqn,
            connector_id: None,
        });

        let err = validate_storage(&task).unwrap_err();
        assert_matches!(err, Error::InvalidParameter { .. });
    }
}
