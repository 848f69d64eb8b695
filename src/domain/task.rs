//! Per-node unit of work
//!
//! A [`Task`] is handed in by the framework for each deploy, tear-down, or
//! cleaning action. The framework guarantees it holds the node-exclusive
//! lock for the whole duration of the call; nothing in this crate acquires
//! or checks locks itself.

use crate::model::{Node, VolumeConnector, VolumeTarget};

/// Snapshot of a node and its declared volume records for one action.
///
/// Precondition: the caller holds the framework's exclusive lock on the
/// node until the action returns.
#[derive(Debug, Clone, Default)]
pub struct Task {
    pub node: Node,
    pub volume_targets: Vec<VolumeTarget>,
    pub volume_connectors: Vec<VolumeConnector>,
}

impl Task {
    pub fn new(node: Node) -> Self {
        Self {
            node,
            volume_targets: Vec::new(),
            volume_connectors: Vec::new(),
        }
    }

    /// Volume ids of all declared targets, in declaration order.
    ///
    /// Targets without a volume id are skipped; validation rejects them
    /// before any attach is attempted.
    pub fn target_volume_ids(&self) -> Vec<String> {
        self.volume_targets
            .iter()
            .filter_map(|target| target.volume_id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::VolumeTarget;

    #[test]
    fn test_target_volume_ids_order_and_filter() {
        let mut task = Task::default();
        task.volume_targets = vec![
            VolumeTarget {
                uuid: "t-1".into(),
                volume_id: Some("vol-1".into()),
                volume_type: "DPU".into(),
                boot_index: 0,
                properties: Default::default(),
            },
            VolumeTarget {
                uuid: "t-2".into(),
                volume_id: None,
                volume_type: "DPU".into(),
                boot_index: 1,
                properties: Default::default(),
            },
            VolumeTarget {
                uuid: "t-3".into(),
                volume_id: Some("vol-3".into()),
                volume_type: "DPU".into(),
                boot_index: 2,
                properties: Default::default(),
            },
        ];

        assert_eq!(task.target_volume_ids(), vec!["vol-1", "vol-3"]);
    }
}
