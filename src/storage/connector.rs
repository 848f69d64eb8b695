//! Connection descriptor resolution
//!
//! Derives a single logical connection descriptor from a node's declared
//! volume connectors. Exactly one usable initiator connector is expected;
//! extras produce warnings, never errors.

use crate::config::MultipathPolicy;
use crate::error::{Error, Result};
use crate::model::{valid_dpu_types_label, ConnectionDescriptor, VolumeConnector};
use tracing::{error, warn};

/// Build a [`ConnectionDescriptor`] for a node from its connectors.
///
/// The scan is a single pass in declaration order: the first iqn-family
/// connector populates the initiator, the first ip-family connector
/// populates the address. Duplicates and unrecognized types are skipped
/// with a warning. Deterministic for a given connector sequence.
pub fn resolve_connection(
    connectors: &[VolumeConnector],
    node_uuid: &str,
    multipath_policy: MultipathPolicy,
) -> Result<ConnectionDescriptor> {
    let mut initiator: Option<String> = None;
    let mut ip: Option<String> = None;

    for connector in connectors {
        let id = match connector.connector_id.as_deref() {
            Some(id) => id,
            None => {
                warn!(
                    "Node {} has a volume_connector ({}) with no connector_id; skipping",
                    node_uuid, connector.uuid
                );
                continue;
            }
        };

        if connector.connector_type.is_initiator() && initiator.is_none() {
            initiator = Some(id.to_string());
        } else if connector.connector_type.is_address() && ip.is_none() {
            ip = Some(id.to_string());
        } else {
            warn!(
                "Node {} has a volume_connector ({}) defined with an unsupported type: {}",
                node_uuid, connector.uuid, connector.connector_type
            );
        }
    }

    let initiator = match initiator {
        Some(initiator) => initiator,
        None => {
            let err = Error::StorageConfig {
                node: node_uuid.to_string(),
                valid_types: valid_dpu_types_label(),
            };
            error!("{}", err);
            return Err(err);
        }
    };

    let mut descriptor = ConnectionDescriptor {
        initiator,
        ip,
        host: node_uuid.to_string(),
        multipath: false,
    };

    descriptor.multipath = match multipath_policy {
        MultipathPolicy::ConnectorAndFieldCount => {
            connectors.len() > 1 && descriptor.populated_fields() > 1
        }
        MultipathPolicy::ConnectorCount => connectors.len() > 1,
        MultipathPolicy::Disabled => false,
    };

    Ok(descriptor)
}
