//! Volume connector and target models
//!
//! Connectors declare how a node can be reached for storage purposes;
//! targets declare the volumes to attach. Both are created and persisted by
//! the framework before a deploy starts.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Volume type literal accepted by the DPU storage interface
pub const DPU_VOLUME_TYPE: &str = "DPU";

/// Connector types usable as a DPU initiator
pub const VALID_DPU_TYPES: &[ConnectorType] = &[ConnectorType::Iqn];

/// Comma-joined label of [`VALID_DPU_TYPES`], for error messages
pub fn valid_dpu_types_label() -> String {
    VALID_DPU_TYPES
        .iter()
        .map(ConnectorType::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

// =============================================================================
// Connectors
// =============================================================================

/// Declared means of reaching a node for storage purposes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectorType {
    Iqn,
    Ip,
    Mac,
    Wwnn,
    Wwpn,
}

impl ConnectorType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConnectorType::Iqn => "iqn",
            ConnectorType::Ip => "ip",
            ConnectorType::Mac => "mac",
            ConnectorType::Wwnn => "wwnn",
            ConnectorType::Wwpn => "wwpn",
        }
    }

    /// Whether this type carries an initiator identity (iqn family)
    pub fn is_initiator(&self) -> bool {
        matches!(self, ConnectorType::Iqn)
    }

    /// Whether this type carries a network address (ip family)
    pub fn is_address(&self) -> bool {
        matches!(self, ConnectorType::Ip)
    }
}

impl std::fmt::Display for ConnectorType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A node's declared storage connector record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeConnector {
    pub uuid: String,
    #[serde(rename = "type")]
    pub connector_type: ConnectorType,
    pub connector_id: Option<String>,
}

// =============================================================================
// Targets
// =============================================================================

/// A declared volume to be attached, with a boot-order hint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolumeTarget {
    pub uuid: String,
    pub volume_id: Option<String>,
    pub volume_type: String,
    /// 0 marks the boot volume
    pub boot_index: i64,
    /// Connection result data, written back after a successful attach
    #[serde(default)]
    pub properties: BTreeMap<String, serde_json::Value>,
}

// =============================================================================
// Connection Descriptor
// =============================================================================

/// Ephemeral connection descriptor built per attach/detach cycle.
///
/// Never persisted. A rollback after a partial attach must reuse the same
/// descriptor so the disconnect targets the same DPU session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConnectionDescriptor {
    /// Initiator identity (IQN)
    pub initiator: String,
    /// Initiator-side network address, when an ip connector was declared
    pub ip: Option<String>,
    /// Node uuid
    pub host: String,
    pub multipath: bool,
}

impl ConnectionDescriptor {
    /// Number of populated payload fields (initiator and ip; host and the
    /// multipath flag are bookkeeping, not payload)
    pub fn populated_fields(&self) -> usize {
        1 + usize::from(self.ip.is_some())
    }
}

// =============================================================================
// Attachment Record
// =============================================================================

/// Result of a successful attach, correlating an attached volume back to
/// its persisted targets
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AttachmentRecord {
    pub volume_id: String,
    pub connection_data: BTreeMap<String, serde_json::Value>,
    pub attached_at: DateTime<Utc>,
}

impl AttachmentRecord {
    pub fn new(volume_id: impl Into<String>) -> Self {
        let volume_id = volume_id.into();
        let mut connection_data = BTreeMap::new();
        connection_data.insert(
            "ironic_volume_uuid".to_string(),
            serde_json::Value::String(volume_id.clone()),
        );
        Self {
            volume_id,
            connection_data,
            attached_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connector_type_families() {
        assert!(ConnectorType::Iqn.is_initiator());
        assert!(!ConnectorType::Iqn.is_address());
        assert!(ConnectorType::Ip.is_address());
        assert!(!ConnectorType::Mac.is_initiator());
        assert!(!ConnectorType::Mac.is_address());
    }

    #[test]
    fn test_valid_types_label() {
        assert_eq!(valid_dpu_types_label(), "iqn");
    }

    #[test]
    fn test_attachment_record_correlation_key() {
        let record = AttachmentRecord::new("vol-1");
        assert_eq!(record.volume_id, "vol-1");
        assert_eq!(
            record.connection_data.get("ironic_volume_uuid"),
            Some(&serde_json::Value::String("vol-1".into()))
        );
    }

    #[test]
    fn test_connector_type_serde() {
        let connector: VolumeConnector = serde_json::from_str(
            r#"{"uuid": "c-1", "type": "iqn", "connector_id": "iqn.1993-08.org.debian:01:abc"}"#,
        )
        .unwrap();
        assert_eq!(connector.connector_type, ConnectorType::Iqn);
        assert_eq!(
            connector.connector_id.as_deref(),
            Some("iqn.1993-08.org.debian:01:abc")
        );
    }
}
