//! Back-office collaborators: capability checks and audit trails.
//!
//! The navigation core never calls into these; they are the interfaces the
//! admin pages are written against, with in-memory implementations for the
//! development server and tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use serde::{Deserialize, Serialize};

/// Something a back-office user may be allowed to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    ViewBookings,
    ManageBookings,
    ViewPayments,
    ManagePayments,
    ManageHousekeeping,
    ManageMaintenance,
    ViewAuditLogs,
    ManagePermissions,
}

pub trait PermissionCheck {
    fn has_permission(&self, user_id: u64, capability: Capability) -> bool;
}

/// Role based permissions: users are assigned one role, roles grant capabilities.
#[derive(Debug, Default, Clone)]
pub struct RoleTable {
    roles: HashMap<String, HashSet<Capability>>,
    assignments: HashMap<u64, String>,
}

impl RoleTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn role(
        mut self,
        name: impl Into<String>,
        capabilities: impl IntoIterator<Item = Capability>,
    ) -> Self {
        self.roles
            .entry(name.into())
            .or_default()
            .extend(capabilities);
        self
    }

    pub fn assign(mut self, user_id: u64, role: impl Into<String>) -> Self {
        self.assignments.insert(user_id, role.into());
        self
    }
}

impl PermissionCheck for RoleTable {
    fn has_permission(&self, user_id: u64, capability: Capability) -> bool {
        self.assignments
            .get(&user_id)
            .and_then(|role| self.roles.get(role))
            .is_some_and(|granted| granted.contains(&capability))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditEntity {
    Booking,
    Payment,
    Housekeeping,
    Maintenance,
}

/// A change to record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditRecord {
    pub entity: AuditEntity,
    pub entity_id: u64,
    pub action: String,
    pub old_values: serde_json::Value,
    pub new_values: serde_json::Value,
    pub performed_by: u64,
    pub performed_by_name: String,
}

/// A recorded change, numbered in insertion order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuditEntry {
    pub sequence: u64,
    #[serde(flatten)]
    pub record: AuditRecord,
}

pub trait AuditLog {
    /// Persist a change; `false` when it could not be stored.
    fn log(&self, record: AuditRecord) -> bool;

    /// Every change recorded for one entity, newest first.
    fn entries(&self, entity: AuditEntity, entity_id: u64) -> Vec<AuditEntry>;
}

#[derive(Debug, Default)]
pub struct MemoryAuditLog {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditLog {
    pub fn new() -> Self {
        Self::default()
    }
}

impl AuditLog for MemoryAuditLog {
    fn log(&self, record: AuditRecord) -> bool {
        let Ok(mut entries) = self.entries.lock() else {
            return false;
        };

        let sequence = entries.len() as u64 + 1;
        entries.push(AuditEntry { sequence, record });

        true
    }

    fn entries(&self, entity: AuditEntity, entity_id: u64) -> Vec<AuditEntry> {
        let Ok(entries) = self.entries.lock() else {
            return Vec::new();
        };

        entries
            .iter()
            .rev()
            .filter(|entry| entry.record.entity == entity && entry.record.entity_id == entity_id)
            .cloned()
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_role_table() {
        let table = RoleTable::new()
            .role("front-desk", [Capability::ViewBookings, Capability::ManageBookings])
            .role("manager", [Capability::ViewAuditLogs])
            .role("manager", [Capability::ManagePermissions])
            .assign(1, "front-desk")
            .assign(2, "manager");

        assert!(table.has_permission(1, Capability::ManageBookings));
        assert!(!table.has_permission(1, Capability::ViewAuditLogs));
        assert!(table.has_permission(2, Capability::ViewAuditLogs));
        assert!(table.has_permission(2, Capability::ManagePermissions));
        assert!(!table.has_permission(3, Capability::ViewBookings));
    }

    #[test]
    fn test_memory_audit_log() {
        let log = MemoryAuditLog::new();
        let record = |entity, entity_id, action: &str| AuditRecord {
            entity,
            entity_id,
            action: action.to_owned(),
            old_values: json!({ "status": "pending" }),
            new_values: json!({ "status": "confirmed" }),
            performed_by: 7,
            performed_by_name: "Ada".to_owned(),
        };

        assert!(log.log(record(AuditEntity::Booking, 10, "confirm")));
        assert!(log.log(record(AuditEntity::Payment, 10, "refund")));
        assert!(log.log(record(AuditEntity::Booking, 10, "cancel")));

        let entries = log.entries(AuditEntity::Booking, 10);
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].record.action, "cancel");
        assert_eq!(entries[0].sequence, 3);
        assert_eq!(entries[1].record.action, "confirm");
        assert!(log.entries(AuditEntity::Booking, 11).is_empty());
    }
}
