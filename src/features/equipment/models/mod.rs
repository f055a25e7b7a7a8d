mod audit_entry;
mod equipment_unit;

pub use audit_entry::{AuditEntry, NewAuditEntry};
pub use equipment_unit::EquipmentState;
