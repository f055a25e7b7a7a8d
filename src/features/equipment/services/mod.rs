pub mod audit_log;
mod equipment_service;
mod status_service;

pub use equipment_service::EquipmentService;
pub use status_service::StatusService;
