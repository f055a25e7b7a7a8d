mod audit_dto;
mod equipment_dto;

pub use audit_dto::*;
pub use equipment_dto::*;
