//! Equipment tracking feature.
//!
//! Units are tracked through an append-only audit log. Every mutation appends an entry and moves
//! the unit's `current_entry_id` pointer in the same transaction; listings read the current
//! state through that pointer.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | GET | `/api/equipment` | List units with their current status |
//! | POST | `/api/equipment` | Register a unit and its initial status |
//! | GET | `/api/equipment/{id}` | Current state of one unit |
//! | PUT | `/api/equipment/{id}` | Update attributes and record a new status |
//! | PUT | `/api/equipment/batch` | Record status changes for many units |
//! | DELETE | `/api/equipment/{id}` | Delete a unit and its history |
//! | GET | `/api/equipment/status_counts` | Distribution of current statuses |
//! | GET | `/api/equipment/logs/{id}` | Audit history, newest first |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use services::{EquipmentService, StatusService};
