//! Issue reports filed against equipment units.
//!
//! Reports reference units loosely (no foreign key) and carry optional photos kept in the
//! configured blob store.
//!
//! ## Endpoints
//!
//! | Method | Endpoint | Description |
//! |--------|----------|-------------|
//! | POST | `/api/report/upload` | Submit a report (multipart) |
//! | GET | `/api/reports` | List reports, newest first |
//! | PUT | `/api/report/{id}` | Record processing of a report |
//! | DELETE | `/api/report/{id}` | Delete a report and its photos |

pub mod dtos;
pub mod handlers;
pub mod models;
pub mod routes;
pub mod services;

pub use services::ReportService;
