pub mod auth;
pub mod equipment;
pub mod issue_reports;
