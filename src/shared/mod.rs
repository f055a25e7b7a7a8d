pub mod constants;
pub mod datetime;
pub mod test_helpers;
pub mod types;
pub mod validation;
