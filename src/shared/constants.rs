/// Status assigned to every newly submitted issue report
pub const REPORT_STATUS_PENDING: &str = "pending";

/// Bucket used by status counts for current entries that carry no status
pub const UNKNOWN_STATUS: &str = "unknown";

/// Image extensions accepted on report upload (compared case-insensitively)
pub const ALLOWED_IMAGE_EXTENSIONS: &[&str] = &["png", "jpg", "jpeg", "gif"];

/// Output format for every timestamp in API responses
pub const DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Unit ids shadowed by static routes under `/api/equipment/`
pub const RESERVED_UNIT_IDS: &[&str] = &["batch", "status_counts"];

/// Width of the identifier and label columns (`unit_id`, `status`, `issue_type`, ...)
pub const MAX_LABEL_LEN: usize = 50;
