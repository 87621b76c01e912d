/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// Provider-assigned job identifiers are opaque strings.
pub type JobId = String;
