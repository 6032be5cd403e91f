/// Session and user identifiers are UUIDs.
pub type SessionId = uuid::Uuid;
pub type UserId = uuid::Uuid;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
