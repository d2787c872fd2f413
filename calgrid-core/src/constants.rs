/// Timestamp format used by the events service, always in UTC.
pub const WIRE_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Id the service uses for events it has not stored yet.
pub const UNSAVED_ID: i64 = -1;

/// Months added to the window per edge extension.
pub const DEFAULT_BATCH_SIZE: usize = 3;

/// Distance from either window edge that triggers an extension.
pub const DEFAULT_EDGE_MARGIN: usize = 2;

/// Months whose event data stays resident before far-off months are evicted.
pub const DEFAULT_RESIDENT_MONTHS: usize = 12;

pub const DEFAULT_SERVER_URL: &str = "http://127.0.0.1:5000";

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;
