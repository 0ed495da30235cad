use thiserror::Error;

/// Errors produced by the store layer.
#[derive(Error, Debug)]
pub enum StoreError {
    /// SQLite error.
    #[error("Database error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Failed to determine a platform data directory.
    #[error("Could not determine application data directory")]
    NoDataDir,

    /// Generic I/O error (e.g. creating the database directory).
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// A query expected exactly one row but found none.
    #[error("Record not found")]
    NotFound,

    /// A unique index rejected the write.
    #[error("Duplicate value for {0}")]
    Duplicate(String),

    /// The overlap guard rejected an active booking.
    #[error("Room already booked for an overlapping stay")]
    Overlap,

    /// The booking left the expected status before the write landed.
    #[error("Booking status changed concurrently")]
    StaleStatus,

    /// Migration failure.
    #[error("Migration error: {0}")]
    Migration(String),

    /// A JSON column could not be encoded or decoded.
    #[error("JSON column error: {0}")]
    Json(#[from] serde_json::Error),

    /// UUID parsing error.
    #[error("UUID error: {0}")]
    Uuid(#[from] uuid::Error),

    /// Chrono parsing error.
    #[error("Timestamp parse error: {0}")]
    ChronoParse(#[from] chrono::ParseError),
}

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Marker raised by the overlap triggers.
pub(crate) const OVERLAP_MARKER: &str = "booking_overlap";

/// Classify constraint failures raised by SQLite.
///
/// Unique index violations become [`StoreError::Duplicate`] naming the
/// offending column(s); the overlap trigger becomes [`StoreError::Overlap`].
pub(crate) fn classify(err: rusqlite::Error) -> StoreError {
    if let rusqlite::Error::SqliteFailure(code, Some(ref msg)) = err {
        if msg.contains(OVERLAP_MARKER) {
            return StoreError::Overlap;
        }
        if code.code == rusqlite::ErrorCode::ConstraintViolation {
            if let Some(columns) = msg.strip_prefix("UNIQUE constraint failed: ") {
                return StoreError::Duplicate(columns.to_string());
            }
        }
    }
    StoreError::Sqlite(err)
}

/// Map "no rows" to [`StoreError::NotFound`].
pub(crate) fn not_found(err: rusqlite::Error) -> StoreError {
    match err {
        rusqlite::Error::QueryReturnedNoRows => StoreError::NotFound,
        other => StoreError::Sqlite(other),
    }
}
