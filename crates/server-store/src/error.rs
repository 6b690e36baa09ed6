use rusqlite::ErrorCode;

pub type StoreResult<T> = Result<T, StoreError>;

/// Failures surfaced by [`crate::ServerStore`]. Nothing is retried internally.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Storage is unavailable, unreadable or corrupt.
    #[error("server store unavailable during {op}: {source}")]
    Io {
        op: &'static str,
        #[source]
        source: Box<dyn std::error::Error + Send + Sync>,
    },
    /// The schema rejected a write. Not expected in normal operation.
    #[error("server store constraint violated during {op}: {source}")]
    Constraint {
        op: &'static str,
        #[source]
        source: rusqlite::Error,
    },
}

impl StoreError {
    pub fn is_constraint(&self) -> bool {
        matches!(self, StoreError::Constraint { .. })
    }

    pub(crate) fn classify(op: &'static str, err: rusqlite::Error) -> Self {
        match &err {
            rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation => {
                StoreError::Constraint { op, source: err }
            }
            _ => StoreError::Io { op, source: Box::new(err) },
        }
    }
}

/// Attaches the failing operation name to a rusqlite result.
pub(crate) trait During<T> {
    fn during(self, op: &'static str) -> StoreResult<T>;
}

impl<T> During<T> for Result<T, rusqlite::Error> {
    fn during(self, op: &'static str) -> StoreResult<T> {
        self.map_err(|e| StoreError::classify(op, e))
    }
}
