use std::fmt;

#[derive(Debug)]
pub enum SortedIdsError {
    /// `remove_range` was called while edits were still buffered.
    PendingEdits { pending: usize },
    /// `remove_range` was called with `start > end` or `end >= len`.
    InvalidRange { start: usize, end: usize, len: usize },
    Config(String),
    Io(std::io::Error),
    Json(serde_json::Error),
    Other(String),
}

impl fmt::Display for SortedIdsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SortedIdsError::PendingEdits { pending } => write!(
                f,
                "Range removal requires resolved ids ({} pending edits)",
                pending
            ),
            SortedIdsError::InvalidRange { start, end, len } => write!(
                f,
                "Invalid range [{}, {}] for {} ids",
                start, end, len
            ),
            SortedIdsError::Config(e) => write!(f, "Config error: {}", e),
            SortedIdsError::Io(e) => write!(f, "IO error: {}", e),
            SortedIdsError::Json(e) => write!(f, "JSON error: {}", e),
            SortedIdsError::Other(e) => write!(f, "Error: {}", e),
        }
    }
}

impl std::error::Error for SortedIdsError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            SortedIdsError::Io(e) => Some(e),
            SortedIdsError::Json(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for SortedIdsError {
    fn from(err: std::io::Error) -> Self {
        SortedIdsError::Io(err)
    }
}

impl From<serde_json::Error> for SortedIdsError {
    fn from(err: serde_json::Error) -> Self {
        SortedIdsError::Json(err)
    }
}

impl From<String> for SortedIdsError {
    fn from(err: String) -> Self {
        SortedIdsError::Other(err)
    }
}

impl From<&str> for SortedIdsError {
    fn from(err: &str) -> Self {
        SortedIdsError::Other(err.to_string())
    }
}
