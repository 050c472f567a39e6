//! Error taxonomy for organizer operations.

use thiserror::Error;

pub type Result<T, E = OrganizerError> = std::result::Result<T, E>;

#[derive(Debug, Error)]
pub enum OrganizerError {
    #[error("A tab named '{0}' already exists")]
    DuplicateName(String),

    #[error("{what} index {index} is out of range (length {len})")]
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        len: usize,
    },

    #[error("Unsupported operation: {0}")]
    UnsupportedOperation(String),

    #[error("Tab not found: {0}")]
    TabNotFound(String),

    #[error("{0} name must not be empty")]
    EmptyName(&'static str),

    #[error("Persistence failure: {0}")]
    Persistence(#[from] std::io::Error),

    #[error("Failed to encode or decode document: {0}")]
    Encode(#[from] serde_json::Error),
}

impl OrganizerError {
    pub fn out_of_range(what: &'static str, index: usize, len: usize) -> Self {
        Self::IndexOutOfRange { what, index, len }
    }

    pub fn unsupported(reason: impl Into<String>) -> Self {
        Self::UnsupportedOperation(reason.into())
    }
}
