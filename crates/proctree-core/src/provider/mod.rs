//! Provider abstraction for process table sources.
//!
//! This module defines the `TableProvider` trait so the binary can render
//! either a live scan of `/proc` or a previously recorded snapshot through
//! the same code path.

mod live;
mod snapshot;

pub use live::LiveProvider;
pub use snapshot::{SnapshotProvider, to_json};

use crate::collector::{CollectError, UserResolver};
use crate::table::ProcessTable;

/// Error types that can occur while loading a process table.
#[derive(Debug, Clone, PartialEq)]
pub enum ProviderError {
    /// The source cannot be opened at all.
    Unavailable(String),
    /// I/O error while reading data.
    Io(String),
    /// Error parsing stored data.
    Parse(String),
}

impl std::fmt::Display for ProviderError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProviderError::Unavailable(msg) => write!(f, "Process table unavailable: {}", msg),
            ProviderError::Io(msg) => write!(f, "I/O error: {}", msg),
            ProviderError::Parse(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for ProviderError {}

impl From<CollectError> for ProviderError {
    fn from(e: CollectError) -> Self {
        match e {
            CollectError::Unavailable { .. } => ProviderError::Unavailable(e.to_string()),
            CollectError::Parse(msg) => ProviderError::Parse(msg),
            CollectError::ProcessGone(_) | CollectError::Io(_) => ProviderError::Io(e.to_string()),
        }
    }
}

/// Source of a process table snapshot.
pub trait TableProvider {
    /// Loads one snapshot of the process table.
    fn load(&self) -> Result<ProcessTable, ProviderError>;

    /// Returns the user resolver for UID -> username mapping, if available.
    fn user_resolver(&self) -> Option<&UserResolver> {
        None
    }

    /// Returns `true` if the table comes from the running system.
    fn is_live(&self) -> bool;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_collect_error_mapping() {
        let unavailable = CollectError::Unavailable {
            path: "/proc".into(),
            source: std::io::Error::from(std::io::ErrorKind::PermissionDenied),
        };
        assert!(matches!(
            ProviderError::from(unavailable),
            ProviderError::Unavailable(_)
        ));
        assert_eq!(
            ProviderError::from(CollectError::Parse("bad".into())),
            ProviderError::Parse("bad".into())
        );
    }
}
