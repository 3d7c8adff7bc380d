//! Error types for loading maps, syncing mutations, and local preconditions.
//!
//! None of these are fatal to an editing session. `LoadError` aborts a map
//! switch and leaves the previous map in place; `SyncError` reports a failed
//! remote mutation after the local state has already changed; `StoreError`
//! and `InteractionError` reject a command before anything changes.

use crate::doc::{MapId, PlacementId};

/// A map could not be loaded into the session.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    #[error("map not found: {0}")]
    NotFound(MapId),
    #[error("network failure: {0}")]
    NetworkFailure(String),
    /// A newer load was started before this one finished.
    #[error("load of map {0} superseded by a newer request")]
    Superseded(MapId),
}

impl LoadError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "E_MAP_NOT_FOUND",
            Self::NetworkFailure(_) => "E_NETWORK",
            Self::Superseded(_) => "E_LOAD_SUPERSEDED",
        }
    }
}

/// A remote mutation failed. Local state already reflects the optimistic value.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SyncError {
    #[error("network failure: {0}")]
    NetworkFailure(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("rejected by server: {0}")]
    ValidationRejected(String),
    #[error("not found on server")]
    NotFound,
}

impl SyncError {
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::NetworkFailure(_) => "E_NETWORK",
            Self::Conflict(_) => "E_CONFLICT",
            Self::ValidationRejected(_) => "E_VALIDATION",
            Self::NotFound => "E_NOT_FOUND",
        }
    }
}

/// A store command was rejected before any local change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum StoreError {
    #[error("no map loaded")]
    NoMapLoaded,
    #[error("unknown placement: {0}")]
    UnknownPlacement(PlacementId),
    /// The operation needs a server id and the placement is still being created.
    #[error("placement {0} is not confirmed by the server yet")]
    PendingPlacement(PlacementId),
}

/// An interaction transition was invalid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum InteractionError {
    #[error("cannot select unknown placement {0}")]
    UnknownPlacement(PlacementId),
}
