//! Store error types.

use thiserror::Error;
use uuid::Uuid;

/// Coarse classification of a [`StoreError`].
///
/// Callers that only need to tell bad input from a rejected write, a missing
/// item or an unreachable backend can match on this instead of the variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The caller supplied invalid input.
    InvalidArgument,
    /// The store rejected a conflicting write.
    Conflict,
    /// The requested item does not exist.
    NotFound,
    /// The backend could not be reached.
    Unavailable,
    /// Any other backend failure.
    Internal,
}

/// Top-level event store error type.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Invalid input such as an empty batch or an inverted range.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// Optimistic concurrency conflict: the revision or the event id is taken.
    #[error(
        "conflict on aggregate {aggregate_id}: event {event_id} at revision {revision} \
         clashes with a stored revision or event id"
    )]
    Conflict {
        /// The aggregate that had the conflict.
        aggregate_id: Uuid,
        /// The event that was rejected.
        event_id: Uuid,
        /// The revision the rejected event carried.
        revision: i64,
    },

    /// The aggregate has no stored events.
    #[error("aggregate not found: {0}")]
    AggregateNotFound(Uuid),

    /// No snapshot has been captured for the aggregate.
    #[error("snapshot not found for aggregate {0}")]
    SnapshotNotFound(Uuid),

    /// The backend is unreachable or the store failed to initialize.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// An infrastructure/persistence error.
    #[error("infrastructure error: {0}")]
    Infrastructure(String),
}

impl StoreError {
    /// Returns the coarse classification of this error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::InvalidArgument(_) => ErrorKind::InvalidArgument,
            Self::Conflict { .. } => ErrorKind::Conflict,
            Self::AggregateNotFound(_) | Self::SnapshotNotFound(_) => ErrorKind::NotFound,
            Self::Unavailable(_) => ErrorKind::Unavailable,
            Self::Infrastructure(_) => ErrorKind::Internal,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found_variants_share_a_kind() {
        let id = Uuid::new_v4();
        assert_eq!(StoreError::AggregateNotFound(id).kind(), ErrorKind::NotFound);
        assert_eq!(StoreError::SnapshotNotFound(id).kind(), ErrorKind::NotFound);
    }

    #[test]
    fn test_conflict_message_names_event_and_both_causes() {
        let id = Uuid::new_v4();
        let event_id = Uuid::new_v4();
        let err = StoreError::Conflict {
            aggregate_id: id,
            event_id,
            revision: 7,
        };
        assert_eq!(err.kind(), ErrorKind::Conflict);
        assert_eq!(
            err.to_string(),
            format!(
                "conflict on aggregate {id}: event {event_id} at revision 7 \
                 clashes with a stored revision or event id"
            )
        );
    }

    #[test]
    fn test_remaining_kinds() {
        assert_eq!(
            StoreError::InvalidArgument("x".into()).kind(),
            ErrorKind::InvalidArgument
        );
        assert_eq!(
            StoreError::Unavailable("down".into()).kind(),
            ErrorKind::Unavailable
        );
        assert_eq!(
            StoreError::Infrastructure("bad row".into()).kind(),
            ErrorKind::Internal
        );
    }
}
