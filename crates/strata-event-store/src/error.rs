//! Mapping from `sqlx` errors to store errors.

use strata_core::error::StoreError;
use strata_core::event::Event;

/// Classifies a backend error as `Unavailable` or `Infrastructure`.
pub(crate) fn map_sqlx_error(err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::WorkerCrashed => StoreError::Unavailable(err.to_string()),
        other => StoreError::Infrastructure(other.to_string()),
    }
}

/// Maps a failed insert of `event`: a unique violation is a `Conflict`.
pub(crate) fn map_insert_error(err: sqlx::Error, event: &Event) -> StoreError {
    if let sqlx::Error::Database(db) = &err
        && db.is_unique_violation()
    {
        return StoreError::Conflict {
            aggregate_id: event.aggregate_id(),
            event_id: event.id,
            revision: event.revision(),
        };
    }
    map_sqlx_error(err)
}

#[cfg(test)]
mod tests {
    use strata_core::error::ErrorKind;

    use super::*;

    #[test]
    fn test_pool_errors_are_unavailable() {
        assert_eq!(
            map_sqlx_error(sqlx::Error::PoolTimedOut).kind(),
            ErrorKind::Unavailable
        );
        assert_eq!(
            map_sqlx_error(sqlx::Error::PoolClosed).kind(),
            ErrorKind::Unavailable
        );
        let io = std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused");
        assert_eq!(map_sqlx_error(sqlx::Error::Io(io)).kind(), ErrorKind::Unavailable);
    }

    #[test]
    fn test_other_errors_are_internal() {
        assert_eq!(
            map_sqlx_error(sqlx::Error::RowNotFound).kind(),
            ErrorKind::Internal
        );
        assert_eq!(
            map_sqlx_error(sqlx::Error::Protocol("unexpected message".into())).kind(),
            ErrorKind::Internal
        );
    }
}
