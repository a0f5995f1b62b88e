use vigil_core::AppError;

/// Maps a sqlx failure, keeping connectivity problems distinguishable from
/// bad data so callers can treat them as transient.
pub(crate) fn store_error(context: &str, error: sqlx::Error) -> AppError {
    match &error {
        sqlx::Error::PoolTimedOut
        | sqlx::Error::PoolClosed
        | sqlx::Error::Io(_)
        | sqlx::Error::Tls(_)
        | sqlx::Error::WorkerCrashed => AppError::Unavailable(format!("{context}: {error}")),
        _ => AppError::Internal(format!("{context}: {error}")),
    }
}

#[cfg(test)]
mod tests {
    use vigil_core::AppError;

    use super::store_error;

    #[test]
    fn pool_timeouts_are_transient() {
        let error = store_error("failed to load roles", sqlx::Error::PoolTimedOut);
        assert!(error.is_transient());
        assert!(matches!(error, AppError::Unavailable(message) if message.starts_with("failed to load roles")));
    }

    #[test]
    fn missing_rows_are_internal() {
        let error = store_error("failed to load roles", sqlx::Error::RowNotFound);
        assert!(matches!(error, AppError::Internal(_)));
    }
}
