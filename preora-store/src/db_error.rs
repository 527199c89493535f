use preora_core::CoreError;

const UNIQUE_VIOLATION: &str = "23505";

/// Translate a driver error into the core taxonomy
pub(crate) fn db_error(err: sqlx::Error) -> CoreError {
    if let Some(db_err) = err.as_database_error() {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return CoreError::Conflict(db_err.message().to_string());
        }
    }
    CoreError::PersistenceError(err.to_string())
}

pub(crate) fn decode_error(what: &str, detail: impl std::fmt::Display) -> CoreError {
    CoreError::PersistenceError(format!("corrupt {} row: {}", what, detail))
}
