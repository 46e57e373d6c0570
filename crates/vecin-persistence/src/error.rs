//! Errores de persistencia.
//! Mapea errores de Diesel / conexión a variantes semánticas y de ahí a
//! `StoreError` del core.

use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;
use vecin_core::StoreError;

#[derive(Debug, Error)]
pub enum PersistenceError {
    #[error("unique violation: {0}")]
    UniqueViolation(String),
    #[error("check violation: {0}")]
    CheckViolation(String),
    #[error("foreign key violation: {0}")]
    ForeignKeyViolation(String),
    #[error("not found")]
    NotFound,
    #[error("serialization conflict (retryable)")]
    SerializationConflict,
    #[error("transient IO / connection pool error: {0}")]
    TransientIo(String),
    #[error("fila inválida: {0}")]
    InvalidRow(String),
    #[error("configuración: {0}")]
    Config(String),
    #[error("unknown database error: {0}")]
    Unknown(String),
}

impl From<DieselError> for PersistenceError {
    fn from(err: DieselError) -> Self {
        match err {
            DieselError::NotFound => Self::NotFound,
            DieselError::DatabaseError(kind, info) => match kind {
                DatabaseErrorKind::UniqueViolation => Self::UniqueViolation(info.message().to_string()),
                DatabaseErrorKind::CheckViolation => Self::CheckViolation(info.message().to_string()),
                DatabaseErrorKind::ForeignKeyViolation => Self::ForeignKeyViolation(info.message().to_string()),
                DatabaseErrorKind::SerializationFailure => Self::SerializationConflict,
                DatabaseErrorKind::ClosedConnection => Self::TransientIo(info.message().to_string()),
                other => Self::Unknown(format!("db error kind {:?}: {}", other, info.message())),
            },
            DieselError::BrokenTransactionManager => Self::TransientIo("broken transaction manager".into()),
            other => Self::Unknown(format!("diesel: {other}")),
        }
    }
}

impl From<PersistenceError> for StoreError {
    fn from(err: PersistenceError) -> Self {
        StoreError::Backend(err.to_string())
    }
}

impl PersistenceError {
    /// Transitorio: se recomienda reintentar con backoff.
    pub fn is_retryable(&self) -> bool {
        match self {
            PersistenceError::SerializationConflict | PersistenceError::TransientIo(_) => true,
            // Algunos drivers entregan estos casos sólo como texto.
            PersistenceError::Unknown(msg) => {
                let m = msg.to_lowercase();
                m.contains("deadlock detected")
                || m.contains("could not serialize access")
                || m.contains("connection closed")
                || m.contains("connection refused")
                || m.contains("timeout")
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retryable_classification() {
        assert!(PersistenceError::SerializationConflict.is_retryable());
        assert!(PersistenceError::TransientIo("pool".into()).is_retryable());
        assert!(PersistenceError::Unknown("ERROR: deadlock detected".into()).is_retryable());
        assert!(!PersistenceError::CheckViolation("estado_por_tipo".into()).is_retryable());
        assert!(!PersistenceError::NotFound.is_retryable());
    }

    #[test]
    fn converts_into_backend_store_error() {
        let e: StoreError = PersistenceError::TransientIo("pool agotado".into()).into();
        assert_eq!(e, StoreError::Backend("transient IO / connection pool error: pool agotado".into()));
    }
}
