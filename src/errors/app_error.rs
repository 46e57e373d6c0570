use thiserror::Error;
use vecin_adapters::TransportError;
use vecin_core::{classify_error, ErrorClass, WorkflowError};
use vecin_persistence::PersistenceError;

/// Error de nivel aplicación.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Configuración inválida: {0}")]
    Config(String),
    #[error(transparent)]
    Workflow(#[from] WorkflowError),
    #[error("Persistencia: {0}")]
    Persistence(#[from] PersistenceError),
    #[error("Avisos: {0}")]
    Transport(#[from] TransportError),
}

impl AppError {
    /// Código de salida para binarios: 2 configuración, 3 conflicto
    /// concurrente, 4 rechazo del flujo, 5 infraestructura.
    pub fn exit_code(&self) -> i32 {
        match self {
            AppError::Config(_) => 2,
            AppError::Workflow(e) => match classify_error(e) {
                ErrorClass::Conflict => 3,
                ErrorClass::Structural | ErrorClass::Validation => 4,
                ErrorClass::Transient => 5,
            },
            AppError::Persistence(PersistenceError::Config(_)) => 2,
            AppError::Persistence(_) | AppError::Transport(_) => 5,
        }
    }
}
