use thiserror::Error;

/// Errores de validación del dominio (etiquetas desconocidas, estados fuera
/// del conjunto declarado, datos de transición incompletos).
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("estado desconocido: {0}")]
    UnknownEstado(String),
    #[error("tipo de entidad desconocido: {0}")]
    UnknownKind(String),
    #[error("rol desconocido: {0}")]
    UnknownRole(String),
    #[error("el estado '{estado}' no pertenece a {kind}")]
    EstadoNotInKind { kind: String, estado: String },
    #[error("el rechazo requiere un motivo_rechazo no vacío")]
    MissingRejectionReason,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn estado_not_in_kind_format() {
        let err = DomainError::EstadoNotInKind { kind: "reserva".into(),
                                                 estado: "asistio".into() };
        assert_eq!(err.to_string(), "el estado 'asistio' no pertenece a reserva");
    }
}
