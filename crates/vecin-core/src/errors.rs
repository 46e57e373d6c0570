//! Taxonomía de errores del flujo de aprobación.

use chrono::{DateTime, Utc};
use thiserror::Error;
use uuid::Uuid;
use vecin_domain::{ActorRole, DomainError, EntityKind, Estado};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WorkflowError {
    /// La arista no existe en el grafo o el actor no puede recorrerla.
    #[error("transición ilegal en {kind}: {from} -> {to} (rol {role})")]
    IllegalTransition {
        kind: EntityKind,
        from: Estado,
        to: Estado,
        role: ActorRole,
    },
    #[error("{kind} {id} ya está en estado terminal '{estado}'")]
    TerminalState { kind: EntityKind, id: Uuid, estado: Estado },
    /// La escritura condicional perdió la carrera contra otra transición.
    #[error("conflicto de concurrencia en {kind} {id}; vuelva a leer el registro")]
    PersistenceConflict { kind: EntityKind, id: Uuid },
    #[error("{kind} {id} no encontrado")]
    NotFound { kind: EntityKind, id: Uuid },
    #[error("{kind} {id} ya existe")]
    Duplicate { kind: EntityKind, id: Uuid },
    #[error("actor {0} sin rol registrado")]
    UnknownActor(Uuid),
    #[error("la actividad de la inscripción {id} aún no termina (fin: {ends_at:?})")]
    ActivityNotFinished { id: Uuid, ends_at: Option<DateTime<Utc>> },
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("error de almacenamiento: {0}")]
    Store(String),
}

/// Errores que reporta un backend de `EntityStore` / `RoleDirectory`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{kind} {id} no encontrado")]
    NotFound { kind: EntityKind, id: Uuid },
    #[error("{kind} {id} ya existe")]
    Duplicate { kind: EntityKind, id: Uuid },
    #[error("backend: {0}")]
    Backend(String),
}

impl From<StoreError> for WorkflowError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound { kind, id } => WorkflowError::NotFound { kind, id },
            StoreError::Duplicate { kind, id } => WorkflowError::Duplicate { kind, id },
            StoreError::Backend(msg) => WorkflowError::Store(msg),
        }
    }
}

/// Falla del notificador. Sólo se registra en el log; nunca revierte la
/// transición ya confirmada.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("no se pudo despachar la notificación {event_id}: {reason}")]
pub struct NotificationDispatchError {
    pub event_id: String,
    pub reason: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorClass {
    /// Determinista: se informa al usuario, no se reintenta.
    Structural,
    /// Carrera perdida: admite a lo más un reintento revalidado.
    Conflict,
    /// Falla de infraestructura.
    Transient,
    /// Datos de entrada inválidos.
    Validation,
}

pub fn classify_error(e: &WorkflowError) -> ErrorClass {
    match e {
        WorkflowError::IllegalTransition { .. }
        | WorkflowError::TerminalState { .. }
        | WorkflowError::NotFound { .. }
        | WorkflowError::Duplicate { .. }
        | WorkflowError::UnknownActor(_)
        | WorkflowError::ActivityNotFinished { .. } => ErrorClass::Structural,
        WorkflowError::PersistenceConflict { .. } => ErrorClass::Conflict,
        WorkflowError::Domain(_) => ErrorClass::Validation,
        WorkflowError::Store(_) => ErrorClass::Transient,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn store_not_found_maps_to_workflow_not_found() {
        let id = Uuid::new_v4();
        let e: WorkflowError = StoreError::NotFound { kind: EntityKind::Reservation, id }.into();
        assert_eq!(e, WorkflowError::NotFound { kind: EntityKind::Reservation, id });
        let e: WorkflowError = StoreError::Backend("pool agotado".into()).into();
        assert_eq!(classify_error(&e), ErrorClass::Transient);
    }

    #[test]
    fn duplicate_insert_is_structural() {
        let id = Uuid::new_v4();
        let e: WorkflowError = StoreError::Duplicate { kind: EntityKind::CertificateRequest, id }.into();
        assert_eq!(e, WorkflowError::Duplicate { kind: EntityKind::CertificateRequest, id });
        assert_eq!(classify_error(&e), ErrorClass::Structural);
    }

    #[test]
    fn only_conflicts_are_retryable() {
        let id = Uuid::new_v4();
        let conflict = WorkflowError::PersistenceConflict { kind: EntityKind::ProjectProposal, id };
        let terminal = WorkflowError::TerminalState { kind: EntityKind::ProjectProposal,
                                                      id,
                                                      estado: Estado::Rechazado };
        assert_eq!(classify_error(&conflict), ErrorClass::Conflict);
        assert_eq!(classify_error(&terminal), ErrorClass::Structural);
        assert_eq!(classify_error(&DomainError::MissingRejectionReason.into()), ErrorClass::Validation);
    }
}
