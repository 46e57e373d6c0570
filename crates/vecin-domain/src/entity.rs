//! Registro común de las cuatro entidades con flujo de aprobación.
//!
//! Las cuatro tablas del sistema comparten la misma forma: identidad, quien
//! la inició, quien la revisó, `estado` y marcas de tiempo de respuesta. Este
//! módulo modela esa forma una sola vez; el tipo concreto se distingue por
//! `kind`.
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::{DomainError, EntityKind, Estado};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowEntity {
    pub kind: EntityKind,
    pub id: Uuid,
    /// requester / solicitante / creador / participante según `kind`.
    pub requester_id: Uuid,
    pub estado: Estado,
    /// reviewer / aprobador: primer miembro de la directiva que resolvió.
    pub reviewer_id: Option<Uuid>,
    /// Primera respuesta de la directiva (salida de `pendiente`).
    pub fecha_respuesta: Option<DateTime<Utc>>,
    /// Se fija una sola vez al entrar a un estado de aprobación.
    pub fecha_aprobacion: Option<DateTime<Utc>>,
    /// Se fija al entrar a un estado terminal.
    pub fecha_cierre: Option<DateTime<Utc>>,
    pub motivo_rechazo: Option<String>,
    /// Sólo inscripciones: término de la actividad.
    pub fecha_fin_actividad: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl WorkflowEntity {
    /// Nueva entidad en `pendiente`, creada por quien la solicita.
    pub fn new_pending(kind: EntityKind, requester_id: Uuid) -> Self {
        let now = Utc::now();
        Self { kind,
               id: Uuid::new_v4(),
               requester_id,
               estado: Estado::Pendiente,
               reviewer_id: None,
               fecha_respuesta: None,
               fecha_aprobacion: None,
               fecha_cierre: None,
               motivo_rechazo: None,
               fecha_fin_actividad: None,
               created_at: now,
               updated_at: now }
    }

    pub fn with_activity_end(mut self, end: DateTime<Utc>) -> Self {
        self.fecha_fin_actividad = Some(end);
        self
    }

    pub fn is_terminal(&self) -> bool {
        self.kind.is_terminal(self.estado)
    }

    /// Verifica las invariantes estructurales del registro.
    pub fn validate(&self) -> Result<(), DomainError> {
        self.kind.validate_estado(self.estado)?;
        if self.estado.is_rejection() && self.motivo_rechazo.as_deref().map_or(true, |m| m.trim().is_empty()) {
            return Err(DomainError::MissingRejectionReason);
        }
        Ok(())
    }
}

/// Datos opcionales que acompañan una transición.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionExtra {
    pub motivo_rechazo: Option<String>,
    /// Momento de la transición; por defecto, ahora.
    pub at: Option<DateTime<Utc>>,
}

impl TransitionExtra {
    pub fn rejection(motivo: impl Into<String>) -> Self {
        Self { motivo_rechazo: Some(motivo.into()),
               at: None }
    }

    pub fn at(mut self, ts: DateTime<Utc>) -> Self {
        self.at = Some(ts);
        self
    }
}
