//! Tipos de entidad que comparten el ciclo de vida de aprobación.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{DomainError, Estado};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    CertificateRequest,
    Reservation,
    ProjectProposal,
    ActivityEnrollment,
}

impl EntityKind {
    pub const ALL: [EntityKind; 4] = [EntityKind::CertificateRequest,
                                      EntityKind::Reservation,
                                      EntityKind::ProjectProposal,
                                      EntityKind::ActivityEnrollment];

    /// Identificador persistido (columna `kind`).
    pub fn slug(&self) -> &'static str {
        match self {
            EntityKind::CertificateRequest => "solicitud_certificado",
            EntityKind::Reservation => "reserva",
            EntityKind::ProjectProposal => "proyecto",
            EntityKind::ActivityEnrollment => "inscripcion_actividad",
        }
    }

    /// Nombre legible para mensajes al vecino.
    pub fn display_name(&self) -> &'static str {
        match self {
            EntityKind::CertificateRequest => "solicitud de certificado",
            EntityKind::Reservation => "reserva",
            EntityKind::ProjectProposal => "propuesta de proyecto",
            EntityKind::ActivityEnrollment => "inscripción a actividad",
        }
    }

    /// Conjunto cerrado de estados admitidos por el tipo.
    pub fn states(&self) -> &'static [Estado] {
        match self {
            EntityKind::CertificateRequest => &[Estado::Pendiente,
                                                Estado::Aprobado,
                                                Estado::Completado,
                                                Estado::Rechazado,
                                                Estado::Cancelado],
            EntityKind::Reservation => &[Estado::Pendiente,
                                         Estado::Aprobada,
                                         Estado::Completada,
                                         Estado::Rechazada,
                                         Estado::Cancelada],
            EntityKind::ProjectProposal => &[Estado::Pendiente,
                                             Estado::Aprobado,
                                             Estado::EnEjecucion,
                                             Estado::Completado,
                                             Estado::Rechazado,
                                             Estado::Cancelado],
            EntityKind::ActivityEnrollment => &[Estado::Pendiente,
                                                Estado::Aprobada,
                                                Estado::Rechazada,
                                                Estado::Cancelada,
                                                Estado::Asistio,
                                                Estado::NoAsistio],
        }
    }

    /// Estados desde los cuales no se admite ninguna transición.
    pub fn terminal_states(&self) -> &'static [Estado] {
        match self {
            EntityKind::CertificateRequest => &[Estado::Completado, Estado::Rechazado, Estado::Cancelado],
            EntityKind::Reservation => &[Estado::Cancelada, Estado::Completada, Estado::Rechazada],
            EntityKind::ProjectProposal => &[Estado::Completado, Estado::Rechazado, Estado::Cancelado],
            EntityKind::ActivityEnrollment => {
                &[Estado::Rechazada, Estado::Cancelada, Estado::Asistio, Estado::NoAsistio]
            }
        }
    }

    pub fn contains(&self, estado: Estado) -> bool {
        self.states().contains(&estado)
    }

    pub fn is_terminal(&self, estado: Estado) -> bool {
        self.terminal_states().contains(&estado)
    }

    pub fn validate_estado(&self, estado: Estado) -> Result<(), DomainError> {
        if self.contains(estado) {
            Ok(())
        } else {
            Err(DomainError::EstadoNotInKind { kind: self.slug().to_string(),
                                               estado: estado.as_str().to_string() })
        }
    }

    /// Etiqueta de cancelación con el género del sustantivo.
    pub fn cancelled_state(&self) -> Estado {
        match self {
            EntityKind::CertificateRequest | EntityKind::ProjectProposal => Estado::Cancelado,
            EntityKind::Reservation | EntityKind::ActivityEnrollment => Estado::Cancelada,
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.slug())
    }
}

impl FromStr for EntityKind {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        EntityKind::ALL.iter()
                       .copied()
                       .find(|k| k.slug() == normalized)
                       .ok_or(DomainError::UnknownKind(s.to_string()))
    }
}
