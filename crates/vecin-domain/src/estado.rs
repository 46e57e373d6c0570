//! Etiquetas de estado de las entidades con flujo de aprobación.
//!
//! Un único enum reúne todas las etiquetas usadas por los cuatro tipos de
//! entidad. Cada `EntityKind` declara qué subconjunto le pertenece (ver
//! `EntityKind::states`); el género gramatical de la etiqueta sigue al
//! sustantivo de la entidad (`reserva aprobada`, `proyecto aprobado`).
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Estado {
    Pendiente,
    Aprobado,
    Aprobada,
    Rechazado,
    Rechazada,
    EnEjecucion,
    Completado,
    Completada,
    Cancelado,
    Cancelada,
    Asistio,
    NoAsistio,
}

impl Estado {
    pub const ALL: [Estado; 12] = [Estado::Pendiente,
                                   Estado::Aprobado,
                                   Estado::Aprobada,
                                   Estado::Rechazado,
                                   Estado::Rechazada,
                                   Estado::EnEjecucion,
                                   Estado::Completado,
                                   Estado::Completada,
                                   Estado::Cancelado,
                                   Estado::Cancelada,
                                   Estado::Asistio,
                                   Estado::NoAsistio];

    /// Etiqueta persistida (snake_case), estable en el tiempo.
    pub fn as_str(&self) -> &'static str {
        match self {
            Estado::Pendiente => "pendiente",
            Estado::Aprobado => "aprobado",
            Estado::Aprobada => "aprobada",
            Estado::Rechazado => "rechazado",
            Estado::Rechazada => "rechazada",
            Estado::EnEjecucion => "en_ejecucion",
            Estado::Completado => "completado",
            Estado::Completada => "completada",
            Estado::Cancelado => "cancelado",
            Estado::Cancelada => "cancelada",
            Estado::Asistio => "asistio",
            Estado::NoAsistio => "no_asistio",
        }
    }

    pub fn is_rejection(&self) -> bool {
        matches!(self, Estado::Rechazado | Estado::Rechazada)
    }

    pub fn is_approval(&self) -> bool {
        matches!(self, Estado::Aprobado | Estado::Aprobada)
    }

    pub fn is_cancellation(&self) -> bool {
        matches!(self, Estado::Cancelado | Estado::Cancelada)
    }
}

impl fmt::Display for Estado {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Estado {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Estado::ALL.iter()
                   .copied()
                   .find(|e| e.as_str() == normalized)
                   .ok_or(DomainError::UnknownEstado(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_accepts_labels_case_insensitive() {
        assert_eq!("EN_EJECUCION".parse::<Estado>().unwrap(), Estado::EnEjecucion);
        assert_eq!(" no_asistio ".parse::<Estado>().unwrap(), Estado::NoAsistio);
        assert!(matches!("aprobando".parse::<Estado>(), Err(DomainError::UnknownEstado(_))));
    }

    #[test]
    fn serde_uses_persisted_label() {
        let v = serde_json::to_value(Estado::NoAsistio).unwrap();
        assert_eq!(v, serde_json::json!("no_asistio"));
        let back: Estado = serde_json::from_value(serde_json::json!("en_ejecucion")).unwrap();
        assert_eq!(back, Estado::EnEjecucion);
    }
}
