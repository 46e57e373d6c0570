//! Roles de autorización y actor que solicita una transición.
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::DomainError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActorRole {
    Vecino,
    Secretaria,
    Admin,
}

impl ActorRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActorRole::Vecino => "vecino",
            ActorRole::Secretaria => "secretaria",
            ActorRole::Admin => "admin",
        }
    }

    /// `secretaria` y `admin` pueden resolver solicitudes.
    pub fn is_staff(&self) -> bool {
        matches!(self, ActorRole::Secretaria | ActorRole::Admin)
    }
}

impl fmt::Display for ActorRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActorRole {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "vecino" => Ok(ActorRole::Vecino),
            "secretaria" => Ok(ActorRole::Secretaria),
            "admin" => Ok(ActorRole::Admin),
            _ => Err(DomainError::UnknownRole(s.to_string())),
        }
    }
}

/// Relación del actor con la entidad sobre la que actúa.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ActorRelation {
    /// Es quien creó la entidad (solicitante, creador, participante).
    Requester,
    Other,
}

/// Usuario autenticado con su rol ya verificado en el servidor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Actor {
    pub id: Uuid,
    pub role: ActorRole,
}

impl Actor {
    pub fn new(id: Uuid, role: ActorRole) -> Self {
        Self { id, role }
    }

    pub fn relation_to(&self, requester_id: Uuid) -> ActorRelation {
        if self.id == requester_id {
            ActorRelation::Requester
        } else {
            ActorRelation::Other
        }
    }
}
