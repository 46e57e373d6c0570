//! Colaborador de autorización: rol vigente de cada actor.
use dashmap::DashMap;
use uuid::Uuid;
use vecin_domain::ActorRole;

use crate::errors::StoreError;

pub trait RoleDirectory: Send + Sync {
    /// Rol registrado del actor, `None` si no existe.
    fn actor_role(&self, actor_id: Uuid) -> Result<Option<ActorRole>, StoreError>;
}

#[derive(Default)]
pub struct InMemoryRoleDirectory {
    roles: DashMap<Uuid, ActorRole>,
}

impl InMemoryRoleDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn grant(&self, actor_id: Uuid, role: ActorRole) {
        self.roles.insert(actor_id, role);
    }

    pub fn with(self, actor_id: Uuid, role: ActorRole) -> Self {
        self.grant(actor_id, role);
        self
    }
}

impl RoleDirectory for InMemoryRoleDirectory {
    fn actor_role(&self, actor_id: Uuid) -> Result<Option<ActorRole>, StoreError> {
        Ok(self.roles.get(&actor_id).map(|r| *r))
    }
}
