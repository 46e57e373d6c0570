//! Direcciones de correo por actor.

use std::collections::HashMap;

use uuid::Uuid;

pub trait AddressBook: Send + Sync {
    fn address_of(&self, actor_id: Uuid) -> Option<String>;
}

/// Libreta fija construida al arrancar.
#[derive(Debug, Default, Clone)]
pub struct StaticAddressBook {
    entries: HashMap<Uuid, String>,
}

impl StaticAddressBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, actor_id: Uuid, address: impl Into<String>) -> Self {
        self.entries.insert(actor_id, address.into());
        self
    }
}

impl AddressBook for StaticAddressBook {
    fn address_of(&self, actor_id: Uuid) -> Option<String> {
        self.entries.get(&actor_id).cloned()
    }
}
