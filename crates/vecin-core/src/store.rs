//! Contrato de persistencia con escritura condicional e implementación en
//! memoria.
//!
//! Rol en el flujo:
//! - `read_entity` entrega el registro una vez por decisión.
//! - `write_entity` confirma el nuevo estado sólo si el `estado` persistido
//!   sigue siendo `expected` (compare-and-swap). En el mismo paso atómico
//!   agrega la transición al historial de la entidad.
//! - El historial es append-only con `seq` monotónico asignado por el store.
use std::sync::atomic::{AtomicU64, Ordering};

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use vecin_domain::{ActorRole, EntityKind, Estado, WorkflowEntity};

use crate::errors::StoreError;

/// Transición decidida por el motor, aún sin confirmar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionDraft {
    pub kind: EntityKind,
    pub entity_id: Uuid,
    pub from: Estado,
    pub to: Estado,
    pub actor_id: Uuid,
    pub actor_role: ActorRole,
    pub motivo_rechazo: Option<String>,
    /// `event_id` de la notificación asociada.
    pub event_id: String,
    pub at: DateTime<Utc>,
}

/// Transición confirmada en el historial.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub seq: u64,
    #[serde(flatten)]
    pub draft: TransitionDraft,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WriteOutcome {
    Committed(TransitionRecord),
    /// El estado persistido ya no es el esperado; nada se escribió.
    Conflict,
}

pub trait EntityStore: Send + Sync {
    /// Inserta una entidad nueva. Falla con `Duplicate` si ya existe.
    fn insert_entity(&self, entity: &WorkflowEntity) -> Result<(), StoreError>;
    fn read_entity(&self, kind: EntityKind, id: Uuid) -> Result<WorkflowEntity, StoreError>;
    /// Escritura condicional: reemplaza la entidad y agrega `draft` al
    /// historial sólo si el estado actual es `expected`.
    fn write_entity(&self,
                    expected: Estado,
                    entity: &WorkflowEntity,
                    draft: &TransitionDraft)
                    -> Result<WriteOutcome, StoreError>;
    /// Historial de transiciones (orden ascendente por `seq`).
    fn history(&self, kind: EntityKind, id: Uuid) -> Result<Vec<TransitionRecord>, StoreError>;
}

struct Slot {
    entity: WorkflowEntity,
    history: Vec<TransitionRecord>,
}

/// Backend en memoria. El lock por entrada de `DashMap` serializa las
/// escrituras sobre una misma entidad.
pub struct InMemoryEntityStore {
    inner: DashMap<(EntityKind, Uuid), Slot>,
    seq: AtomicU64,
}

impl InMemoryEntityStore {
    pub fn new() -> Self {
        Self { inner: DashMap::new(),
               seq: AtomicU64::new(1) }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl Default for InMemoryEntityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityStore for InMemoryEntityStore {
    fn insert_entity(&self, entity: &WorkflowEntity) -> Result<(), StoreError> {
        use dashmap::mapref::entry::Entry;
        match self.inner.entry((entity.kind, entity.id)) {
            Entry::Occupied(_) => Err(StoreError::Duplicate { kind: entity.kind,
                                                              id: entity.id }),
            Entry::Vacant(v) => {
                v.insert(Slot { entity: entity.clone(),
                                history: Vec::new() });
                Ok(())
            }
        }
    }

    fn read_entity(&self, kind: EntityKind, id: Uuid) -> Result<WorkflowEntity, StoreError> {
        self.inner
            .get(&(kind, id))
            .map(|slot| slot.entity.clone())
            .ok_or(StoreError::NotFound { kind, id })
    }

    fn write_entity(&self,
                    expected: Estado,
                    entity: &WorkflowEntity,
                    draft: &TransitionDraft)
                    -> Result<WriteOutcome, StoreError> {
        let key = (entity.kind, entity.id);
        let mut slot = self.inner
                           .get_mut(&key)
                           .ok_or(StoreError::NotFound { kind: entity.kind,
                                                         id: entity.id })?;
        if slot.entity.estado != expected {
            return Ok(WriteOutcome::Conflict);
        }
        let record = TransitionRecord { seq: self.seq.fetch_add(1, Ordering::SeqCst),
                                        draft: draft.clone() };
        slot.entity = entity.clone();
        slot.history.push(record.clone());
        Ok(WriteOutcome::Committed(record))
    }

    fn history(&self, kind: EntityKind, id: Uuid) -> Result<Vec<TransitionRecord>, StoreError> {
        self.inner
            .get(&(kind, id))
            .map(|slot| slot.history.clone())
            .ok_or(StoreError::NotFound { kind, id })
    }
}
