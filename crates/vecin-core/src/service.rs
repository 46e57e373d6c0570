//! `WorkflowService`: envoltura del motor con los colaboradores externos.
//!
//! Cada transición es un único leer-decidir-escribir. La escritura es
//! condicional al estado leído; si pierde la carrera se relee una vez y se
//! revalida contra el estado fresco. La notificación se despacha sólo
//! después de confirmar la escritura y sus fallas no se propagan.
use chrono::{DateTime, Utc};
use log::{debug, warn};
use rayon::prelude::*;
use uuid::Uuid;
use vecin_domain::{Actor, EntityKind, Estado, TransitionExtra, WorkflowEntity};

use crate::engine::StatusWorkflowEngine;
use crate::errors::WorkflowError;
use crate::notification::{NotificationEvent, Notifier};
use crate::roles::RoleDirectory;
use crate::store::{EntityStore, TransitionRecord, WriteOutcome};

/// Petición de transición tal como llega desde la capa de requests.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionRequest {
    pub kind: EntityKind,
    pub entity_id: Uuid,
    pub target: Estado,
    pub actor_id: Uuid,
    /// Estado que el usuario vio al decidir. Si se indica y el registro ya
    /// cambió, la decisión no se reaplica.
    pub expected: Option<Estado>,
    pub extra: TransitionExtra,
}

impl TransitionRequest {
    pub fn new(kind: EntityKind, entity_id: Uuid, target: Estado, actor_id: Uuid) -> Self {
        Self { kind,
               entity_id,
               target,
               actor_id,
               expected: None,
               extra: TransitionExtra::default() }
    }

    pub fn expecting(mut self, estado: Estado) -> Self {
        self.expected = Some(estado);
        self
    }

    pub fn with_extra(mut self, extra: TransitionExtra) -> Self {
        self.extra = extra;
        self
    }
}

/// Transición confirmada por el store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CommittedTransition {
    pub entity: WorkflowEntity,
    pub event: NotificationEvent,
    pub record: TransitionRecord,
}

pub struct WorkflowService<S, R, N>
    where S: EntityStore,
          R: RoleDirectory,
          N: Notifier
{
    engine: StatusWorkflowEngine,
    store: S,
    roles: R,
    notifier: N,
}

impl<S, R, N> WorkflowService<S, R, N>
    where S: EntityStore,
          R: RoleDirectory,
          N: Notifier
{
    pub fn new(store: S, roles: R, notifier: N) -> Self {
        Self { engine: StatusWorkflowEngine::new(),
               store,
               roles,
               notifier }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn roles(&self) -> &R {
        &self.roles
    }

    pub fn notifier(&self) -> &N {
        &self.notifier
    }

    /// Rol verificado en el servidor; nunca el que declara el cliente.
    fn resolve_actor(&self, actor_id: Uuid) -> Result<Actor, WorkflowError> {
        let role = self.roles
                       .actor_role(actor_id)?
                       .ok_or(WorkflowError::UnknownActor(actor_id))?;
        Ok(Actor::new(actor_id, role))
    }

    /// Crea la entidad en `pendiente` a nombre de `requester_id`.
    pub fn submit(&self,
                  kind: EntityKind,
                  requester_id: Uuid,
                  activity_end: Option<DateTime<Utc>>)
                  -> Result<WorkflowEntity, WorkflowError> {
        self.resolve_actor(requester_id)?;
        let mut entity = WorkflowEntity::new_pending(kind, requester_id);
        entity.fecha_fin_actividad = activity_end;
        self.store.insert_entity(&entity)?;
        debug!("submit kind={kind} id={} requester={requester_id}", entity.id);
        Ok(entity)
    }

    pub fn get(&self, kind: EntityKind, id: Uuid) -> Result<WorkflowEntity, WorkflowError> {
        Ok(self.store.read_entity(kind, id)?)
    }

    pub fn history(&self, kind: EntityKind, id: Uuid) -> Result<Vec<TransitionRecord>, WorkflowError> {
        Ok(self.store.history(kind, id)?)
    }

    pub fn allowed_targets_for(&self, kind: EntityKind, id: Uuid, actor_id: Uuid) -> Result<Vec<Estado>, WorkflowError> {
        let actor = self.resolve_actor(actor_id)?;
        let entity = self.store.read_entity(kind, id)?;
        Ok(self.engine.allowed_targets(&entity, &actor))
    }

    pub fn transition(&self, req: &TransitionRequest) -> Result<CommittedTransition, WorkflowError> {
        let actor = self.resolve_actor(req.actor_id)?;
        let mut retried = false;
        loop {
            let current = self.store.read_entity(req.kind, req.entity_id)?;
            if let Some(expected) = req.expected {
                if current.estado != expected {
                    return Err(stale_view(&current));
                }
            }

            let outcome = match self.engine.apply_transition(&current, req.target, &actor, &req.extra) {
                Ok(outcome) => outcome,
                // Tras perder la carrera, el rechazo se debe al estado ajeno.
                Err(WorkflowError::IllegalTransition { .. }) if retried => return Err(stale_view(&current)),
                Err(e) => return Err(e),
            };
            match self.store.write_entity(current.estado, &outcome.entity, &outcome.draft)? {
                WriteOutcome::Committed(record) => {
                    self.dispatch(&outcome.event);
                    return Ok(CommittedTransition { entity: outcome.entity,
                                                    event: outcome.event,
                                                    record });
                }
                WriteOutcome::Conflict if retried => {
                    warn!("transition:conflict kind={} id={} (reintento agotado)", req.kind, req.entity_id);
                    return Err(WorkflowError::PersistenceConflict { kind: req.kind,
                                                                    id: req.entity_id });
                }
                WriteOutcome::Conflict => {
                    warn!("transition:conflict kind={} id={} -> relectura y revalidación",
                          req.kind,
                          req.entity_id);
                    retried = true;
                }
            }
        }
    }

    /// Transiciones sobre entidades independientes, en paralelo. Cada
    /// resultado es independiente del resto.
    pub fn transition_many(&self, requests: &[TransitionRequest]) -> Vec<Result<CommittedTransition, WorkflowError>> {
        requests.par_iter().map(|r| self.transition(r)).collect()
    }

    fn dispatch(&self, event: &NotificationEvent) {
        if let Err(e) = self.notifier.notify(event) {
            warn!("notificación descartada kind={} id={} estado={}: {e}",
                  event.kind,
                  event.entity_id,
                  event.new_state);
        }
    }
}

/// El registro cambió desde que el usuario lo vio.
fn stale_view(current: &WorkflowEntity) -> WorkflowError {
    if current.is_terminal() {
        WorkflowError::TerminalState { kind: current.kind,
                                       id: current.id,
                                       estado: current.estado }
    } else {
        WorkflowError::PersistenceConflict { kind: current.kind,
                                             id: current.id }
    }
}
