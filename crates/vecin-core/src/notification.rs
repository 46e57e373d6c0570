//! Evento de notificación emitido por cada transición confirmada y contrato
//! del notificador externo.
//!
//! El despacho es de mejor esfuerzo: un error del notificador se registra y
//! no afecta la transición. `event_id` es una huella determinista de la
//! transición para que los adaptadores puedan descartar duplicados.
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;
use vecin_domain::{EntityKind, Estado};

use crate::errors::NotificationDispatchError;
use crate::hashing::fingerprint;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NotificationEvent {
    pub event_id: String,
    pub kind: EntityKind,
    pub entity_id: Uuid,
    pub previous_state: Estado,
    pub new_state: Estado,
    /// Siempre quien originó la entidad.
    pub recipient_id: Uuid,
    pub actor_id: Uuid,
    pub rejection_reason: Option<String>,
    pub occurred_at: DateTime<Utc>,
}

impl NotificationEvent {
    pub fn new(kind: EntityKind,
               entity_id: Uuid,
               previous_state: Estado,
               new_state: Estado,
               recipient_id: Uuid,
               actor_id: Uuid,
               rejection_reason: Option<String>,
               occurred_at: DateTime<Utc>)
               -> Self {
        let event_id = fingerprint(&json!({
                                       "kind": kind.slug(),
                                       "entity_id": entity_id,
                                       "from": previous_state.as_str(),
                                       "to": new_state.as_str(),
                                       "at": occurred_at.to_rfc3339(),
                                   }));
        Self { event_id,
               kind,
               entity_id,
               previous_state,
               new_state,
               recipient_id,
               actor_id,
               rejection_reason,
               occurred_at }
    }
}

pub trait Notifier: Send + Sync {
    fn notify(&self, event: &NotificationEvent) -> Result<(), NotificationDispatchError>;
}

/// Descarta todo.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopNotifier;

impl Notifier for NoopNotifier {
    fn notify(&self, _event: &NotificationEvent) -> Result<(), NotificationDispatchError> {
        Ok(())
    }
}

/// Guarda los eventos recibidos; con `failing()` además responde con error
/// (útil para verificar que la transición no se revierte).
#[derive(Debug, Default)]
pub struct RecordingNotifier {
    events: Mutex<Vec<NotificationEvent>>,
    fail: bool,
}

impl RecordingNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing() -> Self {
        Self { events: Mutex::new(Vec::new()),
               fail: true }
    }

    pub fn events(&self) -> Vec<NotificationEvent> {
        self.events.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, event: &NotificationEvent) -> Result<(), NotificationDispatchError> {
        self.events
            .lock()
            .unwrap_or_else(|p| p.into_inner())
            .push(event.clone());
        if self.fail {
            return Err(NotificationDispatchError { event_id: event.event_id.clone(),
                                                   reason: "notificador configurado para fallar".into() });
        }
        Ok(())
    }
}
