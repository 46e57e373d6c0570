//! `StatusWorkflowEngine`: decide si una transición es legal y produce el
//! nuevo valor de la entidad más el evento de notificación.
//!
//! El motor no hace I/O: lee la entidad que se le entrega y devuelve valores
//! nuevos. La serialización por entidad (escritura condicional) es
//! responsabilidad de quien lo invoca (ver `service`).
use chrono::Utc;
use log::debug;
use vecin_domain::{Actor, ActorRelation, ActorRole, DomainError, EntityKind, Estado, TransitionExtra,
                   WorkflowEntity};

use crate::errors::WorkflowError;
use crate::graph::{self, Gate};
use crate::notification::NotificationEvent;
use crate::store::TransitionDraft;

/// Resultado de una transición decidida (todavía no persistida).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionOutcome {
    pub entity: WorkflowEntity,
    pub event: NotificationEvent,
    pub draft: TransitionDraft,
}

#[derive(Debug, Default, Clone, Copy)]
pub struct StatusWorkflowEngine;

impl StatusWorkflowEngine {
    pub fn new() -> Self {
        Self
    }

    pub fn can_transition(&self,
                          kind: EntityKind,
                          current: Estado,
                          target: Estado,
                          role: ActorRole,
                          relation: ActorRelation)
                          -> bool {
        graph::can_transition(kind, current, target, role, relation)
    }

    pub fn allowed_targets(&self, entity: &WorkflowEntity, actor: &Actor) -> Vec<Estado> {
        if entity.is_terminal() {
            return Vec::new();
        }
        graph::allowed_targets(entity.kind,
                               entity.estado,
                               actor.role,
                               actor.relation_to(entity.requester_id))
    }

    /// Aplica `target` sobre `entity`.
    ///
    /// Orden de verificación: estado actual válido, estado terminal, arista y
    /// compuerta del actor, motivo de rechazo, término de la actividad.
    pub fn apply_transition(&self,
                            entity: &WorkflowEntity,
                            target: Estado,
                            actor: &Actor,
                            extra: &TransitionExtra)
                            -> Result<TransitionOutcome, WorkflowError> {
        let kind = entity.kind;
        let from = entity.estado;
        kind.validate_estado(from)?;

        if entity.is_terminal() {
            return Err(WorkflowError::TerminalState { kind,
                                                      id: entity.id,
                                                      estado: from });
        }

        let relation = actor.relation_to(entity.requester_id);
        let rule = graph::find_rule(kind, from, target).filter(|r| r.gate.admits(actor.role, relation))
                                                       .ok_or(WorkflowError::IllegalTransition { kind,
                                                                                                 from,
                                                                                                 to: target,
                                                                                                 role: actor.role })?;

        let motivo = if target.is_rejection() {
            let m = extra.motivo_rechazo
                         .as_deref()
                         .map(str::trim)
                         .filter(|m| !m.is_empty())
                         .ok_or(DomainError::MissingRejectionReason)?;
            Some(m.to_string())
        } else {
            if extra.motivo_rechazo.is_some() {
                debug!("motivo_rechazo ignorado: {kind} {} -> {target} no es rechazo", entity.id);
            }
            None
        };

        let at = extra.at.unwrap_or_else(Utc::now);

        if matches!(target, Estado::Asistio | Estado::NoAsistio) {
            match entity.fecha_fin_actividad {
                Some(end) if at >= end => {}
                ends_at => return Err(WorkflowError::ActivityNotFinished { id: entity.id, ends_at }),
            }
        }

        let mut next = entity.clone();
        next.estado = target;
        next.updated_at = at;
        next.motivo_rechazo = motivo.clone();
        if rule.gate == Gate::Staff {
            next.reviewer_id.get_or_insert(actor.id);
            if from == Estado::Pendiente {
                next.fecha_respuesta.get_or_insert(at);
            }
        }
        if graph::is_approval_entry(kind, from, target) {
            next.fecha_aprobacion.get_or_insert(at);
        }
        if kind.is_terminal(target) {
            next.fecha_cierre = Some(at);
        }

        let event = NotificationEvent::new(kind,
                                           entity.id,
                                           from,
                                           target,
                                           entity.requester_id,
                                           actor.id,
                                           motivo.clone(),
                                           at);
        let draft = TransitionDraft { kind,
                                      entity_id: entity.id,
                                      from,
                                      to: target,
                                      actor_id: actor.id,
                                      actor_role: actor.role,
                                      motivo_rechazo: motivo,
                                      event_id: event.event_id.clone(),
                                      at };
        debug!("apply_transition kind={kind} id={} {from} -> {target} actor={} role={}",
               entity.id,
               actor.id,
               actor.role);
        Ok(TransitionOutcome { entity: next, event, draft })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use uuid::Uuid;
    use vecin_domain::ActorRole;

    fn staff() -> Actor {
        Actor::new(Uuid::new_v4(), ActorRole::Secretaria)
    }

    #[test]
    fn approval_sets_reviewer_and_timestamps_once() {
        let engine = StatusWorkflowEngine::new();
        let e = WorkflowEntity::new_pending(EntityKind::Reservation, Uuid::new_v4());
        let sec = staff();
        let t1 = Utc::now();
        let out = engine.apply_transition(&e, Estado::Aprobada, &sec, &TransitionExtra::default().at(t1))
                        .unwrap();
        assert_eq!(out.entity.estado, Estado::Aprobada);
        assert_eq!(out.entity.reviewer_id, Some(sec.id));
        assert_eq!(out.entity.fecha_aprobacion, Some(t1));
        assert_eq!(out.entity.fecha_respuesta, Some(t1));
        assert!(out.entity.fecha_cierre.is_none());
        assert_eq!(out.event.recipient_id, e.requester_id);

        let other = staff();
        let t2 = t1 + Duration::hours(3);
        let done = engine.apply_transition(&out.entity, Estado::Completada, &other, &TransitionExtra::default().at(t2))
                         .unwrap();
        assert_eq!(done.entity.reviewer_id, Some(sec.id));
        assert_eq!(done.entity.fecha_aprobacion, Some(t1));
        assert_eq!(done.entity.fecha_respuesta, Some(t1));
        assert_eq!(done.entity.fecha_cierre, Some(t2));
    }

    #[test]
    fn rejection_requires_reason_and_keeps_it_trimmed() {
        let engine = StatusWorkflowEngine::new();
        let e = WorkflowEntity::new_pending(EntityKind::ProjectProposal, Uuid::new_v4());
        let err = engine.apply_transition(&e, Estado::Rechazado, &staff(), &TransitionExtra::default())
                        .unwrap_err();
        assert_eq!(err, WorkflowError::Domain(DomainError::MissingRejectionReason));

        let out = engine.apply_transition(&e, Estado::Rechazado, &staff(), &TransitionExtra::rejection("  fuera de plazo "))
                        .unwrap();
        assert_eq!(out.entity.motivo_rechazo.as_deref(), Some("fuera de plazo"));
        assert_eq!(out.event.rejection_reason.as_deref(), Some("fuera de plazo"));
        assert!(out.entity.fecha_aprobacion.is_none());
    }

    #[test]
    fn reason_on_approval_is_dropped() {
        let engine = StatusWorkflowEngine::new();
        let e = WorkflowEntity::new_pending(EntityKind::CertificateRequest, Uuid::new_v4());
        let out = engine.apply_transition(&e, Estado::Aprobado, &staff(), &TransitionExtra::rejection("x"))
                        .unwrap();
        assert!(out.entity.motivo_rechazo.is_none());
        assert!(out.event.rejection_reason.is_none());
    }

    #[test]
    fn attendance_only_after_activity_end() {
        let engine = StatusWorkflowEngine::new();
        let end = Utc::now();
        let mut e = WorkflowEntity::new_pending(EntityKind::ActivityEnrollment, Uuid::new_v4()).with_activity_end(end);
        e.estado = Estado::Aprobada;

        let early = TransitionExtra::default().at(end - Duration::minutes(5));
        let err = engine.apply_transition(&e, Estado::Asistio, &staff(), &early).unwrap_err();
        assert!(matches!(err, WorkflowError::ActivityNotFinished { ends_at: Some(_), .. }));

        let late = TransitionExtra::default().at(end + Duration::minutes(5));
        let out = engine.apply_transition(&e, Estado::NoAsistio, &staff(), &late).unwrap();
        assert_eq!(out.entity.estado, Estado::NoAsistio);
        assert!(out.entity.is_terminal());
    }

    #[test]
    fn attendance_without_known_end_is_refused() {
        let engine = StatusWorkflowEngine::new();
        let mut e = WorkflowEntity::new_pending(EntityKind::ActivityEnrollment, Uuid::new_v4());
        e.estado = Estado::Aprobada;
        let err = engine.apply_transition(&e, Estado::Asistio, &staff(), &TransitionExtra::default())
                        .unwrap_err();
        assert!(matches!(err, WorkflowError::ActivityNotFinished { ends_at: None, .. }));
    }

    #[test]
    fn target_from_other_kind_is_illegal() {
        let engine = StatusWorkflowEngine::new();
        let e = WorkflowEntity::new_pending(EntityKind::Reservation, Uuid::new_v4());
        let err = engine.apply_transition(&e, Estado::Aprobado, &staff(), &TransitionExtra::default())
                        .unwrap_err();
        assert!(matches!(err, WorkflowError::IllegalTransition { .. }));
    }

    #[test]
    fn allowed_targets_empty_on_terminal() {
        let engine = StatusWorkflowEngine::new();
        let mut e = WorkflowEntity::new_pending(EntityKind::Reservation, Uuid::new_v4());
        e.estado = Estado::Completada;
        assert!(engine.allowed_targets(&e, &staff()).is_empty());
    }
}
