use chrono::{Duration, Utc};
use uuid::Uuid;
use vecin_domain::{Actor, ActorRelation, ActorRole, DomainError, EntityKind, Estado, WorkflowEntity};

#[test]
fn new_pending_starts_clean() {
    let requester = Uuid::new_v4();
    let e = WorkflowEntity::new_pending(EntityKind::Reservation, requester);
    assert_eq!(e.estado, Estado::Pendiente);
    assert_eq!(e.requester_id, requester);
    assert!(e.reviewer_id.is_none());
    assert!(e.fecha_aprobacion.is_none());
    assert!(e.motivo_rechazo.is_none());
    assert!(!e.is_terminal());
    assert!(e.validate().is_ok());
}

#[test]
fn validate_flags_rejection_without_reason() {
    let mut e = WorkflowEntity::new_pending(EntityKind::ProjectProposal, Uuid::new_v4());
    e.estado = Estado::Rechazado;
    assert_eq!(e.validate(), Err(DomainError::MissingRejectionReason));
    e.motivo_rechazo = Some("   ".into());
    assert_eq!(e.validate(), Err(DomainError::MissingRejectionReason));
    e.motivo_rechazo = Some("sin presupuesto".into());
    assert!(e.validate().is_ok());
    assert!(e.is_terminal());
}

#[test]
fn validate_flags_estado_of_other_kind() {
    let mut e = WorkflowEntity::new_pending(EntityKind::CertificateRequest, Uuid::new_v4());
    e.estado = Estado::Asistio;
    assert!(matches!(e.validate(), Err(DomainError::EstadoNotInKind { .. })));
}

#[test]
fn activity_end_is_carried() {
    let end = Utc::now() + Duration::days(2);
    let e = WorkflowEntity::new_pending(EntityKind::ActivityEnrollment, Uuid::new_v4()).with_activity_end(end);
    assert_eq!(e.fecha_fin_actividad, Some(end));
}

#[test]
fn actor_relation_and_roles() {
    let me = Uuid::new_v4();
    let actor = Actor::new(me, ActorRole::Vecino);
    assert_eq!(actor.relation_to(me), ActorRelation::Requester);
    assert_eq!(actor.relation_to(Uuid::new_v4()), ActorRelation::Other);
    assert!(!ActorRole::Vecino.is_staff());
    assert!(ActorRole::Secretaria.is_staff());
    assert!(ActorRole::Admin.is_staff());
    assert_eq!("Secretaria".parse::<ActorRole>().unwrap(), ActorRole::Secretaria);
    assert!(matches!("tesorero".parse::<ActorRole>(), Err(DomainError::UnknownRole(_))));
}
