//! Grafo de transiciones por tipo de entidad.
//!
//! Las cuatro entidades comparten la misma forma: `pendiente` se resuelve por
//! la directiva (aprobación o rechazo) o se cancela por quien la solicitó;
//! algunas entidades continúan desde la aprobación hacia la ejecución o el
//! registro de asistencia. Cada arista declara quién puede recorrerla.
//!
//! Invariante: una arista nunca parte de un estado terminal del tipo.
use vecin_domain::{ActorRelation, ActorRole, EntityKind, Estado};

/// Quién puede recorrer una arista.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gate {
    /// `secretaria` o `admin`.
    Staff,
    /// Sólo quien creó la entidad.
    Requester,
}

impl Gate {
    pub fn admits(&self, role: ActorRole, relation: ActorRelation) -> bool {
        match self {
            Gate::Staff => role.is_staff(),
            Gate::Requester => relation == ActorRelation::Requester,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TransitionRule {
    pub from: Estado,
    pub to: Estado,
    pub gate: Gate,
}

const fn rule(from: Estado, to: Estado, gate: Gate) -> TransitionRule {
    TransitionRule { from, to, gate }
}

use Estado::*;
use Gate::*;

const CERTIFICATE_RULES: &[TransitionRule] = &[rule(Pendiente, Aprobado, Staff),
                                               rule(Pendiente, Rechazado, Staff),
                                               rule(Pendiente, Completado, Staff),
                                               rule(Aprobado, Completado, Staff),
                                               rule(Pendiente, Cancelado, Requester)];

const RESERVATION_RULES: &[TransitionRule] = &[rule(Pendiente, Aprobada, Staff),
                                               rule(Pendiente, Rechazada, Staff),
                                               rule(Aprobada, Completada, Staff),
                                               rule(Pendiente, Cancelada, Requester)];

const PROJECT_RULES: &[TransitionRule] = &[rule(Pendiente, Aprobado, Staff),
                                           rule(Pendiente, Rechazado, Staff),
                                           rule(Aprobado, EnEjecucion, Staff),
                                           rule(EnEjecucion, Completado, Staff),
                                           rule(Pendiente, Cancelado, Requester)];

const ENROLLMENT_RULES: &[TransitionRule] = &[rule(Pendiente, Aprobada, Staff),
                                              rule(Pendiente, Rechazada, Staff),
                                              rule(Aprobada, Asistio, Staff),
                                              rule(Aprobada, NoAsistio, Staff),
                                              rule(Pendiente, Cancelada, Requester)];

pub fn rules_for(kind: EntityKind) -> &'static [TransitionRule] {
    match kind {
        EntityKind::CertificateRequest => CERTIFICATE_RULES,
        EntityKind::Reservation => RESERVATION_RULES,
        EntityKind::ProjectProposal => PROJECT_RULES,
        EntityKind::ActivityEnrollment => ENROLLMENT_RULES,
    }
}

pub fn find_rule(kind: EntityKind, from: Estado, to: Estado) -> Option<&'static TransitionRule> {
    rules_for(kind).iter().find(|r| r.from == from && r.to == to)
}

/// `true` si `target` sucede a `current` en el grafo de `kind` y el actor
/// satisface la compuerta de esa arista.
pub fn can_transition(kind: EntityKind,
                      current: Estado,
                      target: Estado,
                      role: ActorRole,
                      relation: ActorRelation)
                      -> bool {
    find_rule(kind, current, target).is_some_and(|r| r.gate.admits(role, relation))
}

/// Estados a los que el actor puede mover la entidad (orden de declaración).
pub fn allowed_targets(kind: EntityKind, current: Estado, role: ActorRole, relation: ActorRelation) -> Vec<Estado> {
    rules_for(kind).iter()
                   .filter(|r| r.from == current && r.gate.admits(role, relation))
                   .map(|r| r.to)
                   .collect()
}

/// La arista entra a un estado de aprobación. Un certificado completado
/// directamente desde `pendiente` también cuenta como aprobado.
pub fn is_approval_entry(kind: EntityKind, from: Estado, to: Estado) -> bool {
    to.is_approval() || (kind == EntityKind::CertificateRequest && from == Pendiente && to == Completado)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rules_stay_inside_declared_states_and_never_leave_terminals() {
        for kind in EntityKind::ALL {
            for r in rules_for(kind) {
                assert!(kind.contains(r.from), "{kind}: {} fuera del conjunto", r.from);
                assert!(kind.contains(r.to), "{kind}: {} fuera del conjunto", r.to);
                assert!(!kind.is_terminal(r.from), "{kind}: arista desde terminal {}", r.from);
            }
        }
    }

    #[test]
    fn every_kind_allows_self_cancellation_from_pendiente() {
        for kind in EntityKind::ALL {
            let cancel = kind.cancelled_state();
            assert!(can_transition(kind, Pendiente, cancel, ActorRole::Vecino, ActorRelation::Requester));
            assert!(!can_transition(kind, Pendiente, cancel, ActorRole::Vecino, ActorRelation::Other));
            assert!(!can_transition(kind, Pendiente, cancel, ActorRole::Admin, ActorRelation::Other));
        }
    }

    #[test]
    fn staff_targets_from_pendiente() {
        let targets = allowed_targets(EntityKind::Reservation,
                                      Pendiente,
                                      ActorRole::Secretaria,
                                      ActorRelation::Other);
        assert_eq!(targets, vec![Aprobada, Rechazada]);
        let own = allowed_targets(EntityKind::Reservation, Pendiente, ActorRole::Vecino, ActorRelation::Requester);
        assert_eq!(own, vec![Cancelada]);
    }

    #[test]
    fn project_runs_through_execution() {
        let k = EntityKind::ProjectProposal;
        assert!(can_transition(k, Aprobado, EnEjecucion, ActorRole::Admin, ActorRelation::Other));
        assert!(can_transition(k, EnEjecucion, Completado, ActorRole::Admin, ActorRelation::Other));
        assert!(!can_transition(k, Aprobado, Completado, ActorRole::Admin, ActorRelation::Other));
    }

    #[test]
    fn certificate_completion_counts_as_approval_only_from_pendiente() {
        let k = EntityKind::CertificateRequest;
        assert!(is_approval_entry(k, Pendiente, Completado));
        assert!(!is_approval_entry(k, Aprobado, Completado));
        assert!(is_approval_entry(k, Pendiente, Aprobado));
        assert!(!is_approval_entry(EntityKind::ProjectProposal, EnEjecucion, Completado));
    }
}
