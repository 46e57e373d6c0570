use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;
use vecin_adapters::{spawn_dispatcher, DispatchStats, RecordingTransport, StaticAddressBook, TransportError};
use vecin_core::{InMemoryEntityStore, InMemoryRoleDirectory, NotificationEvent, Notifier, TransitionRequest, WorkflowService};
use vecin_domain::{ActorRole, EntityKind, Estado, TransitionExtra};

const FROM: &str = "junta@vecindapp.cl";

#[tokio::test]
async fn committed_transition_reaches_transport() {
    let vecino = Uuid::new_v4();
    let secretaria = Uuid::new_v4();
    let transport = Arc::new(RecordingTransport::new());
    let book = Arc::new(StaticAddressBook::new().with(vecino, "vecino@correo.cl"));
    let (notifier, handle) = spawn_dispatcher(Arc::clone(&transport), book, FROM, 8).expect("spawn");

    let roles = InMemoryRoleDirectory::new().with(vecino, ActorRole::Vecino)
                                            .with(secretaria, ActorRole::Secretaria);
    let svc = WorkflowService::new(InMemoryEntityStore::new(), roles, notifier);
    let cert = svc.submit(EntityKind::CertificateRequest, vecino, None).expect("submit");
    svc.transition(&TransitionRequest::new(EntityKind::CertificateRequest,
                                           cert.id,
                                           Estado::Rechazado,
                                           secretaria).with_extra(TransitionExtra::rejection("RUT no coincide")))
       .expect("reject");
    drop(svc);

    let stats = handle.finish().await.expect("finish");
    assert_eq!(stats,
               DispatchStats { delivered: 1,
                               duplicates: 0,
                               failed: 0 });
    let sent = transport.sent();
    assert_eq!(sent.len(), 1);
    assert_eq!(sent[0].to, "vecino@correo.cl");
    assert_eq!(sent[0].from, FROM);
    assert_eq!(sent[0].asunto, "Tu solicitud de certificado fue rechazada");
    assert!(sent[0].cuerpo.contains("RUT no coincide"));
}

#[tokio::test]
async fn unknown_address_does_not_block_transition() {
    let vecino = Uuid::new_v4();
    let admin = Uuid::new_v4();
    let transport = Arc::new(RecordingTransport::new());
    let (notifier, handle) =
        spawn_dispatcher(Arc::clone(&transport), Arc::new(StaticAddressBook::new()), FROM, 8).expect("spawn");
    let roles = InMemoryRoleDirectory::new().with(vecino, ActorRole::Vecino)
                                            .with(admin, ActorRole::Admin);
    let svc = WorkflowService::new(InMemoryEntityStore::new(), roles, notifier);
    let reserva = svc.submit(EntityKind::Reservation, vecino, None).expect("submit");
    let done = svc.transition(&TransitionRequest::new(EntityKind::Reservation, reserva.id, Estado::Aprobada, admin))
                  .expect("approve");
    assert_eq!(done.entity.estado, Estado::Aprobada);
    drop(svc);

    let stats = handle.finish().await.expect("finish");
    assert_eq!(stats.delivered, 0);
    assert!(transport.sent().is_empty());
}

#[tokio::test]
async fn duplicate_events_are_delivered_once_and_failures_retry() {
    let vecino = Uuid::new_v4();
    let transport = Arc::new(RecordingTransport::failing_first(2));
    let book = Arc::new(StaticAddressBook::new().with(vecino, "v@correo.cl"));
    let (notifier, handle) = spawn_dispatcher(Arc::clone(&transport), book, FROM, 4).expect("spawn");

    let event = NotificationEvent::new(EntityKind::ActivityEnrollment,
                                       Uuid::new_v4(),
                                       Estado::Aprobada,
                                       Estado::Asistio,
                                       vecino,
                                       Uuid::new_v4(),
                                       None,
                                       Utc::now());
    notifier.notify(&event).expect("first");
    notifier.notify(&event).expect("second");
    drop(notifier);

    let stats = handle.finish().await.expect("finish");
    assert_eq!(stats.delivered, 1);
    assert_eq!(stats.duplicates, 1);
    assert_eq!(transport.sent().len(), 1);
}

#[test]
fn spawning_outside_runtime_is_an_error() {
    let res = spawn_dispatcher(Arc::new(RecordingTransport::new()), Arc::new(StaticAddressBook::new()), FROM, 1);
    assert!(matches!(res, Err(TransportError::NoRuntime(_))));
}
