use vecin_core::NoopNotifier;
use vecindapp::{in_memory_service, AppConfig, AppError, EntityKind, Estado};

#[test]
fn unknown_requester_cannot_submit() {
    let svc = in_memory_service(NoopNotifier);
    let err = svc.submit(EntityKind::Reservation, uuid::Uuid::new_v4(), None).unwrap_err();
    assert_eq!(AppError::from(err).exit_code(), 4);
    assert!(svc.store().is_empty());
}

#[test]
fn default_config_is_usable() {
    let cfg = AppConfig::default();
    assert!(cfg.mail_from.contains('@'));
    assert!(cfg.notify_queue > 0);
    assert_eq!(Estado::Pendiente.as_str(), "pendiente");
}

#[test]
fn pg_bootstrap_requires_database_url() {
    if std::env::var("DATABASE_URL").is_ok() || std::path::Path::new(".env").exists() {
        eprintln!("skip pg_bootstrap_requires_database_url (DATABASE_URL o .env presente)");
        return;
    }
    let err = vecindapp::pg_service_from_env(&AppConfig::default()).err().unwrap();
    assert_eq!(err.exit_code(), 2);
}
