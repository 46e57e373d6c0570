//! Armado del `WorkflowService` con sus colaboradores.

use std::sync::Arc;

use log::info;
use vecin_adapters::{spawn_dispatcher, AddressBook, DispatcherHandle, LogNotifier, MessageTransport, QueuedNotifier};
use vecin_core::{InMemoryEntityStore, InMemoryRoleDirectory, Notifier, WorkflowService};
use vecin_persistence::{build_pool_from_env, PgEntityStore, PgPool, PgRoleDirectory, PoolProvider};

use crate::config::AppConfig;
use crate::errors::app_error::AppError;

pub type MemoryService<N> = WorkflowService<InMemoryEntityStore, InMemoryRoleDirectory, N>;
pub type PgService<N> = WorkflowService<PgEntityStore<PoolProvider>, PgRoleDirectory<PoolProvider>, N>;

/// Servicio completamente en memoria; los roles se asignan con
/// `svc.roles().grant(..)`.
pub fn in_memory_service<N: Notifier>(notifier: N) -> MemoryService<N> {
    WorkflowService::new(InMemoryEntityStore::new(), InMemoryRoleDirectory::new(), notifier)
}

pub fn pg_service<N: Notifier>(pool: PgPool, notifier: N) -> PgService<N> {
    let provider = PoolProvider { pool };
    WorkflowService::new(PgEntityStore::new(provider.clone()), PgRoleDirectory::new(provider), notifier)
}

/// Servicio sobre Postgres (`DATABASE_URL`) que registra los avisos en el
/// log con el remitente configurado.
pub fn pg_service_from_env(cfg: &AppConfig) -> Result<PgService<LogNotifier>, AppError> {
    let pool = build_pool_from_env()?;
    info!("pool postgres listo (max={})", pool.max_size());
    Ok(pg_service(pool, LogNotifier::new(cfg.mail_from.clone())))
}

/// Notificador con cola (capacidad `notify_queue`, remitente `mail_from`).
/// Debe llamarse dentro de un runtime tokio.
pub fn queued_notifier<T>(cfg: &AppConfig,
                          transport: Arc<T>,
                          addresses: Arc<dyn AddressBook>)
                          -> Result<(QueuedNotifier, DispatcherHandle), AppError>
    where T: MessageTransport
{
    info!("cola de avisos capacidad={} remitente={}", cfg.notify_queue, cfg.mail_from);
    Ok(spawn_dispatcher(transport, addresses, cfg.mail_from.clone(), cfg.notify_queue)?)
}

/// Servicio sobre Postgres que entrega los avisos por `transport`. El
/// `DispatcherHandle` termina cuando se suelta el servicio.
pub fn pg_service_queued<T>(cfg: &AppConfig,
                            transport: Arc<T>,
                            addresses: Arc<dyn AddressBook>)
                            -> Result<(PgService<QueuedNotifier>, DispatcherHandle), AppError>
    where T: MessageTransport
{
    let (notifier, handle) = queued_notifier(cfg, transport, addresses)?;
    let pool = build_pool_from_env()?;
    Ok((pg_service(pool, notifier), handle))
}
