#![allow(dead_code)]

use once_cell::sync::Lazy;
use uuid::Uuid;
use vecin_core::{NoopNotifier, WorkflowService};
use vecin_domain::ActorRole;
use vecin_persistence::config::DbConfig;
use vecin_persistence::pg::{build_pool, PgEntityStore, PgPool, PgRoleDirectory, PoolProvider};

pub static TEST_POOL: Lazy<Option<PgPool>> = Lazy::new(|| {
    if std::env::var("DATABASE_URL").is_err() {
        return None;
    }
    let cfg = DbConfig::from_env().ok()?;
    match build_pool(&cfg.url, 1, 4) {
        Ok(p) => Some(p),
        Err(e) => {
            eprintln!("No se pudo construir pool de test: {e}");
            None
        }
    }
});

pub fn with_pool<F, R>(f: F) -> Option<R>
    where F: FnOnce(&PgPool) -> R
{
    TEST_POOL.as_ref().map(f)
}

pub type PgService = WorkflowService<PgEntityStore<PoolProvider>, PgRoleDirectory<PoolProvider>, NoopNotifier>;

/// Servicio sobre Postgres con un vecino y una secretaria recién creados.
pub fn pg_service(pool: &PgPool) -> (PgService, Uuid, Uuid) {
    let provider = PoolProvider { pool: pool.clone() };
    let roles = PgRoleDirectory::new(provider.clone());
    let vecino = Uuid::new_v4();
    let secretaria = Uuid::new_v4();
    roles.grant(vecino, ActorRole::Vecino).expect("grant vecino");
    roles.grant(secretaria, ActorRole::Secretaria).expect("grant secretaria");
    (WorkflowService::new(PgEntityStore::new(provider), roles, NoopNotifier), vecino, secretaria)
}
