//! Implementaciones Postgres (Diesel) de los colaboradores del core.
//!
//! - `PgEntityStore`: una fila por entidad en `workflow_entities`. La
//!   escritura condicional es un `UPDATE ... WHERE estado = <esperado>` y el
//!   historial (`entity_transitions`) se inserta en la MISMA transacción:
//!   o cambian ambos o ninguno.
//! - `PgRoleDirectory`: tabla `actor_roles`.
//! - Errores transitorios (conflictos de serialización, pool) se reintentan
//!   con backoff corto; la unidad de trabajo completa se repite.

use std::str::FromStr;

use chrono::{DateTime, Utc};
use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager};
use log::{debug, error, warn};
use uuid::Uuid;
use vecin_core::{EntityStore, RoleDirectory, StoreError, TransitionDraft, TransitionRecord, WriteOutcome};
use vecin_domain::{ActorRole, EntityKind, Estado, WorkflowEntity};

use crate::error::PersistenceError;
use crate::migrations::run_pending_migrations;
use crate::schema::{actor_roles, entity_transitions, workflow_entities};

/// Pool r2d2 de conexiones Postgres.
pub type PgPool = r2d2::Pool<ConnectionManager<PgConnection>>;
pub type PgPooledConnection = r2d2::PooledConnection<ConnectionManager<PgConnection>>;

/// Proveedor abstracto de conexiones (permite inyectar el pool real o uno de
/// prueba).
pub trait ConnectionProvider: Send + Sync + 'static {
    fn connection(&self) -> Result<PgPooledConnection, PersistenceError>;
}

#[derive(Clone)]
pub struct PoolProvider {
    pub pool: PgPool,
}

impl ConnectionProvider for PoolProvider {
    fn connection(&self) -> Result<PgPooledConnection, PersistenceError> {
        self.pool
            .get()
            .map_err(|e| PersistenceError::TransientIo(format!("pool error: {e}")))
    }
}

#[derive(Queryable, Selectable, Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = workflow_entities)]
#[diesel(check_for_backend(diesel::pg::Pg))]
#[diesel(treat_none_as_null = true)]
pub struct EntityRow {
    pub kind: String,
    pub id: Uuid,
    pub requester_id: Uuid,
    pub estado: String,
    pub reviewer_id: Option<Uuid>,
    pub fecha_respuesta: Option<DateTime<Utc>>,
    pub fecha_aprobacion: Option<DateTime<Utc>>,
    pub fecha_cierre: Option<DateTime<Utc>>,
    pub motivo_rechazo: Option<String>,
    pub fecha_fin_actividad: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<&WorkflowEntity> for EntityRow {
    fn from(e: &WorkflowEntity) -> Self {
        Self { kind: e.kind.slug().to_string(),
               id: e.id,
               requester_id: e.requester_id,
               estado: e.estado.as_str().to_string(),
               reviewer_id: e.reviewer_id,
               fecha_respuesta: e.fecha_respuesta,
               fecha_aprobacion: e.fecha_aprobacion,
               fecha_cierre: e.fecha_cierre,
               motivo_rechazo: e.motivo_rechazo.clone(),
               fecha_fin_actividad: e.fecha_fin_actividad,
               created_at: e.created_at,
               updated_at: e.updated_at }
    }
}

impl TryFrom<EntityRow> for WorkflowEntity {
    type Error = PersistenceError;

    fn try_from(row: EntityRow) -> Result<Self, Self::Error> {
        let kind = parse_field::<EntityKind>(&row.kind)?;
        let estado = parse_field::<Estado>(&row.estado)?;
        let entity = WorkflowEntity { kind,
                                      id: row.id,
                                      requester_id: row.requester_id,
                                      estado,
                                      reviewer_id: row.reviewer_id,
                                      fecha_respuesta: row.fecha_respuesta,
                                      fecha_aprobacion: row.fecha_aprobacion,
                                      fecha_cierre: row.fecha_cierre,
                                      motivo_rechazo: row.motivo_rechazo,
                                      fecha_fin_actividad: row.fecha_fin_actividad,
                                      created_at: row.created_at,
                                      updated_at: row.updated_at };
        entity.validate()
              .map_err(|e| PersistenceError::InvalidRow(format!("{} {}: {e}", entity.kind, entity.id)))?;
        Ok(entity)
    }
}

/// Fila de `entity_transitions` para lecturas.
#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = entity_transitions)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct TransitionRow {
    pub seq: i64,
    pub kind: String,
    pub entity_id: Uuid,
    pub from_estado: String,
    pub to_estado: String,
    pub actor_id: Uuid,
    pub actor_role: String,
    pub motivo_rechazo: Option<String>,
    pub event_id: String,
    pub at: DateTime<Utc>,
}

impl TryFrom<TransitionRow> for TransitionRecord {
    type Error = PersistenceError;

    fn try_from(row: TransitionRow) -> Result<Self, Self::Error> {
        Ok(TransitionRecord { seq: row.seq as u64,
                              draft: TransitionDraft { kind: parse_field(&row.kind)?,
                                                       entity_id: row.entity_id,
                                                       from: parse_field(&row.from_estado)?,
                                                       to: parse_field(&row.to_estado)?,
                                                       actor_id: row.actor_id,
                                                       actor_role: parse_field(&row.actor_role)?,
                                                       motivo_rechazo: row.motivo_rechazo,
                                                       event_id: row.event_id,
                                                       at: row.at } })
    }
}

/// Inserción en `entity_transitions`; `seq` lo asigna la base (BIGSERIAL).
#[derive(Insertable, Debug)]
#[diesel(table_name = entity_transitions)]
pub struct NewTransitionRow<'a> {
    pub kind: &'a str,
    pub entity_id: Uuid,
    pub from_estado: &'a str,
    pub to_estado: &'a str,
    pub actor_id: Uuid,
    pub actor_role: &'a str,
    pub motivo_rechazo: Option<&'a str>,
    pub event_id: &'a str,
    pub at: DateTime<Utc>,
}

impl<'a> From<&'a TransitionDraft> for NewTransitionRow<'a> {
    fn from(d: &'a TransitionDraft) -> Self {
        Self { kind: d.kind.slug(),
               entity_id: d.entity_id,
               from_estado: d.from.as_str(),
               to_estado: d.to.as_str(),
               actor_id: d.actor_id,
               actor_role: d.actor_role.as_str(),
               motivo_rechazo: d.motivo_rechazo.as_deref(),
               event_id: &d.event_id,
               at: d.at }
    }
}

fn parse_field<T>(raw: &str) -> Result<T, PersistenceError>
    where T: FromStr,
          T::Err: std::fmt::Display
{
    raw.parse::<T>()
       .map_err(|e| PersistenceError::InvalidRow(format!("'{raw}': {e}")))
}

const MAX_ATTEMPTS: u32 = 3;

/// Reintento con backoff lineal corto (15ms, 30ms) ante errores
/// transitorios. Repite la unidad de trabajo completa `f`.
fn with_retry<F, T>(op: &str, mut f: F) -> Result<T, PersistenceError>
    where F: FnMut() -> Result<T, PersistenceError>
{
    let mut attempt = 1;
    loop {
        match f() {
            Err(e) if e.is_retryable() && attempt < MAX_ATTEMPTS => {
                let delay_ms = 15 * u64::from(attempt);
                warn!("{op}: error transitorio (intento {attempt}): {e} -> esperando {delay_ms}ms");
                std::thread::sleep(std::time::Duration::from_millis(delay_ms));
                attempt += 1;
            }
            Err(e) => {
                if e.is_retryable() {
                    error!("{op}: reintentos agotados: {e}");
                }
                return Err(e);
            }
            ok => return ok,
        }
    }
}

enum WriteResult {
    Committed(TransitionRecord),
    Conflict,
    Missing,
}

/// `EntityStore` sobre Postgres.
pub struct PgEntityStore<P: ConnectionProvider> {
    pub provider: P,
}

impl<P: ConnectionProvider> PgEntityStore<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Entidades en `pendiente` de un tipo, más antiguas primero (bandeja de
    /// la secretaría).
    pub fn list_pending(&self, kind: EntityKind) -> Result<Vec<WorkflowEntity>, StoreError> {
        let rows: Vec<EntityRow> = with_retry("list_pending", || {
                                       let mut conn = self.provider.connection()?;
                                       workflow_entities::table.filter(workflow_entities::kind.eq(kind.slug()))
                                                               .filter(workflow_entities::estado.eq(Estado::Pendiente.as_str()))
                                                               .order(workflow_entities::created_at.asc())
                                                               .select(EntityRow::as_select())
                                                               .load(&mut conn)
                                                               .map_err(PersistenceError::from)
                                   })?;
        rows.into_iter()
            .map(|r| WorkflowEntity::try_from(r).map_err(StoreError::from))
            .collect()
    }
}

impl<P: ConnectionProvider> EntityStore for PgEntityStore<P> {
    fn insert_entity(&self, entity: &WorkflowEntity) -> Result<(), StoreError> {
        debug!("insert_entity kind={} id={}", entity.kind, entity.id);
        let row = EntityRow::from(entity);
        let res = with_retry("insert_entity", || {
            let mut conn = self.provider.connection()?;
            diesel::insert_into(workflow_entities::table).values(&row)
                                                         .execute(&mut conn)
                                                         .map_err(PersistenceError::from)
        });
        match res {
            Ok(_) => Ok(()),
            Err(PersistenceError::UniqueViolation(_)) => Err(StoreError::Duplicate { kind: entity.kind,
                                                                                    id: entity.id }),
            Err(e) => Err(e.into()),
        }
    }

    fn read_entity(&self, kind: EntityKind, id: Uuid) -> Result<WorkflowEntity, StoreError> {
        let res = with_retry("read_entity", || {
            let mut conn = self.provider.connection()?;
            workflow_entities::table.find((kind.slug(), id))
                                    .select(EntityRow::as_select())
                                    .first(&mut conn)
                                    .map_err(PersistenceError::from)
        });
        match res {
            Ok(row) => Ok(WorkflowEntity::try_from(row)?),
            Err(PersistenceError::NotFound) => Err(StoreError::NotFound { kind, id }),
            Err(e) => Err(e.into()),
        }
    }

    fn write_entity(&self,
                    expected: Estado,
                    entity: &WorkflowEntity,
                    draft: &TransitionDraft)
                    -> Result<WriteOutcome, StoreError> {
        debug!("write_entity:start kind={} id={} expected={expected} -> {}",
               entity.kind,
               entity.id,
               entity.estado);
        let row = EntityRow::from(entity);
        let result = with_retry("write_entity", || {
            let mut conn = self.provider.connection()?;
            conn.build_transaction()
                .read_write()
                .run(|tx| {
                    // Paso 1: compare-and-swap sobre el estado.
                    let updated = diesel::update(workflow_entities::table.filter(workflow_entities::kind.eq(&row.kind))
                                                                         .filter(workflow_entities::id.eq(row.id))
                                                                         .filter(workflow_entities::estado.eq(expected.as_str())))
                                  .set(&row)
                                  .execute(tx)?;
                    if updated == 0 {
                        let exists: i64 = workflow_entities::table.filter(workflow_entities::kind.eq(&row.kind))
                                                                  .filter(workflow_entities::id.eq(row.id))
                                                                  .count()
                                                                  .get_result(tx)?;
                        return Ok(if exists == 0 { WriteResult::Missing } else { WriteResult::Conflict });
                    }

                    // Paso 2: historial dentro de la misma transacción.
                    let seq: i64 = diesel::insert_into(entity_transitions::table)
                        .values(NewTransitionRow::from(draft))
                        .returning(entity_transitions::seq)
                        .get_result(tx)?;
                    Ok::<WriteResult, PersistenceError>(WriteResult::Committed(TransitionRecord { seq: seq as u64,
                                                                                                  draft: draft.clone() }))
                })
        })?;
        match result {
            WriteResult::Committed(record) => {
                debug!("write_entity:done kind={} id={} seq={}", entity.kind, entity.id, record.seq);
                Ok(WriteOutcome::Committed(record))
            }
            WriteResult::Conflict => {
                debug!("write_entity:conflict kind={} id={} expected={expected}", entity.kind, entity.id);
                Ok(WriteOutcome::Conflict)
            }
            WriteResult::Missing => Err(StoreError::NotFound { kind: entity.kind,
                                                               id: entity.id }),
        }
    }

    fn history(&self, kind: EntityKind, id: Uuid) -> Result<Vec<TransitionRecord>, StoreError> {
        let rows: Vec<TransitionRow> = with_retry("history", || {
                                           let mut conn = self.provider.connection()?;
                                           entity_transitions::table.filter(entity_transitions::kind.eq(kind.slug()))
                                                                    .filter(entity_transitions::entity_id.eq(id))
                                                                    .order(entity_transitions::seq.asc())
                                                                    .select(TransitionRow::as_select())
                                                                    .load(&mut conn)
                                                                    .map_err(PersistenceError::from)
                                       })?;
        rows.into_iter()
            .map(|r| TransitionRecord::try_from(r).map_err(StoreError::from))
            .collect()
    }
}

/// `RoleDirectory` sobre la tabla `actor_roles`.
pub struct PgRoleDirectory<P: ConnectionProvider> {
    pub provider: P,
}

impl<P: ConnectionProvider> PgRoleDirectory<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    /// Asigna (o reemplaza) el rol de un actor.
    pub fn grant(&self, actor_id: Uuid, role: ActorRole) -> Result<(), StoreError> {
        debug!("grant actor={actor_id} role={role}");
        with_retry("grant", || {
            let mut conn = self.provider.connection()?;
            diesel::insert_into(actor_roles::table).values((actor_roles::actor_id.eq(actor_id),
                                                            actor_roles::role.eq(role.as_str()),
                                                            actor_roles::updated_at.eq(Utc::now())))
                                                   .on_conflict(actor_roles::actor_id)
                                                   .do_update()
                                                   .set((actor_roles::role.eq(role.as_str()),
                                                         actor_roles::updated_at.eq(Utc::now())))
                                                   .execute(&mut conn)
                                                   .map_err(PersistenceError::from)
        })?;
        Ok(())
    }
}

impl<P: ConnectionProvider> RoleDirectory for PgRoleDirectory<P> {
    fn actor_role(&self, actor_id: Uuid) -> Result<Option<ActorRole>, StoreError> {
        let raw: Option<String> = with_retry("actor_role", || {
                                      let mut conn = self.provider.connection()?;
                                      actor_roles::table.find(actor_id)
                                                        .select(actor_roles::role)
                                                        .first::<String>(&mut conn)
                                                        .optional()
                                                        .map_err(PersistenceError::from)
                                  })?;
        raw.map(|r| parse_field::<ActorRole>(&r).map_err(StoreError::from))
           .transpose()
    }
}

/// Construye un pool Postgres r2d2 y aplica migraciones pendientes.
///
/// Si `min_size > max_size` se usa `min_size = max_size`; tamaños 0 se
/// elevan a 1.
pub fn build_pool(database_url: &str, min_size: u32, max_size: u32) -> Result<PgPool, PersistenceError> {
    let max = max_size.max(1);
    let min = min_size.max(1);
    if min > max {
        warn!("min_size > max_size ({min} > {max}), ajustando min=max");
    }
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = r2d2::Pool::builder().min_idle(Some(min.min(max)))
                                    .max_size(max)
                                    .build(manager)
                                    .map_err(|e| PersistenceError::TransientIo(format!("pool build: {e}")))?;
    {
        let mut conn = pool.get()
                           .map_err(|e| PersistenceError::TransientIo(format!("pool get for migrations: {e}")))?;
        run_pending_migrations(&mut conn)?;
    }
    Ok(pool)
}

/// Carga `.env`, lee `DbConfig` y construye un pool ya migrado.
pub fn build_pool_from_env() -> Result<PgPool, PersistenceError> {
    let cfg = crate::config::DbConfig::from_env()?;
    build_pool(&cfg.url, cfg.min_connections, cfg.max_connections)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(estado: &str, motivo: Option<&str>) -> EntityRow {
        let mut e = WorkflowEntity::new_pending(EntityKind::Reservation, Uuid::new_v4());
        e.motivo_rechazo = motivo.map(str::to_string);
        let mut r = EntityRow::from(&e);
        r.estado = estado.to_string();
        r
    }

    #[test]
    fn row_conversion_validates_entity() {
        assert!(WorkflowEntity::try_from(row("pendiente", None)).is_ok());
        assert!(WorkflowEntity::try_from(row("rechazada", Some("sala ocupada"))).is_ok());

        let err = WorkflowEntity::try_from(row("rechazada", None)).unwrap_err();
        assert!(matches!(err, PersistenceError::InvalidRow(_)), "{err:?}");
        // Estado válido pero ajeno al tipo.
        let err = WorkflowEntity::try_from(row("en_ejecucion", None)).unwrap_err();
        assert!(matches!(err, PersistenceError::InvalidRow(_)), "{err:?}");
        let err = WorkflowEntity::try_from(row("archivada", None)).unwrap_err();
        assert!(matches!(err, PersistenceError::InvalidRow(_)), "{err:?}");
    }
}
