//! vecin-persistence
//!
//! Backend Postgres (Diesel + r2d2) de los colaboradores del flujo de
//! aprobación:
//! - `pg`: `PgEntityStore` (escritura condicional + historial en la misma
//!   transacción) y `PgRoleDirectory`.
//! - `migrations`: migraciones embebidas.
//! - `config`: configuración de conexión desde `.env`.
//! - `schema`: tablas Diesel.

pub mod config;
pub mod error;
pub mod migrations;
pub mod pg;
pub mod schema;

pub use config::{init_dotenv, DbConfig};
pub use error::PersistenceError;
pub use pg::{build_pool, build_pool_from_env, ConnectionProvider, PgEntityStore, PgPool, PgRoleDirectory, PoolProvider};
