//! VecindApp
//!
//! Fachada del motor de estados de la junta de vecinos:
//! - Re-exporta dominio (`vecin_domain`), motor y servicio (`vecin_core`).
//! - `config`: configuración de la aplicación desde `.env`.
//! - `errors`: error de nivel aplicación que agrupa los de cada crate.
//! - `bootstrap`: armado del servicio en memoria o sobre Postgres.

pub mod bootstrap;
pub mod config;
pub mod errors;

pub use bootstrap::{in_memory_service, pg_service, pg_service_from_env, pg_service_queued, queued_notifier, MemoryService,
                    PgService};
pub use config::AppConfig;
pub use errors::app_error::AppError;
pub use vecin_core::{classify_error, CommittedTransition, ErrorClass, NotificationEvent, Notifier, StatusWorkflowEngine,
                     TransitionRecord, TransitionRequest, WorkflowError, WorkflowService};
pub use vecin_domain::{Actor, ActorRelation, ActorRole, EntityKind, Estado, TransitionExtra, WorkflowEntity};
