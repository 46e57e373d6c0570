//! vecin-core: motor de estados compartido por solicitudes, reservas,
//! proyectos e inscripciones.
//!
//! - `graph`: grafo de transiciones por tipo de entidad y reglas de actor.
//! - `engine`: `StatusWorkflowEngine`, decisión pura sin efectos.
//! - `store` / `roles` / `notification`: contratos hacia los colaboradores
//!   externos (persistencia, autorización, notificador) con backends en
//!   memoria.
//! - `service`: `WorkflowService`, lectura + decisión + escritura condicional.
pub mod engine;
pub mod errors;
pub mod graph;
pub mod hashing;
pub mod notification;
pub mod roles;
pub mod service;
pub mod store;

pub use engine::{StatusWorkflowEngine, TransitionOutcome};
pub use errors::{classify_error, ErrorClass, NotificationDispatchError, StoreError, WorkflowError};
pub use graph::{allowed_targets, can_transition, Gate, TransitionRule};
pub use notification::{NoopNotifier, NotificationEvent, Notifier, RecordingNotifier};
pub use roles::{InMemoryRoleDirectory, RoleDirectory};
pub use service::{CommittedTransition, TransitionRequest, WorkflowService};
pub use store::{EntityStore, InMemoryEntityStore, TransitionDraft, TransitionRecord, WriteOutcome};
