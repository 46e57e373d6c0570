// vecin-domain library entry point
pub mod entity;
pub mod error;
pub mod estado;
pub mod kind;
pub mod role;

pub use entity::{TransitionExtra, WorkflowEntity};
pub use error::DomainError;
pub use estado::Estado;
pub use kind::EntityKind;
pub use role::{Actor, ActorRelation, ActorRole};
