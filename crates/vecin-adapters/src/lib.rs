//! vecin-adapters
//!
//! Adaptadores de notificación para el flujo de aprobación:
//! - `message`: texto del aviso (asunto y cuerpo en español).
//! - `address`: resolución de la dirección del destinatario.
//! - `log_notifier`: sólo registra el aviso.
//! - `queued`: cola tokio con despacho asíncrono a un `MessageTransport`.

pub mod address;
pub mod log_notifier;
pub mod message;
pub mod queued;

pub use address::{AddressBook, StaticAddressBook};
pub use log_notifier::LogNotifier;
pub use message::{render_message, OutboundMessage};
pub use queued::{spawn_dispatcher, DispatchStats, DispatcherHandle, MessageTransport, QueuedNotifier, RecordingTransport, TransportError};
