use std::sync::Arc;

use log::info;
use vecin_core::{NotificationDispatchError, NotificationEvent, Notifier};

use crate::address::AddressBook;
use crate::message::render_message;

/// Notificador que sólo escribe el aviso en el log. Un destinatario sin
/// dirección conocida se informa igual, con el uuid como destino.
pub struct LogNotifier {
    from: String,
    addresses: Option<Arc<dyn AddressBook>>,
}

impl LogNotifier {
    pub fn new(from: impl Into<String>) -> Self {
        Self { from: from.into(),
               addresses: None }
    }

    pub fn with_addresses(mut self, book: Arc<dyn AddressBook>) -> Self {
        self.addresses = Some(book);
        self
    }
}

impl Notifier for LogNotifier {
    fn notify(&self, event: &NotificationEvent) -> Result<(), NotificationDispatchError> {
        let to = self.addresses
                     .as_ref()
                     .and_then(|b| b.address_of(event.recipient_id))
                     .unwrap_or_else(|| event.recipient_id.to_string());
        let msg = render_message(event, &self.from, &to);
        info!("aviso event_id={} to={} asunto=\"{}\"", msg.event_id, msg.to, msg.asunto);
        Ok(())
    }
}
