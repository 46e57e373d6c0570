//! Notificador con cola.
//!
//! `notify` corre dentro de la transición (síncrono) y sólo encola el
//! mensaje ya renderizado; una tarea tokio lo entrega al `MessageTransport`.
//! Si la cola está llena o el despachador terminó, el error vuelve al
//! servicio, que lo registra y sigue.

use std::collections::{HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use log::{debug, warn};
use thiserror::Error;
use tokio::sync::mpsc::{self, error::TrySendError};
use tokio::task::JoinHandle;
use vecin_core::{NotificationDispatchError, NotificationEvent, Notifier};

use crate::address::AddressBook;
use crate::message::{render_message, OutboundMessage};

const MAX_ATTEMPTS: u32 = 3;
/// Cuántos `event_id` entregados recuerda el despachador.
pub const DEDUP_WINDOW: usize = 1024;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("entrega fallida: {0}")]
    Delivery(String),
    #[error("sin runtime tokio: {0}")]
    NoRuntime(String),
    #[error("despachador abortado: {0}")]
    Dispatcher(String),
}

/// Canal de salida real (SMTP, API de correo, ...).
#[async_trait]
pub trait MessageTransport: Send + Sync + 'static {
    async fn send(&self, msg: &OutboundMessage) -> Result<(), TransportError>;
}

pub struct QueuedNotifier {
    from: String,
    addresses: Arc<dyn AddressBook>,
    tx: mpsc::Sender<OutboundMessage>,
}

impl Notifier for QueuedNotifier {
    fn notify(&self, event: &NotificationEvent) -> Result<(), NotificationDispatchError> {
        let fail = |reason: String| NotificationDispatchError { event_id: event.event_id.clone(),
                                                                reason };
        let to = self.addresses
                     .address_of(event.recipient_id)
                     .ok_or_else(|| fail(format!("sin dirección para {}", event.recipient_id)))?;
        let msg = render_message(event, &self.from, &to);
        match self.tx.try_send(msg) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => Err(fail("cola de avisos llena".into())),
            Err(TrySendError::Closed(_)) => Err(fail("despachador detenido".into())),
        }
    }
}

/// Resumen del despachador al cerrarse la cola.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DispatchStats {
    pub delivered: usize,
    pub duplicates: usize,
    pub failed: usize,
}

pub struct DispatcherHandle {
    join: JoinHandle<DispatchStats>,
}

impl DispatcherHandle {
    /// Espera a que la cola se vacíe. La cola se cierra cuando se suelta el
    /// último `QueuedNotifier`.
    pub async fn finish(self) -> Result<DispatchStats, TransportError> {
        self.join
            .await
            .map_err(|e| TransportError::Dispatcher(e.to_string()))
    }
}

/// Crea la cola (capacidad mínima 1) y lanza el despachador en el runtime
/// actual.
pub fn spawn_dispatcher<T>(transport: Arc<T>,
                           addresses: Arc<dyn AddressBook>,
                           from: impl Into<String>,
                           capacity: usize)
                           -> Result<(QueuedNotifier, DispatcherHandle), TransportError>
    where T: MessageTransport
{
    let runtime = tokio::runtime::Handle::try_current().map_err(|e| TransportError::NoRuntime(e.to_string()))?;
    let (tx, rx) = mpsc::channel(capacity.max(1));
    let join = runtime.spawn(dispatch_loop(transport, rx));
    Ok((QueuedNotifier { from: from.into(),
                         addresses,
                         tx },
        DispatcherHandle { join }))
}

async fn dispatch_loop<T>(transport: Arc<T>, mut rx: mpsc::Receiver<OutboundMessage>) -> DispatchStats
    where T: MessageTransport
{
    let mut stats = DispatchStats::default();
    let mut seen = RecentIds::new(DEDUP_WINDOW);
    while let Some(msg) = rx.recv().await {
        if seen.contains(&msg.event_id) {
            debug!("aviso duplicado event_id={}", msg.event_id);
            stats.duplicates += 1;
            continue;
        }
        match deliver(transport.as_ref(), &msg).await {
            Ok(()) => {
                seen.insert(msg.event_id);
                stats.delivered += 1;
            }
            Err(e) => {
                warn!("aviso descartado event_id={} to={}: {e}", msg.event_id, msg.to);
                stats.failed += 1;
            }
        }
    }
    debug!("despachador cerrado: {stats:?} (ids recordados: {})", seen.len());
    stats
}

/// Ventana acotada de ids recientes; al llenarse olvida el más antiguo.
#[derive(Debug)]
struct RecentIds {
    order: VecDeque<String>,
    set: HashSet<String>,
    cap: usize,
}

impl RecentIds {
    fn new(cap: usize) -> Self {
        let cap = cap.max(1);
        Self { order: VecDeque::with_capacity(cap),
               set: HashSet::with_capacity(cap),
               cap }
    }

    fn contains(&self, id: &str) -> bool {
        self.set.contains(id)
    }

    fn insert(&mut self, id: String) {
        if !self.set.insert(id.clone()) {
            return;
        }
        self.order.push_back(id);
        if self.order.len() > self.cap {
            if let Some(oldest) = self.order.pop_front() {
                self.set.remove(&oldest);
            }
        }
    }

    fn len(&self) -> usize {
        self.order.len()
    }
}

async fn deliver<T: MessageTransport>(transport: &T, msg: &OutboundMessage) -> Result<(), TransportError> {
    let mut attempt = 1;
    loop {
        match transport.send(msg).await {
            Err(e) if attempt < MAX_ATTEMPTS => {
                let delay_ms = 15 * u64::from(attempt);
                warn!("entrega event_id={} (intento {attempt}): {e} -> esperando {delay_ms}ms", msg.event_id);
                tokio::time::sleep(Duration::from_millis(delay_ms)).await;
                attempt += 1;
            }
            other => return other,
        }
    }
}

/// Transporte en memoria; `failing_first(n)` falla las primeras `n`
/// entregas.
#[derive(Debug, Default)]
pub struct RecordingTransport {
    sent: Mutex<Vec<OutboundMessage>>,
    failures_left: AtomicUsize,
}

impl RecordingTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_first(n: usize) -> Self {
        Self { sent: Mutex::new(Vec::new()),
               failures_left: AtomicUsize::new(n) }
    }

    pub fn sent(&self) -> Vec<OutboundMessage> {
        self.sent.lock().unwrap_or_else(|p| p.into_inner()).clone()
    }
}

#[async_trait]
impl MessageTransport for RecordingTransport {
    async fn send(&self, msg: &OutboundMessage) -> Result<(), TransportError> {
        let pending_failure = self.failures_left
                                  .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
                                  .is_ok();
        if pending_failure {
            return Err(TransportError::Delivery("fallo simulado".into()));
        }
        self.sent.lock().unwrap_or_else(|p| p.into_inner()).push(msg.clone());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recent_ids_evicts_oldest_beyond_capacity() {
        let mut ids = RecentIds::new(2);
        ids.insert("a".into());
        ids.insert("b".into());
        ids.insert("a".into());
        assert_eq!(ids.len(), 2);
        ids.insert("c".into());
        assert_eq!(ids.len(), 2);
        assert!(!ids.contains("a"));
        assert!(ids.contains("b"));
        assert!(ids.contains("c"));
    }

    #[test]
    fn recent_ids_never_exceeds_window() {
        let mut ids = RecentIds::new(DEDUP_WINDOW);
        for i in 0..(DEDUP_WINDOW * 3) {
            ids.insert(format!("{i:064}"));
        }
        assert_eq!(ids.len(), DEDUP_WINDOW);
        assert_eq!(ids.set.len(), DEDUP_WINDOW);
        assert!(ids.contains(&format!("{:064}", DEDUP_WINDOW * 3 - 1)));
        assert!(!ids.contains(&format!("{:064}", 0)));
    }
}
