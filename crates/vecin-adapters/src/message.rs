//! Render del aviso que recibe quien originó la entidad.
//!
//! Todas las entidades tienen nombre femenino ("solicitud", "reserva",
//! "propuesta", "inscripción"), de ahí la concordancia fija del texto.

use serde::{Deserialize, Serialize};
use vecin_core::NotificationEvent;
use vecin_domain::Estado;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboundMessage {
    /// `event_id` de origen, para descartar duplicados en el transporte.
    pub event_id: String,
    pub from: String,
    pub to: String,
    pub asunto: String,
    pub cuerpo: String,
}

fn outcome_phrase(estado: Estado) -> &'static str {
    match estado {
        Estado::Pendiente => "quedó pendiente de revisión",
        Estado::Aprobado | Estado::Aprobada => "fue aprobada",
        Estado::Rechazado | Estado::Rechazada => "fue rechazada",
        Estado::EnEjecucion => "pasó a ejecución",
        Estado::Completado | Estado::Completada => "fue completada",
        Estado::Cancelado | Estado::Cancelada => "fue cancelada",
        Estado::Asistio => "registra tu asistencia",
        Estado::NoAsistio => "registra tu inasistencia",
    }
}

pub fn render_message(event: &NotificationEvent, from: &str, to: &str) -> OutboundMessage {
    let noun = event.kind.display_name();
    let phrase = outcome_phrase(event.new_state);
    let asunto = format!("Tu {noun} {phrase}");

    let mut cuerpo = format!("Hola,\n\nTu {noun} ({}) {phrase}.\nEstado anterior: {}. Estado actual: {}.\nFecha: {}.\n",
                             event.entity_id,
                             event.previous_state,
                             event.new_state,
                             event.occurred_at.format("%d-%m-%Y %H:%M UTC"));
    if let Some(motivo) = event.rejection_reason.as_deref() {
        cuerpo.push_str(&format!("Motivo: {motivo}\n"));
    }
    cuerpo.push_str("\nJunta de Vecinos\n");

    OutboundMessage { event_id: event.event_id.clone(),
                      from: from.to_string(),
                      to: to.to_string(),
                      asunto,
                      cuerpo }
}
