//! Configuración de la aplicación.
//! Carga `.env` una sola vez y lee los parámetros de aviso. La conexión a
//! base de datos vive en `vecin_persistence::DbConfig` y sólo se exige
//! cuando se arma el servicio sobre Postgres.
use std::env;

use once_cell::sync::Lazy;

use crate::errors::app_error::AppError;

pub const DEFAULT_MAIL_FROM: &str = "no-responder@vecindapp.cl";
pub const DEFAULT_NOTIFY_QUEUE: usize = 64;

static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenvy::dotenv();
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    /// Remitente de los avisos (`VECINDAPP_MAIL_FROM`).
    pub mail_from: String,
    /// Capacidad de la cola de avisos (`VECINDAPP_NOTIFY_QUEUE`).
    pub notify_queue: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self { mail_from: DEFAULT_MAIL_FROM.to_string(),
               notify_queue: DEFAULT_NOTIFY_QUEUE }
    }
}

impl AppConfig {
    pub fn from_env() -> Result<Self, AppError> {
        Lazy::force(&DOTENV_LOADED);
        Self::from_lookup(|k| env::var(k).ok())
    }

    /// Igual que `from_env` pero con una fuente de variables arbitraria.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, AppError>
        where F: Fn(&str) -> Option<String>
    {
        let mail_from = match lookup("VECINDAPP_MAIL_FROM") {
            Some(v) if v.trim().is_empty() => return Err(AppError::Config("VECINDAPP_MAIL_FROM vacío".into())),
            Some(v) => v.trim().to_string(),
            None => DEFAULT_MAIL_FROM.to_string(),
        };
        let notify_queue = match lookup("VECINDAPP_NOTIFY_QUEUE") {
            Some(v) => v.trim()
                        .parse::<usize>()
                        .ok()
                        .filter(|n| *n > 0)
                        .ok_or_else(|| AppError::Config(format!("VECINDAPP_NOTIFY_QUEUE inválido: '{v}'")))?,
            None => DEFAULT_NOTIFY_QUEUE,
        };
        Ok(Self { mail_from,
                  notify_queue })
    }
}
