//! Carga de configuración de conexión desde variables de entorno.
//! Usa convención `DATABASE_URL` y parámetros opcionales de pool.

use std::env;

use dotenvy::dotenv;
use once_cell::sync::Lazy;

use crate::error::PersistenceError;

// Carga perezosa del archivo .env una sola vez.
static DOTENV_LOADED: Lazy<()> = Lazy::new(|| {
    let _ = dotenv(); // ignora error si no existe .env
});

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub url: String,
    pub min_connections: u32,
    pub max_connections: u32,
}

impl DbConfig {
    pub fn from_env() -> Result<Self, PersistenceError> {
        init_dotenv();
        let url = env::var("DATABASE_URL").map_err(|_| PersistenceError::Config("DATABASE_URL no definido".into()))?;
        let min_connections = parse_or("DATABASE_MIN_CONNECTIONS", 2)?;
        let max_connections = parse_or("DATABASE_MAX_CONNECTIONS", 16)?;
        Ok(Self { url,
                  min_connections,
                  max_connections })
    }
}

fn parse_or(var: &str, default: u32) -> Result<u32, PersistenceError> {
    match env::var(var) {
        Ok(v) => v.trim()
                  .parse()
                  .map_err(|_| PersistenceError::Config(format!("{var} inválido: '{v}'"))),
        Err(_) => Ok(default),
    }
}

/// Forzar carga temprana de .env desde aplicaciones externas si se desea.
pub fn init_dotenv() {
    Lazy::force(&DOTENV_LOADED);
}
