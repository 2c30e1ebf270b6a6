//! Backend Postgres (Diesel + r2d2) del `ResultStore`.
//!
//! - El pool corre las migraciones pendientes al construirse.
//! - Cada operación del store es una unidad corta que se reintenta ante
//!   errores transitorios (ver `with_retry`).

mod result_store;

use std::time::Duration;

use diesel::prelude::*;
use diesel::r2d2::{self, ConnectionManager, PooledConnection};
use log::{info, warn};

use crate::config::{init_dotenv, DbConfig};
use crate::error::PersistenceError;
use crate::migrations::run_pending_migrations;
pub use result_store::PgResultStore;

pub type PgPool = r2d2::Pool<ConnectionManager<PgConnection>>;
pub type PgPooledConnection = PooledConnection<ConnectionManager<PgConnection>>;

const MAX_RETRIES: u32 = 3;
const RETRY_STEP_MS: u64 = 15;

/// Origen de conexiones del store. Permite inyectar el pool real o uno
/// construido por los tests.
pub trait ConnectionProvider: Send + Sync + 'static {
    fn connection(&self) -> Result<PgPooledConnection, PersistenceError>;
}

pub struct PoolProvider {
    pub pool: PgPool,
}

impl ConnectionProvider for PoolProvider {
    fn connection(&self) -> Result<PgPooledConnection, PersistenceError> {
        self.pool
            .get()
            .map_err(|e| PersistenceError::TransientIo(format!("pool error: {e}")))
    }
}

/// Errores que vale la pena reintentar. Algunos mensajes del driver llegan
/// como `Unknown` y se reconocen por texto.
pub(crate) fn is_retryable(e: &PersistenceError) -> bool {
    match e {
        PersistenceError::SerializationConflict | PersistenceError::TransientIo(_) => true,
        PersistenceError::Unknown(msg) => {
            let m = msg.to_lowercase();
            m.contains("deadlock detected")
            || m.contains("could not serialize access")
            || m.contains("terminating connection")
            || m.contains("connection closed")
            || m.contains("connection refused")
            || m.contains("timeout")
        }
        _ => false,
    }
}

/// Hasta `MAX_RETRIES` reintentos con espera lineal (15, 30, 45 ms).
/// Bloquea el hilo: sólo debe llamarse desde el pool bloqueante.
pub(crate) fn with_retry<F, T>(mut f: F) -> Result<T, PersistenceError>
    where F: FnMut() -> Result<T, PersistenceError>
{
    let mut attempts = 0;
    loop {
        match f() {
            Err(e) if is_retryable(&e) && attempts < MAX_RETRIES => {
                attempts += 1;
                let delay = Duration::from_millis(RETRY_STEP_MS * attempts as u64);
                warn!("retryable store error (attempt {attempts}): {e} -> sleeping {delay:?}");
                std::thread::sleep(delay);
            }
            r => return r,
        }
    }
}

/// Construye el pool y aplica las migraciones en la primera conexión.
/// Tamaños en cero se elevan a 1; si `min > max` se usa `min = max`.
pub fn build_pool(database_url: &str, min_size: u32, max_size: u32) -> Result<PgPool, PersistenceError> {
    let max = max_size.max(1);
    let mut min = min_size.max(1);
    if min > max {
        warn!("pool min_size > max_size ({min} > {max}), ajustando min=max");
        min = max;
    }
    let manager = ConnectionManager::<PgConnection>::new(database_url);
    let pool = r2d2::Pool::builder().min_idle(Some(min))
                                    .max_size(max)
                                    .build(manager)
                                    .map_err(|e| PersistenceError::TransientIo(format!("pool build: {e}")))?;
    {
        let mut conn = pool.get()
                           .map_err(|e| PersistenceError::TransientIo(format!("pool get for migrations: {e}")))?;
        run_pending_migrations(&mut conn)?;
    }
    info!("postgres pool ready (min={min}, max={max})");
    Ok(pool)
}

/// Carga `.env`, lee `DbConfig` y construye un pool ya migrado.
pub fn build_pool_from_env() -> Result<PgPool, PersistenceError> {
    init_dotenv();
    let cfg = DbConfig::from_env()?;
    build_pool(&cfg.url, cfg.min_connections, cfg.max_connections)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    #[test]
    fn classifies_transient_errors() {
        assert!(is_retryable(&PersistenceError::SerializationConflict));
        assert!(is_retryable(&PersistenceError::Unknown("ERROR: deadlock detected".into())));
        assert!(!is_retryable(&PersistenceError::CheckViolation("hashkey".into())));
        assert!(!is_retryable(&PersistenceError::Unknown("syntax error".into())));
    }

    #[test]
    fn retries_until_success() {
        let calls = Cell::new(0);
        let r = with_retry(|| {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(PersistenceError::TransientIo("flaky".into()))
            } else {
                Ok(calls.get())
            }
        });
        assert_eq!(r.unwrap(), 3);
    }

    #[test]
    fn gives_up_after_max_retries_and_skips_permanent_errors() {
        let calls = Cell::new(0);
        let r: Result<(), _> = with_retry(|| {
            calls.set(calls.get() + 1);
            Err(PersistenceError::TransientIo("down".into()))
        });
        assert!(r.is_err());
        assert_eq!(calls.get(), MAX_RETRIES + 1);

        calls.set(0);
        let r: Result<(), _> = with_retry(|| {
            calls.set(calls.get() + 1);
            Err(PersistenceError::NotFound)
        });
        assert!(matches!(r, Err(PersistenceError::NotFound)));
        assert_eq!(calls.get(), 1);
    }
}
