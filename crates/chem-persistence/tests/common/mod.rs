use chem_core::hashing::hash_str;
use chem_persistence::config::DbConfig;
use chem_persistence::pg::{build_pool, PgPool, PgResultStore, PoolProvider};
use chrono::Utc;
use once_cell::sync::Lazy;

pub static TEST_POOL: Lazy<Option<PgPool>> = Lazy::new(|| {
    let cfg = DbConfig::from_env().ok()?;
    match build_pool(&cfg.url, 1, 2) {
        Ok(p) => Some(p),
        Err(e) => {
            eprintln!("No se pudo construir pool de test: {e}");
            None
        }
    }
});

/// `None` (y el test se salta) cuando no hay `DATABASE_URL`.
pub fn store() -> Option<PgResultStore<PoolProvider>> {
    if std::env::var("DATABASE_URL").is_err() {
        eprintln!("skip (no DATABASE_URL)");
        return None;
    }
    TEST_POOL.as_ref()
             .map(|pool| PgResultStore::new(PoolProvider { pool: pool.clone() }))
}

/// Hashkey válido y distinto en cada corrida.
pub fn fresh_key(label: &str) -> String {
    hash_str(&format!("{label}-{}", Utc::now().timestamp_nanos_opt().unwrap_or_default()))
}
