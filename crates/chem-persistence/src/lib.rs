//! chem-persistence
//!
//! Implementación Postgres (Diesel) del `ResultStore` de `chem-core`, más
//! utilidades de conexión, configuración y migraciones embebidas.
//!
//! Módulos:
//! - `pg`: pool, reintentos y `PgResultStore`.
//! - `migrations`: runner de las migraciones de `migrations/`.
//! - `config`: `DbConfig` desde variables de entorno / `.env`.
//! - `schema`: tabla `calculations`.

pub mod config;
pub mod error;
pub mod migrations;
pub mod pg;
pub mod schema;

pub use config::{init_dotenv, DbConfig};
pub use error::PersistenceError;
pub use pg::{build_pool, build_pool_from_env, ConnectionProvider, PgPool, PgResultStore, PoolProvider};
