//! molcalc
//!
//! Capa de aplicación del servicio de envíos:
//! - `config`: `AppConfig` desde variables de entorno.
//! - `errors`: `CoreError` de arranque.
//! - `handlers`: `AppState` y los endpoints (envío, conversiones, consulta).

pub mod config;
pub mod errors;
pub mod handlers;

pub use config::AppConfig;
pub use errors::CoreError;
pub use handlers::{AppState, Form, Request, Response};
