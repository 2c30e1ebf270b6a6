//! Almacén de resultados: hashkey -> `CalculationRecord`.

mod memory;

use chrono::{DateTime, Utc};

use crate::errors::StoreError;
use crate::model::CalculationRecord;
pub use memory::InMemoryResultStore;

/// Resultado de `upsert`: la clave es única, un segundo insert sólo refresca
/// el timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpsertOutcome {
    Inserted,
    AlreadyPresent,
}

/// Operaciones síncronas (el gate las ejecuta en el pool bloqueante).
pub trait ResultStore: Send + Sync {
    fn lookup(&self, hashkey: &str) -> Result<Option<CalculationRecord>, StoreError>;
    /// Actualiza `created`; `false` si la clave no existe.
    fn touch(&self, hashkey: &str, at: DateTime<Utc>) -> Result<bool, StoreError>;
    /// Inserta idempotentemente por hashkey.
    fn upsert(&self, record: CalculationRecord) -> Result<UpsertOutcome, StoreError>;
}
