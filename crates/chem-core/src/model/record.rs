use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Registro de un cálculo, indexado por hashkey. `created` se actualiza en
/// cada reenvío de la misma estructura; este subsistema nunca lo borra.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalculationRecord {
    pub hashkey: String,
    pub created: DateTime<Utc>,
    pub payload: Value,
}

impl CalculationRecord {
    pub fn new(hashkey: impl Into<String>, payload: Value) -> Self {
        Self { hashkey: hashkey.into(),
               created: Utc::now(),
               payload }
    }
}
