//! Consulta de un cálculo por hashkey.

use crate::constants::RESERVED_NOT_FOUND_KEY;
use crate::errors::LookupError;
use crate::model::CalculationRecord;
use crate::store::ResultStore;

/// Devuelve el registro o `NotFound`. La clave reservada `"404"` nunca
/// corresponde a un cálculo.
pub fn find_calculation(store: &dyn ResultStore, hashkey: &str) -> Result<CalculationRecord, LookupError> {
    if hashkey == RESERVED_NOT_FOUND_KEY {
        return Err(LookupError::NotFound);
    }
    store.lookup(hashkey)?.ok_or(LookupError::NotFound)
}
