use chem_core::{CalculationRecord, ResultStore, StoreError, UpsertOutcome};
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use log::debug;
use serde_json::Value;

use super::{with_retry, ConnectionProvider};
use crate::error::PersistenceError;
use crate::schema::calculations;

#[derive(Queryable, Selectable, Debug)]
#[diesel(table_name = calculations)]
#[diesel(check_for_backend(diesel::pg::Pg))]
struct CalculationRow {
    hashkey: String,
    created: DateTime<Utc>,
    payload: Value,
}

impl From<CalculationRow> for CalculationRecord {
    fn from(row: CalculationRow) -> Self {
        Self { hashkey: row.hashkey,
               created: row.created,
               payload: row.payload }
    }
}

#[derive(Insertable, Debug)]
#[diesel(table_name = calculations)]
struct NewCalculationRow<'a> {
    hashkey: &'a str,
    created: DateTime<Utc>,
    payload: &'a Value,
}

/// `ResultStore` sobre la tabla `calculations`. La unicidad del hashkey la
/// garantiza la clave primaria; un insert repetido sólo refresca `created`.
pub struct PgResultStore<P: ConnectionProvider> {
    provider: P,
}

impl<P: ConnectionProvider> PgResultStore<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    fn lookup_row(&self, hashkey: &str) -> Result<Option<CalculationRow>, PersistenceError> {
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            calculations::table.find(hashkey)
                               .select(CalculationRow::as_select())
                               .first(&mut conn)
                               .optional()
                               .map_err(PersistenceError::from)
        })
    }

    fn touch_row(&self, hashkey: &str, at: DateTime<Utc>) -> Result<usize, PersistenceError> {
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            diesel::update(calculations::table.find(hashkey)).set(calculations::created.eq(at))
                                                             .execute(&mut conn)
                                                             .map_err(PersistenceError::from)
        })
    }

    fn upsert_row(&self, record: &CalculationRecord) -> Result<UpsertOutcome, PersistenceError> {
        let row = NewCalculationRow { hashkey: &record.hashkey,
                                      created: record.created,
                                      payload: &record.payload };
        with_retry(|| {
            let mut conn = self.provider.connection()?;
            conn.transaction::<_, PersistenceError, _>(|tx| {
                    let inserted = diesel::insert_into(calculations::table).values(&row)
                                                                           .on_conflict(calculations::hashkey)
                                                                           .do_nothing()
                                                                           .execute(tx)?;
                    if inserted == 1 {
                        return Ok(UpsertOutcome::Inserted);
                    }
                    diesel::update(calculations::table.find(row.hashkey)).set(calculations::created.eq(row.created))
                                                                         .execute(tx)?;
                    Ok(UpsertOutcome::AlreadyPresent)
                })
        })
    }
}

impl<P: ConnectionProvider> ResultStore for PgResultStore<P> {
    fn lookup(&self, hashkey: &str) -> Result<Option<CalculationRecord>, StoreError> {
        Ok(self.lookup_row(hashkey)?.map(CalculationRecord::from))
    }

    fn touch(&self, hashkey: &str, at: DateTime<Utc>) -> Result<bool, StoreError> {
        let updated = self.touch_row(hashkey, at)?;
        debug!("touch {hashkey}: {updated} row(s)");
        Ok(updated > 0)
    }

    fn upsert(&self, record: CalculationRecord) -> Result<UpsertOutcome, StoreError> {
        let outcome = self.upsert_row(&record)?;
        debug!("upsert {}: {:?}", record.hashkey, outcome);
        Ok(outcome)
    }
}
