//! Superficie de peticiones: formularios clave/valor de entrada, JSON de
//! salida. Los nombres de campos y los códigos de error son los que espera
//! el editor web.

use std::collections::HashMap;
use std::sync::Arc;

use chem_core::errors::error_payload;
use chem_core::{find_calculation, ConversionError, ConversionKind, ConversionService, GateError,
                InMemoryResultStore, LookupError, RawSubmission, ResultStore, SpoolPipeline, SubmissionGate};
use chem_persistence::{build_pool, PgResultStore, PoolProvider};
use chemengine::{ChemToolkit, NativeToolkit};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::config::AppConfig;
use crate::errors::CoreError;

pub type Form = HashMap<String, String>;

/// Respuesta con código HTTP equivalente.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Response {
    pub status: u16,
    pub body: Value,
}

impl Response {
    pub fn ok(body: Value) -> Self {
        Self { status: 200, body }
    }

    pub fn with_status(status: u16, body: Value) -> Self {
        Self { status, body }
    }
}

/// Petición del bucle JSON-lines, despachada por `endpoint`.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "endpoint", rename_all = "snake_case")]
pub enum Request {
    Submit {
        #[serde(default)]
        form: Form,
        #[serde(default)]
        remote_addr: String,
    },
    SdfToSmiles {
        #[serde(default)]
        form: Form,
    },
    SmilesToSdf {
        #[serde(default)]
        form: Form,
    },
    Calculation { key: String },
}

#[derive(Clone)]
pub struct AppState {
    gate: SubmissionGate,
    converter: ConversionService,
}

impl AppState {
    pub fn new(gate: SubmissionGate, converter: ConversionService) -> Self {
        Self { gate, converter }
    }

    /// Arma el estado de producción: toolkit nativo, store Postgres si hay
    /// `DATABASE_URL` (en memoria si no) y pipeline de spool.
    pub fn from_config(config: &AppConfig) -> Result<Self, CoreError> {
        let toolkit: Arc<dyn ChemToolkit> = Arc::new(NativeToolkit::new());
        let store: Arc<dyn ResultStore> = match &config.database {
            Some(db) => {
                let pool = build_pool(&db.url, db.min_connections, db.max_connections)?;
                info!("result store: postgres");
                Arc::new(PgResultStore::new(PoolProvider { pool }))
            }
            None => {
                warn!("DATABASE_URL no definido; usando store en memoria");
                Arc::new(InMemoryResultStore::new())
            }
        };
        std::fs::create_dir_all(&config.spool_dir)?;
        let pipeline = Arc::new(SpoolPipeline::new(config.spool_dir.clone()));
        let gate = SubmissionGate::new(toolkit.clone(), store, pipeline, config.gate_policy());
        Ok(Self::new(gate, ConversionService::new(toolkit)))
    }

    pub fn gate(&self) -> &SubmissionGate {
        &self.gate
    }

    pub async fn dispatch(&self, request: Request) -> Response {
        match request {
            Request::Submit { form, remote_addr } => self.submit_quantum(&form, &remote_addr).await,
            Request::SdfToSmiles { form } => self.sdf_to_smiles(&form).await,
            Request::SmilesToSdf { form } => self.smiles_to_sdf(&form).await,
            Request::Calculation { key } => self.view_calculation(&key).await,
        }
    }

    /// Envío de un cálculo. El bloqueo por IP se evalúa antes que cualquier
    /// validación del formulario.
    pub async fn submit_quantum(&self, form: &Form, remote_addr: &str) -> Response {
        if self.gate.policy().is_blocked(remote_addr) {
            return Response::ok(GateError::BlockedClient.to_payload());
        }
        if form.is_empty() {
            return Response::ok(GateError::EmptyRequest.to_payload());
        }
        let sdf = form.get("sdf").cloned().unwrap_or_default();
        let add_hydrogens = form.get("add_hydrogens").map_or(true, |v| v == "1");
        let raw = RawSubmission::new(sdf).with_hydrogens(add_hydrogens);
        match self.gate.submit(raw, remote_addr).await {
            Ok(outcome) => Response::ok(outcome.into_payload()),
            Err(e) => {
                let status = if e.is_retryable() { 503 } else { 200 };
                Response::with_status(status, e.to_payload())
            }
        }
    }

    pub async fn sdf_to_smiles(&self, form: &Form) -> Response {
        self.convert(form, ConversionKind::SdfToSmiles).await
    }

    pub async fn smiles_to_sdf(&self, form: &Form) -> Response {
        self.convert(form, ConversionKind::SmilesToSdf).await
    }

    async fn convert(&self, form: &Form, kind: ConversionKind) -> Response {
        if form.is_empty() {
            return Response::ok(ConversionError::EmptyRequest(kind).to_payload());
        }
        let (field, output) = match kind {
            ConversionKind::SdfToSmiles => ("sdf", "smiles"),
            ConversionKind::SmilesToSdf => ("smiles", "sdf"),
        };
        let Some(input) = form.get(field).cloned() else {
            return Response::ok(ConversionError::MissingInput(kind).to_payload());
        };
        let converter = self.converter.clone();
        let converted = tokio::task::spawn_blocking(move || match kind {
                            ConversionKind::SdfToSmiles => converter.sdf_to_smiles(&input),
                            ConversionKind::SmilesToSdf => converter.smiles_to_sdf(&input),
                        }).await;
        match converted {
            Ok(Ok(text)) => {
                let mut body = serde_json::Map::new();
                body.insert(output.to_string(), Value::String(text));
                Response::ok(Value::Object(body))
            }
            Ok(Err(e)) => Response::ok(e.to_payload()),
            Err(join) => {
                warn!("conversion task failed: {join}");
                Response::with_status(500, error_payload("500", "Internal server error"))
            }
        }
    }

    /// Registro de un cálculo, o 404.
    pub async fn view_calculation(&self, key: &str) -> Response {
        let store = self.gate.store().clone();
        let key = key.to_string();
        let found = tokio::task::spawn_blocking(move || find_calculation(store.as_ref(), &key)).await;
        match found {
            Ok(Ok(record)) => Response::ok(json!({
                "hashkey": record.hashkey,
                "created": record.created,
                "payload": record.payload,
            })),
            Ok(Err(LookupError::NotFound)) => {
                Response::with_status(404, error_payload("404", "Calculation not found"))
            }
            Ok(Err(LookupError::Store(e))) => {
                warn!("lookup failed: {e}");
                Response::with_status(503, GateError::Store.to_payload())
            }
            Err(join) => {
                warn!("lookup task failed: {join}");
                Response::with_status(500, error_payload("500", "Internal server error"))
            }
        }
    }
}
