use std::path::PathBuf;

use async_trait::async_trait;
use chrono::Utc;
use log::info;
use serde::Serialize;
use serde_json::json;
use tokio::fs;
use uuid::Uuid;

use super::{ComputationPipeline, PipelineOutput, PipelineRequest, PipelineSettings};
use crate::errors::PipelineError;
use crate::model::CalculationRecord;

/// Entrega trabajos al backend por directorio: `<key>.sdf` con la estructura
/// y `<key>.json` con el manifiesto. El manifiesto se escribe al final (vía
/// renombrado) para que el backend sólo vea trabajos completos.
#[derive(Debug, Clone)]
pub struct SpoolPipeline {
    dir: PathBuf,
}

#[derive(Debug, Serialize)]
struct JobManifest<'a> {
    job_id: Uuid,
    hashkey: &'a str,
    submitted_at: chrono::DateTime<Utc>,
    structure_file: String,
    formula: String,
    settings: &'a PipelineSettings,
}

impl SpoolPipeline {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }
}

#[async_trait]
impl ComputationPipeline for SpoolPipeline {
    async fn run(&self, request: PipelineRequest, settings: &PipelineSettings) -> Result<PipelineOutput, PipelineError> {
        fs::create_dir_all(&self.dir).await?;
        let structure_file = format!("{}.sdf", request.key);
        fs::write(self.dir.join(&structure_file), request.canonical_text.as_bytes()).await?;

        let job_id = Uuid::new_v4();
        let manifest = JobManifest { job_id,
                                     hashkey: &request.key,
                                     submitted_at: Utc::now(),
                                     structure_file,
                                     formula: request.molecule.formula(),
                                     settings };
        let body = serde_json::to_vec_pretty(&manifest)?;
        let tmp = self.dir.join(format!("{}.json.tmp", request.key));
        fs::write(&tmp, body).await?;
        fs::rename(&tmp, self.dir.join(format!("{}.json", request.key))).await?;
        info!("{} spooled as job {}", request.key, job_id);

        let payload = json!({ "hashkey": request.key, "job_id": job_id.to_string(), "status": "queued" });
        let record = CalculationRecord::new(request.key.clone(), payload.clone());
        Ok(PipelineOutput { payload,
                            record: Some(record) })
    }
}
