//! chem-core: pipeline de envíos de molcalc.
//!
//! Recibe un molfile, lo normaliza (geometría 3D, hidrógenos, techo de
//! átomos pesados), calcula un hashkey de contenido, deduplica contra el
//! `ResultStore` y entrega los envíos nuevos al `ComputationPipeline`.

pub mod constants;
pub mod convert;
pub mod errors;
pub mod fingerprint;
pub mod gate;
pub mod hashing;
pub mod lease;
pub mod lookup;
pub mod model;
pub mod normalize;
pub mod pipeline;
pub mod sanitize;
pub mod store;

pub use convert::ConversionService;
pub use errors::{ConversionError, ConversionKind, GateError, LookupError, PipelineError, RejectionError, StoreError};
pub use fingerprint::{compute_key, FingerprintedStructure};
pub use gate::{GatePolicy, SubmissionGate, SubmissionStage};
pub use lookup::find_calculation;
pub use model::{CalculationRecord, RawSubmission, SubmissionOutcome};
pub use normalize::{MoleculeNormalizer, NormalizedMolecule};
pub use pipeline::{ComputationPipeline, PipelineOutput, PipelineRequest, PipelineSettings, SpoolPipeline};
pub use store::{InMemoryResultStore, ResultStore, UpsertOutcome};
