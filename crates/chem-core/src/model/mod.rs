//! Modelos del pipeline de envíos (entrada, registro persistido y
//! resultado).

pub mod record;
pub mod submission;

pub use record::CalculationRecord;
pub use submission::{RawSubmission, SubmissionOutcome};
