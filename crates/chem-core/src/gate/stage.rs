use std::fmt;

use log::{debug, warn};

/// Estados de un envío.
///
/// `Received → Validated → Parsed → Normalized → Fingerprinted →
/// {Deduplicated | Computed} → Completed`; `Rejected` es alcanzable desde
/// cualquier estado previo a la decisión y `Errored` sólo desde `Computed`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmissionStage {
    Received,
    Validated,
    Parsed,
    Normalized,
    Fingerprinted,
    Deduplicated,
    Computed,
    Completed,
    Rejected,
    Errored,
}

impl SubmissionStage {
    pub fn as_str(&self) -> &'static str {
        match self {
            SubmissionStage::Received => "received",
            SubmissionStage::Validated => "validated",
            SubmissionStage::Parsed => "parsed",
            SubmissionStage::Normalized => "normalized",
            SubmissionStage::Fingerprinted => "fingerprinted",
            SubmissionStage::Deduplicated => "deduplicated",
            SubmissionStage::Computed => "computed",
            SubmissionStage::Completed => "completed",
            SubmissionStage::Rejected => "rejected",
            SubmissionStage::Errored => "errored",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self,
                 SubmissionStage::Completed | SubmissionStage::Rejected | SubmissionStage::Errored)
    }

    /// Transiciones permitidas por la máquina de estados.
    pub fn can_advance_to(&self, next: SubmissionStage) -> bool {
        use SubmissionStage::*;
        match (self, next) {
            (Received, Validated)
            | (Validated, Parsed)
            | (Parsed, Normalized)
            | (Normalized, Fingerprinted)
            | (Fingerprinted, Deduplicated)
            | (Fingerprinted, Computed)
            | (Deduplicated, Completed)
            | (Computed, Completed)
            | (Computed, Errored) => true,
            (current, Rejected) => !current.is_terminal(),
            _ => false,
        }
    }
}

impl fmt::Display for SubmissionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Lleva el estado de un envío y registra cada transición.
#[derive(Debug)]
pub(crate) struct StageTracker {
    client: String,
    stage: SubmissionStage,
}

impl StageTracker {
    pub(crate) fn new(client: &str) -> Self {
        debug!("submission from {client}: {}", SubmissionStage::Received);
        Self { client: client.to_string(),
               stage: SubmissionStage::Received }
    }

    pub(crate) fn stage(&self) -> SubmissionStage {
        self.stage
    }

    pub(crate) fn advance(&mut self, next: SubmissionStage) {
        if !self.stage.can_advance_to(next) {
            warn!("submission from {}: unexpected transition {} -> {}", self.client, self.stage, next);
        }
        debug!("submission from {}: {} -> {}", self.client, self.stage, next);
        self.stage = next;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn happy_paths_are_allowed() {
        use SubmissionStage::*;
        let path = [Received, Validated, Parsed, Normalized, Fingerprinted, Computed, Completed];
        assert!(path.windows(2).all(|w| w[0].can_advance_to(w[1])));
        assert!(Fingerprinted.can_advance_to(Deduplicated));
        assert!(Deduplicated.can_advance_to(Completed));
    }

    #[test]
    fn errored_only_from_computed() {
        use SubmissionStage::*;
        assert!(Computed.can_advance_to(Errored));
        assert!(!Parsed.can_advance_to(Errored));
        assert!(Parsed.can_advance_to(Rejected));
        assert!(!Completed.can_advance_to(Rejected));
        assert!(!Received.can_advance_to(Computed));
    }
}
