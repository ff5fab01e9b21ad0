//! Decision sources: where simulated verification outcomes come from.
//!
//! Nothing is really verified. The engine asks a `DecisionSource` whether a
//! document "passed" and what biometric match score was "measured", so tests
//! can swap the random source for a fixed one.

use rand::Rng;

/// Which identity document is being checked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentKind {
    Pan,
    Aadhaar,
    DigiLocker,
}

impl DocumentKind {
    /// Parse the wire name. Returns `None` for unsupported documents.
    pub fn from_wire(s: &str) -> Option<Self> {
        match s {
            "pan" => Some(Self::Pan),
            "aadhaar" => Some(Self::Aadhaar),
            "digilocker" => Some(Self::DigiLocker),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pan => "pan",
            Self::Aadhaar => "aadhaar",
            Self::DigiLocker => "digilocker",
        }
    }

    /// Name as shown to the customer ("Aadhaar", "Digilocker").
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Pan => "Pan",
            Self::Aadhaar => "Aadhaar",
            Self::DigiLocker => "Digilocker",
        }
    }
}

/// Lowest biometric match score that counts as a pass.
pub const BIOMETRIC_MATCH_THRESHOLD: u8 = 85;

/// Source of simulated verification outcomes.
pub trait DecisionSource: Send + Sync {
    /// Whether the given document passes verification.
    fn document_verified(&self, kind: DocumentKind) -> bool;

    /// Face match score, 0–100.
    fn biometric_score(&self) -> u8;
}

/// Default source: 3-in-4 document pass rate, match scores drawn from 85..=98.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomDecisions;

impl DecisionSource for RandomDecisions {
    fn document_verified(&self, _kind: DocumentKind) -> bool {
        rand::thread_rng().gen_ratio(3, 4)
    }

    fn biometric_score(&self) -> u8 {
        rand::thread_rng().gen_range(85..=98)
    }
}

/// Deterministic source returning preset outcomes.
#[derive(Debug, Clone, Copy)]
pub struct FixedDecisions {
    pub documents_pass: bool,
    pub biometric_score: u8,
}

impl FixedDecisions {
    /// Every check passes.
    pub fn passing() -> Self {
        Self {
            documents_pass: true,
            biometric_score: 92,
        }
    }

    /// Every check fails.
    pub fn failing() -> Self {
        Self {
            documents_pass: false,
            biometric_score: 40,
        }
    }
}

impl DecisionSource for FixedDecisions {
    fn document_verified(&self, _kind: DocumentKind) -> bool {
        self.documents_pass
    }

    fn biometric_score(&self) -> u8 {
        self.biometric_score
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn document_kind_wire_names() {
        for kind in [DocumentKind::Pan, DocumentKind::Aadhaar, DocumentKind::DigiLocker] {
            assert_eq!(DocumentKind::from_wire(kind.as_str()), Some(kind));
        }
        assert_eq!(DocumentKind::from_wire("passport"), None);
        assert_eq!(DocumentKind::from_wire("PAN"), None);
    }

    #[test]
    fn display_names() {
        assert_eq!(DocumentKind::Aadhaar.display_name(), "Aadhaar");
        assert_eq!(DocumentKind::DigiLocker.display_name(), "Digilocker");
    }

    #[test]
    fn random_scores_stay_in_range() {
        let source = RandomDecisions;
        for _ in 0..1_000 {
            let score = source.biometric_score();
            assert!((85..=98).contains(&score), "score {score} out of range");
            assert!(score >= BIOMETRIC_MATCH_THRESHOLD);
        }
    }

    #[test]
    fn random_documents_mostly_pass() {
        let source = RandomDecisions;
        let passes = (0..4_000)
            .filter(|_| source.document_verified(DocumentKind::Pan))
            .count();
        // Expected 3000; the window is wide enough to never flake.
        assert!((2_600..=3_400).contains(&passes), "{passes} passes out of 4000");
    }

    #[test]
    fn fixed_decisions() {
        let pass = FixedDecisions::passing();
        assert!(pass.document_verified(DocumentKind::Aadhaar));
        assert!(pass.biometric_score() >= BIOMETRIC_MATCH_THRESHOLD);

        let fail = FixedDecisions::failing();
        assert!(!fail.document_verified(DocumentKind::Pan));
        assert!(fail.biometric_score() < BIOMETRIC_MATCH_THRESHOLD);
    }
}
