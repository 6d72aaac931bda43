//! RAG response types
//!
//! Defines the answer payload produced by the support pipeline and the
//! confidence grading applied to it.

use serde::{Deserialize, Serialize};

/// Answer returned when nothing in the knowledge base is close enough
pub const NO_MATCH_ANSWER: &str = "I couldn't find specific information about this in our \
knowledge base. Please contact our customer service team for more details.";

/// Answer returned when the pipeline itself fails unexpectedly
pub const PROCESSING_FALLBACK: &str = "I apologize, but I'm having trouble processing your \
request right now. Please try again later.";

/// How close the best retrieved document was to the question
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Confidence {
    High,
    Medium,
    Low,
}

impl Confidence {
    /// Grade a best-hit distance against the tier cutoffs
    pub fn from_min_distance(min_distance: f32, thresholds: &ConfidenceThresholds) -> Self {
        if min_distance < thresholds.high_below {
            Self::High
        } else if min_distance < thresholds.medium_below {
            Self::Medium
        } else {
            Self::Low
        }
    }
}

impl std::fmt::Display for Confidence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
        }
    }
}

/// Distance cutoffs separating the confidence tiers
///
/// Distances below `high_below` grade high; otherwise below `medium_below`
/// grade medium; everything else is low. Both bounds are exclusive.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct ConfidenceThresholds {
    pub high_below: f32,
    pub medium_below: f32,
}

impl Default for ConfidenceThresholds {
    fn default() -> Self {
        Self {
            high_below: 0.5,
            medium_below: 1.0,
        }
    }
}

/// Response from the support pipeline
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RagResponse {
    /// Generated (or fallback) answer text
    pub answer: String,
    /// Titles of the documents behind the answer, closest first
    pub sources: Vec<String>,
    /// Confidence grade derived from retrieval distance
    pub confidence: Confidence,
}

impl RagResponse {
    /// The canned response for questions with no close documents
    pub fn no_match() -> Self {
        Self {
            answer: NO_MATCH_ANSWER.to_string(),
            sources: Vec::new(),
            confidence: Confidence::Low,
        }
    }

    /// The canned response for an unexpected pipeline failure
    pub fn processing_failure() -> Self {
        Self {
            answer: PROCESSING_FALLBACK.to_string(),
            sources: Vec::new(),
            confidence: Confidence::Low,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_tiers() {
        let thresholds = ConfidenceThresholds::default();

        assert_eq!(
            Confidence::from_min_distance(0.0, &thresholds),
            Confidence::High
        );
        assert_eq!(
            Confidence::from_min_distance(0.49, &thresholds),
            Confidence::High
        );
        assert_eq!(
            Confidence::from_min_distance(0.99, &thresholds),
            Confidence::Medium
        );
        assert_eq!(
            Confidence::from_min_distance(1.4, &thresholds),
            Confidence::Low
        );
    }

    #[test]
    fn test_confidence_boundaries_are_exclusive() {
        let thresholds = ConfidenceThresholds::default();

        // Exactly on a cutoff falls into the weaker tier
        assert_eq!(
            Confidence::from_min_distance(0.5, &thresholds),
            Confidence::Medium
        );
        assert_eq!(
            Confidence::from_min_distance(1.0, &thresholds),
            Confidence::Low
        );
    }

    #[test]
    fn test_confidence_serializes_lowercase() {
        assert_eq!(
            serde_json::to_string(&Confidence::High).unwrap(),
            "\"high\""
        );
        assert_eq!(serde_json::to_string(&Confidence::Low).unwrap(), "\"low\"");
    }

    #[test]
    fn test_no_match_response() {
        let response = RagResponse::no_match();

        assert!(response.answer.contains("knowledge base"));
        assert!(response.sources.is_empty());
        assert_eq!(response.confidence, Confidence::Low);
    }
}
