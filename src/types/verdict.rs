//! Scoring verdict shown to the user.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Binary verdict for a scored transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Verdict {
    Fraudulent,
    Legitimate,
}

impl Verdict {
    pub fn is_fraud(self) -> bool {
        matches!(self, Verdict::Fraudulent)
    }
}

impl fmt::Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Verdict::Fraudulent => "FRAUDULENT",
            Verdict::Legitimate => "LEGITIMATE",
        })
    }
}

/// Outcome of scoring one submission.
///
/// `probability` belongs to the verdict itself: P(fraud) for fraudulent
/// verdicts, 1 - P(fraud) for legitimate ones, so the displayed number is
/// always the model's confidence in what it predicted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PredictionResult {
    pub verdict: Verdict,
    pub probability: f64,
}

impl PredictionResult {
    /// One-line summary with the probability to two decimals, as rendered
    /// on the page.
    pub fn summary(&self) -> String {
        format!(
            "The transaction is likely {} (probability {:.2})",
            self.verdict, self.probability
        )
    }
}
