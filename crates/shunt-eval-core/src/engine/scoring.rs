//! Rule-based scoring against fixed clinical cutoffs.

use serde::{Deserialize, Serialize};

/// Which side of the threshold triggers a finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Direction {
    /// Triggered when value <= threshold
    AtOrBelow,
    /// Triggered when value >= threshold
    AtOrAbove,
}

impl Direction {
    /// Check whether `value` triggers against `threshold` (inclusive).
    pub fn triggers(self, value: f64, threshold: f64) -> bool {
        match self {
            Direction::AtOrBelow => value <= threshold,
            Direction::AtOrAbove => value >= threshold,
        }
    }
}

/// Parameters that take part in scoring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoredParameter {
    Tav,
    Ri,
    Pi,
    Edv,
}

impl ScoredParameter {
    /// Short clinical label.
    pub fn label(self) -> &'static str {
        match self {
            ScoredParameter::Tav => "TAV",
            ScoredParameter::Ri => "RI",
            ScoredParameter::Pi => "PI",
            ScoredParameter::Edv => "EDV",
        }
    }
}

/// One scoring rule.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cutoff {
    pub parameter: ScoredParameter,
    pub threshold: f64,
    pub direction: Direction,
    pub finding: &'static str,
}

impl Cutoff {
    pub fn triggers(&self, value: f64) -> bool {
        self.direction.triggers(value, self.threshold)
    }
}

/// Scoring rules in evaluation order. Comments are emitted in this order.
pub const CUTOFFS: [Cutoff; 4] = [
    Cutoff {
        parameter: ScoredParameter::Tav,
        threshold: 34.5,
        direction: Direction::AtOrBelow,
        finding: "low TAV suggests reduced flow",
    },
    Cutoff {
        parameter: ScoredParameter::Ri,
        threshold: 0.68,
        direction: Direction::AtOrAbove,
        finding: "elevated RI suggests high resistance",
    },
    Cutoff {
        parameter: ScoredParameter::Pi,
        threshold: 1.3,
        direction: Direction::AtOrAbove,
        finding: "elevated PI",
    },
    Cutoff {
        parameter: ScoredParameter::Edv,
        threshold: 40.4,
        direction: Direction::AtOrBelow,
        finding: "low EDV suggests reduced diastolic flow",
    },
];

/// Separator used when findings are stored as a single comment.
pub const COMMENT_SEPARATOR: &str = "; ";

/// Result of scoring one parameter set.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Assessment {
    /// Number of triggered rules (0-4)
    pub score: u8,
    /// Findings in rule order
    pub comments: Vec<String>,
}

impl Assessment {
    /// Findings joined for storage.
    pub fn comment(&self) -> String {
        self.comments.join(COMMENT_SEPARATOR)
    }

    pub fn is_normal(&self) -> bool {
        self.score == 0
    }
}

/// Score TAV, RI, PI and EDV against [`CUTOFFS`].
pub fn score_findings(tav: f64, ri: f64, pi: f64, edv: f64) -> Assessment {
    let mut assessment = Assessment::default();

    for cutoff in &CUTOFFS {
        let value = match cutoff.parameter {
            ScoredParameter::Tav => tav,
            ScoredParameter::Ri => ri,
            ScoredParameter::Pi => pi,
            ScoredParameter::Edv => edv,
        };
        if cutoff.triggers(value) {
            assessment.score += 1;
            assessment.comments.push(cutoff.finding.to_string());
        }
    }

    assessment
}
