use serde::{Deserialize, Serialize};

/// How heavily an answer leans on jargon instead of substance.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BuzzwordDensity {
    Low,
    #[default]
    Medium,
    High,
}

impl BuzzwordDensity {
    /// Parses a density literal, case-insensitively. Unknown values fall back to `Medium`.
    pub fn normalize(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "low" => BuzzwordDensity::Low,
            "high" => BuzzwordDensity::High,
            _ => BuzzwordDensity::Medium,
        }
    }
}

/// The seven scored quality dimensions of an answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Dimension {
    ConceptualCorrectness,
    ImplementationDepth,
    TradeoffAwareness,
    Clarity,
    Structure,
    ExampleUsage,
    Confidence,
}

impl Dimension {
    pub const ALL: [Dimension; 7] = [
        Dimension::ConceptualCorrectness,
        Dimension::ImplementationDepth,
        Dimension::TradeoffAwareness,
        Dimension::Clarity,
        Dimension::Structure,
        Dimension::ExampleUsage,
        Dimension::Confidence,
    ];

    /// Tag recorded in weakness/strength sets.
    pub fn tag(self) -> &'static str {
        match self {
            Dimension::ConceptualCorrectness => "conceptual_correctness",
            Dimension::ImplementationDepth => "implementation_depth",
            Dimension::TradeoffAwareness => "tradeoff_awareness",
            Dimension::Clarity => "clarity",
            Dimension::Structure => "structure",
            Dimension::ExampleUsage => "example_usage",
            Dimension::Confidence => "confidence",
        }
    }

    /// Wire key used by the evaluation oracle.
    pub fn key(self) -> &'static str {
        match self {
            Dimension::ConceptualCorrectness => "conceptualCorrectness",
            Dimension::ImplementationDepth => "implementationDepth",
            Dimension::TradeoffAwareness => "tradeoffAwareness",
            Dimension::Clarity => "clarity",
            Dimension::Structure => "structure",
            Dimension::ExampleUsage => "exampleUsage",
            Dimension::Confidence => "confidence",
        }
    }
}

/// Structured per-answer quality scoring. Every score is within 0.0 – 10.0
/// once it has passed through the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub conceptual_correctness: f64,
    pub implementation_depth: f64,
    pub tradeoff_awareness: f64,
    pub clarity: f64,
    pub structure: f64,
    pub example_usage: f64,
    pub confidence: f64,
    pub vagueness_flag: bool,
    pub buzzword_density: BuzzwordDensity,
}

impl Evaluation {
    pub fn score(&self, dimension: Dimension) -> f64 {
        match dimension {
            Dimension::ConceptualCorrectness => self.conceptual_correctness,
            Dimension::ImplementationDepth => self.implementation_depth,
            Dimension::TradeoffAwareness => self.tradeoff_awareness,
            Dimension::Clarity => self.clarity,
            Dimension::Structure => self.structure,
            Dimension::ExampleUsage => self.example_usage,
            Dimension::Confidence => self.confidence,
        }
    }
}

impl Default for Evaluation {
    /// The evaluation an entirely empty oracle payload normalizes to.
    fn default() -> Self {
        Self {
            conceptual_correctness: 0.0,
            implementation_depth: 0.0,
            tradeoff_awareness: 0.0,
            clarity: 0.0,
            structure: 0.0,
            example_usage: 0.0,
            confidence: 5.0,
            vagueness_flag: false,
            buzzword_density: BuzzwordDensity::Medium,
        }
    }
}
