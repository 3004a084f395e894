use serde::{Deserialize, Deserializer, Serialize};

/// Case-insensitive, whitespace-tolerant decode for the closed vocabularies
/// below; unknown names are still rejected.
macro_rules! deserialize_lowercase_enum {
    ($ty:ident { $($name:literal => $variant:ident),+ $(,)? }) => {
        impl<'de> Deserialize<'de> for $ty {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                match raw.trim().to_ascii_lowercase().as_str() {
                    $($name => Ok($ty::$variant),)+
                    _ => Err(serde::de::Error::unknown_variant(&raw, &[$($name),+])),
                }
            }
        }
    };
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SuggestionKind {
    Grammar,
    Style,
    Clarity,
    Structure,
}

deserialize_lowercase_enum!(SuggestionKind {
    "grammar" => Grammar,
    "style" => Style,
    "clarity" => Clarity,
    "structure" => Structure,
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

deserialize_lowercase_enum!(Priority {
    "low" => Low,
    "medium" => Medium,
    "high" => High,
});

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadabilityLevel {
    Easy,
    #[default]
    Medium,
    Difficult,
}

deserialize_lowercase_enum!(ReadabilityLevel {
    "easy" => Easy,
    "medium" => Medium,
    "difficult" => Difficult,
});

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Suggestion {
    pub id: String,
    #[serde(rename = "type", alias = "kind")]
    pub kind: SuggestionKind,
    pub priority: Priority,
    pub message: String,
    pub original_text: String,
    pub suggested_text: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SemanticTerm {
    pub id: String,
    pub term: String,
    pub category: String,
    pub importance: f64,
    pub context: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadabilityScore {
    pub score: f64,
    pub level: ReadabilityLevel,
    pub factors: Vec<String>,
}

impl Default for ReadabilityScore {
    fn default() -> Self {
        Self {
            score: 0.0,
            level: ReadabilityLevel::Medium,
            factors: Vec::new(),
        }
    }
}

/// Normalized outcome of one analysis call; every field is always populated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub suggestions: Vec<Suggestion>,
    pub semantic_terms: Vec<SemanticTerm>,
    pub readability_score: ReadabilityScore,
    pub summary: String,
}

impl AnalysisResult {
    /// Same result with all identifiers blanked, for comparing runs.
    pub fn without_ids(&self) -> Self {
        let mut out = self.clone();
        for s in &mut out.suggestions {
            s.id.clear();
        }
        for t in &mut out.semantic_terms {
            t.id.clear();
        }
        out
    }
}
