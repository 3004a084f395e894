use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;

use crate::analysis::fallback::fallback_analysis;
use crate::analysis::id::IdGenerator;
use crate::analysis::types::{
    AnalysisResult, Priority, ReadabilityLevel, ReadabilityScore, SemanticTerm, Suggestion,
    SuggestionKind,
};
use crate::llm::utils::serde_util::{
    deserialize_f64_lax_or_zero, deserialize_null_default, deserialize_opt_string_lax,
};
use crate::llm::utils::string_util::strip_code_fence;

/// Why a model answer could not be used as a structured analysis.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("model returned an empty answer")]
    Empty,

    #[error("answer does not match the analysis schema: {0}")]
    Schema(#[from] serde_json::Error),
}

// Missing and `null` fields both take the defaults below.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireAnalysis {
    #[serde(default, deserialize_with = "deserialize_null_default")]
    suggestions: Vec<WireSuggestion>,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    semantic_terms: Vec<WireTerm>,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    readability_score: WireReadability,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    summary: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireSuggestion {
    #[serde(default, deserialize_with = "deserialize_opt_string_lax")]
    id: Option<String>,
    #[serde(rename = "type", alias = "kind")]
    kind: SuggestionKind,
    priority: Priority,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    message: String,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    original_text: String,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    suggested_text: String,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    reason: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct WireTerm {
    #[serde(default, deserialize_with = "deserialize_opt_string_lax")]
    id: Option<String>,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    term: String,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    category: String,
    #[serde(default, deserialize_with = "deserialize_f64_lax_or_zero")]
    importance: f64,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    context: Vec<String>,
}

#[derive(Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct WireReadability {
    #[serde(default, deserialize_with = "deserialize_f64_lax_or_zero")]
    score: f64,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    level: ReadabilityLevel,
    #[serde(default, deserialize_with = "deserialize_null_default")]
    factors: Vec<String>,
}

/// Resolves the ids of one collection. Upstream ids are kept on their first
/// occurrence; blank, missing or repeated ones get fresh ids that collide with
/// nothing else in the collection.
fn assign_ids<G: IdGenerator + ?Sized>(upstream: Vec<Option<String>>, ids: &G) -> Vec<String> {
    let mut seen: HashSet<String> = HashSet::new();
    let kept: Vec<Option<String>> = upstream
        .into_iter()
        .map(|id| id.filter(|id| !id.trim().is_empty() && seen.insert(id.clone())))
        .collect();

    kept.into_iter()
        .map(|id| match id {
            Some(id) => id,
            None => {
                let fresh = ids.next_id();
                let mut candidate = fresh.clone();
                let mut n = 1u32;
                while candidate.is_empty() || seen.contains(&candidate) {
                    candidate = format!("{}-{}", fresh, n);
                    n += 1;
                }
                seen.insert(candidate.clone());
                candidate
            }
        })
        .collect()
}

/// Schema-checked decode of a model answer. Missing identifiers are filled
/// from `ids`; everything else passes through as sent.
pub fn decode_analysis<G: IdGenerator + ?Sized>(
    answer: &str,
    ids: &G,
) -> Result<AnalysisResult, DecodeError> {
    let payload = strip_code_fence(answer);
    if payload.is_empty() {
        return Err(DecodeError::Empty);
    }

    let wire: WireAnalysis = serde_json::from_str(payload)?;

    let suggestion_ids = assign_ids(wire.suggestions.iter().map(|s| s.id.clone()).collect(), ids);
    let suggestions = wire
        .suggestions
        .into_iter()
        .zip(suggestion_ids)
        .map(|(s, id)| Suggestion {
            id,
            kind: s.kind,
            priority: s.priority,
            message: s.message,
            original_text: s.original_text,
            suggested_text: s.suggested_text,
            reason: s.reason,
        })
        .collect();

    let term_ids = assign_ids(wire.semantic_terms.iter().map(|t| t.id.clone()).collect(), ids);
    let semantic_terms = wire
        .semantic_terms
        .into_iter()
        .zip(term_ids)
        .map(|(t, id)| SemanticTerm {
            id,
            term: t.term,
            category: t.category,
            importance: t.importance,
            context: t.context,
        })
        .collect();

    Ok(AnalysisResult {
        suggestions,
        semantic_terms,
        readability_score: ReadabilityScore {
            score: wire.readability_score.score,
            level: wire.readability_score.level,
            factors: wire.readability_score.factors,
        },
        summary: wire.summary,
    })
}

/// Turns a model answer into an analysis, falling back to the heuristic
/// result when the answer cannot be decoded. Never fails.
pub fn parse_analysis<G: IdGenerator + ?Sized>(
    content: &str,
    answer: &str,
    ids: &G,
) -> AnalysisResult {
    match decode_analysis(answer, ids) {
        Ok(result) => result,
        Err(e) => {
            log::warn!("Failed to parse AI response as JSON, creating fallback: {}", e);
            fallback_analysis(content, answer, ids)
        }
    }
}
