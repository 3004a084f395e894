use lazy_static::lazy_static;
use regex::Regex;

use crate::analysis::id::IdGenerator;
use crate::analysis::types::{
    AnalysisResult, Priority, ReadabilityLevel, ReadabilityScore, Suggestion, SuggestionKind,
};
use crate::llm::utils::string_util::{take_chars, truncate_chars_with_ellipsis};

lazy_static! {
    static ref SENTENCE_BREAK: Regex = Regex::new(r"[.!?]+").expect("valid sentence regex");
}

const ORIGINAL_EXCERPT_CHARS: usize = 50;
const SUMMARY_CHARS: usize = 200;

/// Sentence-length statistics of the analyzed text.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TextStats {
    pub word_count: usize,
    pub sentence_count: usize,
    pub avg_words_per_sentence: f64,
}

impl TextStats {
    pub fn of(content: &str) -> Self {
        let word_count = content.split_whitespace().count();
        let sentence_count = SENTENCE_BREAK
            .split(content)
            .filter(|s| !s.trim().is_empty())
            .count()
            .max(1);

        Self {
            word_count,
            sentence_count,
            avg_words_per_sentence: word_count as f64 / sentence_count as f64,
        }
    }

    pub fn level(&self) -> ReadabilityLevel {
        if self.avg_words_per_sentence < 15.0 {
            ReadabilityLevel::Easy
        } else if self.avg_words_per_sentence < 25.0 {
            ReadabilityLevel::Medium
        } else {
            ReadabilityLevel::Difficult
        }
    }

    /// Uses a 20-word cut, not the level thresholds.
    pub fn score(&self) -> f64 {
        if self.avg_words_per_sentence < 20.0 {
            80.0
        } else {
            60.0
        }
    }
}

/// Heuristic result for a model answer that could not be decoded.
pub fn fallback_analysis<G: IdGenerator + ?Sized>(
    content: &str,
    raw_response: &str,
    ids: &G,
) -> AnalysisResult {
    let stats = TextStats::of(content);

    let suggestion = Suggestion {
        id: ids.next_id(),
        kind: SuggestionKind::Style,
        priority: Priority::Medium,
        message: "AI analysis completed but response format was unexpected".to_string(),
        original_text: format!("{}...", take_chars(content, ORIGINAL_EXCERPT_CHARS)),
        suggested_text: "Please review the AI response manually".to_string(),
        reason: "The AI provided feedback but in an unexpected format".to_string(),
    };

    AnalysisResult {
        suggestions: vec![suggestion],
        semantic_terms: Vec::new(),
        readability_score: ReadabilityScore {
            score: stats.score(),
            level: stats.level(),
            factors: vec![format!(
                "Average sentence length: {} words",
                stats.avg_words_per_sentence.round() as u64
            )],
        },
        summary: truncate_chars_with_ellipsis(raw_response, SUMMARY_CHARS),
    }
}
