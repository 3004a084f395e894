//! Analysis pipeline: prompt, dispatch, decode and fallback.

pub mod fallback;
pub mod id;
pub mod parser;
pub mod prompts;
pub mod retry;
pub mod service;
pub mod types;

pub use service::AnalysisService;
pub use types::{
    AnalysisResult, Priority, ReadabilityLevel, ReadabilityScore, SemanticTerm, Suggestion,
    SuggestionKind,
};
