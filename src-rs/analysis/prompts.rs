/// Canary sent by the connection test
pub const CONNECTION_TEST_PROMPT: &str =
    "Please respond with \"Connection successful\" if you can read this message.";

/// Phrase a well-behaved model echoes back for the canary
pub const CONNECTION_CONFIRMATION: &str = "connection successful";

const ANALYSIS_INSTRUCTIONS: &str = r#"
Please analyze the following text for writing quality and provide suggestions for improvement.
Return your analysis in the following JSON format:

{
  "suggestions": [
    {
      "type": "grammar|style|clarity|structure",
      "priority": "low|medium|high",
      "message": "Description of the issue",
      "originalText": "The problematic text",
      "suggestedText": "Improved version",
      "reason": "Explanation of why this is better"
    }
  ],
  "semanticTerms": [
    {
      "term": "important term",
      "category": "category name",
      "importance": 0.8,
      "context": ["context sentence 1", "context sentence 2"]
    }
  ],
  "readabilityScore": {
    "score": 75,
    "level": "medium",
    "factors": ["Average sentence length: 18 words", "Complex words: 12%"]
  },
  "summary": "Brief summary of the text quality and main recommendations"
}

Text to analyze:
"#;

pub fn build_analysis_prompt(content: &str) -> String {
    format!("{}{}\n", ANALYSIS_INSTRUCTIONS, content)
}
