//! Records produced by the extraction pipeline.

use serde::{Deserialize, Serialize};

/// The structured résumé returned to the caller.
///
/// Serialises to a JSON object whose keys are exactly the field names of
/// [`crate::schema::RESUME_SCHEMA`]. Lists may be empty; optional strings
/// are `""` when the model did not supply them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StructuredResume {
    pub name: String,
    pub desired_title: String,
    pub summary: String,
    pub birth_date: String,
    pub gender: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub education: Vec<Education>,
    pub courses: Vec<Course>,
    pub skills: Vec<Skill>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Education {
    pub organization: String,
    pub degree: String,
    pub major: String,
    pub graduation_year: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Course {
    pub course_name: String,
    pub organization: String,
    pub finish_date: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Skill {
    pub skill_name: String,
    pub description: String,
}

/// Plain text pulled from a PDF, after character filtering.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedText {
    /// All pages concatenated in page order.
    pub text: String,
    /// Number of pages read.
    pub page_count: usize,
    /// Code points removed by the [`crate::config::TextFilter`].
    pub stripped_chars: usize,
}

/// Token usage reported by the model provider, when available.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
}

/// The raw answer of the hosted model. No structure is assumed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelResponse {
    pub content: String,
    pub usage: Option<TokenUsage>,
}

impl ModelResponse {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            usage: None,
        }
    }
}

/// Timing and size statistics for one extraction.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ExtractionStats {
    pub page_count: usize,
    pub text_chars: usize,
    pub stripped_chars: usize,
    pub prompt_chars: usize,
    pub prompt_tokens: Option<u64>,
    pub completion_tokens: Option<u64>,
    pub text_duration_ms: u64,
    pub llm_duration_ms: u64,
    pub total_duration_ms: u64,
}

/// Result of a successful extraction.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExtractionOutput {
    pub resume: StructuredResume,
    pub stats: ExtractionStats,
}
