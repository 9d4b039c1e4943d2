//! Prompt templates for the text-generation stages

use crate::core::config::PromptOverrides;

const EXTRACT_VIDEO_ID: &str = "\
Extract the video id from this video URL: {{ video_url }}
Return only the id.";

const SUMMARIZE: &str = "\
Summarize the following transcript concisely:

{{ transcript }}";

const QUESTIONS: &str = "\
Write exactly 5 comprehension questions about the content of this summary:

{{ summary }}";

const NEXT_STEPS: &str = "\
Based on this summary, suggest concrete next steps for learning more about its subject.
Prefer hands-on exercises, for example a practice dataset or project that applies the ideas.

{{ summary }}";

const KEYWORD: &str = "\
Extract the most relevant search keywords from the following transcript:

{{ transcript }}";

/// The prompt templates used by the stages
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompts {
    pub extract_video_id: String,
    pub summarize: String,
    pub questions: String,
    pub next_steps: String,
    pub keyword: String,
}

impl Default for Prompts {
    fn default() -> Self {
        Self {
            extract_video_id: EXTRACT_VIDEO_ID.to_string(),
            summarize: SUMMARIZE.to_string(),
            questions: QUESTIONS.to_string(),
            next_steps: NEXT_STEPS.to_string(),
            keyword: KEYWORD.to_string(),
        }
    }
}

impl Prompts {
    /// Defaults with any configured templates swapped in
    pub fn from_overrides(overrides: &PromptOverrides) -> Self {
        let defaults = Self::default();
        let pick = |custom: &Option<String>, default: String| custom.clone().unwrap_or(default);

        Self {
            extract_video_id: pick(&overrides.extract_video_id, defaults.extract_video_id),
            summarize: pick(&overrides.summarize, defaults.summarize),
            questions: pick(&overrides.questions, defaults.questions),
            next_steps: pick(&overrides.next_steps, defaults.next_steps),
            keyword: pick(&overrides.keyword, defaults.keyword),
        }
    }
}

/// Substitute `{{ name }}` placeholders
pub fn render(template: &str, variables: &[(&str, &str)]) -> String {
    let mut prompt = template.to_string();
    for (key, value) in variables {
        let placeholder = format!("{{{{ {} }}}}", key);
        prompt = prompt.replace(&placeholder, value);
    }
    prompt
}
