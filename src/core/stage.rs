//! Stage definitions - what each stage reads and writes

use crate::core::state::Field;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a pipeline stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StageId {
    ExtractVideoId,
    ExtractTranscript,
    SummarizeTranscript,
    GenerateQuestions,
    NextSteps,
    FindKeyword,
    SuggestVideos,
}

impl StageId {
    pub fn as_str(&self) -> &'static str {
        match self {
            StageId::ExtractVideoId => "extract_video_id",
            StageId::ExtractTranscript => "extract_transcript",
            StageId::SummarizeTranscript => "summarize_transcript",
            StageId::GenerateQuestions => "generate_questions",
            StageId::NextSteps => "next_steps",
            StageId::FindKeyword => "find_keyword",
            StageId::SuggestVideos => "suggest_videos",
        }
    }

    /// The declared inputs and outputs of this stage
    pub fn spec(&self) -> &'static StageSpec {
        // TOPOLOGY is indexed by declaration order
        &TOPOLOGY[*self as usize]
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Data contract of a stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StageSpec {
    pub id: StageId,

    /// Fields that must be populated before the stage runs
    pub reads: &'static [Field],

    /// Fields the stage is allowed to populate
    pub writes: &'static [Field],

    pub description: &'static str,
}

impl StageSpec {
    pub fn writes_field(&self, field: Field) -> bool {
        self.writes.contains(&field)
    }
}

/// The fixed digest pipeline
///
/// Precedence between stages is derived from these contracts: a stage
/// depends on whichever stage writes a field it reads.
pub static TOPOLOGY: [StageSpec; 7] = [
    StageSpec {
        id: StageId::ExtractVideoId,
        reads: &[Field::VideoUrl],
        writes: &[Field::VideoId],
        description: "Extract the canonical video id from the URL",
    },
    StageSpec {
        id: StageId::ExtractTranscript,
        reads: &[Field::VideoId],
        writes: &[Field::Transcript],
        description: "Fetch the transcript and join its snippets",
    },
    StageSpec {
        id: StageId::SummarizeTranscript,
        reads: &[Field::Transcript],
        writes: &[Field::Summary],
        description: "Summarize the transcript",
    },
    StageSpec {
        id: StageId::GenerateQuestions,
        reads: &[Field::Summary],
        writes: &[Field::Questions],
        description: "Write five comprehension questions",
    },
    StageSpec {
        id: StageId::NextSteps,
        reads: &[Field::Summary],
        writes: &[Field::NextSteps],
        description: "Suggest follow-up learning steps",
    },
    StageSpec {
        id: StageId::FindKeyword,
        reads: &[Field::Transcript],
        writes: &[Field::Keyword],
        description: "Extract search keywords from the transcript",
    },
    StageSpec {
        id: StageId::SuggestVideos,
        reads: &[Field::Keyword],
        writes: &[Field::VideoSuggestions],
        description: "Look up related videos for the keywords",
    },
];
