//! Request/response records shared by the service, the adapters, and the CLI.
//!
//! Field names serialize in snake_case so JSON output matches the shape
//! meeting tooling already consumes.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Seconds of speaking time credited per mention of a participant.
pub const SECONDS_PER_MENTION: u64 = 5;

/// Factor applied to the word count for `meeting_duration_estimate`.
pub const DURATION_PER_WORD: f64 = 0.5;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Urgent,
    High,
    Medium,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Urgent => "urgent",
            Self::High => "high",
            Self::Medium => "medium",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    /// The match named someone responsible.
    Assigned,
    General,
}

impl ActionType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Assigned => "assigned",
            Self::General => "general",
        }
    }
}

/// A task-like statement pulled out of a transcript.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionItem {
    /// 1-based position among all candidates, before deduplication.
    pub id: usize,
    pub text: String,
    pub assignee: Option<String>,
    pub priority: Priority,
    #[serde(rename = "type")]
    pub kind: ActionType,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Sentiment {
    pub label: String,
    pub score: f32,
}

impl Sentiment {
    pub const NEUTRAL_LABEL: &'static str = "NEUTRAL";

    /// Value reported when classification is unavailable.
    pub fn neutral() -> Self {
        Self {
            label: Self::NEUTRAL_LABEL.to_string(),
            score: 0.5,
        }
    }
}

/// Answer produced by a question-answering capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub text: String,
    /// Span probability, when the model exposes one.
    pub score: Option<f32>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParticipantStats {
    pub mentions: usize,
    /// Seconds.
    pub estimated_speaking_time: u64,
}

impl ParticipantStats {
    pub fn from_mentions(mentions: usize) -> Self {
        Self {
            mentions,
            estimated_speaking_time: mentions as u64 * SECONDS_PER_MENTION,
        }
    }
}

pub type Participation = BTreeMap<String, ParticipantStats>;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeetingSummary {
    pub summary: String,
    pub action_items: Vec<ActionItem>,
    pub key_topics: Vec<String>,
    pub sentiment: Sentiment,
    pub participation_analysis: Participation,
    pub meeting_duration_estimate: f64,
    pub word_count: usize,
}

/// Heuristic confidence for an answer, from its length alone.
///
/// This is a stand-in, not a calibrated model probability: longer answers
/// score higher regardless of correctness. Prefer [`Answer::score`] when an
/// adapter provides it.
pub fn length_confidence(answer: &str) -> f32 {
    match answer.chars().count() {
        n if n > 50 => 0.85,
        n if n > 20 => 0.70,
        _ => 0.55,
    }
}
