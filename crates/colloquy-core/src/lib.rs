//! Core of Colloquy: data model, model capability traits, configuration,
//! and the first-party text heuristics (chunking, action items, topics,
//! participation).

pub mod actions;
pub mod capability;
pub mod chunk;
pub mod config;
mod error;
pub mod model;
pub mod outcome;
pub mod participation;
pub mod topics;

pub use actions::ActionItemExtractor;
pub use capability::{QuestionAnswerer, SentimentClassifier, Summarizer, TextEmbedder, Unavailable};
pub use chunk::{split_into_chunks, word_count};
pub use config::ServiceConfig;
pub use error::{NlpError, Result};
pub use model::{
    ActionItem, ActionType, Answer, MeetingSummary, ParticipantStats, Participation, Priority,
    Sentiment, length_confidence,
};
pub use outcome::Outcome;
pub use participation::analyze_participation;
pub use topics::extract_key_topics;
