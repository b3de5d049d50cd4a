//! Model-backed capabilities.
//!
//! The service treats each model as a black box behind one of these traits.
//! Adapters in `colloquy-ai` wrap ONNX Runtime sessions or HTTP endpoints;
//! tests substitute fakes.

use crate::error::{NlpError, Result};
use crate::model::{Answer, Sentiment};

pub trait Summarizer: Send + Sync {
    fn name(&self) -> &str;

    /// Summarize `text` into roughly `min_length..=max_length` tokens.
    fn summarize(&self, text: &str, max_length: usize, min_length: usize) -> Result<String>;
}

pub trait SentimentClassifier: Send + Sync {
    fn name(&self) -> &str;

    fn classify(&self, text: &str) -> Result<Sentiment>;
}

pub trait QuestionAnswerer: Send + Sync {
    fn name(&self) -> &str;

    fn answer(&self, question: &str, context: &str) -> Result<Answer>;
}

pub trait TextEmbedder: Send + Sync {
    fn name(&self) -> &str;

    fn embed(&self, text: &str) -> Result<Vec<f32>>;
}

/// Placeholder for a capability that was not configured.
///
/// Every call fails with [`NlpError::Unavailable`], so the service falls
/// back to its documented default for the affected operations.
#[derive(Debug, Clone, Copy)]
pub struct Unavailable(pub &'static str);

impl Summarizer for Unavailable {
    fn name(&self) -> &str {
        self.0
    }

    fn summarize(&self, _text: &str, _max_length: usize, _min_length: usize) -> Result<String> {
        Err(NlpError::Unavailable(self.0))
    }
}

impl SentimentClassifier for Unavailable {
    fn name(&self) -> &str {
        self.0
    }

    fn classify(&self, _text: &str) -> Result<Sentiment> {
        Err(NlpError::Unavailable(self.0))
    }
}

impl QuestionAnswerer for Unavailable {
    fn name(&self) -> &str {
        self.0
    }

    fn answer(&self, _question: &str, _context: &str) -> Result<Answer> {
        Err(NlpError::Unavailable(self.0))
    }
}

impl TextEmbedder for Unavailable {
    fn name(&self) -> &str {
        self.0
    }

    fn embed(&self, _text: &str) -> Result<Vec<f32>> {
        Err(NlpError::Unavailable(self.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unavailable_always_errors() {
        let cap = Unavailable("sentiment");
        assert!(matches!(
            SentimentClassifier::classify(&cap, "great"),
            Err(NlpError::Unavailable("sentiment"))
        ));
        assert!(Summarizer::summarize(&cap, "text", 10, 1).is_err());
        assert!(QuestionAnswerer::answer(&cap, "q", "c").is_err());
        assert!(TextEmbedder::embed(&cap, "t").is_err());
        assert_eq!(TextEmbedder::name(&cap), "sentiment");
    }
}
