//! Service tuning knobs.
//!
//! Defaults match the limits of the reference models: BART accepts roughly
//! 1024 characters of input per chunk, the sentiment classifier about 512.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{NlpError, Result};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Upper bound handed to the summarizer, and the word count above which
    /// joined chunk summaries are summarized again.
    pub summary_max_length: usize,
    pub summary_min_length: usize,
    /// `summary_max_length` used when summarizing a whole meeting.
    pub meeting_summary_max_length: usize,
    /// Texts with fewer words are returned as their own summary.
    pub min_words_to_summarize: usize,
    pub summary_chunk_chars: usize,
    pub sentiment_chunk_chars: usize,
    pub qa_chunk_chars: usize,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            summary_max_length: 150,
            summary_min_length: 30,
            meeting_summary_max_length: 200,
            min_words_to_summarize: 50,
            summary_chunk_chars: 1024,
            sentiment_chunk_chars: 512,
            qa_chunk_chars: 2000,
        }
    }
}

impl ServiceConfig {
    /// Load from a JSON file. Missing fields keep their defaults.
    pub fn from_json_file(path: &Path) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&raw)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        for (name, value) in [
            ("summary_chunk_chars", self.summary_chunk_chars),
            ("sentiment_chunk_chars", self.sentiment_chunk_chars),
            ("qa_chunk_chars", self.qa_chunk_chars),
            ("summary_max_length", self.summary_max_length),
            ("meeting_summary_max_length", self.meeting_summary_max_length),
        ] {
            if value == 0 {
                return Err(NlpError::Config(format!("{name} must be greater than zero")));
            }
        }
        if self.summary_min_length > self.summary_max_length {
            return Err(NlpError::Config(format!(
                "summary_min_length ({}) exceeds summary_max_length ({})",
                self.summary_min_length, self.summary_max_length
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_are_valid() {
        let config = ServiceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.summary_chunk_chars, 1024);
        assert_eq!(config.meeting_summary_max_length, 200);
    }

    #[test]
    fn partial_file_keeps_defaults() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"qa_chunk_chars": 800}}"#).unwrap();

        let config = ServiceConfig::from_json_file(file.path()).unwrap();
        assert_eq!(config.qa_chunk_chars, 800);
        assert_eq!(config.summary_max_length, 150);
    }

    #[test]
    fn rejects_zero_chunk_size() {
        let config = ServiceConfig {
            summary_chunk_chars: 0,
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("summary_chunk_chars"));
    }

    #[test]
    fn rejects_min_above_max() {
        let config = ServiceConfig {
            summary_min_length: 300,
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(NlpError::Config(_))));
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = ServiceConfig::from_json_file(Path::new("/nonexistent/colloquy.json")).unwrap_err();
        assert!(matches!(err, NlpError::Io(_)));
    }
}
