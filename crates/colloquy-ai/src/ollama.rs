//! Summarization through an Ollama-compatible `/api/generate` endpoint.

use std::time::Duration;

use colloquy_core::{NlpError, Summarizer};
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

const NAME: &str = "summarizer";

#[derive(Debug, Clone)]
pub struct OllamaConfig {
    /// Base URL, e.g. `http://localhost:11434`.
    pub endpoint: String,
    pub model: String,
    pub timeout: Duration,
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            endpoint: "http://localhost:11434".to_string(),
            model: "llama3.2".to_string(),
            timeout: Duration::from_secs(120),
        }
    }
}

#[derive(Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: String,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: usize,
}

#[derive(Deserialize)]
struct GenerateResponse {
    response: String,
}

pub struct OllamaSummarizer {
    client: Client,
    config: OllamaConfig,
}

impl OllamaSummarizer {
    pub fn new(mut config: OllamaConfig) -> anyhow::Result<Self> {
        config.endpoint = config.endpoint.trim_end_matches('/').to_string();
        let client = Client::builder().timeout(config.timeout).build()?;
        info!(endpoint = %config.endpoint, model = %config.model, "using Ollama summarizer");
        Ok(Self { client, config })
    }

    fn generate(&self, text: &str, max_length: usize, min_length: usize) -> anyhow::Result<String> {
        let url = format!("{}/api/generate", self.config.endpoint);
        let request = GenerateRequest {
            model: &self.config.model,
            prompt: build_prompt(text, max_length, min_length),
            stream: false,
            options: GenerateOptions {
                temperature: 0.0,
                // Words run to more than one token; leave headroom.
                num_predict: max_length * 2,
            },
        };

        debug!(url = %url, chars = text.len(), "requesting summary");
        let resp = self.client.post(&url).json(&request).send()?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().unwrap_or_default();
            anyhow::bail!("server returned {}: {body}", status.as_u16());
        }

        let body: GenerateResponse = resp.json()?;
        let summary = body.response.trim().to_string();
        anyhow::ensure!(!summary.is_empty(), "server returned an empty summary");
        Ok(summary)
    }
}

fn build_prompt(text: &str, max_length: usize, min_length: usize) -> String {
    format!(
        "Summarize the following text in {min_length} to {max_length} words. \
         Reply with the summary only.\n\n{text}"
    )
}

impl Summarizer for OllamaSummarizer {
    fn name(&self) -> &str {
        "ollama"
    }

    fn summarize(&self, text: &str, max_length: usize, min_length: usize) -> colloquy_core::Result<String> {
        self.generate(text, max_length, min_length)
            .map_err(|e| NlpError::model(NAME, format!("{e:#}")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trims_trailing_slash() {
        let summarizer = OllamaSummarizer::new(OllamaConfig {
            endpoint: "http://localhost:11434/".into(),
            ..Default::default()
        })
        .unwrap();
        assert_eq!(summarizer.config.endpoint, "http://localhost:11434");
    }

    #[test]
    fn prompt_carries_bounds_and_text() {
        let prompt = build_prompt("The team shipped v2.", 40, 10);
        assert!(prompt.contains("10 to 40 words"));
        assert!(prompt.ends_with("The team shipped v2."));
    }

    #[test]
    fn request_serializes_without_streaming() {
        let request = GenerateRequest {
            model: "llama3.2",
            prompt: "p".into(),
            stream: false,
            options: GenerateOptions {
                temperature: 0.0,
                num_predict: 300,
            },
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["stream"], false);
        assert_eq!(json["options"]["num_predict"], 300);
    }

    #[test]
    fn unreachable_server_is_model_error() {
        let summarizer = OllamaSummarizer::new(OllamaConfig {
            endpoint: "http://127.0.0.1:9".into(),
            timeout: Duration::from_secs(2),
            ..Default::default()
        })
        .unwrap();
        let err = summarizer.summarize("text", 10, 5).unwrap_err();
        assert!(matches!(err, NlpError::Model { capability: "summarizer", .. }));
    }
}
