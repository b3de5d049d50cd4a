//! Sequence-classification sentiment model on ONNX Runtime.
//!
//! Expects a Hugging Face export (e.g. twitter-roberta-base-sentiment):
//! `model.onnx`, `tokenizer.json`, and `config.json` with `id2label`.

use std::path::Path;
use std::sync::Mutex;

use colloquy_core::{NlpError, Sentiment, SentimentClassifier};
use ort::session::Session;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use crate::onnx;
use crate::scoring::{argmax, labels_from_config, num_labels_from_config, softmax};

const NAME: &str = "sentiment";
const MAX_TOKENS: usize = 512;

pub struct OnnxSentiment {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    labels: Vec<String>,
}

impl OnnxSentiment {
    pub fn load(model_dir: &Path) -> anyhow::Result<Self> {
        let model_path = onnx::require_file(model_dir, "model.onnx")?;
        let tokenizer = onnx::load_tokenizer(model_dir, MAX_TOKENS, false)?;
        let config = onnx::read_model_config(model_dir)?;
        // Three classes (negative/neutral/positive) when the config is silent.
        let labels = labels_from_config(&config, num_labels_from_config(&config).unwrap_or(3));
        let session = onnx::load_session(&model_path)?;

        info!(labels = ?labels, model = %model_path.display(), "loaded sentiment model");
        Ok(Self {
            session,
            tokenizer,
            labels,
        })
    }

    pub fn labels(&self) -> &[String] {
        &self.labels
    }

    fn infer(&self, text: &str) -> anyhow::Result<Sentiment> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("tokenize: {e}"))?;
        let (ids, mask) = onnx::encoding_tensors(&encoding)?;

        let mut session = onnx::lock(&self.session)?;
        let outputs = session.run(ort::inputs![
            "input_ids" => ids,
            "attention_mask" => mask,
        ])?;

        // Logits: [1, num_labels].
        let (_, logits) = outputs[0].try_extract_tensor::<f32>()?;
        let probs = softmax(logits);
        let (index, score) =
            argmax(&probs).ok_or_else(|| anyhow::anyhow!("model returned no logits"))?;

        let label = self
            .labels
            .get(index)
            .cloned()
            .unwrap_or_else(|| format!("LABEL_{index}"));
        debug!(label = %label, score, tokens = encoding.len(), "classified sentiment");
        Ok(Sentiment { label, score })
    }
}

impl SentimentClassifier for OnnxSentiment {
    fn name(&self) -> &str {
        "onnx-sentiment"
    }

    fn classify(&self, text: &str) -> colloquy_core::Result<Sentiment> {
        self.infer(text)
            .map_err(|e| NlpError::model(NAME, format!("{e:#}")))
    }
}
