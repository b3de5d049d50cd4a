//! Extractive question answering on ONNX Runtime.
//!
//! Expects a SQuAD-style export (e.g. distilbert-base-cased-distilled-squad)
//! with `start_logits` and `end_logits` outputs.

use std::path::Path;
use std::sync::Mutex;

use colloquy_core::{Answer, NlpError, QuestionAnswerer};
use ort::session::Session;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use crate::onnx;
use crate::scoring::best_span;

const NAME: &str = "question-answering";
const MAX_TOKENS: usize = 384;
/// Longest answer span considered, in tokens.
const MAX_ANSWER_TOKENS: usize = 30;

pub struct OnnxQuestionAnswerer {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
}

impl OnnxQuestionAnswerer {
    pub fn load(model_dir: &Path) -> anyhow::Result<Self> {
        let model_path = onnx::require_file(model_dir, "model.onnx")?;
        let tokenizer = onnx::load_tokenizer(model_dir, MAX_TOKENS, true)?;
        let session = onnx::load_session(&model_path)?;

        info!(model = %model_path.display(), "loaded question-answering model");
        Ok(Self { session, tokenizer })
    }

    fn infer(&self, question: &str, context: &str) -> anyhow::Result<Answer> {
        let encoding = self
            .tokenizer
            .encode((question, context), true)
            .map_err(|e| anyhow::anyhow!("tokenize: {e}"))?;
        let (ids, mask) = onnx::encoding_tensors(&encoding)?;

        // Only context tokens may start or end an answer.
        let allowed: Vec<bool> = encoding
            .get_sequence_ids()
            .iter()
            .map(|s| *s == Some(1))
            .collect();

        let (start, end) = {
            let mut session = onnx::lock(&self.session)?;
            let outputs = session.run(ort::inputs![
                "input_ids" => ids,
                "attention_mask" => mask,
            ])?;
            let (_, start) = outputs["start_logits"].try_extract_tensor::<f32>()?;
            let (_, end) = outputs["end_logits"].try_extract_tensor::<f32>()?;
            (start.to_vec(), end.to_vec())
        };

        let (s, e, score) = best_span(&start, &end, &allowed, MAX_ANSWER_TOKENS)
            .ok_or_else(|| anyhow::anyhow!("no answer span found in context"))?;

        let offsets = encoding.get_offsets();
        let (from, to) = (offsets[s].0, offsets[e].1);
        let text = context
            .get(from..to)
            .ok_or_else(|| anyhow::anyhow!("answer offsets {from}..{to} outside context"))?
            .trim()
            .to_string();

        debug!(start = s, end = e, score, "extracted answer span");
        Ok(Answer {
            text,
            score: Some(score),
        })
    }
}

impl QuestionAnswerer for OnnxQuestionAnswerer {
    fn name(&self) -> &str {
        "onnx-qa"
    }

    fn answer(&self, question: &str, context: &str) -> colloquy_core::Result<Answer> {
        self.infer(question, context)
            .map_err(|e| NlpError::model(NAME, format!("{e:#}")))
    }
}
