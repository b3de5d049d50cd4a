//! Abstractive summarization with an encoder-decoder model on ONNX Runtime.
//!
//! Expects an Optimum-style export of a BART model (e.g. bart-large-cnn):
//! `encoder_model.onnx`, `decoder_model.onnx`, `tokenizer.json`, and
//! optionally `config.json` for special token ids. Decoding is greedy and
//! recomputes the full decoder pass per step (no KV cache).

use std::path::Path;
use std::sync::Mutex;

use colloquy_core::{NlpError, Summarizer};
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::Tokenizer;
use tracing::{debug, info};

use crate::onnx;
use crate::scoring::{argmax, token_id};

const NAME: &str = "summarizer";
const MAX_INPUT_TOKENS: usize = 1024;

/// Special token ids steering generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GenerationTokens {
    pub decoder_start: u32,
    /// Forced as the first generated token, as BART expects.
    pub forced_bos: Option<u32>,
    pub eos: u32,
}

impl GenerationTokens {
    /// Read from `config.json`, defaulting to BART's ids.
    fn from_config(config: &serde_json::Value) -> Self {
        let forced_bos = config
            .get("forced_bos_token_id")
            .and_then(serde_json::Value::as_u64)
            .and_then(|v| u32::try_from(v).ok())
            .or(if config.is_null() { Some(0) } else { None });
        Self {
            decoder_start: token_id(config, "decoder_start_token_id", 2),
            forced_bos,
            eos: token_id(config, "eos_token_id", 2),
        }
    }

    fn prefix(&self) -> Vec<u32> {
        let mut prefix = vec![self.decoder_start];
        prefix.extend(self.forced_bos);
        prefix
    }
}

pub struct OnnxSummarizer {
    encoder: Mutex<Session>,
    decoder: Mutex<Session>,
    tokenizer: Tokenizer,
    tokens: GenerationTokens,
}

impl OnnxSummarizer {
    pub fn load(model_dir: &Path) -> anyhow::Result<Self> {
        let encoder_path = onnx::require_file(model_dir, "encoder_model.onnx")?;
        let decoder_path = onnx::require_file(model_dir, "decoder_model.onnx")?;
        let tokenizer = onnx::load_tokenizer(model_dir, MAX_INPUT_TOKENS, false)?;
        let tokens = GenerationTokens::from_config(&onnx::read_model_config(model_dir)?);

        let encoder = onnx::load_session(&encoder_path)?;
        let decoder = onnx::load_session(&decoder_path)?;

        info!(
            encoder = %encoder_path.display(),
            decoder = %decoder_path.display(),
            ?tokens,
            "loaded summarization model"
        );
        Ok(Self {
            encoder,
            decoder,
            tokenizer,
            tokens,
        })
    }

    fn generate(&self, text: &str, max_length: usize, min_length: usize) -> anyhow::Result<String> {
        let encoding = self
            .tokenizer
            .encode(text, true)
            .map_err(|e| anyhow::anyhow!("tokenize: {e}"))?;
        let mask: Vec<i64> = encoding
            .get_attention_mask()
            .iter()
            .map(|&m| m as i64)
            .collect();
        let (ids_tensor, mask_tensor) = onnx::encoding_tensors(&encoding)?;

        // Encoder hidden states: [1, src_len, hidden].
        let (hidden_shape, hidden) = {
            let mut encoder = onnx::lock(&self.encoder)?;
            let outputs = encoder.run(ort::inputs![
                "input_ids" => ids_tensor,
                "attention_mask" => mask_tensor,
            ])?;
            let (shape, data) = outputs["last_hidden_state"].try_extract_tensor::<f32>()?;
            let dims: &[i64] = shape;
            anyhow::ensure!(dims.len() == 3, "unexpected encoder output shape: {dims:?}");
            ([dims[0], dims[1], dims[2]], data.to_vec())
        };

        let prefix = self.tokens.prefix();
        let mut tokens: Vec<u32> = prefix.clone();
        let mut decoder = onnx::lock(&self.decoder)?;

        while tokens.len() - prefix.len() < max_length {
            let step_ids: Vec<i64> = tokens.iter().map(|&t| t as i64).collect();
            let ids = Tensor::from_array(([1i64, step_ids.len() as i64], step_ids.into_boxed_slice()))?;
            let enc_mask = Tensor::from_array(([1i64, mask.len() as i64], mask.clone().into_boxed_slice()))?;
            let states = Tensor::from_array((hidden_shape, hidden.clone().into_boxed_slice()))?;

            let outputs = decoder.run(ort::inputs![
                "input_ids" => ids,
                "encoder_attention_mask" => enc_mask,
                "encoder_hidden_states" => states,
            ])?;

            // Logits: [1, tgt_len, vocab]; only the last position matters.
            let (shape, logits) = outputs["logits"].try_extract_tensor::<f32>()?;
            let dims: &[i64] = shape;
            anyhow::ensure!(dims.len() == 3, "unexpected decoder output shape: {dims:?}");
            let vocab = dims[2] as usize;
            let mut last = logits[logits.len() - vocab..].to_vec();

            let generated = tokens.len() - prefix.len();
            let next = next_token(&mut last, generated, min_length, self.tokens.eos)
                .ok_or_else(|| anyhow::anyhow!("decoder returned empty logits"))?;
            tokens.push(next);
            if next == self.tokens.eos {
                break;
            }
        }

        debug!(
            input_tokens = encoding.len(),
            output_tokens = tokens.len() - prefix.len(),
            "generated summary"
        );
        self.tokenizer
            .decode(&tokens[prefix.len()..], true)
            .map(|s| s.trim().to_string())
            .map_err(|e| anyhow::anyhow!("detokenize: {e}"))
    }
}

/// Greedy choice of the next token; end-of-sequence is suppressed until
/// `min_length` tokens have been generated.
fn next_token(logits: &mut [f32], generated: usize, min_length: usize, eos: u32) -> Option<u32> {
    if generated < min_length
        && let Some(l) = logits.get_mut(eos as usize)
    {
        *l = f32::NEG_INFINITY;
    }
    argmax(logits).map(|(i, _)| i as u32)
}

impl Summarizer for OnnxSummarizer {
    fn name(&self) -> &str {
        "onnx-bart"
    }

    fn summarize(&self, text: &str, max_length: usize, min_length: usize) -> colloquy_core::Result<String> {
        self.generate(text, max_length, min_length)
            .map_err(|e| NlpError::model(NAME, format!("{e:#}")))
    }
}
