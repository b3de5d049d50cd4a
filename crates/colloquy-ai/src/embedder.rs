//! ONNX Runtime embedding pipeline for sentence-transformers models.
//!
//! Implements mean-pooled embeddings using all-MiniLM-L6-v2 (384 dimensions).
//! The model directory must contain `model.onnx` and `tokenizer.json`.

use std::path::Path;
use std::sync::Mutex;

use colloquy_core::{NlpError, TextEmbedder};
use ort::session::Session;
use ort::value::Tensor;
use tokenizers::{Encoding, PaddingParams, Tokenizer};
use tracing::info;

use crate::onnx;

const NAME: &str = "embedder";

/// Sentence embedding generator using ONNX Runtime.
///
/// Produces normalized vectors suitable for cosine similarity.
pub struct Embedder {
    session: Mutex<Session>,
    tokenizer: Tokenizer,
    dim: usize,
}

impl Embedder {
    /// Load an embedding model from a directory containing `model.onnx` and `tokenizer.json`.
    pub fn load(model_dir: &Path) -> anyhow::Result<Self> {
        let model_path = onnx::require_file(model_dir, "model.onnx")?;
        let session = onnx::load_session(&model_path)?;

        // Infer embedding dimension from model output shape.
        let dim = {
            let guard = onnx::lock(&session)?;
            infer_dim(guard.outputs()[0].dtype()).unwrap_or(384)
        };

        // MiniLM accepts at most 256 tokens.
        let mut tokenizer = onnx::load_tokenizer(model_dir, 256, false)?;
        tokenizer.with_padding(Some(PaddingParams {
            ..Default::default()
        }));

        info!(dim, model = %model_path.display(), "loaded embedding model");
        Ok(Self {
            session,
            tokenizer,
            dim,
        })
    }

    /// Embedding dimensionality (384 for all-MiniLM-L6-v2).
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// Embed a batch of texts, returning one normalized vector per input.
    pub fn embed_batch(&self, texts: &[&str]) -> anyhow::Result<Vec<Vec<f32>>> {
        if texts.is_empty() {
            return Ok(vec![]);
        }

        let encodings = self
            .tokenizer
            .encode_batch(texts.to_vec(), true)
            .map_err(|e| anyhow::anyhow!("tokenize: {e}"))?;
        // Padding makes every encoding the same length.
        let seq_len = encodings.first().map_or(0, |e| e.len());
        let rows = encodings.len();

        let ids = padded(&encodings, seq_len, |e| e.get_ids());
        let mask = padded(&encodings, seq_len, |e| e.get_attention_mask());
        let type_ids = padded(&encodings, seq_len, |e| e.get_type_ids());

        let shape = [rows as i64, seq_len as i64];
        let mut session = onnx::lock(&self.session)?;
        let outputs = session.run(ort::inputs![
            "input_ids" => Tensor::from_array((shape, ids.into_boxed_slice()))?,
            "attention_mask" => Tensor::from_array((shape, mask.clone().into_boxed_slice()))?,
            "token_type_ids" => Tensor::from_array((shape, type_ids.into_boxed_slice()))?,
        ])?;

        let (out_shape, hidden) = outputs[0].try_extract_tensor::<f32>()?;
        let dims: &[i64] = out_shape;
        let expected = [rows as i64, seq_len as i64, self.dim as i64];
        anyhow::ensure!(
            dims == &expected[..],
            "hidden state shape {dims:?}, wanted {expected:?}"
        );

        let row_width = seq_len * self.dim;
        Ok((0..rows)
            .map(|r| {
                let mut v = mean_pool(
                    &hidden[r * row_width..(r + 1) * row_width],
                    &mask[r * seq_len..(r + 1) * seq_len],
                    self.dim,
                );
                normalize(&mut v);
                v
            })
            .collect())
    }
}

/// Row-major `[rows, seq_len]` matrix of one per-token field.
fn padded(encodings: &[Encoding], seq_len: usize, field: impl Fn(&Encoding) -> &[u32]) -> Vec<i64> {
    let mut out = vec![0i64; encodings.len() * seq_len];
    for (row, encoding) in out.chunks_mut(seq_len.max(1)).zip(encodings) {
        for (slot, &v) in row.iter_mut().zip(field(encoding)) {
            *slot = v as i64;
        }
    }
    out
}

/// Average the hidden states of unmasked tokens.
///
/// `hidden` is one sequence, `[seq_len, dim]` row-major.
fn mean_pool(hidden: &[f32], mask: &[i64], dim: usize) -> Vec<f32> {
    let mut sum = vec![0.0f32; dim];
    let mut kept = 0usize;
    for (token, _) in hidden.chunks(dim).zip(mask).filter(|(_, m)| **m != 0) {
        sum.iter_mut().zip(token).for_each(|(s, x)| *s += x);
        kept += 1;
    }
    if kept > 0 {
        sum.iter_mut().for_each(|s| *s /= kept as f32);
    }
    sum
}

impl TextEmbedder for Embedder {
    fn name(&self) -> &str {
        "all-MiniLM-L6-v2"
    }

    fn embed(&self, text: &str) -> colloquy_core::Result<Vec<f32>> {
        self.embed_batch(&[text])
            .map_err(|e| NlpError::model(NAME, format!("{e:#}")))?
            .into_iter()
            .next()
            .ok_or_else(|| NlpError::model(NAME, "no embedding returned"))
    }
}

/// L2-normalize a vector in place.
fn normalize(v: &mut [f32]) {
    let norm: f32 = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > 0.0 {
        for x in v.iter_mut() {
            *x /= norm;
        }
    }
}

/// Try to infer the embedding dimension from the ONNX model output type.
fn infer_dim(output_type: &ort::value::ValueType) -> Option<usize> {
    match output_type {
        ort::value::ValueType::Tensor { shape, .. } => shape
            .last()
            .and_then(|&d| if d > 0 { Some(d as usize) } else { None }),
        _ => None,
    }
}
