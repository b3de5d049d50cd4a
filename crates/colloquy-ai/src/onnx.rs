//! Shared loading helpers for ONNX Runtime adapters.

use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard};

use ort::session::Session;
use ort::value::Tensor;
use tokenizers::{Encoding, Tokenizer, TruncationParams, TruncationStrategy};

/// Path to `name` inside `model_dir`, failing if it is missing.
pub fn require_file(model_dir: &Path, name: &str) -> anyhow::Result<PathBuf> {
    let path = model_dir.join(name);
    anyhow::ensure!(path.exists(), "{name} not found in {model_dir:?}");
    Ok(path)
}

pub fn load_session(path: &Path) -> anyhow::Result<Mutex<Session>> {
    let session = Session::builder()?.commit_from_file(path)?;
    Ok(Mutex::new(session))
}

/// Load `tokenizer.json` truncating to `max_length` tokens.
///
/// Pair inputs (question + context) truncate only the second sequence.
pub fn load_tokenizer(model_dir: &Path, max_length: usize, pair: bool) -> anyhow::Result<Tokenizer> {
    let path = require_file(model_dir, "tokenizer.json")?;
    let mut tokenizer =
        Tokenizer::from_file(&path).map_err(|e| anyhow::anyhow!("load tokenizer: {e}"))?;

    let strategy = if pair {
        TruncationStrategy::OnlySecond
    } else {
        TruncationStrategy::LongestFirst
    };
    tokenizer
        .with_truncation(Some(TruncationParams {
            max_length,
            strategy,
            ..Default::default()
        }))
        .map_err(|e| anyhow::anyhow!("set truncation: {e}"))?;

    Ok(tokenizer)
}

/// Parsed `config.json`, or `Null` when the directory has none.
pub fn read_model_config(model_dir: &Path) -> anyhow::Result<serde_json::Value> {
    let path = model_dir.join("config.json");
    if !path.exists() {
        return Ok(serde_json::Value::Null);
    }
    let raw = std::fs::read_to_string(&path)?;
    Ok(serde_json::from_str(&raw)?)
}

pub fn lock(session: &Mutex<Session>) -> anyhow::Result<MutexGuard<'_, Session>> {
    session
        .lock()
        .map_err(|_| anyhow::anyhow!("session lock poisoned"))
}

/// `input_ids` and `attention_mask` tensors of shape `[1, seq_len]`.
pub fn encoding_tensors(encoding: &Encoding) -> anyhow::Result<(Tensor<i64>, Tensor<i64>)> {
    let ids: Vec<i64> = encoding.get_ids().iter().map(|&id| id as i64).collect();
    let mask: Vec<i64> = encoding
        .get_attention_mask()
        .iter()
        .map(|&m| m as i64)
        .collect();
    let shape = [1i64, ids.len() as i64];

    let ids_tensor = Tensor::from_array((shape, ids.into_boxed_slice()))?;
    let mask_tensor = Tensor::from_array((shape, mask.into_boxed_slice()))?;
    Ok((ids_tensor, mask_tensor))
}
