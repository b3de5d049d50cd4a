//! Pure numeric helpers for turning model logits into answers.

use serde_json::Value;

/// Numerically stable softmax.
pub fn softmax(logits: &[f32]) -> Vec<f32> {
    let max = logits.iter().copied().fold(f32::NEG_INFINITY, f32::max);
    let exps: Vec<f32> = logits.iter().map(|&x| (x - max).exp()).collect();
    let sum: f32 = exps.iter().sum();
    if sum > 0.0 {
        exps.into_iter().map(|e| e / sum).collect()
    } else {
        exps
    }
}

/// Index and value of the largest element. First wins on ties.
pub fn argmax(values: &[f32]) -> Option<(usize, f32)> {
    values.iter().copied().enumerate().fold(None, |best, (i, v)| match best {
        Some((_, b)) if b >= v => best,
        _ => Some((i, v)),
    })
}

/// Best answer span `(start, end, score)` for extractive QA.
///
/// Only positions with `allowed[i]` may start or end a span, `end >= start`,
/// and spans cover at most `max_tokens` tokens. The score is the product of
/// the start and end probabilities.
pub fn best_span(
    start_logits: &[f32],
    end_logits: &[f32],
    allowed: &[bool],
    max_tokens: usize,
) -> Option<(usize, usize, f32)> {
    let start_probs = softmax(start_logits);
    let end_probs = softmax(end_logits);
    let n = start_probs.len().min(end_probs.len()).min(allowed.len());

    let mut best: Option<(usize, usize, f32)> = None;
    for s in (0..n).filter(|&s| allowed[s]) {
        let last = (s + max_tokens).min(n);
        for e in (s..last).filter(|&e| allowed[e]) {
            let score = start_probs[s] * end_probs[e];
            if best.is_none_or(|(_, _, b)| score > b) {
                best = Some((s, e, score));
            }
        }
    }
    best
}

/// Class labels from a Hugging Face `config.json` `id2label` map.
///
/// Missing or malformed entries become `LABEL_<i>`.
pub fn labels_from_config(config: &Value, num_labels: usize) -> Vec<String> {
    let id2label = config.get("id2label").and_then(Value::as_object);
    (0..num_labels)
        .map(|i| {
            id2label
                .and_then(|m| m.get(&i.to_string()))
                .and_then(Value::as_str)
                .map(str::to_string)
                .unwrap_or_else(|| format!("LABEL_{i}"))
        })
        .collect()
}

/// Number of classes declared by a `config.json`, if any.
pub fn num_labels_from_config(config: &Value) -> Option<usize> {
    config
        .get("id2label")
        .and_then(Value::as_object)
        .map(|m| m.len())
        .filter(|&n| n > 0)
}

/// Read an integer token id from `config.json`, with a default.
pub fn token_id(config: &Value, key: &str, default: u32) -> u32 {
    config
        .get(key)
        .and_then(Value::as_u64)
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(default)
}
