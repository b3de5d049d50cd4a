//! NLP service: the façade over model capabilities, plus the adapters that
//! provide them (ONNX Runtime for local models, HTTP for a model server).

#[cfg_attr(not(feature = "onnx"), allow(dead_code))]
mod scoring;
mod service;

pub use service::{NlpService, NlpServiceBuilder};

#[cfg(feature = "onnx")]
mod onnx;

#[cfg(feature = "onnx")]
mod embedder;
#[cfg(feature = "onnx")]
pub use embedder::Embedder;

#[cfg(feature = "onnx")]
mod sentiment;
#[cfg(feature = "onnx")]
pub use sentiment::OnnxSentiment;

#[cfg(feature = "onnx")]
mod qa;
#[cfg(feature = "onnx")]
pub use qa::OnnxQuestionAnswerer;

#[cfg(feature = "onnx")]
mod summarizer;
#[cfg(feature = "onnx")]
pub use summarizer::OnnxSummarizer;

#[cfg(feature = "http")]
mod ollama;
#[cfg(feature = "http")]
pub use ollama::{OllamaConfig, OllamaSummarizer};
