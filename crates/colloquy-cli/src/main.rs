mod display;

use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::Context;
use clap::{Args, Parser, Subcommand};
use colloquy_ai::{
    Embedder, NlpService, OllamaConfig, OllamaSummarizer, OnnxQuestionAnswerer, OnnxSentiment,
    OnnxSummarizer,
};
use colloquy_core::{Outcome, ServiceConfig};
use serde::Serialize;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "colloquy", version, about = "Summaries, sentiment, Q&A and action items for meeting transcripts")]
struct Cli {
    /// JSON file overriding service defaults (chunk sizes, summary lengths).
    #[arg(long, global = true, env = "COLLOQUY_CONFIG")]
    config: Option<PathBuf>,

    /// Print results as JSON.
    #[arg(long, global = true)]
    json: bool,

    #[command(flatten)]
    models: ModelArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct ModelArgs {
    /// Directory with encoder_model.onnx, decoder_model.onnx and tokenizer.json.
    #[arg(long, global = true, env = "COLLOQUY_SUMMARIZER_DIR")]
    summarizer_dir: Option<PathBuf>,

    /// Summarize through an Ollama server instead of a local model.
    #[arg(long, global = true, env = "COLLOQUY_OLLAMA_URL")]
    ollama_url: Option<String>,

    #[arg(long, global = true, env = "COLLOQUY_OLLAMA_MODEL", default_value = "llama3.2")]
    ollama_model: String,

    #[arg(long, global = true, env = "COLLOQUY_SENTIMENT_DIR")]
    sentiment_dir: Option<PathBuf>,

    #[arg(long, global = true, env = "COLLOQUY_QA_DIR")]
    qa_dir: Option<PathBuf>,

    #[arg(long, global = true, env = "COLLOQUY_EMBEDDER_DIR")]
    embedder_dir: Option<PathBuf>,
}

#[derive(Args)]
struct Input {
    /// Read text from this file instead of stdin.
    #[arg(short, long)]
    file: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Command {
    /// Summarize text.
    Summarize {
        #[command(flatten)]
        input: Input,
        /// Target summary length.
        #[arg(long)]
        max_length: Option<usize>,
    },
    /// Classify sentiment.
    Sentiment {
        #[command(flatten)]
        input: Input,
    },
    /// Answer a question from the input text.
    Ask {
        question: String,
        #[command(flatten)]
        input: Input,
    },
    /// Extract action items.
    Actions {
        #[command(flatten)]
        input: Input,
    },
    /// Most frequent key topics.
    Topics {
        #[command(flatten)]
        input: Input,
    },
    /// Mentions and estimated speaking time per participant.
    Participation {
        #[command(flatten)]
        input: Input,
        /// Participant names, comma-separated or repeated.
        #[arg(short, long = "participant", value_delimiter = ',')]
        participants: Vec<String>,
    },
    /// Full meeting report: summary, action items, topics, sentiment, participation.
    Meeting {
        #[command(flatten)]
        input: Input,
        #[arg(short, long = "participant", value_delimiter = ',')]
        participants: Vec<String>,
    },
    /// Sentence embedding of the input text.
    Embed {
        #[command(flatten)]
        input: Input,
    },
}

/// Which models a command needs loaded.
#[derive(Default)]
struct Needs {
    summarizer: bool,
    sentiment: bool,
    qa: bool,
    embedder: bool,
}

impl Command {
    fn needs(&self) -> Needs {
        match self {
            Self::Summarize { .. } => Needs {
                summarizer: true,
                ..Default::default()
            },
            Self::Sentiment { .. } => Needs {
                sentiment: true,
                ..Default::default()
            },
            Self::Ask { .. } => Needs {
                qa: true,
                ..Default::default()
            },
            Self::Meeting { .. } => Needs {
                summarizer: true,
                sentiment: true,
                ..Default::default()
            },
            Self::Embed { .. } => Needs {
                embedder: true,
                ..Default::default()
            },
            Self::Actions { .. } | Self::Topics { .. } | Self::Participation { .. } => Needs::default(),
        }
    }
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    tracing::debug!("colloquy v{}", env!("CARGO_PKG_VERSION"));

    let config = match &cli.config {
        Some(path) => ServiceConfig::from_json_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ServiceConfig::default(),
    };

    let service = build_service(config, &cli.models, cli.command.needs())?;
    let json = cli.json;

    match cli.command {
        Command::Summarize { input, max_length } => {
            let text = read_input(input.file.as_deref())?;
            let max_length = max_length.unwrap_or(service.config().summary_max_length);
            let summary = report(service.summarize_text(&text, max_length));
            emit(json, &summary, |s| s.clone())?;
        }
        Command::Sentiment { input } => {
            let text = read_input(input.file.as_deref())?;
            let sentiment = report(service.analyze_sentiment(&text));
            emit(json, &sentiment, display::sentiment)?;
        }
        Command::Ask { question, input } => {
            let context = read_input(input.file.as_deref())?;
            let answer = report(service.answer_question(&question, &context));
            let confidence = service.answer_confidence(&answer);
            emit(
                json,
                &serde_json::json!({ "answer": answer, "confidence": confidence }),
                |_| format!("{answer}\n(length-based confidence {confidence:.2})"),
            )?;
        }
        Command::Actions { input } => {
            let text = read_input(input.file.as_deref())?;
            let items = service.extract_action_items(&text);
            emit(json, &items, |i| display::action_items(i))?;
        }
        Command::Topics { input } => {
            let text = read_input(input.file.as_deref())?;
            let topics = service.extract_key_topics(&text);
            emit(json, &topics, |t| display::topics(t))?;
        }
        Command::Participation {
            input,
            participants,
        } => {
            let text = read_input(input.file.as_deref())?;
            let participation = report(service.analyze_participation(&text, &participants));
            emit(json, &participation, display::participation)?;
        }
        Command::Meeting {
            input,
            participants,
        } => {
            let text = read_input(input.file.as_deref())?;
            let meeting = report(service.generate_meeting_summary(&text, &participants));
            emit(json, &meeting, display::meeting)?;
        }
        Command::Embed { input } => {
            let text = read_input(input.file.as_deref())?;
            let vector = report(service.embed_text(&text));
            emit(json, &vector, |v| display::embedding(v))?;
        }
    }

    service.shutdown();
    Ok(())
}

/// Load the models a command needs. Unconfigured ones stay unavailable,
/// so their operations fall back.
fn build_service(config: ServiceConfig, models: &ModelArgs, needs: Needs) -> anyhow::Result<NlpService> {
    let mut builder = NlpService::builder(config);

    if needs.summarizer {
        if let Some(url) = &models.ollama_url {
            builder = builder.summarizer(OllamaSummarizer::new(OllamaConfig {
                endpoint: url.clone(),
                model: models.ollama_model.clone(),
                timeout: Duration::from_secs(300),
            })?);
        } else if let Some(dir) = &models.summarizer_dir {
            builder = builder.summarizer(
                OnnxSummarizer::load(dir).with_context(|| format!("loading summarizer from {}", dir.display()))?,
            );
        } else {
            tracing::warn!("no summarizer configured; long texts will get a placeholder summary");
        }
    }

    if needs.sentiment {
        match &models.sentiment_dir {
            Some(dir) => {
                builder = builder.sentiment(
                    OnnxSentiment::load(dir)
                        .with_context(|| format!("loading sentiment model from {}", dir.display()))?,
                );
            }
            None => tracing::warn!("no sentiment model configured; reporting neutral"),
        }
    }

    if needs.qa {
        match &models.qa_dir {
            Some(dir) => {
                builder = builder.question_answerer(
                    OnnxQuestionAnswerer::load(dir)
                        .with_context(|| format!("loading QA model from {}", dir.display()))?,
                );
            }
            None => tracing::warn!("no question-answering model configured"),
        }
    }

    if needs.embedder {
        match &models.embedder_dir {
            Some(dir) => {
                builder = builder.embedder(
                    Embedder::load(dir)
                        .with_context(|| format!("loading embedder from {}", dir.display()))?,
                );
            }
            None => tracing::warn!("no embedding model configured"),
        }
    }

    Ok(builder.build()?)
}

fn read_input(file: Option<&Path>) -> anyhow::Result<String> {
    match file {
        Some(path) => {
            std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))
        }
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            Ok(buf)
        }
    }
}

/// Unwrap an outcome, warning when it is a fallback.
fn report<T>(outcome: Outcome<T>) -> T {
    let (value, reason) = outcome.into_parts();
    if let Some(reason) = reason {
        tracing::warn!(%reason, "returned fallback value");
    }
    value
}

fn emit<T: Serialize>(json: bool, value: &T, render: impl Fn(&T) -> String) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(value)?);
    } else {
        println!("{}", render(value));
    }
    Ok(())
}
