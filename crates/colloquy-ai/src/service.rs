//! The NLP service façade.
//!
//! Holds the model capabilities and compiled heuristics, built once at
//! startup and shared read-only afterwards. Every operation returns an
//! [`Outcome`]: when a model call fails, the documented default is returned
//! as a fallback and the failure is logged.

use colloquy_core::{
    ActionItem, ActionItemExtractor, Answer, MeetingSummary, NlpError, Outcome, Participation,
    QuestionAnswerer, Result, Sentiment, SentimentClassifier, ServiceConfig, Summarizer,
    TextEmbedder, Unavailable, analyze_participation, extract_key_topics, length_confidence,
    split_into_chunks, word_count,
};
use tracing::{debug, error, info};

/// Returned when summarization fails.
pub const SUMMARY_FALLBACK: &str = "Error generating summary";

/// Returned when question answering fails.
pub const ANSWER_FALLBACK: &str = "Unable to answer the question based on the provided context.";

pub struct NlpService {
    config: ServiceConfig,
    summarizer: Box<dyn Summarizer>,
    sentiment: Box<dyn SentimentClassifier>,
    qa: Box<dyn QuestionAnswerer>,
    embedder: Box<dyn TextEmbedder>,
    actions: ActionItemExtractor,
}

/// Assembles an [`NlpService`]. Capabilities left unset are
/// [`Unavailable`], so their operations always fall back.
pub struct NlpServiceBuilder {
    config: ServiceConfig,
    summarizer: Box<dyn Summarizer>,
    sentiment: Box<dyn SentimentClassifier>,
    qa: Box<dyn QuestionAnswerer>,
    embedder: Box<dyn TextEmbedder>,
}

impl NlpServiceBuilder {
    pub fn summarizer(mut self, summarizer: impl Summarizer + 'static) -> Self {
        self.summarizer = Box::new(summarizer);
        self
    }

    pub fn sentiment(mut self, classifier: impl SentimentClassifier + 'static) -> Self {
        self.sentiment = Box::new(classifier);
        self
    }

    pub fn question_answerer(mut self, qa: impl QuestionAnswerer + 'static) -> Self {
        self.qa = Box::new(qa);
        self
    }

    pub fn embedder(mut self, embedder: impl TextEmbedder + 'static) -> Self {
        self.embedder = Box::new(embedder);
        self
    }

    /// Validate the configuration and compile the action-item patterns.
    pub fn build(self) -> Result<NlpService> {
        self.config.validate()?;
        let actions = ActionItemExtractor::new()?;

        info!(
            summarizer = self.summarizer.name(),
            sentiment = self.sentiment.name(),
            qa = self.qa.name(),
            embedder = self.embedder.name(),
            "NLP service ready"
        );

        Ok(NlpService {
            config: self.config,
            summarizer: self.summarizer,
            sentiment: self.sentiment,
            qa: self.qa,
            embedder: self.embedder,
            actions,
        })
    }
}

impl NlpService {
    pub fn builder(config: ServiceConfig) -> NlpServiceBuilder {
        NlpServiceBuilder {
            config,
            summarizer: Box::new(Unavailable("summarizer")),
            sentiment: Box::new(Unavailable("sentiment")),
            qa: Box::new(Unavailable("question-answering")),
            embedder: Box::new(Unavailable("embedder")),
        }
    }

    pub fn config(&self) -> &ServiceConfig {
        &self.config
    }

    /// Release the model handles.
    pub fn shutdown(self) {
        info!(
            summarizer = self.summarizer.name(),
            sentiment = self.sentiment.name(),
            qa = self.qa.name(),
            embedder = self.embedder.name(),
            "shutting down NLP service"
        );
    }

    /// Summarize `text` to roughly `max_length` tokens.
    ///
    /// Texts under `min_words_to_summarize` words are returned as-is.
    pub fn summarize_text(&self, text: &str, max_length: usize) -> Outcome<String> {
        settle("summarize", self.try_summarize(text, max_length), || {
            SUMMARY_FALLBACK.to_string()
        })
    }

    fn try_summarize(&self, text: &str, max_length: usize) -> Result<String> {
        if word_count(text) < self.config.min_words_to_summarize {
            return Ok(text.to_string());
        }
        if max_length == 0 {
            return Err(NlpError::InvalidInput("max_length must be positive".into()));
        }
        let min_length = self.config.summary_min_length.min(max_length);

        let chunks = split_into_chunks(text, self.config.summary_chunk_chars);
        debug!(chunks = chunks.len(), max_length, "summarizing");

        let mut summaries = chunks
            .iter()
            .map(|chunk| self.summarizer.summarize(chunk, max_length, min_length))
            .collect::<Result<Vec<_>>>()?;

        if summaries.len() == 1 {
            return Ok(summaries.remove(0));
        }

        let combined = summaries.join(" ");
        if word_count(&combined) > max_length {
            debug!(words = word_count(&combined), "re-summarizing combined chunk summaries");
            return self.summarizer.summarize(&combined, max_length, min_length);
        }
        Ok(combined)
    }

    /// Classify the sentiment of `text`; neutral on failure.
    pub fn analyze_sentiment(&self, text: &str) -> Outcome<Sentiment> {
        settle("sentiment", self.try_sentiment(text), Sentiment::neutral)
    }

    fn try_sentiment(&self, text: &str) -> Result<Sentiment> {
        let chunks = split_into_chunks(text, self.config.sentiment_chunk_chars);
        if chunks.len() <= 1 {
            return self.sentiment.classify(text);
        }

        let results = chunks
            .iter()
            .map(|chunk| self.sentiment.classify(chunk))
            .collect::<Result<Vec<_>>>()?;
        debug!(chunks = results.len(), "aggregating chunk sentiment");
        Ok(aggregate_sentiment(&results))
    }

    /// Answer `question` from `context`.
    pub fn answer_question(&self, question: &str, context: &str) -> Outcome<String> {
        settle("question-answering", self.try_answer(question, context), || {
            ANSWER_FALLBACK.to_string()
        })
    }

    fn try_answer(&self, question: &str, context: &str) -> Result<String> {
        if question.trim().is_empty() {
            return Err(NlpError::InvalidInput("question is empty".into()));
        }

        let chunks = split_into_chunks(context, self.config.qa_chunk_chars);
        if chunks.len() <= 1 {
            return Ok(self.qa.answer(question, context)?.text);
        }

        let mut best: Option<Answer> = None;
        for chunk in &chunks {
            let answer = self.qa.answer(question, chunk)?;
            let better = match &best {
                None => true,
                Some(b) => {
                    answer.score.unwrap_or(f32::NEG_INFINITY) > b.score.unwrap_or(f32::NEG_INFINITY)
                }
            };
            if better {
                best = Some(answer);
            }
        }
        debug!(chunks = chunks.len(), "answered across context chunks");
        best.map(|a| a.text)
            .ok_or_else(|| NlpError::InvalidInput("context is empty".into()))
    }

    /// Length-based confidence for an answer.
    ///
    /// Known approximation: this reflects only how long the answer is.
    pub fn answer_confidence(&self, answer: &str) -> f32 {
        length_confidence(answer)
    }

    /// Sentence embedding of `text`; empty on failure.
    pub fn embed_text(&self, text: &str) -> Outcome<Vec<f32>> {
        settle("embed", self.embedder.embed(text), Vec::new)
    }

    pub fn extract_action_items(&self, text: &str) -> Vec<ActionItem> {
        self.actions.extract(text)
    }

    pub fn extract_key_topics(&self, text: &str) -> Vec<String> {
        extract_key_topics(text)
    }

    /// Mentions and estimated speaking time per participant; empty on failure.
    pub fn analyze_participation(
        &self,
        transcript: &str,
        participants: &[String],
    ) -> Outcome<Participation> {
        settle(
            "participation",
            analyze_participation(transcript, participants),
            Participation::new,
        )
    }

    /// Everything known about a meeting transcript in one record.
    ///
    /// Falls back when any component fell back; the returned value still
    /// carries every component that succeeded.
    pub fn generate_meeting_summary(
        &self,
        transcript: &str,
        participants: &[String],
    ) -> Outcome<MeetingSummary> {
        let (summary, summary_err) = self
            .summarize_text(transcript, self.config.meeting_summary_max_length)
            .into_parts();
        let action_items = self.extract_action_items(transcript);
        let (sentiment, sentiment_err) = self.analyze_sentiment(transcript).into_parts();
        let key_topics = self.extract_key_topics(transcript);
        let (participation_analysis, participation_err) = self
            .analyze_participation(transcript, participants)
            .into_parts();

        let words = word_count(transcript);
        let meeting = MeetingSummary {
            summary,
            action_items,
            key_topics,
            sentiment,
            participation_analysis,
            meeting_duration_estimate: words as f64 * colloquy_core::model::DURATION_PER_WORD,
            word_count: words,
        };

        match summary_err.or(sentiment_err).or(participation_err) {
            None => Outcome::Success(meeting),
            Some(reason) => Outcome::Fallback {
                value: meeting,
                reason,
            },
        }
    }
}

/// Convert to an [`Outcome`], logging the failure when falling back.
fn settle<T>(operation: &'static str, result: Result<T>, default: impl FnOnce() -> T) -> Outcome<T> {
    if let Err(e) = &result {
        error!(operation, error = %e, "operation failed, returning fallback");
    }
    Outcome::or_fallback(result, default)
}

/// Combine per-chunk sentiment: the label with the highest total score
/// wins, reported with the mean score of its chunks.
fn aggregate_sentiment(results: &[Sentiment]) -> Sentiment {
    // (label, total, count) in first-seen order.
    let mut totals: Vec<(&str, f32, usize)> = Vec::new();
    for r in results {
        match totals.iter_mut().find(|(label, _, _)| *label == r.label) {
            Some(entry) => {
                entry.1 += r.score;
                entry.2 += 1;
            }
            None => totals.push((&r.label, r.score, 1)),
        }
    }

    totals
        .into_iter()
        .fold(None::<(&str, f32, usize)>, |best, cur| match best {
            Some(b) if b.1 >= cur.1 => Some(b),
            _ => Some(cur),
        })
        .map(|(label, total, count)| Sentiment {
            label: label.to_string(),
            score: total / count as f32,
        })
        .unwrap_or_else(Sentiment::neutral)
}

#[cfg(test)]
mod tests {
    use super::*;
    use colloquy_core::{ActionType, Priority};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    /// Returns the first three words of its input and records each call.
    #[derive(Clone, Default)]
    struct PrefixSummarizer {
        calls: Arc<Mutex<Vec<(usize, usize)>>>,
    }

    impl Summarizer for PrefixSummarizer {
        fn name(&self) -> &str {
            "prefix"
        }

        fn summarize(&self, text: &str, max_length: usize, min_length: usize) -> Result<String> {
            self.calls.lock().unwrap().push((max_length, min_length));
            Ok(text.split_whitespace().take(3).collect::<Vec<_>>().join(" "))
        }
    }

    /// "positive" when the text mentions "great", otherwise "negative".
    struct KeywordSentiment;

    impl SentimentClassifier for KeywordSentiment {
        fn name(&self) -> &str {
            "keyword"
        }

        fn classify(&self, text: &str) -> Result<Sentiment> {
            Ok(if text.contains("great") {
                Sentiment {
                    label: "positive".into(),
                    score: 0.9,
                }
            } else {
                Sentiment {
                    label: "negative".into(),
                    score: 0.6,
                }
            })
        }
    }

    /// Answers with the first word of the context; scores contexts that
    /// mention "Lisbon" highest.
    struct FirstWordQa {
        calls: AtomicUsize,
    }

    impl QuestionAnswerer for FirstWordQa {
        fn name(&self) -> &str {
            "first-word"
        }

        fn answer(&self, _question: &str, context: &str) -> Result<Answer> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let score = if context.contains("Lisbon") { 0.9 } else { 0.1 };
            Ok(Answer {
                text: context.split_whitespace().next().unwrap_or_default().to_string(),
                score: Some(score),
            })
        }
    }

    struct LengthEmbedder;

    impl TextEmbedder for LengthEmbedder {
        fn name(&self) -> &str {
            "length"
        }

        fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(vec![text.len() as f32, 1.0])
        }
    }

    fn words(n: usize) -> String {
        (0..n)
            .map(|i| format!("word{i}"))
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn full_service(config: ServiceConfig, summarizer: PrefixSummarizer) -> NlpService {
        NlpService::builder(config)
            .summarizer(summarizer)
            .sentiment(KeywordSentiment)
            .question_answerer(FirstWordQa {
                calls: AtomicUsize::new(0),
            })
            .embedder(LengthEmbedder)
            .build()
            .unwrap()
    }

    fn bare_service() -> NlpService {
        NlpService::builder(ServiceConfig::default()).build().unwrap()
    }

    #[test]
    fn build_rejects_invalid_config() {
        let config = ServiceConfig {
            qa_chunk_chars: 0,
            ..Default::default()
        };
        assert!(matches!(
            NlpService::builder(config).build(),
            Err(NlpError::Config(_))
        ));
    }

    // ── Summarization ──

    #[test]
    fn short_text_returned_unchanged() {
        let service = bare_service();
        let out = service.summarize_text("Too short to bother.", 150);
        assert!(!out.is_fallback());
        assert_eq!(out.into_value(), "Too short to bother.");
    }

    #[test]
    fn single_chunk_summary() {
        let summarizer = PrefixSummarizer::default();
        let service = full_service(ServiceConfig::default(), summarizer.clone());

        let out = service.summarize_text(&words(60), 150);
        assert_eq!(out.into_value(), "word0 word1 word2");
        assert_eq!(*summarizer.calls.lock().unwrap(), vec![(150, 30)]);
    }

    #[test]
    fn multiple_chunks_are_joined() {
        let config = ServiceConfig {
            summary_chunk_chars: 100,
            ..Default::default()
        };
        let summarizer = PrefixSummarizer::default();
        let service = full_service(config, summarizer.clone());
        let text = words(60);
        let chunks = split_into_chunks(&text, 100);
        assert!(chunks.len() > 1);

        let summary = service.summarize_text(&text, 150).into_value();

        let expected: Vec<String> = chunks
            .iter()
            .map(|c| c.split_whitespace().take(3).collect::<Vec<_>>().join(" "))
            .collect();
        assert_eq!(summary, expected.join(" "));
        assert_eq!(summarizer.calls.lock().unwrap().len(), chunks.len());
    }

    #[test]
    fn long_combination_is_summarized_again() {
        let config = ServiceConfig {
            summary_chunk_chars: 100,
            ..Default::default()
        };
        let summarizer = PrefixSummarizer::default();
        let service = full_service(config, summarizer.clone());
        let text = words(60);
        let chunks = split_into_chunks(&text, 100).len();

        // Three words per chunk summary exceeds a ten-word budget.
        let summary = service.summarize_text(&text, 10).into_value();
        assert_eq!(summary, "word0 word1 word2");

        let calls = summarizer.calls.lock().unwrap();
        assert_eq!(calls.len(), chunks + 1);
        // min_length is clamped to max_length.
        assert!(calls.iter().all(|&(max, min)| max == 10 && min == 10));
    }

    #[test]
    fn summarizer_failure_falls_back() {
        let service = bare_service();
        let out = service.summarize_text(&words(80), 150);
        assert!(out.is_fallback());
        assert!(matches!(out.reason(), Some(NlpError::Unavailable("summarizer"))));
        assert_eq!(out.into_value(), SUMMARY_FALLBACK);
    }

    // ── Sentiment ──

    #[test]
    fn sentiment_from_classifier() {
        let service = full_service(ServiceConfig::default(), PrefixSummarizer::default());
        let out = service.analyze_sentiment("What a great sprint");
        assert!(!out.is_fallback());
        assert_eq!(out.value().label, "positive");
    }

    #[test]
    fn sentiment_failure_is_neutral() {
        let out = bare_service().analyze_sentiment("anything");
        assert!(out.is_fallback());
        assert_eq!(out.into_value(), Sentiment::neutral());
    }

    #[test]
    fn long_text_sentiment_aggregates_chunks() {
        let config = ServiceConfig {
            sentiment_chunk_chars: 20,
            ..Default::default()
        };
        let service = full_service(config, PrefixSummarizer::default());
        // Chunks: two "great" chunks (0.9 each) and one without (0.6).
        let text = "this was great work also great results then slow delays";
        let sentiment = service.analyze_sentiment(text).into_value();
        assert_eq!(sentiment.label, "positive");
        assert!((sentiment.score - 0.9).abs() < 1e-6);
    }

    #[test]
    fn aggregate_prefers_highest_total() {
        let results = vec![
            Sentiment { label: "negative".into(), score: 0.6 },
            Sentiment { label: "negative".into(), score: 0.6 },
            Sentiment { label: "positive".into(), score: 0.99 },
        ];
        let s = aggregate_sentiment(&results);
        assert_eq!(s.label, "negative");
        assert!((s.score - 0.6).abs() < 1e-6);
    }

    // ── Question answering ──

    #[test]
    fn answers_from_context() {
        let service = full_service(ServiceConfig::default(), PrefixSummarizer::default());
        let out = service.answer_question("Where?", "Lisbon hosts the offsite");
        assert_eq!(out.into_value(), "Lisbon");
    }

    #[test]
    fn long_context_picks_best_chunk() {
        let config = ServiceConfig {
            qa_chunk_chars: 30,
            ..Default::default()
        };
        let service = full_service(config, PrefixSummarizer::default());
        let context = "Budget talks dragged on for hours. Offsite moves to Lisbon next spring.";
        let out = service.answer_question("Where is the offsite?", context);
        assert!(!out.is_fallback());
        // The winning chunk is the one mentioning Lisbon.
        let chunks = split_into_chunks(context, 30);
        let winner = chunks.iter().find(|c| c.contains("Lisbon")).unwrap();
        assert_eq!(out.into_value(), winner.split_whitespace().next().unwrap());
    }

    #[test]
    fn empty_question_falls_back() {
        let service = full_service(ServiceConfig::default(), PrefixSummarizer::default());
        let out = service.answer_question("   ", "context");
        assert!(matches!(out.reason(), Some(NlpError::InvalidInput(_))));
        assert_eq!(out.into_value(), ANSWER_FALLBACK);
    }

    #[test]
    fn qa_unavailable_falls_back() {
        let out = bare_service().answer_question("Who?", "Nobody");
        assert!(out.is_fallback());
        assert_eq!(out.into_value(), ANSWER_FALLBACK);
    }

    #[test]
    fn answer_confidence_is_length_based() {
        let service = bare_service();
        assert_eq!(service.answer_confidence("short"), 0.55);
        assert_eq!(service.answer_confidence(ANSWER_FALLBACK), 0.85);
    }

    // ── Embeddings ──

    #[test]
    fn embed_success_and_fallback() {
        let service = full_service(ServiceConfig::default(), PrefixSummarizer::default());
        assert_eq!(service.embed_text("abc").into_value(), vec![3.0, 1.0]);

        let out = bare_service().embed_text("abc");
        assert!(out.is_fallback());
        assert!(out.into_value().is_empty());
    }

    // ── Meeting summary ──

    #[test]
    fn participation_example() {
        let transcript = "Alice kicked off. Later Alice wrapped up.";
        let participants = vec!["Alice".to_string(), "Bob".to_string()];
        let p = bare_service()
            .analyze_participation(transcript, &participants)
            .into_value();

        assert_eq!(p["Alice"].mentions, 2);
        assert_eq!(p["Alice"].estimated_speaking_time, 10);
        assert_eq!(p["Bob"].mentions, 0);
        assert_eq!(p["Bob"].estimated_speaking_time, 0);
    }

    #[test]
    fn meeting_summary_combines_components() {
        let service = full_service(ServiceConfig::default(), PrefixSummarizer::default());
        let transcript = "Dana said the launch looks great.\nACTION ITEM: Dana will draft the launch plan\n";
        let participants = vec!["Dana".to_string()];

        let out = service.generate_meeting_summary(transcript, &participants);
        assert!(!out.is_fallback());
        let meeting = out.into_value();

        // Under fifty words, so the transcript is its own summary.
        assert_eq!(meeting.summary, transcript);
        assert_eq!(meeting.sentiment.label, "positive");
        assert_eq!(meeting.word_count, 14);
        assert_eq!(meeting.meeting_duration_estimate, 7.0);
        assert_eq!(meeting.participation_analysis["Dana"].mentions, 2);
        assert!(meeting.key_topics.contains(&"launch".to_string()));
        assert!(
            meeting
                .action_items
                .iter()
                .any(|i| i.text == "Dana will draft the launch plan"
                    && i.kind == ActionType::General
                    && i.priority == Priority::Medium)
        );
    }

    #[test]
    fn meeting_summary_falls_back_but_keeps_components() {
        let transcript = "TODO: send the retro notes to everyone\nCarlos agreed.";
        let participants = vec!["Carlos".to_string()];

        let out = bare_service().generate_meeting_summary(transcript, &participants);
        assert!(out.is_fallback());
        assert!(matches!(out.reason(), Some(NlpError::Unavailable("sentiment"))));

        let meeting = out.into_value();
        assert_eq!(meeting.sentiment, Sentiment::neutral());
        assert_eq!(meeting.action_items.len(), 1);
        assert_eq!(meeting.participation_analysis["Carlos"].mentions, 1);
    }

    #[test]
    fn meeting_summary_serializes_like_a_record() {
        let service = full_service(ServiceConfig::default(), PrefixSummarizer::default());
        let meeting = service
            .generate_meeting_summary("great", &["Eve".to_string()])
            .into_value();
        let json = serde_json::to_value(&meeting).unwrap();
        for key in [
            "summary",
            "action_items",
            "key_topics",
            "sentiment",
            "participation_analysis",
            "meeting_duration_estimate",
            "word_count",
        ] {
            assert!(json.get(key).is_some(), "missing {key}");
        }
        assert_eq!(json["participation_analysis"]["Eve"]["mentions"], 0);
    }

    #[test]
    fn action_items_and_topics_delegate() {
        let service = bare_service();
        let items = service.extract_action_items("ACTION ITEM: ship the report by Friday\nTODO: review budget");
        assert_eq!(items.len(), 2);
        assert!(service.extract_key_topics("budget budget review").starts_with(&["budget".to_string()]));
    }
}
