//! Pipeline orchestrator — the crate's public surface.
//!
//! One entry point per feature. Each sequences backend → prompt → timed
//! call → parser → synthesizer and returns a schema-valid result tagged
//! with its provenance. Nothing in here can fail from the caller's point of
//! view: backend errors, timeouts and unparseable output are logged and
//! absorbed, and the deterministic synthesizer covers the rest.

use std::sync::Arc;
use std::time::Duration;

use crate::config::AppConfig;
use crate::pipeline::backend::{BackendError, TextGenerator};
use crate::pipeline::fallback::FallbackSynthesizer;
use crate::pipeline::parser::ResponseParser;
use crate::pipeline::prompt::PromptBuilder;
use crate::pipeline::schema::{
    ChatReply, ChatRequest, GenerationRequest, GrammarAnalysis, GrammarRequest, ParsedResult,
    PronunciationEvaluation, PronunciationRequest,
};
use crate::pipeline::selector::select_backend;

// ---------------------------------------------------------------------------
// ResponsePipeline
// ---------------------------------------------------------------------------

/// Immutable pipeline handle, constructed once at process start and shared
/// by reference across concurrent requests. The backend slot is set during
/// construction and never mutated afterward, so no locking is needed.
pub struct ResponsePipeline {
    backend: Option<Arc<dyn TextGenerator>>,
    prompt: PromptBuilder,
    call_timeout: Duration,
}

impl ResponsePipeline {
    /// Build a pipeline from application config: resolve the API key and
    /// try the backend candidates in priority order. A missing key or a
    /// fully failed selection leaves the pipeline on synthesizer-only
    /// operation — a valid state, not an error.
    pub fn from_config(config: &AppConfig) -> Self {
        let key = config.model.resolve_api_key();
        let backend = select_backend(
            key.as_deref(),
            &config.model.base_url,
            config.model.timeout_secs,
        )
        .map(|b| Arc::new(b) as Arc<dyn TextGenerator>);

        Self {
            backend,
            prompt: PromptBuilder::new(&config.tutor.native_language),
            call_timeout: Duration::from_secs(config.model.timeout_secs),
        }
    }

    /// Direct construction with an explicit backend — the dependency
    /// injection seam used by tests and alternative hosts.
    pub fn new(
        backend: Option<Arc<dyn TextGenerator>>,
        native_language: &str,
        call_timeout: Duration,
    ) -> Self {
        Self {
            backend,
            prompt: PromptBuilder::new(native_language),
            call_timeout,
        }
    }

    /// Whether a real model backend was selected at startup.
    pub fn has_backend(&self) -> bool {
        self.backend.is_some()
    }

    // -----------------------------------------------------------------------
    // Feature entry points
    // -----------------------------------------------------------------------

    /// Generate a conversational tutoring reply.
    pub async fn generate_chat_reply(&self, request: &ChatRequest) -> ChatReply {
        if let Some(raw) = self.call_backend(|| self.prompt.chat(&request.message, &request.history)).await {
            if let Some(reply) = ResponseParser::parse_chat(&raw) {
                return reply;
            }
            log::warn!("chat response unrecoverable; synthesizing locally");
        }
        FallbackSynthesizer::chat(request)
    }

    /// Analyze a learner sentence for grammar errors.
    pub async fn analyze_grammar(&self, request: &GrammarRequest) -> GrammarAnalysis {
        if let Some(raw) = self.call_backend(|| self.prompt.grammar(request)).await {
            if let Some(analysis) = ResponseParser::parse_grammar(&raw, &request.text) {
                return analysis;
            }
            log::warn!("grammar response unrecoverable; synthesizing locally");
        }
        FallbackSynthesizer::grammar(request)
    }

    /// Evaluate a spoken transcript against a target phrase.
    pub async fn evaluate_pronunciation(
        &self,
        request: &PronunciationRequest,
    ) -> PronunciationEvaluation {
        if let Some(raw) = self.call_backend(|| self.prompt.pronunciation(request)).await {
            if let Some(eval) = ResponseParser::parse_pronunciation(&raw) {
                return eval;
            }
            log::warn!("pronunciation response unrecoverable; synthesizing locally");
        }
        FallbackSynthesizer::pronunciation(request)
    }

    /// Dispatch a [`GenerationRequest`] to its feature entry point.
    pub async fn generate(&self, request: &GenerationRequest) -> ParsedResult {
        match request {
            GenerationRequest::Chat(req) => {
                ParsedResult::Chat(self.generate_chat_reply(req).await)
            }
            GenerationRequest::Grammar(req) => {
                ParsedResult::Grammar(self.analyze_grammar(req).await)
            }
            GenerationRequest::Pronunciation(req) => {
                ParsedResult::Pronunciation(self.evaluate_pronunciation(req).await)
            }
        }
    }

    // -----------------------------------------------------------------------
    // Backend call plumbing
    // -----------------------------------------------------------------------

    /// Build the prompt and call the backend with a hard timeout. Returns
    /// `None` when there is no backend or the call failed for any reason —
    /// the caller then degrades to the synthesizer. No retries: a second
    /// attempt would double user-facing latency for a request the local
    /// synthesizer can already answer.
    async fn call_backend(&self, build_prompt: impl FnOnce() -> String) -> Option<String> {
        let backend = self.backend.as_ref()?;
        let prompt = build_prompt();

        let result = match tokio::time::timeout(self.call_timeout, backend.generate(&prompt)).await
        {
            Ok(inner) => inner,
            Err(_elapsed) => Err(BackendError::Timeout),
        };

        match result {
            Ok(raw) => Some(raw),
            Err(err) => {
                log::warn!("backend call failed: {err}");
                None
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::schema::Provenance;
    use async_trait::async_trait;

    // -----------------------------------------------------------------------
    // Test doubles
    // -----------------------------------------------------------------------

    /// Always succeeds with a fixed raw response.
    struct AlwaysText(String);

    #[async_trait]
    impl TextGenerator for AlwaysText {
        async fn generate(&self, _prompt: &str) -> Result<String, BackendError> {
            Ok(self.0.clone())
        }
    }

    /// Always returns a request error.
    struct AlwaysFails;

    #[async_trait]
    impl TextGenerator for AlwaysFails {
        async fn generate(&self, _prompt: &str) -> Result<String, BackendError> {
            Err(BackendError::Request("connection refused".into()))
        }
    }

    /// Never completes within any reasonable timeout.
    struct NeverFinishes;

    #[async_trait]
    impl TextGenerator for NeverFinishes {
        async fn generate(&self, _prompt: &str) -> Result<String, BackendError> {
            tokio::time::sleep(Duration::from_secs(3600)).await;
            Ok(String::new())
        }
    }

    fn pipeline_with(backend: Option<Arc<dyn TextGenerator>>) -> ResponsePipeline {
        ResponsePipeline::new(backend, "am", Duration::from_secs(5))
    }

    fn chat_req(message: &str) -> ChatRequest {
        ChatRequest::new(message, vec![]).unwrap()
    }

    // -----------------------------------------------------------------------
    // No backend — synthesizer only
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn no_backend_uses_fallback_for_all_features() {
        let pipeline = pipeline_with(None);
        assert!(!pipeline.has_backend());

        let chat = pipeline.generate_chat_reply(&chat_req("hello")).await;
        assert_eq!(chat.provenance, Provenance::FallbackMock);
        assert!(chat.response_text.contains("Selam"));

        let grammar = pipeline
            .analyze_grammar(&GrammarRequest::new("she go to school").unwrap())
            .await;
        assert_eq!(grammar.provenance, Provenance::FallbackMock);

        let pron = pipeline
            .evaluate_pronunciation(&PronunciationRequest::new("this very rhythm", "zis").unwrap())
            .await;
        assert_eq!(pron.provenance, Provenance::FallbackMock);
        assert_eq!(pron.mispronounced_words.len(), 3);
    }

    // -----------------------------------------------------------------------
    // Clean backend output — real-model provenance
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn clean_backend_json_is_returned_verbatim() {
        let raw = r#"{"responseText":"Wonderful work!","translationNote":"ጥሩ ስራ",
                      "pronunciationNote":"","grammarNote":null}"#;
        let pipeline = pipeline_with(Some(Arc::new(AlwaysText(raw.into()))));

        let reply = pipeline.generate_chat_reply(&chat_req("hello")).await;
        assert_eq!(reply.provenance, Provenance::RealModel);
        assert_eq!(reply.response_text, "Wonderful work!");
        assert_eq!(reply.translation_note, "ጥሩ ስራ");
    }

    #[tokio::test]
    async fn fenced_backend_json_parses_like_bare_json() {
        let bare = r#"{"accuracyScore":0.82,"feedback":{"strengths":["clear vowels"],
                       "areasToImprove":["th sound"],"practiceExercises":["repeat daily"]},
                       "mispronouncedWords":[]}"#;
        let fenced = format!("```json\n{bare}\n```");

        let p1 = pipeline_with(Some(Arc::new(AlwaysText(bare.into()))));
        let p2 = pipeline_with(Some(Arc::new(AlwaysText(fenced))));
        let req = PronunciationRequest::new("the weather", "ze wezer").unwrap();

        let a = p1.evaluate_pronunciation(&req).await;
        let b = p2.evaluate_pronunciation(&req).await;
        assert_eq!(a, b);
        assert_eq!(a.provenance, Provenance::RealModel);
    }

    // -----------------------------------------------------------------------
    // Degradation paths
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn backend_error_degrades_to_fallback() {
        let pipeline = pipeline_with(Some(Arc::new(AlwaysFails)));
        let reply = pipeline.generate_chat_reply(&chat_req("banana")).await;
        assert_eq!(reply.provenance, Provenance::FallbackMock);
        assert!(reply.response_text.contains("\"banana\""));
    }

    #[tokio::test]
    async fn backend_timeout_degrades_to_fallback() {
        let pipeline = ResponsePipeline::new(
            Some(Arc::new(NeverFinishes)),
            "am",
            Duration::from_millis(20),
        );
        let grammar = pipeline
            .analyze_grammar(&GrammarRequest::new("he have a car").unwrap())
            .await;
        assert_eq!(grammar.provenance, Provenance::FallbackMock);
        // The known-sentence table still produced a real correction.
        assert_eq!(grammar.corrected_text, "He has a car.");
    }

    #[tokio::test]
    async fn prose_chat_output_is_recovered_not_synthesized() {
        let pipeline = pipeline_with(Some(Arc::new(AlwaysText(
            "Let's practice greetings today!".into(),
        ))));
        let reply = pipeline.generate_chat_reply(&chat_req("hello")).await;
        assert_eq!(reply.provenance, Provenance::RecoveredPartial);
        assert_eq!(reply.response_text, "Let's practice greetings today!");
    }

    #[tokio::test]
    async fn unparseable_grammar_output_is_synthesized() {
        let pipeline = pipeline_with(Some(Arc::new(AlwaysText(
            "Your sentence looks mostly fine to me.".into(),
        ))));
        let analysis = pipeline
            .analyze_grammar(&GrammarRequest::new("a longer learner sentence here").unwrap())
            .await;
        assert_eq!(analysis.provenance, Provenance::FallbackMock);
        assert!(analysis.is_perfect);
    }

    // -----------------------------------------------------------------------
    // Dispatch and determinism
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn generate_dispatches_and_never_panics() {
        let pipeline = pipeline_with(None);
        let requests = vec![
            GenerationRequest::Chat(chat_req("tell me a story")),
            GenerationRequest::Grammar(GrammarRequest::new("i am agree with you").unwrap()),
            GenerationRequest::Pronunciation(
                PronunciationRequest::new("water please", "wata plis").unwrap(),
            ),
        ];
        for request in &requests {
            let result = pipeline.generate(request).await;
            assert_ne!(result.provenance(), Provenance::RealModel);
        }
    }

    #[tokio::test]
    async fn invalid_credential_leaves_pipeline_on_synthesizer() {
        let mut config = AppConfig::default();
        config.model.api_key = Some("bad\nkey".into());
        let pipeline = ResponsePipeline::from_config(&config);
        assert!(!pipeline.has_backend());

        let reply = pipeline.generate_chat_reply(&chat_req("hello")).await;
        assert_ne!(reply.provenance, Provenance::RealModel);
    }

    #[tokio::test]
    async fn fallback_results_are_identical_across_calls() {
        let pipeline = pipeline_with(None);
        let req = chat_req("banana");
        let a = pipeline.generate_chat_reply(&req).await;
        let b = pipeline.generate_chat_reply(&req).await;
        assert_eq!(a, b);
    }
}
