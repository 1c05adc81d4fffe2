//! Request and response schemas for the three tutoring features.
//!
//! Every response type doubles as the wire schema the model is asked to
//! emit: required fields fail strict deserialization when missing, optional
//! fields carry `#[serde(default)]` functions that encode the documented
//! default in exactly one place. `provenance` is `skip_deserializing` so an
//! upstream payload can never forge its own origin tag.

use serde::{Deserialize, Serialize};
use thiserror::Error;

// ---------------------------------------------------------------------------
// Provenance
// ---------------------------------------------------------------------------

/// Where a result came from. Downstream layers may log or display this but
/// must not branch on it for correctness.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Provenance {
    /// Parsed cleanly from the generative model's output.
    RealModel,
    /// Salvaged from malformed model output; missing fields were defaulted.
    RecoveredPartial,
    /// Produced entirely by the deterministic synthesizer.
    FallbackMock,
}

impl Default for Provenance {
    fn default() -> Self {
        Self::FallbackMock
    }
}

// ---------------------------------------------------------------------------
// RequestError
// ---------------------------------------------------------------------------

/// The only error class that ever reaches a caller, and it is raised by the
/// request constructors before the pipeline is entered.
#[derive(Debug, Error)]
pub enum RequestError {
    /// A required text field was empty or whitespace-only.
    #[error("required field `{0}` is empty")]
    EmptyField(&'static str),
}

// ---------------------------------------------------------------------------
// Requests
// ---------------------------------------------------------------------------

/// One prior turn of a tutoring conversation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    /// `"user"` or `"tutor"`.
    pub role: String,
    pub text: String,
}

/// Request for a conversational tutoring reply.
#[derive(Debug, Clone)]
pub struct ChatRequest {
    pub message: String,
    /// Prior turns, oldest first, most recent last.
    pub history: Vec<ChatTurn>,
}

impl ChatRequest {
    pub fn new(message: impl Into<String>, history: Vec<ChatTurn>) -> Result<Self, RequestError> {
        let message = message.into();
        if message.trim().is_empty() {
            return Err(RequestError::EmptyField("message"));
        }
        Ok(Self { message, history })
    }
}

/// Request for grammar analysis of a learner sentence.
#[derive(Debug, Clone)]
pub struct GrammarRequest {
    pub text: String,
}

impl GrammarRequest {
    pub fn new(text: impl Into<String>) -> Result<Self, RequestError> {
        let text = text.into();
        if text.trim().is_empty() {
            return Err(RequestError::EmptyField("text"));
        }
        Ok(Self { text })
    }
}

/// Request for a pronunciation evaluation of a spoken transcript against a
/// target phrase. Both sides are text; no audio reaches this pipeline.
#[derive(Debug, Clone)]
pub struct PronunciationRequest {
    pub target_text: String,
    pub spoken_text: String,
}

impl PronunciationRequest {
    pub fn new(
        target_text: impl Into<String>,
        spoken_text: impl Into<String>,
    ) -> Result<Self, RequestError> {
        let target_text = target_text.into();
        let spoken_text = spoken_text.into();
        if target_text.trim().is_empty() {
            return Err(RequestError::EmptyField("target_text"));
        }
        if spoken_text.trim().is_empty() {
            return Err(RequestError::EmptyField("spoken_text"));
        }
        Ok(Self {
            target_text,
            spoken_text,
        })
    }
}

/// Tagged union over the three feature requests.
#[derive(Debug, Clone)]
pub enum GenerationRequest {
    Chat(ChatRequest),
    Grammar(GrammarRequest),
    Pronunciation(PronunciationRequest),
}

// ---------------------------------------------------------------------------
// Chat reply
// ---------------------------------------------------------------------------

/// Structured reply to a chat message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatReply {
    /// The tutor's conversational answer. Required on the wire.
    pub response_text: String,
    /// Amharic translation or note for the key phrase, `""` when absent.
    #[serde(default)]
    pub translation_note: String,
    /// Pronunciation hint for a word used in the reply, `""` when absent.
    #[serde(default)]
    pub pronunciation_note: String,
    /// Optional remark about the learner's grammar in their message.
    #[serde(default)]
    pub grammar_note: Option<String>,
    #[serde(skip_deserializing, default)]
    pub provenance: Provenance,
}

impl ChatReply {
    /// A reply carrying only free text, every other field at its default.
    pub fn from_text(response_text: impl Into<String>, provenance: Provenance) -> Self {
        Self {
            response_text: response_text.into(),
            translation_note: String::new(),
            pronunciation_note: String::new(),
            grammar_note: None,
            provenance,
        }
    }
}

// ---------------------------------------------------------------------------
// Grammar analysis
// ---------------------------------------------------------------------------

/// Severity of a single grammar error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    High,
    Medium,
    Low,
}

/// One detected grammar error with a bilingual explanation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrammarError {
    /// The erroneous span as written by the learner.
    pub original: String,
    /// The corrected form of that span.
    pub correction: String,
    pub severity: Severity,
    /// Explanation in English.
    pub explanation_primary: String,
    /// Explanation in the learner's native language (Amharic).
    #[serde(default)]
    pub explanation_secondary: String,
    /// Example sentences using the corrected form.
    #[serde(default)]
    pub examples: Vec<String>,
}

/// Summary feedback in both languages.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverallFeedback {
    pub primary: String,
    #[serde(default)]
    pub secondary: String,
}

impl Default for OverallFeedback {
    fn default() -> Self {
        Self {
            primary: "Good effort! Keep practicing your English every day.".into(),
            secondary: "ጥሩ ሙከራ! በየቀኑ እንግሊዝኛዎን መለማመድ ይቀጥሉ።".into(),
        }
    }
}

/// One actionable improvement suggestion.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImprovementTip {
    pub tip: String,
    #[serde(default)]
    pub category: String,
}

/// Full grammar analysis of a learner sentence.
///
/// `isPerfect` and `errors` are the schema's required core: a payload that
/// omits either is malformed and fails strict parsing (a perfect sentence
/// must still carry an explicit empty error list).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GrammarAnalysis {
    /// The fully corrected sentence; defaults to the input when the model
    /// omits it (filled in by the parser, which knows the input).
    #[serde(default)]
    pub corrected_text: String,
    pub is_perfect: bool,
    pub errors: Vec<GrammarError>,
    #[serde(default)]
    pub overall_feedback: OverallFeedback,
    #[serde(default)]
    pub improvement_tips: Vec<ImprovementTip>,
    #[serde(skip_deserializing, default)]
    pub provenance: Provenance,
}

// ---------------------------------------------------------------------------
// Pronunciation evaluation
// ---------------------------------------------------------------------------

fn default_accuracy() -> f32 {
    0.7
}

fn default_strengths() -> Vec<String> {
    vec!["You attempted the full phrase — that takes confidence.".into()]
}

fn default_areas() -> Vec<String> {
    vec!["Keep practicing the phrase slowly, one word at a time.".into()]
}

fn default_exercises() -> Vec<String> {
    vec!["Repeat the phrase three times, exaggerating each sound.".into()]
}

/// Grouped qualitative feedback, each list capped at 3 entries by the
/// prompt contract.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PronunciationFeedback {
    #[serde(default = "default_strengths")]
    pub strengths: Vec<String>,
    #[serde(default = "default_areas")]
    pub areas_to_improve: Vec<String>,
    #[serde(default = "default_exercises")]
    pub practice_exercises: Vec<String>,
}

impl Default for PronunciationFeedback {
    fn default() -> Self {
        Self {
            strengths: default_strengths(),
            areas_to_improve: default_areas(),
            practice_exercises: default_exercises(),
        }
    }
}

/// One word the learner likely mispronounced.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MispronouncedWord {
    pub word: String,
    #[serde(default)]
    pub issue_description: String,
    #[serde(default)]
    pub correction_tip: String,
    #[serde(default)]
    pub phonetic_spelling: String,
}

/// Full pronunciation evaluation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PronunciationEvaluation {
    /// Accuracy in `[0, 1]`; clamped after every parse tier.
    #[serde(default = "default_accuracy")]
    pub accuracy_score: f32,
    #[serde(default)]
    pub feedback: PronunciationFeedback,
    #[serde(default)]
    pub mispronounced_words: Vec<MispronouncedWord>,
    #[serde(skip_deserializing, default)]
    pub provenance: Provenance,
}

impl PronunciationEvaluation {
    /// Clamp the accuracy score into `[0, 1]`.
    pub fn clamp_score(mut self) -> Self {
        self.accuracy_score = self.accuracy_score.clamp(0.0, 1.0);
        self
    }
}

// ---------------------------------------------------------------------------
// ParsedResult
// ---------------------------------------------------------------------------

/// Union of the three feature payloads, for callers that dispatch on a
/// [`GenerationRequest`] rather than a concrete feature.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum ParsedResult {
    Chat(ChatReply),
    Grammar(GrammarAnalysis),
    Pronunciation(PronunciationEvaluation),
}

impl ParsedResult {
    pub fn provenance(&self) -> Provenance {
        match self {
            Self::Chat(r) => r.provenance,
            Self::Grammar(r) => r.provenance,
            Self::Pronunciation(r) => r.provenance,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
