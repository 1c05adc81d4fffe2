//! Prompt builder for the three tutoring features.
//!
//! Each render function enforces the same three-part contract: an explicit
//! statement of exactly one JSON output schema, a "valid JSON only, no
//! surrounding prose" directive, and the feature-specific context. The
//! parser downstream is tolerant, but the prompts do everything they can to
//! make tolerance unnecessary.

use crate::pipeline::schema::{ChatTurn, GrammarRequest, PronunciationRequest};

/// Number of most-recent history turns included in a chat prompt. Earlier
/// turns are dropped to bound prompt size and bias the model toward the
/// current topic.
pub const HISTORY_WINDOW: usize = 6;

// ---------------------------------------------------------------------------
// Persona and directives
// ---------------------------------------------------------------------------

const PERSONA: &str = "\
You are Selam, a friendly and encouraging English tutor for Amharic-speaking \
learners. You explain things simply, celebrate progress, and never overwhelm \
the learner.";

const JSON_ONLY: &str = "\
Respond with valid JSON only. Exactly one JSON object, no surrounding prose, \
no markdown code fences, no comments.";

// ---------------------------------------------------------------------------
// PromptBuilder
// ---------------------------------------------------------------------------

/// Builds feature-specific instruction prompts. Pure and stateless.
///
/// # Example
/// ```rust
/// use english_tutor::pipeline::PromptBuilder;
///
/// let builder = PromptBuilder::new("am");
/// let prompt = builder.chat("How do I order coffee?", &[]);
/// assert!(prompt.contains("valid JSON only"));
/// ```
pub struct PromptBuilder {
    native_language: String,
}

impl PromptBuilder {
    /// Create a builder; `native_language` is the ISO-639-1 code used for
    /// secondary (learner-language) explanations.
    pub fn new(native_language: &str) -> Self {
        Self {
            native_language: native_language.to_string(),
        }
    }

    /// Human-readable name of the learner's native language.
    fn language_name(&self) -> &'static str {
        match self.native_language.as_str() {
            "am" => "Amharic",
            "ti" => "Tigrinya",
            "om" => "Oromo",
            _ => "Amharic",
        }
    }

    // -----------------------------------------------------------------------
    // Chat
    // -----------------------------------------------------------------------

    /// Render the chat-reply prompt. Only the last [`HISTORY_WINDOW`] turns
    /// of `history` are included, oldest first, most recent last.
    pub fn chat(&self, message: &str, history: &[ChatTurn]) -> String {
        let mut prompt = String::with_capacity(2048);
        prompt.push_str(PERSONA);
        prompt.push_str("\n\nReply to the learner's message. ");
        prompt.push_str(&format!(
            "Return exactly this JSON schema:\n\
             {{\n\
             \x20 \"responseText\": \"your conversational reply in simple English\",\n\
             \x20 \"translationNote\": \"{} translation of the key phrase, or empty string\",\n\
             \x20 \"pronunciationNote\": \"pronunciation hint for one word you used, or empty string\",\n\
             \x20 \"grammarNote\": \"gentle note on the learner's grammar, or null\"\n\
             }}\n",
            self.language_name()
        ));
        prompt.push_str(JSON_ONLY);

        if !history.is_empty() {
            prompt.push_str("\n\nConversation so far (most recent last):\n");
            let start = history.len().saturating_sub(HISTORY_WINDOW);
            for turn in &history[start..] {
                prompt.push_str(&format!("{}: {}\n", turn.role, turn.text));
            }
        }

        prompt.push_str(&format!("\nLearner's message:\n{}\n", message));
        prompt
    }

    // -----------------------------------------------------------------------
    // Grammar
    // -----------------------------------------------------------------------

    /// Render the grammar-analysis prompt.
    pub fn grammar(&self, request: &GrammarRequest) -> String {
        let lang = self.language_name();
        let mut prompt = String::with_capacity(2048);
        prompt.push_str(PERSONA);
        prompt.push_str("\n\nAnalyze the learner's sentence for grammar errors. ");
        prompt.push_str(&format!(
            "Return exactly this JSON schema:\n\
             {{\n\
             \x20 \"correctedText\": \"the fully corrected sentence\",\n\
             \x20 \"isPerfect\": true or false,\n\
             \x20 \"errors\": [\n\
             \x20   {{\n\
             \x20     \"original\": \"the erroneous span\",\n\
             \x20     \"correction\": \"the corrected span\",\n\
             \x20     \"severity\": \"high\" | \"medium\" | \"low\",\n\
             \x20     \"explanationPrimary\": \"explanation in English\",\n\
             \x20     \"explanationSecondary\": \"explanation in {lang}\",\n\
             \x20     \"examples\": [\"example sentence using the correct form\"]\n\
             \x20   }}\n\
             \x20 ],\n\
             \x20 \"overallFeedback\": {{ \"primary\": \"English summary\", \"secondary\": \"{lang} summary\" }},\n\
             \x20 \"improvementTips\": [ {{ \"tip\": \"actionable advice\", \"category\": \"topic\" }} ]\n\
             }}\n"
        ));
        prompt.push_str(
            "If the sentence is already correct, set \"isPerfect\" to true and \
             \"errors\" to an empty list. Never omit the \"errors\" list.\n",
        );
        prompt.push_str(JSON_ONLY);
        prompt.push_str(&format!("\n\nLearner's sentence:\n{}\n", request.text));
        prompt
    }

    // -----------------------------------------------------------------------
    // Pronunciation
    // -----------------------------------------------------------------------

    /// Render the pronunciation-evaluation prompt. The "evaluation" compares
    /// two transcripts; no audio is involved anywhere in this pipeline.
    pub fn pronunciation(&self, request: &PronunciationRequest) -> String {
        let mut prompt = String::with_capacity(2048);
        prompt.push_str(PERSONA);
        prompt.push_str(
            "\n\nThe learner tried to say a target phrase; a speech recognizer \
             transcribed what they actually said. Compare the two and judge the \
             likely pronunciation problems of an Amharic speaker. ",
        );
        prompt.push_str(
            "Return exactly this JSON schema:\n\
             {\n\
             \x20 \"accuracyScore\": a number between 0 and 1,\n\
             \x20 \"feedback\": {\n\
             \x20   \"strengths\": [\"at most 3 entries\"],\n\
             \x20   \"areasToImprove\": [\"at most 3 entries\"],\n\
             \x20   \"practiceExercises\": [\"at most 3 entries\"]\n\
             \x20 },\n\
             \x20 \"mispronouncedWords\": [\n\
             \x20   {\n\
             \x20     \"word\": \"the affected word\",\n\
             \x20     \"issueDescription\": \"what went wrong\",\n\
             \x20     \"correctionTip\": \"how to fix it\",\n\
             \x20     \"phoneticSpelling\": \"IPA or simple phonetic hint\"\n\
             \x20   }\n\
             \x20 ]\n\
             }\n\
             Each feedback list must contain at most 3 entries.\n",
        );
        prompt.push_str(JSON_ONLY);
        prompt.push_str(&format!(
            "\n\nTarget phrase:\n{}\n\nWhat the learner said:\n{}\n",
            request.target_text, request.spoken_text
        ));
        prompt
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
