//! Tiered recovery of structured results from free-text model output.
//!
//! The model is instructed to emit bare JSON, but real output arrives
//! fence-wrapped, prose-wrapped, truncated, or as plain prose. Recovery
//! tiers, first success wins:
//!
//! 1. strip code fences and whitespace, strict JSON parse;
//! 2. balanced-brace scan for the first complete `{...}` object, strict
//!    parse of that substring;
//! 3. label-based extraction of the feature's minimum viable field, all
//!    other fields defaulted (`recovered-partial`);
//! 4. the entire cleaned text as the feature's free-text body — chat only
//!    (`recovered-partial`).
//!
//! Grammar is the strict exception: its error-list structure has no default,
//! so anything short of a full strict parse fails and the caller degrades to
//! the synthesizer.

use crate::pipeline::schema::{
    ChatReply, GrammarAnalysis, PronunciationEvaluation, PronunciationFeedback, Provenance,
};

// ---------------------------------------------------------------------------
// ResponseParser
// ---------------------------------------------------------------------------

/// Pure, stateless parser; one entry point per feature.
pub struct ResponseParser;

impl ResponseParser {
    // -----------------------------------------------------------------------
    // Chat
    // -----------------------------------------------------------------------

    /// Parse a chat reply. Never fails on non-empty input: tier 4 accepts
    /// the whole text as the reply body.
    pub fn parse_chat(raw: &str) -> Option<ChatReply> {
        let cleaned = strip_code_fences(raw);

        if let Some(mut reply) = strict_parse::<ChatReply>(&cleaned) {
            reply.provenance = Provenance::RealModel;
            return Some(reply);
        }

        if let Some(object) = extract_json_object(&cleaned) {
            if let Some(mut reply) = strict_parse::<ChatReply>(object) {
                reply.provenance = Provenance::RealModel;
                return Some(reply);
            }
        }

        if let Some(text) = extract_string_after(&cleaned, "\"responseText\"") {
            return Some(ChatReply::from_text(text, Provenance::RecoveredPartial));
        }

        if cleaned.is_empty() {
            return None;
        }
        Some(ChatReply::from_text(cleaned, Provenance::RecoveredPartial))
    }

    // -----------------------------------------------------------------------
    // Grammar
    // -----------------------------------------------------------------------

    /// Parse a grammar analysis. `input_text` supplies the default for
    /// `corrected_text` when the model omits it.
    ///
    /// The error-list structure has no default, so only a strict parse
    /// (tier 1 or 2) can succeed; label extraction cannot invent it.
    pub fn parse_grammar(raw: &str, input_text: &str) -> Option<GrammarAnalysis> {
        let cleaned = strip_code_fences(raw);

        let parsed = strict_parse::<GrammarAnalysis>(&cleaned).or_else(|| {
            extract_json_object(&cleaned).and_then(strict_parse::<GrammarAnalysis>)
        })?;

        let mut analysis = parsed;
        if analysis.corrected_text.trim().is_empty() {
            analysis.corrected_text = input_text.to_string();
        }
        analysis.provenance = Provenance::RealModel;
        Some(analysis)
    }

    // -----------------------------------------------------------------------
    // Pronunciation
    // -----------------------------------------------------------------------

    /// Parse a pronunciation evaluation. Tier 3 salvages a bare accuracy
    /// number from broken output; the score is clamped after every tier.
    pub fn parse_pronunciation(raw: &str) -> Option<PronunciationEvaluation> {
        let cleaned = strip_code_fences(raw);

        if let Some(mut eval) = strict_parse::<PronunciationEvaluation>(&cleaned) {
            eval.provenance = Provenance::RealModel;
            return Some(eval.clamp_score());
        }

        if let Some(object) = extract_json_object(&cleaned) {
            if let Some(mut eval) = strict_parse::<PronunciationEvaluation>(object) {
                eval.provenance = Provenance::RealModel;
                return Some(eval.clamp_score());
            }
        }

        let score = extract_number_after(&cleaned, "accuracyScore")
            .or_else(|| extract_number_after(&cleaned, "accuracy"))?;

        let eval = PronunciationEvaluation {
            accuracy_score: score,
            feedback: PronunciationFeedback::default(),
            mispronounced_words: Vec::new(),
            provenance: Provenance::RecoveredPartial,
        };
        Some(eval.clamp_score())
    }
}

// ---------------------------------------------------------------------------
// Text salvage helpers
// ---------------------------------------------------------------------------

fn strict_parse<T: serde::de::DeserializeOwned>(text: &str) -> Option<T> {
    serde_json::from_str(text).ok()
}

/// Strip surrounding markdown code fences, returning the inner content.
/// Text without a complete fence pair is returned trimmed.
fn strip_code_fences(raw: &str) -> String {
    let trimmed = raw.trim();

    if let Some(start) = trimmed.find("```") {
        let after_fence = &trimmed[start + 3..];
        // Skip the language tag line (e.g. "json") when present.
        let content_start = after_fence.find('\n').map(|nl| nl + 1).unwrap_or(0);
        let content = &after_fence[content_start..];
        if let Some(end) = content.find("```") {
            return content[..end].trim().to_string();
        }
    }

    trimmed.to_string()
}

/// Extract the first top-level `{...}` object via a depth-counting scan.
/// Braces inside JSON strings do not affect the depth count.
fn extract_json_object(raw: &str) -> Option<&str> {
    let mut start = None;
    let mut depth: i32 = 0;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, ch) in raw.char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == '"' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '"' if start.is_some() => in_string = true,
            '{' => {
                if start.is_none() {
                    start = Some(idx);
                }
                depth += 1;
            }
            '}' if depth > 0 => {
                depth -= 1;
                if depth == 0 {
                    return start.map(|s| &raw[s..=idx]);
                }
            }
            _ => {}
        }
    }
    None
}

/// Pull the first quoted string value following `label` (label should
/// include its own quotes to avoid matching prose). Escapes for `\"`, `\\`,
/// `\n` and `\t` are decoded.
fn extract_string_after(raw: &str, label: &str) -> Option<String> {
    let pos = raw.find(label)? + label.len();
    let rest = raw[pos..].trim_start().strip_prefix(':')?.trim_start();
    let inner = rest.strip_prefix('"')?;

    let mut out = String::new();
    let mut escaped = false;
    for ch in inner.chars() {
        if escaped {
            match ch {
                'n' => out.push('\n'),
                't' => out.push('\t'),
                other => out.push(other),
            }
            escaped = false;
        } else if ch == '\\' {
            escaped = true;
        } else if ch == '"' {
            if out.trim().is_empty() {
                return None;
            }
            return Some(out);
        } else {
            out.push(ch);
        }
    }
    None
}

/// Pull the first bare decimal appearing shortly after `label` (within a
/// dozen characters, so unrelated numbers later in the text do not match).
fn extract_number_after(raw: &str, label: &str) -> Option<f32> {
    let pos = raw.find(label)? + label.len();
    let rest = &raw[pos..];
    let num_start = rest.find(|c: char| c.is_ascii_digit() || c == '-')?;
    if num_start > 12 {
        return None;
    }
    let rest = &rest[num_start..];
    let end = rest
        .find(|c: char| !c.is_ascii_digit() && c != '.' && c != '-')
        .unwrap_or(rest.len());
    rest[..end].parse().ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
