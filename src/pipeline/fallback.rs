//! Deterministic fallback synthesis for all three features.
//!
//! Invoked when no backend is configured, when a backend call fails, or
//! when the parser cannot salvage a valid result. Everything here is a pure
//! function of the request: identical input yields byte-identical output,
//! with no randomness and no hidden state.
//!
//! Matching order matters for chat: the exact-match table runs before the
//! keyword buckets so that short common words ("hi" inside "this") cannot
//! cause false positives.

use crate::pipeline::schema::{
    ChatReply, ChatRequest, GenerationRequest, GrammarAnalysis, GrammarError, GrammarRequest,
    ImprovementTip, MispronouncedWord, OverallFeedback, ParsedResult, PronunciationEvaluation,
    PronunciationFeedback, PronunciationRequest, Provenance, Severity,
};

// ---------------------------------------------------------------------------
// Chat tables
// ---------------------------------------------------------------------------

/// Exact-match canned replies, keyed by the lowercased, trimmed message.
struct CannedReply {
    trigger: &'static str,
    reply: &'static str,
    translation: &'static str,
    pronunciation: &'static str,
}

static CANNED_REPLIES: &[CannedReply] = &[
    CannedReply {
        trigger: "hello",
        reply: "Hello! Selam! I'm so glad you're here to practice English. \
                What would you like to talk about today?",
        translation: "ሰላም! እንኳን ደህና መጡ።",
        pronunciation: "heh-LOH",
    },
    CannedReply {
        trigger: "hi",
        reply: "Hi there! Ready to practice some English? Tell me about your day!",
        translation: "ሰላም!",
        pronunciation: "HY",
    },
    CannedReply {
        trigger: "good morning",
        reply: "Good morning! A great time to practice. What are your plans for today?",
        translation: "እንደምን አደሩ!",
        pronunciation: "good MOR-ning",
    },
    CannedReply {
        trigger: "how are you",
        reply: "I'm doing great, thank you for asking! How are you today? \
                Try answering with a full sentence.",
        translation: "እንዴት ነህ/ነሽ?",
        pronunciation: "how AR yoo",
    },
    CannedReply {
        trigger: "thank you",
        reply: "You're welcome! In English we often reply 'You're welcome' or \
                'No problem'. Keep up the great work!",
        translation: "አመሰግናለሁ ማለት ነው።",
        pronunciation: "THANK yoo",
    },
    CannedReply {
        trigger: "bye",
        reply: "Goodbye! Great practicing with you today. Come back soon — \
                a little English every day goes a long way!",
        translation: "ደህና ሁን/ሁኚ!",
        pronunciation: "goodBYE",
    },
];

/// Ordered keyword buckets, consulted only after the exact table misses.
struct TopicBucket {
    keywords: &'static [&'static str],
    reply: &'static str,
}

static TOPIC_BUCKETS: &[TopicBucket] = &[
    // Greeting
    TopicBucket {
        keywords: &["hello", "good morning", "good evening", "greet", "selam"],
        reply: "Greetings are a great place to start! Common English greetings \
                are 'Hello', 'Hi', 'Good morning', and 'How are you?'. \
                Try greeting me back!",
    },
    // Vocabulary
    TopicBucket {
        keywords: &["word", "vocabulary", "meaning", "translate", "dictionary"],
        reply: "Building vocabulary takes time. Try learning five new words a \
                day and using each one in a sentence. Would you like to \
                practice a word together?",
    },
    // Grammar
    TopicBucket {
        keywords: &["grammar", "tense", "verb", "sentence", "plural"],
        reply: "Grammar gets easier with practice! Write me a sentence and I \
                will help you check it. Remember: English verbs change with \
                the subject — 'I go', but 'she goes'.",
    },
    // Pronunciation
    TopicBucket {
        keywords: &["pronounce", "pronunciation", "accent", "sound"],
        reply: "Pronunciation improves with daily listening and repeating. \
                The 'th' sound is tricky for Amharic speakers — put your \
                tongue between your teeth and blow gently. Try it with \
                'think'!",
    },
    // App usage
    TopicBucket {
        keywords: &["app", "microphone", "settings", "record", "button"],
        reply: "To practice speaking, tap the microphone button and read the \
                target phrase aloud. I will tell you which sounds to work \
                on. You can also chat with me or check your grammar here.",
    },
    // Tips
    TopicBucket {
        keywords: &["tip", "advice", "improve", "faster", "practice"],
        reply: "My best tip: practice a little every single day. Speak out \
                loud, even alone. Watch English shows with subtitles, and \
                don't fear mistakes — they are how we learn!",
    },
];

// ---------------------------------------------------------------------------
// Grammar tables
// ---------------------------------------------------------------------------

/// Known practice sentences with verified corrections.
struct KnownSentence {
    /// Normalized form: lowercased, trimmed, trailing period removed.
    input: &'static str,
    corrected: &'static str,
    original_span: &'static str,
    correction_span: &'static str,
    severity: Severity,
    explanation_en: &'static str,
    explanation_am: &'static str,
    example: &'static str,
}

static KNOWN_SENTENCES: &[KnownSentence] = &[
    KnownSentence {
        input: "she go to school",
        corrected: "She goes to school.",
        original_span: "go",
        correction_span: "goes",
        severity: Severity::Medium,
        explanation_en: "With 'he', 'she' or 'it', the present-tense verb takes an -s ending.",
        explanation_am: "ከ'he'፣ 'she' ወይም 'it' ጋር ግሱ -s ይጨምራል።",
        example: "She goes to the market every Saturday.",
    },
    KnownSentence {
        input: "i am agree with you",
        corrected: "I agree with you.",
        original_span: "am agree",
        correction_span: "agree",
        severity: Severity::Medium,
        explanation_en: "'Agree' is a verb, not an adjective, so it does not take 'am'.",
        explanation_am: "'Agree' ግስ ስለሆነ 'am' አያስፈልገውም።",
        example: "I agree with your idea completely.",
    },
    KnownSentence {
        input: "he have a car",
        corrected: "He has a car.",
        original_span: "have",
        correction_span: "has",
        severity: Severity::Medium,
        explanation_en: "With 'he', 'she' or 'it', 'have' becomes 'has'.",
        explanation_am: "ከ'he'፣ 'she' ወይም 'it' ጋር 'have' ወደ 'has' ይቀየራል።",
        example: "He has two brothers and one sister.",
    },
];

// ---------------------------------------------------------------------------
// Pronunciation tables
// ---------------------------------------------------------------------------

/// A sound that commonly troubles Amharic speakers, detected lexically in
/// the target phrase. This is a proxy, not a phonetic measurement.
struct PhonemeRule {
    /// Whether the rule fires for the whole lowercased target phrase.
    detect: fn(&str) -> bool,
    /// Picks the first matching token to name in the feedback entry.
    matches_word: fn(&str) -> bool,
    /// Named when no single token can be pinned down.
    example_word: &'static str,
    issue: &'static str,
    tip: &'static str,
    phonetic: &'static str,
}

fn has_th(word: &str) -> bool {
    word.contains("th")
}

fn has_v_or_w(word: &str) -> bool {
    word.contains('v') || word.contains('w')
}

fn has_r(word: &str) -> bool {
    word.contains('r')
}

/// Word-initial p/t/k followed by a vowel — the position where English
/// aspirates these stops and Amharic does not.
fn has_initial_stop(word: &str) -> bool {
    let mut chars = word.chars();
    let first = chars.next().unwrap_or(' ');
    let second = chars.next().unwrap_or(' ');
    matches!(first, 'p' | 't' | 'k') && matches!(second, 'a' | 'e' | 'i' | 'o' | 'u')
}

fn phrase_has_initial_stop(phrase: &str) -> bool {
    phrase.split_whitespace().any(has_initial_stop)
}

static PHONEME_RULES: &[PhonemeRule] = &[
    PhonemeRule {
        detect: has_th,
        matches_word: has_th,
        example_word: "think",
        issue: "The 'th' sound does not exist in Amharic and is often replaced by 't' or 's'.",
        tip: "Place the tip of your tongue lightly between your teeth and blow air out gently.",
        phonetic: "/θ/ or /ð/",
    },
    PhonemeRule {
        detect: has_v_or_w,
        matches_word: has_v_or_w,
        example_word: "very",
        issue: "'v' and 'w' are often swapped; 'v' uses the teeth, 'w' uses rounded lips.",
        tip: "For 'v', touch your top teeth to your bottom lip. For 'w', round your lips like for 'u'.",
        phonetic: "/v/ vs /w/",
    },
    PhonemeRule {
        detect: has_r,
        matches_word: has_r,
        example_word: "red",
        issue: "The English 'r' is not rolled or trilled like the Amharic 'ረ'.",
        tip: "Curl your tongue back slightly without touching the roof of your mouth, and do not tap.",
        phonetic: "/ɹ/",
    },
    PhonemeRule {
        detect: phrase_has_initial_stop,
        matches_word: has_initial_stop,
        example_word: "pen",
        issue: "Word-initial 'p', 't' and 'k' are aspirated in English — a small puff of air follows them.",
        tip: "Hold a hand in front of your mouth; you should feel a puff of air on the first sound.",
        phonetic: "/pʰ/ /tʰ/ /kʰ/",
    },
];

// ---------------------------------------------------------------------------
// FallbackSynthesizer
// ---------------------------------------------------------------------------

/// Deterministic, schema-valid synthesis for every feature. Pure and
/// stateless; all results carry `Provenance::FallbackMock`.
pub struct FallbackSynthesizer;

impl FallbackSynthesizer {
    /// Dispatch on the request's feature kind.
    pub fn synthesize(request: &GenerationRequest) -> ParsedResult {
        match request {
            GenerationRequest::Chat(req) => ParsedResult::Chat(Self::chat(req)),
            GenerationRequest::Grammar(req) => ParsedResult::Grammar(Self::grammar(req)),
            GenerationRequest::Pronunciation(req) => {
                ParsedResult::Pronunciation(Self::pronunciation(req))
            }
        }
    }

    // -----------------------------------------------------------------------
    // Chat
    // -----------------------------------------------------------------------

    /// Canned exact match → keyword bucket → question template → generic
    /// encouragement, in that order.
    pub fn chat(request: &ChatRequest) -> ChatReply {
        let normalized = request.message.trim().to_lowercase();
        let normalized = normalized.trim_end_matches(['.', '!', '?']);

        // Exact match first — substring matching would trip on short
        // triggers like "hi".
        if let Some(canned) = CANNED_REPLIES.iter().find(|c| c.trigger == normalized) {
            return ChatReply {
                response_text: canned.reply.to_string(),
                translation_note: canned.translation.to_string(),
                pronunciation_note: canned.pronunciation.to_string(),
                grammar_note: None,
                provenance: Provenance::FallbackMock,
            };
        }

        if let Some(bucket) = TOPIC_BUCKETS
            .iter()
            .find(|b| b.keywords.iter().any(|kw| normalized.contains(kw)))
        {
            return ChatReply::from_text(bucket.reply, Provenance::FallbackMock);
        }

        // Question-shaped messages get a study-oriented template.
        if normalized.starts_with("how to") {
            return ChatReply::from_text(
                format!(
                    "Good question! To learn about \"{}\", break it into small \
                     steps and practice each one out loud. Would you like to \
                     try a practice sentence about it?",
                    request.message.trim()
                ),
                Provenance::FallbackMock,
            );
        }
        if normalized.starts_with("what") || normalized.starts_with("explain") {
            return ChatReply::from_text(
                format!(
                    "That's a thoughtful question about \"{}\". Let's explore it \
                     together — try telling me what you already know, in \
                     English, and we'll build from there.",
                    request.message.trim()
                ),
                Provenance::FallbackMock,
            );
        }

        ChatReply::from_text(
            format!(
                "Thanks for sharing \"{}\"! Let's turn it into practice: try \
                 making one full English sentence about it, and I'll help you \
                 polish it.",
                request.message.trim()
            ),
            Provenance::FallbackMock,
        )
    }

    // -----------------------------------------------------------------------
    // Grammar
    // -----------------------------------------------------------------------

    /// Known sentences get their verified correction; everything else gets a
    /// lenient `is_perfect = true` — the fallback never invents corrections
    /// it cannot verify.
    pub fn grammar(request: &GrammarRequest) -> GrammarAnalysis {
        let normalized = request.text.trim().to_lowercase();
        let normalized = normalized.trim_end_matches(['.', '!', '?']).to_string();

        if let Some(known) = KNOWN_SENTENCES.iter().find(|k| k.input == normalized) {
            return GrammarAnalysis {
                corrected_text: known.corrected.to_string(),
                is_perfect: false,
                errors: vec![GrammarError {
                    original: known.original_span.to_string(),
                    correction: known.correction_span.to_string(),
                    severity: known.severity,
                    explanation_primary: known.explanation_en.to_string(),
                    explanation_secondary: known.explanation_am.to_string(),
                    examples: vec![known.example.to_string()],
                }],
                overall_feedback: OverallFeedback {
                    primary: "Nice try! One small fix and your sentence is perfect.".into(),
                    secondary: "ጥሩ ሙከራ! አንድ ትንሽ እርማት ብቻ ይቀራል።".into(),
                },
                improvement_tips: vec![ImprovementTip {
                    tip: "Watch the verb ending whenever the subject is 'he', 'she' or 'it'."
                        .into(),
                    category: "verb agreement".into(),
                }],
                provenance: Provenance::FallbackMock,
            };
        }

        let token_count = request.text.split_whitespace().count();
        if token_count <= 3 {
            return GrammarAnalysis {
                corrected_text: request.text.clone(),
                is_perfect: true,
                errors: vec![],
                overall_feedback: OverallFeedback {
                    primary: "This is too short to analyze properly — try writing a full \
                              sentence with a subject and a verb."
                        .into(),
                    secondary: "ሙሉ ዓረፍተ ነገር ይጻፉ — ባለቤትና ግስ ያለው።".into(),
                },
                improvement_tips: vec![],
                provenance: Provenance::FallbackMock,
            };
        }

        GrammarAnalysis {
            corrected_text: request.text.clone(),
            is_perfect: true,
            errors: vec![],
            overall_feedback: OverallFeedback::default(),
            improvement_tips: vec![ImprovementTip {
                tip: "Read your sentence aloud — if it sounds natural, it usually is.".into(),
                category: "self-checking".into(),
            }],
            provenance: Provenance::FallbackMock,
        }
    }

    // -----------------------------------------------------------------------
    // Pronunciation
    // -----------------------------------------------------------------------

    /// Lexical scan of the target phrase for sounds that commonly trouble
    /// Amharic speakers. Score: `min(0.95, max(0.6, 0.9 − 0.1 × issues))`.
    pub fn pronunciation(request: &PronunciationRequest) -> PronunciationEvaluation {
        let target = request.target_text.to_lowercase();
        let tokens: Vec<&str> = target.split_whitespace().collect();

        let mut words = Vec::new();
        for rule in PHONEME_RULES {
            if !(rule.detect)(&target) {
                continue;
            }
            let word = tokens
                .iter()
                .copied()
                .find(|t| (rule.matches_word)(t))
                .unwrap_or(rule.example_word);
            words.push(MispronouncedWord {
                word: word.to_string(),
                issue_description: rule.issue.to_string(),
                correction_tip: rule.tip.to_string(),
                phonetic_spelling: rule.phonetic.to_string(),
            });
        }

        let issues = words.len() as f32;
        let accuracy_score = (0.9 - 0.1 * issues).max(0.6).min(0.95);

        let mut areas: Vec<String> = words
            .iter()
            .take(3)
            .map(|w| format!("Work on the sound in '{}' — {}", w.word, w.issue_description))
            .collect();
        if areas.is_empty() {
            areas = vec!["Keep your rhythm steady and stress the important words.".into()];
        }

        let mut exercises: Vec<String> = words
            .iter()
            .take(3)
            .map(|w| format!("Say '{}' slowly five times, then use it in a sentence.", w.word))
            .collect();
        if exercises.is_empty() {
            exercises = vec![format!(
                "Read \"{}\" aloud three times, a little faster each time.",
                request.target_text
            )];
        }

        let strengths = if words.is_empty() {
            vec![
                "This phrase avoids the sounds Amharic speakers usually find hardest — \
                 great choice for building confidence!"
                    .into(),
            ]
        } else {
            vec!["You attempted the full phrase — that takes confidence.".into()]
        };

        PronunciationEvaluation {
            accuracy_score,
            feedback: PronunciationFeedback {
                strengths,
                areas_to_improve: areas,
                practice_exercises: exercises,
            },
            mispronounced_words: words,
            provenance: Provenance::FallbackMock,
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn chat_req(message: &str) -> ChatRequest {
        ChatRequest::new(message, vec![]).unwrap()
    }

    // -----------------------------------------------------------------------
    // Chat tiers
    // -----------------------------------------------------------------------

    #[test]
    fn hello_hits_the_canned_greeting() {
        let reply = FallbackSynthesizer::chat(&chat_req("hello"));
        assert!(reply.response_text.contains("Selam"));
        assert_eq!(reply.translation_note, "ሰላም! እንኳን ደህና መጡ።");
        assert_eq!(reply.provenance, Provenance::FallbackMock);
    }

    #[test]
    fn exact_match_is_case_and_punctuation_insensitive() {
        let plain = FallbackSynthesizer::chat(&chat_req("hello"));
        let shouted = FallbackSynthesizer::chat(&chat_req("  HELLO! "));
        assert_eq!(plain.response_text, shouted.response_text);
    }

    #[test]
    fn keyword_bucket_matches_after_exact_misses() {
        let reply = FallbackSynthesizer::chat(&chat_req("my grammar is bad"));
        assert!(reply.response_text.contains("Grammar"));
    }

    #[test]
    fn how_to_prefix_gets_the_study_template() {
        let reply = FallbackSynthesizer::chat(&chat_req("how to order food"));
        assert!(reply.response_text.contains("how to order food"));
        assert!(reply.response_text.contains("small"));
    }

    #[test]
    fn what_prefix_gets_the_explore_template() {
        let reply = FallbackSynthesizer::chat(&chat_req("what does fluent really take"));
        assert!(reply.response_text.contains("what does fluent really take"));
    }

    #[test]
    fn unmatched_message_gets_encouragement_with_literal_text() {
        let reply = FallbackSynthesizer::chat(&chat_req("banana"));
        assert!(reply.response_text.contains("\"banana\""));
        assert!(reply.response_text.contains("practice"));
        assert_eq!(reply.provenance, Provenance::FallbackMock);
    }

    #[test]
    fn chat_fallback_is_idempotent() {
        let a = FallbackSynthesizer::chat(&chat_req("banana"));
        let b = FallbackSynthesizer::chat(&chat_req("banana"));
        assert_eq!(a, b);
    }

    // -----------------------------------------------------------------------
    // Grammar tiers
    // -----------------------------------------------------------------------

    #[test]
    fn known_sentence_returns_verified_correction() {
        let req = GrammarRequest::new("She go to school.").unwrap();
        let analysis = FallbackSynthesizer::grammar(&req);
        assert!(!analysis.is_perfect);
        assert_eq!(analysis.corrected_text, "She goes to school.");
        assert_eq!(analysis.errors.len(), 1);
        assert_eq!(analysis.errors[0].correction, "goes");
        assert!(!analysis.errors[0].explanation_secondary.is_empty());
    }

    #[test]
    fn short_input_is_flagged_too_short_but_perfect() {
        let req = GrammarRequest::new("I like tea").unwrap();
        let analysis = FallbackSynthesizer::grammar(&req);
        assert!(analysis.is_perfect);
        assert!(analysis.errors.is_empty());
        assert!(analysis.overall_feedback.primary.contains("too short"));
        assert_eq!(analysis.corrected_text, "I like tea");
    }

    #[test]
    fn unknown_sentence_is_leniently_perfect() {
        let req = GrammarRequest::new("Yesterday I walked to the big market").unwrap();
        let analysis = FallbackSynthesizer::grammar(&req);
        assert!(analysis.is_perfect);
        assert!(analysis.errors.is_empty());
        assert_eq!(analysis.corrected_text, "Yesterday I walked to the big market");
    }

    // -----------------------------------------------------------------------
    // Pronunciation heuristic
    // -----------------------------------------------------------------------

    fn pron_req(target: &str) -> PronunciationRequest {
        PronunciationRequest::new(target, "whatever was heard").unwrap()
    }

    #[test]
    fn this_very_rhythm_detects_three_issues_at_point_six() {
        let eval = FallbackSynthesizer::pronunciation(&pron_req("this very rhythm"));
        assert_eq!(eval.mispronounced_words.len(), 3);
        assert!((eval.accuracy_score - 0.6).abs() < f32::EPSILON);

        let words: Vec<&str> = eval
            .mispronounced_words
            .iter()
            .map(|w| w.word.as_str())
            .collect();
        assert_eq!(words, vec!["this", "very", "very"]);
    }

    #[test]
    fn clean_phrase_scores_high_with_no_issues() {
        // No th, v/w, r, and no vowel-following initial stop.
        let eval = FallbackSynthesizer::pronunciation(&pron_req("shoes and jam"));
        assert!(eval.mispronounced_words.is_empty());
        assert!((eval.accuracy_score - 0.9).abs() < f32::EPSILON);
        assert_eq!(eval.feedback.areas_to_improve.len(), 1);
    }

    #[test]
    fn initial_stop_requires_following_vowel() {
        // "tea" starts with 't' + vowel, so the stop rule fires; a 't'
        // followed by a consonant (as in "this") must not.
        let eval = FallbackSynthesizer::pronunciation(&pron_req("tea shop"));
        let issues: Vec<&str> = eval
            .mispronounced_words
            .iter()
            .map(|w| w.word.as_str())
            .collect();
        assert_eq!(issues, vec!["tea"]);

        let eval = FallbackSynthesizer::pronunciation(&pron_req("sling shot"));
        assert!(eval.mispronounced_words.is_empty());
    }

    #[test]
    fn accuracy_never_leaves_the_clamp_band() {
        // Every rule fires: th, w, r, and an initial aspirated stop.
        let eval = FallbackSynthesizer::pronunciation(&pron_req("three wet red tomatoes think"));
        assert_eq!(eval.mispronounced_words.len(), 4);
        assert!((eval.accuracy_score - 0.6).abs() < f32::EPSILON);
    }

    #[test]
    fn pronunciation_fallback_is_idempotent() {
        let a = FallbackSynthesizer::pronunciation(&pron_req("this very rhythm"));
        let b = FallbackSynthesizer::pronunciation(&pron_req("this very rhythm"));
        assert_eq!(a, b);
    }

    // -----------------------------------------------------------------------
    // Dispatch
    // -----------------------------------------------------------------------

    #[test]
    fn synthesize_dispatches_on_feature_kind() {
        let chat = GenerationRequest::Chat(chat_req("hello"));
        assert!(matches!(
            FallbackSynthesizer::synthesize(&chat),
            ParsedResult::Chat(_)
        ));

        let grammar = GenerationRequest::Grammar(GrammarRequest::new("he have a car").unwrap());
        assert!(matches!(
            FallbackSynthesizer::synthesize(&grammar),
            ParsedResult::Grammar(_)
        ));

        let pron = GenerationRequest::Pronunciation(pron_req("water"));
        assert!(matches!(
            FallbackSynthesizer::synthesize(&pron),
            ParsedResult::Pronunciation(_)
        ));
    }
}
