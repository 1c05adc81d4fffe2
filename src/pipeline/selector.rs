//! Backend candidate table and one-shot selection.
//!
//! [`select_backend`] walks the static [`CANDIDATES`] table in priority
//! order and returns the first backend that constructs successfully.
//! Construction failures are logged and swallowed; a missing API key is a
//! valid state, not an error. The rest of the pipeline must work with
//! `None` — every request then goes to the deterministic synthesizer.

use crate::pipeline::backend::ApiBackend;

// ---------------------------------------------------------------------------
// BackendCandidate
// ---------------------------------------------------------------------------

/// One configured option for the generative model, tried in table order.
#[derive(Debug, Clone, Copy)]
pub struct BackendCandidate {
    /// Model identifier in the provider's namespace.
    pub model: &'static str,
    /// Sampling temperature (0.0 – 1.0). Lower = more deterministic.
    pub temperature: f32,
    pub top_k: u32,
    pub top_p: f32,
    pub max_output_tokens: u32,
    /// Content-safety threshold applied to every harm category.
    pub safety_threshold: &'static str,
}

/// Candidates in descending priority. The flash tier goes first: tutoring
/// replies are latency-sensitive and the schemas are simple enough that the
/// smaller models fill them reliably.
pub static CANDIDATES: &[BackendCandidate] = &[
    BackendCandidate {
        model: "gemini-2.0-flash",
        temperature: 0.7,
        top_k: 40,
        top_p: 0.95,
        max_output_tokens: 1024,
        safety_threshold: "BLOCK_ONLY_HIGH",
    },
    BackendCandidate {
        model: "gemini-1.5-flash",
        temperature: 0.7,
        top_k: 40,
        top_p: 0.95,
        max_output_tokens: 1024,
        safety_threshold: "BLOCK_ONLY_HIGH",
    },
    BackendCandidate {
        model: "gemini-1.5-pro",
        temperature: 0.6,
        top_k: 32,
        top_p: 0.9,
        max_output_tokens: 2048,
        safety_threshold: "BLOCK_ONLY_HIGH",
    },
];

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Return the first candidate backend that constructs successfully, or
/// `None` when no key is supplied or every candidate fails.
///
/// Each attempt is a `Result`; failures are logged at `warn` and the next
/// candidate is tried. Callers hold the returned handle for the process
/// lifetime and never mutate it.
pub fn select_backend(api_key: Option<&str>, base_url: &str, timeout_secs: u64) -> Option<ApiBackend> {
    let key = api_key.map(str::trim).filter(|k| !k.is_empty())?;

    for candidate in CANDIDATES {
        match ApiBackend::try_new(*candidate, key, base_url, timeout_secs) {
            Ok(backend) => {
                log::info!("selected model backend: {}", candidate.model);
                return Some(backend);
            }
            Err(err) => {
                log::warn!(
                    "backend candidate {} failed to construct: {}",
                    candidate.model,
                    err
                );
            }
        }
    }

    log::warn!("no backend candidate could be constructed; running on synthesizer only");
    None
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    const BASE_URL: &str = "https://generativelanguage.googleapis.com";

    #[test]
    fn no_key_yields_no_backend() {
        assert!(select_backend(None, BASE_URL, 10).is_none());
    }

    #[test]
    fn blank_key_yields_no_backend() {
        assert!(select_backend(Some("   "), BASE_URL, 10).is_none());
    }

    #[test]
    fn invalid_key_fails_every_candidate() {
        // A key that cannot form a header value fails construction for all
        // candidates, leaving the backend unset.
        assert!(select_backend(Some("bad\u{0}key"), BASE_URL, 10).is_none());
    }

    #[test]
    fn valid_key_selects_highest_priority_candidate() {
        let backend = select_backend(Some("test-key-1234"), BASE_URL, 10)
            .expect("first candidate should construct");
        assert_eq!(backend.model(), CANDIDATES[0].model);
    }

    #[test]
    fn bad_base_url_fails_every_candidate() {
        assert!(select_backend(Some("test-key"), "::not-a-url::", 10).is_none());
    }

    #[test]
    fn candidate_table_is_priority_ordered_and_nonempty() {
        assert!(!CANDIDATES.is_empty());
        // Flash tier first.
        assert!(CANDIDATES[0].model.contains("flash"));
    }
}
