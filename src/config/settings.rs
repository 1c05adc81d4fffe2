//! Application settings structs, defaults and TOML persistence.
//!
//! All structs implement `Serialize`, `Deserialize`, `Default` and `Clone`
//! so they can be round-tripped through TOML files and shared across threads.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::AppPaths;

// ---------------------------------------------------------------------------
// ModelConfig
// ---------------------------------------------------------------------------

/// Settings for the generative model backend.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    /// API key for the model provider. `None` (and an unset
    /// `TUTOR_API_KEY` environment variable) means no backend is
    /// constructed and every request is answered by the local synthesizer.
    pub api_key: Option<String>,
    /// Base URL of the generative API endpoint.
    pub base_url: String,
    /// Maximum seconds to wait for a model response before timing out.
    pub timeout_secs: u64,
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: "https://generativelanguage.googleapis.com".into(),
            timeout_secs: 12,
        }
    }
}

impl ModelConfig {
    /// Resolve the effective API key: the config value wins, otherwise the
    /// `TUTOR_API_KEY` environment variable. Blank values count as absent.
    pub fn resolve_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .or_else(|| std::env::var("TUTOR_API_KEY").ok())
            .filter(|k| !k.trim().is_empty())
    }
}

// ---------------------------------------------------------------------------
// TutorConfig
// ---------------------------------------------------------------------------

/// Settings for the tutoring persona.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TutorConfig {
    /// ISO-639-1 code of the learner's native language. Secondary
    /// explanations in grammar feedback are written in this language.
    pub native_language: String,
}

impl Default for TutorConfig {
    fn default() -> Self {
        Self {
            native_language: "am".into(),
        }
    }
}

// ---------------------------------------------------------------------------
// AppConfig  (top-level)
// ---------------------------------------------------------------------------

/// Top-level application configuration, serialised as `settings.toml`.
///
/// # Persistence
///
/// ```rust,no_run
/// use english_tutor::config::AppConfig;
///
/// // Load (returns Default when file is missing)
/// let config = AppConfig::load().unwrap();
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Generative model backend settings.
    pub model: ModelConfig,
    /// Tutoring persona settings.
    pub tutor: TutorConfig,
}

impl AppConfig {
    /// Load configuration from the platform-appropriate `settings.toml`.
    ///
    /// Returns `Ok(AppConfig::default())` when the file does not exist yet
    /// (first-run scenario) so callers never need to special-case a missing
    /// file.
    pub fn load() -> Result<Self> {
        Self::load_from(&AppPaths::new().settings_file)
    }

    /// Load from an explicit path (useful for tests).
    pub fn load_from(path: &std::path::Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content)?;
        Ok(config)
    }

    /// Save configuration to the platform-appropriate `settings.toml`,
    /// creating parent directories as needed.
    pub fn save(&self) -> Result<()> {
        self.save_to(&AppPaths::new().settings_file)
    }

    /// Save to an explicit path (useful for tests).
    pub fn save_to(&self, path: &std::path::Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    /// Verify that a default `AppConfig` can be serialised to TOML and
    /// deserialised back without any data loss.
    #[test]
    fn round_trip_toml() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("settings.toml");

        let original = AppConfig::default();
        original.save_to(&path).expect("save");

        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(original.model.api_key, loaded.model.api_key);
        assert_eq!(original.model.base_url, loaded.model.base_url);
        assert_eq!(original.model.timeout_secs, loaded.model.timeout_secs);
        assert_eq!(original.tutor.native_language, loaded.tutor.native_language);
    }

    /// `load_from` on a non-existent path must return `Default` without error.
    #[test]
    fn load_missing_returns_default() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("nonexistent.toml");

        let config = AppConfig::load_from(&path).expect("should not error");
        let default = AppConfig::default();

        assert_eq!(config.model.base_url, default.model.base_url);
        assert_eq!(config.tutor.native_language, default.tutor.native_language);
    }

    /// Verify that modified non-default values survive a round trip.
    #[test]
    fn round_trip_modified_values() {
        let dir = tempdir().expect("temp dir");
        let path = dir.path().join("modified.toml");

        let mut cfg = AppConfig::default();
        cfg.model.api_key = Some("test-key-123".into());
        cfg.model.base_url = "https://example.invalid".into();
        cfg.model.timeout_secs = 30;
        cfg.tutor.native_language = "ti".into();

        cfg.save_to(&path).expect("save");
        let loaded = AppConfig::load_from(&path).expect("load");

        assert_eq!(loaded.model.api_key, Some("test-key-123".into()));
        assert_eq!(loaded.model.base_url, "https://example.invalid");
        assert_eq!(loaded.model.timeout_secs, 30);
        assert_eq!(loaded.tutor.native_language, "ti");
    }

    /// A blank config key must resolve to `None`.
    #[test]
    fn blank_api_key_counts_as_absent() {
        let cfg = ModelConfig {
            api_key: Some("   ".into()),
            ..ModelConfig::default()
        };
        // Note: may still pick up TUTOR_API_KEY from the environment; the
        // test environment does not set it.
        assert_eq!(cfg.resolve_api_key(), None);
    }
}
