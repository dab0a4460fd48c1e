use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::core::prompt::{SessionConfig, DEFAULT_MODEL, DEFAULT_TEMPERATURE};
use crate::core::safety::SafetyPolicy;
use crate::core::tags::TagSelection;

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_DOCS_BASE_URL: &str = "https://docs.googleapis.com/v1";
pub const DEFAULT_DEMO_DELAY_MS: u64 = 1200;

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct SafetyConfig {
    /// Scan messages for crisis keywords while running in demo mode
    pub scan_in_demo: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct TranscriptConfig {
    /// Identifier of the shared document transcripts are appended to
    pub document_id: Option<String>,
    /// OAuth2 client used for the consent flow
    pub client_id: Option<String>,
    pub client_secret: Option<String>,
    pub docs_base_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Default, Clone, PartialEq)]
pub struct Config {
    /// Model identifier (e.g., "gemini-2.5-flash")
    pub model: Option<String>,
    /// Sampling temperature bound into every session
    pub temperature: Option<f32>,
    /// Base URL of the model API
    pub base_url: Option<String>,
    /// Behavior tags active at startup
    pub default_tags: Option<Vec<String>>,
    /// Simulated latency of demo-mode replies, in milliseconds
    pub demo_delay_ms: Option<u64>,
    #[serde(default)]
    pub safety: SafetyConfig,
    #[serde(default)]
    pub transcript: TranscriptConfig,
}

/// Get a user-friendly display string for a path
/// Converts absolute paths to use ~ notation on Unix-like systems when possible
pub fn path_display<P: AsRef<Path>>(path: P) -> String {
    let path = path.as_ref();

    #[cfg(unix)]
    {
        if let Some(home) = std::env::var_os("HOME") {
            let home_path = PathBuf::from(home);
            if let Ok(relative) = path.strip_prefix(&home_path) {
                return format!("~/{}", relative.display());
            }
        }
    }

    path.display().to_string()
}

impl Config {
    pub fn effective_model(&self) -> &str {
        self.model
            .as_deref()
            .filter(|model| !model.trim().is_empty())
            .unwrap_or(DEFAULT_MODEL)
    }

    pub fn effective_temperature(&self) -> f32 {
        self.temperature.unwrap_or(DEFAULT_TEMPERATURE)
    }

    pub fn effective_base_url(&self) -> &str {
        self.base_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(DEFAULT_BASE_URL)
    }

    pub fn docs_base_url(&self) -> &str {
        self.transcript
            .docs_base_url
            .as_deref()
            .filter(|url| !url.trim().is_empty())
            .unwrap_or(DEFAULT_DOCS_BASE_URL)
    }

    pub fn demo_delay(&self) -> Duration {
        Duration::from_millis(self.demo_delay_ms.unwrap_or(DEFAULT_DEMO_DELAY_MS))
    }

    pub fn safety_policy(&self) -> SafetyPolicy {
        SafetyPolicy {
            scan_in_demo: self
                .safety
                .scan_in_demo
                .unwrap_or(SafetyPolicy::default().scan_in_demo),
        }
    }

    /// Startup tags: `overrides` when given, else the configured defaults,
    /// else the built-in defaults.
    pub fn tag_selection(&self, overrides: &[String]) -> Result<TagSelection, String> {
        if !overrides.is_empty() {
            return TagSelection::from_ids(overrides);
        }
        match &self.default_tags {
            Some(ids) => TagSelection::from_ids(ids),
            None => Ok(TagSelection::defaults()),
        }
    }

    pub fn session_config(&self, tag_overrides: &[String]) -> Result<SessionConfig, String> {
        Ok(SessionConfig::new(
            self.effective_model(),
            self.effective_temperature(),
            self.tag_selection(tag_overrides)?,
        ))
    }
}
