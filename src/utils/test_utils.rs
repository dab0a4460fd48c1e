use std::sync::Arc;

use crate::core::app::{App, AppInit};
use crate::core::config::Config;
use crate::core::mode::{ModeResolver, StaticCredential};
use crate::core::prompt::SessionConfig;
use crate::core::transcript::TranscriptLogger;

/// Base URL nothing listens on; live tests never let a request reach it.
pub const UNREACHABLE_BASE_URL: &str = "http://127.0.0.1:9";

pub fn test_config() -> Config {
    Config {
        base_url: Some(UNREACHABLE_BASE_URL.to_string()),
        demo_delay_ms: Some(5),
        ..Default::default()
    }
}

pub fn create_app_with(config: Config, credential: Option<&str>) -> App {
    let session_config = SessionConfig::default();
    App::new(AppInit {
        config,
        session_config,
        resolver: ModeResolver::new(Box::new(StaticCredential(credential.map(str::to_string)))),
        transcript: None,
    })
}

/// An app in demo mode (empty credential).
pub fn create_test_app() -> App {
    create_app_with(test_config(), Some(""))
}

/// An app in live mode whose session points at [`UNREACHABLE_BASE_URL`].
pub fn create_live_test_app() -> App {
    create_app_with(test_config(), Some("AIza-test-key"))
}

/// A logger that is never connected, so it makes no requests.
pub fn idle_transcript_logger() -> Arc<TranscriptLogger> {
    Arc::new(TranscriptLogger::google_docs(UNREACHABLE_BASE_URL, "doc-test"))
}
