//! Building an [`App`] from command-line options and tearing it down.

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use super::{App, AppInit};
use crate::core::config::Config;
use crate::core::mode::{EnvKeyringSource, ModeResolver};
use crate::core::oauth::OAuthClient;
use crate::core::transcript::{LogRole, TranscriptLogger};

/// Startup choices shared by the interactive and one-shot commands.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppOptions {
    /// Replaces the configured default tags when non-empty.
    pub tags: Vec<String>,
    pub force_demo: bool,
    pub log_to_document: bool,
}

fn required<'a>(value: Option<&'a str>, key: &str) -> Result<&'a str, Box<dyn Error>> {
    value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(|| {
            format!("Transcript logging needs {key}. Set it with: act-companion set {key} <value>")
                .into()
        })
}

fn oauth_client(config: &Config) -> Result<OAuthClient, Box<dyn Error>> {
    let client_id = required(config.transcript.client_id.as_deref(), "transcript-client-id")?;
    Ok(OAuthClient::new(
        client_id,
        config.transcript.client_secret.clone(),
    ))
}

/// Signs in through the browser and returns a connected logger.
pub async fn connect_transcript(config: &Config) -> Result<Arc<TranscriptLogger>, Box<dyn Error>> {
    let document_id = required(
        config.transcript.document_id.as_deref(),
        "transcript-document-id",
    )?;
    let oauth = oauth_client(config)?;

    let (token, user) = oauth.sign_in().await?;
    println!("✓ Signed in as {} <{}>", user.name, user.email);

    let logger = Arc::new(TranscriptLogger::google_docs(
        config.docs_base_url(),
        document_id,
    ));
    logger.connect(token, user).await;
    Ok(logger)
}

pub async fn build_app(options: &AppOptions, config: &Config) -> Result<App, Box<dyn Error>> {
    let session_config = config.session_config(&options.tags)?;
    let resolver = if options.force_demo {
        ModeResolver::forced_demo()
    } else {
        ModeResolver::new(Box::new(EnvKeyringSource::new(true)))
    };
    let transcript = if options.log_to_document {
        Some(connect_transcript(config).await?)
    } else {
        None
    };

    let app = App::new(AppInit {
        config: config.clone(),
        session_config,
        resolver,
        transcript,
    });

    if let Some(logger) = &app.transcript {
        let tags = app.session_config.tags.ids().join(", ");
        logger.log_in_background(
            LogRole::System,
            format!("Session started in {} mode with tags: {}", app.mode, tags),
            app.session_id.clone(),
        );
    }
    Ok(app)
}

/// Upper bound on waiting for queued transcript entries at shutdown.
pub const TRANSCRIPT_FLUSH_TIMEOUT: Duration = Duration::from_secs(5);

/// Cancels in-flight streams, waits for queued transcript entries, then signs
/// the transcript logger out and revokes its token.
pub async fn shutdown(app: &mut App, config: &Config) {
    app.cancel_streams();

    let Some(logger) = app.transcript.take() else {
        return;
    };
    if !logger.flush(TRANSCRIPT_FLUSH_TIMEOUT).await {
        warn!("Gave up waiting for transcript entries after {TRANSCRIPT_FLUSH_TIMEOUT:?}");
    }
    let Some(token) = logger.disconnect().await else {
        return;
    };
    let revoked = match oauth_client(config) {
        Ok(oauth) => oauth.revoke(&token).await.map_err(|err| err.to_string()),
        Err(err) => Err(err.to_string()),
    };
    match revoked {
        Ok(()) => info!("transcript logger signed out"),
        Err(err) => warn!("Failed to revoke transcript token: {err}"),
    }
}
