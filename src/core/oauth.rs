//! Loopback OAuth2 authorization-code flow against Google identity, used to
//! obtain a bearer token for the transcript document.

use std::error::Error;
use std::fmt;
use std::time::Duration;

use base64::Engine as _;
use serde::Deserialize;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;
use tracing::{debug, info, warn};

use crate::api::docs::UserInfo;
use crate::utils::auth::add_bearer_auth;

pub const GOOGLE_AUTHORIZATION_ENDPOINT: &str = "https://accounts.google.com/o/oauth2/v2/auth";
pub const GOOGLE_TOKEN_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_USERINFO_ENDPOINT: &str = "https://www.googleapis.com/oauth2/v3/userinfo";
pub const GOOGLE_REVOCATION_ENDPOINT: &str = "https://oauth2.googleapis.com/revoke";
pub const DOCUMENTS_SCOPE: &str = "https://www.googleapis.com/auth/documents openid email profile";
pub const CALLBACK_PATH: &str = "/oauth/callback";

const CALLBACK_TIMEOUT: Duration = Duration::from_secs(300);
const PAGE_TITLE: &str = "ACT Companion sign-in";

#[derive(Debug)]
pub enum OAuthError {
    /// The identity provider redirected back with an error code.
    Denied {
        code: String,
        description: Option<String>,
    },
    StateMismatch,
    MissingCode,
    MalformedCallback(String),
    Timeout,
    Io(std::io::Error),
    Http { status: u16, body: String },
    Request(reqwest::Error),
    InvalidUrl(String),
    Random(String),
}

impl fmt::Display for OAuthError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OAuthError::Denied { code, description } => match description {
                Some(description) => write!(f, "Authorization denied ({code}): {description}"),
                None => write!(f, "Authorization denied ({code})"),
            },
            OAuthError::StateMismatch => write!(f, "OAuth callback state mismatch"),
            OAuthError::MissingCode => write!(f, "OAuth callback missing code"),
            OAuthError::MalformedCallback(detail) => write!(f, "Malformed OAuth callback: {detail}"),
            OAuthError::Timeout => write!(f, "Timed out waiting for the OAuth callback"),
            OAuthError::Io(err) => write!(f, "OAuth I/O error: {err}"),
            OAuthError::Http { status, body } => {
                write!(f, "OAuth request failed ({status}): {body}")
            }
            OAuthError::Request(err) => write!(f, "OAuth request failed: {err}"),
            OAuthError::InvalidUrl(detail) => write!(f, "Invalid OAuth URL: {detail}"),
            OAuthError::Random(detail) => write!(f, "Failed to generate OAuth state: {detail}"),
        }
    }
}

impl Error for OAuthError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            OAuthError::Io(err) => Some(err),
            OAuthError::Request(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for OAuthError {
    fn from(err: std::io::Error) -> Self {
        OAuthError::Io(err)
    }
}

impl From<reqwest::Error> for OAuthError {
    fn from(err: reqwest::Error) -> Self {
        OAuthError::Request(err)
    }
}

/// Profile of the signed-in account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser {
    pub name: String,
    pub email: String,
    pub image_url: String,
}

impl From<UserInfo> for AuthenticatedUser {
    fn from(info: UserInfo) -> Self {
        Self {
            name: info.name,
            email: info.email,
            image_url: info.picture,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct OAuthTokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub token_type: Option<String>,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub scope: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OAuthEndpoints {
    pub authorization: String,
    pub token: String,
    pub userinfo: String,
    pub revocation: String,
}

impl Default for OAuthEndpoints {
    fn default() -> Self {
        Self {
            authorization: GOOGLE_AUTHORIZATION_ENDPOINT.to_string(),
            token: GOOGLE_TOKEN_ENDPOINT.to_string(),
            userinfo: GOOGLE_USERINFO_ENDPOINT.to_string(),
            revocation: GOOGLE_REVOCATION_ENDPOINT.to_string(),
        }
    }
}

pub struct AuthorizationUrlParams<'a> {
    pub authorization_endpoint: &'a str,
    pub client_id: &'a str,
    pub redirect_uri: &'a str,
    pub state: &'a str,
    pub scope: &'a str,
}

pub fn build_authorization_url(
    params: AuthorizationUrlParams<'_>,
) -> Result<reqwest::Url, OAuthError> {
    let mut url = reqwest::Url::parse(params.authorization_endpoint)
        .map_err(|err| OAuthError::InvalidUrl(err.to_string()))?;
    url.query_pairs_mut()
        .append_pair("response_type", "code")
        .append_pair("client_id", params.client_id)
        .append_pair("redirect_uri", params.redirect_uri)
        .append_pair("state", params.state)
        .append_pair("scope", params.scope)
        .append_pair("prompt", "consent");
    Ok(url)
}

pub fn random_urlsafe(bytes_len: usize) -> Result<String, OAuthError> {
    let mut bytes = vec![0_u8; bytes_len];
    getrandom::fill(&mut bytes).map_err(|err| OAuthError::Random(err.to_string()))?;
    Ok(base64::engine::general_purpose::URL_SAFE_NO_PAD.encode(bytes))
}

fn launch_status(status: std::process::ExitStatus, launcher: &str) -> Result<(), Box<dyn Error>> {
    if status.success() {
        Ok(())
    } else {
        Err(format!("failed to launch browser with {launcher}").into())
    }
}

pub fn open_in_browser(url: &str) -> Result<(), Box<dyn Error>> {
    #[cfg(target_os = "macos")]
    {
        let status = std::process::Command::new("open").arg(url).status()?;
        return launch_status(status, "open");
    }
    #[cfg(target_os = "windows")]
    {
        let status = std::process::Command::new("cmd")
            .args(["/C", "start", "", url])
            .status()?;
        return launch_status(status, "start");
    }
    #[cfg(all(unix, not(target_os = "macos")))]
    {
        let status = std::process::Command::new("xdg-open").arg(url).status()?;
        return launch_status(status, "xdg-open");
    }

    #[allow(unreachable_code)]
    Err(format!("no browser launcher configured for URL: {url}").into())
}

enum CallbackPage {
    Success,
    Failure(&'static str),
}

fn escape_html(value: &str) -> String {
    value
        .replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn render_callback_page(page: &CallbackPage) -> String {
    let (heading, detail, accent) = match page {
        CallbackPage::Success => (
            "You're signed in",
            "Transcript logging is connected. Close this tab and return to ACT Companion.",
            "#2e7d32",
        ),
        CallbackPage::Failure(heading) => (
            *heading,
            "Close this tab and try signing in again from ACT Companion.",
            "#c62828",
        ),
    };

    include_str!("../builtins/oauth-callback.html")
        .replace("{{TITLE}}", &escape_html(PAGE_TITLE))
        .replace("{{HEADING}}", &escape_html(heading))
        .replace("{{DETAIL}}", &escape_html(detail))
        .replace("{{ACCENT_COLOR}}", accent)
}

async fn write_callback_response(
    stream: &mut tokio::net::TcpStream,
    page: CallbackPage,
) -> Result<(), OAuthError> {
    let status = match page {
        CallbackPage::Success => "200 OK",
        CallbackPage::Failure(_) => "400 Bad Request",
    };
    let body = render_callback_page(&page);
    let response = format!(
        "HTTP/1.1 {status}\r\nContent-Type: text/html; charset=utf-8\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    stream.write_all(response.as_bytes()).await?;
    stream.flush().await?;
    Ok(())
}

/// Accepts the browser redirect on `listener` and returns the authorization
/// code once the `state` matches.
pub async fn wait_for_oauth_callback(
    listener: TcpListener,
    expected_state: &str,
) -> Result<String, OAuthError> {
    let (mut stream, _) = tokio::time::timeout(CALLBACK_TIMEOUT, listener.accept())
        .await
        .map_err(|_| OAuthError::Timeout)??;

    let mut buffer = vec![0_u8; 16 * 1024];
    let bytes_read = stream.read(&mut buffer).await?;
    if bytes_read == 0 {
        return Err(OAuthError::MalformedCallback("no data".to_string()));
    }
    let request = String::from_utf8_lossy(&buffer[..bytes_read]);
    let target = request
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .ok_or_else(|| OAuthError::MalformedCallback("request line missing".to_string()))?;
    let callback_url = reqwest::Url::parse(&format!("http://localhost{target}"))
        .map_err(|err| OAuthError::MalformedCallback(err.to_string()))?;

    let mut state = None::<String>;
    let mut code = None::<String>;
    let mut error = None::<String>;
    let mut error_description = None::<String>;
    for (key, value) in callback_url.query_pairs() {
        match key.as_ref() {
            "state" => state = Some(value.into_owned()),
            "code" => code = Some(value.into_owned()),
            "error" => error = Some(value.into_owned()),
            "error_description" => error_description = Some(value.into_owned()),
            _ => {}
        }
    }

    if let Some(code) = error {
        write_callback_response(&mut stream, CallbackPage::Failure("Sign-in was not completed"))
            .await?;
        return Err(OAuthError::Denied {
            code,
            description: error_description,
        });
    }

    if state.as_deref() != Some(expected_state) {
        write_callback_response(&mut stream, CallbackPage::Failure("Sign-in state did not match"))
            .await?;
        return Err(OAuthError::StateMismatch);
    }

    let Some(code) = code else {
        write_callback_response(
            &mut stream,
            CallbackPage::Failure("No authorization code received"),
        )
        .await?;
        return Err(OAuthError::MissingCode);
    };

    write_callback_response(&mut stream, CallbackPage::Success).await?;
    Ok(code)
}

async fn error_for_status(response: reqwest::Response) -> Result<reqwest::Response, OAuthError> {
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    Err(OAuthError::Http { status, body })
}

/// Google OAuth client for an installed application.
#[derive(Debug, Clone)]
pub struct OAuthClient {
    client_id: String,
    client_secret: Option<String>,
    endpoints: OAuthEndpoints,
    http: reqwest::Client,
}

impl OAuthClient {
    pub fn new(client_id: impl Into<String>, client_secret: Option<String>) -> Self {
        Self::with_endpoints(client_id, client_secret, OAuthEndpoints::default())
    }

    pub fn with_endpoints(
        client_id: impl Into<String>,
        client_secret: Option<String>,
        endpoints: OAuthEndpoints,
    ) -> Self {
        Self {
            client_id: client_id.into(),
            client_secret: client_secret.filter(|secret| !secret.trim().is_empty()),
            endpoints,
            http: reqwest::Client::new(),
        }
    }

    pub async fn exchange_code(
        &self,
        redirect_uri: &str,
        code: &str,
    ) -> Result<OAuthTokenResponse, OAuthError> {
        let mut form_fields = vec![
            ("grant_type", "authorization_code"),
            ("redirect_uri", redirect_uri),
            ("code", code),
            ("client_id", self.client_id.as_str()),
        ];
        if let Some(secret) = self.client_secret.as_deref() {
            form_fields.push(("client_secret", secret));
        }

        let response = self
            .http
            .post(&self.endpoints.token)
            .form(&form_fields)
            .send()
            .await?;
        let response = error_for_status(response).await?;
        Ok(response.json::<OAuthTokenResponse>().await?)
    }

    pub async fn fetch_user(&self, access_token: &str) -> Result<AuthenticatedUser, OAuthError> {
        let request = add_bearer_auth(self.http.get(&self.endpoints.userinfo), access_token);
        let response = error_for_status(request.send().await?).await?;
        let info = response.json::<UserInfo>().await?;
        Ok(info.into())
    }

    pub async fn revoke(&self, access_token: &str) -> Result<(), OAuthError> {
        let response = self
            .http
            .post(&self.endpoints.revocation)
            .form(&[("token", access_token)])
            .send()
            .await?;
        error_for_status(response).await?;
        debug!("OAuth token revoked");
        Ok(())
    }

    /// Runs the full consent flow: loopback listener, browser hand-off, code
    /// exchange and profile fetch. The token is returned to the caller and
    /// never written to disk.
    pub async fn sign_in(&self) -> Result<(String, AuthenticatedUser), OAuthError> {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await?;
        let port = listener.local_addr()?.port();
        let redirect_uri = format!("http://127.0.0.1:{port}{CALLBACK_PATH}");
        let state = random_urlsafe(24)?;

        let url = build_authorization_url(AuthorizationUrlParams {
            authorization_endpoint: &self.endpoints.authorization,
            client_id: &self.client_id,
            redirect_uri: &redirect_uri,
            state: &state,
            scope: DOCUMENTS_SCOPE,
        })?;

        println!("Opening your browser to sign in to Google Docs...");
        println!("If it does not open, visit:\n  {url}");
        if let Err(err) = open_in_browser(url.as_str()) {
            warn!("Could not launch browser: {err}");
        }

        let code = wait_for_oauth_callback(listener, &state).await?;
        let token = self.exchange_code(&redirect_uri, &code).await?;
        let user = self.fetch_user(&token.access_token).await?;
        info!(email = %user.email, "signed in for transcript logging");
        Ok((token.access_token, user))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use tokio::net::TcpStream;

    async fn send_callback(port: u16, target: &str) -> String {
        let mut stream = TcpStream::connect(("127.0.0.1", port))
            .await
            .expect("connect");
        let request = format!("GET {target} HTTP/1.1\r\nHost: 127.0.0.1\r\n\r\n");
        stream.write_all(request.as_bytes()).await.expect("write");
        let mut response = String::new();
        stream
            .read_to_string(&mut response)
            .await
            .expect("read response");
        response
    }

    #[test]
    fn random_urlsafe_is_urlsafe() {
        let token = random_urlsafe(32).expect("random bytes");
        assert!(token
            .chars()
            .all(|ch| ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'));
        assert!(!token.contains('='));
        assert_ne!(token, random_urlsafe(32).expect("random bytes"));
    }

    #[test]
    fn authorization_url_includes_required_params() {
        let url = build_authorization_url(AuthorizationUrlParams {
            authorization_endpoint: GOOGLE_AUTHORIZATION_ENDPOINT,
            client_id: "client.apps.googleusercontent.com",
            redirect_uri: "http://127.0.0.1:7777/oauth/callback",
            state: "state123",
            scope: DOCUMENTS_SCOPE,
        })
        .expect("authorization URL should build");
        let params: HashMap<String, String> = url.query_pairs().into_owned().collect();
        assert_eq!(params.get("response_type").map(String::as_str), Some("code"));
        assert_eq!(
            params.get("client_id").map(String::as_str),
            Some("client.apps.googleusercontent.com")
        );
        assert_eq!(
            params.get("redirect_uri").map(String::as_str),
            Some("http://127.0.0.1:7777/oauth/callback")
        );
        assert_eq!(params.get("state").map(String::as_str), Some("state123"));
        assert_eq!(params.get("scope").map(String::as_str), Some(DOCUMENTS_SCOPE));
    }

    #[test]
    fn callback_page_escapes_markup() {
        let html = render_callback_page(&CallbackPage::Success);
        assert!(html.contains("You&#39;re signed in"));
        assert!(html.contains("#2e7d32"));
        assert!(!html.contains("{{"));
    }

    #[test]
    fn user_info_maps_picture_to_image_url() {
        let info: UserInfo = serde_json::from_str(
            r#"{"name":"Ada","email":"ada@example.com","picture":"https://img.example/ada.png","sub":"1"}"#,
        )
        .expect("parse");
        let user = AuthenticatedUser::from(info);
        assert_eq!(user.name, "Ada");
        assert_eq!(user.image_url, "https://img.example/ada.png");
    }

    #[tokio::test]
    async fn callback_returns_code_when_state_matches() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await.expect("bind");
        let port = listener.local_addr().expect("addr").port();
        let waiter = tokio::spawn(async move { wait_for_oauth_callback(listener, "s1").await });

        let response = send_callback(port, "/oauth/callback?state=s1&code=abc").await;
        assert!(response.starts_with("HTTP/1.1 200 OK"));
        let code = waiter.await.expect("join").expect("code");
        assert_eq!(code, "abc");
    }

    #[tokio::test]
    async fn callback_rejects_state_mismatch() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await.expect("bind");
        let port = listener.local_addr().expect("addr").port();
        let waiter = tokio::spawn(async move { wait_for_oauth_callback(listener, "s1").await });

        let response = send_callback(port, "/oauth/callback?state=other&code=abc").await;
        assert!(response.starts_with("HTTP/1.1 400"));
        let err = waiter.await.expect("join").expect_err("mismatch");
        assert!(matches!(err, OAuthError::StateMismatch));
    }

    #[tokio::test]
    async fn callback_surfaces_provider_errors() {
        let listener = TcpListener::bind(("127.0.0.1", 0)).await.expect("bind");
        let port = listener.local_addr().expect("addr").port();
        let waiter = tokio::spawn(async move { wait_for_oauth_callback(listener, "s1").await });

        send_callback(port, "/oauth/callback?error=access_denied&state=s1").await;
        let err = waiter.await.expect("join").expect_err("denied");
        match err {
            OAuthError::Denied { code, description } => {
                assert_eq!(code, "access_denied");
                assert!(description.is_none());
            }
            other => panic!("unexpected error: {other}"),
        }
    }
}
