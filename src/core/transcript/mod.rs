//! Optional transcript logging to a shared Google Doc.
//!
//! Each entry costs two round trips: one to read the document's current end
//! offset and one to insert the formatted line there. The pair is not atomic,
//! so concurrent writers to the same document may interleave. The logger is
//! meant for a single user running one session at a time.
//!
//! Background entries go through one writer task so they land in the order
//! they were queued. [`TranscriptLogger::flush`] waits for that task before
//! the logger is disconnected.

pub mod docs;

use std::error::Error;
use std::fmt;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, SecondsFormat, Utc};
use tokio::sync::{mpsc, RwLock};
use tokio_util::task::TaskTracker;
use tracing::{debug, error, warn};

use crate::core::message::Role;
use crate::core::oauth::AuthenticatedUser;

pub use docs::{DocumentApi, GoogleDocsClient};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogRole {
    User,
    Model,
    System,
}

impl LogRole {
    pub fn as_str(self) -> &'static str {
        match self {
            LogRole::User => "USER",
            LogRole::Model => "MODEL",
            LogRole::System => "SYSTEM",
        }
    }
}

impl From<Role> for LogRole {
    fn from(role: Role) -> Self {
        match role {
            Role::User => LogRole::User,
            Role::Model => LogRole::Model,
        }
    }
}

impl fmt::Display for LogRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub enum LoggingError {
    Transport(String),
    Http { status: u16, detail: String },
    Decode(String),
}

impl LoggingError {
    pub(crate) fn transport(err: reqwest::Error) -> Self {
        LoggingError::Transport(err.to_string())
    }
}

impl fmt::Display for LoggingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoggingError::Transport(detail) => write!(f, "document request failed: {detail}"),
            LoggingError::Http { status, detail } => {
                write!(f, "document API returned {status}: {detail}")
            }
            LoggingError::Decode(detail) => write!(f, "unexpected document response: {detail}"),
        }
    }
}

impl Error for LoggingError {}

pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

pub fn format_entry(
    timestamp: DateTime<Utc>,
    session_id: &str,
    role: LogRole,
    content: &str,
) -> String {
    format!(
        "[{}] (Session: {session_id}) [{role}]: {content}\n",
        timestamp.to_rfc3339_opts(SecondsFormat::Millis, true)
    )
}

struct Connection {
    token: String,
    user: AuthenticatedUser,
}

struct QueuedEntry {
    role: LogRole,
    content: String,
    session_id: String,
}

pub struct TranscriptLogger {
    api: Arc<dyn DocumentApi>,
    clock: Arc<dyn Clock>,
    document_id: String,
    connection: RwLock<Option<Connection>>,
    queue: Mutex<Option<mpsc::UnboundedSender<QueuedEntry>>>,
    writers: TaskTracker,
}

impl TranscriptLogger {
    pub fn new(
        api: Arc<dyn DocumentApi>,
        clock: Arc<dyn Clock>,
        document_id: impl Into<String>,
    ) -> Self {
        Self {
            api,
            clock,
            document_id: document_id.into(),
            connection: RwLock::new(None),
            queue: Mutex::new(None),
            writers: TaskTracker::new(),
        }
    }

    pub fn google_docs(base_url: &str, document_id: impl Into<String>) -> Self {
        Self::new(
            Arc::new(GoogleDocsClient::new(base_url)),
            Arc::new(SystemClock),
            document_id,
        )
    }

    pub fn document_id(&self) -> &str {
        &self.document_id
    }

    pub async fn connect(&self, token: String, user: AuthenticatedUser) {
        debug!(email = %user.email, "transcript logger connected");
        *self.connection.write().await = Some(Connection { token, user });
    }

    /// Drops the credential and hands the token back for revocation.
    pub async fn disconnect(&self) -> Option<String> {
        let connection = self.connection.write().await.take()?;
        debug!(email = %connection.user.email, "transcript logger disconnected");
        Some(connection.token)
    }

    pub async fn user(&self) -> Option<AuthenticatedUser> {
        self.connection
            .read()
            .await
            .as_ref()
            .map(|connection| connection.user.clone())
    }

    pub async fn is_connected(&self) -> bool {
        self.connection.read().await.is_some()
    }

    /// Append one entry to the document. Without a connection this only
    /// warns.
    pub async fn log_message(
        &self,
        role: LogRole,
        content: &str,
        session_id: &str,
    ) -> Result<(), LoggingError> {
        let token = match self.connection.read().await.as_ref() {
            Some(connection) => connection.token.clone(),
            None => {
                warn!("Cannot log message: not signed in to the transcript document");
                return Ok(());
            }
        };

        let entry = format_entry(self.clock.now(), session_id, role, content);
        let index = self.api.end_offset(&token, &self.document_id).await?;
        self.api
            .insert_text(&token, &self.document_id, index, &entry)
            .await
    }

    /// Queue an entry for the writer task; failures are reported through
    /// tracing only. Entries are written in the order they were queued.
    pub fn log_in_background(self: &Arc<Self>, role: LogRole, content: String, session_id: String) {
        let entry = QueuedEntry {
            role,
            content,
            session_id,
        };
        let mut queue = self.queue.lock().unwrap_or_else(PoisonError::into_inner);
        let entry = match queue.as_ref() {
            Some(tx) => match tx.send(entry) {
                Ok(()) => return,
                Err(mpsc::error::SendError(entry)) => entry,
            },
            None => entry,
        };

        let (tx, rx) = mpsc::unbounded_channel();
        let _ = tx.send(entry);
        *queue = Some(tx);
        let logger = Arc::clone(self);
        self.writers.spawn(async move { logger.write_queued(rx).await });
    }

    async fn write_queued(&self, mut rx: mpsc::UnboundedReceiver<QueuedEntry>) {
        while let Some(entry) = rx.recv().await {
            if let Err(err) = self
                .log_message(entry.role, &entry.content, &entry.session_id)
                .await
            {
                error!("Error logging to transcript document: {err}");
            }
        }
    }

    /// Wait up to `timeout` for queued entries to be written. Returns false
    /// when the wait timed out. Later entries start a new writer.
    pub async fn flush(&self, timeout: Duration) -> bool {
        drop(
            self.queue
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .take(),
        );
        self.writers.close();
        let drained = tokio::time::timeout(timeout, self.writers.wait())
            .await
            .is_ok();
        self.writers.reopen();
        drained
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use chrono::TimeZone;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    struct FixedClock(DateTime<Utc>);

    impl Clock for FixedClock {
        fn now(&self) -> DateTime<Utc> {
            self.0
        }
    }

    fn fixed_clock() -> Arc<dyn Clock> {
        let instant = Utc
            .with_ymd_and_hms(2024, 5, 1, 12, 30, 0)
            .single()
            .expect("valid timestamp");
        Arc::new(FixedClock(instant))
    }

    #[derive(Default)]
    struct RecordingApi {
        calls: Mutex<Vec<String>>,
        fail_insert: bool,
        latency: Option<Duration>,
    }

    #[async_trait]
    impl DocumentApi for RecordingApi {
        async fn end_offset(&self, token: &str, document_id: &str) -> Result<i64, LoggingError> {
            if let Some(latency) = self.latency {
                tokio::time::sleep(latency).await;
            }
            self.calls
                .lock()
                .expect("lock")
                .push(format!("end_offset {token} {document_id}"));
            Ok(42)
        }

        async fn insert_text(
            &self,
            token: &str,
            document_id: &str,
            index: i64,
            text: &str,
        ) -> Result<(), LoggingError> {
            self.calls
                .lock()
                .expect("lock")
                .push(format!("insert {token} {document_id} {index} {text}"));
            if self.fail_insert {
                return Err(LoggingError::Http {
                    status: 403,
                    detail: "denied".to_string(),
                });
            }
            Ok(())
        }
    }

    fn user() -> AuthenticatedUser {
        AuthenticatedUser {
            name: "Ada".to_string(),
            email: "ada@example.com".to_string(),
            image_url: String::new(),
        }
    }

    #[test]
    fn entry_format_matches_log_layout() {
        let timestamp = Utc
            .with_ymd_and_hms(2024, 5, 1, 12, 30, 0)
            .single()
            .expect("valid timestamp");
        assert_eq!(
            format_entry(timestamp, "abc123", LogRole::Model, "Hello"),
            "[2024-05-01T12:30:00.000Z] (Session: abc123) [MODEL]: Hello\n"
        );
        assert_eq!(LogRole::from(Role::User), LogRole::User);
        assert_eq!(LogRole::System.to_string(), "SYSTEM");
    }

    #[tokio::test]
    async fn unauthenticated_logging_is_a_noop() {
        let api = Arc::new(RecordingApi::default());
        let logger = TranscriptLogger::new(api.clone(), fixed_clock(), "doc-1");

        logger
            .log_message(LogRole::User, "hi", "s1")
            .await
            .expect("no-op succeeds");
        assert!(api.calls.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn reads_end_offset_then_inserts() {
        let api = Arc::new(RecordingApi::default());
        let logger = TranscriptLogger::new(api.clone(), fixed_clock(), "doc-1");
        logger.connect("tok".to_string(), user()).await;
        assert!(logger.is_connected().await);

        logger
            .log_message(LogRole::User, "hi", "s1")
            .await
            .expect("logged");

        let calls = api.calls.lock().expect("lock").clone();
        assert_eq!(
            calls,
            vec![
                "end_offset tok doc-1".to_string(),
                "insert tok doc-1 42 [2024-05-01T12:30:00.000Z] (Session: s1) [USER]: hi\n"
                    .to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn disconnect_returns_token_and_stops_logging() {
        let api = Arc::new(RecordingApi::default());
        let logger = TranscriptLogger::new(api.clone(), fixed_clock(), "doc-1");
        logger.connect("tok".to_string(), user()).await;
        assert_eq!(logger.user().await.map(|u| u.name), Some("Ada".to_string()));

        assert_eq!(logger.disconnect().await.as_deref(), Some("tok"));
        assert_eq!(logger.disconnect().await, None);
        logger
            .log_message(LogRole::Model, "bye", "s1")
            .await
            .expect("no-op");
        assert!(api.calls.lock().expect("lock").is_empty());
    }

    #[tokio::test]
    async fn insert_failures_surface_as_logging_errors() {
        let api = Arc::new(RecordingApi {
            fail_insert: true,
            ..Default::default()
        });
        let logger = TranscriptLogger::new(api, fixed_clock(), "doc-1");
        logger.connect("tok".to_string(), user()).await;

        let err = logger
            .log_message(LogRole::User, "hi", "s1")
            .await
            .expect_err("insert fails");
        assert!(matches!(err, LoggingError::Http { status: 403, .. }));
    }

    fn inserted(api: &RecordingApi) -> Vec<String> {
        api.calls
            .lock()
            .expect("lock")
            .iter()
            .filter(|call| call.starts_with("insert"))
            .cloned()
            .collect()
    }

    #[tokio::test]
    async fn flush_waits_for_background_entries_in_order() {
        let api = Arc::new(RecordingApi {
            latency: Some(Duration::from_millis(20)),
            ..Default::default()
        });
        let logger = Arc::new(TranscriptLogger::new(api.clone(), fixed_clock(), "doc-1"));
        logger.connect("tok".to_string(), user()).await;

        for (role, text) in [
            (LogRole::System, "start"),
            (LogRole::User, "hi"),
            (LogRole::Model, "hello"),
        ] {
            logger.log_in_background(role, text.to_string(), "s1".to_string());
        }
        assert!(logger.flush(Duration::from_secs(5)).await);

        let inserted = inserted(&api);
        assert_eq!(inserted.len(), 3);
        assert!(inserted[0].ends_with("[SYSTEM]: start\n"));
        assert!(inserted[1].ends_with("[USER]: hi\n"));
        assert!(inserted[2].ends_with("[MODEL]: hello\n"));
    }

    #[tokio::test]
    async fn logging_resumes_after_a_flush() {
        let api = Arc::new(RecordingApi::default());
        let logger = Arc::new(TranscriptLogger::new(api.clone(), fixed_clock(), "doc-1"));
        logger.connect("tok".to_string(), user()).await;

        logger.log_in_background(LogRole::User, "one".to_string(), "s1".to_string());
        assert!(logger.flush(Duration::from_secs(5)).await);
        logger.log_in_background(LogRole::User, "two".to_string(), "s1".to_string());
        assert!(logger.flush(Duration::from_secs(5)).await);
        assert_eq!(inserted(&api).len(), 2);
    }

    #[tokio::test]
    async fn flush_gives_up_after_the_timeout() {
        let api = Arc::new(RecordingApi {
            latency: Some(Duration::from_secs(30)),
            ..Default::default()
        });
        let logger = Arc::new(TranscriptLogger::new(api, fixed_clock(), "doc-1"));
        logger.connect("tok".to_string(), user()).await;
        logger.log_in_background(LogRole::User, "hi".to_string(), "s1".to_string());
        assert!(!logger.flush(Duration::from_millis(20)).await);
    }

    async fn read_request(socket: &mut tokio::net::TcpStream) -> String {
        let mut received = Vec::new();
        let mut buf = vec![0_u8; 4096];
        loop {
            let n = socket.read(&mut buf).await.expect("read");
            if n == 0 {
                break;
            }
            received.extend_from_slice(&buf[..n]);
            let text = String::from_utf8_lossy(&received).to_string();
            if let Some(header_end) = text.find("\r\n\r\n") {
                let content_length = text[..header_end]
                    .lines()
                    .find_map(|line| {
                        let (name, value) = line.split_once(':')?;
                        if name.eq_ignore_ascii_case("content-length") {
                            value.trim().parse::<usize>().ok()
                        } else {
                            None
                        }
                    })
                    .unwrap_or(0);
                if received.len() >= header_end + 4 + content_length {
                    break;
                }
            }
        }
        String::from_utf8_lossy(&received).to_string()
    }

    async fn respond(socket: &mut tokio::net::TcpStream, body: &str) {
        let response = format!(
            "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
            body.len(),
            body
        );
        socket.write_all(response.as_bytes()).await.expect("write");
        socket.flush().await.expect("flush");
    }

    #[tokio::test]
    async fn google_docs_client_performs_two_round_trips() {
        let listener = TcpListener::bind("127.0.0.1:0").await.expect("bind");
        let addr = listener.local_addr().expect("addr");
        let server = tokio::spawn(async move {
            let mut requests = Vec::new();
            for body in [
                r#"{"body":{"content":[{"endIndex":1},{"endIndex":57}]}}"#,
                r#"{"documentId":"doc-1","replies":[{}]}"#,
            ] {
                let (mut socket, _) = listener.accept().await.expect("accept");
                requests.push(read_request(&mut socket).await);
                respond(&mut socket, body).await;
            }
            requests
        });

        let logger = TranscriptLogger::new(
            Arc::new(GoogleDocsClient::new(format!("http://{addr}/v1"))),
            fixed_clock(),
            "doc-1",
        );
        logger.connect("ya29.tok".to_string(), user()).await;
        logger
            .log_message(LogRole::Model, "Hello there", "s9")
            .await
            .expect("logged");

        let requests = server.await.expect("server");
        assert!(requests[0].starts_with("GET /v1/documents/doc-1?fields=body"));
        assert!(requests[0]
            .to_ascii_lowercase()
            .contains("authorization: bearer ya29.tok"));
        assert!(requests[1].starts_with("POST /v1/documents/doc-1:batchUpdate"));
        assert!(requests[1].contains(r#""index":56"#));
        assert!(requests[1].contains("(Session: s9) [MODEL]: Hello there"));
    }
}
