//! Failure taxonomy for a chat exchange.
//!
//! Every failure an exchange can hit, from the pre-flight auth check down to
//! a single malformed frame, is classified here and resolved into either a
//! silent skip or exactly one terminal, user-visible message.

use reqwest::StatusCode;
use serde_json::Value;
use std::error::Error;
use std::fmt;

use crate::api::ServerErrorBody;

pub const AUTH_REQUIRED_MESSAGE: &str = "⚠️ **Authentication Required**\n\nTo access real data, I need a secure connection to the database. Please sign in (run `datachat auth` or pass `--token`) or check your configuration.";

const NETWORK_ERROR_MESSAGE: &str =
    "Network error: Unable to connect to the server. Please check your connection and try again.";

const GENERIC_SERVER_DETAIL: &str = "Server error occurred";
const UNPARSEABLE_SERVER_DETAIL: &str = "Unable to parse server error response";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChatErrorKind {
    AuthRequired,
    NetworkUnreachable,
    ServerError,
    StreamParseError,
}

impl ChatErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ChatErrorKind::AuthRequired => "auth_required",
            ChatErrorKind::NetworkUnreachable => "network_unreachable",
            ChatErrorKind::ServerError => "server_error",
            ChatErrorKind::StreamParseError => "stream_parse_error",
        }
    }

    pub fn is_user_visible(self) -> bool {
        !matches!(self, ChatErrorKind::StreamParseError)
    }

    pub fn is_fatal(self) -> bool {
        !matches!(self, ChatErrorKind::StreamParseError)
    }
}

/// What the server told us about a non-2xx response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServerDetail {
    Provided(String),
    Missing,
    Unparseable,
}

impl ServerDetail {
    fn as_text(&self) -> &str {
        match self {
            ServerDetail::Provided(detail) => detail,
            ServerDetail::Missing => GENERIC_SERVER_DETAIL,
            ServerDetail::Unparseable => UNPARSEABLE_SERVER_DETAIL,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatError {
    AuthRequired,
    NetworkUnreachable { reason: Option<String> },
    ServerError { status: u16, detail: ServerDetail },
    StreamParse { reason: String },
}

/// How a classified failure is resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Disposition {
    /// Logged and ignored; the stream keeps going.
    Skip,
    /// Ends the exchange with this assistant-visible text.
    Terminal(String),
}

impl ChatError {
    pub fn kind(&self) -> ChatErrorKind {
        match self {
            ChatError::AuthRequired => ChatErrorKind::AuthRequired,
            ChatError::NetworkUnreachable { .. } => ChatErrorKind::NetworkUnreachable,
            ChatError::ServerError { .. } => ChatErrorKind::ServerError,
            ChatError::StreamParse { .. } => ChatErrorKind::StreamParseError,
        }
    }

    pub fn stream_interrupted(reason: impl fmt::Display) -> Self {
        ChatError::NetworkUnreachable {
            reason: Some(format!("The response stream was interrupted: {reason}")),
        }
    }

    pub fn read_timed_out() -> Self {
        ChatError::NetworkUnreachable {
            reason: Some("Timed out waiting for the server to send more data.".to_string()),
        }
    }

    /// Text shown to the user in place of (or after) the assistant reply.
    pub fn user_message(&self) -> String {
        match self {
            ChatError::AuthRequired => AUTH_REQUIRED_MESSAGE.to_string(),
            ChatError::NetworkUnreachable { reason: None } => {
                format!("Error: {NETWORK_ERROR_MESSAGE}")
            }
            ChatError::NetworkUnreachable {
                reason: Some(reason),
            } => format!("Error: {NETWORK_ERROR_MESSAGE}\n{reason}"),
            ChatError::ServerError { status, detail } => format!(
                "Error: Server responded with status {status}. {}",
                detail.as_text()
            ),
            ChatError::StreamParse { reason } => format!("Skipped malformed frame: {reason}"),
        }
    }

    pub fn disposition(&self) -> Disposition {
        if self.kind().is_fatal() {
            Disposition::Terminal(self.user_message())
        } else {
            Disposition::Skip
        }
    }
}

impl fmt::Display for ChatError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChatError::AuthRequired => write!(f, "authentication required for database mode"),
            ChatError::NetworkUnreachable { reason: None } => write!(f, "network unreachable"),
            ChatError::NetworkUnreachable {
                reason: Some(reason),
            } => write!(f, "network unreachable: {reason}"),
            ChatError::ServerError { status, detail } => {
                write!(f, "server error {status}: {}", detail.as_text())
            }
            ChatError::StreamParse { reason } => write!(f, "malformed stream frame: {reason}"),
        }
    }
}

impl Error for ChatError {}

/// Classify a failure that happened before any response arrived.
pub fn classify_transport_error(err: &reqwest::Error) -> ChatError {
    let reason = if err.is_timeout() {
        Some("The request timed out.".to_string())
    } else if err.is_builder() {
        Some(format!("The request could not be built: {err}"))
    } else {
        None
    };
    ChatError::NetworkUnreachable { reason }
}

/// Classify a non-2xx response from its status and raw body.
pub fn classify_server_response(status: StatusCode, body: &str) -> ChatError {
    ChatError::ServerError {
        status: status.as_u16(),
        detail: extract_server_detail(body),
    }
}

fn extract_server_detail(body: &str) -> ServerDetail {
    let Ok(parsed) = serde_json::from_str::<ServerErrorBody>(body.trim()) else {
        return ServerDetail::Unparseable;
    };

    match parsed.detail {
        Some(Value::String(detail)) if !detail.trim().is_empty() => ServerDetail::Provided(detail),
        Some(Value::Null) | None => ServerDetail::Missing,
        Some(Value::String(_)) => ServerDetail::Missing,
        Some(other) => ServerDetail::Provided(other.to_string()),
    }
}
