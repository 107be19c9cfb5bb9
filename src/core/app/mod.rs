//! Conversation controller.
//!
//! [`App`] is the single writer of the conversation. Front ends submit
//! messages and forward stream events to it; it answers with commands (such
//! as spawning a stream) that the caller executes.

mod actions;
mod exchange;

pub use actions::{AppAction, AppCommand, ExchangeOutcome, IgnoreReason, SubmitResult};
pub use exchange::run_exchange;

use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::warn;

use crate::core::config::ClientSettings;
use crate::core::conversation::Conversation;
use crate::core::mode::Mode;
use crate::core::request::{Attachment, RequestBuilder};
use crate::utils::logging::LoggingState;

pub struct SessionContext {
    pub client: reqwest::Client,
    pub request_builder: RequestBuilder,
    pub mode: Mode,
    pub attachment: Option<Attachment>,
    pub read_timeout: Option<Duration>,
    pub logging: LoggingState,
    pub is_streaming: bool,
    pub current_stream_id: u64,
    pub stream_cancel_token: Option<CancellationToken>,
    pub last_outcome: Option<ExchangeOutcome>,
}

pub struct App {
    pub conversation: Conversation,
    pub session: SessionContext,
}

impl App {
    pub fn new(settings: &ClientSettings, client: reqwest::Client, logging: LoggingState) -> Self {
        Self {
            conversation: Conversation::with_greeting(settings.greeting.as_deref()),
            session: SessionContext {
                client,
                request_builder: RequestBuilder::new(&settings.api_base),
                mode: settings.default_mode,
                attachment: None,
                read_timeout: settings.read_timeout,
                logging,
                is_streaming: false,
                current_stream_id: 0,
                stream_cancel_token: None,
                last_outcome: None,
            },
        }
    }

    pub fn mode(&self) -> Mode {
        self.session.mode
    }

    pub fn is_streaming(&self) -> bool {
        self.session.is_streaming
    }

    pub fn pending_attachment(&self) -> Option<&Attachment> {
        self.session.attachment.as_ref()
    }

    pub fn is_current_stream(&self, stream_id: u64) -> bool {
        self.session.is_streaming && self.session.current_stream_id == stream_id
    }

    pub fn take_last_outcome(&mut self) -> Option<ExchangeOutcome> {
        self.session.last_outcome.take()
    }

    fn start_new_stream(&mut self) -> (CancellationToken, u64) {
        if let Some(previous) = self.session.stream_cancel_token.take() {
            previous.cancel();
        }
        let token = CancellationToken::new();
        self.session.current_stream_id += 1;
        self.session.stream_cancel_token = Some(token.clone());
        self.session.is_streaming = true;
        (token, self.session.current_stream_id)
    }

    fn end_streaming(&mut self) {
        self.session.is_streaming = false;
        self.session.stream_cancel_token = None;
    }

    fn log_transcript(&self, content: &str) {
        if let Err(err) = self.session.logging.log_message(content) {
            warn!(error = %err, "Failed to write transcript");
        }
    }
}
