use tracing::debug;

use super::App;
use crate::core::auth_gate::authorize;
use crate::core::chat_stream::{StreamMessage, StreamParams};
use crate::core::message::MessageId;
use crate::core::mode::Mode;
use crate::core::request::Attachment;
use crate::core::session::Credential;
use crate::core::stream_errors::{ChatError, Disposition};

pub enum AppAction {
    StreamStarted { stream_id: u64 },
    AppendResponseChunk { content: String, stream_id: u64 },
    StreamErrored { error: ChatError, stream_id: u64 },
    StreamCompleted { stream_id: u64 },
    CancelStreaming,
    SetMode(Mode),
    Attach(Attachment),
    ClearAttachment,
}

impl AppAction {
    pub fn from_stream_message(message: StreamMessage, stream_id: u64) -> Self {
        match message {
            StreamMessage::Started => AppAction::StreamStarted { stream_id },
            StreamMessage::Chunk(content) => AppAction::AppendResponseChunk { content, stream_id },
            StreamMessage::Error(error) => AppAction::StreamErrored { error, stream_id },
            StreamMessage::End => AppAction::StreamCompleted { stream_id },
        }
    }
}

pub enum AppCommand {
    SpawnStream(StreamParams),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreReason {
    /// Another request for this conversation is still in flight.
    Busy,
    /// Neither text nor an attachment was provided.
    Empty,
}

pub enum SubmitResult {
    Spawn(AppCommand),
    /// Rejected before any I/O; the id is the assistant message explaining why.
    Rejected(MessageId),
    Ignored(IgnoreReason),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExchangeOutcome {
    Completed(MessageId),
    Failed(MessageId),
    Rejected(MessageId),
    Cancelled(Option<MessageId>),
    Ignored(IgnoreReason),
}

impl App {
    /// Start a new exchange with a snapshot of the caller's credential.
    ///
    /// Any selected attachment is consumed by the attempt, whether it ends in
    /// a spawned stream or a pre-flight rejection.
    pub fn submit(&mut self, text: String, credential: Option<Credential>) -> SubmitResult {
        if self.session.is_streaming {
            return SubmitResult::Ignored(IgnoreReason::Busy);
        }
        if text.trim().is_empty() && self.session.attachment.is_none() {
            return SubmitResult::Ignored(IgnoreReason::Empty);
        }

        let attachment = self.session.attachment.take();
        let attachment_name = attachment.as_ref().map(|file| file.name.clone());
        let mode = self.session.mode;

        self.log_transcript(&format!("You: {text}"));
        self.conversation.add_user_message(text.clone(), attachment_name);

        let credential = match authorize(mode, credential.as_ref()) {
            Ok(credential) => credential,
            Err(error) => {
                let id = self.conversation.record_failure(&error.user_message());
                self.log_transcript(&error.user_message());
                self.session.last_outcome = Some(ExchangeOutcome::Rejected(id));
                return SubmitResult::Rejected(id);
            }
        };

        let request = self
            .session
            .request_builder
            .build(&text, attachment, mode, credential.as_ref());
        let (cancel_token, stream_id) = self.start_new_stream();

        SubmitResult::Spawn(AppCommand::SpawnStream(StreamParams {
            client: self.session.client.clone(),
            request,
            read_timeout: self.session.read_timeout,
            cancel_token,
            stream_id,
        }))
    }

    pub fn handle_action(&mut self, action: AppAction) {
        match action {
            AppAction::StreamStarted { stream_id } => {
                if !self.is_current_stream(stream_id) {
                    return;
                }
                self.conversation.open_assistant_message();
            }
            AppAction::AppendResponseChunk { content, stream_id } => {
                if !self.is_current_stream(stream_id) || content.is_empty() {
                    return;
                }
                self.conversation.append_fragment(&content);
            }
            AppAction::StreamErrored { error, stream_id } => {
                if !self.is_current_stream(stream_id) {
                    return;
                }
                self.handle_stream_error(error);
            }
            AppAction::StreamCompleted { stream_id } => {
                if !self.is_current_stream(stream_id) {
                    return;
                }
                self.finalize_stream();
            }
            AppAction::CancelStreaming => self.cancel_current_stream(),
            AppAction::SetMode(mode) => self.session.mode = mode,
            AppAction::Attach(attachment) => self.session.attachment = Some(attachment),
            AppAction::ClearAttachment => self.session.attachment = None,
        }
    }

    fn handle_stream_error(&mut self, error: ChatError) {
        let message = match error.disposition() {
            Disposition::Skip => {
                debug!(%error, "Ignoring non-fatal stream error");
                return;
            }
            Disposition::Terminal(message) => message,
        };

        let id = self.conversation.record_failure(&message);
        self.log_transcript(&message);
        self.session.last_outcome = Some(ExchangeOutcome::Failed(id));
        self.end_streaming();
    }

    fn finalize_stream(&mut self) {
        let outcome = match self.conversation.close_open_message() {
            Some(id) => {
                if let Some(text) = self
                    .conversation
                    .get(id)
                    .map(|message| message.text.clone())
                    .filter(|text| !text.is_empty())
                {
                    self.log_transcript(&text);
                }
                ExchangeOutcome::Completed(id)
            }
            // A 2xx response always opens a message before completing.
            None => {
                let id = self.conversation.add_assistant_message(String::new());
                ExchangeOutcome::Completed(id)
            }
        };
        self.session.last_outcome = Some(outcome);
        self.end_streaming();
    }

    fn cancel_current_stream(&mut self) {
        if !self.session.is_streaming {
            return;
        }
        if let Some(token) = self.session.stream_cancel_token.as_ref() {
            token.cancel();
        }
        let id = self.conversation.record_cancellation();
        self.session.last_outcome = Some(ExchangeOutcome::Cancelled(id));
        self.end_streaming();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::message::Role;
    use crate::core::stream_errors::{ServerDetail, AUTH_REQUIRED_MESSAGE};
    use crate::utils::test_utils::create_test_app;

    fn spawned_stream_id(result: SubmitResult) -> u64 {
        match result {
            SubmitResult::Spawn(AppCommand::SpawnStream(params)) => params.stream_id,
            SubmitResult::Rejected(_) => panic!("unexpected rejection"),
            SubmitResult::Ignored(reason) => panic!("unexpected ignore: {reason:?}"),
        }
    }

    fn credential() -> Option<Credential> {
        Credential::new("abc")
    }

    #[test]
    fn database_mode_without_credential_is_rejected_locally() {
        let mut app = create_test_app();
        app.handle_action(AppAction::Attach(Attachment::new("report.csv", vec![1])));

        let result = app.submit("How many users?".into(), None);
        let id = match result {
            SubmitResult::Rejected(id) => id,
            _ => panic!("expected rejection"),
        };

        assert!(!app.is_streaming());
        assert_eq!(app.session.current_stream_id, 0);
        assert!(app.pending_attachment().is_none());
        let assistants: Vec<_> = app
            .conversation
            .messages()
            .iter()
            .filter(|m| m.role == Role::Assistant)
            .collect();
        assert_eq!(assistants.len(), 1);
        assert_eq!(assistants[0].id, id);
        assert_eq!(assistants[0].text, AUTH_REQUIRED_MESSAGE);
        assert_eq!(app.take_last_outcome(), Some(ExchangeOutcome::Rejected(id)));
    }

    #[test]
    fn submit_builds_request_and_marks_streaming() {
        let mut app = create_test_app();
        app.handle_action(AppAction::Attach(Attachment::new("report.csv", vec![1, 2])));

        let params = match app.submit(String::new(), credential()) {
            SubmitResult::Spawn(AppCommand::SpawnStream(params)) => params,
            _ => panic!("expected spawn"),
        };

        assert!(app.is_streaming());
        assert!(app.pending_attachment().is_none());
        assert_eq!(params.request.body.question, "Analyze this file");
        assert_eq!(params.request.header("Authorization"), Some("Bearer abc"));

        let user = app.conversation.last().expect("user message");
        assert!(user.is_user());
        assert_eq!(user.text, "");
        assert_eq!(user.attachment_name.as_deref(), Some("report.csv"));
    }

    #[test]
    fn second_submit_while_streaming_is_ignored() {
        let mut app = create_test_app();
        spawned_stream_id(app.submit("first".into(), credential()));
        let before = app.conversation.len();

        assert!(matches!(
            app.submit("second".into(), credential()),
            SubmitResult::Ignored(IgnoreReason::Busy)
        ));
        assert_eq!(app.conversation.len(), before);
    }

    #[test]
    fn blank_submit_without_attachment_is_ignored() {
        let mut app = create_test_app();
        assert!(matches!(
            app.submit("   ".into(), credential()),
            SubmitResult::Ignored(IgnoreReason::Empty)
        ));
        assert!(app.conversation.is_empty());
    }

    #[test]
    fn stream_events_accumulate_into_one_assistant_message() {
        let mut app = create_test_app();
        let stream_id = spawned_stream_id(app.submit("Hello".into(), credential()));

        app.handle_action(AppAction::StreamStarted { stream_id });
        for content in ["Hel", "lo"] {
            app.handle_action(AppAction::AppendResponseChunk {
                content: content.into(),
                stream_id,
            });
        }
        app.handle_action(AppAction::StreamCompleted { stream_id });

        assert!(!app.is_streaming());
        let last = app.conversation.last().expect("assistant").clone();
        assert_eq!(last.text, "Hello");
        assert_eq!(
            app.take_last_outcome(),
            Some(ExchangeOutcome::Completed(last.id))
        );
        assert!(!app.conversation.has_open_message());
    }

    #[test]
    fn events_from_stale_streams_are_ignored() {
        let mut app = create_test_app();
        let stream_id = spawned_stream_id(app.submit("Hello".into(), credential()));
        app.handle_action(AppAction::StreamStarted { stream_id });
        app.handle_action(AppAction::AppendResponseChunk {
            content: "kept".into(),
            stream_id,
        });
        app.handle_action(AppAction::StreamCompleted { stream_id });

        app.handle_action(AppAction::AppendResponseChunk {
            content: " late".into(),
            stream_id,
        });
        app.handle_action(AppAction::AppendResponseChunk {
            content: " other".into(),
            stream_id: stream_id + 7,
        });

        assert_eq!(app.conversation.last().map(|m| m.text.as_str()), Some("kept"));
    }

    #[test]
    fn server_error_before_stream_appends_error_message() {
        let mut app = create_test_app();
        let stream_id = spawned_stream_id(app.submit("Hello".into(), credential()));

        app.handle_action(AppAction::StreamErrored {
            error: ChatError::ServerError {
                status: 500,
                detail: ServerDetail::Provided("db down".into()),
            },
            stream_id,
        });

        assert!(!app.is_streaming());
        let last = app.conversation.last().expect("assistant");
        assert!(last.is_assistant());
        assert!(last.text.contains("db down"));
        assert!(matches!(
            app.take_last_outcome(),
            Some(ExchangeOutcome::Failed(_))
        ));
    }

    #[test]
    fn mid_stream_failure_keeps_partial_text() {
        let mut app = create_test_app();
        let stream_id = spawned_stream_id(app.submit("Hello".into(), credential()));
        app.handle_action(AppAction::StreamStarted { stream_id });
        app.handle_action(AppAction::AppendResponseChunk {
            content: "Partial".into(),
            stream_id,
        });
        app.handle_action(AppAction::StreamErrored {
            error: ChatError::stream_interrupted("connection reset"),
            stream_id,
        });

        let assistants: Vec<_> = app
            .conversation
            .messages()
            .iter()
            .filter(|m| m.is_assistant())
            .collect();
        assert_eq!(assistants.len(), 1);
        assert!(assistants[0].text.starts_with("Partial\n\n---\nError: Network error"));
    }

    #[test]
    fn cancel_stops_stream_and_ignores_later_events() {
        let mut app = create_test_app();
        let stream_id = spawned_stream_id(app.submit("Hello".into(), credential()));
        let token = app
            .session
            .stream_cancel_token
            .clone()
            .expect("cancel token");
        app.handle_action(AppAction::StreamStarted { stream_id });
        app.handle_action(AppAction::CancelStreaming);

        assert!(token.is_cancelled());
        assert!(!app.is_streaming());
        app.handle_action(AppAction::AppendResponseChunk {
            content: "too late".into(),
            stream_id,
        });
        assert_eq!(
            app.conversation.last().map(|m| m.text.as_str()),
            Some(crate::core::conversation::CANCELLED_NOTE)
        );

        spawned_stream_id(app.submit("Again".into(), credential()));
    }

    #[test]
    fn non_fatal_stream_errors_do_not_end_the_stream() {
        let mut app = create_test_app();
        let stream_id = spawned_stream_id(app.submit("Hello".into(), credential()));
        app.handle_action(AppAction::StreamErrored {
            error: ChatError::StreamParse {
                reason: "bad frame".into(),
            },
            stream_id,
        });
        assert!(app.is_streaming());
    }

    #[test]
    fn general_mode_sends_without_credential() {
        let mut app = create_test_app();
        app.handle_action(AppAction::SetMode(Mode::General));
        let params = match app.submit("Hello".into(), None) {
            SubmitResult::Spawn(AppCommand::SpawnStream(params)) => params,
            _ => panic!("expected spawn"),
        };
        assert!(params.request.header("Authorization").is_none());
        assert_eq!(params.request.body.mode, Mode::General);
    }
}
