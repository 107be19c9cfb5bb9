use std::future::Future;
use tokio::sync::mpsc;
use tracing::debug;

use super::{App, AppAction, AppCommand, ExchangeOutcome, SubmitResult};
use crate::core::chat_stream::{ChatStreamService, StreamMessage};
use crate::core::session::Credential;
use crate::core::stream_errors::ChatError;

/// Drive one exchange to its terminal state.
///
/// `on_fragment` sees every fragment accepted into the conversation, in
/// order. Resolving `interrupt` cancels the stream; the conversation keeps
/// whatever text arrived before it.
pub async fn run_exchange<F>(
    app: &mut App,
    service: &ChatStreamService,
    rx: &mut mpsc::UnboundedReceiver<(StreamMessage, u64)>,
    text: String,
    credential: Option<Credential>,
    interrupt: F,
    mut on_fragment: impl FnMut(&str),
) -> ExchangeOutcome
where
    F: Future<Output = ()>,
{
    let params = match app.submit(text, credential) {
        SubmitResult::Spawn(AppCommand::SpawnStream(params)) => params,
        SubmitResult::Rejected(id) => return take_outcome(app, ExchangeOutcome::Rejected(id)),
        SubmitResult::Ignored(reason) => return ExchangeOutcome::Ignored(reason),
    };
    let stream_id = params.stream_id;
    let _handle = service.spawn_stream(params);

    tokio::pin!(interrupt);
    loop {
        tokio::select! {
            received = rx.recv() => {
                let Some((message, id)) = received else {
                    // Every sender is gone without a terminal event.
                    app.handle_action(AppAction::StreamErrored {
                        error: ChatError::stream_interrupted("stream task ended unexpectedly"),
                        stream_id,
                    });
                    break;
                };
                if let StreamMessage::Chunk(fragment) = &message {
                    if app.is_current_stream(id) && app.conversation.has_open_message() {
                        on_fragment(fragment);
                    }
                }
                app.handle_action(AppAction::from_stream_message(message, id));
            }
            _ = &mut interrupt => {
                debug!(stream_id, "Exchange interrupted");
                app.handle_action(AppAction::CancelStreaming);
            }
        }

        if !app.is_streaming() {
            break;
        }
    }

    let fallback = ExchangeOutcome::Cancelled(app.conversation.open_message_id());
    take_outcome(app, fallback)
}

fn take_outcome(app: &mut App, fallback: ExchangeOutcome) -> ExchangeOutcome {
    app.take_last_outcome().unwrap_or(fallback)
}
