//! Non-interactive "ask" command

use std::error::Error;
use std::io::{self, Write};
use std::path::PathBuf;

use crate::core::app::{run_exchange, App, AppAction, ExchangeOutcome};
use crate::core::chat_stream::ChatStreamService;
use crate::core::conversation::ERROR_SUFFIX_SEPARATOR;
use crate::core::request::Attachment;
use crate::core::session::{SessionProvider, StaticSession};

pub async fn run_ask(
    mut app: App,
    session: StaticSession,
    question: String,
    file: Option<PathBuf>,
) -> Result<(), Box<dyn Error>> {
    if question.trim().is_empty() && file.is_none() {
        eprintln!("Usage: datachat ask [--file <PATH>] <question>");
        std::process::exit(1);
    }

    if let Some(path) = file {
        let attachment = Attachment::from_path(&path).await?;
        app.handle_action(AppAction::Attach(attachment));
    }

    let credential = session.current_credential().await;
    let (service, mut rx) = ChatStreamService::new();
    let mut printed = String::new();

    let outcome = run_exchange(
        &mut app,
        &service,
        &mut rx,
        question,
        credential,
        interrupt_signal(),
        |fragment| {
            printed.push_str(fragment);
            print!("{fragment}");
            let _ = io::stdout().flush();
        },
    )
    .await;

    match outcome {
        ExchangeOutcome::Completed(_) => {
            println!();
            Ok(())
        }
        ExchangeOutcome::Failed(id) | ExchangeOutcome::Rejected(id) => {
            if !printed.is_empty() {
                println!();
            }
            let text = app
                .conversation
                .get(id)
                .map(|message| message.text.as_str())
                .unwrap_or_default();
            eprintln!("{}", failure_text(text, &printed));
            std::process::exit(1);
        }
        ExchangeOutcome::Cancelled(_) => {
            eprintln!("\n(response cancelled)");
            std::process::exit(130);
        }
        ExchangeOutcome::Ignored(reason) => Err(format!("Question was not sent: {reason:?}").into()),
    }
}

/// Resolves on Ctrl+C. Never resolves if the handler cannot be installed.
pub(crate) async fn interrupt_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        std::future::pending::<()>().await;
    }
}

/// The part of a failed assistant message that was not already streamed.
pub(crate) fn failure_text<'a>(message_text: &'a str, streamed: &str) -> &'a str {
    if streamed.is_empty() {
        return message_text;
    }
    message_text
        .strip_prefix(streamed)
        .and_then(|rest| rest.strip_prefix(ERROR_SUFFIX_SEPARATOR))
        .unwrap_or(message_text)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn failure_text_strips_streamed_prefix() {
        assert_eq!(
            failure_text("Partial\n\n---\nError: Network error", "Partial"),
            "Error: Network error"
        );
    }

    #[test]
    fn failure_text_without_stream_is_whole_message() {
        assert_eq!(failure_text("Error: boom", ""), "Error: boom");
        assert_eq!(failure_text("Error: boom", "other"), "Error: boom");
    }
}
