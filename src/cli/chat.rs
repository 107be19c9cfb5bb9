//! Line-oriented interactive chat.

use std::error::Error;
use std::io::{self, Write};
use std::str::FromStr;

use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc::UnboundedReceiver;
use tracing::debug;

use crate::cli::ask::{failure_text, interrupt_signal};
use crate::core::app::{run_exchange, App, AppAction, ExchangeOutcome, IgnoreReason};
use crate::core::chat_stream::{ChatStreamService, StreamMessage};
use crate::core::mode::Mode;
use crate::core::request::Attachment;
use crate::core::session::{Credential, SessionProvider, StaticSession};

const HELP_TEXT: &str = "Commands:\n\
  /mode [general|database]  Show or switch the mode\n\
  /attach <path>            Attach a file to the next question\n\
  /detach                   Drop the pending attachment\n\
  /token <value>            Use a bearer token for this session\n\
  /signout                  Forget the session token\n\
  /log [filename]           Start logging, or toggle pause/resume\n\
  /help                     Show this help\n\
  /quit                     Leave the chat\n\
Ctrl+C cancels an answer while it streams.";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChatCommand {
    Ask(String),
    ShowMode,
    SetMode(Mode),
    Attach(String),
    Detach,
    SignIn(String),
    SignOut,
    Log(Option<String>),
    Help,
    Quit,
    Invalid(String),
}

pub fn parse_command(line: &str) -> ChatCommand {
    let trimmed = line.trim();
    let Some(rest) = trimmed.strip_prefix('/') else {
        return ChatCommand::Ask(line.to_string());
    };

    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, Some(arg.trim()).filter(|arg| !arg.is_empty())),
        None => (rest, None),
    };

    match (name, arg) {
        ("mode", None) => ChatCommand::ShowMode,
        ("mode", Some(value)) => match Mode::from_str(value) {
            Ok(mode) => ChatCommand::SetMode(mode),
            Err(err) => ChatCommand::Invalid(err),
        },
        ("attach", Some(path)) => ChatCommand::Attach(path.to_string()),
        ("attach", None) => ChatCommand::Invalid("Usage: /attach <path>".to_string()),
        ("detach", _) => ChatCommand::Detach,
        ("token", Some(token)) => ChatCommand::SignIn(token.to_string()),
        ("token", None) => ChatCommand::Invalid("Usage: /token <value>".to_string()),
        ("signout", _) => ChatCommand::SignOut,
        ("log", file) => ChatCommand::Log(file.map(str::to_string)),
        ("help", _) => ChatCommand::Help,
        ("quit" | "exit", _) => ChatCommand::Quit,
        (other, _) => ChatCommand::Invalid(format!("Unknown command: /{other}. Try /help.")),
    }
}

fn prompt(app: &App) {
    let attachment = app
        .pending_attachment()
        .map(|file| format!(" 📎 {}", file.name))
        .unwrap_or_default();
    print!("[{}]{attachment} > ", app.mode());
    let _ = io::stdout().flush();
}

pub async fn run_chat(mut app: App, session: StaticSession) -> Result<(), Box<dyn Error>> {
    for message in app.conversation.messages() {
        println!("{}\n", message.text);
    }
    println!("Type /help for commands.\n");

    let (service, mut rx) = ChatStreamService::new();
    let mut sign_ins = session.subscribe();
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        prompt(&app);
        let line = tokio::select! {
            line = lines.next_line() => line?,
            _ = interrupt_signal() => None,
        };
        let Some(line) = line else {
            println!();
            break;
        };

        match parse_command(&line) {
            ChatCommand::Ask(text) => {
                let credential = session.current_credential().await;
                ask(&mut app, &service, &mut rx, text, credential).await;
            }
            ChatCommand::ShowMode => println!("Mode: {}", app.mode().display_name()),
            ChatCommand::SetMode(mode) => {
                app.handle_action(AppAction::SetMode(mode));
                println!("Switched to {} mode.", mode.display_name());
            }
            ChatCommand::Attach(path) => match Attachment::from_path(&path).await {
                Ok(attachment) => {
                    println!("Attached {} ({} bytes).", attachment.name, attachment.bytes.len());
                    app.handle_action(AppAction::Attach(attachment));
                }
                Err(err) => eprintln!("❌ {err}"),
            },
            ChatCommand::Detach => {
                app.handle_action(AppAction::ClearAttachment);
                println!("Attachment cleared.");
            }
            ChatCommand::SignIn(token) => match Credential::new(token) {
                Some(credential) => session.sign_in(credential),
                None => eprintln!("❌ Token cannot be empty"),
            },
            ChatCommand::SignOut => session.sign_out(),
            ChatCommand::Log(file) => {
                let result = match file {
                    Some(path) => app.session.logging.set_log_file(path),
                    None => app.session.logging.toggle_logging(),
                };
                match result {
                    Ok(message) => println!("{message}"),
                    Err(err) => eprintln!("❌ {err}"),
                }
            }
            ChatCommand::Help => println!("{HELP_TEXT}"),
            ChatCommand::Quit => break,
            ChatCommand::Invalid(message) => eprintln!("{message}"),
        }

        if sign_ins.has_changed().unwrap_or(false) {
            let signed_in = sign_ins.borrow_and_update().is_some();
            debug!(signed_in, "Session credential changed");
            if signed_in {
                println!("🔐 Signed in. Database mode is available.");
            } else {
                println!("Signed out.");
            }
        }
    }

    Ok(())
}

async fn ask(
    app: &mut App,
    service: &ChatStreamService,
    rx: &mut UnboundedReceiver<(StreamMessage, u64)>,
    text: String,
    credential: Option<Credential>,
) {
    let mut printed = String::new();
    let outcome = run_exchange(app, service, rx, text, credential, interrupt_signal(), |fragment| {
        printed.push_str(fragment);
        print!("{fragment}");
        let _ = io::stdout().flush();
    })
    .await;

    match outcome {
        ExchangeOutcome::Completed(_) => println!("\n"),
        ExchangeOutcome::Failed(id) | ExchangeOutcome::Rejected(id) => {
            if !printed.is_empty() {
                println!();
            }
            if let Some(message) = app.conversation.get(id) {
                println!("{}\n", failure_text(&message.text, &printed));
            }
        }
        ExchangeOutcome::Cancelled(_) => println!("\n(response cancelled)\n"),
        ExchangeOutcome::Ignored(IgnoreReason::Empty) => {}
        ExchangeOutcome::Ignored(IgnoreReason::Busy) => {
            eprintln!("Still answering the previous question.")
        }
    }
}
