use std::fmt;
use std::io::{self, BufRead, Write};

const TOKEN_PROMPT: &str = "Paste your bearer token: ";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationChoice {
    Yes,
    No,
}

#[derive(Debug, Clone)]
pub struct UiError {
    message: String,
}

impl UiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for UiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for UiError {}

fn read_line(prompt: &str, input: &mut impl BufRead) -> Result<String, UiError> {
    print!("{prompt}");
    io::stdout()
        .flush()
        .map_err(|err| UiError::new(err.to_string()))?;

    let mut line = String::new();
    let read = input
        .read_line(&mut line)
        .map_err(|err| UiError::new(err.to_string()))?;
    if read == 0 {
        return Err(UiError::new("Input closed"));
    }
    Ok(line)
}

pub fn parse_token_input(input: &str) -> Result<String, UiError> {
    let trimmed = input.trim();
    let token = trimmed.strip_prefix("Bearer ").unwrap_or(trimmed).trim();
    if token.is_empty() {
        return Err(UiError::new("Token cannot be empty"));
    }
    if token.chars().any(char::is_whitespace) {
        return Err(UiError::new("Token cannot contain whitespace"));
    }
    Ok(token.to_string())
}

pub fn parse_confirmation(input: &str) -> Result<ConfirmationChoice, UiError> {
    let trimmed = input.trim().to_lowercase();
    if trimmed.is_empty() {
        return Ok(ConfirmationChoice::No);
    }
    match trimmed.as_str() {
        "y" | "yes" => Ok(ConfirmationChoice::Yes),
        "n" | "no" => Ok(ConfirmationChoice::No),
        _ => Err(UiError::new("Invalid confirmation response")),
    }
}

pub fn prompt_token() -> Result<String, UiError> {
    println!("🔐 Datachat Authentication");
    println!("━━━━━━━━━━━━━━━━━━━━━━━━━━");
    println!("Database mode sends this token as a bearer credential.");
    println!();

    let line = read_line(TOKEN_PROMPT, &mut io::stdin().lock())?;
    parse_token_input(&line)
}

pub fn prompt_confirmation(question: &str) -> Result<ConfirmationChoice, UiError> {
    let line = read_line(&format!("{question} [y/N]: "), &mut io::stdin().lock())?;
    parse_confirmation(&line)
}
