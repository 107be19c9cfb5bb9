use chrono::Local;
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::Path;

/// Append-only transcript of the conversation, written as plain text.
pub struct LoggingState {
    file_path: Option<String>,
    is_active: bool,
}

impl LoggingState {
    pub fn new(log_file: Option<String>) -> Result<Self, Box<dyn std::error::Error>> {
        let mut logging = LoggingState {
            file_path: None,
            is_active: false,
        };

        if let Some(path) = log_file {
            logging.set_log_file(path)?;
        }

        Ok(logging)
    }

    pub fn disabled() -> Self {
        LoggingState {
            file_path: None,
            is_active: false,
        }
    }

    pub fn set_log_file(&mut self, path: String) -> Result<String, Box<dyn std::error::Error>> {
        self.test_file_access(&path)?;

        self.file_path = Some(path.clone());
        self.is_active = true;
        self.log_message(&format!(
            "## Logging started {}",
            Local::now().format("%Y-%m-%d %H:%M:%S")
        ))?;

        Ok(format!("Logging enabled to: {path}"))
    }

    pub fn toggle_logging(&mut self) -> Result<String, Box<dyn std::error::Error>> {
        match &self.file_path {
            Some(path) => {
                if self.is_active {
                    self.log_message("## Logging paused")?;
                    self.is_active = false;
                    Ok(format!("Logging paused (file: {path})"))
                } else {
                    self.is_active = true;
                    Ok(format!("Logging resumed to: {path}"))
                }
            }
            None => {
                Err("No log file specified. Use /log <filename> to enable logging first.".into())
            }
        }
    }

    pub fn log_message(&self, content: &str) -> Result<(), Box<dyn std::error::Error>> {
        let (true, Some(file_path)) = (self.is_active, self.file_path.as_ref()) else {
            return Ok(());
        };

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(file_path)?;
        let mut writer = BufWriter::new(file);

        for line in content.lines() {
            writeln!(writer, "{line}")?;
        }

        // Blank line between entries
        writeln!(writer)?;

        writer.flush()?;
        Ok(())
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn get_status_string(&self) -> String {
        match (&self.file_path, self.is_active) {
            (None, _) => "disabled".to_string(),
            (Some(path), true) => format!(
                "active ({})",
                Path::new(path)
                    .file_name()
                    .unwrap_or_default()
                    .to_string_lossy()
            ),
            (Some(path), false) => format!(
                "paused ({})",
                Path::new(path)
                    .file_name()
                    .unwrap_or_default()
                    .to_string_lossy()
            ),
        }
    }

    fn test_file_access(&self, path: &str) -> Result<(), Box<dyn std::error::Error>> {
        let mut file = OpenOptions::new().create(true).append(true).open(path)?;
        file.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn writes_entries_separated_by_blank_lines() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("chat.log");
        let logging =
            LoggingState::new(Some(path.to_string_lossy().into_owned())).expect("logging");

        logging.log_message("You: hi").expect("log user");
        logging.log_message("line one\nline two").expect("log reply");

        let contents = std::fs::read_to_string(&path).expect("read log");
        assert!(contents.starts_with("## Logging started "));
        assert!(contents.ends_with("You: hi\n\nline one\nline two\n\n"));
        assert_eq!(logging.get_status_string(), "active (chat.log)");
    }

    #[test]
    fn paused_logging_writes_nothing() {
        let dir = TempDir::new().expect("tempdir");
        let path = dir.path().join("chat.log");
        let mut logging =
            LoggingState::new(Some(path.to_string_lossy().into_owned())).expect("logging");

        let message = logging.toggle_logging().expect("pause");
        assert!(message.starts_with("Logging paused"));
        logging.log_message("hidden").expect("no-op");

        let contents = std::fs::read_to_string(&path).expect("read log");
        assert!(!contents.contains("hidden"));
        assert!(contents.contains("## Logging paused"));
        assert_eq!(logging.get_status_string(), "paused (chat.log)");
    }

    #[test]
    fn toggle_without_file_is_an_error() {
        let mut logging = LoggingState::disabled();
        assert!(logging.toggle_logging().is_err());
        assert_eq!(logging.get_status_string(), "disabled");
        assert!(logging.log_message("ignored").is_ok());
    }
}
