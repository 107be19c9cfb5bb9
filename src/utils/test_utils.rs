use crate::core::app::App;
use crate::core::config::ClientSettings;
use crate::core::mode::Mode;
use crate::utils::logging::LoggingState;

/// Base URL that refuses connections on any sane host.
pub const UNREACHABLE_BASE: &str = "http://127.0.0.1:9";

pub fn test_settings() -> ClientSettings {
    ClientSettings {
        api_base: UNREACHABLE_BASE.to_string(),
        default_mode: Mode::Database,
        connect_timeout: None,
        read_timeout: None,
        greeting: None,
    }
}

pub fn create_test_app() -> App {
    let client = reqwest::Client::builder()
        .no_proxy()
        .build()
        .expect("test client should build");
    App::new(&test_settings(), client, LoggingState::disabled())
}
