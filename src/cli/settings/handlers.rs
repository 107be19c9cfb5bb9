//! Handlers for each configuration key.

use std::str::FromStr;

use super::error::SettingError;
use super::helpers::{format_bool, mutate_config, parse_bool, success_set};
use super::{SetContext, SettingHandler};
use crate::core::config::data::{Config, DEFAULT_GREETING};
use crate::core::mode::Mode;
use crate::utils::url::normalize_base_url;

/// Data-driven handler for base-URL settings.
pub struct UrlHandler {
    key: &'static str,
    example: &'static str,
    default_display: &'static str,
    get: fn(&Config) -> Option<&String>,
    set_field: fn(&mut Config, Option<String>),
}

impl SettingHandler for UrlHandler {
    fn key(&self) -> &'static str {
        self.key
    }

    fn set(&self, args: &[String], ctx: &SetContext) -> Result<String, SettingError> {
        let [input] = args else {
            return Err(SettingError::MissingArgs {
                hint: "Specify a single base URL:",
                example: self.example,
            });
        };
        let url = normalize_base_url(input);
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(SettingError::InvalidValue {
                key: self.key,
                input: input.clone(),
                expected: "an http:// or https:// URL",
            });
        }

        let message = success_set(self.key, &url);
        let set_field = self.set_field;
        mutate_config(ctx, move |config| {
            set_field(config, Some(url));
            Ok(())
        })?;
        Ok(message)
    }

    fn unset(&self, ctx: &SetContext) -> Result<String, SettingError> {
        let set_field = self.set_field;
        mutate_config(ctx, move |config| {
            set_field(config, None);
            Ok(())
        })?;
        Ok(format!("✅ Unset {}", self.key))
    }

    fn format(&self, config: &Config) -> String {
        match (self.get)(config) {
            Some(url) => format!("  {}: {url}", self.key),
            None => format!("  {}: (unset, {})", self.key, self.default_display),
        }
    }
}

pub fn api_url_handler() -> UrlHandler {
    UrlHandler {
        key: "api-url",
        example: "datachat set api-url https://dash.example.com",
        default_display: "falls back to backend-url",
        get: |c| c.api_url.as_ref(),
        set_field: |c, v| c.api_url = v,
    }
}

pub fn backend_url_handler() -> UrlHandler {
    UrlHandler {
        key: "backend-url",
        example: "datachat set backend-url https://backend.example.com",
        default_display: "falls back to the development proxy",
        get: |c| c.backend_url.as_ref(),
        set_field: |c, v| c.backend_url = v,
    }
}

/// Handler for the `development` flag.
pub struct BooleanHandler {
    key: &'static str,
    hint: &'static str,
    example: &'static str,
    default_display: &'static str,
    get: fn(&Config) -> Option<bool>,
    set_field: fn(&mut Config, Option<bool>),
}

impl SettingHandler for BooleanHandler {
    fn key(&self) -> &'static str {
        self.key
    }

    fn set(&self, args: &[String], ctx: &SetContext) -> Result<String, SettingError> {
        if args.is_empty() {
            return Err(SettingError::MissingArgs {
                hint: self.hint,
                example: self.example,
            });
        }

        let input = args.join(" ");
        let value = parse_bool(&input).ok_or(SettingError::InvalidValue {
            key: self.key,
            input,
            expected: "on or off (also accepts true/false, yes/no)",
        })?;
        let set_field = self.set_field;

        mutate_config(ctx, move |config| {
            set_field(config, Some(value));
            Ok(())
        })?;

        Ok(success_set(self.key, format_bool(value)))
    }

    fn unset(&self, ctx: &SetContext) -> Result<String, SettingError> {
        let set_field = self.set_field;
        mutate_config(ctx, move |config| {
            set_field(config, None);
            Ok(())
        })?;

        Ok(format!(
            "✅ Unset {} (will use default: {})",
            self.key, self.default_display
        ))
    }

    fn format(&self, config: &Config) -> String {
        match (self.get)(config) {
            Some(value) => format!("  {}: {}", self.key, format_bool(value)),
            None => format!("  {}: (unset, default: {})", self.key, self.default_display),
        }
    }
}

pub fn development_handler() -> BooleanHandler {
    BooleanHandler {
        key: "development",
        hint: "To use the local development proxy when no URL is set, specify on or off:",
        example: "datachat set development on",
        default_display: if cfg!(debug_assertions) { "on" } else { "off" },
        get: |c| c.development,
        set_field: |c, v| c.development = v,
    }
}

/// Handler for whole-second timeouts. Zero disables the timeout.
pub struct SecondsHandler {
    key: &'static str,
    example: &'static str,
    get: fn(&Config) -> Option<u64>,
    set_field: fn(&mut Config, Option<u64>),
}

impl SettingHandler for SecondsHandler {
    fn key(&self) -> &'static str {
        self.key
    }

    fn set(&self, args: &[String], ctx: &SetContext) -> Result<String, SettingError> {
        let [input] = args else {
            return Err(SettingError::MissingArgs {
                hint: "Specify a number of seconds (0 disables the timeout):",
                example: self.example,
            });
        };
        let seconds = input
            .trim()
            .trim_end_matches('s')
            .parse::<u64>()
            .map_err(|_| SettingError::InvalidValue {
                key: self.key,
                input: input.clone(),
                expected: "a whole number of seconds",
            })?;

        let set_field = self.set_field;
        mutate_config(ctx, move |config| {
            set_field(config, Some(seconds));
            Ok(())
        })?;
        Ok(success_set(self.key, &format_seconds(seconds)))
    }

    fn unset(&self, ctx: &SetContext) -> Result<String, SettingError> {
        let set_field = self.set_field;
        mutate_config(ctx, move |config| {
            set_field(config, None);
            Ok(())
        })?;
        Ok(format!("✅ Unset {} (no timeout)", self.key))
    }

    fn format(&self, config: &Config) -> String {
        match (self.get)(config) {
            Some(seconds) => format!("  {}: {}", self.key, format_seconds(seconds)),
            None => format!("  {}: (unset, no timeout)", self.key),
        }
    }
}

fn format_seconds(seconds: u64) -> String {
    if seconds == 0 {
        "disabled".to_string()
    } else {
        format!("{seconds}s")
    }
}

pub fn connect_timeout_handler() -> SecondsHandler {
    SecondsHandler {
        key: "connect-timeout",
        example: "datachat set connect-timeout 10",
        get: |c| c.connect_timeout_secs,
        set_field: |c, v| c.connect_timeout_secs = v,
    }
}

pub fn read_timeout_handler() -> SecondsHandler {
    SecondsHandler {
        key: "read-timeout",
        example: "datachat set read-timeout 60",
        get: |c| c.read_timeout_secs,
        set_field: |c, v| c.read_timeout_secs = v,
    }
}

/// Handler for the `default-mode` setting.
pub struct DefaultModeHandler;

impl SettingHandler for DefaultModeHandler {
    fn key(&self) -> &'static str {
        "default-mode"
    }

    fn set(&self, args: &[String], ctx: &SetContext) -> Result<String, SettingError> {
        let [input] = args else {
            return Err(SettingError::MissingArgs {
                hint: "Specify general or database:",
                example: "datachat set default-mode general",
            });
        };
        let mode = Mode::from_str(input).map_err(|_| SettingError::InvalidValue {
            key: "default-mode",
            input: input.clone(),
            expected: "general or database",
        })?;

        mutate_config(ctx, move |config| {
            config.default_mode = Some(mode);
            Ok(())
        })?;
        Ok(success_set("default-mode", mode.as_str()))
    }

    fn unset(&self, ctx: &SetContext) -> Result<String, SettingError> {
        mutate_config(ctx, |config| {
            config.default_mode = None;
            Ok(())
        })?;
        Ok(format!(
            "✅ Unset default-mode (will use default: {})",
            Mode::default()
        ))
    }

    fn format(&self, config: &Config) -> String {
        match config.default_mode {
            Some(mode) => format!("  default-mode: {mode}"),
            None => format!("  default-mode: (unset, default: {})", Mode::default()),
        }
    }
}

/// Handler for the `greeting` setting. `off` stores an empty greeting.
pub struct GreetingHandler;

impl SettingHandler for GreetingHandler {
    fn key(&self) -> &'static str {
        "greeting"
    }

    fn set(&self, args: &[String], ctx: &SetContext) -> Result<String, SettingError> {
        if args.is_empty() {
            return Err(SettingError::MissingArgs {
                hint: "Provide the greeting text, or 'off' to disable it:",
                example: "datachat set greeting \"Ask me about last quarter's sales.\"",
            });
        }

        let text = args.join(" ");
        let value = if text.eq_ignore_ascii_case("off") {
            String::new()
        } else {
            text
        };
        let display = if value.is_empty() {
            "off".to_string()
        } else {
            truncate_with_ellipsis(&value, 50)
        };

        mutate_config(ctx, move |config| {
            config.greeting = Some(value);
            Ok(())
        })?;
        Ok(success_set("greeting", &display))
    }

    fn unset(&self, ctx: &SetContext) -> Result<String, SettingError> {
        mutate_config(ctx, |config| {
            config.greeting = None;
            Ok(())
        })?;
        Ok("✅ Unset greeting (will use default)".to_string())
    }

    fn format(&self, config: &Config) -> String {
        match config.greeting.as_deref() {
            Some(text) if text.trim().is_empty() => "  greeting: off".to_string(),
            Some(text) => format!("  greeting: {}", truncate_with_ellipsis(text, 50)),
            None => format!(
                "  greeting: (default) {}",
                truncate_with_ellipsis(DEFAULT_GREETING, 40)
            ),
        }
    }
}

fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let mut truncated: String = flat.chars().take(max_chars).collect();
    truncated.push('…');
    truncated
}
