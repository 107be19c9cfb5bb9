use super::*;
use crate::core::mode::Mode;
use tempfile::TempDir;

fn context(dir: &TempDir) -> SetContext {
    SetContext {
        config_path: dir.path().join("config.toml"),
    }
}

fn args(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

fn load(ctx: &SetContext) -> Config {
    Config::load_from_path(&ctx.config_path).expect("config should load")
}

#[test]
fn set_and_unset_api_url() {
    let dir = TempDir::new().expect("tempdir");
    let ctx = context(&dir);
    let registry = SettingRegistry::new();

    let message = run_set(&registry, "api-url", &args(&["https://dash.example.com/"]), &ctx)
        .expect("set api-url");
    assert_eq!(message, "✅ Set api-url to: https://dash.example.com");
    assert_eq!(
        load(&ctx).api_url.as_deref(),
        Some("https://dash.example.com")
    );

    run_unset(&registry, "api-url", &ctx).expect("unset api-url");
    assert_eq!(load(&ctx).api_url, None);
}

#[test]
fn url_without_scheme_is_rejected() {
    let dir = TempDir::new().expect("tempdir");
    let ctx = context(&dir);
    let registry = SettingRegistry::new();

    let err = run_set(&registry, "backend-url", &args(&["localhost:8000"]), &ctx)
        .expect_err("should reject");
    assert!(matches!(err, SettingError::InvalidValue { key: "backend-url", .. }));
    assert!(!ctx.config_path.exists());
}

#[test]
fn default_mode_accepts_aliases() {
    let dir = TempDir::new().expect("tempdir");
    let ctx = context(&dir);
    let registry = SettingRegistry::new();

    run_set(&registry, "default-mode", &args(&["db"]), &ctx).expect("set mode");
    assert_eq!(load(&ctx).default_mode, Some(Mode::Database));

    run_set(&registry, "default-mode", &args(&["general"]), &ctx).expect("set mode");
    assert_eq!(load(&ctx).default_mode, Some(Mode::General));

    assert!(run_set(&registry, "default-mode", &args(&["sql"]), &ctx).is_err());
}

#[test]
fn timeouts_parse_seconds() {
    let dir = TempDir::new().expect("tempdir");
    let ctx = context(&dir);
    let registry = SettingRegistry::new();

    run_set(&registry, "read-timeout", &args(&["45s"]), &ctx).expect("set timeout");
    run_set(&registry, "connect-timeout", &args(&["0"]), &ctx).expect("set timeout");
    let config = load(&ctx);
    assert_eq!(config.read_timeout_secs, Some(45));
    assert_eq!(config.connect_timeout_secs, Some(0));

    assert!(run_set(&registry, "read-timeout", &args(&["soon"]), &ctx).is_err());
    assert!(matches!(
        run_set(&registry, "read-timeout", &[], &ctx),
        Err(SettingError::MissingArgs { .. })
    ));
}

#[test]
fn greeting_off_stores_empty_text() {
    let dir = TempDir::new().expect("tempdir");
    let ctx = context(&dir);
    let registry = SettingRegistry::new();

    run_set(&registry, "greeting", &args(&["off"]), &ctx).expect("set greeting");
    let config = load(&ctx);
    assert_eq!(config.greeting.as_deref(), Some(""));
    assert!(format_all(&registry, &config).contains("  greeting: off"));
}

#[test]
fn development_flag_round_trips_through_config() {
    let dir = TempDir::new().expect("tempdir");
    let ctx = context(&dir);
    let registry = SettingRegistry::new();

    run_set(&registry, "development", &args(&["yes"]), &ctx).expect("set development");
    assert_eq!(load(&ctx).development, Some(true));
    assert!(run_set(&registry, "development", &args(&["sometimes"]), &ctx).is_err());
}

#[test]
fn unknown_key_is_reported() {
    let dir = TempDir::new().expect("tempdir");
    let ctx = context(&dir);
    let registry = SettingRegistry::new();

    let err = run_unset(&registry, "theme", &ctx).expect_err("unknown key");
    assert_eq!(err.to_string(), "Unknown config key: theme");
}

#[test]
fn format_all_lists_keys_in_order() {
    let registry = SettingRegistry::new();
    let listing = format_all(&registry, &Config::default());
    let keys: Vec<&str> = listing
        .lines()
        .filter_map(|line| line.trim().split(':').next())
        .collect();
    assert_eq!(
        keys,
        vec![
            "api-url",
            "backend-url",
            "development",
            "default-mode",
            "connect-timeout",
            "read-timeout",
            "greeting",
        ]
    );
}
