use super::*;

fn parse_args(argv: &[&str]) -> Args {
    Args::try_parse_from(argv)
        .unwrap_or_else(|err| panic!("argv={argv:?} should parse successfully: {err}"))
}

#[test]
fn no_subcommand_defaults_to_chat() {
    let args = parse_args(&["datachat"]);
    assert!(args.command.is_none());
    assert_eq!(args.global.mode, None);
    assert_eq!(args.global.verbose, 0);
}

#[test]
fn mode_flag_parsing() {
    let cases: [(&[&str], Option<Mode>); 4] = [
        (&["datachat", "-m", "general"], Some(Mode::General)),
        (&["datachat", "--mode", "database"], Some(Mode::Database)),
        (&["datachat", "chat", "--mode", "general"], Some(Mode::General)),
        (&["datachat"], None),
    ];

    for (argv, expected) in cases {
        let args = parse_args(argv);
        assert_eq!(args.global.mode, expected, "argv={argv:?}");
    }

    assert!(Args::try_parse_from(["datachat", "--mode", "sql"]).is_err());
}

#[test]
fn ask_collects_question_words_and_file() {
    let args = parse_args(&[
        "datachat",
        "ask",
        "--file",
        "report.csv",
        "How",
        "many",
        "users?",
    ]);
    match args.command {
        Some(Commands::Ask { file, question }) => {
            assert_eq!(file, Some(PathBuf::from("report.csv")));
            assert_eq!(question.join(" "), "How many users?");
        }
        _ => panic!("expected ask subcommand"),
    }
}

#[test]
fn ask_accepts_a_file_without_question() {
    let args = parse_args(&["datachat", "ask", "-f", "report.csv"]);
    match args.command {
        Some(Commands::Ask { file, question }) => {
            assert!(file.is_some());
            assert!(question.is_empty());
        }
        _ => panic!("expected ask subcommand"),
    }
}

#[test]
fn global_flags_apply_after_subcommand() {
    let args = parse_args(&[
        "datachat",
        "ask",
        "--token",
        "abc",
        "--api-url",
        "http://localhost:9000",
        "-vv",
        "hi",
    ]);
    assert_eq!(args.global.token.as_deref(), Some("abc"));
    assert_eq!(args.global.api_url.as_deref(), Some("http://localhost:9000"));
    assert_eq!(args.global.verbose, 2);
}

#[test]
fn set_without_key_lists_settings() {
    let args = parse_args(&["datachat", "set"]);
    match args.command {
        Some(Commands::Set { key, value }) => {
            assert!(key.is_none());
            assert!(value.is_empty());
        }
        _ => panic!("expected set subcommand"),
    }

    let args = parse_args(&["datachat", "set", "greeting", "Welcome", "back"]);
    match args.command {
        Some(Commands::Set { key, value }) => {
            assert_eq!(key.as_deref(), Some("greeting"));
            assert_eq!(value, vec!["Welcome".to_string(), "back".to_string()]);
        }
        _ => panic!("expected set subcommand"),
    }
}

#[test]
fn deauth_yes_flag() {
    let args = parse_args(&["datachat", "deauth", "-y"]);
    assert!(matches!(args.command, Some(Commands::Deauth { yes: true })));
}

#[test]
fn shutdown_does_not_wait_for_blocked_reads() {
    let runtime = Runtime::new().expect("runtime");
    let (_keep_open, blocked) = std::sync::mpsc::channel::<()>();
    let started = std::time::Instant::now();

    let output = run_then_shutdown(runtime, async move {
        let _ = tokio::task::spawn_blocking(move || blocked.recv());
        "left the prompt"
    });

    assert_eq!(output, "left the prompt");
    assert!(started.elapsed() < Duration::from_secs(5));
}
