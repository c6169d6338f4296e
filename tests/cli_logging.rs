// tests/cli_logging.rs

use std::path::PathBuf;

use clap::Parser;

use docmirror::cli::{CliArgs, LogLevel};
use docmirror::logging::filter_directive;
use docmirror::types::SessionId;

#[test]
fn defaults_to_docmirror_toml() {
    let args = CliArgs::try_parse_from(["docmirror"]).unwrap();
    assert_eq!(args.config, "Docmirror.toml");
    assert!(!args.once);
    assert!(!args.dry_run);
    assert!(args.file.is_none());
    assert!(args.log_level.is_none());
}

#[test]
fn parses_every_flag() {
    let args = CliArgs::try_parse_from([
        "docmirror",
        "--config",
        "site/Docmirror.toml",
        "--file",
        "docs/index.md",
        "--log-level",
        "debug",
        "--dry-run",
    ])
    .unwrap();
    assert_eq!(args.config, "site/Docmirror.toml");
    assert_eq!(args.file, Some(PathBuf::from("docs/index.md")));
    assert!(matches!(args.log_level, Some(LogLevel::Debug)));
    assert!(args.dry_run);
}

#[test]
fn once_conflicts_with_file() {
    let result = CliArgs::try_parse_from(["docmirror", "--once", "--file", "a.md"]);
    assert!(result.is_err());
}

#[test]
fn cli_level_wins_over_environment() {
    assert_eq!(filter_directive(Some(LogLevel::Debug), Some("trace")), "debug");
    assert_eq!(filter_directive(Some(LogLevel::Warn), None), "warn");
}

#[test]
fn environment_accepts_full_directives() {
    assert_eq!(
        filter_directive(None, Some(" docmirror=debug,notify=warn ")),
        "docmirror=debug,notify=warn"
    );
    assert_eq!(filter_directive(None, Some("TRACE")), "TRACE");
}

#[test]
fn unusable_environment_falls_back_to_info() {
    assert_eq!(filter_directive(None, None), "info");
    assert_eq!(filter_directive(None, Some("   ")), "info");
    assert_eq!(filter_directive(None, Some("docmirror=loud")), "info");
}

#[test]
fn session_ids_are_unique() {
    let a = SessionId::generate();
    let b = SessionId::generate();
    assert_ne!(a, b);
    assert_eq!(a.to_string().len(), 32);
}
