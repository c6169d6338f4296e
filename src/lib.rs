// src/lib.rs

pub mod cli;
pub mod config;
pub mod convert;
pub mod engine;
pub mod errors;
pub mod fs;
pub mod logging;
pub mod mirror;
pub mod types;
pub mod watch;

use std::path::PathBuf;

use anyhow::{Context, Result};
use tracing::{debug, info};

use crate::cli::CliArgs;
use crate::config::load_and_validate;
use crate::config::MirrorConfig;
use crate::watch::WatchRegistry;

pub use crate::engine::{SyncReport, WatchEvent};
pub use crate::errors::SyncError;
pub use crate::types::{FileCategory, SessionId, SessionKind, SessionState};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - config loading
/// - the watch registry (filesystem, notifier, converters, rules)
/// - one directory or file session, or a single `--once` pass
/// - Ctrl-C handling
pub async fn run(args: CliArgs) -> Result<()> {
    let config_path = PathBuf::from(&args.config);
    let cfg = load_and_validate(&config_path)
        .with_context(|| format!("loading config {:?}", config_path))?;

    let registry = WatchRegistry::new(cfg)?;

    if args.dry_run {
        print_dry_run(registry.config(), &registry.rule_marks());
        return Ok(());
    }

    if args.once {
        let report = registry.run_once().await?;
        println!(
            "docmirror: {} written, {} unchanged, {} removed, {} failed",
            report.written, report.unchanged, report.removed, report.failed
        );
        return Ok(());
    }

    let id = match &args.file {
        Some(file) => {
            let file = std::env::current_dir()?.join(file);
            let file = file.canonicalize().unwrap_or(file);
            registry.start_file_watch(&file)?
        }
        None => registry.start_dir_watch()?,
    };
    info!(session = %id, "watching; press Ctrl-C to stop");

    tokio::signal::ctrl_c()
        .await
        .context("failed to listen for Ctrl+C")?;

    for closing in registry.stop_all() {
        let session = closing.id();
        let report = closing.wait().await?;
        debug!(%session, ?report, "session finished");
    }

    info!("docmirror exiting");
    Ok(())
}

/// Simple dry-run output: print the resolved roots, filters and rules.
fn print_dry_run(cfg: &MirrorConfig, rules: &[String]) {
    println!("docmirror dry-run");
    println!("  source: {}", cfg.source_root.display());
    println!("  target: {}", cfg.target_root.display());
    println!();

    println!("filter:");
    println!("  exclude_names: {:?}", cfg.exclude_names);
    println!("  exclude_dirs:  {:?}", cfg.exclude_dirs);
    println!();

    println!("render:");
    println!("  template_dir: {}", cfg.template_dir.display());
    if let Some(ref vars) = cfg.variables {
        println!("  variables: {}", vars.display());
    }
    println!("  document_extension: {}", cfg.document_extension);
    println!("  expand_documents: {}", cfg.expand_documents);
    println!("  skip_unchanged: {}", cfg.skip_unchanged);
    println!();

    println!("rules ({}):", rules.len());
    for mark in rules {
        println!("  - {mark}");
    }

    debug!("dry-run complete (nothing mirrored)");
}
