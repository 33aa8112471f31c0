//! Tether CLI - drives the sync hooks from the command line.
//!
//! ```text
//! main() -> TetherConfig::load() -> Session::new() -> commands::run() -> JSON on stdout
//! ```
//!
//! Logs go to `[logging] file` or `~/.tether/logs/tether.log` (next to the
//! config file), never to stdout, so the JSON output stays machine-readable.

mod commands;

use std::{
    fs::{self, OpenOptions},
    io::{self, Write},
    path::PathBuf,
    process::ExitCode,
    sync::Mutex,
};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use tether_config::TetherConfig;
use tether_sync::Session;

use crate::commands::Cli;

const DEFAULT_LOG_FILTER: &str = "info";

fn main() -> ExitCode {
    match try_main() {
        Ok(code) => code,
        Err(err) => {
            let _ = writeln!(io::stderr(), "Error: {err:?}");
            ExitCode::FAILURE
        }
    }
}

#[tokio::main]
async fn try_main() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = TetherConfig::load()
        .context("loading config")?
        .unwrap_or_default();
    init_tracing(&config);

    let mut client_config = config
        .client_config()
        .context("invalid [api] settings")?;
    if let Some(base_url) = cli.base_url.as_deref() {
        client_config = tether_api::ApiClientConfig::new(base_url)
            .context("invalid --base-url")?
            .with_request_timeout(client_config.request_timeout);
    }

    let session = Session::new(client_config, config.access_token())
        .context("building API client")?
        .with_waitlist_encoding(config.waitlist_encoding());
    tracing::debug!(
        base_url = %session.client().base_url(),
        signed_in = session.is_signed_in(),
        "Session ready"
    );

    let outcome = commands::run(&session, cli.command).await?;

    let mut stdout = io::stdout().lock();
    let rendered = if cli.compact {
        serde_json::to_string(&outcome.output)?
    } else {
        serde_json::to_string_pretty(&outcome.output)?
    };
    writeln!(stdout, "{rendered}")?;

    Ok(if outcome.success {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    })
}

fn init_tracing(config: &TetherConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(config.log_filter().unwrap_or(DEFAULT_LOG_FILTER)))
        .unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    let (log_file, init_warnings) = open_log_file(config.log_file_candidates());

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::info!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // No log file: stay silent rather than mix logs into stdout.
    tracing_subscriber::registry().with(env_filter).init();
}

/// First candidate that can be created and opened for append wins.
fn open_log_file(candidates: Vec<PathBuf>) -> (Option<(PathBuf, fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();
    for path in candidates {
        let opened = path
            .parent()
            .map_or(Ok(()), fs::create_dir_all)
            .and_then(|()| OpenOptions::new().create(true).append(true).open(&path));
        match opened {
            Ok(file) => return (Some((path, file)), warnings),
            Err(e) => warnings.push(format!("Cannot log to {}: {e}", path.display())),
        }
    }
    (None, warnings)
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::open_log_file;

    #[test]
    fn unusable_log_location_falls_through() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();
        let unusable = blocker.join("logs").join("tether.log");
        let usable = dir.path().join("logs").join("tether.log");

        let (opened, warnings) = open_log_file(vec![unusable, usable.clone()]);
        assert_eq!(opened.map(|(path, _)| path), Some(usable.clone()));
        assert_eq!(warnings.len(), 1);
        assert!(usable.exists());
    }
}
