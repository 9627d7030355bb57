use clap::Parser;
use clap::error::ErrorKind;
use std::io;
use task_tracker::cli::{Cli, collect_overrides};
use task_tracker::interactive::Shell;
use task_tracker_core::config::{load_config_with_fallback, merge_overrides};
use task_tracker_core::error::AppError;
use task_tracker_core::storage::json_store;
use task_tracker_core::task_api::TaskSession;
use tracing_subscriber::EnvFilter;

fn init_tracing() -> Result<(), AppError> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(io::stderr)
        .with_target(false)
        .try_init()
        .map_err(|err| AppError::io(format!("failed to init tracing: {err}")))
}

fn normalize_parse_error(err: clap::Error) -> AppError {
    let rendered = err.to_string();
    let first_line = rendered.lines().next().unwrap_or("invalid arguments").trim();
    let message = first_line
        .strip_prefix("error: ")
        .unwrap_or(first_line)
        .to_string();
    AppError::invalid_input(message)
}

fn run(cli: Cli) -> Result<(), AppError> {
    let overrides = collect_overrides(&cli.config_override).map_err(AppError::invalid_input)?;
    let loaded = load_config_with_fallback(cli.config.as_deref());
    if let Some(err) = loaded.error.as_ref() {
        tracing::warn!(code = err.code(), "using default config: {}", err.message());
    }
    let config = merge_overrides(&loaded.config, &overrides);

    let path = match cli.data_file {
        Some(path) => path,
        None => json_store::data_path()?,
    };
    let session = TaskSession::open(&path)?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    let stderr = io::stderr();
    Shell::new(session, &config, stdin.lock(), stdout.lock(), stderr.lock()).run()
}

fn main() {
    if let Err(err) = init_tracing() {
        eprintln!("ERROR: {}", err);
    }

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) if matches!(err.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) => {
            err.exit()
        }
        Err(err) => {
            eprintln!("ERROR: {}", normalize_parse_error(err));
            std::process::exit(1);
        }
    };

    if let Err(err) = run(cli) {
        eprintln!("ERROR: {}", err);
        std::process::exit(1);
    }
}
