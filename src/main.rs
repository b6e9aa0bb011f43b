//! Promptgen: resolve prompt templates into prompt/seed lists.
//!
//! This is the main entry point for the `promptgen` CLI. It parses arguments,
//! installs logging, dispatches to the appropriate command handler, and
//! handles errors with proper exit codes.

mod cli;
mod commands;

use cli::Cli;
use promptgen::exit_codes;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Environment variable holding a `tracing` filter directive.
const LOG_ENV: &str = "PROMPTGEN_LOG";

fn main() -> ExitCode {
    let cli = Cli::parse_args();
    init_logging(cli.verbose);

    match commands::dispatch(cli.command) {
        Ok(()) => ExitCode::from(exit_codes::SUCCESS as u8),
        Err(err) => {
            // Print user-actionable error message to stderr
            eprintln!("Error: {}", err);

            // Return appropriate exit code
            ExitCode::from(err.exit_code() as u8)
        }
    }
}

/// Log to stderr so prompt output on stdout stays clean.
///
/// `-v` / `-vv` take precedence over `PROMPTGEN_LOG`.
fn init_logging(verbose: u8) {
    let filter = EnvFilter::new(log_directive(verbose, std::env::var(LOG_ENV).ok()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Filter directive for the given `-v` count and `PROMPTGEN_LOG` value.
fn log_directive(verbose: u8, env: Option<String>) -> String {
    match verbose {
        0 => env.filter(|d| !d.trim().is_empty()).unwrap_or_else(|| "warn".to_string()),
        1 => "debug".to_string(),
        _ => "trace".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbose_flag_overrides_env_filter() {
        let env = || Some("promptgen=info".to_string());
        assert_eq!(log_directive(0, env()), "promptgen=info");
        assert_eq!(log_directive(1, env()), "debug");
        assert_eq!(log_directive(2, env()), "trace");
        assert_eq!(log_directive(0, None), "warn");
        assert_eq!(log_directive(0, Some(" ".to_string())), "warn");
    }
}
