//! `tft` queries the Riot Games TFT API from the command line while staying
//! within the API's rate limits.
//!
//! The tft binary is a wrapper around tft-lib. Every response is printed as
//! pretty JSON to stdout, logs go to stderr.
//!
//! Set the API key once:
//! ```sh
//! export TFT_API_KEY=RGAPI-...
//! ```
//!
//! Look up a player and their recent matches:
//! ```sh
//! tft summoner JP1 <puuid>
//! tft matches asia <puuid> --count 5
//! tft match asia JP1_1234 JP1_1235
//! ```
//!
//! Show the ladder of a tier:
//! ```sh
//! tft league KR challenger
//! tft league NA1 diamond II --page 2
//! ```
#![warn(clippy::all, clippy::pedantic)]
#![warn(
    absolute_paths_not_starting_with_crate,
    missing_copy_implementations,
    missing_debug_implementations,
    semicolon_in_expressions_from_macros,
    unreachable_pub,
    unused_extern_crates,
    variant_size_differences,
    clippy::missing_const_for_fn
)]
#![deny(anonymous_parameters, macro_use_extern_crate)]
#![deny(missing_docs)]

use std::io;
use std::path::PathBuf;

use anyhow::{Error, Result, bail};
use clap::Parser;
use log::error;
use tft_lib::ErrorKind;

mod client;
mod commands;
mod logging;
mod options;
mod verbosity;

use crate::logging::init_logging;
use crate::options::{Config, TFT_CONFIG_FILE, TftOptions};

/// A C-like enum that can be cast to `i32` and used as process exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ExitCode {
    Success = 0,
    // NOTE: exit code 1 is used for any `Result::Err` bubbled up to `main()`
    // using the `?` operator.
    #[allow(unused)]
    UnexpectedFailure = 1,
    ApiFailure = 2,
    ConfigFile = 3,
}

fn main() -> Result<()> {
    // std::process::exit doesn't run destructors, so the actual work
    // happens in another function
    let exit_code = run_main()?;
    std::process::exit(exit_code);
}

/// Merge all provided config options into one.
/// This includes a potential config file, command-line- and environment variables
fn load_config() -> Result<TftOptions> {
    let mut opts = TftOptions::parse();

    init_logging(&opts.config.verbose);

    if let Some(config_file) = &opts.config_file {
        match Config::load_from_file(config_file) {
            Ok(c) => opts.config.merge(c),
            Err(e) => {
                bail!(
                    "Cannot load configuration file `{}`: {e:?}",
                    config_file.display()
                );
            }
        }
    } else {
        // An invalid default file is an error, a missing one is not
        let default_config = PathBuf::from(TFT_CONFIG_FILE);
        if default_config.is_file() {
            match Config::load_from_file(&default_config) {
                Ok(c) => opts.config.merge(c),
                Err(e) => {
                    bail!(
                        "Cannot load default configuration file `{}`: {e:?}",
                        default_config.display()
                    );
                }
            }
        }
    }

    Ok(opts)
}

/// Set up runtime and call the tft entrypoint
fn run_main() -> Result<i32> {
    use std::process::exit;

    let opts = match load_config() {
        Ok(opts) => opts,
        Err(e) => {
            error!("Error while loading config: {e}");
            exit(ExitCode::ConfigFile as i32);
        }
    };

    let runtime = tokio::runtime::Runtime::new()?;

    match runtime.block_on(run(&opts)) {
        Err(e) if Some(io::ErrorKind::BrokenPipe) == underlying_io_error_kind(&e) => {
            exit(ExitCode::Success as i32);
        }
        res => res,
    }
}

/// Check if the given error can be traced back to an `io::ErrorKind`
fn underlying_io_error_kind(error: &Error) -> Option<io::ErrorKind> {
    for cause in error.chain() {
        if let Some(io_error) = cause.downcast_ref::<io::Error>() {
            return Some(io_error.kind());
        }
    }
    None
}

/// Whether the API itself turned the request down, as opposed to a failure
/// to reach it
fn is_api_failure(error: &Error) -> bool {
    error.chain().any(|cause| {
        cause
            .downcast_ref::<ErrorKind>()
            .is_some_and(|e| matches!(e, ErrorKind::RateLimited { .. } | ErrorKind::Api { .. }))
    })
}

/// Run the selected command
async fn run(opts: &TftOptions) -> Result<i32> {
    let client = client::create(&opts.config)?;

    let exit_code = match commands::execute(&opts.command, &client).await {
        Ok(()) => ExitCode::Success,
        Err(e) if is_api_failure(&e) => {
            error!("{e}");
            ExitCode::ApiFailure
        }
        Err(e) => return Err(e),
    };

    client.destroy();
    Ok(exit_code as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn test_api_failures() {
        let throttled = Error::from(ErrorKind::RateLimited {
            url: "https://kr.api.riotgames.com".into(),
            retry_after: None,
            body: None,
        });
        assert!(is_api_failure(&throttled));
        assert!(is_api_failure(&throttled.context("Cannot fetch league")));
        assert!(!is_api_failure(&Error::from(ErrorKind::MissingApiKey)));
        assert!(!is_api_failure(&anyhow!("something else")));
    }

    #[test]
    fn test_broken_pipe_is_detected() {
        let err = Error::from(io::Error::from(io::ErrorKind::BrokenPipe));
        assert_eq!(
            underlying_io_error_kind(&err),
            Some(io::ErrorKind::BrokenPipe)
        );
        assert_eq!(underlying_io_error_kind(&anyhow!("no io")), None);
    }
}
