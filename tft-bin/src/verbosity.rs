//! A `-v`/`-q` flag pair that sets the log level of the tool.
//!
//! Only warnings and errors are shown by default.
//! - `-q` shows errors only
//! - `-v` shows info
//! - `-vv` shows debug, e.g. rate limit waits and retries
//! - `-vvv` shows trace, e.g. every request URL

use log::{Level, LevelFilter};
use serde::Deserialize;

#[derive(clap::Args, Debug, Clone, Default, PartialEq, Eq)]
pub(crate) struct Verbosity {
    /// More log output per occurrence
    #[arg(
        long,
        short = 'v',
        action = clap::ArgAction::Count,
        global = true,
        conflicts_with = "quiet"
    )]
    verbose: u8,

    /// Less log output per occurrence
    #[arg(
        long,
        short = 'q',
        action = clap::ArgAction::Count,
        global = true,
        conflicts_with = "verbose"
    )]
    quiet: u8,
}

impl Verbosity {
    /// The most detailed level that gets logged
    pub(crate) const fn log_level(&self) -> Level {
        level_enum(self.verbosity())
    }

    pub(crate) fn log_level_filter(&self) -> LevelFilter {
        self.log_level().to_level_filter()
    }

    #[allow(clippy::cast_possible_wrap)]
    const fn verbosity(&self) -> i8 {
        level_value(Level::Warn) - (self.quiet as i8) + (self.verbose as i8)
    }
}

// Accepts level names like "info", "warning" or "Debug"
impl<'de> Deserialize<'de> for Verbosity {
    #[allow(clippy::cast_sign_loss)]
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        let level = match s.to_lowercase().as_str() {
            "error" => Level::Error,
            "warn" | "warning" => Level::Warn,
            "info" => Level::Info,
            "debug" => Level::Debug,
            "trace" => Level::Trace,
            level => {
                return Err(serde::de::Error::custom(format!(
                    "invalid log level `{level}`"
                )));
            }
        };
        let offset = level_value(level) - level_value(Level::Warn);
        Ok(Verbosity {
            verbose: offset.max(0) as u8,
            quiet: (-offset).max(0) as u8,
        })
    }
}

const fn level_value(level: Level) -> i8 {
    match level {
        Level::Error => 0,
        Level::Warn => 1,
        Level::Info => 2,
        Level::Debug => 3,
        Level::Trace => 4,
    }
}

const fn level_enum(verbosity: i8) -> Level {
    match verbosity {
        i8::MIN..=0 => Level::Error,
        1 => Level::Warn,
        2 => Level::Info,
        3 => Level::Debug,
        _ => Level::Trace,
    }
}
