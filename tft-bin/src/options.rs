use crate::verbosity::Verbosity;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use const_format::{concatcp, formatcp};
use secrecy::SecretString;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::{fs, time::Duration};
use tft_lib::ratelimit::BucketOverrides;
use tft_lib::region::{Division, Region, RegionGroup, Tier};
use tft_lib::retry::{DEFAULT_MAX_ATTEMPTS, RetryConfig};
use tft_lib::{BucketConfig, DEFAULT_TIMEOUT, DEFAULT_USER_AGENT};
use url::Url;

pub(crate) const TFT_CONFIG_FILE: &str = "tft.toml";

/// Environment variable read for the API key if `TFT_API_KEY` is unset
pub(crate) const RIOT_API_KEY_ENV: &str = "RIOT_API_KEY";

const DEFAULT_TIMEOUT_SECS: u64 = DEFAULT_TIMEOUT.as_secs();

// clap wants `&str` defaults, serde wants typed ones
const TIMEOUT_STR: &str = concatcp!(DEFAULT_TIMEOUT_SECS);
const MAX_ATTEMPTS_STR: &str = concatcp!(DEFAULT_MAX_ATTEMPTS);
// Show the default config file without making it an explicit choice,
// so a missing default file is not an error
const HELP_MSG_CONFIG_FILE: &str = formatcp!(
    "Configuration file to use\n\n[default: {}]",
    TFT_CONFIG_FILE,
);

// Macro for generating default functions to be used by serde
macro_rules! default_function {
    ( $( $name:ident : $T:ty = $e:expr; )* ) => {
        $(
            #[allow(clippy::missing_const_for_fn)]
            fn $name() -> $T {
                $e
            }
        )*
    };
}

default_function! {
    timeout: u64 = DEFAULT_TIMEOUT_SECS;
    max_attempts: u32 = DEFAULT_MAX_ATTEMPTS;
    user_agent: String = DEFAULT_USER_AGENT.to_string();
    verbosity: Verbosity = Verbosity::default();
}

// Macro for merging configuration values
macro_rules! fold_in {
    ($cli:ident , $toml:ident ; $ty:ident { $(..$ignore:ident,)* $( $key:ident : $default:expr, )* } ) => {
        if (false) {
            #[allow(dead_code, unused, clippy::diverging_sub_expression)]
            let _check_fold_in_exhaustivity = $ty {
                $($key: unreachable!(), )*
                $($ignore: unreachable!(), )*
            };
        };
        $(
            if $cli.$key == $default && $toml.$key != $default {
                $cli.$key = $toml.$key;
            }
        )*
    };
}

/// Query the Riot Games TFT API without running into its rate limits.
///
/// Every response is printed as JSON to stdout.
#[derive(Parser, Debug)]
#[command(version, about, next_display_order = None)]
pub(crate) struct TftOptions {
    /// Configuration file to use
    #[arg(short, long = "config", global = true)]
    #[arg(help = HELP_MSG_CONFIG_FILE)]
    pub(crate) config_file: Option<PathBuf>,

    #[clap(flatten)]
    pub(crate) config: Config,

    #[command(subcommand)]
    pub(crate) command: Command,
}

/// What to fetch
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub(crate) enum Command {
    /// Look up a summoner by PUUID
    Summoner {
        /// Platform, e.g. `NA1` or `KR`
        region: Region,
        puuid: String,
    },

    /// List the most recent match ids of a player
    Matches {
        /// Regional routing value, e.g. `americas` or `asia`
        group: RegionGroup,
        puuid: String,

        /// Number of ids to return
        #[arg(long)]
        count: Option<u32>,

        /// Number of most recent matches to skip
        #[arg(long)]
        start: Option<u32>,

        /// Only matches after this time, in epoch seconds
        #[arg(long)]
        start_time: Option<i64>,

        /// Only matches before this time, in epoch seconds
        #[arg(long)]
        end_time: Option<i64>,
    },

    /// Fetch one or more matches by id
    Match {
        /// Regional routing value, e.g. `americas` or `asia`
        group: RegionGroup,

        #[arg(required = true)]
        match_ids: Vec<String>,
    },

    /// Show the ladder of a tier
    League {
        /// Platform, e.g. `NA1` or `KR`
        region: Region,

        /// `CHALLENGER`, `GRANDMASTER`, `MASTER` or a tier below
        tier: Tier,

        /// Division, required below `MASTER`
        division: Option<Division>,

        /// Page of a divided tier, starting at 1
        #[arg(long)]
        page: Option<u32>,
    },

    /// Show the occupancy of every rate limit bucket
    Buckets,
}

/// The main configuration for tft
#[derive(Parser, Debug, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub(crate) struct Config {
    /// Verbose program output
    #[clap(flatten)]
    #[serde(default = "verbosity")]
    pub(crate) verbose: Verbosity,

    /// Riot API key. Falls back to `RIOT_API_KEY`.
    #[arg(long, env = "TFT_API_KEY", hide_env_values = true, global = true)]
    #[serde(default)]
    pub(crate) api_key: Option<SecretString>,

    /// Share of every rate limit to use, between 0 (exclusive) and 1 (inclusive)
    #[arg(long, global = true)]
    #[serde(default)]
    pub(crate) buffer_rate: Option<f64>,

    /// Timeout of a single request in seconds
    #[arg(short, long, default_value = &TIMEOUT_STR, value_parser = clap::value_parser!(u64), global = true)]
    #[serde(default = "timeout")]
    pub(crate) timeout: u64,

    /// How often a request is tried before giving up
    #[arg(long, default_value = &MAX_ATTEMPTS_STR, global = true)]
    #[serde(default = "max_attempts")]
    pub(crate) max_attempts: u32,

    /// Send every request to this URL instead of the Riot hosts
    #[arg(long, global = true)]
    #[serde(default)]
    pub(crate) base_url: Option<Url>,

    /// User agent
    #[arg(short, long, default_value = DEFAULT_USER_AGENT, global = true)]
    #[serde(default = "user_agent")]
    pub(crate) user_agent: String,

    /// Upper bound of requests queued at once by batch commands
    #[arg(long, global = true)]
    #[serde(default)]
    pub(crate) batch_concurrency: Option<usize>,

    /// Per-bucket overrides of the default method limits.
    /// Only available in the configuration file.
    #[arg(skip)]
    #[serde(default)]
    pub(crate) rate_limits: BucketOverrides,

    /// Application-wide rate limit.
    /// Only available in the configuration file.
    #[arg(skip)]
    #[serde(default)]
    pub(crate) app_rate_limit: Option<BucketConfig>,
}

impl Config {
    /// Load configuration from a file
    pub(crate) fn load_from_file(path: &Path) -> Result<Config> {
        let contents = fs::read_to_string(path)?;
        toml::from_str(&contents).with_context(|| "Failed to parse configuration file")
    }

    /// Merge the configuration from TOML into the CLI configuration
    pub(crate) fn merge(&mut self, toml: Config) {
        // SecretBox doesn't implement Eq
        if self.api_key.is_none() && toml.api_key.is_some() {
            self.api_key = toml.api_key;
        }

        // Bucket limits can only be set in the file
        self.rate_limits = toml.rate_limits;
        self.app_rate_limit = toml.app_rate_limit;

        // NOTE: if you see an error within this macro call, check to make sure that
        // that the fields provided to fold_in! match all the fields of the Config struct.
        fold_in! {
            // Destination and source configs
            self, toml;

            Config {
                // Keys which are handled outside of fold_in
                ..api_key,
                ..rate_limits,
                ..app_rate_limit,

                // Keys with defaults to assign
                verbose: Verbosity::default(),
                buffer_rate: None,
                timeout: DEFAULT_TIMEOUT_SECS,
                max_attempts: DEFAULT_MAX_ATTEMPTS,
                base_url: None,
                user_agent: DEFAULT_USER_AGENT,
                batch_concurrency: None,
            }
        }
    }

    pub(crate) const fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout)
    }

    pub(crate) fn retry(&self) -> RetryConfig {
        RetryConfig {
            max_attempts: self.max_attempts,
            ..RetryConfig::default()
        }
    }
}
