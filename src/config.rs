//! Runtime configuration from command-line arguments and the environment.
//!
//! Everything is parsed once at startup into a [`MagpieConfig`] value and
//! passed down explicitly; there is no global configuration state. The token
//! falls back to the `GITHUB_TOKEN` environment variable, matching the
//! convention of other GitHub tooling.

use std::time::Duration;

use camino::Utf8PathBuf;
use clap::Parser;

use crate::github::error::FetchError;
use crate::github::fetcher::Config;

/// Fetch a GitHub issue, pull request, or discussion and render it to
/// markdown.
#[derive(Debug, Clone, Parser)]
#[command(name = "magpie", version, about)]
pub struct MagpieConfig {
    /// GitHub resource URL, e.g. `https://github.com/owner/repo/issues/1`.
    pub url: Option<String>,

    /// Output file or directory; defaults to a generated file name in the
    /// current directory.
    #[arg(long)]
    pub output: Option<Utf8PathBuf>,

    /// Whether comment threads are fetched and rendered.
    #[arg(
        long,
        default_value_t = true,
        action = clap::ArgAction::Set,
        value_name = "BOOL"
    )]
    pub include_comments: bool,

    /// Batch mode: file with one resource URL per line.
    #[arg(long)]
    pub input_file: Option<Utf8PathBuf>,

    /// Write markdown to stdout instead of a file (single mode only).
    #[arg(long)]
    pub stdout: bool,

    /// Overwrite existing output files.
    #[arg(long)]
    pub force: bool,

    /// Personal access token for the GitHub API.
    #[arg(long, env = "GITHUB_TOKEN", hide_env_values = true)]
    pub token: Option<String>,

    /// Maximum retries after the initial attempt of each fetch.
    #[arg(long, default_value_t = 3)]
    pub max_retries: u32,

    /// First retry delay in milliseconds; doubled after each failed attempt.
    #[arg(long, default_value_t = 2000, value_name = "MILLIS")]
    pub initial_backoff_ms: u64,

    /// Override the REST API base URL (for GitHub Enterprise or testing).
    #[arg(long, hide = true)]
    pub rest_base_url: Option<String>,

    /// Override the GraphQL endpoint URL (for GitHub Enterprise or testing).
    #[arg(long, hide = true)]
    pub graphql_url: Option<String>,
}

/// How a run processes its input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunMode {
    /// One positional URL.
    Single(String),
    /// URLs streamed from an input file.
    Batch(Utf8PathBuf),
}

impl MagpieConfig {
    /// Validates argument combinations and picks the run mode.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Configuration`] when `--stdout` is combined with
    /// `--input-file`, when both a positional URL and an input file are
    /// given, or when neither is.
    pub fn run_mode(&self) -> Result<RunMode, FetchError> {
        if self.stdout && self.input_file.is_some() {
            return Err(FetchError::Configuration {
                message: "--stdout cannot be combined with --input-file".to_owned(),
            });
        }

        match (&self.url, &self.input_file) {
            (Some(_), Some(_)) => Err(FetchError::Configuration {
                message: "pass either a resource URL or --input-file, not both".to_owned(),
            }),
            (Some(url), None) => Ok(RunMode::Single(url.clone())),
            (None, Some(input)) => Ok(RunMode::Batch(input.clone())),
            (None, None) => Err(FetchError::Configuration {
                message: "a resource URL is required".to_owned(),
            }),
        }
    }

    /// Builds the fetch-layer configuration from these arguments.
    #[must_use]
    pub fn fetch_config(&self) -> Config {
        let defaults = Config::default();
        Config {
            token: self.token.clone(),
            rest_base_url: self
                .rest_base_url
                .clone()
                .unwrap_or(defaults.rest_base_url),
            graphql_url: self.graphql_url.clone().unwrap_or(defaults.graphql_url),
            max_retries: self.max_retries,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            request_timeout: defaults.request_timeout,
        }
    }
}
