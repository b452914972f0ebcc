//! magpie fetches a single GitHub resource (issue, pull request, or
//! discussion) through the REST and GraphQL APIs, normalizes it into one
//! unified document, and renders that document as markdown.
//!
//! The fetch layer retries transient failures with exponential backoff and
//! surfaces permanent ones as classifiable [`FetchError`] values; the CLI
//! maps those classifications to exit codes without ever inspecting
//! transport details.

pub mod cli;
pub mod config;
pub mod export;
pub mod github;

pub use config::MagpieConfig;
pub use github::{
    Config, FetchError, FetchOptions, GithubFetcher, IssueData, ResourceFetcher, ResourceKind,
    ResourceRef,
};
