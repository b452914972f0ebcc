//! Fetch configuration and the resource dispatcher.
//!
//! [`GithubFetcher`] owns one REST client and one GraphQL client, both built
//! once from an explicit [`Config`]; there is no hidden global state. The
//! dispatch itself is an exhaustive match on [`ResourceKind`], with each arm
//! individually wrapped in the retry policy.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use super::error::FetchError;
use super::graphql::GraphqlClient;
use super::locator::{ResourceKind, ResourceRef};
use super::models::{FetchOptions, IssueData};
use super::rest::RestClient;
use super::retry::{self, RetryPolicy, TokioSleeper};

/// Default REST API base URL.
pub const DEFAULT_REST_BASE_URL: &str = "https://api.github.com";

/// Default GraphQL endpoint.
pub const DEFAULT_GRAPHQL_URL: &str = "https://api.github.com/graphql";

/// Default per-request timeout.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Fetcher configuration, applied once at construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Personal access token; anonymous requests are made when absent.
    pub token: Option<String>,
    /// REST API base URL.
    pub rest_base_url: String,
    /// GraphQL endpoint URL.
    pub graphql_url: String,
    /// Maximum retries after the initial attempt of each fetch.
    pub max_retries: u32,
    /// First retry delay; doubled after each failed attempt.
    pub initial_backoff: Duration,
    /// Timeout applied to individual requests.
    pub request_timeout: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token: None,
            rest_base_url: DEFAULT_REST_BASE_URL.to_owned(),
            graphql_url: DEFAULT_GRAPHQL_URL.to_owned(),
            max_retries: retry::DEFAULT_MAX_RETRIES,
            initial_backoff: retry::DEFAULT_INITIAL_BACKOFF,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// The contract for fetching and normalizing one GitHub resource.
///
/// The trait seam exists so collaborators (the CLI runner, tests) can swap in
/// doubles without touching the network.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ResourceFetcher: Send + Sync {
    /// Fetches the referenced resource and normalizes it into [`IssueData`].
    async fn fetch(
        &self,
        reference: &ResourceRef,
        options: FetchOptions,
    ) -> Result<IssueData, FetchError>;
}

/// Fetcher backed by the real REST and GraphQL clients.
pub struct GithubFetcher {
    pub(super) rest: RestClient,
    pub(super) graphql: GraphqlClient,
    retry: RetryPolicy,
}

impl GithubFetcher {
    /// Builds both protocol clients from the given configuration.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Configuration`] when either client cannot be
    /// constructed.
    pub fn new(config: Config) -> Result<Self, FetchError> {
        let rest = RestClient::new(&config)?;
        let graphql = GraphqlClient::new(&config)?;
        let retry = RetryPolicy {
            max_retries: config.max_retries,
            initial_backoff: config.initial_backoff,
        };
        Ok(Self {
            rest,
            graphql,
            retry,
        })
    }
}

#[async_trait]
impl ResourceFetcher for GithubFetcher {
    async fn fetch(
        &self,
        reference: &ResourceRef,
        options: FetchOptions,
    ) -> Result<IssueData, FetchError> {
        debug!(kind = %reference.kind, owner = %reference.owner, repo = %reference.repo, number = reference.number, "dispatching fetch");

        match reference.kind {
            ResourceKind::Issue => self
                .retry
                .run(&TokioSleeper, retry::is_retryable, || {
                    self.fetch_issue(reference, options)
                })
                .await
                .map_err(|error| error.with_operation("fetch issue")),
            ResourceKind::PullRequest => self
                .retry
                .run(&TokioSleeper, retry::is_retryable, || {
                    self.fetch_pull_request(reference, options)
                })
                .await
                .map_err(|error| error.with_operation("fetch pull request")),
            ResourceKind::Discussion => self
                .retry
                .run(&TokioSleeper, retry::is_retryable, || {
                    self.fetch_discussion(reference, options)
                })
                .await
                .map_err(|error| error.with_operation("fetch discussion")),
        }
    }
}
