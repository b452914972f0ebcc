//! GitHub fetch layer: protocol clients, per-resource fetchers, and error
//! classification.
//!
//! The same logical resource is exposed by GitHub through two incompatible
//! protocols: page-numbered REST and cursor-paginated GraphQL. This module
//! hides that split: callers hand a [`ResourceRef`] to a [`ResourceFetcher`]
//! and receive one normalized [`IssueData`], with transient failures retried
//! and permanent ones classifiable through [`classify`].

pub mod classify;
pub mod discussion;
pub mod error;
pub mod fetcher;
pub mod graphql;
pub mod issue;
pub mod locator;
pub mod models;
pub mod pull_request;
pub mod rest;
pub mod retry;

pub use discussion::resolve_accepted_answer;
pub use error::FetchError;
pub use fetcher::{Config, GithubFetcher, ResourceFetcher};
pub use locator::{ResourceKind, ResourceRef};
pub use models::{
    CommentNode, FetchOptions, IssueData, Label, Metadata, ReactionSummary, ReviewData,
    TimelineEvent,
};
pub use retry::{RetryPolicy, Sleeper, TokioSleeper};

#[cfg(test)]
pub use fetcher::MockResourceFetcher;
