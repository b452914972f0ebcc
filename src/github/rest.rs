//! Octocrab-backed REST client.
//!
//! Exposes narrow, resource-shaped operations rather than a generic request
//! method. List operations walk pagination to completion before returning, so
//! callers never observe partial pages. No retry logic lives here; the
//! dispatcher layers that on.

use http::Uri;
use octocrab::{Octocrab, Page};
use serde::Deserialize;
use tracing::debug;

use super::error::FetchError;
use super::fetcher::Config;
use super::locator::ResourceRef;
use super::models::{Label, ReactionSummary};

const PER_PAGE: &str = "100";

/// Authenticated REST client bound to one base URL.
pub struct RestClient {
    client: Octocrab,
}

impl RestClient {
    /// Builds the client from fetch configuration.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Configuration`] when the base URL cannot be
    /// parsed or the underlying client cannot be constructed.
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let base_uri: Uri =
            config
                .rest_base_url
                .parse()
                .map_err(|error| FetchError::Configuration {
                    message: format!("parse REST base URL {:?}: {error}", config.rest_base_url),
                })?;

        let mut builder = Octocrab::builder();
        if let Some(token) = config.token.as_deref() {
            builder = builder.personal_token(token.to_owned());
        }

        let client = builder
            .base_uri(base_uri)
            .map_err(|error| FetchError::Configuration {
                message: format!("set REST base URL: {error}"),
            })?
            .build()
            .map_err(|error| FetchError::Configuration {
                message: format!("build REST client: {error}"),
            })?;

        Ok(Self { client })
    }

    /// Fetches the issue envelope for a resource number.
    ///
    /// # Errors
    ///
    /// Returns the mapped transport failure; see [`FetchError`].
    pub async fn issue(&self, reference: &ResourceRef) -> Result<ApiIssue, FetchError> {
        self.client
            .get(reference.issue_path(), None::<&()>)
            .await
            .map_err(|error| map_octocrab_error("get issue", &error))
    }

    /// Fetches the pull request envelope for a resource number.
    ///
    /// # Errors
    ///
    /// Returns the mapped transport failure; see [`FetchError`].
    pub async fn pull_request(&self, reference: &ResourceRef) -> Result<ApiPullRequest, FetchError> {
        self.client
            .get(reference.pull_request_path(), None::<&()>)
            .await
            .map_err(|error| map_octocrab_error("get pull request", &error))
    }

    /// Lists every issue (conversation) comment, walking all pages.
    ///
    /// # Errors
    ///
    /// Returns the mapped transport failure; see [`FetchError`].
    pub async fn issue_comments(
        &self,
        reference: &ResourceRef,
    ) -> Result<Vec<ApiIssueComment>, FetchError> {
        self.all_pages("list issue comments", reference.issue_comments_path())
            .await
    }

    /// Lists every pull request review, walking all pages.
    ///
    /// # Errors
    ///
    /// Returns the mapped transport failure; see [`FetchError`].
    pub async fn reviews(&self, reference: &ResourceRef) -> Result<Vec<ApiReview>, FetchError> {
        self.all_pages("list pull request reviews", reference.reviews_path())
            .await
    }

    /// Lists every inline review comment, walking all pages.
    ///
    /// # Errors
    ///
    /// Returns the mapped transport failure; see [`FetchError`].
    pub async fn review_comments(
        &self,
        reference: &ResourceRef,
    ) -> Result<Vec<ApiReviewComment>, FetchError> {
        self.all_pages("list pull request review comments", reference.review_comments_path())
            .await
    }

    async fn all_pages<T>(&self, operation: &str, path: String) -> Result<Vec<T>, FetchError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let first: Page<T> = self
            .client
            .get(&path, Some(&[("per_page", PER_PAGE)]))
            .await
            .map_err(|error| map_octocrab_error(operation, &error))?;

        let items = self
            .client
            .all_pages(first)
            .await
            .map_err(|error| map_octocrab_error(operation, &error))?;

        debug!(path = %path, count = items.len(), "listed REST resource");
        Ok(items)
    }
}

const fn is_network_error(error: &octocrab::Error) -> bool {
    matches!(
        error,
        octocrab::Error::Http { .. }
            | octocrab::Error::Hyper { .. }
            | octocrab::Error::Service { .. }
    )
}

pub(super) fn map_octocrab_error(operation: &str, error: &octocrab::Error) -> FetchError {
    if let octocrab::Error::GitHub { source, .. } = error {
        return FetchError::Status {
            status: source.status_code.as_u16(),
            message: format!("{operation}: {message}", message = source.message),
        };
    }

    if is_network_error(error) {
        let message = format!("{operation}: {error}");
        let lowered = message.to_lowercase();
        if lowered.contains("timed out") || lowered.contains("timeout") {
            return FetchError::Timeout { message };
        }
        if lowered.contains("connect") {
            return FetchError::Connect { message };
        }
        return FetchError::Network { message };
    }

    FetchError::Decode {
        message: format!("{operation}: {error}"),
    }
}

// --- Wire types ---------------------------------------------------------
//
// Deliberately hand-rolled rather than octocrab's model types: timestamps
// must survive verbatim as strings, and only the fields the unified model
// needs are deserialized.

/// REST user object.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiUser {
    /// User login.
    pub login: Option<String>,
}

/// REST label object.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiLabel {
    /// Label name.
    pub name: Option<String>,
}

/// REST reaction rollup.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ApiReactions {
    /// 👍 count.
    #[serde(rename = "+1", default)]
    pub plus_one: u32,
    /// 👎 count.
    #[serde(rename = "-1", default)]
    pub minus_one: u32,
    /// 😄 count.
    #[serde(default)]
    pub laugh: u32,
    /// 🎉 count.
    #[serde(default)]
    pub hooray: u32,
    /// 😕 count.
    #[serde(default)]
    pub confused: u32,
    /// ❤️ count.
    #[serde(default)]
    pub heart: u32,
    /// 🚀 count.
    #[serde(default)]
    pub rocket: u32,
    /// 👀 count.
    #[serde(default)]
    pub eyes: u32,
    /// Total across all reaction kinds.
    #[serde(default)]
    pub total_count: u32,
}

impl From<ApiReactions> for ReactionSummary {
    fn from(value: ApiReactions) -> Self {
        Self {
            plus_one: value.plus_one,
            minus_one: value.minus_one,
            laugh: value.laugh,
            hooray: value.hooray,
            confused: value.confused,
            heart: value.heart,
            rocket: value.rocket,
            eyes: value.eyes,
            total: value.total_count,
        }
    }
}

/// REST issue envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiIssue {
    /// Issue number.
    pub number: u64,
    /// Issue title.
    pub title: Option<String>,
    /// Issue state.
    pub state: Option<String>,
    /// Issue author.
    pub user: Option<ApiUser>,
    /// Creation timestamp, verbatim.
    pub created_at: Option<String>,
    /// Last-update timestamp, verbatim.
    pub updated_at: Option<String>,
    /// Browser URL.
    pub html_url: Option<String>,
    /// Description body.
    pub body: Option<String>,
    /// Attached labels.
    #[serde(default)]
    pub labels: Vec<ApiLabel>,
    /// Aggregate reactions.
    pub reactions: Option<ApiReactions>,
}

/// REST pull request envelope.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiPullRequest {
    /// Pull request number.
    pub number: u64,
    /// Pull request title.
    pub title: Option<String>,
    /// Pull request state.
    pub state: Option<String>,
    /// Pull request author.
    pub user: Option<ApiUser>,
    /// Creation timestamp, verbatim.
    pub created_at: Option<String>,
    /// Last-update timestamp, verbatim.
    pub updated_at: Option<String>,
    /// Browser URL.
    pub html_url: Option<String>,
    /// Description body.
    pub body: Option<String>,
    /// Attached labels.
    #[serde(default)]
    pub labels: Vec<ApiLabel>,
    /// Whether the pull request was merged.
    #[serde(default)]
    pub merged: bool,
    /// Merge timestamp, verbatim.
    pub merged_at: Option<String>,
    /// Inline review comment count.
    #[serde(default)]
    pub review_comments: u32,
}

/// REST issue comment.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiIssueComment {
    /// Comment identifier.
    pub id: u64,
    /// Comment author.
    pub user: Option<ApiUser>,
    /// Comment body.
    pub body: Option<String>,
    /// Creation timestamp, verbatim.
    pub created_at: Option<String>,
    /// Last-update timestamp, verbatim.
    pub updated_at: Option<String>,
    /// Browser URL.
    pub html_url: Option<String>,
    /// Reactions on the comment.
    pub reactions: Option<ApiReactions>,
}

/// REST pull request review.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiReview {
    /// Review identifier.
    pub id: u64,
    /// Reviewer.
    pub user: Option<ApiUser>,
    /// Review state, e.g. `APPROVED`.
    pub state: Option<String>,
    /// Review summary body.
    pub body: Option<String>,
    /// Submission timestamp, verbatim.
    pub submitted_at: Option<String>,
}

/// REST inline review comment.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiReviewComment {
    /// Comment identifier.
    pub id: u64,
    /// Comment author.
    pub user: Option<ApiUser>,
    /// Comment body.
    pub body: Option<String>,
    /// Creation timestamp, verbatim.
    pub created_at: Option<String>,
    /// Last-update timestamp, verbatim.
    pub updated_at: Option<String>,
    /// Browser URL.
    pub html_url: Option<String>,
    /// Reactions on the comment.
    pub reactions: Option<ApiReactions>,
    /// Identifier of the review this comment belongs to, when known.
    pub pull_request_review_id: Option<u64>,
}

pub(super) fn map_labels(labels: Vec<ApiLabel>) -> Vec<Label> {
    labels
        .into_iter()
        .map(|label| Label {
            name: label.name.unwrap_or_default(),
        })
        .collect()
}

pub(super) fn map_reactions(reactions: Option<ApiReactions>) -> ReactionSummary {
    reactions.map(Into::into).unwrap_or_default()
}

pub(super) fn login(user: Option<ApiUser>) -> String {
    user.and_then(|user| user.login).unwrap_or_default()
}
