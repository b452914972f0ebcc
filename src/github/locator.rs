//! Resource identity: URL parsing and REST path construction.
//!
//! A [`ResourceRef`] pins down exactly one remote resource (owner, repository,
//! number, kind) together with its canonical browser URL. It is produced by
//! [`ResourceRef::parse`] and never mutated afterwards; the fetch layer only
//! reads from it.

use std::fmt;

use url::Url;

use super::error::FetchError;

/// The kind of GitHub resource behind a URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    /// A plain issue.
    Issue,
    /// A pull request.
    PullRequest,
    /// A discussion.
    Discussion,
}

impl ResourceKind {
    /// Returns the stable identifier used in reports and front matter.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Issue => "issue",
            Self::PullRequest => "pull_request",
            Self::Discussion => "discussion",
        }
    }

    /// Returns the path segment GitHub uses for this kind in browser URLs.
    #[must_use]
    pub const fn path_segment(self) -> &'static str {
        match self {
            Self::Issue => "issues",
            Self::PullRequest => "pull",
            Self::Discussion => "discussions",
        }
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Normalized identity of one GitHub resource, extracted from an input URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRef {
    /// Repository owner login.
    pub owner: String,
    /// Repository name.
    pub repo: String,
    /// Resource number within the repository.
    pub number: u64,
    /// Which kind of resource the URL points at.
    pub kind: ResourceKind,
    /// Canonical browser URL for the resource.
    pub url: String,
}

impl ResourceRef {
    /// Parses a GitHub resource URL of the form
    /// `https://github.com/{owner}/{repo}/{issues|pull|discussions}/{number}`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::InvalidUrl`] for unparsable URLs, foreign hosts,
    /// malformed paths, or non-positive numbers, and
    /// [`FetchError::UnsupportedResource`] when the kind segment is not one of
    /// the three supported kinds.
    pub fn parse(input: &str) -> Result<Self, FetchError> {
        let parsed = Url::parse(input).map_err(|error| FetchError::InvalidUrl {
            message: format!("parse {input:?}: {error}"),
        })?;

        let host = parsed.host_str().unwrap_or_default().to_lowercase();
        if host != "github.com" && host != "www.github.com" {
            return Err(FetchError::InvalidUrl {
                message: format!("unsupported host {host:?}"),
            });
        }

        let segments: Vec<&str> = parsed
            .path_segments()
            .map(|path| path.filter(|segment| !segment.is_empty()).collect())
            .unwrap_or_default();
        let [owner, repo, kind_segment, number_text] = segments.as_slice() else {
            return Err(FetchError::InvalidUrl {
                message: "path must be /{owner}/{repo}/{kind}/{number}".to_owned(),
            });
        };

        let kind = resolve_kind(kind_segment)?;
        let number: u64 = number_text.parse().map_err(|_| FetchError::InvalidUrl {
            message: format!("resource number {number_text:?} must be a positive integer"),
        })?;
        if number == 0 {
            return Err(FetchError::InvalidUrl {
                message: "resource number must be a positive integer".to_owned(),
            });
        }

        Ok(Self {
            owner: (*owner).to_owned(),
            repo: (*repo).to_owned(),
            number,
            kind,
            url: format!("https://github.com/{owner}/{repo}/{kind_segment}/{number}"),
        })
    }

    /// REST path for the issue envelope of this resource number.
    ///
    /// Pull requests are dual-homed: the same number also resolves as an
    /// issue, which is where aggregate reactions live.
    #[must_use]
    pub fn issue_path(&self) -> String {
        format!("/repos/{}/{}/issues/{}", self.owner, self.repo, self.number)
    }

    /// REST path for the pull request envelope.
    #[must_use]
    pub fn pull_request_path(&self) -> String {
        format!("/repos/{}/{}/pulls/{}", self.owner, self.repo, self.number)
    }

    /// REST path listing issue (conversation) comments.
    #[must_use]
    pub fn issue_comments_path(&self) -> String {
        format!(
            "/repos/{}/{}/issues/{}/comments",
            self.owner, self.repo, self.number
        )
    }

    /// REST path listing pull request reviews.
    #[must_use]
    pub fn reviews_path(&self) -> String {
        format!(
            "/repos/{}/{}/pulls/{}/reviews",
            self.owner, self.repo, self.number
        )
    }

    /// REST path listing inline review comments.
    #[must_use]
    pub fn review_comments_path(&self) -> String {
        format!(
            "/repos/{}/{}/pulls/{}/comments",
            self.owner, self.repo, self.number
        )
    }
}

fn resolve_kind(segment: &str) -> Result<ResourceKind, FetchError> {
    match segment {
        "issues" => Ok(ResourceKind::Issue),
        "pull" => Ok(ResourceKind::PullRequest),
        "discussions" => Ok(ResourceKind::Discussion),
        other => Err(FetchError::UnsupportedResource {
            kind: other.to_owned(),
        }),
    }
}
