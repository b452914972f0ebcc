//! The unified data model produced by the fetch layer.
//!
//! These types are the sole payload handed to rendering and other
//! collaborators. Timestamps are ISO-8601 strings preserved exactly as the
//! API returned them, including any offset.

use super::locator::ResourceKind;

/// Fetch-time behavior toggles, scoped to a single request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FetchOptions {
    /// When false, the comment/reply/review-comment sub-calls are skipped
    /// entirely rather than merely filtered from the output.
    pub include_comments: bool,
}

impl Default for FetchOptions {
    fn default() -> Self {
        Self {
            include_comments: true,
        }
    }
}

/// Minimal label data needed for output rendering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Label {
    /// Label name.
    pub name: String,
}

/// Aggregate reaction counts on an issue, comment, or discussion.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReactionSummary {
    /// 👍 count.
    pub plus_one: u32,
    /// 👎 count.
    pub minus_one: u32,
    /// 😄 count.
    pub laugh: u32,
    /// 🎉 count.
    pub hooray: u32,
    /// 😕 count.
    pub confused: u32,
    /// ❤️ count.
    pub heart: u32,
    /// 🚀 count.
    pub rocket: u32,
    /// 👀 count.
    pub eyes: u32,
    /// Total across all reaction kinds.
    pub total: u32,
}

/// Top-level fields used in front matter and the metadata section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Metadata {
    /// Which resource kind this document describes.
    pub kind: ResourceKind,
    /// Resource title.
    pub title: String,
    /// Resource number.
    pub number: u64,
    /// Resource state, e.g. `open` or `closed`.
    pub state: String,
    /// Author login.
    pub author: String,
    /// Creation timestamp, verbatim from the API.
    pub created_at: String,
    /// Last-update timestamp, verbatim from the API.
    pub updated_at: String,
    /// Canonical browser URL.
    pub url: String,
    /// Labels attached to the resource.
    pub labels: Vec<Label>,

    /// Whether the pull request was merged. Always false for other kinds.
    pub merged: bool,
    /// Merge timestamp for merged pull requests.
    pub merged_at: Option<String>,
    /// Inline review comment count reported by the pull request envelope.
    pub review_count: u32,

    /// Discussion category name.
    pub category: Option<String>,
    /// Whether the discussion is marked answered.
    pub is_answered: bool,
    /// Node ID of the accepted answer, when the platform reports one.
    pub accepted_answer_id: Option<String>,
    /// Author login of the accepted answer, when present.
    pub accepted_answer_author: Option<String>,
}

impl Metadata {
    /// Creates metadata with the common fields set and all type-conditional
    /// fields cleared.
    #[must_use]
    pub const fn new(kind: ResourceKind) -> Self {
        Self {
            kind,
            title: String::new(),
            number: 0,
            state: String::new(),
            author: String::new(),
            created_at: String::new(),
            updated_at: String::new(),
            url: String::new(),
            labels: Vec::new(),
            merged: false,
            merged_at: None,
            review_count: 0,
            category: None,
            is_answered: false,
            accepted_answer_id: None,
            accepted_answer_author: None,
        }
    }
}

/// One normalized timeline event.
///
/// Two events are the same event exactly when all four fields match; the
/// issue fetcher deduplicates on that equality, keeping the first occurrence.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TimelineEvent {
    /// Normalized event type, e.g. `opened`, `closed`, `labeled`.
    pub event_type: String,
    /// Login of the acting user.
    pub actor: String,
    /// Event timestamp, verbatim from the API.
    pub created_at: String,
    /// Event-specific detail (label name, assignee, milestone title).
    pub details: String,
}

/// One comment and its nested replies.
///
/// Replies form a tree by construction; a reply never points back at an
/// ancestor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommentNode {
    /// Comment identifier (REST numeric ID or GraphQL node ID).
    pub id: String,
    /// Author login.
    pub author: String,
    /// Comment body.
    pub body: String,
    /// Creation timestamp, verbatim from the API.
    pub created_at: String,
    /// Last-update timestamp, verbatim from the API.
    pub updated_at: String,
    /// Browser URL of the comment.
    pub url: String,
    /// Reactions on this comment.
    pub reactions: ReactionSummary,
    /// Nested replies, in upstream order.
    pub replies: Vec<CommentNode>,
}

/// One code-review verdict with the inline comments that belong to it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReviewData {
    /// Review identifier.
    pub id: String,
    /// Review state, e.g. `APPROVED` or `CHANGES_REQUESTED`.
    pub state: String,
    /// Reviewer login.
    pub author: String,
    /// Review summary body.
    pub body: String,
    /// Submission timestamp, verbatim from the API.
    pub created_at: String,
    /// Reactions on the review body.
    pub reactions: ReactionSummary,
    /// Inline comments attached to this review.
    pub comments: Vec<CommentNode>,
}

/// The unified document produced by a successful fetch.
///
/// Ownership transfers fully to the caller; the fetch layer keeps no state
/// behind it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueData {
    /// Top-level metadata.
    pub meta: Metadata,
    /// Original description body.
    pub description: String,
    /// Aggregate reactions on the resource itself.
    pub reactions: ReactionSummary,
    /// Normalized timeline (issues only; empty otherwise).
    pub timeline: Vec<TimelineEvent>,
    /// Reviews with their nested comments (pull requests only).
    pub reviews: Vec<ReviewData>,
    /// Top-level conversation thread.
    pub thread: Vec<CommentNode>,
}

impl IssueData {
    /// Creates an empty document of the given kind.
    #[must_use]
    pub const fn new(kind: ResourceKind) -> Self {
        Self {
            meta: Metadata::new(kind),
            description: String::new(),
            reactions: ReactionSummary {
                plus_one: 0,
                minus_one: 0,
                laugh: 0,
                hooray: 0,
                confused: 0,
                heart: 0,
                rocket: 0,
                eyes: 0,
                total: 0,
            },
            timeline: Vec::new(),
            reviews: Vec::new(),
            thread: Vec::new(),
        }
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod test_support {
    //! Fixture builders shared by unit, export, and integration tests.

    use super::{CommentNode, IssueData, Label, Metadata, ReactionSummary, TimelineEvent};
    use crate::github::locator::ResourceKind;

    /// Builds a comment with the given identity and no replies.
    #[must_use]
    pub fn comment(id: &str, author: &str, body: &str) -> CommentNode {
        CommentNode {
            id: id.to_owned(),
            author: author.to_owned(),
            body: body.to_owned(),
            created_at: "2025-03-01T10:00:00Z".to_owned(),
            updated_at: "2025-03-01T10:00:00Z".to_owned(),
            url: format!("https://github.com/octocat/hello/comments/{id}"),
            reactions: ReactionSummary::default(),
            replies: Vec::new(),
        }
    }

    /// Builds a timeline event.
    #[must_use]
    pub fn event(event_type: &str, actor: &str, created_at: &str, details: &str) -> TimelineEvent {
        TimelineEvent {
            event_type: event_type.to_owned(),
            actor: actor.to_owned(),
            created_at: created_at.to_owned(),
            details: details.to_owned(),
        }
    }

    /// Builds a small issue document with one label and an empty thread.
    #[must_use]
    pub fn sample_issue() -> IssueData {
        let mut data = IssueData::new(ResourceKind::Issue);
        data.meta = Metadata {
            title: "Flaky test in parser".to_owned(),
            number: 42,
            state: "open".to_owned(),
            author: "octocat".to_owned(),
            created_at: "2025-03-01T09:30:00Z".to_owned(),
            updated_at: "2025-03-02T11:00:00Z".to_owned(),
            url: "https://github.com/octocat/hello/issues/42".to_owned(),
            labels: vec![Label {
                name: "bug".to_owned(),
            }],
            ..Metadata::new(ResourceKind::Issue)
        };
        data.description = "The parser test fails on CI about once a week.".to_owned();
        data.timeline = vec![event("opened", "octocat", "2025-03-01T09:30:00Z", "")];
        data
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::test_support::event;
    use super::{CommentNode, FetchOptions};

    #[test]
    fn fetch_options_default_to_including_comments() {
        assert!(FetchOptions::default().include_comments);
    }

    #[test]
    fn timeline_events_hash_on_full_value() {
        let mut seen = HashSet::new();
        assert!(seen.insert(event("closed", "octocat", "2025-01-01T00:00:00Z", "")));
        assert!(!seen.insert(event("closed", "octocat", "2025-01-01T00:00:00Z", "")));
        assert!(seen.insert(event("closed", "octocat", "2025-01-01T00:00:01Z", "")));
    }

    #[test]
    fn comment_nodes_compare_including_replies() {
        let mut left = CommentNode {
            id: "c1".to_owned(),
            ..CommentNode::default()
        };
        let right = left.clone();
        assert_eq!(left, right);

        left.replies.push(CommentNode::default());
        assert_ne!(left, right);
    }
}
