//! Pull request fetching and review/comment reconciliation.
//!
//! Pull requests are dual-homed in the REST API: the same number resolves as
//! a pull request and as an issue, and only the issue envelope carries
//! aggregate reactions. When comments are requested, inline review comments
//! are partitioned by their review ID: matches nest under the review,
//! orphans are preserved in the top-level thread behind the conversation
//! comments so no commentary is lost to referential mismatches.

use std::collections::HashMap;

use super::error::FetchError;
use super::fetcher::GithubFetcher;
use super::locator::{ResourceKind, ResourceRef};
use super::models::{CommentNode, FetchOptions, IssueData, Metadata, ReviewData};
use super::rest::{ApiReview, ApiReviewComment, login, map_labels, map_reactions};

impl GithubFetcher {
    pub(super) async fn fetch_pull_request(
        &self,
        reference: &ResourceRef,
        options: FetchOptions,
    ) -> Result<IssueData, FetchError> {
        let pull_request = self
            .rest
            .pull_request(reference)
            .await
            .map_err(|error| error.with_operation("fetch pull request resource"))?;

        let issue_envelope = self
            .rest
            .issue(reference)
            .await
            .map_err(|error| error.with_operation("fetch pull request issue envelope"))?;

        let mut data = IssueData::new(ResourceKind::PullRequest);
        data.meta = Metadata {
            title: pull_request.title.unwrap_or_default(),
            number: pull_request.number,
            state: pull_request.state.unwrap_or_default(),
            author: login(pull_request.user),
            created_at: pull_request.created_at.unwrap_or_default(),
            updated_at: pull_request.updated_at.unwrap_or_default(),
            url: pull_request.html_url.unwrap_or_default(),
            labels: map_labels(pull_request.labels),
            merged: pull_request.merged,
            merged_at: pull_request.merged_at,
            review_count: pull_request.review_comments,
            ..Metadata::new(ResourceKind::PullRequest)
        };
        data.description = pull_request.body.unwrap_or_default();
        data.reactions = map_reactions(issue_envelope.reactions);

        if !options.include_comments {
            return Ok(data);
        }

        let conversation = self
            .rest
            .issue_comments(reference)
            .await
            .map_err(|error| error.with_operation("fetch pull request conversation"))?;
        data.thread = super::issue::map_conversation_comments(conversation);

        let reviews = self
            .rest
            .reviews(reference)
            .await
            .map_err(|error| error.with_operation("fetch pull request reviews"))?;
        let review_index: HashMap<u64, usize> = reviews
            .iter()
            .enumerate()
            .map(|(index, review)| (review.id, index))
            .collect();
        data.reviews = reviews.into_iter().map(map_review).collect();

        let review_comments = self
            .rest
            .review_comments(reference)
            .await
            .map_err(|error| error.with_operation("fetch pull request review comments"))?;
        for comment in review_comments {
            let review_slot = comment
                .pull_request_review_id
                .and_then(|review_id| review_index.get(&review_id))
                .and_then(|index| data.reviews.get_mut(*index));
            let node = map_review_comment(comment);
            match review_slot {
                Some(review) => review.comments.push(node),
                // Orphaned review comments keep their place in the thread.
                None => data.thread.push(node),
            }
        }

        Ok(data)
    }
}

fn map_review(review: ApiReview) -> ReviewData {
    ReviewData {
        id: review.id.to_string(),
        state: review.state.unwrap_or_default(),
        author: login(review.user),
        body: review.body.unwrap_or_default(),
        created_at: review.submitted_at.unwrap_or_default(),
        ..ReviewData::default()
    }
}

fn map_review_comment(comment: ApiReviewComment) -> CommentNode {
    CommentNode {
        id: comment.id.to_string(),
        author: login(comment.user),
        body: comment.body.unwrap_or_default(),
        created_at: comment.created_at.unwrap_or_default(),
        updated_at: comment.updated_at.unwrap_or_default(),
        url: comment.html_url.unwrap_or_default(),
        reactions: map_reactions(comment.reactions),
        replies: Vec::new(),
    }
}
