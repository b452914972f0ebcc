//! Discussion fetching, reply exhaustion, and accepted-answer resolution.
//!
//! Discussions live entirely behind GraphQL. One cursor-paginated query walks
//! the top-level comments; each comment arrives with up to one inline page of
//! replies, and comments whose reply connection reports a further page get a
//! dedicated reply-pagination query afterwards so the tree is always
//! complete.

use serde::Deserialize;
use serde_json::{Map, Value};

use super::error::FetchError;
use super::fetcher::GithubFetcher;
use super::graphql::PageInfo;
use super::locator::{ResourceKind, ResourceRef};
use super::models::{CommentNode, FetchOptions, IssueData, Metadata, ReactionSummary};

const DISCUSSION_QUERY_WITH_COMMENTS: &str = r"
query DiscussionPage($owner: String!, $repo: String!, $number: Int!, $after: String) {
  repository(owner: $owner, name: $repo) {
    discussion(number: $number) {
      number
      title
      body
      url
      createdAt
      updatedAt
      closed
      author { login }
      category { name }
      isAnswered
      answer {
        id
        author { login }
      }
      reactions { plusOne heart total }
      comments(first: 50, after: $after) {
        nodes {
          id
          body
          createdAt
          updatedAt
          url
          author { login }
          reactions { plusOne heart total }
          replies(first: 50) {
            nodes {
              id
              body
              createdAt
              updatedAt
              url
              author { login }
              reactions { plusOne heart total }
            }
            pageInfo { hasNextPage endCursor }
          }
        }
        pageInfo { hasNextPage endCursor }
      }
    }
  }
}
";

const DISCUSSION_QUERY_METADATA_ONLY: &str = r"
query DiscussionPage($owner: String!, $repo: String!, $number: Int!) {
  repository(owner: $owner, name: $repo) {
    discussion(number: $number) {
      number
      title
      body
      url
      createdAt
      updatedAt
      closed
      author { login }
      category { name }
      isAnswered
      answer {
        id
        author { login }
      }
      reactions { plusOne heart total }
    }
  }
}
";

const DISCUSSION_REPLIES_QUERY: &str = r"
query DiscussionReplies($commentId: ID!, $after: String) {
  node(id: $commentId) {
    ... on DiscussionComment {
      replies(first: 50, after: $after) {
        nodes {
          id
          body
          createdAt
          updatedAt
          url
          author { login }
          reactions { plusOne heart total }
        }
        pageInfo { hasNextPage endCursor }
      }
    }
  }
}
";

#[derive(Debug, Deserialize)]
struct DiscussionPayload {
    #[serde(default)]
    repository: Option<DiscussionRepository>,
}

#[derive(Debug, Deserialize)]
struct DiscussionRepository {
    #[serde(default)]
    discussion: Option<DiscussionNode>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct DiscussionNode {
    #[serde(default)]
    number: u64,
    #[serde(default)]
    title: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    created_at: String,
    #[serde(default)]
    updated_at: String,
    #[serde(default)]
    closed: bool,
    #[serde(default)]
    author: GqlAuthor,
    #[serde(default)]
    category: GqlCategory,
    #[serde(default)]
    is_answered: bool,
    #[serde(default)]
    answer: Option<GqlAnswer>,
    #[serde(default)]
    reactions: GqlReactions,
    #[serde(default)]
    comments: Option<GqlCommentConnection>,
}

#[derive(Debug, Default, Deserialize)]
struct GqlAuthor {
    #[serde(default)]
    login: String,
}

#[derive(Debug, Default, Deserialize)]
struct GqlCategory {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct GqlAnswer {
    #[serde(default)]
    id: String,
    #[serde(default)]
    author: Option<GqlAuthor>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GqlReactions {
    #[serde(default)]
    plus_one: u32,
    #[serde(default)]
    heart: u32,
    #[serde(default)]
    total: u32,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GqlCommentConnection {
    #[serde(default)]
    nodes: Vec<GqlComment>,
    #[serde(default)]
    page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GqlComment {
    #[serde(default)]
    id: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    created_at: String,
    #[serde(default)]
    updated_at: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    author: GqlAuthor,
    #[serde(default)]
    reactions: GqlReactions,
    #[serde(default)]
    replies: GqlReplyConnection,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GqlReplyConnection {
    #[serde(default)]
    nodes: Vec<GqlReply>,
    #[serde(default)]
    page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GqlReply {
    #[serde(default)]
    id: String,
    #[serde(default)]
    body: String,
    #[serde(default)]
    created_at: String,
    #[serde(default)]
    updated_at: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    author: GqlAuthor,
    #[serde(default)]
    reactions: GqlReactions,
}

#[derive(Debug, Deserialize)]
struct RepliesPayload {
    #[serde(default)]
    node: Option<RepliesNode>,
}

#[derive(Debug, Deserialize)]
struct RepliesNode {
    #[serde(default)]
    replies: GqlReplyConnection,
}

/// A comment whose inline reply page indicated more data upstream.
struct PendingReplies {
    comment_index: usize,
    comment_id: String,
    cursor: String,
}

impl GithubFetcher {
    pub(super) async fn fetch_discussion(
        &self,
        reference: &ResourceRef,
        options: FetchOptions,
    ) -> Result<IssueData, FetchError> {
        let document = if options.include_comments {
            DISCUSSION_QUERY_WITH_COMMENTS
        } else {
            DISCUSSION_QUERY_METADATA_ONLY
        };

        let mut variables = Map::new();
        variables.insert("owner".to_owned(), Value::String(reference.owner.clone()));
        variables.insert("repo".to_owned(), Value::String(reference.repo.clone()));
        variables.insert("number".to_owned(), Value::from(reference.number));

        let mut meta: Option<Metadata> = None;
        let mut description = String::new();
        let mut reactions = ReactionSummary::default();
        let mut thread: Vec<CommentNode> = Vec::new();
        let mut pending: Vec<PendingReplies> = Vec::new();

        self.graphql
            .query_paginated(document, variables, |page| {
                let payload: DiscussionPayload =
                    serde_json::from_value(page).map_err(|error| FetchError::Decode {
                        message: format!("decode discussion page: {error}"),
                    })?;
                let discussion = payload
                    .repository
                    .and_then(|repository| repository.discussion)
                    .ok_or(FetchError::NotFound)?;

                if meta.is_none() {
                    meta = Some(map_discussion_metadata(&discussion));
                    description = discussion.body;
                    reactions = map_gql_reactions(&discussion.reactions);
                }

                if !options.include_comments {
                    return Ok(PageInfo::default());
                }

                let connection = discussion.comments.unwrap_or_default();
                for comment in connection.nodes {
                    let (node, more) = map_discussion_comment(comment);
                    if let Some(cursor) = more {
                        pending.push(PendingReplies {
                            comment_index: thread.len(),
                            comment_id: node.id.clone(),
                            cursor,
                        });
                    }
                    thread.push(node);
                }
                Ok(connection.page_info)
            })
            .await
            .map_err(|error| error.with_operation("fetch discussion pages"))?;

        for item in pending {
            let extra = self
                .fetch_discussion_replies(&item.comment_id, &item.cursor)
                .await
                .map_err(|error| error.with_operation("fetch additional discussion replies"))?;
            if let Some(comment) = thread.get_mut(item.comment_index) {
                comment.replies.extend(extra);
            }
        }

        let mut data = IssueData::new(ResourceKind::Discussion);
        data.meta = meta.unwrap_or_else(|| Metadata::new(ResourceKind::Discussion));
        data.description = description;
        data.reactions = reactions;
        data.thread = thread;
        Ok(data)
    }

    async fn fetch_discussion_replies(
        &self,
        comment_id: &str,
        initial_cursor: &str,
    ) -> Result<Vec<CommentNode>, FetchError> {
        let mut variables = Map::new();
        variables.insert(
            "commentId".to_owned(),
            Value::String(comment_id.to_owned()),
        );
        variables.insert("after".to_owned(), Value::String(initial_cursor.to_owned()));

        let mut replies = Vec::new();
        self.graphql
            .query_paginated(DISCUSSION_REPLIES_QUERY, variables, |page| {
                let payload: RepliesPayload =
                    serde_json::from_value(page).map_err(|error| FetchError::Decode {
                        message: format!("decode discussion replies page: {error}"),
                    })?;
                let node = payload.node.ok_or(FetchError::NotFound)?;

                replies.extend(node.replies.nodes.into_iter().map(map_reply));
                Ok(node.replies.page_info)
            })
            .await?;

        Ok(replies)
    }
}

fn map_discussion_metadata(discussion: &DiscussionNode) -> Metadata {
    let (accepted_answer_id, accepted_answer_author) = match &discussion.answer {
        Some(answer) => (
            non_empty(&answer.id),
            answer
                .author
                .as_ref()
                .and_then(|author| non_empty(&author.login)),
        ),
        None => (None, None),
    };

    Metadata {
        title: discussion.title.clone(),
        number: discussion.number,
        state: if discussion.closed { "closed" } else { "open" }.to_owned(),
        author: discussion.author.login.clone(),
        created_at: discussion.created_at.clone(),
        updated_at: discussion.updated_at.clone(),
        url: discussion.url.clone(),
        category: non_empty(&discussion.category.name),
        is_answered: discussion.is_answered,
        accepted_answer_id,
        accepted_answer_author,
        ..Metadata::new(ResourceKind::Discussion)
    }
}

fn non_empty(value: &str) -> Option<String> {
    if value.is_empty() {
        None
    } else {
        Some(value.to_owned())
    }
}

fn map_gql_reactions(reactions: &GqlReactions) -> ReactionSummary {
    ReactionSummary {
        plus_one: reactions.plus_one,
        heart: reactions.heart,
        total: reactions.total,
        ..ReactionSummary::default()
    }
}

/// Maps one top-level comment; returns the cursor for any replies still
/// upstream.
fn map_discussion_comment(comment: GqlComment) -> (CommentNode, Option<String>) {
    let more = if comment.replies.page_info.has_next_page {
        comment.replies.page_info.end_cursor.clone()
    } else {
        None
    };

    let node = CommentNode {
        id: comment.id,
        author: comment.author.login,
        body: comment.body,
        created_at: comment.created_at,
        updated_at: comment.updated_at,
        url: comment.url,
        reactions: map_gql_reactions(&comment.reactions),
        replies: comment.replies.nodes.into_iter().map(map_reply).collect(),
    };
    (node, more)
}

fn map_reply(reply: GqlReply) -> CommentNode {
    CommentNode {
        id: reply.id,
        author: reply.author.login,
        body: reply.body,
        created_at: reply.created_at,
        updated_at: reply.updated_at,
        url: reply.url,
        reactions: map_gql_reactions(&reply.reactions),
        replies: Vec::new(),
    }
}

/// Resolves the accepted answer inside a discussion thread.
///
/// An exact node-ID match anywhere in the tree takes strict precedence over
/// an author match, because an author can post several comments; the author
/// fallback only runs when the ID search finds nothing.
#[must_use]
pub fn resolve_accepted_answer<'thread>(
    thread: &'thread [CommentNode],
    accepted_id: Option<&str>,
    accepted_author: Option<&str>,
) -> Option<&'thread CommentNode> {
    if let Some(id) = accepted_id {
        if let Some(found) = find_by_id(thread, id) {
            return Some(found);
        }
    }
    accepted_author.and_then(|author| find_by_author(thread, author))
}

fn find_by_id<'thread>(nodes: &'thread [CommentNode], id: &str) -> Option<&'thread CommentNode> {
    for node in nodes {
        if node.id == id {
            return Some(node);
        }
        if let Some(nested) = find_by_id(&node.replies, id) {
            return Some(nested);
        }
    }
    None
}

fn find_by_author<'thread>(
    nodes: &'thread [CommentNode],
    author: &str,
) -> Option<&'thread CommentNode> {
    for node in nodes {
        if node.author == author {
            return Some(node);
        }
        if let Some(nested) = find_by_author(&node.replies, author) {
            return Some(nested);
        }
    }
    None
}
