//! Issue fetching and timeline reconciliation.
//!
//! The envelope comes from REST; timeline events come from a cursor-paginated
//! GraphQL query. A leading `opened` event is synthesized from the envelope,
//! and the merged list is deduplicated by full value-equality because the
//! GraphQL timeline sometimes reports the opening event as well.

use std::collections::HashSet;

use serde::Deserialize;
use serde_json::{Map, Value};

use super::error::FetchError;
use super::fetcher::GithubFetcher;
use super::graphql::PageInfo;
use super::locator::{ResourceKind, ResourceRef};
use super::models::{CommentNode, FetchOptions, IssueData, Metadata, TimelineEvent};
use super::rest::{ApiIssueComment, login, map_labels, map_reactions};

const ISSUE_TIMELINE_QUERY: &str = r"
query IssueTimeline($owner: String!, $repo: String!, $number: Int!, $after: String) {
  repository(owner: $owner, name: $repo) {
    issue(number: $number) {
      timelineItems(first: 100, after: $after) {
        nodes {
          __typename
          ... on ClosedEvent {
            createdAt
            actor { login }
          }
          ... on ReopenedEvent {
            createdAt
            actor { login }
          }
          ... on LabeledEvent {
            createdAt
            actor { login }
            label { name }
          }
          ... on AssignedEvent {
            createdAt
            actor { login }
            assignee { ... on User { login } }
          }
          ... on MilestonedEvent {
            createdAt
            actor { login }
            milestoneTitle
          }
          ... on LockedEvent {
            createdAt
            actor { login }
          }
        }
        pageInfo { hasNextPage endCursor }
      }
    }
  }
}
";

#[derive(Debug, Deserialize)]
struct TimelinePayload {
    #[serde(default)]
    repository: Option<TimelineRepository>,
}

#[derive(Debug, Deserialize)]
struct TimelineRepository {
    #[serde(default)]
    issue: Option<TimelineIssue>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimelineIssue {
    timeline_items: TimelineConnection,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimelineConnection {
    #[serde(default)]
    nodes: Vec<TimelineNode>,
    page_info: PageInfo,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TimelineNode {
    #[serde(rename = "__typename")]
    type_name: String,
    #[serde(default)]
    created_at: String,
    #[serde(default)]
    actor: NamedActor,
    #[serde(default)]
    label: NamedLabel,
    #[serde(default)]
    assignee: NamedActor,
    #[serde(default)]
    milestone_title: String,
}

#[derive(Debug, Default, Deserialize)]
struct NamedActor {
    #[serde(default)]
    login: String,
}

#[derive(Debug, Default, Deserialize)]
struct NamedLabel {
    #[serde(default)]
    name: String,
}

impl GithubFetcher {
    pub(super) async fn fetch_issue(
        &self,
        reference: &ResourceRef,
        options: FetchOptions,
    ) -> Result<IssueData, FetchError> {
        let issue = self
            .rest
            .issue(reference)
            .await
            .map_err(|error| error.with_operation("fetch issue resource"))?;

        let mut data = IssueData::new(ResourceKind::Issue);
        data.meta = Metadata {
            title: issue.title.unwrap_or_default(),
            number: issue.number,
            state: issue.state.unwrap_or_default(),
            author: login(issue.user),
            created_at: issue.created_at.unwrap_or_default(),
            updated_at: issue.updated_at.unwrap_or_default(),
            url: issue.html_url.unwrap_or_default(),
            labels: map_labels(issue.labels),
            ..Metadata::new(ResourceKind::Issue)
        };
        data.description = issue.body.unwrap_or_default();
        data.reactions = map_reactions(issue.reactions);

        // The REST envelope never reports the opening itself.
        data.timeline.push(TimelineEvent {
            event_type: "opened".to_owned(),
            actor: data.meta.author.clone(),
            created_at: data.meta.created_at.clone(),
            details: String::new(),
        });

        let fetched = self
            .fetch_issue_timeline(reference)
            .await
            .map_err(|error| error.with_operation("fetch issue timeline"))?;
        data.timeline.extend(fetched);
        data.timeline = dedupe_timeline_events(data.timeline);

        if options.include_comments {
            let comments = self
                .rest
                .issue_comments(reference)
                .await
                .map_err(|error| error.with_operation("fetch issue comments"))?;
            data.thread = map_conversation_comments(comments);
        }

        Ok(data)
    }

    async fn fetch_issue_timeline(
        &self,
        reference: &ResourceRef,
    ) -> Result<Vec<TimelineEvent>, FetchError> {
        let mut variables = Map::new();
        variables.insert("owner".to_owned(), Value::String(reference.owner.clone()));
        variables.insert("repo".to_owned(), Value::String(reference.repo.clone()));
        variables.insert("number".to_owned(), Value::from(reference.number));

        let mut events = Vec::new();
        self.graphql
            .query_paginated(ISSUE_TIMELINE_QUERY, variables, |page| {
                let payload: TimelinePayload =
                    serde_json::from_value(page).map_err(|error| FetchError::Decode {
                        message: format!("decode issue timeline page: {error}"),
                    })?;
                let issue = payload
                    .repository
                    .and_then(|repository| repository.issue)
                    .ok_or(FetchError::NotFound)?;

                for node in issue.timeline_items.nodes {
                    if let Some(event) = map_timeline_node(node) {
                        events.push(event);
                    }
                }
                Ok(issue.timeline_items.page_info)
            })
            .await?;

        Ok(events)
    }
}

fn map_timeline_node(node: TimelineNode) -> Option<TimelineEvent> {
    let (event_type, details) = match node.type_name.as_str() {
        "OpenedEvent" => ("opened", String::new()),
        "ClosedEvent" => ("closed", String::new()),
        "ReopenedEvent" => ("reopened", String::new()),
        "LabeledEvent" => ("labeled", node.label.name),
        "AssignedEvent" => {
            let assignee = if node.assignee.login.is_empty() {
                node.actor.login.clone()
            } else {
                node.assignee.login
            };
            ("assigned", assignee)
        }
        "MilestonedEvent" => ("milestoned", node.milestone_title),
        "LockedEvent" => ("locked", String::new()),
        _ => return None,
    };

    Some(TimelineEvent {
        event_type: event_type.to_owned(),
        actor: node.actor.login,
        created_at: node.created_at,
        details,
    })
}

/// Removes value-equal duplicates, keeping the first occurrence of each.
fn dedupe_timeline_events(events: Vec<TimelineEvent>) -> Vec<TimelineEvent> {
    let mut seen = HashSet::with_capacity(events.len());
    events
        .into_iter()
        .filter(|event| seen.insert(event.clone()))
        .collect()
}

/// Conversation comments have no reply nesting; each maps to a flat node.
///
/// Shared with the pull request fetcher, which lists the same sub-resource.
pub(super) fn map_conversation_comments(comments: Vec<ApiIssueComment>) -> Vec<CommentNode> {
    comments
        .into_iter()
        .map(|comment| CommentNode {
            id: comment.id.to_string(),
            author: login(comment.user),
            body: comment.body.unwrap_or_default(),
            created_at: comment.created_at.unwrap_or_default(),
            updated_at: comment.updated_at.unwrap_or_default(),
            url: comment.html_url.unwrap_or_default(),
            reactions: map_reactions(comment.reactions),
            replies: Vec::new(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use wiremock::matchers::{body_string_contains, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use super::super::fetcher::{Config, GithubFetcher};
    use super::super::locator::ResourceRef;
    use super::super::models::test_support::event;
    use super::super::models::FetchOptions;
    use super::{FetchError, dedupe_timeline_events};

    fn fetcher_for(server: &MockServer) -> GithubFetcher {
        let config = Config {
            rest_base_url: server.uri(),
            graphql_url: format!("{}/graphql", server.uri()),
            ..Config::default()
        };
        GithubFetcher::new(config).expect("fetcher should build")
    }

    fn issue_ref() -> ResourceRef {
        ResourceRef::parse("https://github.com/octocat/hello/issues/1").expect("valid URL")
    }

    fn issue_envelope() -> serde_json::Value {
        serde_json::json!({
            "number": 1,
            "title": "Broken build",
            "state": "closed",
            "user": { "login": "octocat" },
            "created_at": "2025-02-01T08:00:00Z",
            "updated_at": "2025-02-03T08:00:00Z",
            "html_url": "https://github.com/octocat/hello/issues/1",
            "body": "The build is red.",
            "labels": [{ "name": "ci" }],
            "reactions": { "+1": 1, "total_count": 1 }
        })
    }

    fn timeline_page(
        nodes: serde_json::Value,
        cursor: Option<&str>,
    ) -> serde_json::Value {
        serde_json::json!({
            "data": {
                "repository": {
                    "issue": {
                        "timelineItems": {
                            "nodes": nodes,
                            "pageInfo": {
                                "hasNextPage": cursor.is_some(),
                                "endCursor": cursor,
                            }
                        }
                    }
                }
            }
        })
    }

    #[test]
    fn dedupe_keeps_first_occurrence_only() {
        let events = vec![
            event("opened", "octocat", "2025-02-01T08:00:00Z", ""),
            event("closed", "hubber", "2025-02-02T08:00:00Z", ""),
            event("opened", "octocat", "2025-02-01T08:00:00Z", ""),
        ];
        let deduped = dedupe_timeline_events(events);
        assert_eq!(
            deduped,
            vec![
                event("opened", "octocat", "2025-02-01T08:00:00Z", ""),
                event("closed", "hubber", "2025-02-02T08:00:00Z", ""),
            ]
        );
    }

    #[tokio::test]
    async fn merges_rest_envelope_with_two_timeline_pages_and_comments() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/octocat/hello/issues/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(issue_envelope()))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/repos/octocat/hello/issues/1/comments"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([
                { "id": 11, "user": { "login": "commenter" }, "body": "same here" }
            ])))
            .mount(&server)
            .await;

        // Second page is matched by the cursor the first page hands back.
        Mock::given(method("POST"))
            .and(path("/graphql"))
            .and(body_string_contains("timeline-cursor-1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(timeline_page(
                serde_json::json!([{
                    "__typename": "LabeledEvent",
                    "createdAt": "2025-02-02T09:00:00Z",
                    "actor": { "login": "hubber" },
                    "label": { "name": "ci" }
                }]),
                None,
            )))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(timeline_page(
                serde_json::json!([{
                    "__typename": "ClosedEvent",
                    "createdAt": "2025-02-03T08:00:00Z",
                    "actor": { "login": "hubber" }
                }]),
                Some("timeline-cursor-1"),
            )))
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server);
        let data = fetcher
            .fetch_issue(&issue_ref(), FetchOptions::default())
            .await
            .expect("issue should fetch");

        let kinds: Vec<&str> = data
            .timeline
            .iter()
            .map(|event| event.event_type.as_str())
            .collect();
        assert_eq!(kinds, vec!["opened", "closed", "labeled"]);
        assert_eq!(data.thread.len(), 1);
        assert_eq!(data.meta.title, "Broken build");
        assert_eq!(data.reactions.plus_one, 1);
    }

    #[tokio::test]
    async fn duplicate_opened_event_from_graphql_is_removed() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/octocat/hello/issues/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(issue_envelope()))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(timeline_page(
                serde_json::json!([{
                    "__typename": "OpenedEvent",
                    "createdAt": "2025-02-01T08:00:00Z",
                    "actor": { "login": "octocat" }
                }]),
                None,
            )))
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server);
        let data = fetcher
            .fetch_issue(
                &issue_ref(),
                FetchOptions {
                    include_comments: false,
                },
            )
            .await
            .expect("issue should fetch");

        assert_eq!(data.timeline.len(), 1);
        assert_eq!(data.timeline.first().map(|e| e.event_type.as_str()), Some("opened"));
    }

    #[tokio::test]
    async fn skipping_comments_never_calls_the_comments_endpoint() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/octocat/hello/issues/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(issue_envelope()))
            .mount(&server)
            .await;

        Mock::given(method("GET"))
            .and(path("/repos/octocat/hello/issues/1/comments"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!([])))
            .expect(0)
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(timeline_page(serde_json::json!([]), None)),
            )
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server);
        let data = fetcher
            .fetch_issue(
                &issue_ref(),
                FetchOptions {
                    include_comments: false,
                },
            )
            .await
            .expect("issue should fetch");

        assert!(data.thread.is_empty());
    }

    #[tokio::test]
    async fn missing_issue_node_in_timeline_is_not_found() {
        let server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/repos/octocat/hello/issues/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(issue_envelope()))
            .mount(&server)
            .await;

        Mock::given(method("POST"))
            .and(path("/graphql"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "data": { "repository": { "issue": null } }
            })))
            .mount(&server)
            .await;

        let fetcher = fetcher_for(&server);
        let error = fetcher
            .fetch_issue(&issue_ref(), FetchOptions::default())
            .await
            .expect_err("fetch should fail");

        assert_eq!(error, FetchError::NotFound);
    }
}
