//! Reqwest-backed GraphQL client with guarded cursor pagination.
//!
//! A single `POST {query, variables}` endpoint serves every query; cursor
//! walking is centralized in [`GraphqlClient::query_paginated`] so the
//! non-termination guards (page ceiling, empty cursor, stalled cursor) exist
//! in exactly one place instead of being duplicated per query.

use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::debug;

use super::error::FetchError;
use super::fetcher::Config;

/// Hard ceiling on pages walked by one paginated query.
const MAX_PAGES: u32 = 1000;

/// At most this much of an error response body is kept as the cause.
const MAX_ERROR_BODY_BYTES: usize = 16 * 1024;

/// Cursor state reported by a page of results.
///
/// Mirrors the `pageInfo { hasNextPage endCursor }` selection, so payload
/// structs can embed it directly and page handlers can return it as-is.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PageInfo {
    /// Whether another page follows this one.
    #[serde(default)]
    pub has_next_page: bool,
    /// Opaque cursor naming the end of this page.
    #[serde(default)]
    pub end_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Envelope {
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    errors: Vec<ErrorMessage>,
}

#[derive(Debug, Deserialize)]
struct ErrorMessage {
    message: String,
}

/// Authenticated GraphQL client bound to one endpoint.
pub struct GraphqlClient {
    http: reqwest::Client,
    endpoint: String,
    token: Option<String>,
}

impl GraphqlClient {
    /// Builds the client from fetch configuration.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Configuration`] when the HTTP client cannot be
    /// constructed.
    pub fn new(config: &Config) -> Result<Self, FetchError> {
        let http = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|error| FetchError::Configuration {
                message: format!("build GraphQL client: {error}"),
            })?;

        Ok(Self {
            http,
            endpoint: config.graphql_url.clone(),
            token: config.token.clone(),
        })
    }

    /// Runs a single-page query and deserializes the `data` object into `T`.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Status`] for non-2xx responses,
    /// [`FetchError::Graphql`] when a 2xx response carries errors, and
    /// [`FetchError::Decode`] when the payload does not fit `T`.
    pub async fn query<T>(&self, document: &str, variables: Map<String, Value>) -> Result<T, FetchError>
    where
        T: for<'de> Deserialize<'de>,
    {
        let data = self.query_raw(document, &variables).await?;
        serde_json::from_value(data).map_err(|error| FetchError::Decode {
            message: format!("decode graphql data: {error}"),
        })
    }

    /// Runs a cursor-paginated query, invoking `page_handler` once per page.
    ///
    /// The handler deserializes the raw page payload, accumulates what it
    /// needs, and reports the page's cursor state. When more pages are
    /// indicated, the reported cursor becomes the `after` variable of the
    /// next call.
    ///
    /// # Errors
    ///
    /// Besides transport and handler failures, returns
    /// [`FetchError::Pagination`] when the walk exceeds the page ceiling,
    /// when a page claims more data but yields no cursor, or when the cursor
    /// repeats across consecutive pages.
    pub async fn query_paginated<F>(
        &self,
        document: &str,
        variables: Map<String, Value>,
        mut page_handler: F,
    ) -> Result<(), FetchError>
    where
        F: FnMut(Value) -> Result<PageInfo, FetchError>,
    {
        let mut current = variables;
        let mut previous_cursor: Option<String> = None;
        let mut page_index = 0u32;

        loop {
            if page_index >= MAX_PAGES {
                return Err(FetchError::Pagination {
                    message: format!("exceeded max page limit {MAX_PAGES}"),
                });
            }

            let page = self.query_raw(document, &current).await?;
            let info = page_handler(page)?;
            if !info.has_next_page {
                return Ok(());
            }

            let cursor = match info.end_cursor {
                Some(cursor) if !cursor.is_empty() => cursor,
                _ => {
                    return Err(FetchError::Pagination {
                        message: "empty cursor while hasNextPage=true".to_owned(),
                    });
                }
            };
            if previous_cursor.as_deref() == Some(cursor.as_str()) {
                return Err(FetchError::Pagination {
                    message: format!("cursor stalled at {cursor:?}"),
                });
            }

            debug!(page = page_index + 1, cursor = %cursor, "walking graphql pagination");
            current.insert("after".to_owned(), Value::String(cursor.clone()));
            previous_cursor = Some(cursor);
            page_index += 1;
        }
    }

    async fn query_raw(
        &self,
        document: &str,
        variables: &Map<String, Value>,
    ) -> Result<Value, FetchError> {
        let body = serde_json::json!({
            "query": document,
            "variables": variables,
        });

        let mut request = self.http.post(&self.endpoint).json(&body);
        if let Some(token) = self.token.as_deref() {
            request = request.bearer_auth(token);
        }

        let response = request.send().await.map_err(map_transport_error)?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(FetchError::Status {
                status: status.as_u16(),
                message: truncate_body(text),
            });
        }

        let envelope: Envelope =
            response
                .json()
                .await
                .map_err(|error| FetchError::Decode {
                    message: format!("decode graphql response: {error}"),
                })?;
        if let Some(first) = envelope.errors.first() {
            return Err(FetchError::Graphql {
                message: first.message.clone(),
            });
        }

        Ok(envelope.data.unwrap_or(Value::Null))
    }
}

fn map_transport_error(error: reqwest::Error) -> FetchError {
    let message = format!("execute graphql request: {error}");
    if error.is_timeout() {
        FetchError::Timeout { message }
    } else if error.is_connect() {
        FetchError::Connect { message }
    } else {
        FetchError::Network { message }
    }
}

fn truncate_body(mut body: String) -> String {
    if body.len() > MAX_ERROR_BODY_BYTES {
        let mut end = MAX_ERROR_BODY_BYTES;
        while !body.is_char_boundary(end) {
            end -= 1;
        }
        body.truncate(end);
    }
    body.trim().to_owned()
}
