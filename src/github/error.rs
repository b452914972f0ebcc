//! Error types surfaced by the GitHub fetch layer.
//!
//! Every failure in the fetch path is expressed as a [`FetchError`] variant so
//! that callers can classify errors (auth, rate limit, not found, transient)
//! without inspecting transport internals. Layers add context by prefixing an
//! operation name onto the message while the variant, and therefore the
//! classification, survives unchanged.

use thiserror::Error;

/// Errors surfaced while fetching or converting a GitHub resource.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// A transport call completed with a non-2xx status code.
    ///
    /// This is the single point where a numeric status becomes inspectable by
    /// classification logic; `message` carries the upstream response detail.
    #[error("http status {status}: {message}")]
    Status {
        /// Numeric HTTP status returned by the remote service.
        status: u16,
        /// Upstream error detail, usually the response body or API message.
        message: String,
    },

    /// The request timed out before a response arrived.
    #[error("request timed out: {message}")]
    Timeout {
        /// Transport-level error detail.
        message: String,
    },

    /// A connection to the remote service could not be established.
    #[error("connection failed: {message}")]
    Connect {
        /// Transport-level error detail.
        message: String,
    },

    /// Networking failed in a way that is not a timeout or connect failure.
    #[error("network error talking to GitHub: {message}")]
    Network {
        /// Transport-level error detail.
        message: String,
    },

    /// A response body could not be decoded.
    #[error("decode failed: {message}")]
    Decode {
        /// Description of the malformed payload.
        message: String,
    },

    /// A 2xx GraphQL response carried a populated `errors` array.
    #[error("graphql returned errors: {message}")]
    Graphql {
        /// The first error message reported by the GraphQL endpoint.
        message: String,
    },

    /// Cursor pagination produced malformed or non-terminating state.
    #[error("pagination failed: {message}")]
    Pagination {
        /// Which guard tripped: empty cursor, stalled cursor, or page ceiling.
        message: String,
    },

    /// An expected node was absent from an otherwise successful response.
    ///
    /// Produced explicitly by the per-resource fetchers; never derived from a
    /// bare HTTP 404 (the GraphQL endpoint answers 200 for missing nodes).
    #[error("github resource not found")]
    NotFound,

    /// The resource kind segment of a URL is not one magpie understands.
    #[error("unsupported github resource kind: {kind}")]
    UnsupportedResource {
        /// The offending kind segment, e.g. `wiki`.
        kind: String,
    },

    /// The retry policy stopped, either exhausted or on a permanent failure.
    #[error("retry exhausted after {attempts} attempt(s): {cause}")]
    RetryExhausted {
        /// Number of attempts made, including the initial try.
        attempts: u32,
        /// The final failure observed before giving up.
        cause: Box<FetchError>,
    },

    /// The input URL could not be parsed as a GitHub resource URL.
    #[error("invalid GitHub URL: {message}")]
    InvalidUrl {
        /// What was wrong with the URL.
        message: String,
    },

    /// Runtime configuration was missing or inconsistent.
    #[error("configuration error: {message}")]
    Configuration {
        /// Details about the configuration failure.
        message: String,
    },

    /// A local I/O operation failed.
    #[error("I/O error: {message}")]
    Io {
        /// Error detail from the underlying I/O operation.
        message: String,
    },

    /// The output file already exists and overwrite was not requested.
    #[error("output file already exists: {path}")]
    OutputConflict {
        /// The conflicting output path.
        path: String,
    },
}

impl FetchError {
    /// Follows [`FetchError::RetryExhausted`] wrappers down to the failure
    /// that actually occurred.
    #[must_use]
    pub fn root(&self) -> &Self {
        let mut current = self;
        while let Self::RetryExhausted { cause, .. } = current {
            current = cause;
        }
        current
    }

    /// Extracts the HTTP status code when the root failure carries one.
    #[must_use]
    pub fn status_code(&self) -> Option<u16> {
        match self.root() {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// Prefixes an operation name onto the error message.
    ///
    /// Sentinel variants ([`FetchError::NotFound`],
    /// [`FetchError::UnsupportedResource`], [`FetchError::OutputConflict`])
    /// pass through unchanged so identity checks keep working after several
    /// layers of wrapping. A [`FetchError::RetryExhausted`] wrapper is
    /// transparent: the prefix lands on its cause.
    #[must_use]
    pub fn with_operation(self, operation: &str) -> Self {
        match self {
            Self::Status { status, message } => Self::Status {
                status,
                message: prefixed(operation, &message),
            },
            Self::Timeout { message } => Self::Timeout {
                message: prefixed(operation, &message),
            },
            Self::Connect { message } => Self::Connect {
                message: prefixed(operation, &message),
            },
            Self::Network { message } => Self::Network {
                message: prefixed(operation, &message),
            },
            Self::Decode { message } => Self::Decode {
                message: prefixed(operation, &message),
            },
            Self::Graphql { message } => Self::Graphql {
                message: prefixed(operation, &message),
            },
            Self::Pagination { message } => Self::Pagination {
                message: prefixed(operation, &message),
            },
            Self::InvalidUrl { message } => Self::InvalidUrl {
                message: prefixed(operation, &message),
            },
            Self::Configuration { message } => Self::Configuration {
                message: prefixed(operation, &message),
            },
            Self::Io { message } => Self::Io {
                message: prefixed(operation, &message),
            },
            Self::RetryExhausted { attempts, cause } => Self::RetryExhausted {
                attempts,
                cause: Box::new(cause.with_operation(operation)),
            },
            Self::NotFound | Self::UnsupportedResource { .. } | Self::OutputConflict { .. } => self,
        }
    }
}

fn prefixed(operation: &str, message: &str) -> String {
    format!("{operation}: {message}")
}

#[cfg(test)]
mod tests {
    use super::FetchError;

    #[test]
    fn status_error_displays_code_and_cause() {
        let error = FetchError::Status {
            status: 502,
            message: "bad gateway".to_owned(),
        };
        assert_eq!(error.to_string(), "http status 502: bad gateway");
    }

    #[test]
    fn with_operation_prefixes_message_and_keeps_variant() {
        let error = FetchError::Status {
            status: 500,
            message: "boom".to_owned(),
        }
        .with_operation("get issue");

        assert_eq!(error.status_code(), Some(500));
        assert_eq!(error.to_string(), "http status 500: get issue: boom");
    }

    #[test]
    fn with_operation_leaves_sentinels_untouched() {
        let error = FetchError::NotFound.with_operation("fetch discussion");
        assert_eq!(error, FetchError::NotFound);
    }

    #[test]
    fn with_operation_reaches_through_retry_wrapper() {
        let error = FetchError::RetryExhausted {
            attempts: 2,
            cause: Box::new(FetchError::Timeout {
                message: "deadline".to_owned(),
            }),
        }
        .with_operation("fetch issue");

        match error {
            FetchError::RetryExhausted { cause, .. } => {
                assert_eq!(
                    *cause,
                    FetchError::Timeout {
                        message: "fetch issue: deadline".to_owned(),
                    }
                );
            }
            other => panic!("expected RetryExhausted, got {other:?}"),
        }
    }

    #[test]
    fn root_descends_nested_retry_wrappers() {
        let error = FetchError::RetryExhausted {
            attempts: 4,
            cause: Box::new(FetchError::RetryExhausted {
                attempts: 1,
                cause: Box::new(FetchError::NotFound),
            }),
        };
        assert_eq!(error.root(), &FetchError::NotFound);
        assert_eq!(error.status_code(), None);
    }
}
