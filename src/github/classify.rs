//! Error classification predicates for collaborators.
//!
//! The CLI exit-code resolver (and any other front end) decides how to report
//! a failure by asking these three questions, never by poking at transport
//! details. Structured data on the error is consulted first; a
//! case-insensitive text search over the rendered error is the fallback for
//! failures that never passed through a status-carrying variant.

use super::error::FetchError;

/// Extracts the HTTP status code from the root failure, when it carries one.
#[must_use]
pub fn status_code(error: &FetchError) -> Option<u16> {
    error.status_code()
}

/// Reports whether an error is a GitHub rate-limit failure.
///
/// True for a root status of 429, for 403 with rate-limit wording in the
/// message, or, as a last resort, for rate-limit wording anywhere in the
/// rendered error text.
#[must_use]
pub fn is_rate_limit(error: &FetchError) -> bool {
    if let FetchError::Status { status, message } = error.root() {
        if *status == 429 {
            return true;
        }
        if *status == 403 && contains_rate_limit(message) {
            return true;
        }
    }

    contains_rate_limit(&error.to_string())
}

/// Case-insensitive search for rate-limit wording in rendered error text.
fn contains_rate_limit(text: &str) -> bool {
    text.to_lowercase().contains("rate limit")
}

/// Reports whether an error is an authentication or authorization failure.
///
/// Rate limits are excluded first: GitHub reports primary rate limiting as
/// 403, which would otherwise read as an authorization failure.
#[must_use]
pub fn is_auth(error: &FetchError) -> bool {
    if is_rate_limit(error) {
        return false;
    }

    if let Some(status) = error.status_code() {
        return status == 401 || status == 403;
    }

    let text = error.to_string().to_lowercase();
    text.contains("status 401")
        || text.contains("status 403")
        || text.contains("unauthorized")
        || text.contains("forbidden")
}

/// Reports whether an error is the "resource not found" sentinel.
///
/// Identity is the variant itself, however deeply it sits under retry
/// wrapping; a bare HTTP 404 is deliberately not treated as not-found.
#[must_use]
pub fn is_not_found(error: &FetchError) -> bool {
    matches!(error.root(), FetchError::NotFound)
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::super::error::FetchError;
    use super::{is_auth, is_not_found, is_rate_limit, status_code};

    fn status(code: u16, message: &str) -> FetchError {
        FetchError::Status {
            status: code,
            message: message.to_owned(),
        }
    }

    fn wrapped(error: FetchError) -> FetchError {
        FetchError::RetryExhausted {
            attempts: 4,
            cause: Box::new(error),
        }
    }

    #[rstest]
    #[case(status(429, "slow down"), true)]
    #[case(status(403, "API rate limit exceeded"), true)]
    #[case(status(403, "forbidden"), false)]
    #[case(status(500, "oops"), false)]
    #[case(FetchError::Network { message: "secondary rate limit hit".to_owned() }, true)]
    #[case(FetchError::Network { message: "connection reset".to_owned() }, false)]
    fn rate_limit_classification(#[case] error: FetchError, #[case] expected: bool) {
        assert_eq!(is_rate_limit(&error), expected, "{error:?}");
    }

    #[test]
    fn rate_limit_survives_retry_wrapping() {
        assert!(is_rate_limit(&wrapped(status(429, "slow down"))));
    }

    #[rstest]
    #[case(status(401, "bad credentials"), true)]
    #[case(status(403, "forbidden"), true)]
    #[case(status(403, "rate limit exceeded"), false)]
    #[case(status(404, "missing"), false)]
    #[case(FetchError::Graphql { message: "response status 401".to_owned() }, true)]
    #[case(FetchError::Network { message: "token unauthorized".to_owned() }, true)]
    #[case(FetchError::Network { message: "connection reset".to_owned() }, false)]
    fn auth_classification(#[case] error: FetchError, #[case] expected: bool) {
        assert_eq!(is_auth(&error), expected, "{error:?}");
    }

    #[test]
    fn not_found_matches_sentinel_identity_only() {
        assert!(is_not_found(&FetchError::NotFound));
        assert!(is_not_found(&wrapped(FetchError::NotFound)));
        assert!(!is_not_found(&status(404, "missing")));
    }

    #[test]
    fn status_code_descends_through_wrapping() {
        assert_eq!(status_code(&wrapped(status(502, "bad gateway"))), Some(502));
        assert_eq!(status_code(&FetchError::NotFound), None);
    }
}
