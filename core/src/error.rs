//! Error types for the GroupMe API client.
//!
//! # Design
//! Statuses that callers routinely branch on get their own variant: 401
//! (`Unauthorized`), 404 (`NotFound`, or `ResultsExpired` while polling a
//! member-add job) and 503 while polling (`ResultsNotReady`). Everything else
//! outside 2xx lands in `HttpError` with the raw status and body.

use thiserror::Error;

/// Errors returned by `GroupMeClient` parse methods and the services.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (connection, DNS, timeout).
    #[error("transport failed: {0}")]
    Transport(String),

    /// The server returned 401; the access token is missing or expired.
    #[error("401 unauthorized")]
    Unauthorized,

    /// The server returned 404 for the requested resource.
    #[error("resource not found")]
    NotFound,

    /// The member-add results are no longer available (404 while polling).
    #[error("results are no longer available")]
    ResultsExpired,

    /// The member-add results are not ready yet (503 while polling).
    #[error("results aren't ready yet, try again later")]
    ResultsNotReady,

    /// Removing a member returned anything other than 200.
    #[error("could not remove member from group (HTTP {status})")]
    RemovalFailed { status: u16 },

    /// The server returned a non-2xx status with no dedicated variant.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// The response body is not JSON or does not match the envelope shape.
    #[error("decoding response failed: {0}")]
    Decode(String),

    /// The request payload could not be serialized to JSON.
    #[error("serialization failed: {0}")]
    Serialization(String),

    /// The base URL could not be combined with the request path.
    #[error("invalid url: {0}")]
    InvalidUrl(String),

    /// Required configuration is missing from the environment.
    #[error("configuration error: {0}")]
    Config(String),

    /// A prospective member was submitted without an idempotency guid.
    #[error("member {nickname:?} has no guid")]
    MissingGuid { nickname: String },
}

pub type Result<T> = std::result::Result<T, ApiError>;
