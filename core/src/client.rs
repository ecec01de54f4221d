//! Stateless HTTP request builder and response parser for the GroupMe API.
//!
//! # Design
//! `GroupMeClient` holds only the immutable `ClientConfig` and carries no
//! mutable state between calls. Each operation is split into a `build_*`
//! method that produces an `HttpRequest` and a `parse_*` method that consumes
//! an `HttpResponse`; group operations live in `groups.rs`, member operations
//! in `members.rs`. The round-trip in between belongs to a `Transport`.
//!
//! Every request carries the access token as the `token` query parameter.
//! Every successful response wraps its payload in `{"response": ...}`.

use log::warn;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::ClientConfig;
use crate::error::{ApiError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse};

/// Synchronous, stateless client for the GroupMe API.
///
/// Builds `HttpRequest` values and parses `HttpResponse` values without
/// touching the network.
#[derive(Debug, Clone)]
pub struct GroupMeClient {
    config: ClientConfig,
    base: Url,
}

/// The `{"response": ...}` wrapper around every payload.
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    response: T,
}

impl GroupMeClient {
    /// Fails with `InvalidUrl` if the configured base URL cannot hold paths.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let base = Url::parse(config.base_url()).map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(format!("{} cannot be a base", config.base_url())));
        }
        Ok(Self { config, base })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Absolute URL for `segments` under the base, with `query` and the
    /// token appended. Segments are percent-encoded individually; ids must
    /// first pass through `id_segment`, since `.` and `..` would be dropped.
    pub(crate) fn url(&self, segments: &[&str], query: &[(&str, &str)]) -> String {
        let mut url = self.base.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url.query_pairs_mut()
            .extend_pairs(query)
            .append_pair("token", self.config.token());
        url.into()
    }

    pub(crate) fn get(&self, url: String) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url,
            headers: Vec::new(),
            body: None,
            timeout: self.config.request_timeout(),
        }
    }

    pub(crate) fn post_empty(&self, url: String) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Post,
            url,
            headers: Vec::new(),
            body: None,
            timeout: self.config.request_timeout(),
        }
    }

    pub(crate) fn post_json<B: Serialize + ?Sized>(&self, url: String, body: &B) -> Result<HttpRequest> {
        let body = serde_json::to_string(body).map_err(|e| ApiError::Serialization(e.to_string()))?;
        Ok(HttpRequest {
            method: HttpMethod::Post,
            url,
            headers: vec![("content-type".to_string(), "application/json".to_string())],
            body: Some(body),
            timeout: self.config.request_timeout(),
        })
    }
}

/// Checks that a caller-supplied id can stand as one path segment.
///
/// The URL path never carries empty, `.` or `..` segments, so such an id
/// would silently address a different endpoint.
pub(crate) fn id_segment(id: &str) -> Result<&str> {
    match id {
        "" | "." | ".." => Err(ApiError::InvalidUrl(format!("{id:?} is not a valid path id"))),
        id => Ok(id),
    }
}

/// Map statuses outside 2xx to the appropriate `ApiError` variant.
pub(crate) fn check_status(response: &HttpResponse) -> Result<()> {
    match response.status {
        200..=299 => Ok(()),
        401 => Err(ApiError::Unauthorized),
        404 => Err(ApiError::NotFound),
        status => {
            warn!("unexpected HTTP status {status}");
            Err(ApiError::HttpError {
                status,
                body: response.body.clone(),
            })
        }
    }
}

/// Decode the `response` field of the envelope into `T`.
pub(crate) fn decode<T: DeserializeOwned>(response: &HttpResponse) -> Result<T> {
    serde_json::from_str::<Envelope<T>>(&response.body)
        .map(|envelope| envelope.response)
        .map_err(|e| ApiError::Decode(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> GroupMeClient {
        GroupMeClient::new(ClientConfig::with_base_url("tok", "http://localhost:3000")).unwrap()
    }

    fn response(status: u16, body: &str) -> HttpResponse {
        HttpResponse {
            status,
            headers: Vec::new(),
            body: body.to_string(),
        }
    }

    #[test]
    fn url_appends_token_last() {
        let url = client().url(&["groups"], &[("page", "2")]);
        assert_eq!(url, "http://localhost:3000/groups?page=2&token=tok");
    }

    #[test]
    fn url_keeps_base_path() {
        let c = GroupMeClient::new(ClientConfig::new("tok")).unwrap();
        assert_eq!(c.url(&["groups", "former"], &[]), "https://api.groupme.com/v3/groups/former?token=tok");
    }

    #[test]
    fn url_encodes_path_segments() {
        let url = client().url(&["groups", "1/../2"], &[]);
        assert_eq!(url, "http://localhost:3000/groups/1%2F..%2F2?token=tok");
    }

    #[test]
    fn url_encodes_token() {
        let c = GroupMeClient::new(ClientConfig::with_base_url("a b&c", "http://localhost:3000")).unwrap();
        assert_eq!(c.url(&["groups"], &[]), "http://localhost:3000/groups?token=a+b%26c");
    }

    #[test]
    fn id_segment_rejects_empty_and_dot_ids() {
        for id in ["", ".", ".."] {
            assert!(matches!(id_segment(id), Err(ApiError::InvalidUrl(_))), "{id:?}");
        }
        assert_eq!(id_segment("...").unwrap(), "...");
        assert_eq!(id_segment("32968213").unwrap(), "32968213");
    }

    #[test]
    fn encoded_dots_stay_literal() {
        let url = client().url(&["groups", "%2E%2E"], &[]);
        assert_eq!(url, "http://localhost:3000/groups/%252E%252E?token=tok");
    }

    #[test]
    fn requests_carry_configured_timeout() {
        let config = ClientConfig::with_base_url("tok", "http://localhost:3000")
            .timeout(std::time::Duration::from_secs(5));
        let c = GroupMeClient::new(config).unwrap();
        let req = c.get(c.url(&["groups"], &[]));
        assert_eq!(req.timeout, Some(std::time::Duration::from_secs(5)));
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let err = GroupMeClient::new(ClientConfig::with_base_url("tok", "not a url")).unwrap_err();
        assert!(matches!(err, ApiError::InvalidUrl(_)));
        let err = GroupMeClient::new(ClientConfig::with_base_url("tok", "mailto:someone")).unwrap_err();
        assert!(matches!(err, ApiError::InvalidUrl(_)));
    }

    #[test]
    fn check_status_maps_codes() {
        assert!(check_status(&response(201, "")).is_ok());
        assert!(matches!(check_status(&response(401, "")), Err(ApiError::Unauthorized)));
        assert!(matches!(check_status(&response(404, "")), Err(ApiError::NotFound)));
        assert!(matches!(
            check_status(&response(500, "boom")),
            Err(ApiError::HttpError { status: 500, body }) if body == "boom"
        ));
    }

    #[test]
    fn decode_requires_envelope() {
        let value: Vec<u32> = decode(&response(200, r#"{"response":[1,2]}"#)).unwrap();
        assert_eq!(value, vec![1, 2]);
        let err = decode::<Vec<u32>>(&response(200, "[1,2]")).unwrap_err();
        assert!(matches!(err, ApiError::Decode(_)));
    }
}
