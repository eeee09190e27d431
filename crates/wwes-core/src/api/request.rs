//! Request descriptors, raw responses and the document envelope.

use std::collections::BTreeMap;

use anyhow::{Context, Result};
use chrono::{Duration, NaiveDateTime};
use serde::{de::DeserializeOwned, Deserialize};

use super::ApiError;

/// Timestamp format used by the remote document envelope (always UTC).
const REMOTE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// One outbound call: where it goes and with which parameters.
///
/// Parameters live in a sorted map so two requests built from the same
/// pairs in a different order compare (and hash) equal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    pub host: String,
    pub path: String,
    pub params: BTreeMap<String, String>,
}

impl ApiRequest {
    pub fn new(host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            path: path.into(),
            params: BTreeMap::new(),
        }
    }

    pub fn param(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.params.insert(key.into(), value.to_string());
        self
    }

    pub fn url(&self) -> String {
        format!("{}{}", self.host.trim_end_matches('/'), self.path)
    }
}

/// A document as received from the remote side, plus how long the
/// server says it stays authoritative.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub body: String,
    pub cached_for: Duration,
}

impl ApiResponse {
    /// Build a response from a raw document, reading the validity window
    /// from its envelope. Error documents become `ApiError`s.
    pub fn from_document(body: String) -> Result<Self> {
        let envelope: Envelope =
            serde_json::from_str(&body).context("Failed to parse document envelope")?;
        if let Some(err) = envelope.error {
            return Err(ApiError::from_remote(err.code, &err.message).into());
        }
        let cached_for = envelope.validity()?;
        Ok(Self { body, cached_for })
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Envelope<T = serde_json::Value> {
    current_time: String,
    cached_until: String,
    result: Option<T>,
    #[serde(default)]
    error: Option<RemoteError>,
}

#[derive(Debug, Deserialize)]
struct RemoteError {
    code: i64,
    message: String,
}

impl<T> Envelope<T> {
    fn validity(&self) -> Result<Duration> {
        let now = parse_remote_time(&self.current_time)?;
        let until = parse_remote_time(&self.cached_until)?;
        Ok(until - now)
    }
}

fn parse_remote_time(value: &str) -> Result<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value.trim(), REMOTE_TIME_FORMAT)
        .with_context(|| format!("Invalid remote timestamp: {}", value))
}

/// Extract the typed `result` section of a document body.
pub fn parse_result<T: DeserializeOwned>(body: &str) -> Result<T> {
    let envelope: Envelope<T> =
        serde_json::from_str(body).context("Failed to parse document result")?;
    if let Some(err) = envelope.error {
        return Err(ApiError::from_remote(err.code, &err.message).into());
    }
    envelope
        .result
        .ok_or_else(|| ApiError::InvalidResponse("document has no result".to_string()).into())
}

/// The black-box remote call: one request in, one document out.
#[allow(async_fn_in_trait)]
pub trait Transport {
    async fn fetch(&self, request: &ApiRequest) -> Result<ApiResponse>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validity_from_envelope() {
        let body = r#"{"currentTime":"2013-05-01 12:00:00","cachedUntil":"2013-05-01 12:30:00","result":{}}"#;
        let response = ApiResponse::from_document(body.to_string()).unwrap();
        assert_eq!(response.cached_for, Duration::minutes(30));
    }

    #[test]
    fn test_error_document_is_auth_failure() {
        let body = r#"{"currentTime":"2013-05-01 12:00:00","cachedUntil":"2013-05-01 12:00:00","error":{"code":203,"message":"Authentication failure."}}"#;
        let err = ApiResponse::from_document(body.to_string()).unwrap_err();
        let api = err.downcast_ref::<ApiError>().unwrap();
        assert!(api.is_credential_failure());
    }

    #[test]
    fn test_parse_result_typed() {
        #[derive(Deserialize)]
        struct Row {
            value: i64,
        }
        let body = r#"{"currentTime":"2013-05-01 12:00:00","cachedUntil":"2013-05-01 12:00:00","result":{"value":7}}"#;
        let row: Row = parse_result(body).unwrap();
        assert_eq!(row.value, 7);
    }

    #[test]
    fn test_missing_result_is_invalid_response() {
        #[derive(Debug, Deserialize)]
        struct Row {
            #[allow(dead_code)]
            value: i64,
        }
        let body = r#"{"currentTime":"2013-05-01 12:00:00","cachedUntil":"2013-05-01 12:00:00"}"#;
        let err = parse_result::<Row>(body).unwrap_err();
        assert!(matches!(
            err.downcast_ref::<ApiError>(),
            Some(ApiError::InvalidResponse(_))
        ));
    }

    #[test]
    fn test_request_url_joins_host_and_path() {
        let request = ApiRequest::new("https://api.example.com/", "/corp/AssetList.json");
        assert_eq!(request.url(), "https://api.example.com/corp/AssetList.json");
    }
}
