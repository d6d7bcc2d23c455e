//! Client for the Checkly REST API.
//!
//! [`ChecklyClient`] offers typed CRUD helpers over any [`Endpoint`] and
//! delegates the actual request to a [`Transport`]. The production transport
//! is [`HttpTransport`]; tests plug in an in-memory fake.

mod http;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

pub use http::HttpTransport;

/// Default base URL of the Checkly API.
pub const DEFAULT_API_URL: &str = "https://api.checklyhq.com";

/// Default bound for a single API call.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(15);

/// Errors returned by the Checkly API or while talking to it.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The API answered with a non-success status.
    #[error("API error {status}: {message}")]
    Status {
        /// HTTP status code.
        status: u16,
        /// Message extracted from the response body.
        message: String,
    },

    /// The call did not complete within the configured timeout.
    #[error("request timed out after {0}")]
    Timeout(String),

    /// The request could not be sent or the response not received.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The response body did not have the expected shape.
    #[error("could not decode response from {path}: {message}")]
    Decode {
        /// Request path.
        path: String,
        /// Decoder message.
        message: String,
    },
}

impl ApiError {
    /// Shorthand for a status error.
    pub fn status(status: u16, message: impl Into<String>) -> Self {
        Self::Status {
            status,
            message: message.into(),
        }
    }

    /// Whether the API reported that the object does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Status { status: 404, .. })
    }
}

/// Sends one request to the API.
///
/// `path` is relative to the API base URL and includes the query string.
/// An empty response body is returned as `None`.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send a request with an optional JSON body.
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Option<Value>, ApiError>;
}

/// An API object type and where it lives.
pub trait Endpoint: Serialize + DeserializeOwned + Send + Sync {
    /// The collection path, e.g. `/v1/snippets`.
    const COLLECTION: &'static str;

    /// Path used to create this object.
    fn create_path(&self) -> String {
        Self::COLLECTION.to_string()
    }

    /// Path used to read an object.
    fn read_path(id: &str) -> String {
        format!("{}/{}", Self::COLLECTION, id)
    }

    /// Path used to update an object.
    fn update_path(id: &str) -> String {
        Self::read_path(id)
    }

    /// Path used to delete an object.
    fn delete_path(id: &str) -> String {
        Self::read_path(id)
    }

    /// The identifier the API assigned, if known.
    fn remote_id(&self) -> Option<String>;
}

/// Typed access to the Checkly API.
#[derive(Clone)]
pub struct ChecklyClient {
    transport: Arc<dyn Transport>,
    base_url: String,
    timeout: Duration,
}

impl std::fmt::Debug for ChecklyClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ChecklyClient")
            .field("base_url", &self.base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl ChecklyClient {
    /// Create a client over a transport.
    pub fn new(transport: Arc<dyn Transport>, base_url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            transport,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            timeout,
        }
    }

    /// The API base URL, without trailing slash.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// The per-call timeout.
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Send a raw request bounded by the timeout.
    pub async fn call(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Option<Value>, ApiError> {
        tracing::debug!(%method, path, "Checkly API call");
        match tokio::time::timeout(self.timeout, self.transport.send(method, path, body)).await {
            Ok(result) => result,
            Err(_) => Err(ApiError::Timeout(format!("{:?}", self.timeout))),
        }
    }

    /// Create an object and return the API's version of it.
    pub async fn create<E: Endpoint>(&self, item: &E) -> Result<E, ApiError> {
        let path = item.create_path();
        let body = self.call(Method::POST, &path, Some(encode(item, &path)?)).await?;
        decode(body, &path)
    }

    /// Read an object by id.
    pub async fn get<E: Endpoint>(&self, id: &str) -> Result<E, ApiError> {
        let path = E::read_path(id);
        let body = self.call(Method::GET, &path, None).await?;
        decode(body, &path)
    }

    /// Replace an object and return the API's version of it.
    pub async fn update<E: Endpoint>(&self, id: &str, item: &E) -> Result<E, ApiError> {
        let path = E::update_path(id);
        let body = self.call(Method::PUT, &path, Some(encode(item, &path)?)).await?;
        decode(body, &path)
    }

    /// Delete an object by id.
    pub async fn delete<E: Endpoint>(&self, id: &str) -> Result<(), ApiError> {
        let path = E::delete_path(id);
        self.call(Method::DELETE, &path, None).await?;
        Ok(())
    }

    /// Read a list of objects from `path`.
    pub async fn list<T: DeserializeOwned>(&self, path: &str) -> Result<Vec<T>, ApiError> {
        let body = self.call(Method::GET, path, None).await?;
        match body {
            None => Ok(Vec::new()),
            Some(value) => decode(Some(value), path),
        }
    }
}

fn encode<E: Serialize>(item: &E, path: &str) -> Result<Value, ApiError> {
    serde_json::to_value(item).map_err(|e| ApiError::Decode {
        path: path.to_string(),
        message: e.to_string(),
    })
}

fn decode<T: DeserializeOwned>(body: Option<Value>, path: &str) -> Result<T, ApiError> {
    let value = body.ok_or_else(|| ApiError::Decode {
        path: path.to_string(),
        message: "empty response body".to_string(),
    })?;
    serde_json::from_value(value).map_err(|e| ApiError::Decode {
        path: path.to_string(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;
    use std::sync::Mutex;

    #[derive(Debug, Default, Serialize, Deserialize, PartialEq)]
    struct Widget {
        #[serde(skip_serializing_if = "Option::is_none")]
        id: Option<i64>,
        name: String,
    }

    impl Endpoint for Widget {
        const COLLECTION: &'static str = "/v1/widgets";

        fn remote_id(&self) -> Option<String> {
            self.id.map(|id| id.to_string())
        }
    }

    #[derive(Default)]
    struct Recorder {
        calls: Mutex<Vec<(String, String, Option<Value>)>>,
        reply: Option<Value>,
    }

    #[async_trait]
    impl Transport for Recorder {
        async fn send(
            &self,
            method: Method,
            path: &str,
            body: Option<Value>,
        ) -> Result<Option<Value>, ApiError> {
            self.calls
                .lock()
                .unwrap()
                .push((method.to_string(), path.to_string(), body));
            Ok(self.reply.clone())
        }
    }

    struct Slow;

    #[async_trait]
    impl Transport for Slow {
        async fn send(&self, _: Method, _: &str, _: Option<Value>) -> Result<Option<Value>, ApiError> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(None)
        }
    }

    #[tokio::test]
    async fn test_crud_paths() {
        let recorder = Arc::new(Recorder {
            reply: Some(json!({"id": 7, "name": "w"})),
            ..Default::default()
        });
        let client = ChecklyClient::new(recorder.clone(), "https://api.example.com/", DEFAULT_TIMEOUT);
        assert_eq!(client.base_url(), "https://api.example.com");

        let created = client
            .create(&Widget { id: None, name: "w".into() })
            .await
            .unwrap();
        assert_eq!(created.remote_id().as_deref(), Some("7"));
        client.get::<Widget>("7").await.unwrap();
        client.update("7", &created).await.unwrap();
        client.delete::<Widget>("7").await.unwrap();

        let calls = recorder.calls.lock().unwrap();
        let summary: Vec<(&str, &str)> = calls
            .iter()
            .map(|(m, p, _)| (m.as_str(), p.as_str()))
            .collect();
        assert_eq!(
            summary,
            vec![
                ("POST", "/v1/widgets"),
                ("GET", "/v1/widgets/7"),
                ("PUT", "/v1/widgets/7"),
                ("DELETE", "/v1/widgets/7"),
            ]
        );
        assert_eq!(calls[0].2, Some(json!({"name": "w"})));
    }

    #[tokio::test]
    async fn test_empty_body_is_decode_error() {
        let client = ChecklyClient::new(Arc::new(Recorder::default()), DEFAULT_API_URL, DEFAULT_TIMEOUT);
        let err = client.get::<Widget>("1").await.unwrap_err();
        assert!(matches!(err, ApiError::Decode { .. }));
    }

    #[tokio::test]
    async fn test_list_of_nothing_is_empty() {
        let client = ChecklyClient::new(Arc::new(Recorder::default()), DEFAULT_API_URL, DEFAULT_TIMEOUT);
        let items: Vec<Widget> = client.list("/v1/widgets").await.unwrap();
        assert!(items.is_empty());
    }

    #[tokio::test]
    async fn test_timeout() {
        let client = ChecklyClient::new(Arc::new(Slow), DEFAULT_API_URL, Duration::from_millis(20));
        let err = client.get::<Widget>("1").await.unwrap_err();
        assert!(matches!(err, ApiError::Timeout(_)));
    }

    #[test]
    fn test_api_error_display() {
        let err = ApiError::status(404, "Not Found");
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "API error 404: Not Found");
        assert!(!ApiError::status(500, "boom").is_not_found());
    }
}
