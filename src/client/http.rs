//! reqwest-backed transport.

use async_trait::async_trait;
use reqwest::{Client, Method, StatusCode};
use serde_json::Value;

use super::{ApiError, Transport};

/// User agent sent with every request.
pub const USER_AGENT: &str = concat!("terraform-provider-checkly/", env!("CARGO_PKG_VERSION"));

/// Talks to the Checkly API over HTTPS.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: String,
    api_key: String,
    account_id: Option<String>,
}

impl HttpTransport {
    /// Build a transport for `base_url` authenticating with `api_key`.
    ///
    /// `account_id` is sent as `X-Checkly-Account` when present.
    pub fn new(
        base_url: impl Into<String>,
        api_key: impl Into<String>,
        account_id: Option<String>,
    ) -> Result<Self, ApiError> {
        let client = Client::builder().user_agent(USER_AGENT).build()?;
        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.into(),
            account_id: account_id.filter(|id| !id.is_empty()),
        })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
    ) -> Result<Option<Value>, ApiError> {
        let url = format!("{}{}", self.base_url, path);
        let mut request = self.client.request(method, &url).bearer_auth(&self.api_key);
        if let Some(account_id) = &self.account_id {
            request = request.header("X-Checkly-Account", account_id);
        }
        if let Some(body) = &body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(ApiError::Status {
                status: status.as_u16(),
                message: error_message(status, &text),
            });
        }
        if text.trim().is_empty() {
            return Ok(None);
        }
        serde_json::from_str(&text)
            .map(Some)
            .map_err(|e| ApiError::Decode {
                path: path.to_string(),
                message: e.to_string(),
            })
    }
}

/// Pull a readable message out of an error body.
///
/// The API answers with `{"statusCode": .., "error": .., "message": ..}`;
/// anything else falls back to the raw body or the status reason.
fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(Value::Object(obj)) = serde_json::from_str::<Value>(body) {
        for key in ["message", "error"] {
            if let Some(Value::String(msg)) = obj.get(key) {
                if !msg.is_empty() {
                    return msg.clone();
                }
            }
        }
    }
    let body = body.trim();
    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string()
    } else {
        body.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};
    use serde_json::json;

    #[tokio::test]
    async fn test_sends_auth_headers_and_body() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("POST", "/v1/snippets")
            .match_header("authorization", "Bearer cu_123")
            .match_header("x-checkly-account", "acc-1")
            .match_header("user-agent", USER_AGENT)
            .match_body(Matcher::Json(json!({"name": "setup"})))
            .with_status(201)
            .with_header("content-type", "application/json")
            .with_body(r#"{"id": 4, "name": "setup"}"#)
            .create_async()
            .await;

        let transport = HttpTransport::new(server.url(), "cu_123", Some("acc-1".into())).unwrap();
        let body = transport
            .send(Method::POST, "/v1/snippets", Some(json!({"name": "setup"})))
            .await
            .unwrap();

        mock.assert_async().await;
        assert_eq!(body, Some(json!({"id": 4, "name": "setup"})));
    }

    #[tokio::test]
    async fn test_omits_empty_account_header() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/v1/static-ips")
            .match_header("x-checkly-account", Matcher::Missing)
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let transport = HttpTransport::new(server.url(), "cu_123", Some(String::new())).unwrap();
        let body = transport.send(Method::GET, "/v1/static-ips", None).await.unwrap();

        mock.assert_async().await;
        assert_eq!(body, Some(json!([])));
    }

    #[tokio::test]
    async fn test_error_message_from_body() {
        let mut server = Server::new_async().await;
        server
            .mock("POST", "/v1/checks?autoAssignAlerts=false")
            .with_status(400)
            .with_body(r#"{"statusCode": 400, "error": "Bad Request", "message": "frequency is invalid"}"#)
            .create_async()
            .await;

        let transport = HttpTransport::new(server.url(), "cu_123", None).unwrap();
        let err = transport
            .send(Method::POST, "/v1/checks?autoAssignAlerts=false", Some(json!({})))
            .await
            .unwrap_err();

        assert_eq!(err.to_string(), "API error 400: frequency is invalid");
    }

    #[tokio::test]
    async fn test_not_found() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", "/v1/snippets/9")
            .with_status(404)
            .create_async()
            .await;

        let transport = HttpTransport::new(server.url(), "cu_123", None).unwrap();
        let err = transport.send(Method::GET, "/v1/snippets/9", None).await.unwrap_err();

        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "API error 404: Not Found");
    }

    #[tokio::test]
    async fn test_empty_success_body() {
        let mut server = Server::new_async().await;
        server
            .mock("DELETE", "/v1/snippets/9")
            .with_status(204)
            .create_async()
            .await;

        let transport = HttpTransport::new(server.url(), "cu_123", None).unwrap();
        let body = transport.send(Method::DELETE, "/v1/snippets/9", None).await.unwrap();
        assert!(body.is_none());
    }

    #[test]
    fn test_error_message_fallbacks() {
        assert_eq!(error_message(StatusCode::BAD_GATEWAY, ""), "Bad Gateway");
        assert_eq!(error_message(StatusCode::BAD_REQUEST, "plain text"), "plain text");
        assert_eq!(
            error_message(StatusCode::UNAUTHORIZED, r#"{"error": "Unauthorized"}"#),
            "Unauthorized"
        );
    }
}
