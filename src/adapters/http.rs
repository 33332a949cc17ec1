use crate::core::ConfigProvider;
use crate::utils::error::{PawcareError, Result};
use crate::utils::fields::probe_string;
use reqwest::{Client, Method, StatusCode};
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::time::Duration;
use url::Url;

/// Thin wrapper over `reqwest` for the booking API.
///
/// Every call returns the raw JSON body; decoding into records is left to the
/// service layer, which knows which fallback field names to probe.
#[derive(Debug, Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    timeout: Duration,
    headers: HashMap<String, String>,
}

impl ApiClient {
    pub fn new<C: ConfigProvider>(config: &C) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("pawcare/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.api_base_url().trim_end_matches('/').to_string(),
            token: None,
            timeout: Duration::from_secs(config.request_timeout_secs()),
            headers: config.extra_headers().clone(),
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn set_token(&mut self, token: Option<String>) {
        self.token = token;
    }

    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Joins the base URL and a path, keeping a trailing slash when the path has one.
    pub fn endpoint(&self, path: &str) -> String {
        let path = path.trim_start_matches('/');
        if path.is_empty() {
            format!("{}/", self.base_url)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    pub async fn get(&self, path: &str) -> Result<Value> {
        self.send::<()>(Method::GET, path, None).await
    }

    pub async fn post<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        self.send(Method::POST, path, Some(body)).await
    }

    pub async fn put<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        self.send(Method::PUT, path, Some(body)).await
    }

    pub async fn patch<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value> {
        self.send(Method::PATCH, path, Some(body)).await
    }

    pub async fn delete(&self, path: &str) -> Result<Value> {
        self.send::<()>(Method::DELETE, path, None).await
    }

    async fn send<B: Serialize + ?Sized>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<Value> {
        let url = self.endpoint(path);
        tracing::debug!("📡 {} {}", method, url);

        let mut request = self
            .client
            .request(method.clone(), &url)
            .timeout(self.timeout)
            .header("Accept", "application/json");

        for (key, value) in &self.headers {
            request = request.header(key, value);
        }

        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }

        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        tracing::debug!("📡 {} {} -> {}", method, url, status);

        let text = response.text().await?;
        let body = parse_body(&text);

        if status.is_success() {
            Ok(body)
        } else {
            let message = error_message(&body, status);
            tracing::error!("❌ {} {} failed ({}): {}", method, url, status.as_u16(), message);
            Err(PawcareError::ApiStatusError {
                status: status.as_u16(),
                message,
            })
        }
    }
}

/// Builds `/a/b/c` from raw segments, percent-encoding each one so an id can
/// never add, remove or climb path levels.
pub fn api_path(segments: &[&str]) -> Result<String> {
    for segment in segments {
        if segment.trim().is_empty() || *segment == "." || *segment == ".." {
            return Err(PawcareError::InvalidValueError {
                field: "path".to_string(),
                value: segment.to_string(),
                reason: "Not a usable identifier".to_string(),
            });
        }
    }

    let mut url = Url::parse("http://pawcare.invalid/").map_err(|e| PawcareError::ConfigError {
        message: format!("cannot build request path: {}", e),
    })?;
    url.path_segments_mut()
        .map_err(|_| PawcareError::ConfigError {
            message: "cannot build request path".to_string(),
        })?
        .clear()
        .extend(segments.iter().copied());
    Ok(url.path().to_string())
}

fn parse_body(text: &str) -> Value {
    if text.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(text).unwrap_or_else(|_| Value::String(text.trim().to_string()))
}

fn error_message(body: &Value, status: StatusCode) -> String {
    let probed = match body {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Object(_) => probe_string(
            body,
            &["message", "error.message", "error", "detail", "msg", "errors.0.message", "errors.0"],
        ),
        _ => None,
    };
    probed.unwrap_or_else(|| {
        status
            .canonical_reason()
            .unwrap_or("Request failed")
            .to_string()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;
    use serde_json::json;

    struct MockConfig {
        base_url: String,
        headers: HashMap<String, String>,
    }

    impl MockConfig {
        fn new(base_url: String) -> Self {
            Self {
                base_url,
                headers: HashMap::new(),
            }
        }
    }

    impl ConfigProvider for MockConfig {
        fn api_base_url(&self) -> &str {
            &self.base_url
        }

        fn state_dir(&self) -> &str {
            "unused"
        }

        fn request_timeout_secs(&self) -> u64 {
            5
        }

        fn extra_headers(&self) -> &HashMap<String, String> {
            &self.headers
        }
    }

    #[test]
    fn test_endpoint_joining() {
        let client = ApiClient::new(&MockConfig::new("http://api.test/v1/".to_string())).unwrap();
        assert_eq!(client.endpoint("/user/"), "http://api.test/v1/user/");
        assert_eq!(client.endpoint("services"), "http://api.test/v1/services");
        assert_eq!(client.endpoint(""), "http://api.test/v1/");
    }

    #[test]
    fn test_token_can_be_replaced_and_cleared() {
        let mut client = ApiClient::new(&MockConfig::new("http://api.test".to_string()))
            .unwrap()
            .with_token("old");
        client.set_token(Some("new".to_string()));
        assert_eq!(client.token(), Some("new"));
        client.set_token(None);
        assert!(client.token().is_none());
        assert_eq!(client.base_url(), "http://api.test");
    }

    #[test]
    fn test_api_path_encodes_each_segment() {
        assert_eq!(api_path(&["pets", "12"]).unwrap(), "/pets/12");
        assert_eq!(
            api_path(&["pets", "x/../../admin/users/5"]).unwrap(),
            "/pets/x%2F..%2F..%2Fadmin%2Fusers%2F5"
        );
        assert_eq!(api_path(&["pets", "a b?c#d"]).unwrap(), "/pets/a%20b%3Fc%23d");
        assert!(api_path(&["pets", ".."]).is_err());
        assert!(api_path(&["pets", " "]).is_err());
    }

    #[test]
    fn test_error_message_probing() {
        let status = StatusCode::BAD_REQUEST;
        assert_eq!(error_message(&json!({"message": "bad email"}), status), "bad email");
        assert_eq!(
            error_message(&json!({"error": {"message": "nested"}}), status),
            "nested"
        );
        assert_eq!(error_message(&json!({"detail": "nope"}), status), "nope");
        assert_eq!(error_message(&json!("plain text"), status), "plain text");
        assert_eq!(error_message(&Value::Null, status), "Bad Request");
    }

    #[tokio::test]
    async fn test_bearer_token_and_headers_are_sent() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/user/")
                .header("Authorization", "Bearer tok-1")
                .header("X-Client", "cli");
            then.status(200).json_body(json!({"id": 1}));
        });

        let mut config = MockConfig::new(server.base_url());
        config
            .headers
            .insert("X-Client".to_string(), "cli".to_string());
        let client = ApiClient::new(&config).unwrap().with_token("tok-1");

        let body = client.get("/user/").await.unwrap();

        api_mock.assert();
        assert_eq!(body, json!({"id": 1}));
    }

    #[tokio::test]
    async fn test_error_status_is_surfaced_with_server_message() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(POST).path("/auth/login/owner");
            then.status(401)
                .json_body(json!({"success": false, "message": "Invalid credentials"}));
        });

        let client = ApiClient::new(&MockConfig::new(server.base_url())).unwrap();
        let err = client
            .post("/auth/login/owner", &json!({"email": "a@b.co", "password": "x"}))
            .await
            .unwrap_err();

        api_mock.assert();
        match err {
            PawcareError::ApiStatusError { status, message } => {
                assert_eq!(status, 401);
                assert_eq!(message, "Invalid credentials");
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_body_is_null() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(DELETE).path("/pets/3");
            then.status(204);
        });

        let client = ApiClient::new(&MockConfig::new(server.base_url())).unwrap();
        let body = client.delete("/pets/3").await.unwrap();

        api_mock.assert();
        assert!(body.is_null());
    }
}
