use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, RwLock};
use std::time::Duration;

use reqwest::cookie::{CookieStore, Jar};
use reqwest::header::HeaderValue;
use reqwest::{StatusCode, Url};

use crate::retry;

/// Outbound GET request handed to a transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpRequest {
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub timeout_ms: u64,
}

impl HttpRequest {
    pub fn get(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            headers: BTreeMap::new(),
            timeout_ms: 15_000,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }
}

/// Response returned by a transport. Header names are lowercase.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            headers: BTreeMap::new(),
            body: body.into(),
        }
    }

    pub fn ok_json(body: impl Into<String>) -> Self {
        Self::new(200, body)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }

    pub const fn is_throttled(&self) -> bool {
        self.status == 429
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Back-off requested by the provider through `Retry-After`.
    pub fn retry_after(&self) -> Option<Duration> {
        self.header("retry-after").and_then(retry::parse_retry_after)
    }

    /// Canonical reason phrase for the status code.
    pub fn reason(&self) -> String {
        StatusCode::from_u16(self.status)
            .ok()
            .and_then(|status| status.canonical_reason())
            .unwrap_or("Unknown Status")
            .to_owned()
    }
}

/// Transport-level HTTP error (connection, timeout, body read).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    message: String,
    timed_out: bool,
}

impl HttpError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timed_out: false,
        }
    }

    pub fn timeout(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            timed_out: true,
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn timed_out(&self) -> bool {
        self.timed_out
    }
}

impl Display for HttpError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HttpError {}

/// One live connection context: a connection pool plus its cookie state.
pub trait HttpClient: Send + Sync {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>>;

    /// Drops every cookie held by this context.
    fn clear_cookies(&self);
}

/// Opens fresh connection contexts. Used on first use and after a throttle.
pub trait HttpConnector: Send + Sync {
    fn connect(&self) -> Result<Arc<dyn HttpClient>, HttpError>;
}

/// Cookie store whose contents can be discarded while the client stays alive.
#[derive(Debug, Default)]
pub struct SessionCookieJar {
    inner: RwLock<Arc<Jar>>,
}

impl SessionCookieJar {
    pub fn clear(&self) {
        let mut inner = self
            .inner
            .write()
            .expect("cookie jar lock should not be poisoned");
        *inner = Arc::new(Jar::default());
    }

    fn current(&self) -> Arc<Jar> {
        Arc::clone(
            &self
                .inner
                .read()
                .expect("cookie jar lock should not be poisoned"),
        )
    }
}

impl CookieStore for SessionCookieJar {
    fn set_cookies(&self, cookie_headers: &mut dyn Iterator<Item = &HeaderValue>, url: &Url) {
        self.current().set_cookies(cookie_headers, url);
    }

    fn cookies(&self, url: &Url) -> Option<HeaderValue> {
        self.current().cookies(url)
    }
}

/// Production transport backed by a reqwest client with its own cookie jar.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: reqwest::Client,
    cookies: Arc<SessionCookieJar>,
}

impl ReqwestHttpClient {
    pub fn new(user_agent: &str) -> Result<Self, HttpError> {
        let cookies = Arc::new(SessionCookieJar::default());
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .cookie_provider(Arc::clone(&cookies))
            .build()
            .map_err(|e| HttpError::new(format!("failed to build http client: {e}")))?;

        Ok(Self { client, cookies })
    }
}

impl HttpClient for ReqwestHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        Box::pin(async move {
            let mut builder = self
                .client
                .get(&request.url)
                .timeout(Duration::from_millis(request.timeout_ms));

            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }

            let response = builder.send().await.map_err(|e| {
                if e.is_timeout() {
                    HttpError::timeout(format!("request timeout: {e}"))
                } else if e.is_connect() {
                    HttpError::new(format!("connection failed: {e}"))
                } else {
                    HttpError::new(format!("request failed: {e}"))
                }
            })?;

            let status = response.status().as_u16();
            let headers = response
                .headers()
                .iter()
                .filter_map(|(name, value)| {
                    value
                        .to_str()
                        .ok()
                        .map(|value| (name.as_str().to_owned(), value.to_owned()))
                })
                .collect();
            let body = response
                .text()
                .await
                .map_err(|e| HttpError::new(format!("failed to read response body: {e}")))?;

            Ok(HttpResponse {
                status,
                headers,
                body,
            })
        })
    }

    fn clear_cookies(&self) {
        self.cookies.clear();
    }
}

/// Connector producing a fresh [`ReqwestHttpClient`] per session.
#[derive(Debug, Clone)]
pub struct ReqwestConnector {
    user_agent: String,
}

impl ReqwestConnector {
    pub fn new(user_agent: impl Into<String>) -> Self {
        Self {
            user_agent: user_agent.into(),
        }
    }
}

impl HttpConnector for ReqwestConnector {
    fn connect(&self) -> Result<Arc<dyn HttpClient>, HttpError> {
        Ok(Arc::new(ReqwestHttpClient::new(&self.user_agent)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_lookup_is_case_insensitive() {
        let response = HttpResponse::new(429, "").with_header("Retry-After", "7");

        assert_eq!(response.header("retry-after"), Some("7"));
        assert_eq!(response.retry_after(), Some(Duration::from_secs(7)));
        assert!(response.is_throttled());
    }

    #[test]
    fn reason_uses_canonical_phrase() {
        assert_eq!(HttpResponse::new(503, "").reason(), "Service Unavailable");
        assert_eq!(HttpResponse::new(299, "").reason(), "Unknown Status");
    }

    #[test]
    fn request_timeout_is_stored_in_millis() {
        let request = HttpRequest::get("https://example.test/quote")
            .with_timeout(Duration::from_secs(2))
            .with_header("Accept", "application/json");

        assert_eq!(request.timeout_ms, 2_000);
        assert_eq!(
            request.headers.get("accept").map(String::as_str),
            Some("application/json")
        );
    }

    #[test]
    fn cleared_jar_forgets_cookies() {
        let jar = SessionCookieJar::default();
        let url: Url = "https://stockanalysis.com/".parse().expect("valid url");
        let cookie = HeaderValue::from_static("session=abc; Path=/");

        jar.set_cookies(&mut std::iter::once(&cookie), &url);
        assert!(jar.cookies(&url).is_some());

        jar.clear();
        assert!(jar.cookies(&url).is_none());
    }
}
