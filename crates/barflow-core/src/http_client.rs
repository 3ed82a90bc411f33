//! HTTP transport seam.
//!
//! The fetch client only talks to the network through [`HttpClient`], so runs
//! can be driven by [`ReqwestHttpClient`] in production and by
//! [`ScriptedHttpClient`] in tests.

use std::collections::{BTreeMap, VecDeque};
use std::fmt::{Display, Formatter};
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::polygon::redact_api_key;

/// Default per-attempt request timeout.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// GET request issued by the fetch client.
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
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .insert(name.into().to_ascii_lowercase(), value.into());
        self
    }

    pub fn with_timeout_ms(mut self, timeout_ms: u64) -> Self {
        self.timeout_ms = timeout_ms;
        self
    }
}

/// Status and body of a completed exchange.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn ok_json(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn with_status(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub const fn is_success(&self) -> bool {
        self.status >= 200 && self.status < 300
    }
}

/// Transport-level failure: the request never produced a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpError {
    message: String,
}

impl HttpError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl Display for HttpError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for HttpError {}

/// Transport contract used by the fetch client.
pub trait HttpClient: Send + Sync {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>>;
}

/// Production HTTP client backed by reqwest.
#[derive(Debug, Clone)]
pub struct ReqwestHttpClient {
    client: Arc<reqwest::Client>,
}

impl ReqwestHttpClient {
    pub fn new() -> Self {
        Self {
            client: Arc::new(
                reqwest::Client::builder()
                    .user_agent(concat!("barflow/", env!("CARGO_PKG_VERSION")))
                    .build()
                    .unwrap_or_else(|_| reqwest::Client::new()),
            ),
        }
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self {
            client: Arc::new(client),
        }
    }
}

impl Default for ReqwestHttpClient {
    fn default() -> Self {
        Self::new()
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
                .timeout(std::time::Duration::from_millis(request.timeout_ms));

            for (name, value) in &request.headers {
                builder = builder.header(name, value);
            }

            // reqwest errors can echo the full URL, which carries the api key.
            let response = builder.send().await.map_err(|e| {
                let e = e.without_url();
                if e.is_timeout() {
                    HttpError::new(format!("request timeout: {e}"))
                } else if e.is_connect() {
                    HttpError::new(format!("connection failed: {e}"))
                } else {
                    HttpError::new(format!("request failed: {e}"))
                }
            })?;

            let status = response.status().as_u16();
            let body = response.text().await.map_err(|e| {
                HttpError::new(format!("failed to read response body: {}", e.without_url()))
            })?;

            Ok(HttpResponse { status, body })
        })
    }
}

type Scripted = Result<HttpResponse, HttpError>;

#[derive(Debug)]
struct Route {
    fragment: String,
    replies: VecDeque<Scripted>,
    calls: usize,
}

/// Offline transport that answers from a script.
///
/// Each route matches requests whose URL contains its fragment; replies are
/// consumed in order and the last one repeats. Unmatched requests fail with a
/// transport error.
#[derive(Debug, Default)]
pub struct ScriptedHttpClient {
    routes: Mutex<Vec<Route>>,
    total_calls: AtomicUsize,
}

impl ScriptedHttpClient {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(self, fragment: impl Into<String>, replies: Vec<Scripted>) -> Self {
        if let Ok(mut routes) = self.routes.lock() {
            routes.push(Route {
                fragment: fragment.into(),
                replies: replies.into(),
                calls: 0,
            });
        }
        self
    }

    /// Number of requests matched by the route registered for `fragment`.
    pub fn calls_for(&self, fragment: &str) -> usize {
        self.routes
            .lock()
            .map(|routes| {
                routes
                    .iter()
                    .filter(|route| route.fragment == fragment)
                    .map(|route| route.calls)
                    .sum()
            })
            .unwrap_or(0)
    }

    pub fn total_calls(&self) -> usize {
        self.total_calls.load(Ordering::SeqCst)
    }

    fn next_reply(&self, url: &str) -> Scripted {
        self.total_calls.fetch_add(1, Ordering::SeqCst);
        let mut routes = self
            .routes
            .lock()
            .map_err(|_| HttpError::new("scripted client lock poisoned"))?;

        let Some(route) = routes.iter_mut().find(|route| url.contains(&route.fragment)) else {
            return Err(HttpError::new(format!(
                "no scripted route for {}",
                redact_api_key(url)
            )));
        };
        route.calls += 1;

        match route.replies.len() {
            0 => Err(HttpError::new("scripted route has no replies")),
            1 => route.replies[0].clone(),
            _ => route
                .replies
                .pop_front()
                .unwrap_or_else(|| Err(HttpError::new("scripted route has no replies"))),
        }
    }
}

impl HttpClient for ScriptedHttpClient {
    fn execute<'a>(
        &'a self,
        request: HttpRequest,
    ) -> Pin<Box<dyn Future<Output = Result<HttpResponse, HttpError>> + Send + 'a>> {
        let reply = self.next_reply(&request.url);
        Box::pin(async move { reply })
    }
}
