//! Helpers for testing HTTP services end to end.
//!
//! [`TestServer`] serves a router on an ephemeral local port and [`TestClient`]
//! builds requests against it. Every helper panics on internal failures, which
//! fails the calling test.
//!
//! ```ignore
//! let server = TestServer::spawn(app_router(&auth)).await;
//! let client = TestClient::new()
//!     .with_target(&server)
//!     .with_default_headers([("Authorization", "Key good-key-1")]);
//!
//! let response = client.call(Method::GET, "/private").await;
//! assert_eq!(response.status(), StatusCode::OK);
//! ```

use std::{net::SocketAddr, path::Path, time::Duration};

use axum::Router;
use reqwest::{
    Method, Request, Response,
    header::{CONTENT_TYPE, HeaderMap, HeaderName, HeaderValue},
};
use serde::{Serialize, de::DeserializeOwned};
use tokio::{net::TcpListener, task::JoinHandle};
use url::{Url, form_urlencoded};

const CLIENT_TIMEOUT: Duration = Duration::from_secs(10);

/// A router served on `127.0.0.1` until dropped.
pub struct TestServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl TestServer {
    pub async fn spawn(router: Router) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind test server");
        let addr = listener.local_addr().expect("Failed to read test server address");

        let handle = tokio::spawn(async move {
            if let Err(err) = axum::serve(listener, router).await {
                tracing::error!(error = %err, "test server stopped");
            }
        });

        Self { addr, handle }
    }

    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Base URL, e.g. `http://127.0.0.1:41234/`.
    pub fn url(&self) -> Url {
        Url::parse(&format!("http://{}/", self.addr)).expect("Failed to build test server URL")
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

/// HTTP client bound to one target server.
///
/// Each client keeps its own default headers, so clients authenticating as
/// different callers can share a server.
#[derive(Debug, Clone)]
pub struct TestClient {
    http: reqwest::Client,
    target: Option<Url>,
    default_headers: HeaderMap,
}

impl Default for TestClient {
    fn default() -> Self {
        Self::new()
    }
}

impl TestClient {
    pub fn new() -> Self {
        let http = reqwest::Client::builder()
            .timeout(CLIENT_TIMEOUT)
            .build()
            .expect("Failed to build HTTP client");

        Self {
            http,
            target: None,
            default_headers: HeaderMap::new(),
        }
    }

    #[must_use]
    pub fn with_target(self, server: &TestServer) -> Self {
        self.with_target_url(server.url())
    }

    #[must_use]
    pub fn with_target_url(mut self, url: Url) -> Self {
        self.target = Some(url);
        self
    }

    /// Headers set on every request built by this client, replacing earlier defaults.
    #[must_use]
    pub fn with_default_headers<I, K, V>(mut self, headers: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        self.default_headers = headers
            .into_iter()
            .map(|(name, value)| {
                let name = HeaderName::from_bytes(name.as_ref().as_bytes())
                    .unwrap_or_else(|e| panic!("invalid header name {:?}: {e}", name.as_ref()));
                let value = HeaderValue::from_str(value.as_ref())
                    .unwrap_or_else(|e| panic!("invalid header value {:?}: {e}", value.as_ref()));
                (name, value)
            })
            .collect();
        self
    }

    pub fn default_headers(&self) -> &HeaderMap {
        &self.default_headers
    }

    /// Request for `path` on the target server, with the default headers set.
    ///
    /// A query string in `path` is parsed and encoded again.
    ///
    /// # Panics
    ///
    /// Panics if no target is set or the resulting URL is invalid.
    pub fn new_request(&self, method: Method, path: &str, body: Option<Vec<u8>>) -> Request {
        let mut request = Request::new(method, self.url_for(path));
        *request.headers_mut() = self.default_headers.clone();
        if let Some(body) = body {
            *request.body_mut() = Some(body.into());
        }
        request
    }

    /// Like [`TestClient::new_request`], with `body` encoded as JSON.
    pub fn new_json_request<T>(&self, method: Method, path: &str, body: &T) -> Request
    where
        T: Serialize + ?Sized,
    {
        let json = serde_json::to_vec(body).expect("Failed to encode JSON body");
        let mut request = self.new_request(method, path, Some(json));
        request
            .headers_mut()
            .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
        request
    }

    pub async fn call(&self, method: Method, path: &str) -> Response {
        self.execute(self.new_request(method, path, None)).await
    }

    pub async fn call_json<T>(&self, method: Method, path: &str, body: &T) -> Response
    where
        T: Serialize + ?Sized,
    {
        self.execute(self.new_json_request(method, path, body)).await
    }

    /// Send a request built by this client.
    pub async fn execute(&self, request: Request) -> Response {
        let url = request.url().clone();
        self.http
            .execute(request)
            .await
            .unwrap_or_else(|e| panic!("request to {url} failed: {e}"))
    }

    fn url_for(&self, path: &str) -> Url {
        let target = self
            .target
            .as_ref()
            .expect("TestClient has no target server");

        let (path, query) = match path.split_once('?') {
            Some((path, query)) => (path, Some(query)),
            None => (path, None),
        };

        let absolute = format!("{}{}", target.as_str().trim_end_matches('/'), path);
        let mut url = Url::parse(&absolute)
            .unwrap_or_else(|e| panic!("invalid request URL {absolute:?}: {e}"));

        if let Some(query) = query {
            let pairs: Vec<(String, String)> =
                form_urlencoded::parse(query.as_bytes()).into_owned().collect();
            url.query_pairs_mut().clear().extend_pairs(pairs);
        }
        url
    }
}

/// Decode a JSON response body into `T`.
pub async fn unmarshal_json_response<T>(response: Response) -> T
where
    T: DeserializeOwned,
{
    let body = response.bytes().await.expect("Failed to read response body");
    serde_json::from_slice(&body).unwrap_or_else(|e| {
        panic!(
            "invalid JSON response {:?}: {e}",
            String::from_utf8_lossy(&body)
        )
    })
}

/// Decode the JSON file at `path` into `T`.
pub fn unmarshal_json_file<T>(path: impl AsRef<Path>) -> T
where
    T: DeserializeOwned,
{
    let path = path.as_ref();
    let contents = std::fs::read(path)
        .unwrap_or_else(|e| panic!("failed to read {}: {e}", path.display()));
    serde_json::from_slice(&contents)
        .unwrap_or_else(|e| panic!("invalid JSON in {}: {e}", path.display()))
}
