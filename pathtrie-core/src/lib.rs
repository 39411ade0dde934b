//! pathtrie core: segment-trie routing, request dispatch, HTTP server.

pub mod config;
pub mod http;
pub mod node;
pub mod params;
pub mod router;

pub use config::ServerConfig;
pub use node::Node;
pub use params::Params;
pub use router::{split_path, RegistrationPolicy, Router};

use bytes::Bytes;
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("conflicting route: {0}")]
    ConflictingRoute(String),
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("invalid JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Request handler: writes the whole response. Receives the request and the
/// bindings (form values first, then path parameters).
pub type Handler = Box<dyn Fn(&mut ResponseWriter, &Request, &Params) + Send + Sync>;

/// Inbound request as seen by handlers, independent of the HTTP server.
#[derive(Clone, Debug, Default)]
pub struct Request {
    pub method: String,
    /// Raw path, not percent-decoded.
    pub path: String,
    /// Raw query string without `?`.
    pub query: String,
    pub headers: Vec<(String, String)>,
    pub body: Bytes,
}

impl Request {
    pub fn new(method: &str, path: &str) -> Self {
        Self {
            method: method.to_owned(),
            path: path.to_owned(),
            ..Self::default()
        }
    }

    pub fn with_query(mut self, query: &str) -> Self {
        self.query = query.to_owned();
        self
    }

    pub fn with_header(mut self, name: &str, value: &str) -> Self {
        self.headers.push((name.to_owned(), value.to_owned()));
        self
    }

    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    /// First header named `name`, compared case-insensitively.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    fn has_form_body(&self) -> bool {
        matches!(self.method.as_str(), "POST" | "PUT" | "PATCH")
            && self
                .header("content-type")
                .map(|ct| ct.starts_with("application/x-www-form-urlencoded"))
                .unwrap_or(false)
    }

    /// Form values: url-encoded body values (POST, PUT, PATCH) followed by
    /// query string values.
    pub fn form_values(&self) -> Params {
        let mut params = Params::new();
        if self.has_form_body() {
            for (k, v) in url::form_urlencoded::parse(&self.body) {
                params.add(k, v);
            }
        }
        for (k, v) in url::form_urlencoded::parse(self.query.as_bytes()) {
            params.add(k, v);
        }
        params
    }
}

/// Collects what a handler writes; the server turns it into the HTTP response.
#[derive(Clone, Debug, Default)]
pub struct ResponseWriter {
    status: Option<u16>,
    headers: Vec<(String, String)>,
    body: Vec<u8>,
}

impl ResponseWriter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the status code. Only the first call has an effect.
    pub fn write_header(&mut self, status: u16) {
        if self.status.is_none() {
            self.status = Some(status);
        }
    }

    pub fn set_header(&mut self, name: &str, value: &str) {
        self.headers.retain(|(k, _)| !k.eq_ignore_ascii_case(name));
        self.headers.push((name.to_owned(), value.to_owned()));
    }

    /// Appends to the body; an unset status becomes 200.
    pub fn write(&mut self, data: &[u8]) {
        self.write_header(200);
        self.body.extend_from_slice(data);
    }

    pub fn write_str(&mut self, s: &str) {
        self.write(s.as_bytes());
    }

    pub fn write_json<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), CoreError> {
        let body = serde_json::to_vec(value)?;
        self.set_header("Content-Type", "application/json");
        self.write(&body);
        Ok(())
    }

    pub fn status(&self) -> u16 {
        self.status.unwrap_or(200)
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

/// Route table plus dispatch. Register every route, then serve: `run` and
/// `http::serve` take the app by value and only read it afterwards.
pub struct App {
    pub router: Router<Handler>,
}

impl App {
    pub fn new() -> Self {
        Self::with_policy(RegistrationPolicy::default())
    }

    pub fn with_policy(policy: RegistrationPolicy) -> Self {
        Self {
            router: Router::with_policy(policy),
        }
    }

    /// Register `handler` for `method` at `path` (e.g. "/users/:id").
    pub fn handler<F>(&mut self, method: &str, path: &str, handler: F) -> Result<(), CoreError>
    where
        F: Fn(&mut ResponseWriter, &Request, &Params) + Send + Sync + 'static,
    {
        self.router.handle(method, path, Box::new(handler))
    }

    pub fn get<F>(&mut self, path: &str, handler: F) -> Result<(), CoreError>
    where
        F: Fn(&mut ResponseWriter, &Request, &Params) + Send + Sync + 'static,
    {
        self.handler("GET", path, handler)
    }

    pub fn post<F>(&mut self, path: &str, handler: F) -> Result<(), CoreError>
    where
        F: Fn(&mut ResponseWriter, &Request, &Params) + Send + Sync + 'static,
    {
        self.handler("POST", path, handler)
    }

    /// Resolve the request to a handler and call it. Without a handler for
    /// this method and path the response is a bare 404.
    pub fn dispatch(&self, req: &Request) -> ResponseWriter {
        let mut params = req.form_values();
        let mut w = ResponseWriter::new();
        let handler = self
            .router
            .find(&split_path(&req.path), Some(&mut params))
            .and_then(|node| node.handler(&req.method));

        match handler {
            Some(handler) => {
                tracing::debug!(method = %req.method, path = %req.path, params = params.len(), "route matched");
                handler(&mut w, req, &params);
            }
            None => {
                tracing::debug!(method = %req.method, path = %req.path, "no route");
                w.write_header(404);
            }
        }
        w
    }

    /// Run HTTP server (blocks) until ctrl-c.
    pub fn run(self, config: &ServerConfig) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        http::run(self, config)
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new()
    }
}
