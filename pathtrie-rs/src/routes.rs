//! Route files: a TOML list of routes with canned responses.
//!
//! ```toml
//! policy = "strict"
//!
//! [[route]]
//! method = "GET"
//! path = "/users/:id"
//!
//! [[route]]
//! method = "DELETE"
//! path = "/users/:id"
//! status = 204
//! body = ""
//! ```
//!
//! A route without `body` answers with its pattern and the bindings as JSON.

use std::path::Path;

use serde::Deserialize;
use serde_json::json;

use crate::{App, Error, RegistrationPolicy};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct RouteFile {
    pub policy: Option<RegistrationPolicy>,
    #[serde(default, rename = "route")]
    pub routes: Vec<RouteSpec>,
}

#[derive(Clone, Debug, PartialEq, Eq, Deserialize)]
pub struct RouteSpec {
    pub method: String,
    pub path: String,
    #[serde(default = "default_status")]
    pub status: u16,
    pub body: Option<String>,
}

fn default_status() -> u16 {
    200
}

impl RouteSpec {
    pub fn new(method: &str, path: &str) -> Self {
        Self {
            method: method.to_owned(),
            path: path.to_owned(),
            status: default_status(),
            body: None,
        }
    }
}

impl RouteFile {
    pub fn parse(s: &str) -> Result<Self, Error> {
        Ok(toml::from_str(s)?)
    }

    pub fn load(path: &Path) -> Result<Self, Error> {
        let text = std::fs::read_to_string(path)?;
        Self::parse(&text)
    }

    /// Registers every route into `app`, stopping at the first rejected one.
    pub fn register_into(&self, app: &mut App) -> Result<(), Error> {
        for spec in &self.routes {
            register(app, spec.clone())?;
        }
        tracing::info!(routes = self.routes.len(), "route table loaded");
        Ok(())
    }

    /// Builds an app with the file's policy, or `fallback` when it has none.
    pub fn into_app(self, fallback: RegistrationPolicy) -> Result<App, Error> {
        let mut app = App::with_policy(self.policy.unwrap_or(fallback));
        self.register_into(&mut app)?;
        Ok(app)
    }
}

fn register(app: &mut App, spec: RouteSpec) -> Result<(), Error> {
    let RouteSpec {
        method,
        path,
        status,
        body,
    } = spec;
    let pattern = path.clone();
    app.handler(&method, &path, move |w, req, params| {
        w.write_header(status);
        match &body {
            Some(body) => w.write_str(body),
            None => {
                let echo = json!({
                    "route": pattern,
                    "method": req.method,
                    "path": req.path,
                    "params": params,
                });
                if let Err(e) = w.write_json(&echo) {
                    tracing::error!(error = %e, "failed to encode response");
                }
            }
        }
    })?;
    Ok(())
}

/// Routes served when no route file is given.
pub fn demo_routes() -> RouteFile {
    RouteFile {
        policy: None,
        routes: vec![
            RouteSpec::new("GET", "/echo/:name"),
            RouteSpec::new("POST", "/echo/:name"),
            RouteSpec::new("GET", "/users/:id/posts/:post"),
            RouteSpec {
                body: Some("ok".into()),
                ..RouteSpec::new("GET", "/health")
            },
        ],
    }
}
