//! Segment-trie router. Paths are split on `/`; `:name` segments capture one
//! segment of the request path under `name`.
//!
//! Register every route before serving: `handle` takes `&mut self`, lookups
//! take `&self`, and the server only ever sees a shared, finished router.

use serde::{Deserialize, Serialize};

use crate::node::{Node, PARAM_MARKER};
use crate::params::Params;
use crate::CoreError;

/// What `handle` does with malformed or conflicting registrations.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RegistrationPolicy {
    /// Accept everything, log a warning for suspicious routes.
    #[default]
    Lenient,
    /// Reject with `CoreError` and leave the trie untouched.
    Strict,
}

impl std::str::FromStr for RegistrationPolicy {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "lenient" => Ok(Self::Lenient),
            "strict" => Ok(Self::Strict),
            other => Err(CoreError::Config(format!("unknown registration policy {:?}", other))),
        }
    }
}

/// Splits a path into segments, dropping the element before the first `/`.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split('/').skip(1).collect()
}

enum Cursor<'a, H> {
    Descending(&'a Node<H>),
    /// No child matched; nothing further can match.
    Stuck(&'a Node<H>),
}

/// Maps (method, path) to handlers of type `H`.
pub struct Router<H> {
    root: Node<H>,
    policy: RegistrationPolicy,
}

impl<H> Router<H> {
    pub fn new() -> Self {
        Self::with_policy(RegistrationPolicy::default())
    }

    pub fn with_policy(policy: RegistrationPolicy) -> Self {
        Self {
            root: Node::new("/"),
            policy,
        }
    }

    pub fn policy(&self) -> RegistrationPolicy {
        self.policy
    }

    pub fn root(&self) -> &Node<H> {
        &self.root
    }

    pub fn node_count(&self) -> usize {
        self.root.node_count()
    }

    /// get is a shortcut for router.handle("GET", path, handler)
    pub fn get(&mut self, path: &str, handler: H) -> Result<(), CoreError> {
        self.handle("GET", path, handler)
    }

    /// post is a shortcut for router.handle("POST", path, handler)
    pub fn post(&mut self, path: &str, handler: H) -> Result<(), CoreError> {
        self.handle("POST", path, handler)
    }

    /// put is a shortcut for router.handle("PUT", path, handler)
    pub fn put(&mut self, path: &str, handler: H) -> Result<(), CoreError> {
        self.handle("PUT", path, handler)
    }

    /// patch is a shortcut for router.handle("PATCH", path, handler)
    pub fn patch(&mut self, path: &str, handler: H) -> Result<(), CoreError> {
        self.handle("PATCH", path, handler)
    }

    /// delete is a shortcut for router.handle("DELETE", path, handler)
    pub fn delete(&mut self, path: &str, handler: H) -> Result<(), CoreError> {
        self.handle("DELETE", path, handler)
    }

    /// head is a shortcut for router.handle("HEAD", path, handler)
    pub fn head(&mut self, path: &str, handler: H) -> Result<(), CoreError> {
        self.handle("HEAD", path, handler)
    }

    /// options is a shortcut for router.handle("OPTIONS", path, handler)
    pub fn options(&mut self, path: &str, handler: H) -> Result<(), CoreError> {
        self.handle("OPTIONS", path, handler)
    }

    /// Registers `handler` for `method` at `path`, replacing any handler
    /// already registered for that exact method and node.
    ///
    /// The method is matched case-sensitively. Under the strict policy,
    /// malformed paths and conflicting routes are rejected; under the
    /// lenient policy they are logged and registered anyway.
    pub fn handle(&mut self, method: &str, path: &str, handler: H) -> Result<(), CoreError> {
        let segments = split_path(path);

        if let Err(e) = self.check(method, path, &segments) {
            match self.policy {
                RegistrationPolicy::Strict => return Err(e),
                RegistrationPolicy::Lenient => {
                    tracing::warn!(method, path, error = %e, "registering questionable route");
                }
            }
        }

        self.insert_node(&segments)
            .handlers
            .insert(method.to_owned(), handler);
        tracing::debug!(method, path, "route registered");
        Ok(())
    }

    fn check(&self, method: &str, path: &str, segments: &[&str]) -> Result<(), CoreError> {
        if !path.starts_with('/') {
            return Err(CoreError::InvalidPath(format!(
                "path must begin with '/' in path {:?}",
                path
            )));
        }
        if let Some(seg) = segments.iter().find(|s| **s == ":") {
            return Err(CoreError::InvalidPath(format!(
                "empty parameter name {:?} in path {:?}",
                seg, path
            )));
        }

        let mut cursor = Some(&self.root);
        for segment in segments {
            let Some(node) = cursor else { break };
            if segment.starts_with(PARAM_MARKER) {
                if let Some(existing) = node.param_children.iter().find(|k| k.as_str() != *segment) {
                    return Err(CoreError::ConflictingRoute(format!(
                        "{:?} conflicts with existing parameter {:?} in path {:?}",
                        segment, existing, path
                    )));
                }
            }
            cursor = node.child(segment);
        }
        if let Some(node) = cursor {
            if node.handler(method).is_some() {
                return Err(CoreError::ConflictingRoute(format!(
                    "{} {} is already registered",
                    method, path
                )));
            }
        }
        Ok(())
    }

    /// Creates any node missing along `segments`. Inserting an existing
    /// path creates nothing.
    pub fn insert(&mut self, segments: &[&str]) {
        self.insert_node(segments);
    }

    fn insert_node(&mut self, segments: &[&str]) -> &mut Node<H> {
        let mut node = &mut self.root;
        for segment in segments {
            node = node.child_or_insert(segment);
        }
        node
    }

    /// Walks `segments` from the root and returns the last node reached.
    ///
    /// An exact child wins over a parameter child. When several parameter
    /// children share a level, the first one registered is taken and only
    /// its binding is recorded in `bindings`. A parameter never matches an
    /// empty segment (`/users/`). If a segment matches nothing,
    /// the walk stops and the node reached so far is returned; callers must
    /// check its handler table to know whether the path really matched.
    pub fn search<'a>(&'a self, segments: &[&str], bindings: Option<&mut Params>) -> &'a Node<H> {
        match self.walk(segments, bindings) {
            Cursor::Descending(node) | Cursor::Stuck(node) => node,
        }
    }

    /// Like `search`, but `None` unless every segment was consumed.
    pub fn find<'a>(&'a self, segments: &[&str], bindings: Option<&mut Params>) -> Option<&'a Node<H>> {
        match self.walk(segments, bindings) {
            Cursor::Descending(node) => Some(node),
            Cursor::Stuck(_) => None,
        }
    }

    fn walk<'a>(&'a self, segments: &[&str], mut bindings: Option<&mut Params>) -> Cursor<'a, H> {
        let mut cursor = Cursor::Descending(&self.root);
        for segment in segments {
            let node = match cursor {
                Cursor::Descending(node) => node,
                Cursor::Stuck(_) => break,
            };
            cursor = if let Some(child) = node.child(segment) {
                Cursor::Descending(child)
            } else if let Some(child) = node.first_param_child().filter(|_| !segment.is_empty()) {
                if let (Some(params), Some(name)) = (bindings.as_mut(), child.param_name()) {
                    params.add(name, *segment);
                }
                Cursor::Descending(child)
            } else {
                Cursor::Stuck(node)
            };
        }
        cursor
    }

    /// Resolves `method` + `path`, appending path parameters to `params`.
    pub fn lookup(&self, method: &str, path: &str, params: &mut Params) -> Option<&H> {
        self.find(&split_path(path), Some(params))?.handler(method)
    }

    /// Human-readable dump of the trie, one node per line.
    pub fn render(&self) -> String {
        let mut out = String::new();
        render_node(&self.root, 0, &mut out);
        out
    }
}

fn render_node<H>(node: &Node<H>, depth: usize, out: &mut String) {
    let methods = node.methods();
    out.push_str(&"  ".repeat(depth));
    out.push_str(node.segment());
    if !methods.is_empty() {
        out.push_str(&format!(" [{}]", methods.join(", ")));
    }
    out.push('\n');
    let mut children: Vec<&Node<H>> = node.children().collect();
    children.sort_by(|a, b| a.segment().cmp(b.segment()));
    for child in children {
        render_node(child, depth + 1, out);
    }
}

impl<H> Default for Router<H> {
    fn default() -> Self {
        Self::new()
    }
}
