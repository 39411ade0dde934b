//! Trie node: one path segment, its handlers by method and its child segments.

use std::collections::HashMap;

/// Marks a segment as a named parameter (`:id`).
pub const PARAM_MARKER: char = ':';

/// One segment position in the route space.
///
/// `segment` never contains `/`; the root uses `"/"`.
#[derive(Debug)]
pub struct Node<H> {
    segment: String,
    is_param: bool,
    pub(crate) children: HashMap<String, Node<H>>,
    /// Keys of parameter children, in registration order.
    pub(crate) param_children: Vec<String>,
    pub(crate) handlers: HashMap<String, H>,
}

impl<H> Node<H> {
    pub fn new(segment: &str) -> Self {
        Self {
            segment: segment.to_owned(),
            is_param: segment.starts_with(PARAM_MARKER),
            children: HashMap::new(),
            param_children: Vec::new(),
            handlers: HashMap::new(),
        }
    }

    pub fn segment(&self) -> &str {
        &self.segment
    }

    pub fn is_param(&self) -> bool {
        self.is_param
    }

    /// Parameter name without the marker. `None` for static segments.
    pub fn param_name(&self) -> Option<&str> {
        if self.is_param {
            Some(&self.segment[PARAM_MARKER.len_utf8()..])
        } else {
            None
        }
    }

    pub fn handler(&self, method: &str) -> Option<&H> {
        self.handlers.get(method)
    }

    /// Methods with a handler on this node, sorted.
    pub fn methods(&self) -> Vec<&str> {
        let mut methods: Vec<&str> = self.handlers.keys().map(String::as_str).collect();
        methods.sort_unstable();
        methods
    }

    pub fn child(&self, segment: &str) -> Option<&Node<H>> {
        self.children.get(segment)
    }

    pub fn children(&self) -> impl Iterator<Item = &Node<H>> {
        self.children.values()
    }

    /// First-registered parameter child; the one search descends into.
    pub(crate) fn first_param_child(&self) -> Option<&Node<H>> {
        self.param_children
            .first()
            .and_then(|key| self.children.get(key))
    }

    /// Returns the child for `segment`, creating it if absent.
    pub(crate) fn child_or_insert(&mut self, segment: &str) -> &mut Node<H> {
        if segment.starts_with(PARAM_MARKER) && !self.children.contains_key(segment) {
            self.param_children.push(segment.to_owned());
        }
        self.children
            .entry(segment.to_owned())
            .or_insert_with(|| Node::new(segment))
    }

    /// Number of nodes in this subtree, this node included.
    pub fn node_count(&self) -> usize {
        1 + self.children.values().map(Node::node_count).sum::<usize>()
    }
}
