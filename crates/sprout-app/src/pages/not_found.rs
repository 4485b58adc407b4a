//! Fallback output for paths outside the route table.

use crate::node::Node;

/// Heading of the not-found outlet.
pub const NOT_FOUND_TITLE: &str = "Page not found";

/// Text before the unmatched path.
pub const NOT_FOUND_DETAIL: &str = "No page is routed at";

pub fn render(path: &str) -> Node {
    Node::Fragment(vec![
        Node::heading(1, NOT_FOUND_TITLE),
        Node::paragraph(format!("{} {}", NOT_FOUND_DETAIL, path)),
    ])
}
