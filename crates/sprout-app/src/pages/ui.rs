//! Minimal UI kit used by the demo pages.
//!
//! Class names map onto the base stylesheet shipped in the bundle.

use crate::node::Node;

/// Full-height flex column with centered content.
pub fn centered_box(children: Vec<Node>) -> Node {
    Node::element("div", children).attr("class", "box box-centered")
}

/// Raised surface. Elevation is clamped to 0..=24.
pub fn paper(elevation: u8, children: Vec<Node>) -> Node {
    Node::element("div", children).attr(
        "class",
        format!("paper paper-elevation-{}", elevation.min(24)),
    )
}

/// Text styled as the given variant (`h1`..`h6` render as headings).
pub fn typography(variant: &str, text: impl Into<String>) -> Node {
    let tag = match variant {
        "h1" | "h2" | "h3" | "h4" | "h5" | "h6" => variant,
        _ => "p",
    };
    Node::element(tag, vec![Node::text(text)])
        .attr("class", format!("typography typography-{}", variant))
}
