//! Display nodes produced by pages.

use std::fmt::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;

/// Image width and height, fixed regardless of the source asset.
pub const IMAGE_SIZE: &str = "100";

/// A reference to a file under the project's `src/` directory.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct AssetRef(PathBuf);

impl AssetRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

/// Resolves asset references to servable URLs or embedded data.
pub trait AssetResolver {
    /// Returns `None` when the asset was never resolved.
    fn resolve(&self, asset: &AssetRef) -> Option<String>;
}

/// Resolver that leaves every reference as its relative path.
#[derive(Debug, Default)]
pub struct PassthroughResolver;

impl AssetResolver for PassthroughResolver {
    fn resolve(&self, asset: &AssetRef) -> Option<String> {
        Some(asset.path().to_string_lossy().replace('\\', "/"))
    }
}

/// A node in a rendered display tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Node {
    Element {
        tag: String,
        attrs: Vec<(String, String)>,
        children: Vec<Node>,
    },
    Text(String),
    Image {
        src: AssetRef,
        alt: String,
        width: String,
        height: String,
    },
    Fragment(Vec<Node>),
}

impl Node {
    pub fn element(tag: &str, children: Vec<Node>) -> Self {
        Node::Element {
            tag: tag.to_string(),
            attrs: Vec::new(),
            children,
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        Node::Text(text.into())
    }

    pub fn heading(level: u8, text: impl Into<String>) -> Self {
        let level = level.clamp(1, 6);
        Node::element(&format!("h{}", level), vec![Node::text(text)])
    }

    pub fn paragraph(text: impl Into<String>) -> Self {
        Node::element("p", vec![Node::text(text)])
    }

    /// An image with the fixed 100x100 display size.
    pub fn image(src: impl Into<PathBuf>, alt: impl Into<String>) -> Self {
        Node::Image {
            src: AssetRef::new(src),
            alt: alt.into(),
            width: IMAGE_SIZE.to_string(),
            height: IMAGE_SIZE.to_string(),
        }
    }

    /// Add an attribute. No-op on anything but elements.
    pub fn attr(mut self, name: &str, value: impl Into<String>) -> Self {
        if let Node::Element { attrs, .. } = &mut self {
            attrs.push((name.to_string(), value.into()));
        }
        self
    }

    /// Every asset referenced by this tree, in document order.
    pub fn assets(&self) -> Vec<AssetRef> {
        let mut out = Vec::new();
        self.collect_assets(&mut out);
        out
    }

    fn collect_assets(&self, out: &mut Vec<AssetRef>) {
        match self {
            Node::Image { src, .. } => {
                if !out.contains(src) {
                    out.push(src.clone());
                }
            }
            Node::Element { children, .. } | Node::Fragment(children) => {
                for child in children {
                    child.collect_assets(out);
                }
            }
            Node::Text(_) => {}
        }
    }

    /// Concatenated text content, without markup.
    pub fn text_content(&self) -> String {
        match self {
            Node::Text(text) => text.clone(),
            Node::Image { .. } => String::new(),
            Node::Element { children, .. } | Node::Fragment(children) => {
                children.iter().map(Node::text_content).collect()
            }
        }
    }

    /// Render to HTML. Unresolved images keep their relative path.
    pub fn to_html(&self, resolver: &dyn AssetResolver) -> String {
        let mut out = String::new();
        self.write_html(&mut out, resolver);
        out
    }

    fn write_html(&self, out: &mut String, resolver: &dyn AssetResolver) {
        match self {
            Node::Text(text) => {
                out.push_str(&escape_html(text));
            }
            Node::Image {
                src,
                alt,
                width,
                height,
            } => {
                let url = resolver
                    .resolve(src)
                    .unwrap_or_else(|| src.path().to_string_lossy().to_string());
                let _ = write!(
                    out,
                    r#"<img src="{}" alt="{}" width="{}" height="{}">"#,
                    escape_html(&url),
                    escape_html(alt),
                    escape_html(width),
                    escape_html(height)
                );
            }
            Node::Element {
                tag,
                attrs,
                children,
            } => {
                let _ = write!(out, "<{}", tag);
                for (name, value) in attrs {
                    let _ = write!(out, r#" {}="{}""#, name, escape_html(value));
                }
                out.push('>');
                for child in children {
                    child.write_html(out, resolver);
                }
                let _ = write!(out, "</{}>", tag);
            }
            Node::Fragment(children) => {
                for child in children {
                    child.write_html(out, resolver);
                }
            }
        }
    }
}

/// Escape text for HTML content and double-quoted attributes.
fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    struct MapResolver(HashMap<AssetRef, String>);

    impl AssetResolver for MapResolver {
        fn resolve(&self, asset: &AssetRef) -> Option<String> {
            self.0.get(asset).cloned()
        }
    }

    #[test]
    fn renders_nested_elements() {
        let node = Node::Fragment(vec![
            Node::heading(1, "Title"),
            Node::paragraph("Body").attr("class", "lead"),
        ]);

        let html = node.to_html(&PassthroughResolver);

        assert_eq!(html, r#"<h1>Title</h1><p class="lead">Body</p>"#);
    }

    #[test]
    fn escapes_text_and_attributes() {
        let node = Node::paragraph("<script>&").attr("title", "\"quoted\"");
        let html = node.to_html(&PassthroughResolver);

        assert!(!html.contains("<script>"));
        assert!(html.contains("&lt;script&gt;&amp;"));
        assert!(!html.contains("\"quoted\""));
    }

    #[test]
    fn images_use_resolved_url_and_fixed_size() {
        let mut urls = HashMap::new();
        urls.insert(
            AssetRef::new("assets/logo.png"),
            "/logo.abc123.png".to_string(),
        );

        let node = Node::image("assets/logo.png", "Logo");
        let html = node.to_html(&MapResolver(urls));

        assert_eq!(
            html,
            r#"<img src="/logo.abc123.png" alt="Logo" width="100" height="100">"#
        );
    }

    #[test]
    fn collects_assets_once_in_order() {
        let node = Node::Fragment(vec![
            Node::image("assets/a.png", "a"),
            Node::element("div", vec![Node::image("assets/b.svg", "b")]),
            Node::image("assets/a.png", "a again"),
        ]);

        let assets = node.assets();

        assert_eq!(
            assets,
            vec![AssetRef::new("assets/a.png"), AssetRef::new("assets/b.svg")]
        );
    }

    #[test]
    fn text_content_skips_markup() {
        let node = Node::element(
            "div",
            vec![Node::heading(2, "Hello"), Node::image("x.png", "x"), Node::text(" world")],
        );

        assert_eq!(node.text_content(), "Hello world");
    }
}
