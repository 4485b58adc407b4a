//! HTML document rendering.

use minijinja::{context, Environment};

/// Context for rendering the HTML document.
#[derive(Debug, Clone, serde::Serialize)]
pub struct Context {
    /// Document title
    pub title: String,
    /// Pre-rendered navigation and outlet placeholder
    pub app: String,
    /// Build mode tag
    pub mode: String,
    /// Named environment value
    pub name: String,
    /// Script URLs to load, in order
    pub scripts: Vec<String>,
}

/// Template engine using minijinja.
pub struct TemplateEngine {
    env: Environment<'static>,
}

impl TemplateEngine {
    /// Create an engine with the built-in document template.
    pub fn new() -> Self {
        let mut env = Environment::new();
        env.add_template_owned("index.html".to_string(), DOCUMENT_TEMPLATE.to_string())
            .expect("Failed to add document template");
        Self { env }
    }

    /// Create an engine whose document template is `source`.
    pub fn with_document(source: String) -> Result<Self, minijinja::Error> {
        let mut env = Environment::new();
        env.add_template_owned("index.html".to_string(), source)?;
        Ok(Self { env })
    }

    /// Render the document, injecting script tags the template did not place itself.
    pub fn render_document(&self, context: &Context) -> Result<String, minijinja::Error> {
        let tmpl = self.env.get_template("index.html")?;

        let html = tmpl.render(context! {
            title => &context.title,
            app => &context.app,
            mode => &context.mode,
            name => &context.name,
            scripts => &context.scripts,
        })?;

        Ok(inject_scripts(html, &context.scripts))
    }
}

impl Default for TemplateEngine {
    fn default() -> Self {
        Self::new()
    }
}

/// Add a `<script>` tag for every URL not already referenced, before `</body>`.
fn inject_scripts(mut html: String, scripts: &[String]) -> String {
    let tags: String = scripts
        .iter()
        .filter(|src| !html.contains(&format!("src=\"{}\"", src)))
        .map(|src| format!("<script src=\"{}\"></script>\n", src))
        .collect();

    if tags.is_empty() {
        return html;
    }

    match html.rfind("</body>") {
        Some(pos) => html.insert_str(pos, &tags),
        None => html.push_str(&tags),
    }
    html
}

const DOCUMENT_TEMPLATE: &str = r##"<!DOCTYPE html>
<html lang="en">
<head>
  <meta charset="utf-8">
  <meta name="viewport" content="width=device-width, initial-scale=1">
  <title>{{ title }}</title>
</head>
<body>
  <div id="root">{{ app | safe }}</div>
</body>
</html>
"##;
