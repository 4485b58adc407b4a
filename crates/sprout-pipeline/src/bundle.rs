//! Bundle emission.

use crate::graph::ModuleGraph;

/// Module loader shared by every bundle.
const MODULE_PRELUDE: &str = r#"var __sprout_cache = {};
function __sprout_require(id) {
  var cached = __sprout_cache[id];
  if (cached) return cached.exports;
  var module = (__sprout_cache[id] = { exports: {} });
  __sprout_modules[id](module.exports, __sprout_require, __sprout_style);
  return module.exports;
}
function __sprout_style(css) {
  var el = document.createElement("style");
  el.textContent = css;
  document.head.appendChild(el);
}
"#;

/// Assembles the single output script.
///
/// Layout: module loader, module table, entry call, then any extra sections
/// in the order they were added.
#[derive(Debug)]
pub struct Bundle<'a> {
    graph: &'a ModuleGraph,
    sections: Vec<(String, String)>,
}

impl<'a> Bundle<'a> {
    pub fn new(graph: &'a ModuleGraph) -> Self {
        Self {
            graph,
            sections: Vec::new(),
        }
    }

    /// Append a named block of code after the entry call.
    pub fn section(mut self, name: impl Into<String>, code: impl Into<String>) -> Self {
        self.sections.push((name.into(), code.into()));
        self
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        out.push_str("(function () {\n\"use strict\";\n");
        out.push_str(MODULE_PRELUDE);

        out.push_str("var __sprout_modules = {\n");
        for module in self.graph.modules() {
            out.push_str(&format!("/* {} */\n", module.key));
            out.push_str(&format!(
                "{}: function (exports, __sprout_require, __sprout_style) {{\n",
                module.id
            ));
            out.push_str(&module.code);
            if !module.code.ends_with('\n') {
                out.push('\n');
            }
            out.push_str("},\n");
        }
        out.push_str("};\n");

        if let Some(entry) = self.graph.entry() {
            out.push_str(&format!("__sprout_require({});\n", entry.id));
        }

        for (name, code) in &self.sections {
            out.push_str(&format!("/* {} */\n", name));
            out.push_str(code);
            if !code.ends_with('\n') {
                out.push('\n');
            }
        }

        out.push_str("})();\n");
        out
    }
}
