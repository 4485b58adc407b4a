//! Client runtime shipped at the end of every bundle.

/// Client runtime pieces.
pub struct Runtime;

impl Runtime {
    /// Client router: link interception, history handling and lazy page chunks.
    pub fn router_js() -> &'static str {
        ROUTER_JS
    }

    /// Base stylesheet for the navigation shell and the UI kit classes.
    pub fn base_css() -> &'static str {
        BASE_CSS
    }
}

const ROUTER_JS: &str = r#"function __sprout_start(config) {
  var cache = {};
  var current = 0;

  function normalize(path) {
    var trimmed = path.replace(/\/+$/, "");
    return trimmed === "" ? "/" : trimmed;
  }

  function lookup(path) {
    var wanted = normalize(path);
    for (var i = 0; i < config.routes.length; i++) {
      if (config.routes[i].path === wanted) return config.routes[i];
    }
    return null;
  }

  function outlet() {
    var el = document.getElementById("outlet");
    if (!el) {
      var root = document.getElementById("root") || document.body;
      root.innerHTML = config.shell;
      el = document.getElementById("outlet");
    }
    return el;
  }

  function paragraphs(el, className, lines) {
    var box = document.createElement("div");
    if (className) box.className = className;
    lines.forEach(function (line) {
      var node = document.createElement(line.tag);
      node.textContent = line.text;
      box.appendChild(node);
    });
    el.innerHTML = "";
    el.appendChild(box);
  }

  function render(path) {
    var el = outlet();
    var route = lookup(path);
    var token = ++current;

    if (!route) {
      document.title = config.title;
      paragraphs(el, "not-found", [
        { tag: "h1", text: config.text.notFoundTitle },
        { tag: "p", text: config.text.notFoundDetail + " " + path }
      ]);
      return;
    }

    document.title = route.title + " - " + config.title;

    if (Object.prototype.hasOwnProperty.call(cache, route.page)) {
      el.innerHTML = cache[route.page];
      return;
    }

    paragraphs(el, "loading", [{ tag: "span", text: config.text.loading }]);
    config.pages[route.page]().then(
      function (html) {
        cache[route.page] = html;
        if (token === current) el.innerHTML = html;
      },
      function (err) {
        if (token !== current) return;
        paragraphs(el, "load-error", [
          { tag: "p", text: config.text.loadFailed },
          { tag: "p", text: String(err) }
        ]);
      }
    );
  }

  document.addEventListener("click", function (event) {
    var link = event.target && event.target.closest ? event.target.closest("a[data-link]") : null;
    if (!link || event.button !== 0 || event.metaKey || event.ctrlKey || event.shiftKey) return;
    event.preventDefault();
    var href = link.getAttribute("href");
    if (href !== location.pathname) history.pushState(null, "", href);
    render(href);
  });

  window.addEventListener("popstate", function () {
    render(location.pathname);
  });

  render(location.pathname);
}
"#;

const BASE_CSS: &str = r#"nav ul {
  display: flex;
  gap: 1rem;
  list-style: none;
  margin: 0;
  padding: 1rem;
}

.loading {
  padding: 1rem;
  opacity: 0.7;
}

.load-error {
  padding: 1rem;
  color: #b00020;
}

.box-centered {
  height: 100vh;
  display: flex;
  justify-content: center;
  align-items: center;
  flex-direction: column;
}

.paper {
  padding: 1rem;
  border-radius: 4px;
  background-color: #ba68c8;
}

.paper-elevation-3 {
  box-shadow: 0 3px 3px -2px rgba(0, 0, 0, 0.2), 0 3px 4px 0 rgba(0, 0, 0, 0.14), 0 1px 8px 0 rgba(0, 0, 0, 0.12);
}

.typography-h1 {
  font-size: 6rem;
  font-weight: 300;
  margin: 0;
  color: #115293;
}
"#;

#[cfg(test)]
mod tests {
    use super::*;

    /// Body of the first `function (...) { ... }` after `marker`, braces balanced.
    fn handler_after<'a>(js: &'a str, marker: &str) -> &'a str {
        let start = js.find(marker).unwrap();
        let open = start + js[start..].find('{').unwrap();
        let mut depth = 0;
        for (offset, c) in js[open..].char_indices() {
            match c {
                '{' => depth += 1,
                '}' => {
                    depth -= 1;
                    if depth == 0 {
                        return &js[open..open + offset + 1];
                    }
                }
                _ => {}
            }
        }
        panic!("unbalanced handler after {}", marker);
    }

    #[test]
    fn only_successful_loads_are_cached() {
        let js = Runtime::router_js();

        let resolved = handler_after(js, "function (html)");
        let rejected = handler_after(js, "function (err)");

        assert!(resolved.contains("cache[route.page] = html;"));
        assert!(!rejected.contains("cache["));
        assert!(rejected.contains("config.text.loadFailed"));
    }

    #[test]
    fn cached_pages_skip_the_placeholder() {
        let js = Runtime::router_js();
        let render = handler_after(js, "function render(path)");

        let cached = render.find("hasOwnProperty.call(cache, route.page)").unwrap();
        let placeholder = render.find("config.text.loading").unwrap();
        let fetch = render.find("config.pages[route.page]()").unwrap();
        assert!(cached < placeholder && placeholder < fetch);
    }

    #[test]
    fn unmatched_paths_render_not_found_before_loading() {
        let js = Runtime::router_js();
        let render = handler_after(js, "function render(path)");

        let not_found = render.find("config.text.notFoundTitle").unwrap();
        let fetch = render.find("config.pages[route.page]()").unwrap();
        assert!(not_found < fetch);
        assert!(render.contains("if (!route)"));
    }

    #[test]
    fn user_facing_text_comes_from_config() {
        let js = Runtime::router_js();

        assert!(!js.contains("Loading..."));
        assert!(!js.contains("Failed to load page."));
        assert!(!js.contains("Page not found"));
        assert!(js.contains("pushState"));
    }

    #[test]
    fn base_css_covers_ui_kit_classes() {
        let css = Runtime::base_css();
        assert!(css.contains(".paper-elevation-3"));
        assert!(css.contains(".box-centered"));
        assert!(css.contains(".typography-h1"));
    }
}
