//! Application root: navigation list plus the router's output.

use crate::env::Environment;
use crate::node::Node;
use crate::router::{Outlet, Router};

/// A link in the navigation list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
pub struct NavLink {
    pub label: &'static str,
    pub href: &'static str,
}

/// The navigation list, in display order.
pub const NAV_LINKS: [NavLink; 3] = [
    NavLink {
        label: "Home",
        href: "/",
    },
    NavLink {
        label: "Dashboard",
        href: "/dashboard",
    },
    NavLink {
        label: "Settings",
        href: "/settings",
    },
];

/// One application session. Only one path is active at a time.
pub struct App {
    router: Router,
    env: Environment,
    path: String,
    outlet: Outlet,
}

impl App {
    /// Create a session positioned at the root path, not yet loaded.
    pub fn new(router: Router, env: Environment) -> Self {
        let outlet = router.peek("/");
        Self {
            router,
            env,
            path: "/".to_string(),
            outlet,
        }
    }

    pub fn env(&self) -> &Environment {
        &self.env
    }

    pub fn router(&self) -> &Router {
        &self.router
    }

    pub fn current_path(&self) -> &str {
        &self.path
    }

    pub fn outlet(&self) -> &Outlet {
        &self.outlet
    }

    /// Switch to `path` and show whatever is available right now.
    pub fn begin_navigation(&mut self, path: &str) -> &Outlet {
        self.path = path.to_string();
        self.outlet = self.router.peek(path);
        &self.outlet
    }

    /// Wait for the current path's page to load.
    pub async fn finish_navigation(&mut self) -> &Outlet {
        self.outlet = self.router.load(&self.path).await;
        &self.outlet
    }

    /// Navigate to `path` and wait until its page is ready.
    pub async fn navigate(&mut self, path: &str) -> &Outlet {
        self.begin_navigation(path);
        self.finish_navigation().await
    }

    /// The navigation list. Independent of the current route.
    pub fn nav(&self) -> Node {
        let items = NAV_LINKS
            .iter()
            .map(|link| {
                Node::element(
                    "li",
                    vec![Node::element("a", vec![Node::text(link.label)])
                        .attr("href", link.href)
                        .attr("data-link", "")],
                )
            })
            .collect();

        Node::element("nav", vec![Node::element("ul", items)])
    }

    /// Just the router's output.
    pub fn render_outlet(&self) -> Node {
        self.outlet.render(&self.env)
    }

    /// Navigation followed by the router's output.
    pub fn render(&self) -> Node {
        Node::Fragment(vec![
            self.nav(),
            Node::element("main", vec![self.render_outlet()]).attr("id", "outlet"),
        ])
    }
}

impl Default for App {
    fn default() -> Self {
        Self::new(Router::default(), Environment::default())
    }
}
