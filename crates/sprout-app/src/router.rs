//! Route table and lazy page loading.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use futures_util::future::BoxFuture;
use futures_util::FutureExt;
use tokio::sync::OnceCell;

use crate::env::Environment;
use crate::node::Node;
use crate::pages::{self, Dashboard, Home, Page, PageId, Settings};

/// Placeholder shown while a page is loading.
pub const LOADING_TEXT: &str = "Loading...";

/// Text shown when a page failed to load.
pub const LOAD_FAILED_TEXT: &str = "Failed to load page.";

/// Loads the code behind a page.
pub type PageLoader = fn() -> BoxFuture<'static, Result<Arc<dyn Page>, LoadError>>;

/// Errors raised by page loaders.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum LoadError {
    #[error("Page '{page}' failed to load: {reason}")]
    Failed { page: PageId, reason: String },

    #[error("No loader registered for page '{0}'")]
    MissingLoader(PageId),
}

/// A single entry in the route table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Route {
    pub path: &'static str,
    pub page: PageId,
}

/// Ordered, fixed mapping from path to page.
#[derive(Debug, Clone)]
pub struct RouteTable {
    routes: Vec<Route>,
}

impl RouteTable {
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Find the page for a path. The first matching route wins.
    pub fn lookup(&self, path: &str) -> Option<PageId> {
        let path = normalize(path);
        self.routes
            .iter()
            .find(|route| route.path == path)
            .map(|route| route.page)
    }
}

impl Default for RouteTable {
    fn default() -> Self {
        Self::new(vec![
            Route {
                path: "/",
                page: PageId::Home,
            },
            Route {
                path: "/dashboard",
                page: PageId::Dashboard,
            },
            Route {
                path: "/settings",
                page: PageId::Settings,
            },
        ])
    }
}

/// Strip trailing slashes; the empty path is the root.
fn normalize(path: &str) -> &str {
    let trimmed = path.trim_end_matches('/');
    if trimmed.is_empty() {
        "/"
    } else {
        trimmed
    }
}

/// What the router currently shows.
#[derive(Clone)]
pub enum Outlet {
    Loading(PageId),
    Ready(Arc<dyn Page>),
    Failed(LoadError),
    NotFound(String),
}

impl Outlet {
    pub fn render(&self, env: &Environment) -> Node {
        match self {
            Outlet::Loading(_) => {
                Node::element("div", vec![Node::text(LOADING_TEXT)]).attr("class", "loading")
            }
            Outlet::Ready(page) => page.render(env),
            Outlet::Failed(err) => Node::element(
                "div",
                vec![
                    Node::paragraph(LOAD_FAILED_TEXT),
                    Node::paragraph(err.to_string()),
                ],
            )
            .attr("class", "load-error"),
            Outlet::NotFound(path) => pages::not_found::render(path),
        }
    }

    pub fn is_loading(&self) -> bool {
        matches!(self, Outlet::Loading(_))
    }

    pub fn page_id(&self) -> Option<PageId> {
        match self {
            Outlet::Loading(id) => Some(*id),
            Outlet::Ready(page) => Some(page.id()),
            Outlet::Failed(LoadError::Failed { page, .. }) => Some(*page),
            Outlet::Failed(LoadError::MissingLoader(page)) => Some(*page),
            Outlet::NotFound(_) => None,
        }
    }
}

impl fmt::Debug for Outlet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outlet::Loading(id) => f.debug_tuple("Loading").field(id).finish(),
            Outlet::Ready(page) => f.debug_tuple("Ready").field(&page.id()).finish(),
            Outlet::Failed(err) => f.debug_tuple("Failed").field(err).finish(),
            Outlet::NotFound(path) => f.debug_tuple("NotFound").field(path).finish(),
        }
    }
}

/// A page loaded at most once and kept for the rest of the session.
struct LazyPage {
    loader: PageLoader,
    cell: OnceCell<Arc<dyn Page>>,
}

impl LazyPage {
    fn new(loader: PageLoader) -> Self {
        Self {
            loader,
            cell: OnceCell::new(),
        }
    }
}

/// Maps paths to lazily loaded pages.
pub struct Router {
    table: RouteTable,
    pages: BTreeMap<PageId, LazyPage>,
}

impl Router {
    /// Router over `table` with the built-in page loaders.
    pub fn new(table: RouteTable) -> Self {
        let mut pages = BTreeMap::new();
        pages.insert(PageId::Home, LazyPage::new(load_home));
        pages.insert(PageId::Dashboard, LazyPage::new(load_dashboard));
        pages.insert(PageId::Settings, LazyPage::new(load_settings));
        Self { table, pages }
    }

    /// Replace the loader for a page. Discards anything already loaded.
    pub fn with_loader(mut self, page: PageId, loader: PageLoader) -> Self {
        self.pages.insert(page, LazyPage::new(loader));
        self
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    pub fn is_loaded(&self, page: PageId) -> bool {
        self.pages
            .get(&page)
            .is_some_and(|lazy| lazy.cell.initialized())
    }

    /// Current outlet for `path` without waiting on a load.
    pub fn peek(&self, path: &str) -> Outlet {
        let Some(id) = self.table.lookup(path) else {
            return Outlet::NotFound(path.to_string());
        };

        match self.pages.get(&id).and_then(|lazy| lazy.cell.get()) {
            Some(page) => Outlet::Ready(Arc::clone(page)),
            None => Outlet::Loading(id),
        }
    }

    /// Resolve `path`, loading its page if this is the first visit.
    ///
    /// A failed load is not cached, so the next call retries.
    pub async fn load(&self, path: &str) -> Outlet {
        let Some(id) = self.table.lookup(path) else {
            tracing::debug!("No route for {}", path);
            return Outlet::NotFound(path.to_string());
        };

        let Some(lazy) = self.pages.get(&id) else {
            return Outlet::Failed(LoadError::MissingLoader(id));
        };

        let loader = lazy.loader;
        let result = lazy
            .cell
            .get_or_try_init(|| async move {
                tracing::debug!("Loading page {}", id);
                loader().await
            })
            .await;

        match result {
            Ok(page) => Outlet::Ready(Arc::clone(page)),
            Err(err) => {
                tracing::warn!("{}", err);
                Outlet::Failed(err)
            }
        }
    }
}

impl Default for Router {
    fn default() -> Self {
        Self::new(RouteTable::default())
    }
}

fn load_home() -> BoxFuture<'static, Result<Arc<dyn Page>, LoadError>> {
    async { Ok(Arc::new(Home) as Arc<dyn Page>) }.boxed()
}

fn load_dashboard() -> BoxFuture<'static, Result<Arc<dyn Page>, LoadError>> {
    async { Ok(Arc::new(Dashboard) as Arc<dyn Page>) }.boxed()
}

fn load_settings() -> BoxFuture<'static, Result<Arc<dyn Page>, LoadError>> {
    async { Ok(Arc::new(Settings) as Arc<dyn Page>) }.boxed()
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    static FLAKY_CALLS: AtomicUsize = AtomicUsize::new(0);

    fn failing() -> BoxFuture<'static, Result<Arc<dyn Page>, LoadError>> {
        async {
            Err(LoadError::Failed {
                page: PageId::Settings,
                reason: "network down".to_string(),
            })
        }
        .boxed()
    }

    fn flaky() -> BoxFuture<'static, Result<Arc<dyn Page>, LoadError>> {
        async {
            if FLAKY_CALLS.fetch_add(1, Ordering::SeqCst) == 0 {
                Err(LoadError::Failed {
                    page: PageId::Dashboard,
                    reason: "timeout".to_string(),
                })
            } else {
                Ok(Arc::new(Dashboard) as Arc<dyn Page>)
            }
        }
        .boxed()
    }

    #[test]
    fn looks_up_fixed_routes() {
        let table = RouteTable::default();

        assert_eq!(table.lookup("/"), Some(PageId::Home));
        assert_eq!(table.lookup(""), Some(PageId::Home));
        assert_eq!(table.lookup("/dashboard"), Some(PageId::Dashboard));
        assert_eq!(table.lookup("/settings/"), Some(PageId::Settings));
        assert_eq!(table.lookup("/settings/profile"), None);
        assert_eq!(table.lookup("/unknown"), None);
    }

    #[test]
    fn peek_shows_placeholder_before_load() {
        let router = Router::default();
        let outlet = router.peek("/dashboard");

        assert!(outlet.is_loading());
        let html = outlet.render(&Environment::default()).text_content();
        assert_eq!(html, LOADING_TEXT);
    }

    #[tokio::test]
    async fn loads_page_once_and_caches_it() {
        let router = Router::default();

        assert!(!router.is_loaded(PageId::Settings));
        let outlet = router.load("/settings").await;
        assert_eq!(outlet.page_id(), Some(PageId::Settings));
        assert!(router.is_loaded(PageId::Settings));

        assert!(matches!(router.peek("/settings"), Outlet::Ready(_)));
    }

    #[tokio::test]
    async fn unmatched_path_is_not_found() {
        let router = Router::default();
        let outlet = router.load("/nope").await;

        assert!(matches!(outlet, Outlet::NotFound(ref p) if p == "/nope"));
        let text = outlet.render(&Environment::default()).text_content();
        assert!(text.contains("Page not found"));
        assert!(text.contains("/nope"));
    }

    #[tokio::test]
    async fn failed_load_renders_error_state() {
        let router = Router::default().with_loader(PageId::Settings, failing);
        let outlet = router.load("/settings").await;

        assert!(matches!(outlet, Outlet::Failed(_)));
        let text = outlet.render(&Environment::default()).text_content();
        assert!(text.contains(LOAD_FAILED_TEXT));
        assert!(text.contains("network down"));
        assert!(!router.is_loaded(PageId::Settings));
    }

    #[tokio::test]
    async fn failed_load_is_retried_on_next_visit() {
        let router = Router::default().with_loader(PageId::Dashboard, flaky);

        assert!(matches!(router.load("/dashboard").await, Outlet::Failed(_)));
        assert!(matches!(router.load("/dashboard").await, Outlet::Ready(_)));
        assert_eq!(FLAKY_CALLS.load(Ordering::SeqCst), 2);
    }
}
