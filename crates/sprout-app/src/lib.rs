//! Pages, router and navigation shell for sprout applications.
//!
//! Pages render static display trees, the router maps the fixed route table
//! to lazily loaded pages, and [`App`] composes the navigation list with the
//! router's current output.

pub mod app;
pub mod env;
pub mod node;
pub mod pages;
pub mod router;

pub use app::{App, NavLink, NAV_LINKS};
pub use env::{BuildMode, EnvError, Environment};
pub use node::{AssetRef, AssetResolver, Node, PassthroughResolver};
pub use pages::not_found::{NOT_FOUND_DETAIL, NOT_FOUND_TITLE};
pub use pages::{Page, PageId};
pub use router::{
    LoadError, Outlet, PageLoader, Route, RouteTable, Router, LOADING_TEXT,
    LOAD_FAILED_TEXT,
};
