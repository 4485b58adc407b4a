//! Page components.
//!
//! Each page is stateless: given the environment strings it returns the same
//! display tree every time.

mod dashboard;
mod home;
pub mod not_found;
mod settings;
pub mod ui;

use std::fmt;

use serde::Serialize;

use crate::env::Environment;
use crate::node::Node;

pub use dashboard::Dashboard;
pub use home::Home;
pub use settings::Settings;

/// Identifier of a routed page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PageId {
    Home,
    Dashboard,
    Settings,
}

impl PageId {
    pub fn as_str(&self) -> &'static str {
        match self {
            PageId::Home => "home",
            PageId::Dashboard => "dashboard",
            PageId::Settings => "settings",
        }
    }
}

impl fmt::Display for PageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A page component.
pub trait Page: Send + Sync {
    fn id(&self) -> PageId;

    /// Document title shown while the page is active
    fn title(&self) -> &'static str;

    fn render(&self, env: &Environment) -> Node;
}

/// Heading text shared by the pages that interpolate the environment.
pub(crate) fn env_heading(label: &str, env: &Environment) -> Node {
    Node::heading(1, format!("{} - {} - {}", label, env.mode, env.name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::BuildMode;

    fn production() -> Environment {
        Environment::new(BuildMode::Production, "abc")
    }

    fn pages() -> Vec<Box<dyn Page>> {
        vec![Box::new(Home), Box::new(Dashboard), Box::new(Settings)]
    }

    #[test]
    fn rendering_is_deterministic() {
        let env = production();
        for page in pages() {
            assert_eq!(page.render(&env), page.render(&env), "{}", page.id());
        }
    }

    #[test]
    fn headings_interpolate_environment_next_to_label() {
        let env = production();
        let expected = [
            "Redux example - production - abc",
            "Dashboard - production - abc",
            "Settings - production - abc",
        ];

        for (page, label) in pages().iter().zip(expected) {
            assert!(
                page.render(&env).text_content().contains(label),
                "{} should contain {:?}",
                page.id(),
                label
            );
        }
    }

    #[test]
    fn page_ids_display_as_lowercase() {
        assert_eq!(PageId::Dashboard.to_string(), "dashboard");
        assert_eq!(PageId::Home.as_str(), "home");
    }
}
