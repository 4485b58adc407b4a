use crate::env::Environment;
use crate::node::Node;

use super::{env_heading, Page, PageId};

/// Placeholder settings page.
#[derive(Debug, Default)]
pub struct Settings;

impl Page for Settings {
    fn id(&self) -> PageId {
        PageId::Settings
    }

    fn title(&self) -> &'static str {
        "Settings"
    }

    fn render(&self, env: &Environment) -> Node {
        env_heading("Settings", env)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::env::BuildMode;
    use crate::node::PassthroughResolver;

    #[test]
    fn heading_carries_environment() {
        let env = Environment::new(BuildMode::Production, "abc");
        let html = Settings.render(&env).to_html(&PassthroughResolver);

        assert_eq!(html, "<h1>Settings - production - abc</h1>");
    }

    #[test]
    fn requests_no_assets() {
        assert!(Settings.render(&Environment::default()).assets().is_empty());
        assert_eq!(Settings.title(), "Settings");
    }
}
