use crate::env::Environment;
use crate::node::Node;

use super::ui::{centered_box, paper, typography};
use super::{env_heading, Page, PageId};

/// Dashboard page showing the UI kit demo surface.
#[derive(Debug, Default)]
pub struct Dashboard;

impl Page for Dashboard {
    fn id(&self) -> PageId {
        PageId::Dashboard
    }

    fn title(&self) -> &'static str {
        "Dashboard"
    }

    fn render(&self, env: &Environment) -> Node {
        Node::Fragment(vec![
            env_heading("Dashboard", env),
            centered_box(vec![paper(3, vec![typography("h1", "Starter App")])]),
        ])
    }
}
