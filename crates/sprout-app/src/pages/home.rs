use crate::env::Environment;
use crate::node::Node;

use super::{env_heading, Page, PageId};

/// Landing page with the two logo images.
#[derive(Debug, Default)]
pub struct Home;

impl Page for Home {
    fn id(&self) -> PageId {
        PageId::Home
    }

    fn title(&self) -> &'static str {
        "Home"
    }

    fn render(&self, env: &Environment) -> Node {
        Node::Fragment(vec![
            env_heading("Redux example", env),
            Node::image("assets/react-js-icon.png", "React icon png"),
            Node::image("assets/react-js-icon.svg", "React icon svg"),
        ])
    }
}
