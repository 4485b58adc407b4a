//! WebSocket-based live reload.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

/// Messages sent to connected browsers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HmrMessage {
    /// Full page reload after a successful rebuild
    Reload,

    /// The last rebuild failed; the page keeps its previous build
    BuildFailed {
        /// Error text
        message: String,
    },

    /// Connection established
    Connected,
}

/// Hub for broadcasting messages to all connected clients.
#[derive(Debug, Clone)]
pub struct HmrHub {
    sender: broadcast::Sender<HmrMessage>,
}

impl HmrHub {
    pub fn new() -> Self {
        let (sender, _) = broadcast::channel(100);
        Self { sender }
    }

    /// Send a message to all connected clients.
    pub fn send(&self, msg: HmrMessage) {
        // No receivers is fine
        let _ = self.sender.send(msg);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<HmrMessage> {
        self.sender.subscribe()
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }
}

impl Default for HmrHub {
    fn default() -> Self {
        Self::new()
    }
}

/// Client script that listens on `path` (same host as the page).
///
/// Development only; production builds never reference it.
pub fn hmr_client_script(path: &str) -> String {
    format!(
        r#"
(function() {{
  'use strict';

  var scheme = location.protocol === 'https:' ? 'wss://' : 'ws://';
  var ws = new WebSocket(scheme + location.host + '{}');
  var overlay = null;

  function showError(message) {{
    if (!overlay) {{
      overlay = document.createElement('pre');
      overlay.style.cssText = 'position:fixed;inset:auto 0 0 0;margin:0;padding:1rem;background:#300;color:#fcc;white-space:pre-wrap;z-index:9999';
      document.body.appendChild(overlay);
    }}
    overlay.textContent = 'Build failed\n\n' + message;
  }}

  ws.onmessage = function(event) {{
    var msg = JSON.parse(event.data);

    switch (msg.type) {{
      case 'reload':
        location.reload();
        break;

      case 'build_failed':
        console.error('[sprout] build failed:', msg.message);
        showError(msg.message);
        break;

      case 'connected':
        console.log('[sprout] live reload connected');
        break;
    }}
  }};

  ws.onclose = function() {{
    console.log('[sprout] live reload disconnected');
    setTimeout(function() {{ location.reload(); }}, 1000);
  }};
}})();
"#,
        path
    )
}
