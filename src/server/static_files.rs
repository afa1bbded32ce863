//! Serve the built dashboard (SPA) from the configured static directory. Unknown paths fall
//! back to `index.html` so client-side routes resolve.

use std::path::Path;

use tower_http::services::{ServeDir, ServeFile};
use tracing::{debug, info};

/// Returns `None` when the directory has no `index.html`; API routes are still served.
pub fn static_service(dir: &Path) -> Option<ServeDir<ServeFile>> {
    let index = dir.join("index.html");
    if !index.is_file() {
        debug!(dir = %dir.display(), "static dashboard not found; serving API only");
        return None;
    }
    info!(dir = %dir.display(), "serving dashboard");
    Some(ServeDir::new(dir).fallback(ServeFile::new(index)))
}
