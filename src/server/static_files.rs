//! Static file serving for the browser frontend
//!
//! Files are read from a directory on disk at request time; anything the
//! API routes don't match falls through to here.

use std::path::Path;
use tower_http::services::ServeDir;

/// Directory service for `dir`, serving `index.html` for directory requests
pub fn static_service(dir: &str) -> ServeDir {
    ServeDir::new(dir).append_index_html_on_directories(true)
}

/// Check whether the frontend directory exists with an index page
pub fn has_frontend(dir: &str) -> bool {
    Path::new(dir).join("index.html").is_file()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_has_frontend() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().to_str().unwrap();
        assert!(!has_frontend(path));

        std::fs::write(dir.path().join("index.html"), "<html></html>").unwrap();
        assert!(has_frontend(path));
    }
}
