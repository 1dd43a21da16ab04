use std::path::PathBuf;

use reqwest::Url;

pub const DEFAULT_BASE_URL: &str = "http://127.0.0.1:3000";
pub const DEFAULT_PATH: &str = "/todos";

/// Where the remote collection lives.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    pub base_url: String,
    pub path: String,
}

impl Default for ApiConfig {
    fn default() -> Self { Self::new(DEFAULT_BASE_URL, DEFAULT_PATH) }
}

impl ApiConfig {
    pub fn new(base_url: &str, path: &str) -> Self {
        Self { base_url: base_url.to_string(), path: path.to_string() }
    }

    /// Reads `TODO_API_BASE_URL` and `TODO_API_PATH`, falling back to the
    /// local defaults.
    pub fn from_env() -> Self {
        let base_url = std::env::var("TODO_API_BASE_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());
        let path = std::env::var("TODO_API_PATH").unwrap_or_else(|_| DEFAULT_PATH.to_string());
        Self { base_url, path }
    }

    /// Full URL of the collection. A base that already ends with the path
    /// segment is used as is.
    pub fn collection_url(&self) -> String {
        let base = self.base_url.trim_end_matches('/');
        let path = self.path.trim_end_matches('/');
        if path.is_empty() || path == "/" { return base.to_string(); }
        let path = if path.starts_with('/') { path.to_string() } else { format!("/{path}") };
        if base.ends_with(&path) { base.to_string() } else { format!("{base}{path}") }
    }

    /// URL of one item. The id is pushed as a single path segment, so `#`,
    /// `?` and `/` inside it are percent-encoded. `None` if the configured
    /// base is not a valid absolute URL.
    pub fn item_url(&self, id: &str) -> Option<Url> {
        let mut url = Url::parse(&self.collection_url()).ok()?;
        url.path_segments_mut().ok()?.pop_if_empty().push(id);
        Some(url)
    }
}

/// Log output for the terminal front end, which owns stdout.
#[derive(Debug, Clone)]
pub struct LogConfig {
    pub file: PathBuf,
}

impl LogConfig {
    pub fn from_env() -> Self {
        let file = std::env::var("TODO_TUI_LOG").unwrap_or_else(|_| "todo-tui.log".to_string());
        Self { file: PathBuf::from(file) }
    }
}
