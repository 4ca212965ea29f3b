//! Application state for the API server

use crate::{Config, Downloader};
use std::sync::Arc;

/// Shared application state accessible to all route handlers
///
/// Cloned for each request (cheap Arc clones).
#[derive(Clone, Debug)]
pub struct AppState {
    /// Download pipeline
    pub downloader: Arc<Downloader>,

    /// Configuration, read-only after startup
    pub config: Arc<Config>,
}

impl AppState {
    /// Create a new AppState
    pub fn new(downloader: Arc<Downloader>, config: Arc<Config>) -> Self {
        Self { downloader, config }
    }
}
