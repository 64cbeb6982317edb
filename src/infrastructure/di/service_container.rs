//! Service container for dependency injection
//!
//! Wires up all services with their dependencies.

use std::path::Path;
use std::sync::Arc;

use crate::application::services::TagTreeService;
use crate::config::Settings;
use crate::infrastructure::source::JsonTagSource;
use crate::infrastructure::traits::{FileSystem, RealFileSystem, TagSource};

/// Container holding application settings and I/O dependencies.
pub struct ServiceContainer {
    /// Application settings
    pub settings: Arc<Settings>,

    /// Filesystem abstraction
    pub fs: Arc<dyn FileSystem>,
}

impl ServiceContainer {
    /// Create a new service container with real implementations.
    pub fn new(settings: Settings) -> Self {
        Self::with_deps(settings, Arc::new(RealFileSystem))
    }

    /// Create a service container with custom dependencies (for testing).
    pub fn with_deps(settings: Settings, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            settings: Arc::new(settings),
            fs,
        }
    }

    /// Tag source reading the JSON export at `input`.
    pub fn tag_source(&self, input: &Path) -> Arc<dyn TagSource> {
        Arc::new(JsonTagSource::new(Arc::clone(&self.fs), input))
    }

    /// Tag tree service over the JSON export at `input`.
    pub fn tag_tree_service(&self, input: &Path) -> TagTreeService {
        TagTreeService::new(self.tag_source(input), self.settings.tree_options())
    }
}
