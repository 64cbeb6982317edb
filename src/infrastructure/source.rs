//! Tag sources: where the tag snapshot comes from.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Deserialize;
use tracing::{debug, instrument};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::TagRecord;
use crate::infrastructure::traits::{FileSystem, TagSource};

/// Accepted top-level shapes of a tag export.
#[derive(Deserialize)]
#[serde(untagged)]
enum TagPayload {
    Bare(Vec<TagRecord>),
    Envelope { data: Vec<TagRecord> },
}

impl TagPayload {
    fn into_tags(self) -> Vec<TagRecord> {
        match self {
            TagPayload::Bare(tags) | TagPayload::Envelope { data: tags } => tags,
        }
    }
}

/// Reads a JSON export of all tags (bare array or `{"data": [...]}`).
pub struct JsonTagSource {
    fs: Arc<dyn FileSystem>,
    path: PathBuf,
}

impl JsonTagSource {
    pub fn new(fs: Arc<dyn FileSystem>, path: impl Into<PathBuf>) -> Self {
        Self {
            fs,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl TagSource for JsonTagSource {
    #[instrument(level = "debug", skip(self), fields(path = %self.path.display()))]
    fn fetch_all(&self) -> ApplicationResult<Vec<TagRecord>> {
        let content = self
            .fs
            .read_to_string(&self.path)
            .map_err(|e| ApplicationError::fetch(format!("read {}", self.path.display()), e))?;

        let payload: TagPayload = serde_json::from_str(&content)
            .map_err(|e| ApplicationError::fetch(format!("parse {}", self.path.display()), e))?;
        let tags = payload.into_tags();

        for (position, tag) in tags.iter().enumerate() {
            tag.validate(position)?;
        }
        debug!("fetch_all: loaded {} tag(s)", tags.len());
        Ok(tags)
    }
}

/// Serves a fixed snapshot; every fetch returns a fresh copy.
#[derive(Debug, Clone, Default)]
pub struct InMemoryTagSource {
    tags: Vec<TagRecord>,
}

impl InMemoryTagSource {
    pub fn new(tags: Vec<TagRecord>) -> Self {
        Self { tags }
    }
}

impl TagSource for InMemoryTagSource {
    fn fetch_all(&self) -> ApplicationResult<Vec<TagRecord>> {
        Ok(self.tags.clone())
    }
}
