//! Tag tree service
//!
//! Fetches the full tag snapshot from a `TagSource` and turns it into the
//! rooted forest served under the `data` key.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, instrument, warn};

use crate::application::{ApplicationError, ApplicationResult};
use crate::domain::{TagRecord, TopologyReport, TreeBuilder, TreeNode, TreeOptions};
use crate::infrastructure::traits::TagSource;

/// Response body of the "get tag tree" operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TreeResponse {
    pub data: Vec<TreeNode>,
}

impl TreeResponse {
    /// Same layout as `serde_json` output of this struct (two-space indent
    /// when `pretty`), written without recursing per tree level.
    pub fn to_json(&self, pretty: bool) -> ApplicationResult<String> {
        write_response(&self.data, pretty).map_err(|e| ApplicationError::OperationFailed {
            context: "serialize tag tree".to_string(),
            source: Box::new(e),
        })
    }
}

struct JsonOut {
    buf: String,
    pretty: bool,
}

impl JsonOut {
    fn newline(&mut self, level: usize) {
        if self.pretty {
            self.buf.push('\n');
            self.buf.push_str(&"  ".repeat(level));
        }
    }

    fn key(&mut self, key: &str) {
        self.buf.push('"');
        self.buf.push_str(key);
        self.buf.push_str(if self.pretty { "\": " } else { "\":" });
    }

    fn value<T: Serialize + ?Sized>(&mut self, value: &T) -> serde_json::Result<()> {
        self.buf.push_str(&serde_json::to_string(value)?);
        Ok(())
    }
}

/// Open list: its nodes, the next one to write and the indent of the line
/// holding its `[`.
struct OpenList<'n> {
    nodes: &'n [TreeNode],
    next: usize,
    level: usize,
}

fn write_response(forest: &[TreeNode], pretty: bool) -> serde_json::Result<String> {
    let mut out = JsonOut {
        buf: String::new(),
        pretty,
    };
    out.buf.push('{');
    out.newline(1);
    out.key("data");

    let mut stack: Vec<OpenList<'_>> = Vec::new();
    if forest.is_empty() {
        out.buf.push_str("[]");
    } else {
        out.buf.push('[');
        stack.push(OpenList {
            nodes: forest,
            next: 0,
            level: 1,
        });
    }

    while let Some(list) = stack.last_mut() {
        let level = list.level;
        let nodes = list.nodes;
        let Some(node) = nodes.get(list.next) else {
            stack.pop();
            out.newline(level);
            out.buf.push(']');
            if !stack.is_empty() {
                // closes the node object owning this children list
                out.newline(level - 1);
                out.buf.push('}');
            }
            continue;
        };
        if list.next > 0 {
            out.buf.push(',');
        }
        list.next += 1;

        out.newline(level + 1);
        out.buf.push('{');
        out.newline(level + 2);
        out.key("id");
        out.value(&node.id)?;
        out.buf.push(',');
        out.newline(level + 2);
        out.key("name");
        out.value(&node.name)?;
        out.buf.push(',');
        out.newline(level + 2);
        out.key("children");
        if node.children.is_empty() {
            out.buf.push_str("[]");
            out.newline(level + 1);
            out.buf.push('}');
        } else {
            out.buf.push('[');
            stack.push(OpenList {
                nodes: &node.children,
                next: 0,
                level: level + 2,
            });
        }
    }

    out.newline(0);
    out.buf.push('}');
    Ok(out.buf)
}

/// Service building tag trees from a tag source.
pub struct TagTreeService {
    source: Arc<dyn TagSource>,
    builder: TreeBuilder,
}

impl TagTreeService {
    /// Create a new tag tree service.
    pub fn new(source: Arc<dyn TagSource>, options: TreeOptions) -> Self {
        Self {
            source,
            builder: TreeBuilder::with_options(options),
        }
    }

    /// Fetch all tags and build the forest.
    ///
    /// A fetch failure aborts the call; no partial tree is returned.
    #[instrument(level = "debug", skip(self))]
    pub fn tree(&self) -> ApplicationResult<TreeResponse> {
        let tags = self.source.fetch_all()?;
        debug!("tree: fetched {} tag(s)", tags.len());

        if tracing::enabled!(tracing::Level::WARN) {
            self.warn_on_topology(&tags);
        }

        let data = self.builder.build(&tags);
        debug!("tree: {} root(s)", data.len());
        Ok(TreeResponse { data })
    }

    /// Fetch all tags and return the ones heading a tree.
    #[instrument(level = "debug", skip(self))]
    pub fn roots(&self) -> ApplicationResult<Vec<TagRecord>> {
        let tags = self.source.fetch_all()?;
        Ok(self.builder.roots(&tags).into_iter().cloned().collect())
    }

    /// Fetch all tags and report malformed relations.
    #[instrument(level = "debug", skip(self))]
    pub fn check(&self) -> ApplicationResult<TopologyReport> {
        let tags = self.source.fetch_all()?;
        Ok(TopologyReport::analyze(&tags, self.builder.options()))
    }

    fn warn_on_topology(&self, tags: &[TagRecord]) {
        let report = TopologyReport::analyze(tags, self.builder.options());
        for (category, count) in report.summary() {
            warn!("tag relations: {} {}", count, category);
        }
    }
}
