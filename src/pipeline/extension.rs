//! Extension trait and the pipeline that applies extensions to documents

use crate::pipeline::tree::{HtmlNode, HtmlTree};
use crate::source::SourceClient;
use crate::ExportError;
use async_trait::async_trait;

/// Context handed to extensions while a document is processed
pub struct RunContext<'a> {
    /// The rate-gated client, for extensions that fetch extra content
    pub client: &'a SourceClient,

    /// Id of the document being processed
    pub document_id: &'a str,
}

/// A pluggable content mutator
///
/// `check` is evaluated against every node of a document; when it returns
/// true, `mutate` runs on that node before its children are visited.
#[async_trait]
pub trait Extension: Send + Sync {
    /// Name used in log messages
    fn name(&self) -> &str;

    /// Returns true if this extension wants to mutate the node
    fn check(&self, node: &HtmlNode) -> bool;

    /// Mutates the node in place
    async fn mutate(&self, node: &mut HtmlNode, ctx: &RunContext<'_>) -> Result<(), ExportError>;
}

/// A document after all extensions ran
#[derive(Debug, Clone)]
pub struct ProcessedDocument {
    /// Serialized markup, for sinks that consume HTML
    pub html: String,

    /// The mutated tree, for sinks that convert structure
    pub tree: HtmlTree,

    /// Number of extension mutations applied
    pub mutations: usize,
}

/// Ordered list of extensions
#[derive(Default)]
pub struct Pipeline {
    extensions: Vec<Box<dyn Extension>>,
}

impl Pipeline {
    /// Creates an empty pipeline
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an extension; extensions run in registration order
    pub fn register(&mut self, extension: Box<dyn Extension>) {
        tracing::debug!("Registered extension {}", extension.name());
        self.extensions.push(extension);
    }

    /// Number of registered extensions
    pub fn len(&self) -> usize {
        self.extensions.len()
    }

    /// Returns true if no extension is registered
    pub fn is_empty(&self) -> bool {
        self.extensions.is_empty()
    }

    /// Parses the markup, applies every extension and serializes the result
    ///
    /// # Traversal
    ///
    /// Nodes are visited in pre-order with an explicit stack. At each node
    /// every extension is checked in registration order against the node as
    /// left by the previous extension. Children are queued only after all
    /// mutations of their parent, so a mutation decides which children get
    /// visited.
    pub async fn apply(
        &self,
        markup: &str,
        ctx: &RunContext<'_>,
    ) -> Result<ProcessedDocument, ExportError> {
        let mut tree = HtmlTree::parse(markup);
        let mutations = if self.extensions.is_empty() {
            0
        } else {
            self.walk(&mut tree, ctx).await?
        };

        Ok(ProcessedDocument {
            html: tree.to_html(),
            tree,
            mutations,
        })
    }

    async fn walk(&self, tree: &mut HtmlTree, ctx: &RunContext<'_>) -> Result<usize, ExportError> {
        let mut mutations = 0;
        let mut stack: Vec<Vec<usize>> = (0..tree.nodes.len()).rev().map(|i| vec![i]).collect();

        while let Some(path) = stack.pop() {
            let Some(node) = tree.node_at_mut(&path) else {
                continue;
            };

            for extension in &self.extensions {
                if extension.check(node) {
                    tracing::debug!(
                        "Extension {} mutating node in document {}",
                        extension.name(),
                        ctx.document_id
                    );
                    extension.mutate(node, ctx).await?;
                    mutations += 1;
                }
            }

            for index in (0..node.children().len()).rev() {
                let mut child = path.clone();
                child.push(index);
                stack.push(child);
            }
        }

        Ok(mutations)
    }
}
