use async_trait::async_trait;
use url::Url;

use crate::AccessControlError;

/// The RDF serialization requested and parsed throughout.
pub const TEXT_TURTLE: &str = "text/turtle";

/// The graph store capability that parses retrieved document bodies into
/// queryable graphs. The engine never interprets a graph itself; handles
/// are created here, populated by [`GraphStore::parse`], and passed through
/// to the decision oracle.
///
/// `parse` mutates the handle in place, so implementations must use
/// interior mutability: during decision evaluation the same handle may be
/// augmented with trust chain documents while it is borrowed by the
/// oracle's caller.
#[async_trait]
pub trait GraphStore: Send + Sync {
    /// The opaque graph handle owned by an ACL document for the duration of
    /// one resolution.
    type Graph: Send + Sync + 'static;

    /// Create a fresh empty graph.
    fn new_graph(&self) -> Self::Graph;

    /// Parse `source` into `graph`, resolving relative terms against
    /// `base`.
    async fn parse(
        &self,
        source: &str,
        graph: &Self::Graph,
        base: &Url,
        content_type: &str,
    ) -> Result<(), AccessControlError>;
}
