use std::sync::Arc;

use async_trait::async_trait;
use url::Url;

use crate::container::container_of;
use crate::locate::locate_acl_document;
use crate::{
    AccessControlError, Cache, GraphStore, Request, TEXT_TURTLE, Transport, TrustChainFetch,
    memoize,
};

/// What the transport produced for a document retrieval, as stored in the
/// document cache. Non-2xx outcomes are cached too, so a negative result
/// is observable without re-fetching.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FetchedDocument {
    /// The body text of a 2xx response
    Body(String),
    /// The status code of a non-2xx response
    Status(u16),
}

/// What became of an attempt to retrieve and parse a graph document.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GraphOutcome {
    /// The document was retrieved and its triples merged into the handle
    Parsed,
    /// The store answered with a non-2xx status
    Unavailable(u16),
}

/// A located and parsed access control document.
///
/// `governed_resource` is always the resource originally asked about, not
/// the container at which the document was ultimately found; callers
/// distinguish "where is the rule" from "what was asked about" by
/// comparing the two URLs.
pub struct AclDocument<G> {
    /// The parsed graph, owned by this document for one resolution
    pub graph: G,
    /// The ACL document the graph was parsed from
    pub acl_document: Url,
    /// The resource the resolution was asked about
    pub governed_resource: Url,
}

/// Override for how graph documents are retrieved, replacing the default
/// transport-plus-document-cache path (and bypassing the document cache).
#[async_trait]
pub trait RetrieveGraph<G>: Send + Sync {
    /// Retrieve `url` and merge its triples into `graph`.
    async fn retrieve(&self, url: &Url, graph: &G) -> Result<GraphOutcome, AccessControlError>;
}

/// The graph-retrieval capability assembled per call: transport, graph
/// store, the caller's document cache, and any configured override.
pub(crate) struct GraphFetcher<T, G>
where
    G: GraphStore,
{
    pub(crate) transport: Arc<T>,
    pub(crate) graphs: Arc<G>,
    pub(crate) documents: Option<Cache<FetchedDocument>>,
    pub(crate) override_retriever: Option<Arc<dyn RetrieveGraph<G::Graph>>>,
}

impl<T, G> GraphFetcher<T, G>
where
    T: Transport + 'static,
    G: GraphStore + 'static,
{
    /// Retrieve the document at `url` and merge its triples into `graph`.
    ///
    /// Body text is memoized under `GET:<url>` when a document cache is
    /// present; parsing happens on every call because each resolution owns
    /// a fresh graph handle.
    pub(crate) async fn fetch_into(
        &self,
        url: &Url,
        graph: &G::Graph,
    ) -> Result<GraphOutcome, AccessControlError> {
        if let Some(retriever) = &self.override_retriever {
            return retriever.retrieve(url, graph).await;
        }

        let key = format!("GET:{url}");
        let document = {
            let transport = self.transport.clone();
            let target = url.clone();
            memoize(self.documents.as_ref(), &key, async move {
                let request = Request::get(target).with_header("Accept", TEXT_TURTLE);
                let response = transport.fetch(request).await?;
                Ok(if response.ok() {
                    FetchedDocument::Body(response.body)
                } else {
                    FetchedDocument::Status(response.status)
                })
            })
            .await?
        };

        match document {
            FetchedDocument::Body(source) => {
                self.graphs.parse(&source, graph, url, TEXT_TURTLE).await?;
                Ok(GraphOutcome::Parsed)
            }
            FetchedDocument::Status(status) => Ok(GraphOutcome::Unavailable(status)),
        }
    }
}

/// Adapter exposing a [`GraphFetcher`] to the decision oracle as its trust
/// chain capability. A non-2xx retrieval is an error here, which the
/// engine degrades to "no promoted modes".
pub(crate) struct TrustChainGraphFetch<'a, T, G>
where
    G: GraphStore,
{
    pub(crate) fetcher: &'a GraphFetcher<T, G>,
}

#[async_trait]
impl<'a, T, G> TrustChainFetch<G::Graph> for TrustChainGraphFetch<'a, T, G>
where
    T: Transport + 'static,
    G: GraphStore + 'static,
{
    async fn fetch_into(&self, url: &Url, graph: &G::Graph) -> Result<(), AccessControlError> {
        match self.fetcher.fetch_into(url, graph).await? {
            GraphOutcome::Parsed => Ok(()),
            GraphOutcome::Unavailable(_) => {
                Err(AccessControlError::TrustChainFetch(url.to_string()))
            }
        }
    }
}

/// Resolve the ACL document governing `resource`, walking containers until
/// a usable document is found or the root is exhausted.
///
/// The walk is an explicit loop over a strictly shortening path: each step
/// probes the current candidate through the location cache, retrieves a
/// located document (a 404 there is equivalent to "no location found"),
/// and otherwise reduces the candidate to its container. Exhausting the
/// root returns `None` — "no ACL reachable" is an answer, not an error.
pub(crate) async fn resolve_acl<T, G>(
    fetcher: &GraphFetcher<T, G>,
    locations: Option<&Cache<Option<Url>>>,
    resource: &Url,
) -> Result<Option<AclDocument<G::Graph>>, AccessControlError>
where
    T: Transport + 'static,
    G: GraphStore + 'static,
{
    let mut candidate = resource.clone();

    loop {
        let location = {
            let transport = fetcher.transport.clone();
            let probed = candidate.clone();
            memoize(locations, candidate.as_str(), async move {
                locate_acl_document(transport.as_ref(), &probed).await
            })
            .await?
        };

        if let Some(acl_document) = location {
            let graph = fetcher.graphs.new_graph();
            match fetcher.fetch_into(&acl_document, &graph).await? {
                GraphOutcome::Parsed => {
                    return Ok(Some(AclDocument {
                        graph,
                        acl_document,
                        governed_resource: resource.clone(),
                    }));
                }
                GraphOutcome::Unavailable(404) => {
                    tracing::debug!(%acl_document, "located ACL document is absent");
                }
                GraphOutcome::Unavailable(status) => {
                    return Err(AccessControlError::RetrievalFailed {
                        url: acl_document.to_string(),
                        status,
                    });
                }
            }
        }

        match container_of(&candidate) {
            Some(container) => {
                tracing::debug!(resource = %candidate, container = %container, "no ACL found, walking to container");
                candidate = container;
            }
            None => return Ok(None),
        }
    }
}
