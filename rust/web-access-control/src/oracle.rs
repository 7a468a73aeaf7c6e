use async_trait::async_trait;
use url::Url;

use crate::AccessControlError;

/// Everything the decision oracle is handed when asked whether a request is
/// denied. Modes are namespace-qualified identifiers (see
/// [`crate::AccessMode::uri`]); the resource's container-ness is passed as
/// a flag because it affects inheritance semantics inside the oracle's own
/// algorithm.
pub struct DecisionRequest<'a, G> {
    /// The parsed ACL graph, possibly augmented with trust chain documents
    pub graph: &'a G,
    /// The working resource the verdict applies to
    pub resource: &'a Url,
    /// Whether the originally requested resource denotes a container
    pub is_container: bool,
    /// The ACL document whose rules are being evaluated
    pub acl_document: &'a Url,
    /// The requesting agent; absent when the request is anonymous
    pub agent: Option<&'a Url>,
    /// The namespace-qualified modes being checked
    pub modes: &'a [String],
    /// The origin the request arrived from, if any
    pub origin: Option<&'a Url>,
    /// Origins pre-authorized by configuration
    pub trusted_origins: Option<&'a [Url]>,
    /// Namespace-qualified modes promoted by origin trust evaluation
    pub origin_trusted_modes: &'a [String],
}

/// Capability handed to the oracle for pulling additional trust chain
/// documents into the working graph while origin trust is evaluated.
#[async_trait]
pub trait TrustChainFetch<G>: Send + Sync {
    /// Fetch `url` and merge its triples into `graph`. Fails when the
    /// document cannot be retrieved; the engine degrades that failure to
    /// "no promoted modes" rather than failing the whole decision.
    async fn fetch_into(&self, url: &Url, graph: &G) -> Result<(), AccessControlError>;
}

/// The external decision oracle. Its semantics — inheritance rules, agent
/// and group matching, trust propagation — are entirely outside this
/// crate; the engine only orchestrates its two entry points and interprets
/// the verdict.
#[async_trait]
pub trait DecisionOracle<G>: Send + Sync {
    /// Compute the namespace-qualified modes that `origin` is trusted to
    /// exercise, following trust chain documents through `trust_chain` as
    /// needed.
    async fn origin_trusted_modes(
        &self,
        graph: &G,
        resource: &Url,
        is_container: bool,
        acl_document: &Url,
        origin: Option<&Url>,
        trust_chain: &dyn TrustChainFetch<G>,
    ) -> Result<Vec<String>, AccessControlError>;

    /// Whether the described request is denied by the ACL graph.
    async fn access_denied(
        &self,
        request: DecisionRequest<'_, G>,
    ) -> Result<bool, AccessControlError>;
}
