use std::sync::Arc;

use url::Url;

use crate::resolve::{GraphFetcher, TrustChainGraphFetch, resolve_acl};
use crate::{
    AccessControlError, AccessMode, AccessOptions, AccessVerdict, AllowSummary, DecisionOracle,
    DecisionRequest, GraphStore, RetrieveGraph, Transport, memoize,
};

/// The marker that stands in for an absent agent in decision cache keys,
/// so anonymous verdicts never collide with any agent's.
const ANONYMOUS: &str = "---ANONYMOUS---";

/// An HTTP-shaped outcome produced when a request must not proceed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AccessResponse {
    /// The response status code
    pub status: u16,
    /// The canonical reason phrase for the status
    pub status_text: &'static str,
    /// The response body
    pub body: String,
}

impl AccessResponse {
    /// The outcome for a denied anonymous request.
    pub fn unauthorized() -> Self {
        Self {
            status: 401,
            status_text: "Unauthorized",
            body: String::new(),
        }
    }

    /// The outcome for a denied identified request.
    pub fn forbidden() -> Self {
        Self {
            status: 403,
            status_text: "Forbidden",
            body: String::new(),
        }
    }

    /// The outcome for a failure anywhere in the decision chain, carrying
    /// the failure's message as body.
    pub fn internal_error(body: impl Into<String>) -> Self {
        Self {
            status: 500,
            status_text: "Internal Server Error",
            body: body.into(),
        }
    }
}

/// The access control engine: resolves governing ACL documents, memoizes
/// the work, and orchestrates the external decision oracle into verdicts,
/// HTTP-shaped outcomes and allow summaries.
///
/// The engine owns its three collaborators behind [`Arc`]s and is cheap to
/// clone; per-request state (agent, origin, caches) travels in
/// [`AccessOptions`] instead.
pub struct AccessControl<T, G, O>
where
    G: GraphStore,
{
    transport: Arc<T>,
    graphs: Arc<G>,
    oracle: Arc<O>,
    graph_retriever: Option<Arc<dyn RetrieveGraph<G::Graph>>>,
}

impl<T, G, O> Clone for AccessControl<T, G, O>
where
    G: GraphStore,
{
    fn clone(&self) -> Self {
        Self {
            transport: self.transport.clone(),
            graphs: self.graphs.clone(),
            oracle: self.oracle.clone(),
            graph_retriever: self.graph_retriever.clone(),
        }
    }
}

impl<T, G, O> AccessControl<T, G, O>
where
    T: Transport + 'static,
    G: GraphStore + 'static,
    O: DecisionOracle<G::Graph> + 'static,
{
    /// Assemble an engine from its three collaborators.
    pub fn new(transport: T, graphs: G, oracle: O) -> Self {
        Self {
            transport: Arc::new(transport),
            graphs: Arc::new(graphs),
            oracle: Arc::new(oracle),
            graph_retriever: None,
        }
    }

    /// Replace the default graph retrieval (transport plus document cache)
    /// with a custom retriever.
    pub fn with_graph_retriever(mut self, retriever: Arc<dyn RetrieveGraph<G::Graph>>) -> Self {
        self.graph_retriever = Some(retriever);
        self
    }

    fn fetcher(&self, options: &AccessOptions) -> GraphFetcher<T, G> {
        GraphFetcher {
            transport: self.transport.clone(),
            graphs: self.graphs.clone(),
            documents: options.caches.documents.clone(),
            override_retriever: self.graph_retriever.clone(),
        }
    }

    /// Whether the acting party described by `options` may exercise all of
    /// `modes` against `resource`.
    ///
    /// The verdict is memoized in the options' decision cache when one is
    /// present; concurrent calls for the same `(modes, resource, agent)`
    /// share a single underlying evaluation.
    pub async fn is_allowed(
        &self,
        resource: &Url,
        modes: &[AccessMode],
        options: &AccessOptions,
    ) -> Result<AccessVerdict, AccessControlError> {
        let key = decision_key(modes, resource, options.agent.as_ref());

        let engine = self.clone();
        let resource = resource.clone();
        let modes = modes.to_vec();
        let evaluated = {
            let options = options.clone();
            async move { engine.evaluate(&resource, &modes, &options).await }
        };

        memoize(options.caches.decisions.as_ref(), &key, evaluated).await
    }

    /// The enforcement boundary: `None` when the request may proceed, or
    /// the HTTP-shaped outcome to answer with when it may not.
    ///
    /// This is the only place failures become responses — a denial maps to
    /// 401 (anonymous) or 403 (identified), and any failure anywhere in
    /// the decision chain maps to 500 with the failure's message as body.
    pub async fn response(
        &self,
        resource: &Url,
        modes: &[AccessMode],
        options: &AccessOptions,
    ) -> Option<AccessResponse> {
        match self.is_allowed(resource, modes, options).await {
            Ok(verdict) if verdict.is_allowed() => None,
            Ok(_) => Some(if options.agent.is_some() {
                AccessResponse::forbidden()
            } else {
                AccessResponse::unauthorized()
            }),
            Err(error) => Some(AccessResponse::internal_error(error.to_string())),
        }
    }

    /// The modes permitted on `resource` for the public and, when the
    /// options name an agent, for that agent. The two passes are
    /// independent and run concurrently; both go through [`Self::is_allowed`]
    /// per mode, so a shared cache bundle makes this cheap to call early
    /// in a request.
    pub async fn allowed(
        &self,
        resource: &Url,
        options: &AccessOptions,
    ) -> Result<AllowSummary, AccessControlError> {
        let modes = options
            .allowed_modes
            .clone()
            .unwrap_or_else(|| AccessMode::standard().to_vec());

        let public_options = {
            let mut options = options.clone();
            options.agent = None;
            options
        };
        let public_pass = self.modes_for(resource, &modes, &public_options, true);

        if options.agent.is_some() {
            let agent_pass = self.modes_for(resource, &modes, options, false);
            let (public, agent) = futures::try_join!(public_pass, agent_pass)?;
            Ok(AllowSummary {
                public,
                agent: Some(agent),
            })
        } else {
            Ok(AllowSummary {
                public: public_pass.await?,
                agent: None,
            })
        }
    }

    /// Render the allow summary for `resource` as a `WAC-Allow` header
    /// value.
    pub async fn allow_header(
        &self,
        resource: &Url,
        options: &AccessOptions,
    ) -> Result<String, AccessControlError> {
        Ok(self.allowed(resource, options).await?.header_value())
    }

    /// One pass of [`Self::allowed`]: the subset of `modes` whose verdict
    /// is an allowance (a public one, when `require_public` is set).
    async fn modes_for(
        &self,
        resource: &Url,
        modes: &[AccessMode],
        options: &AccessOptions,
        require_public: bool,
    ) -> Result<Vec<AccessMode>, AccessControlError> {
        let verdicts = futures::future::try_join_all(modes.iter().map(|mode| {
            let mode = mode.clone();
            async move {
                let verdict = self
                    .is_allowed(resource, std::slice::from_ref(&mode), options)
                    .await?;
                Ok::<_, AccessControlError>((mode, verdict))
            }
        }))
        .await?;

        Ok(verdicts
            .into_iter()
            .filter(|(_, verdict)| {
                if require_public {
                    verdict.is_public()
                } else {
                    verdict.is_allowed()
                }
            })
            .map(|(mode, _)| mode)
            .collect())
    }

    /// The uncached decision: resolve the governing document, apply the
    /// ACL self-access rewrite, validate modes, evaluate origin trust and
    /// ask the oracle for a verdict.
    async fn evaluate(
        &self,
        resource: &Url,
        modes: &[AccessMode],
        options: &AccessOptions,
    ) -> Result<AccessVerdict, AccessControlError> {
        let fetcher = self.fetcher(options);

        let Some(acl) = resolve_acl(&fetcher, options.caches.locations.as_ref(), resource).await?
        else {
            tracing::debug!(%resource, "no ACL reachable, denying");
            return Ok(AccessVerdict::Denied);
        };

        let mut working_resource = resource.clone();
        let mut working_modes = modes.to_vec();

        // Accessing an ACL document is gated on Control over the resource
        // it governs, so the rewrite must land before the allow-list is
        // consulted.
        if let Some(rewrite) = options.acl_detection.rewrite(resource) {
            working_resource = rewrite.resource;
            if let Some(replacement) = rewrite.modes {
                working_modes = replacement;
            }
            if !working_modes
                .iter()
                .any(|mode| mode.matches(&AccessMode::Control))
            {
                working_modes.push(AccessMode::Control);
            }
        }

        if let Some(allowed) = &options.allowed_modes {
            for mode in &working_modes {
                if !allowed.iter().any(|candidate| candidate.matches(mode)) {
                    return Err(AccessControlError::UnsupportedMode(mode.name().to_owned()));
                }
            }
        }

        let is_container = acl.governed_resource.path().ends_with('/');

        let trust_chain = TrustChainGraphFetch { fetcher: &fetcher };
        let origin_trusted_modes = match self
            .oracle
            .origin_trusted_modes(
                &acl.graph,
                &working_resource,
                is_container,
                &acl.acl_document,
                options.origin.as_ref(),
                &trust_chain,
            )
            .await
        {
            Ok(modes) => modes,
            Err(error) => {
                // Deliberate policy: a broken trust chain costs the origin
                // its promoted modes, it does not fail the decision.
                tracing::warn!(%error, "origin trust evaluation failed, continuing with no promoted modes");
                Vec::new()
            }
        };

        let qualified_modes: Vec<String> =
            working_modes.iter().map(|mode| mode.uri()).collect();

        let denied = self
            .oracle
            .access_denied(DecisionRequest {
                graph: &acl.graph,
                resource: &working_resource,
                is_container,
                acl_document: &acl.acl_document,
                agent: options.agent.as_ref(),
                modes: &qualified_modes,
                origin: options.origin.as_ref(),
                trusted_origins: options.trusted_origins.as_deref(),
                origin_trusted_modes: &origin_trusted_modes,
            })
            .await?;

        Ok(if denied {
            AccessVerdict::Denied
        } else {
            AccessVerdict::Allowed {
                public: options.agent.is_none(),
            }
        })
    }
}

/// The decision cache key: the full `(modes, resource, agent)` tuple, with
/// distinct agents and the anonymous marker guaranteed never to collide.
/// Mode names are length-prefixed before joining so an extension mode whose
/// name contains the join character cannot alias a multi-mode list.
fn decision_key(modes: &[AccessMode], resource: &Url, agent: Option<&Url>) -> String {
    let modes = modes
        .iter()
        .map(|mode| format!("{}.{}", mode.name().len(), mode.name()))
        .collect::<Vec<_>>()
        .join(",");
    let agent = agent.map(Url::as_str).unwrap_or(ANONYMOUS);
    format!("{modes}:{resource}:{agent}")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(input: &str) -> Url {
        Url::parse(input).unwrap()
    }

    #[test]
    fn it_keys_decisions_by_modes_resource_and_agent() {
        let resource = url("https://host/a");
        let modes = [AccessMode::Read, AccessMode::Write];

        let anonymous = decision_key(&modes, &resource, None);
        assert_eq!(anonymous, "4.Read,5.Write:https://host/a:---ANONYMOUS---");

        let agent = url("https://x/#me");
        let identified = decision_key(&modes, &resource, Some(&agent));
        assert_eq!(identified, "4.Read,5.Write:https://host/a:https://x/#me");

        assert_ne!(anonymous, identified);
    }

    #[test]
    fn it_never_collides_extension_modes_with_mode_lists() {
        let resource = url("https://host/a");

        let compound = [AccessMode::Other("Read,Write".into())];
        let pair = [AccessMode::Read, AccessMode::Write];
        assert_ne!(
            decision_key(&compound, &resource, None),
            decision_key(&pair, &resource, None)
        );
    }
}
