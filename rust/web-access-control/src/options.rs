use std::fmt;
use std::sync::Arc;

use url::Url;

use crate::{AccessMode, CacheBundle};

/// Rewrite produced when a requested resource turns out to be an ACL
/// document itself.
#[derive(Clone, Debug)]
pub struct AclRewrite {
    /// The governed resource whose rights gate access to the ACL document
    pub resource: Url,
    /// Replacement modes; `None` keeps the modes that were requested
    pub modes: Option<Vec<AccessMode>>,
}

/// How the engine recognizes that a requested resource is itself an ACL
/// document. Whatever the detection decides, the engine additionally
/// forces `Control` into the working mode set for a rewritten request.
#[derive(Clone)]
pub enum AclDetection {
    /// A fixed suffix naming convention: a path ending in the suffix names
    /// the ACL document of the path with the suffix removed. The default
    /// convention, with suffix `.acl`.
    Suffix(String),
    /// A caller-provided hook deciding both the governed resource and,
    /// optionally, replacement modes.
    Hook(Arc<dyn Fn(&Url) -> Option<AclRewrite> + Send + Sync>),
    /// Never rewrite.
    Disabled,
}

impl Default for AclDetection {
    fn default() -> Self {
        AclDetection::Suffix(".acl".to_owned())
    }
}

impl fmt::Debug for AclDetection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AclDetection::Suffix(suffix) => f.debug_tuple("Suffix").field(suffix).finish(),
            AclDetection::Hook(_) => f.write_str("Hook(..)"),
            AclDetection::Disabled => f.write_str("Disabled"),
        }
    }
}

impl AclDetection {
    /// The rewrite for `resource`, when the detection recognizes it as an
    /// ACL document.
    pub(crate) fn rewrite(&self, resource: &Url) -> Option<AclRewrite> {
        match self {
            AclDetection::Suffix(suffix) => {
                if suffix.is_empty() {
                    return None;
                }
                let stripped = resource.path().strip_suffix(suffix.as_str())?;
                if stripped.is_empty() || stripped.ends_with('/') {
                    return None;
                }
                let mut governed = resource.clone();
                governed.set_path(stripped);
                Some(AclRewrite {
                    resource: governed,
                    modes: None,
                })
            }
            AclDetection::Hook(hook) => hook(resource),
            AclDetection::Disabled => None,
        }
    }
}

/// The per-call options bundle: who is asking, where from, which caches to
/// consult, and how strictly to interpret modes.
///
/// All fields have workable defaults — an anonymous request, no origin, no
/// caching, no mode allow-list, and the `.acl` suffix convention for ACL
/// self-access detection.
#[derive(Clone, Default)]
pub struct AccessOptions {
    /// The identity of the requesting agent; `None` for anonymous requests
    pub agent: Option<Url>,
    /// The origin the request arrived from
    pub origin: Option<Url>,
    /// Origins pre-authorized for elevated modes via the oracle's trust
    /// promotion
    pub trusted_origins: Option<Vec<Url>>,
    /// When present, requests for modes outside this list fail with
    /// [`crate::AccessControlError::UnsupportedMode`]
    pub allowed_modes: Option<Vec<AccessMode>>,
    /// How ACL self-access is recognized
    pub acl_detection: AclDetection,
    /// The caches consulted during resolution
    pub caches: CacheBundle,
}

impl AccessOptions {
    /// Options for an anonymous, cache-less request.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the requesting agent.
    pub fn with_agent(mut self, agent: Url) -> Self {
        self.agent = Some(agent);
        self
    }

    /// Set the request origin.
    pub fn with_origin(mut self, origin: Url) -> Self {
        self.origin = Some(origin);
        self
    }

    /// Set the configured trusted origins.
    pub fn with_trusted_origins(mut self, origins: Vec<Url>) -> Self {
        self.trusted_origins = Some(origins);
        self
    }

    /// Restrict the modes this bundle will evaluate.
    pub fn with_allowed_modes(mut self, modes: Vec<AccessMode>) -> Self {
        self.allowed_modes = Some(modes);
        self
    }

    /// Set how ACL self-access is recognized.
    pub fn with_acl_detection(mut self, detection: AclDetection) -> Self {
        self.acl_detection = detection;
        self
    }

    /// Attach a cache bundle, typically shared across requests.
    pub fn with_caches(mut self, caches: CacheBundle) -> Self {
        self.caches = caches;
        self
    }
}
