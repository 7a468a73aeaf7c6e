use thiserror::Error;

/// The common error type used by this crate.
///
/// The type is `Clone` because in-flight verdict computations are shared
/// between concurrent callers through the cache fabric, and every caller
/// observes the same terminal error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessControlError {
    /// An error that occurs while issuing a request through the transport
    /// capability
    #[error("Transport request failed: {0}")]
    Transport(String),

    /// An ACL document was located but the store answered with a non-2xx
    /// status other than 404
    #[error("Could not retrieve ACL document {url}: HTTP {status}")]
    RetrievalFailed {
        /// The ACL document that could not be retrieved
        url: String,
        /// The status code reported by the transport
        status: u16,
    },

    /// A requested mode is missing from the configured mode allow-list
    #[error("The mode '{0}' is not supported")]
    UnsupportedMode(String),

    /// A retrieved document body could not be parsed into a graph
    #[error("Failed to parse graph document {url}: {reason}")]
    GraphParse {
        /// The document whose body failed to parse
        url: String,
        /// The parse failure reported by the graph store
        reason: String,
    },

    /// A trust chain document requested by the decision oracle could not be
    /// fetched
    #[error("Could not fetch trust chain document {0}")]
    TrustChainFetch(String),

    /// The decision oracle failed to produce a verdict
    #[error("Access decision failed: {0}")]
    Decision(String),
}
