#![warn(missing_docs)]

//! Web Access Control resolution, caching and enforcement middleware.
//!
//! This crate answers "may this proceed?" for an acting party (an agent
//! identity plus an origin) requesting an access mode against a resource.
//! It discovers the resource's governing access control document — probing
//! for a `rel="acl"` link and walking resource containers when no direct
//! document exists — memoizes discovery, fetch and decision work across
//! concurrent requests, and delegates the actual permission semantics to
//! an external decision oracle.
//!
//! The three collaborators are traits the caller implements or adapts:
//! [`Transport`] turns request descriptors into responses, [`GraphStore`]
//! parses retrieved bodies into opaque graphs, and [`DecisionOracle`]
//! interprets a graph into a verdict. The engine itself never touches a
//! socket or a triple.
//!
//! ```ignore
//! let engine = AccessControl::new(transport, graphs, oracle);
//! let options = AccessOptions::new()
//!     .with_agent(agent)
//!     .with_caches(CacheBundle::enabled());
//!
//! // Before touching the store:
//! if let Some(denied) = engine.response(&resource, &[AccessMode::Read], &options).await {
//!     return respond(denied.status, denied.body);
//! }
//!
//! // Advertise what is permitted:
//! let wac_allow = engine.allow_header(&resource, &options).await?;
//! ```

mod access;
pub use access::*;

mod allow;
pub use allow::*;

mod cache;
pub use cache::*;

mod container;
pub use container::*;

mod error;
pub use error::*;

mod graph;
pub use graph::*;

mod link;
pub use link::{acl_link_target, acl_link_targets};

mod locate;

mod mode;
pub use mode::*;

mod options;
pub use options::*;

mod oracle;
pub use oracle::*;

mod resolve;
pub use resolve::{AclDocument, FetchedDocument, GraphOutcome, RetrieveGraph};

mod transport;
pub use transport::*;
