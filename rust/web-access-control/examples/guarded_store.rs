//! An in-memory document store guarded by the access control engine.
//!
//! The store follows the suffix convention: every resource advertises
//! `<name.acl>; rel="acl"` whether or not that document exists, so
//! resources without their own ACL inherit one from their container. The
//! decision oracle here is a deliberately naive text matcher over
//! Turtle-ish authorization blocks; a real deployment would adapt an RDF
//! library behind the same trait.
//!
//! Run with `cargo run --example guarded_store`.

use std::collections::HashMap;
use std::sync::Mutex;

use anyhow::Result;
use async_trait::async_trait;
use url::Url;
use web_access_control::{
    AccessControl, AccessControlError, AccessMode, AccessOptions, CacheBundle, DecisionOracle,
    DecisionRequest, GraphStore, Method, Request, Response, Transport, TrustChainFetch,
};

struct MemoryStore {
    documents: HashMap<&'static str, &'static str>,
}

impl MemoryStore {
    fn acl_link_for(resource: &Url) -> String {
        let name = resource
            .path_segments()
            .and_then(|mut segments| segments.next_back())
            .unwrap_or("");
        format!(r#"<{name}.acl>; rel="acl""#)
    }
}

#[async_trait]
impl Transport for MemoryStore {
    async fn fetch(&self, request: Request) -> Result<Response, AccessControlError> {
        match request.method {
            Method::Head => {
                Ok(Response::new(200).with_header("Link", Self::acl_link_for(&request.url)))
            }
            Method::Get => match self.documents.get(request.url.as_str()) {
                Some(body) => Ok(Response::new(200).with_body(*body)),
                None => Ok(Response::new(404)),
            },
        }
    }
}

/// A "graph" that is just the authorization blocks of every parsed
/// document, split on statement terminators.
#[derive(Default)]
struct Blocks(Mutex<Vec<String>>);

struct BlockStore;

#[async_trait]
impl GraphStore for BlockStore {
    type Graph = Blocks;

    fn new_graph(&self) -> Blocks {
        Blocks::default()
    }

    async fn parse(
        &self,
        source: &str,
        graph: &Blocks,
        _base: &Url,
        _content_type: &str,
    ) -> Result<(), AccessControlError> {
        graph.0.lock().unwrap().extend(
            source
                .split(" .")
                .map(str::trim)
                .filter(|block| !block.is_empty())
                .map(str::to_owned),
        );
        Ok(())
    }
}

struct NaiveOracle;

#[async_trait]
impl DecisionOracle<Blocks> for NaiveOracle {
    async fn origin_trusted_modes(
        &self,
        _graph: &Blocks,
        _resource: &Url,
        _is_container: bool,
        _acl_document: &Url,
        _origin: Option<&Url>,
        _trust_chain: &dyn TrustChainFetch<Blocks>,
    ) -> Result<Vec<String>, AccessControlError> {
        Ok(Vec::new())
    }

    async fn access_denied(
        &self,
        request: DecisionRequest<'_, Blocks>,
    ) -> Result<bool, AccessControlError> {
        let blocks = request.graph.0.lock().unwrap().clone();

        let granted = |qualified: &str| {
            let name = qualified
                .rsplit_once('#')
                .map(|(_, name)| name)
                .unwrap_or(qualified);
            blocks.iter().any(|block| {
                let grants_mode = block.split("acl:mode").nth(1).is_some_and(|rest| {
                    rest.split(';')
                        .next()
                        .unwrap_or("")
                        .split(',')
                        .any(|candidate| candidate.trim() == format!("acl:{name}"))
                });
                let to_public = block.contains("acl:agentClass foaf:Agent");
                let to_agent = request
                    .agent
                    .map(|agent| block.contains(&format!("acl:agent <{agent}>")))
                    .unwrap_or(false);
                grants_mode && (to_public || to_agent)
            })
        };

        Ok(!request.modes.iter().all(|mode| granted(mode)))
    }
}

fn store() -> MemoryStore {
    let mut documents = HashMap::new();

    documents.insert("https://pod.example/notes.txt", "Buy milk.");
    documents.insert(
        "https://pod.example/notes.txt.acl",
        "<#public> a acl:Authorization ;\n\
         \u{20}   acl:agentClass foaf:Agent ;\n\
         \u{20}   acl:mode acl:Read ;\n\
         \u{20}   acl:accessTo <notes.txt> .\n\
         <#owner> a acl:Authorization ;\n\
         \u{20}   acl:agent <https://alice.example/#me> ;\n\
         \u{20}   acl:mode acl:Read, acl:Write ;\n\
         \u{20}   acl:accessTo <notes.txt> .",
    );

    // No ACL of its own; governed by the container's document.
    documents.insert("https://pod.example/shared/report.txt", "Q3 numbers.");
    documents.insert(
        "https://pod.example/shared/.acl",
        "<#public> a acl:Authorization ;\n\
         \u{20}   acl:agentClass foaf:Agent ;\n\
         \u{20}   acl:mode acl:Read ;\n\
         \u{20}   acl:defaultForNew <./> .",
    );

    MemoryStore { documents }
}

#[tokio::main]
async fn main() -> Result<()> {
    let engine = AccessControl::new(store(), BlockStore, NaiveOracle);
    let caches = CacheBundle::enabled();

    let notes = Url::parse("https://pod.example/notes.txt")?;
    let report = Url::parse("https://pod.example/shared/report.txt")?;
    let alice = Url::parse("https://alice.example/#me")?;

    let anonymous = AccessOptions::new().with_caches(caches.clone());
    let as_alice = AccessOptions::new()
        .with_agent(alice)
        .with_caches(caches.clone());

    for (label, options) in [("anonymous", &anonymous), ("alice", &as_alice)] {
        for method in ["GET", "PUT"] {
            let mode = AccessMode::for_http_method(method)
                .ok_or_else(|| anyhow::anyhow!("unmapped method {method}"))?;
            let outcome = engine
                .response(&notes, std::slice::from_ref(&mode), options)
                .await;
            match outcome {
                None => println!("{label} {method} {notes}: permitted"),
                Some(denied) => println!(
                    "{label} {method} {notes}: {} {}",
                    denied.status, denied.status_text
                ),
            }
        }
    }

    println!(
        "WAC-Allow for alice on {notes}: {}",
        engine.allow_header(&notes, &as_alice).await?
    );

    let inherited = engine
        .response(&report, &[AccessMode::Read], &anonymous)
        .await;
    println!(
        "anonymous GET {report} (inherited from container): {}",
        match inherited {
            None => "permitted".to_owned(),
            Some(denied) => format!("{} {}", denied.status, denied.status_text),
        }
    );

    Ok(())
}
