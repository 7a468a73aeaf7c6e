use async_trait::async_trait;
use reqwest::Client;
use url::Url;

use crate::AccessControlError;

/// The request methods the engine issues: metadata probes and document
/// retrievals.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Method {
    /// A metadata-only probe
    Head,
    /// A document retrieval
    Get,
}

impl Method {
    /// The method name on the wire.
    pub fn as_str(&self) -> &'static str {
        match self {
            Method::Head => "HEAD",
            Method::Get => "GET",
        }
    }
}

/// A request descriptor handed to the [`Transport`] capability.
#[derive(Clone, Debug)]
pub struct Request {
    /// The request method
    pub method: Method,
    /// The target resource
    pub url: Url,
    /// Request headers, in order; names may repeat
    pub headers: Vec<(String, String)>,
}

impl Request {
    /// A metadata-only probe of `url`.
    pub fn head(url: Url) -> Self {
        Self {
            method: Method::Head,
            url,
            headers: Vec::new(),
        }
    }

    /// A retrieval of `url`.
    pub fn get(url: Url) -> Self {
        Self {
            method: Method::Get,
            url,
            headers: Vec::new(),
        }
    }

    /// Append a request header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }
}

/// A response descriptor produced by the [`Transport`] capability.
#[derive(Clone, Debug, Default)]
pub struct Response {
    /// The response status code
    pub status: u16,
    /// Response headers, in order; names may repeat
    pub headers: Vec<(String, String)>,
    /// The response body as text
    pub body: String,
}

impl Response {
    /// An empty response with the given status.
    pub fn new(status: u16) -> Self {
        Self {
            status,
            ..Default::default()
        }
    }

    /// Append a response header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((name.into(), value.into()));
        self
    }

    /// Set the response body.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Whether the status code is in the 2xx range.
    pub fn ok(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// All values of the named header, matched case-insensitively, in
    /// response order.
    pub fn header_values<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a str> + 'a {
        self.headers
            .iter()
            .filter(move |(candidate, _)| candidate.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

/// The transport capability that turns a request descriptor into a
/// response. Timeouts are this capability's responsibility and surface as
/// ordinary [`AccessControlError::Transport`] failures.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Issue `request` and await its response.
    async fn fetch(&self, request: Request) -> Result<Response, AccessControlError>;
}

/// A [`Transport`] backed by a shared [`reqwest::Client`].
#[derive(Clone, Default)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    /// Wrap an existing client, preserving its pooling and timeout
    /// configuration.
    pub fn new(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn fetch(&self, request: Request) -> Result<Response, AccessControlError> {
        let mut builder = match request.method {
            Method::Head => self.client.head(request.url),
            Method::Get => self.client.get(request.url),
        };

        for (name, value) in request.headers {
            builder = builder.header(name, value);
        }

        let response = builder
            .send()
            .await
            .map_err(|error| AccessControlError::Transport(format!("HTTP request failed: {error}")))?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .map(|(name, value)| {
                (
                    name.as_str().to_owned(),
                    String::from_utf8_lossy(value.as_bytes()).into_owned(),
                )
            })
            .collect();
        let body = response
            .text()
            .await
            .map_err(|error| AccessControlError::Transport(format!("Failed to read body: {error}")))?;

        Ok(Response {
            status,
            headers,
            body,
        })
    }
}
