use std::time::Duration;

use http::{
    header::{AUTHORIZATION, CONTENT_TYPE},
    HeaderValue, Method, StatusCode,
};
use reqwest::blocking::Client as ReqwestClient;
use url::Url;

use crate::{Result, TransportResult};

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const DEFAULT_USER_AGENT: &str = concat!("shapeways-oauth1/", env!("CARGO_PKG_VERSION"));

/// One outgoing request. The query string is already part of `url`.
#[derive(Debug, Clone, PartialEq)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub authorization: String,
    /// JSON body for PUT / POST.
    pub body: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct HttpResponse {
    pub status: StatusCode,
    pub body: String,
}

/// HTTP collaborator of [`Client`](crate::Client).
///
/// Non-success statuses are still `Ok`: whatever the provider answered is
/// handed back. `Err` is reserved for requests that produced no usable
/// response.
pub trait Transport {
    fn execute(&mut self, request: HttpRequest) -> TransportResult<HttpResponse>;

    /// Raw body of the most recent response, if any was received.
    fn last_response_body(&self) -> Option<&str>;
}

/// Blocking reqwest transport.
#[derive(Debug)]
pub struct ReqwestTransport {
    inner: ReqwestClient,
    last_body: Option<String>,
}

impl ReqwestTransport {
    pub fn new(timeout: Option<Duration>) -> Result<Self> {
        let mut builder = ReqwestClient::builder().user_agent(DEFAULT_USER_AGENT);
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let inner = builder.build().map_err(|e| {
            crate::Error::Configuration(format!("http client could not be built : {}", e))
        })?;
        Ok(Self::new_with_client(inner))
    }

    /// Constructs a transport around an existing `reqwest::blocking::Client`.
    pub fn new_with_client(client: ReqwestClient) -> Self {
        ReqwestTransport {
            inner: client,
            last_body: None,
        }
    }
}

impl Transport for ReqwestTransport {
    fn execute(&mut self, request: HttpRequest) -> TransportResult<HttpResponse> {
        // a failed request must not expose the previous response
        self.last_body = None;

        let authorization = HeaderValue::from_str(&request.authorization)?;
        let mut builder = self
            .inner
            .request(request.method, request.url)
            .header(AUTHORIZATION, authorization);
        if let Some(body) = request.body {
            builder = builder
                .header(CONTENT_TYPE, HeaderValue::from_static(JSON_CONTENT_TYPE))
                .body(body);
        }

        let response = builder.send()?;
        let status = response.status();
        let body = response.text()?;
        log::debug!("received {} ({} bytes)", status, body.len());
        self.last_body = Some(body.clone());
        Ok(HttpResponse { status, body })
    }

    fn last_response_body(&self) -> Option<&str> {
        self.last_body.as_deref()
    }
}
