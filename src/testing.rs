use std::collections::{HashMap, VecDeque};

use http::{HeaderValue, StatusCode};

use crate::{
    transport::{HttpRequest, HttpResponse, Transport},
    TransportError, TransportResult,
};

enum Scripted {
    Response(HttpResponse),
    Failure { partial_body: Option<String> },
}

/// Transport double: answers from a script and records every request.
/// Once the script is exhausted every request fails.
pub(crate) struct RecordingTransport {
    script: VecDeque<Scripted>,
    requests: Vec<HttpRequest>,
    last_body: Option<String>,
}

impl RecordingTransport {
    pub(crate) fn new() -> Self {
        RecordingTransport {
            script: VecDeque::new(),
            requests: Vec::new(),
            last_body: None,
        }
    }

    pub(crate) fn respond(self, status: u16, body: &str) -> Self {
        let status = StatusCode::from_u16(status).unwrap();
        self.respond_with(status, body)
    }

    pub(crate) fn respond_with(mut self, status: StatusCode, body: &str) -> Self {
        self.script.push_back(Scripted::Response(HttpResponse {
            status,
            body: body.to_string(),
        }));
        self
    }

    pub(crate) fn fail(mut self) -> Self {
        self.script.push_back(Scripted::Failure { partial_body: None });
        self
    }

    pub(crate) fn fail_with_partial_body(mut self, body: &str) -> Self {
        self.script.push_back(Scripted::Failure {
            partial_body: Some(body.to_string()),
        });
        self
    }

    pub(crate) fn requests(&self) -> &[HttpRequest] {
        &self.requests
    }
}

fn failure() -> TransportError {
    TransportError::InvalidHeader(HeaderValue::from_str("\n").unwrap_err())
}

impl Transport for RecordingTransport {
    fn execute(&mut self, request: HttpRequest) -> TransportResult<HttpResponse> {
        self.requests.push(request);
        match self.script.pop_front() {
            Some(Scripted::Response(response)) => {
                self.last_body = Some(response.body.clone());
                Ok(response)
            }
            Some(Scripted::Failure { partial_body }) => {
                self.last_body = partial_body;
                Err(failure())
            }
            None => {
                self.last_body = None;
                Err(failure())
            }
        }
    }

    fn last_response_body(&self) -> Option<&str> {
        self.last_body.as_deref()
    }
}

/// Decoded `key="value"` pairs of an `Authorization: OAuth ...` header.
pub(crate) fn header_fields(authorization: &str) -> HashMap<String, String> {
    let content = authorization.strip_prefix("OAuth ").unwrap();
    content
        .split(',')
        .filter_map(|item| item.split_once('='))
        .map(|(k, v)| {
            let value = percent_encoding::percent_decode_str(v.trim_matches('"'))
                .decode_utf8_lossy()
                .to_string();
            (k.to_string(), value)
        })
        .collect()
}
