use std::collections::BTreeMap;
use std::time::Duration;

use reqwest::Method;
use reqwest::blocking::Client;
use reqwest::header::USER_AGENT;
use serde::Deserialize;
use serde_json::Value;
use tracing::debug;

use crate::config::SyncConfig;
use crate::error::{Error, Result};

pub const API_PREFIX: &str = "/api/v2";
pub const TOTAL_COUNT_HEADER: &str = "total-count";

/// Transport seam for the remote item service.
///
/// `sub_domain` selects a team workspace; `None` is the personal space.
/// Implementations return every completed exchange, whatever its status;
/// callers decide what a non-2xx status means via [`ApiResponse::ensure_success`].
pub trait ItemApi {
    fn get(&mut self, sub_domain: Option<&str>, path: &str) -> Result<ApiResponse>;
    fn post(&mut self, sub_domain: Option<&str>, path: &str, body: &Value) -> Result<ApiResponse>;
    fn patch(&mut self, sub_domain: Option<&str>, path: &str, body: &Value)
    -> Result<ApiResponse>;
    fn delete(&mut self, sub_domain: Option<&str>, path: &str) -> Result<ApiResponse>;
    fn request_count(&self) -> usize;
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApiResponse {
    pub status: u16,
    /// Header names are lowercased.
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

#[derive(Debug, Deserialize)]
struct ErrorPayload {
    #[serde(rename = "type")]
    kind: String,
    message: String,
}

impl ApiResponse {
    pub fn json(status: u16, body: &str) -> Self {
        Self {
            status,
            headers: BTreeMap::from([(
                "content-type".to_string(),
                "application/json".to_string(),
            )]),
            body: body.as_bytes().to_vec(),
        }
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Pass 2xx responses through; otherwise classify the failure as a
    /// structured `Response` error or a bare `Status` error.
    pub fn ensure_success(self) -> Result<Self> {
        if self.is_success() {
            return Ok(self);
        }
        match serde_json::from_slice::<ErrorPayload>(&self.body) {
            Ok(payload) => Err(Error::Response {
                kind: payload.kind,
                message: payload.message,
            }),
            Err(_) => Err(Error::Status {
                status: self.status,
            }),
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpClientConfig {
    pub host: String,
    pub access_token: String,
    pub user_agent: String,
    pub timeout_ms: u64,
}

impl HttpClientConfig {
    pub fn from_config(config: &SyncConfig) -> Result<Self> {
        let access_token = config
            .access_token()
            .ok_or(Error::MissingCredential(crate::config::ACCESS_TOKEN_ENV))?;
        Ok(Self {
            host: config.api_host(),
            access_token,
            user_agent: config.user_agent(),
            timeout_ms: config.timeout_ms(),
        })
    }
}

/// Blocking HTTP implementation of [`ItemApi`].
pub struct HttpItemApi {
    client: Client,
    config: HttpClientConfig,
    request_count: usize,
}

impl HttpItemApi {
    pub fn new(config: HttpClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_millis(config.timeout_ms))
            .build()?;
        Ok(Self {
            client,
            config,
            request_count: 0,
        })
    }

    pub fn from_config(config: &SyncConfig) -> Result<Self> {
        Self::new(HttpClientConfig::from_config(config)?)
    }

    fn send(
        &mut self,
        method: Method,
        sub_domain: Option<&str>,
        path: &str,
        body: Option<&Value>,
    ) -> Result<ApiResponse> {
        let url = endpoint_url(&self.config.host, sub_domain, path);
        self.request_count += 1;
        debug!(%method, %url, "sending request");

        let mut request = self
            .client
            .request(method, &url)
            .bearer_auth(&self.config.access_token)
            .header(USER_AGENT, self.config.user_agent.clone());
        if let Some(body) = body {
            request = request.json(body);
        }
        let response = request.send()?;

        let status = response.status().as_u16();
        let headers = response
            .headers()
            .iter()
            .filter_map(|(name, value)| {
                value
                    .to_str()
                    .ok()
                    .map(|value| (name.as_str().to_string(), value.to_string()))
            })
            .collect();
        let body = response.bytes()?.to_vec();
        debug!(status, bytes = body.len(), "received response");

        Ok(ApiResponse {
            status,
            headers,
            body,
        })
    }
}

impl ItemApi for HttpItemApi {
    fn get(&mut self, sub_domain: Option<&str>, path: &str) -> Result<ApiResponse> {
        self.send(Method::GET, sub_domain, path, None)
    }

    fn post(&mut self, sub_domain: Option<&str>, path: &str, body: &Value) -> Result<ApiResponse> {
        self.send(Method::POST, sub_domain, path, Some(body))
    }

    fn patch(
        &mut self,
        sub_domain: Option<&str>,
        path: &str,
        body: &Value,
    ) -> Result<ApiResponse> {
        self.send(Method::PATCH, sub_domain, path, Some(body))
    }

    fn delete(&mut self, sub_domain: Option<&str>, path: &str) -> Result<ApiResponse> {
        self.send(Method::DELETE, sub_domain, path, None)
    }

    fn request_count(&self) -> usize {
        self.request_count
    }
}

/// Build the absolute URL for an API path.
///
/// A bare host gets `https://` and the workspace as a sub-domain. A host that
/// already carries a scheme is used verbatim and ignores the workspace.
pub fn endpoint_url(host: &str, sub_domain: Option<&str>, path: &str) -> String {
    let host = host.trim().trim_end_matches('/');
    if host.contains("://") {
        return format!("{host}{API_PREFIX}{path}");
    }
    match sub_domain {
        Some(team) if !team.is_empty() => format!("https://{team}.{host}{API_PREFIX}{path}"),
        _ => format!("https://{host}{API_PREFIX}{path}"),
    }
}

#[cfg(test)]
pub(crate) mod mock {
    use std::collections::BTreeMap;

    use serde_json::Value;

    use super::{ApiResponse, ItemApi};
    use crate::error::Result;

    #[derive(Debug, Clone)]
    pub(crate) struct RecordedRequest {
        pub method: &'static str,
        pub sub_domain: Option<String>,
        pub path: String,
        pub body: Option<Value>,
    }

    type Responder = Box<dyn FnMut(&RecordedRequest) -> ApiResponse>;

    /// In-memory [`ItemApi`] that records every call.
    #[derive(Default)]
    pub(crate) struct MockApi {
        routes: BTreeMap<(&'static str, String), ApiResponse>,
        responder: Option<Responder>,
        pub requests: Vec<RecordedRequest>,
        pub request_count: usize,
    }

    impl MockApi {
        pub fn route(&mut self, method: &'static str, path: &str, response: ApiResponse) {
            self.routes.insert((method, path.to_string()), response);
        }

        pub fn route_get(&mut self, path: &str, response: ApiResponse) {
            self.route("GET", path, response);
        }

        pub fn respond_with<F>(&mut self, responder: F)
        where
            F: FnMut(&RecordedRequest) -> ApiResponse + 'static,
        {
            self.responder = Some(Box::new(responder));
        }

        fn handle(
            &mut self,
            method: &'static str,
            sub_domain: Option<&str>,
            path: &str,
            body: Option<&Value>,
        ) -> Result<ApiResponse> {
            self.request_count += 1;
            let request = RecordedRequest {
                method,
                sub_domain: sub_domain.map(ToString::to_string),
                path: path.to_string(),
                body: body.cloned(),
            };
            let response = match self.responder.as_mut() {
                Some(responder) => responder(&request),
                None => {
                    let route = path.split('?').next().unwrap_or(path).to_string();
                    self.routes.get(&(method, route)).cloned().unwrap_or_else(|| {
                        ApiResponse::json(404, r#"{"type":"not_found","message":"Not found"}"#)
                    })
                }
            };
            self.requests.push(request);
            Ok(response)
        }
    }

    impl ItemApi for MockApi {
        fn get(&mut self, sub_domain: Option<&str>, path: &str) -> Result<ApiResponse> {
            self.handle("GET", sub_domain, path, None)
        }

        fn post(
            &mut self,
            sub_domain: Option<&str>,
            path: &str,
            body: &Value,
        ) -> Result<ApiResponse> {
            self.handle("POST", sub_domain, path, Some(body))
        }

        fn patch(
            &mut self,
            sub_domain: Option<&str>,
            path: &str,
            body: &Value,
        ) -> Result<ApiResponse> {
            self.handle("PATCH", sub_domain, path, Some(body))
        }

        fn delete(&mut self, sub_domain: Option<&str>, path: &str) -> Result<ApiResponse> {
            self.handle("DELETE", sub_domain, path, None)
        }

        fn request_count(&self) -> usize {
            self.request_count
        }
    }
}
