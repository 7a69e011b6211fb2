use base64::Engine;
use percent_encoding::{utf8_percent_encode, AsciiSet, CONTROLS};
use std::sync::Arc;
use std::time::Duration;

use crate::config::ClientConfig;
use crate::error::{ApiError, TransportError};
use crate::log::RequestLog;

/// The request/response collaborator every operation goes through.
///
/// `path` is either relative to the service root or an absolute URL handed
/// out by the server in pagination metadata; implementations follow
/// absolute URLs verbatim.
pub trait Transport {
    /// Read request. Returns the raw response body.
    fn get(&self, query: &[(&str, &str)], path: &str) -> Result<Vec<u8>, TransportError>;

    /// Form-encoded write request. Returns the raw response body.
    fn post(&self, form: &[(&str, &str)], path: &str) -> Result<Vec<u8>, TransportError>;
}

impl<T: Transport + ?Sized> Transport for &T {
    fn get(&self, query: &[(&str, &str)], path: &str) -> Result<Vec<u8>, TransportError> {
        (**self).get(query, path)
    }

    fn post(&self, form: &[(&str, &str)], path: &str) -> Result<Vec<u8>, TransportError> {
        (**self).post(form, path)
    }
}

impl<T: Transport + ?Sized> Transport for Arc<T> {
    fn get(&self, query: &[(&str, &str)], path: &str) -> Result<Vec<u8>, TransportError> {
        (**self).get(query, path)
    }

    fn post(&self, form: &[(&str, &str)], path: &str) -> Result<Vec<u8>, TransportError> {
        (**self).post(form, path)
    }
}

// --- Paths ---

const SEGMENT: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'%')
    .add(b'/')
    .add(b'<')
    .add(b'>')
    .add(b'?')
    .add(b'`')
    .add(b'{')
    .add(b'}');

fn segment(s: &str) -> impl std::fmt::Display + '_ {
    utf8_percent_encode(s, SEGMENT)
}

/// `/Services/{service}/Channels/{channel}/Messages`
pub fn messages_path(service_sid: &str, channel_sid: &str) -> String {
    format!(
        "/Services/{}/Channels/{}/Messages",
        segment(service_sid),
        segment(channel_sid)
    )
}

/// `/Services/{service}/Channels/{channel}/Messages/{message}`
pub fn message_path(service_sid: &str, channel_sid: &str, message_sid: &str) -> String {
    format!(
        "{}/{}",
        messages_path(service_sid, channel_sid),
        segment(message_sid)
    )
}

/// Resolve `path` against `base_url`.
///
/// Absolute URLs pass through. A relative path that already starts with the
/// base URL's own path (e.g. `/v1/Services/..` against `https://host/v1`) is
/// resolved against the origin so the prefix is not doubled.
pub fn resolve_url(base_url: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    let base = base_url.trim_end_matches('/');
    let after_scheme = base.find("://").map(|i| i + 3).unwrap_or(0);
    let (origin, base_path) = match base[after_scheme..].find('/') {
        Some(i) => base.split_at(after_scheme + i),
        None => (base, ""),
    };
    let path = format!("/{}", path.trim_start_matches('/'));
    if !base_path.is_empty()
        && (path == base_path || path.starts_with(&format!("{base_path}/")))
    {
        format!("{origin}{path}")
    } else {
        format!("{base}{path}")
    }
}

// --- HTTP transport ---

/// Blocking HTTP transport for the REST API.
pub struct HttpClient {
    base_url: String,
    authorization: String,
    agent: ureq::Agent,
    log: Option<RequestLog>,
}

impl HttpClient {
    pub fn new(config: &ClientConfig) -> anyhow::Result<Self> {
        let timeout = (config.timeout_secs > 0).then(|| Duration::from_secs(config.timeout_secs));
        let agent_config = ureq::Agent::config_builder()
            .timeout_global(timeout)
            .http_status_as_error(false)
            .build();

        let log = match &config.log_file {
            Some(path) => Some(RequestLog::open(path)?),
            None => None,
        };

        Ok(Self {
            base_url: config.base_url.clone(),
            authorization: basic_auth(&config.account_sid, &config.auth_token),
            agent: ureq::Agent::new_with_config(agent_config),
            log,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        resolve_url(&self.base_url, path)
    }

    fn finish(
        &self,
        method: &'static str,
        path: &str,
        result: Result<ureq::http::Response<ureq::Body>, ureq::Error>,
    ) -> Result<Vec<u8>, TransportError> {
        let outcome = result.and_then(|mut resp| {
            let status = resp.status().as_u16();
            resp.body_mut().read_to_vec().map(|body| (status, body))
        });

        let summary = match &outcome {
            Ok((status, _)) => status.to_string(),
            Err(e) => format!("error: {e}"),
        };
        if let Some(log) = &self.log {
            // The request already happened; a log failure must not hide its result.
            let _ = log.record(method, path, &summary);
        }

        match outcome {
            Ok((status, body)) if (200..300).contains(&status) => Ok(body),
            Ok((status, body)) => Err(TransportError::Status {
                status,
                path: path.to_string(),
                api: ApiError::from_body(&body),
            }),
            Err(source) => Err(TransportError::Request {
                method,
                path: path.to_string(),
                source: Box::new(source),
            }),
        }
    }
}

impl Transport for HttpClient {
    fn get(&self, query: &[(&str, &str)], path: &str) -> Result<Vec<u8>, TransportError> {
        let mut req = self
            .agent
            .get(&self.url(path))
            .header("Authorization", &self.authorization)
            .header("Accept", "application/json");
        for &(key, value) in query {
            req = req.query(key, value);
        }
        self.finish("GET", path, req.call())
    }

    fn post(&self, form: &[(&str, &str)], path: &str) -> Result<Vec<u8>, TransportError> {
        let form: Vec<(&str, &str)> = form.to_vec();
        let result = self
            .agent
            .post(&self.url(path))
            .header("Authorization", &self.authorization)
            .header("Accept", "application/json")
            .send_form(form);
        self.finish("POST", path, result)
    }
}

fn basic_auth(user: &str, password: &str) -> String {
    let credentials = format!("{user}:{password}");
    format!(
        "Basic {}",
        base64::engine::general_purpose::STANDARD.encode(credentials.as_bytes())
    )
}
