// tests/common/mod.rs
// Shared fixtures: a scripted transport and a local HTTP server.
#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use chanmsg::{Transport, TransportError};
use serde_json::{json, Value};

#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub method: &'static str,
    pub path: String,
    pub params: Vec<(String, String)>,
}

impl Call {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.params
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

/// Transport that answers from a script keyed by path and records every call.
/// Unscripted paths answer with HTTP 404.
#[derive(Default)]
pub struct MockTransport {
    responses: Mutex<HashMap<String, VecDeque<Result<Vec<u8>, String>>>>,
    calls: Mutex<Vec<Call>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(&self, path: &str, body: Value) -> &Self {
        self.push(path, Ok(body.to_string().into_bytes()))
    }

    pub fn respond_raw(&self, path: &str, body: &str) -> &Self {
        self.push(path, Ok(body.as_bytes().to_vec()))
    }

    pub fn fail(&self, path: &str, reason: &str) -> &Self {
        self.push(path, Err(reason.to_string()))
    }

    fn push(&self, path: &str, response: Result<Vec<u8>, String>) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .entry(path.to_string())
            .or_default()
            .push_back(response);
        self
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn answer(
        &self,
        method: &'static str,
        params: &[(&str, &str)],
        path: &str,
    ) -> Result<Vec<u8>, TransportError> {
        self.calls.lock().unwrap().push(Call {
            method,
            path: path.to_string(),
            params: params
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect(),
        });
        let next = self
            .responses
            .lock()
            .unwrap()
            .get_mut(path)
            .and_then(|queue| queue.pop_front());
        match next {
            Some(Ok(body)) => Ok(body),
            Some(Err(reason)) => Err(TransportError::Other(reason)),
            None => Err(TransportError::Status {
                status: 404,
                path: path.to_string(),
                api: None,
            }),
        }
    }
}

impl Transport for MockTransport {
    fn get(&self, query: &[(&str, &str)], path: &str) -> Result<Vec<u8>, TransportError> {
        self.answer("GET", query, path)
    }

    fn post(&self, form: &[(&str, &str)], path: &str) -> Result<Vec<u8>, TransportError> {
        self.answer("POST", form, path)
    }
}

// --- JSON fixtures ---

pub fn message_json(sid: &str, body: &str) -> Value {
    json!({
        "sid": sid,
        "account_sid": "AC123",
        "service_sid": "IS1",
        "to": "CH1",
        "body": body,
        "attributes": "{}",
        "date_created": "2016-03-24T20:37:57Z",
        "date_updated": "2016-03-24T20:37:57Z",
        "was_edited": false,
        "from": "alice",
        "url": format!("https://chat.example.com/v1/Services/IS1/Channels/CH1/Messages/{sid}")
    })
}

pub fn page_json(sids: &[&str], next: &str, previous: &str, first: &str) -> Value {
    let messages: Vec<Value> = sids
        .iter()
        .map(|sid| message_json(sid, &format!("body of {sid}")))
        .collect();
    json!({
        "messages": messages,
        "meta": {
            "page": 0,
            "page_size": 2,
            "first_page_url": first,
            "previous_page_url": previous,
            "next_page_url": next,
            "url": first,
            "key": "messages"
        }
    })
}

// --- Local HTTP server ---

use axum::extract::{Form, Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use std::sync::Arc;

pub const ACCOUNT_SID: &str = "AC123";
pub const AUTH_TOKEN: &str = "secret";
/// `Basic base64("AC123:secret")`
const EXPECTED_AUTH: &str = "Basic QUMxMjM6c2VjcmV0";

struct ServerState {
    origin: String,
}

/// Start a fake API server on an ephemeral port. Returns its origin
/// (`http://127.0.0.1:PORT`); the API root is `{origin}/v1`.
pub fn spawn_server() -> String {
    let (tx, rx) = std::sync::mpsc::channel();
    std::thread::spawn(move || {
        let rt = tokio::runtime::Runtime::new().unwrap();
        rt.block_on(async move {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            let origin = format!("http://{}", listener.local_addr().unwrap());
            tx.send(origin.clone()).unwrap();
            let state = Arc::new(ServerState { origin });
            let app = Router::new()
                .route(
                    "/v1/Services/{service}/Channels/{channel}/Messages",
                    get(list).post(create),
                )
                .route(
                    "/v1/Services/{service}/Channels/{channel}/Messages/{message}",
                    get(fetch).post(update),
                )
                .with_state(state);
            axum::serve(listener, app).await.unwrap();
        });
    });
    rx.recv().unwrap()
}

fn unauthorized(headers: &HeaderMap) -> Option<Response> {
    let auth = headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok());
    if auth == Some(EXPECTED_AUTH) {
        return None;
    }
    Some(
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({"code": 20003, "message": "Authenticate", "status": 401})),
        )
            .into_response(),
    )
}

fn server_message(service: &str, channel: &str, sid: &str, form: &HashMap<String, String>) -> Value {
    json!({
        "sid": sid,
        "account_sid": ACCOUNT_SID,
        "service_sid": service,
        "to": channel,
        "body": form.get("Body").cloned().unwrap_or_default(),
        "attributes": form.get("Attributes").cloned().unwrap_or_else(|| "{}".to_string()),
        "date_created": "2016-03-24T20:37:57Z",
        "date_updated": "2016-03-24T20:37:57Z",
        "was_edited": false,
        "from": form.get("From").cloned().unwrap_or_else(|| "system".to_string()),
        "url": format!("/v1/Services/{service}/Channels/{channel}/Messages/{sid}")
    })
}

async fn create(
    Path((service, channel)): Path<(String, String)>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    if let Some(resp) = unauthorized(&headers) {
        return resp;
    }
    let msg = server_message(&service, &channel, "IM100", &form);
    (StatusCode::CREATED, Json(msg)).into_response()
}

async fn update(
    Path((service, channel, message)): Path<(String, String, String)>,
    headers: HeaderMap,
    Form(form): Form<HashMap<String, String>>,
) -> Response {
    if let Some(resp) = unauthorized(&headers) {
        return resp;
    }
    let mut msg = server_message(&service, &channel, &message, &form);
    msg["was_edited"] = json!(true);
    msg["date_updated"] = json!("2016-03-25T08:00:00Z");
    Json(msg).into_response()
}

async fn fetch(
    Path((service, channel, message)): Path<(String, String, String)>,
    headers: HeaderMap,
) -> Response {
    if let Some(resp) = unauthorized(&headers) {
        return resp;
    }
    if message == "IM404" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({
                "code": 20404,
                "message": "The requested resource was not found",
                "more_info": "https://www.twilio.com/docs/errors/20404",
                "status": 404
            })),
        )
            .into_response();
    }
    let form = HashMap::from([("Body".to_string(), format!("body of {message}"))]);
    Json(server_message(&service, &channel, &message, &form)).into_response()
}

/// Two pages: IM1, IM2 then IM3. Page links are absolute URLs.
async fn list(
    State(state): State<Arc<ServerState>>,
    Path((service, channel)): Path<(String, String)>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    if let Some(resp) = unauthorized(&headers) {
        return resp;
    }
    let base = format!(
        "{}/v1/Services/{service}/Channels/{channel}/Messages",
        state.origin
    );
    let page_size: u32 = query.get("PageSize").and_then(|s| s.parse().ok()).unwrap_or(2);
    let page_url = |n: u32| format!("{base}?PageSize={page_size}&Page={n}");
    let message = |sid: &str| {
        let form = HashMap::from([("Body".to_string(), format!("body of {sid}"))]);
        server_message(&service, &channel, sid, &form)
    };

    let (messages, next, previous) = match query.get("Page").map(String::as_str) {
        Some("1") => (vec![message("IM3")], String::new(), page_url(0)),
        _ => {
            let mut first = vec![message("IM1"), message("IM2")];
            if query.get("Order").map(String::as_str) == Some("desc") {
                first.reverse();
            }
            (first, page_url(1), String::new())
        }
    };

    Json(json!({
        "messages": messages,
        "meta": {
            "page": query.get("Page").cloned().unwrap_or_else(|| "0".to_string()).parse::<u32>().unwrap_or(0),
            "page_size": page_size,
            "first_page_url": page_url(0),
            "previous_page_url": previous,
            "next_page_url": next,
            "url": page_url(0),
            "key": "messages"
        }
    }))
    .into_response()
}
