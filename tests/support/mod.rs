#![allow(dead_code)]

use std::sync::Arc;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Mutex;

/// Minimal HTTP/1.1 request, just enough to drive the client under test.
pub struct Request {
    pub method: String,
    pub path: String,
    pub body: Vec<u8>,
}

pub async fn read_request(stream: &mut TcpStream) -> Option<Request> {
    let mut buf = Vec::new();
    let mut tmp = [0u8; 1024];

    let header_end = loop {
        if let Some(pos) = find_subslice(&buf, b"\r\n\r\n") {
            break pos;
        }
        let n = stream.read(&mut tmp).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&tmp[..n]);
    };

    let header_text = String::from_utf8_lossy(&buf[..header_end]).to_string();
    let mut lines = header_text.lines();
    let mut parts = lines.next()?.split_whitespace();
    let method = parts.next()?.to_string();
    let path = parts.next()?.to_string();

    let content_length = lines
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    let mut body = buf[header_end + 4..].to_vec();
    while body.len() < content_length {
        let n = stream.read(&mut tmp).await.ok()?;
        if n == 0 {
            return None;
        }
        body.extend_from_slice(&tmp[..n]);
    }
    body.truncate(content_length);

    Some(Request { method, path, body })
}

pub async fn write_json(stream: &mut TcpStream, body: &str) {
    let response = format!(
        "HTTP/1.1 200 OK\r\ncontent-type: application/json\r\ncontent-length: {}\r\nconnection: close\r\n\r\n{}",
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes()).await;
    let _ = stream.flush().await;
}

fn find_subslice(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}

/// In-memory stand-in for the rules endpoint: stores installed rules,
/// assigns ids, and logs every request it serves.
#[derive(Default)]
pub struct RulesState {
    pub rules: Vec<(String, String)>,
    pub next_id: u64,
    pub requests: Vec<String>,
}

pub struct RulesFixture {
    pub url: String,
    pub state: Arc<Mutex<RulesState>>,
}

pub async fn spawn_rules_server() -> RulesFixture {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let url = format!(
        "http://{}/2/tweets/search/stream/rules",
        listener.local_addr().unwrap()
    );
    let state = Arc::new(Mutex::new(RulesState {
        next_id: 100,
        ..Default::default()
    }));

    let server_state = state.clone();
    tokio::spawn(async move {
        loop {
            let Ok((mut socket, _)) = listener.accept().await else {
                break;
            };
            let state = server_state.clone();
            tokio::spawn(async move {
                if let Some(request) = read_request(&mut socket).await {
                    let body = handle_rules(&request, &state).await;
                    write_json(&mut socket, &body).await;
                }
            });
        }
    });

    RulesFixture { url, state }
}

async fn handle_rules(request: &Request, state: &Arc<Mutex<RulesState>>) -> String {
    let mut state = state.lock().await;

    if request.method == "GET" {
        state.requests.push("GET".to_string());
        if state.rules.is_empty() {
            return r#"{"meta":{"result_count":0}}"#.to_string();
        }
        let data: Vec<serde_json::Value> = state
            .rules
            .iter()
            .map(|(id, value)| serde_json::json!({"id": id, "value": value}))
            .collect();
        return serde_json::json!({ "data": data }).to_string();
    }

    let body: serde_json::Value = serde_json::from_slice(&request.body).unwrap();

    if let Some(add) = body.get("add").and_then(|v| v.as_array()) {
        state.requests.push("ADD".to_string());
        let mut created = Vec::new();
        for rule in add {
            let value = rule["value"].as_str().unwrap().to_string();
            state.next_id += 1;
            let id = state.next_id.to_string();
            state.rules.push((id.clone(), value.clone()));
            created.push(serde_json::json!({"id": id, "value": value}));
        }
        return serde_json::json!({ "data": created }).to_string();
    }

    if let Some(ids) = body.pointer("/delete/ids").and_then(|v| v.as_array()) {
        state.requests.push("DELETE".to_string());
        let ids: Vec<String> = ids
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect();
        let before = state.rules.len();
        state.rules.retain(|(id, _)| !ids.contains(id));
        let deleted = before - state.rules.len();
        return serde_json::json!({"meta":{"summary":{"deleted": deleted}}}).to_string();
    }

    "{}".to_string()
}
