//! Mock finboard API server for testing
//!
//! Serves the same response shapes as the real backend:
//! - GET /api/categories returns `[{id, title, description}]`
//! - GET /api/paymentType returns `[{id, description, lastCardNumber}]`
//! - POST /api/transactions/{categoryId} echoes the body with a new `id`

use std::io::{Read, Write};
use std::net::{TcpListener, TcpStream};
use std::sync::atomic::{AtomicBool, AtomicI64, Ordering};
use std::sync::{Arc, Mutex};
use std::thread;

use serde_json::{json, Value as JsonValue};

/// Configuration for mock responses
#[derive(Debug, Clone, Default)]
pub struct MockApiConfig {
    /// Bearer token every request must carry, if any
    pub required_token: Option<String>,
    /// Transactions whose note is listed here are rejected with HTTP 500
    pub failing_notes: Vec<String>,
    /// Body sent with 201 Created instead of the echoed record
    pub created_body: Option<String>,
}

/// Shared state between the server thread and the test
#[derive(Default)]
struct MockState {
    created: Mutex<Vec<(i64, JsonValue)>>,
    next_id: AtomicI64,
}

/// Mock API server on a random local port
pub struct MockApiServer {
    port: u16,
    running: Arc<AtomicBool>,
    state: Arc<MockState>,
    thread_handle: Option<thread::JoinHandle<()>>,
}

impl MockApiServer {
    pub fn start(config: MockApiConfig) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let port = listener.local_addr()?.port();
        let running = Arc::new(AtomicBool::new(true));
        let state = Arc::new(MockState {
            created: Mutex::new(Vec::new()),
            next_id: AtomicI64::new(100),
        });

        // Non-blocking accept so stop() can end the loop
        listener.set_nonblocking(true)?;

        let running_clone = Arc::clone(&running);
        let state_clone = Arc::clone(&state);
        let thread_handle = thread::spawn(move || {
            while running_clone.load(Ordering::SeqCst) {
                match listener.accept() {
                    Ok((stream, _)) => {
                        let cfg = config.clone();
                        let state = Arc::clone(&state_clone);
                        thread::spawn(move || {
                            handle_connection(stream, &cfg, &state);
                        });
                    }
                    Err(ref e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                        thread::sleep(std::time::Duration::from_millis(5));
                    }
                    Err(_) => break,
                }
            }
        });

        Ok(Self {
            port,
            running,
            state,
            thread_handle: Some(thread_handle),
        })
    }

    pub fn base_url(&self) -> String {
        format!("http://127.0.0.1:{}/api/", self.port)
    }

    /// `(categoryId, body)` of every accepted create request, in arrival order
    pub fn created(&self) -> Vec<(i64, JsonValue)> {
        self.state
            .created
            .lock()
            .map(|c| c.clone())
            .unwrap_or_default()
    }

    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        if let Some(handle) = self.thread_handle.take() {
            let _ = handle.join();
        }
    }
}

impl Drop for MockApiServer {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Read one full HTTP request: headers, then `Content-Length` bytes of body
fn read_request(stream: &mut TcpStream) -> Option<(String, String)> {
    let mut data = Vec::new();
    let mut buffer = [0u8; 4096];

    let header_end = loop {
        let n = stream.read(&mut buffer).ok()?;
        if n == 0 {
            return None;
        }
        data.extend_from_slice(&buffer[..n]);
        if let Some(pos) = data.windows(4).position(|w| w == b"\r\n\r\n") {
            break pos + 4;
        }
    };

    let head = String::from_utf8_lossy(&data[..header_end]).to_string();
    let content_length = head
        .lines()
        .filter_map(|line| line.split_once(':'))
        .find(|(name, _)| name.trim().eq_ignore_ascii_case("content-length"))
        .and_then(|(_, value)| value.trim().parse::<usize>().ok())
        .unwrap_or(0);

    while data.len() < header_end + content_length {
        let n = stream.read(&mut buffer).ok()?;
        if n == 0 {
            break;
        }
        data.extend_from_slice(&buffer[..n]);
    }

    let body = String::from_utf8_lossy(&data[header_end..]).to_string();
    Some((head, body))
}

fn handle_connection(mut stream: TcpStream, config: &MockApiConfig, state: &MockState) {
    let _ = stream.set_nonblocking(false);

    let Some((head, body)) = read_request(&mut stream) else {
        return;
    };

    let first_line = head.lines().next().unwrap_or("");
    let parts: Vec<&str> = first_line.split_whitespace().collect();
    if parts.len() < 2 {
        send_response(&mut stream, 400, "Bad Request", r#"{"message": "Invalid request"}"#);
        return;
    }
    let method = parts[0];
    let path = parts[1];

    if let Some(token) = &config.required_token {
        let expected = format!("authorization: bearer {}", token.to_lowercase());
        if !head.to_lowercase().contains(&expected) {
            send_response(&mut stream, 401, "Unauthorized", r#"{"message": "Unauthorized"}"#);
            return;
        }
    }

    match (method, path) {
        ("GET", "/api/categories") => {
            let categories = json!([
                {"id": 3, "title": "Food", "description": "Groceries and dining", "createdAt": "2024-01-01"},
                {"id": "4", "title": "Housing", "description": "Rent", "createdAt": "2024-01-01"}
            ]);
            send_response(&mut stream, 200, "OK", &categories.to_string());
        }
        ("GET", "/api/paymentType") => {
            let payment_types = json!([
                {"id": 1, "description": "Visa", "cardBrandName": "Visa", "cardBankName": "Acme", "expirationDay": 10, "daysToCloseInvoice": 5, "lastCardNumber": 42},
                {"id": 2, "description": "Cash", "lastCardNumber": null}
            ]);
            send_response(&mut stream, 200, "OK", &payment_types.to_string());
        }
        ("POST", p) if p.starts_with("/api/transactions/") => {
            let category_id = p
                .trim_start_matches("/api/transactions/")
                .parse::<i64>()
                .unwrap_or(0);
            let mut payload: JsonValue = serde_json::from_str(&body).unwrap_or(JsonValue::Null);

            let note = payload.get("note").and_then(|n| n.as_str()).unwrap_or("");
            if config.failing_notes.iter().any(|f| f == note) {
                send_response(
                    &mut stream,
                    500,
                    "Internal Server Error",
                    r#"{"message": "Transaction rejected"}"#,
                );
                return;
            }

            let id = state.next_id.fetch_add(1, Ordering::SeqCst);
            if let Ok(mut created) = state.created.lock() {
                created.push((category_id, payload.clone()));
            }
            match &config.created_body {
                Some(body) => send_response(&mut stream, 201, "Created", body),
                None => {
                    payload["id"] = json!(id);
                    send_response(&mut stream, 201, "Created", &payload.to_string());
                }
            }
        }
        _ => {
            send_response(&mut stream, 404, "Not Found", r#"{"message": "Not found"}"#);
        }
    }
}

fn send_response(stream: &mut TcpStream, status: u16, status_text: &str, body: &str) {
    let response = format!(
        "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
        status,
        status_text,
        body.len(),
        body
    );
    let _ = stream.write_all(response.as_bytes());
    let _ = stream.flush();
}
