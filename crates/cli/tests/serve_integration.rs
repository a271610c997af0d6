//! Integration tests for the `lodgeflow serve` HTTP API.
//!
//! Each test starts the server as a child process on a unique port with a
//! seeded user directory, makes raw HTTP requests, and verifies responses.

use std::io::Read;
use std::net::TcpStream;
use std::process::{Child, Command};
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

/// Atomic port counter to avoid port conflicts between parallel tests.
/// Base port is derived from process ID so parallel `cargo test --workspace`
/// runs (separate test binaries) don't collide on the same port range.
static NEXT_PORT: AtomicU16 = AtomicU16::new(0);
static PORT_INIT: std::sync::Once = std::sync::Once::new();

fn next_port() -> u16 {
    PORT_INIT.call_once(|| {
        let base = 20000 + (std::process::id() as u16 % 20000);
        NEXT_PORT.store(base, Ordering::SeqCst);
    });
    NEXT_PORT.fetch_add(1, Ordering::SeqCst)
}

struct Server {
    child: Child,
    port: u16,
    _dir: tempfile::TempDir,
}

impl Drop for Server {
    fn drop(&mut self) {
        self.child.kill().ok();
        self.child.wait().ok();
    }
}

/// Start `lodgeflow serve` with a freshly seeded user directory.
fn start_server() -> Server {
    let port = next_port();
    let dir = tempfile::tempdir().expect("tempdir");
    let users = dir.path().join("users.json");

    let status = Command::new(env!("CARGO_BIN_EXE_lodgeflow"))
        .arg("seed")
        .arg("--out")
        .arg(&users)
        .status()
        .expect("failed to run lodgeflow seed");
    assert!(status.success(), "seed must succeed");

    let mut cmd = Command::new(env!("CARGO_BIN_EXE_lodgeflow"));
    cmd.arg("serve")
        .arg("--port")
        .arg(port.to_string())
        .arg("--users")
        .arg(&users);
    cmd.stdout(std::process::Stdio::piped());
    cmd.stderr(std::process::Stdio::piped());

    let child = cmd.spawn().expect("failed to start lodgeflow serve");
    for _ in 0..50 {
        if TcpStream::connect(format!("127.0.0.1:{port}")).is_ok() {
            return Server {
                child,
                port,
                _dir: dir,
            };
        }
        std::thread::sleep(Duration::from_millis(100));
    }
    Server {
        child,
        port,
        _dir: dir,
    }
}

/// Make a raw HTTP request and return (status, body).
fn http_request(
    port: u16,
    method: &str,
    path: &str,
    headers: &[(&str, &str)],
    body: Option<&str>,
) -> (u16, String) {
    let mut stream = TcpStream::connect(format!("127.0.0.1:{port}")).expect("failed to connect");
    stream
        .set_read_timeout(Some(Duration::from_secs(10)))
        .unwrap();

    let mut header_lines = String::new();
    for (name, value) in headers {
        header_lines.push_str(&format!("{name}: {value}\r\n"));
    }
    let body = body.unwrap_or("");
    if !body.is_empty() {
        header_lines.push_str("Content-Type: application/json\r\n");
    }
    header_lines.push_str(&format!("Content-Length: {}\r\n", body.len()));

    let request = format!(
        "{method} {path} HTTP/1.1\r\nHost: localhost:{port}\r\n{header_lines}Connection: close\r\n\r\n{body}"
    );
    std::io::Write::write_all(&mut stream, request.as_bytes()).expect("failed to write");

    let mut response = String::new();
    let _ = stream.read_to_string(&mut response);
    parse_http_response(&response)
}

fn get(port: u16, path: &str, user: &str) -> (u16, String) {
    http_request(port, "GET", path, &[("x-user-id", user)], None)
}

fn post(port: u16, path: &str, user: &str, body: &str) -> (u16, String) {
    http_request(port, "POST", path, &[("x-user-id", user)], Some(body))
}

fn put(port: u16, path: &str, user: &str, body: &str) -> (u16, String) {
    http_request(port, "PUT", path, &[("x-user-id", user)], Some(body))
}

/// Parse an HTTP response into (status_code, body).
fn parse_http_response(response: &str) -> (u16, String) {
    let parts: Vec<&str> = response.splitn(2, "\r\n\r\n").collect();
    let headers = parts.first().unwrap_or(&"").to_string();
    let body = parts.get(1).unwrap_or(&"").to_string();

    let status = headers
        .lines()
        .next()
        .unwrap_or("")
        .split_whitespace()
        .nth(1)
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(0);

    let body = if headers.contains("Transfer-Encoding: chunked") {
        decode_chunked(&body)
    } else {
        body
    };

    (status, body)
}

/// Decode chunked transfer encoding.
fn decode_chunked(data: &str) -> String {
    let mut result = String::new();
    let mut remaining = data;

    while let Some(line_end) = remaining.find("\r\n") {
        let size = match usize::from_str_radix(remaining[..line_end].trim(), 16) {
            Ok(s) => s,
            Err(_) => break,
        };
        if size == 0 {
            break;
        }
        let chunk_start = line_end + 2;
        let chunk_end = chunk_start + size;
        if chunk_end > remaining.len() {
            result.push_str(&remaining[chunk_start..]);
            break;
        }
        result.push_str(&remaining[chunk_start..chunk_end]);
        remaining = if chunk_end + 2 <= remaining.len() {
            &remaining[chunk_end + 2..]
        } else {
            ""
        };
    }

    result
}

const LEAVE_BODY: &str = r#"{"type":"LEAVE","start_date":"2026-07-06","end_date":"2026-07-08","reason":"annual leave","quantity":3}"#;

#[test]
fn health_returns_200_without_identity() {
    let server = start_server();

    let (status, body) = http_request(server.port, "GET", "/health", &[], None);

    assert_eq!(status, 200);
    let json: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
    assert_eq!(json["status"], "ok");
    assert_eq!(json["service"], "lodgeflow");
}

#[test]
fn missing_identity_header_returns_401() {
    let server = start_server();

    let (status, body) = http_request(server.port, "GET", "/requests/mine", &[], None);

    assert_eq!(status, 401);
    let json: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
    assert!(json.get("error").is_some());
}

#[test]
fn unknown_user_returns_403() {
    let server = start_server();

    let (status, _) = get(server.port, "/requests/mine", "ghost");

    assert_eq!(status, 403);
}

#[test]
fn unknown_collection_returns_404() {
    let server = start_server();

    let (status, _) = post(server.port, "/widgets", "staff.housekeeping", "{}");

    assert_eq!(status, 404);
}

#[test]
fn leave_request_full_approval_flow() {
    let server = start_server();
    let port = server.port;

    // Staff submits; the request enters at the HOD stage.
    let (status, body) = post(port, "/requests", "staff.housekeeping", LEAVE_BODY);
    assert_eq!(status, 201, "create failed: {body}");
    let entity: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
    assert_eq!(entity["status"], "PENDING_HOD");
    let id = entity["id"].as_str().expect("id").to_string();

    // It shows up in the department HOD's queue.
    let (status, body) = get(port, "/requests/pending", "hod.housekeeping");
    assert_eq!(status, 200);
    let queue: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
    assert_eq!(queue.as_array().expect("array").len(), 1);

    // HOD -> HR -> GM.
    let approve = r#"{"action":"APPROVE"}"#;
    let (status, body) = put(
        port,
        &format!("/requests/{id}/approval"),
        "hod.housekeeping",
        approve,
    );
    assert_eq!(status, 200, "HOD approval failed: {body}");
    let json: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
    assert_eq!(json["outcome"], "ADVANCED");
    assert_eq!(json["entity"]["status"], "PENDING_HR");

    let (status, _) = put(port, &format!("/requests/{id}/approval"), "hr", approve);
    assert_eq!(status, 200);

    let (status, body) = put(port, &format!("/requests/{id}/approval"), "gm", approve);
    assert_eq!(status, 200);
    let json: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
    assert_eq!(json["outcome"], "APPROVED");
    assert_eq!(json["entity"]["status"], "APPROVED");

    // The owner sees the approved request under /mine.
    let (status, body) = get(port, "/requests/mine", "staff.housekeeping");
    assert_eq!(status, 200);
    let mine: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
    assert_eq!(mine[0]["status"], "APPROVED");

    // Notification fan-out is asynchronous; poll the inbox.
    let mut inbox_len = 0;
    for _ in 0..50 {
        let (status, body) = get(port, "/notifications", "staff.housekeeping");
        assert_eq!(status, 200);
        let inbox: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
        inbox_len = inbox.as_array().expect("array").len();
        if inbox_len > 0 {
            break;
        }
        std::thread::sleep(Duration::from_millis(100));
    }
    assert!(inbox_len > 0, "owner should have been notified");

    let (status, _) = put(port, "/notifications/read-all", "staff.housekeeping", "{}");
    assert_eq!(status, 200);
    let (_, body) = get(port, "/notifications", "staff.housekeeping");
    let inbox: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
    assert!(inbox
        .as_array()
        .expect("array")
        .iter()
        .all(|n| n["read"] == true));
}

#[test]
fn rejection_without_reason_returns_400() {
    let server = start_server();
    let port = server.port;

    let (_, body) = post(port, "/requests", "staff.housekeeping", LEAVE_BODY);
    let entity: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
    let id = entity["id"].as_str().expect("id");

    let (status, body) = put(
        port,
        &format!("/requests/{id}/approval"),
        "hod.housekeeping",
        r#"{"action":"REJECT"}"#,
    );
    assert_eq!(status, 400, "bare rejection must be refused: {body}");

    let (status, body) = put(
        port,
        &format!("/requests/{id}/approval"),
        "hod.housekeeping",
        r#"{"action":"REJECT","reason":"no cover available"}"#,
    );
    assert_eq!(status, 200);
    let json: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
    assert_eq!(json["outcome"], "REJECTED");
    assert_eq!(json["entity"]["rejected_by"], "HOD");
}

#[test]
fn cross_department_hod_approval_returns_403() {
    let server = start_server();
    let port = server.port;

    let (_, body) = post(port, "/requests", "staff.housekeeping", LEAVE_BODY);
    let entity: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
    let id = entity["id"].as_str().expect("id");

    let (status, _) = put(
        port,
        &format!("/requests/{id}/approval"),
        "hod.cashier",
        r#"{"action":"APPROVE"}"#,
    );
    assert_eq!(status, 403);
}

#[test]
fn approval_under_wrong_collection_returns_404() {
    let server = start_server();
    let port = server.port;

    let (_, body) = post(port, "/requests", "staff.housekeeping", LEAVE_BODY);
    let entity: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
    let id = entity["id"].as_str().expect("id");

    let (status, _) = put(
        port,
        &format!("/procurements/{id}/approval"),
        "hod.housekeeping",
        r#"{"action":"APPROVE"}"#,
    );
    assert_eq!(status, 404);
}

#[test]
fn procurement_fulfillment_over_http() {
    let server = start_server();
    let port = server.port;

    let body = r#"{"items":[{"item_name":"detergent","quantity":4,"unit_price":"25.50","total_price":"102.00"}],"reason":"restock","total_price":"102.00"}"#;
    let (status, resp) = post(port, "/procurements", "staff.housekeeping", body);
    assert_eq!(status, 201, "create failed: {resp}");
    let entity: serde_json::Value = serde_json::from_str(&resp).expect("valid JSON");
    let id = entity["id"].as_str().expect("id").to_string();

    let approve = r#"{"action":"APPROVE"}"#;
    for user in ["hod.housekeeping", "spv", "finance", "gm"] {
        let (status, body) = put(port, &format!("/procurements/{id}/approval"), user, approve);
        assert_eq!(status, 200, "{user} approval failed: {body}");
    }

    // The storekeeper's queue holds the approved procurement.
    let (status, body) = get(port, "/procurements/pending", "store");
    assert_eq!(status, 200);
    let queue: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
    assert_eq!(queue.as_array().expect("array").len(), 1);

    let (status, body) = put(port, &format!("/procurements/{id}/approval"), "store", approve);
    assert_eq!(status, 200);
    let json: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
    assert_eq!(json["outcome"], "COMPLETED");
    assert_eq!(json["entity"]["status"], "COMPLETED");

    // Fulfilled procurements live in the store's history, not its queue.
    let (_, body) = get(port, "/procurements/pending", "store");
    let queue: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
    assert!(queue.as_array().expect("array").is_empty());
    let (_, body) = get(port, "/procurements/history", "store");
    let history: serde_json::Value = serde_json::from_str(&body).expect("valid JSON");
    assert_eq!(history.as_array().expect("array").len(), 1);
}

#[test]
fn staff_has_no_pending_queue() {
    let server = start_server();

    let (status, _) = get(server.port, "/requests/pending", "staff.housekeeping");

    assert_eq!(status, 403);
}
