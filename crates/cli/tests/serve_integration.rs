//! Integration tests for the `approvals serve` HTTP API.
//!
//! Each test starts the server as a child process on a unique port, seeded
//! from the demo fixture, makes HTTP requests, and verifies the responses.

use std::io::Read;
use std::net::TcpStream;
use std::path::PathBuf;
use std::process::{Child, Command};
use std::sync::atomic::{AtomicU16, Ordering};
use std::time::Duration;

use serde_json::Value;

/// Atomic port counter to avoid port conflicts between parallel tests.
/// Base port is derived from process ID so separate test binaries don't
/// collide on the same port range.
static NEXT_PORT: AtomicU16 = AtomicU16::new(0);
static PORT_INIT: std::sync::Once = std::sync::Once::new();

fn next_port() -> u16 {
    PORT_INIT.call_once(|| {
        let base = 20000 + (std::process::id() as u16 % 20000);
        NEXT_PORT.store(base, Ordering::SeqCst);
    });
    NEXT_PORT.fetch_add(1, Ordering::SeqCst)
}

fn demo_fixture() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("fixtures")
        .join("demo.json")
}

/// A running server, killed when dropped.
struct Server {
    port: u16,
    child: Child,
}

impl Drop for Server {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}

fn start_server() -> Server {
    let port = next_port();
    let mut cmd = Command::new(env!("CARGO_BIN_EXE_approvals"));
    cmd.arg("serve")
        .arg("--port")
        .arg(port.to_string())
        .arg("--fixture")
        .arg(demo_fixture())
        .env("RUST_LOG", "warn")
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null());

    let child = cmd.spawn().expect("failed to start approvals serve");
    // Wait for server to be ready by polling the port
    for _ in 0..50 {
        if TcpStream::connect(format!("127.0.0.1:{port}")).is_ok() {
            break;
        }
        std::thread::sleep(Duration::from_millis(100));
    }
    Server { port, child }
}

/// Make an HTTP request, optionally as a remote user, and return
/// (status, parsed JSON body).
fn request(
    server: &Server,
    method: &str,
    path: &str,
    remote_user: Option<&str>,
    body: Option<&Value>,
) -> (u16, Value) {
    let mut stream =
        TcpStream::connect(format!("127.0.0.1:{}", server.port)).expect("failed to connect");
    stream
        .set_read_timeout(Some(Duration::from_secs(5)))
        .unwrap();

    let mut headers = String::new();
    if let Some(user) = remote_user {
        headers.push_str(&format!("X-Remote-User: {user}\r\n"));
    }
    let payload = body.map(|b| b.to_string()).unwrap_or_default();
    if body.is_some() {
        headers.push_str("Content-Type: application/json\r\n");
    }
    headers.push_str(&format!("Content-Length: {}\r\n", payload.len()));

    let request = format!(
        "{method} {path} HTTP/1.1\r\nHost: localhost:{}\r\n{headers}Connection: close\r\n\r\n{payload}",
        server.port
    );
    std::io::Write::write_all(&mut stream, request.as_bytes()).expect("failed to write");

    let mut response = String::new();
    let _ = stream.read_to_string(&mut response);
    let (status, body) = parse_http_response(&response);
    let json = serde_json::from_str(&body).unwrap_or(Value::Null);
    (status, json)
}

fn get(server: &Server, path: &str, remote_user: &str) -> (u16, Value) {
    request(server, "GET", path, Some(remote_user), None)
}

fn post(server: &Server, path: &str, remote_user: &str, body: Value) -> (u16, Value) {
    request(server, "POST", path, Some(remote_user), Some(&body))
}

/// Parse an HTTP response into (status_code, body).
fn parse_http_response(response: &str) -> (u16, String) {
    let (headers, body) = response.split_once("\r\n\r\n").unwrap_or((response, ""));
    let status = headers
        .lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .and_then(|s| s.parse::<u16>().ok())
        .unwrap_or(0);

    let body = if headers
        .to_ascii_lowercase()
        .contains("transfer-encoding: chunked")
    {
        decode_chunked(body)
    } else {
        body.to_string()
    };
    (status, body)
}

/// Decode chunked transfer encoding.
fn decode_chunked(data: &str) -> String {
    let mut result = String::new();
    let mut remaining = data;

    while let Some(line_end) = remaining.find("\r\n") {
        let size = match usize::from_str_radix(remaining[..line_end].trim(), 16) {
            Ok(0) | Err(_) => break,
            Ok(s) => s,
        };
        let chunk_start = line_end + 2;
        let chunk_end = (chunk_start + size).min(remaining.len());
        result.push_str(&remaining[chunk_start..chunk_end]);
        remaining = remaining.get(chunk_end + 2..).unwrap_or("");
    }

    result
}

// ──────────────────────────────────────────────
// 1. Health and identity
// ──────────────────────────────────────────────

#[test]
fn health_needs_no_identity() {
    let server = start_server();
    let (status, body) = request(&server, "GET", "/health", None, None);
    assert_eq!(status, 200);
    assert_eq!(body["status"], "ok");
}

#[test]
fn missing_remote_user_is_unauthorized() {
    let server = start_server();
    let (status, body) = request(&server, "GET", "/process?ids=1", None, None);
    assert_eq!(status, 401);
    assert!(body["error"].is_string());
}

#[test]
fn unknown_person_is_unauthorized() {
    let server = start_server();
    let (status, _) = get(&server, "/people/self", "PNL\\nobody");
    assert_eq!(status, 401);
}

#[test]
fn known_person_resolves_with_or_without_domain() {
    let server = start_server();
    for user in ["PNL\\d3m001", "d3m001"] {
        let (status, body) = get(&server, "/people/self", user);
        assert_eq!(status, 200, "{user}");
        assert_eq!(body["id"], "1000001");
        assert_eq!(body["network"]["username"], "d3m001");
    }
}

#[test]
fn unknown_service_account_is_network_only() {
    let server = start_server();
    let (status, body) = get(&server, "/people/self", "PNL\\msaReport$");
    assert_eq!(status, 200);
    assert!(body["id"].is_null());
    assert_eq!(body["network"]["username"], "msaReport$");
}

// ──────────────────────────────────────────────
// 2. Processes
// ──────────────────────────────────────────────

#[test]
fn processes_by_id() {
    let server = start_server();
    let (status, body) = get(&server, "/process?ids=1,2", "d3m001");
    assert_eq!(status, 200);
    assert_eq!(body["total"], 2);
    assert_eq!(body["items"][0]["processState"], "PENDING");
}

#[test]
fn oversized_page_is_bad_request() {
    let server = start_server();
    let (status, _) = get(&server, "/process?ids=1&limit=500", "d3m001");
    assert_eq!(status, 400);
}

#[test]
fn non_numeric_id_is_bad_request() {
    let server = start_server();
    let (status, _) = get(&server, "/process?ids=one", "d3m001");
    assert_eq!(status, 400);
}

#[test]
fn terminating_an_approved_process_conflicts() {
    let server = start_server();
    let (status, body) = post(&server, "/process/2/terminate", "d3s001", Value::Null);
    assert_eq!(status, 409, "{body}");
}

#[test]
fn super_user_terminates_pending_process() {
    let server = start_server();
    let (status, body) = request(
        &server,
        "POST",
        "/process/1/terminate?terminateNoStatusing=true",
        Some("PNL\\d3s001"),
        None,
    );
    assert_eq!(status, 200, "{body}");
    assert_eq!(body["state"], "TERMINATED");
    assert_eq!(
        body["status"],
        "Travel Request'- TR-2024-001': TERMINATED by: 3000001"
    );
}

#[test]
fn originator_cannot_terminate() {
    let server = start_server();
    let (status, _) = request(&server, "POST", "/process/1/terminate", Some("d3m001"), None);
    assert_eq!(status, 403);
}

#[test]
fn create_routing_returns_the_new_process() {
    let server = start_server();
    let item = serde_json::json!({
        "documentTypeName": "Purchase Request",
        "applicationItemId": 7,
        "documentId": "PR-2024-100",
        "documentTitle": "Microscope",
        "originatorHanfordId": "1000001",
        "beneficiaryHanfordId": "1000001",
        "submitUserHanfordId": "1000001"
    });
    let (status, body) = post(&server, "/process", "d3m001", item);
    assert_eq!(status, 200, "{body}");
    assert_eq!(body["processState"], "PENDING");
    assert_eq!(body["documentId"], "PR-2024-100");
}

#[test]
fn invalid_routing_item_is_bad_request() {
    let server = start_server();
    let item = serde_json::json!({
        "documentTypeName": "Purchase Request",
        "documentId": "PR-2024-101",
        "documentTitle": "Microscope",
        "originatorHanfordId": "1",
        "beneficiaryHanfordId": "1000001",
        "submitUserHanfordId": "1000001"
    });
    let (status, body) = post(&server, "/process", "d3m001", item);
    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap().contains("ApplicationItemId"));
}

// ──────────────────────────────────────────────
// 3. Search
// ──────────────────────────────────────────────

#[test]
fn own_originator_search() {
    let server = start_server();
    let (status, body) = get(&server, "/process/filter?originatorIds=1000001", "d3m001");
    assert_eq!(status, 200, "{body}");
    assert_eq!(body["total"], 2);
}

#[test]
fn own_actor_search_filters_by_process_state() {
    let server = start_server();
    let (status, body) = get(
        &server,
        "/process/filter?actorIds=2000003&processStates=approved",
        "d3m003",
    );
    assert_eq!(status, 200, "{body}");
    assert_eq!(body["total"], 1);
    assert_eq!(body["items"][0]["processId"], 2);
}

#[test]
fn user_search_is_limited_to_readable_types() {
    let server = start_server();
    // 3000002 reads Travel Request (read-only) and Purchase Request (developer)
    let (_, all) = get(&server, "/process/filter", "d3r002");
    assert_eq!(all["total"], 2);

    let (status, body) = get(&server, "/process/filter?docTypes=Purchase%20Request", "d3r002");
    assert_eq!(status, 200);
    assert_eq!(body["total"], 1);

    // 1000001 holds no definition role
    let (_, none) = get(&server, "/process/filter?originatorIds=2000002", "d3m001");
    assert_eq!(none["total"], 0);
}

#[test]
fn day_count_beyond_the_calendar_is_bad_request() {
    let server = start_server();
    let (status, body) = get(
        &server,
        "/process/filter?createDays=9223372036854775807",
        "d3m001",
    );
    assert_eq!(status, 400, "{body}");
    assert!(body["error"].as_str().unwrap().contains("too far back"));

    let (status, _) = get(&server, "/process/filter?lastDays=0", "d3m001");
    assert_eq!(status, 400);
}

#[test]
fn process_metadata_is_grouped_by_process() {
    let server = start_server();
    let (status, body) = get(&server, "/process/metadata?processIds=2,1,99", "d3m001");
    assert_eq!(status, 200, "{body}");
    assert_eq!(body["total"], 2);
    assert_eq!(body["items"][0]["processId"], 1);
    assert_eq!(body["items"][0]["nodes"][0]["nodeName"], "Destination");
    assert_eq!(body["items"][0]["nodes"][1]["nodeLabel"], "Trip Start");
    assert_eq!(body["items"][1]["nodes"][0]["nodeValue"], "1249.99");
}

#[test]
fn process_metadata_needs_ids() {
    let server = start_server();
    let (status, body) = get(&server, "/process/metadata", "d3m001");
    assert_eq!(status, 400);
    assert!(body["error"].as_str().unwrap().contains("processIds"));

    let (status, _) = get(&server, "/process/metadata?processIds=1&limit=101", "d3m001");
    assert_eq!(status, 400);
}

// ──────────────────────────────────────────────
// 4. Activities
// ──────────────────────────────────────────────

fn accept(activity_id: i64, actor: &str) -> Value {
    serde_json::json!({
        "processId": 1,
        "activityId": activity_id,
        "actorHanfordId": actor,
        "actionTaken": "ACCEPT",
        "comment": "looks good"
    })
}

#[test]
fn actor_accepts_and_the_next_activity_becomes_pending() {
    let server = start_server();
    let (status, body) = post(&server, "/activity", "d3m002", accept(10, "2000002"));
    assert_eq!(status, 200, "{body}");
    assert_eq!(body["processState"], "PENDING");
    assert_eq!(body["activities"]["10"]["activityState"], "COMPLETE");
    assert_eq!(body["activities"]["11"]["activityState"], "PENDING");

    let (status, activities) = get(&server, "/activity?ids=10,11", "d3m002");
    assert_eq!(status, 200);
    assert_eq!(activities["total"], 2);
}

#[test]
fn acting_for_someone_else_is_forbidden() {
    let server = start_server();
    let (status, _) = post(&server, "/activity", "d3m001", accept(10, "2000002"));
    assert_eq!(status, 403);
}

#[test]
fn change_account_acts_for_the_actor() {
    let server = start_server();
    let (status, body) = post(&server, "/activity", "PNL\\msaTravel$", accept(10, "2000002"));
    assert_eq!(status, 200, "{body}");
}

#[test]
fn acting_on_an_unreached_activity_conflicts() {
    let server = start_server();
    let (status, _) = post(&server, "/activity", "d3m003", accept(11, "2000003"));
    assert_eq!(status, 409);
}

// ──────────────────────────────────────────────
// 5. Person identification
// ──────────────────────────────────────────────

#[test]
fn person_lookups() {
    let server = start_server();
    let (status, body) = get(&server, "/personidentification/hanfordid?id=2000002", "d3m001");
    assert_eq!(status, 200);
    assert_eq!(body["networkId"], "d3m002");

    let (status, body) = get(
        &server,
        "/personidentification/networkid?domain=PNL&id=D3M003",
        "d3m001",
    );
    assert_eq!(status, 200);
    assert_eq!(body["hanfordId"], "2000003");

    let (status, _) = get(&server, "/personidentification/id?id=E3001", "d3m001");
    assert_eq!(status, 200);

    let (status, _) = get(&server, "/personidentification/employeeid?id=E9999", "d3m001");
    assert_eq!(status, 404);

    let (status, _) = get(&server, "/personidentification/hanfordid", "d3m001");
    assert_eq!(status, 400);
}
