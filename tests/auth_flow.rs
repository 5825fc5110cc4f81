//! Auth flow tests against a scripted local HTTP responder.
//!
//! The responder answers each request with the next canned response and
//! records the request line, so the tests can assert both the outcome and
//! the exact sequence of calls.

use pttlink::auth::{self, AuthError, Credentials};
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::{TcpListener, TcpStream};

struct ScriptedHttp {
    base_url: String,
    seen: Arc<Mutex<Vec<String>>>,
}

impl ScriptedHttp {
    async fn start(responses: Vec<(u16, &'static str)>) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());
        let seen: Arc<Mutex<Vec<String>>> = Arc::new(Mutex::new(Vec::new()));
        let queue: Arc<Mutex<VecDeque<(u16, &'static str)>>> =
            Arc::new(Mutex::new(responses.into_iter().collect()));

        let seen_writer = seen.clone();
        tokio::spawn(async move {
            loop {
                let Ok((mut sock, _)) = listener.accept().await else {
                    return;
                };
                let Some((status, body)) = queue.lock().unwrap().pop_front() else {
                    return;
                };
                let Some(request_line) = read_request(&mut sock).await else {
                    return;
                };
                seen_writer.lock().unwrap().push(request_line);

                let reason = match status {
                    200 => "OK",
                    201 => "Created",
                    401 => "Unauthorized",
                    _ => "Error",
                };
                let response = format!(
                    "HTTP/1.1 {} {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                    status,
                    reason,
                    body.len(),
                    body
                );
                let _ = sock.write_all(response.as_bytes()).await;
                let _ = sock.shutdown().await;
            }
        });

        Self { base_url, seen }
    }

    fn seen(&self) -> Vec<String> {
        self.seen.lock().unwrap().clone()
    }
}

/// Read one HTTP request (headers + Content-Length body) and return its
/// request line.
async fn read_request(sock: &mut TcpStream) -> Option<String> {
    let mut buf = Vec::new();
    let mut tmp = [0u8; 1024];
    loop {
        let n = sock.read(&mut tmp).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&tmp[..n]);
        if let Some(pos) = buf.windows(4).position(|w| w == b"\r\n\r\n") {
            let head = String::from_utf8_lossy(&buf[..pos]).to_string();
            let content_length = head
                .lines()
                .find_map(|line| {
                    let (name, value) = line.split_once(':')?;
                    name.eq_ignore_ascii_case("content-length")
                        .then(|| value.trim().parse::<usize>().ok())?
                })
                .unwrap_or(0);
            let body_end = pos + 4 + content_length;
            while buf.len() < body_end {
                let n = sock.read(&mut tmp).await.ok()?;
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&tmp[..n]);
            }
            return Some(head.lines().next().unwrap_or("").to_string());
        }
    }
}

fn test_credentials() -> Credentials {
    Credentials::from_hardware_id("a1b2c3d4e5f6")
}

#[tokio::test]
async fn login_and_device_lookup_succeed() {
    let server = ScriptedHttp::start(vec![
        (200, r#"{"access_token":"tok-1"}"#),
        (200, r#"{"deviceId":"dev-9"}"#),
    ])
    .await;

    let client = reqwest::Client::new();
    let session = auth::authenticate(&client, &server.base_url, &test_credentials())
        .await
        .unwrap();

    assert_eq!(session.token, "tok-1");
    assert_eq!(session.device_id, "dev-9");

    let seen = server.seen();
    assert_eq!(seen.len(), 2);
    assert!(seen[0].starts_with("POST /token"));
    assert!(seen[1].starts_with("GET /devices/me"));
}

#[tokio::test]
async fn unauthorized_registers_once_and_retries() {
    let server = ScriptedHttp::start(vec![
        (401, "{}"),
        (201, "{}"),
        (200, r#"{"access_token":"tok-2"}"#),
        (200, r#"{"deviceId":"dev-2"}"#),
    ])
    .await;

    let client = reqwest::Client::new();
    let session = auth::authenticate(&client, &server.base_url, &test_credentials())
        .await
        .unwrap();
    assert_eq!(session.device_id, "dev-2");

    let seen = server.seen();
    assert_eq!(seen.len(), 4);
    assert!(seen[0].starts_with("POST /token"));
    assert!(seen[1].starts_with("POST /register"));
    assert!(seen[2].starts_with("POST /token"));
    assert!(seen[3].starts_with("GET /devices/me"));
}

#[tokio::test]
async fn failed_registration_stops_the_flow() {
    let server = ScriptedHttp::start(vec![(401, "{}"), (500, "{}")]).await;

    let client = reqwest::Client::new();
    let err = auth::authenticate(&client, &server.base_url, &test_credentials())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::RegisterFailed(500)));

    // No second token request after the registration failure.
    let seen = server.seen();
    assert_eq!(seen.len(), 2);
    assert!(seen[1].starts_with("POST /register"));
}

#[tokio::test]
async fn failed_retry_after_registration_is_final() {
    let server = ScriptedHttp::start(vec![(401, "{}"), (200, "{}"), (401, "{}")]).await;

    let client = reqwest::Client::new();
    let err = auth::authenticate(&client, &server.base_url, &test_credentials())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::LoginFailedAfterRegister));
    assert_eq!(server.seen().len(), 3);
}

#[tokio::test]
async fn unexpected_token_status_is_reported() {
    let server = ScriptedHttp::start(vec![(503, "{}")]).await;

    let client = reqwest::Client::new();
    let err = auth::authenticate(&client, &server.base_url, &test_credentials())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::TokenRequestFailed(503)));
}

#[tokio::test]
async fn failed_device_lookup_is_reported() {
    let server = ScriptedHttp::start(vec![
        (200, r#"{"access_token":"tok-3"}"#),
        (500, "{}"),
    ])
    .await;

    let client = reqwest::Client::new();
    let err = auth::authenticate(&client, &server.base_url, &test_credentials())
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::DeviceLookupFailed(500)));
}
