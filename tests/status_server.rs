// tests/status_server.rs

mod common;
use crate::common::{http_get, init_tracing, with_timeout};

use std::io;
use std::net::{SocketAddr, TcpListener as StdTcpListener};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use axum::body::{Body, to_bytes};
use axum::http::{Request, StatusCode, header};
use serde_json::Value;
use tower::ServiceExt;

use kapo::config::ServerConfig;
use kapo::errors::KapoError;
use kapo::server::{
    ActivationSource, SnapshotSource, StatusServer, SystemdActivation, bind_listeners,
    build_router, SIDEBIND_ATTEMPTS,
};
use kapo::status::{Attempt, StatusRegistry};
use kapo::types::{Mode, RunState};

async fn get(source: Arc<dyn SnapshotSource>) -> (StatusCode, String, Vec<u8>) {
    let response = build_router(source)
        .oneshot(Request::builder().uri("/").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let content_type = response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, content_type, body.to_vec())
}

fn attempt(mode: Mode) -> Attempt {
    Attempt::new(mode, "/bin/sleep", vec!["1".to_string()])
}

/// Fails to encode once, then delegates.
struct FlakySource {
    inner: StatusRegistry,
    fail_next: AtomicBool,
}

impl SnapshotSource for FlakySource {
    fn render(&self) -> serde_json::Result<Vec<u8>> {
        if self.fail_next.swap(false, Ordering::SeqCst) {
            return Err(<serde_json::Error as serde::ser::Error>::custom("encoder exploded"));
        }
        self.inner.view().to_json()
    }
}

struct FixedActivation(usize);

impl ActivationSource for FixedActivation {
    fn listeners(&self) -> io::Result<Vec<StdTcpListener>> {
        (0..self.0).map(|_| StdTcpListener::bind("127.0.0.1:0")).collect()
    }
}

fn loopback(socket_activation: bool, sidebind: bool) -> ServerConfig {
    ServerConfig {
        bind: SocketAddr::from(([127, 0, 0, 1], 0)),
        socket_activation,
        sidebind,
    }
}

#[tokio::test]
async fn run_mode_serves_null_then_object() {
    let registry = StatusRegistry::for_mode(Mode::Run, None);
    let source: Arc<dyn SnapshotSource> = Arc::new(registry.view());

    let (status, content_type, body) = get(source.clone()).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(content_type, "application/json");
    assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), Value::Null);

    let id = registry.begin(attempt(Mode::Run).ttl(Duration::from_secs(3)));
    let (_, _, body) = get(source.clone()).await;
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["state"], "running");
    assert_eq!(json["mode"], "run");
    assert_eq!(json["ttl"], 3);
    assert_eq!(json["command"], "/bin/sleep");
    assert_eq!(json["arguments"], serde_json::json!(["1"]));
    assert!(json["endTime"].is_null());
    assert!(json["exitCode"].is_null());

    registry.finish(id, 0, RunState::Stopped);
    let (_, _, body) = get(source).await;
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["state"], "stopped");
    assert_eq!(json["exitCode"], 0);
    assert!(json["endTime"].is_string());
}

#[tokio::test]
async fn supervise_mode_serves_array() {
    let registry = StatusRegistry::for_mode(Mode::Supervise, None);
    let source: Arc<dyn SnapshotSource> = Arc::new(registry.view());

    let (_, _, body) = get(source.clone()).await;
    assert_eq!(serde_json::from_slice::<Value>(&body).unwrap(), serde_json::json!([]));

    registry.record_terminal(attempt(Mode::Supervise), 1, RunState::Stopped);
    registry.begin(attempt(Mode::Supervise));

    let (_, _, body) = get(source).await;
    let json: Value = serde_json::from_slice(&body).unwrap();
    let records = json.as_array().unwrap();
    assert_eq!(records.len(), 2);
    assert_eq!(records[0]["exitCode"], 1);
    assert_eq!(records[1]["state"], "running");
}

#[tokio::test]
async fn unknown_path_is_404() {
    let registry = StatusRegistry::for_mode(Mode::Run, None);
    let response = build_router(Arc::new(registry.view()))
        .oneshot(Request::builder().uri("/status").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn unchanged_registry_gives_identical_bodies() {
    let registry = StatusRegistry::for_mode(Mode::Supervise, None);
    registry.record_terminal(attempt(Mode::Supervise), 0, RunState::Stopped);
    let source: Arc<dyn SnapshotSource> = Arc::new(registry.view());

    let (_, _, first) = get(source.clone()).await;
    let (_, _, second) = get(source).await;
    assert_eq!(first, second);
}

#[tokio::test]
async fn encoding_failure_is_500_and_server_keeps_serving() {
    init_tracing();
    let source = Arc::new(FlakySource {
        inner: StatusRegistry::for_mode(Mode::Run, None),
        fail_next: AtomicBool::new(true),
    });

    let (status, content_type, body) = get(source.clone()).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert!(content_type.starts_with("text/plain"));
    assert!(String::from_utf8_lossy(&body).contains("encoder exploded"));

    let (status, _, _) = get(source).await;
    assert_eq!(status, StatusCode::OK);
}

#[test]
fn concurrent_readers_never_see_torn_records() {
    let registry = StatusRegistry::for_mode(Mode::Supervise, Some(8));
    let view = registry.view();

    let writer = std::thread::spawn(move || {
        for code in 0..500 {
            let id = registry.begin(attempt(Mode::Supervise));
            registry.finish(id, code, RunState::Stopped);
        }
    });

    let readers: Vec<_> = (0..4)
        .map(|_| {
            let view = view.clone();
            std::thread::spawn(move || {
                for _ in 0..200 {
                    let json: Value = serde_json::from_slice(&view.to_json().unwrap()).unwrap();
                    for record in json.as_array().unwrap() {
                        let running = record["state"] == "running";
                        assert_eq!(running, record["endTime"].is_null());
                        assert_eq!(running, record["exitCode"].is_null());
                    }
                }
            })
        })
        .collect();

    writer.join().unwrap();
    for reader in readers {
        reader.join().unwrap();
    }
}

#[tokio::test]
async fn activation_requires_exactly_one_listener() {
    for count in [0, 2] {
        let err = bind_listeners(&loopback(true, false), &FixedActivation(count))
            .await
            .unwrap_err();
        assert!(
            matches!(err, KapoError::SocketActivation { count: c } if c == count),
            "unexpected error: {err:?}"
        );
    }
}

#[tokio::test]
async fn activated_listener_serves_status() {
    let registry = StatusRegistry::for_mode(Mode::Run, None);
    registry.record_terminal(attempt(Mode::Run), 4, RunState::Stopped);

    let listeners = bind_listeners(&loopback(true, false), &FixedActivation(1))
        .await
        .unwrap();
    assert_eq!(listeners.len(), 1);

    let server = StatusServer::spawn(listeners, Arc::new(registry.view()));
    let addr = server.local_addrs()[0];
    let (status, head, body) = with_timeout(http_get(addr, "/")).await;
    assert_eq!(status, 200);
    assert!(head.to_ascii_lowercase().contains("content-type: application/json"));
    let json: Value = serde_json::from_slice(&body).unwrap();
    assert_eq!(json["exitCode"], 4);
}

#[tokio::test]
async fn sidebind_adds_listener_above_primary() {
    let registry = StatusRegistry::for_mode(Mode::Supervise, None);
    let listeners = bind_listeners(&loopback(false, true), &SystemdActivation)
        .await
        .unwrap();
    assert_eq!(listeners.len(), 2);

    let primary = listeners[0].local_addr().unwrap().port();
    let side = listeners[1].local_addr().unwrap().port();
    assert!(side > primary && side <= primary + SIDEBIND_ATTEMPTS);

    let server = StatusServer::spawn(listeners, Arc::new(registry.view()));
    for addr in server.local_addrs().to_vec() {
        let (status, _, body) = with_timeout(http_get(addr, "/")).await;
        assert_eq!(status, 200);
        assert_eq!(body, b"[]");
    }
}

#[tokio::test]
async fn aborted_server_stops_accepting() {
    let registry = StatusRegistry::for_mode(Mode::Run, None);
    let listeners = bind_listeners(&loopback(false, false), &SystemdActivation)
        .await
        .unwrap();
    let server = StatusServer::spawn(listeners, Arc::new(registry.view()));
    let addr = server.local_addrs()[0];

    let (status, _, body) = with_timeout(http_get(addr, "/")).await;
    assert_eq!(status, 200);
    assert_eq!(body, b"null");

    server.abort();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert!(tokio::net::TcpStream::connect(addr).await.is_err());
}

#[cfg(target_os = "linux")]
mod inherited_listener {
    use std::os::unix::io::{AsRawFd, FromRawFd, OwnedFd, RawFd};
    use std::process::Command;

    use nix::fcntl::{FcntlArg, FdFlag, fcntl};
    use nix::unistd::dup;

    use kapo::server::adopt_inherited;

    use super::*;

    fn visible_to_child(fd: RawFd) -> bool {
        Command::new("sh")
            .arg("-c")
            .arg(format!("test -e /proc/$$/fd/{fd}"))
            .status()
            .unwrap()
            .success()
    }

    #[test]
    fn adopted_descriptor_is_closed_on_exec() {
        let original = StdTcpListener::bind("127.0.0.1:0").unwrap();
        // dup(2) clears FD_CLOEXEC, like a descriptor passed across exec.
        let raw = dup(original.as_raw_fd()).unwrap();
        let flags = FdFlag::from_bits_truncate(fcntl(raw, FcntlArg::F_GETFD).unwrap());
        assert!(!flags.contains(FdFlag::FD_CLOEXEC));
        assert!(visible_to_child(raw));

        let adopted = adopt_inherited(unsafe { OwnedFd::from_raw_fd(raw) }).unwrap();

        let flags = FdFlag::from_bits_truncate(fcntl(raw, FcntlArg::F_GETFD).unwrap());
        assert!(flags.contains(FdFlag::FD_CLOEXEC));
        assert!(!visible_to_child(raw), "child inherited the status listener");
        assert_eq!(adopted.local_addr().unwrap(), original.local_addr().unwrap());
    }
}
