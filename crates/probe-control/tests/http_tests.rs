//! HTTP control-plane client tests against a local fake control plane

use probe_control::{
    ControlError, ControlPlane, HttpControlPlane, HttpControlPlaneConfig, NodeParams, SubResult,
    SubResultDetails, PROVISION_ATTEMPTS,
};
use probe_model::TestStatus;
use axum::extract::State;
use axum::http::{Method, StatusCode, Uri};
use axum::Router;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::Mutex;

#[derive(Debug, Clone)]
struct Recorded {
    method: String,
    target: String,
    body: String,
}

type Route = Arc<dyn Fn(&str, &str) -> (u16, String) + Send + Sync>;

#[derive(Clone)]
struct FakeState {
    route: Route,
    seen: Arc<Mutex<Vec<Recorded>>>,
}

/// Answers every request from the route table and records it
async fn record(
    State(state): State<FakeState>,
    method: Method,
    uri: Uri,
    body: String,
) -> (StatusCode, String) {
    let target = uri
        .path_and_query()
        .map(|pq| pq.as_str().to_string())
        .unwrap_or_else(|| uri.path().to_string());
    let (status, payload) = (state.route)(method.as_str(), &target);
    state.seen.lock().await.push(Recorded {
        method: method.to_string(),
        target,
        body,
    });
    (StatusCode::from_u16(status).unwrap(), payload)
}

/// Fake control plane on an ephemeral port, recording what it saw
async fn fake_control_plane<F>(route: F) -> (String, Arc<Mutex<Vec<Recorded>>>)
where
    F: Fn(&str, &str) -> (u16, String) + Send + Sync + 'static,
{
    let seen = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new().fallback(record).with_state(FakeState {
        route: Arc::new(route),
        seen: Arc::clone(&seen),
    });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move { axum::serve(listener, app).await });

    (base, seen)
}

fn plane(base: &str) -> HttpControlPlane {
    let mut config = HttpControlPlaneConfig::new(base);
    config.provision_timeout = Duration::from_secs(5);
    HttpControlPlane::new(config).unwrap()
}

#[tokio::test]
async fn test_start_node_resolves_address() {
    let (base, seen) = fake_control_plane(|method, target| match (method, target) {
        ("POST", t) if t.starts_with("/nodes") => (200, "node-abc\n".to_string()),
        ("GET", "/nodes/node-abc") => (200, "172.17.0.5".to_string()),
        _ => (404, "not found".to_string()),
    })
    .await;

    let mut params = NodeParams::new();
    params.set("HIVE_FORK_HOMESTEAD", "0").set("HIVE_INIT_GENESIS", "/tmp/g.json");
    let node = plane(&base).new_node(&params).await.unwrap();
    assert_eq!(node.id(), "node-abc");
    assert_eq!(node.address(), "172.17.0.5");

    let seen = seen.lock().await;
    assert_eq!(seen.len(), 2);
    assert!(seen[0].target.contains("HIVE_FORK_HOMESTEAD=0"));
    assert!(seen[0].target.contains("HIVE_INIT_GENESIS=%2Ftmp%2Fg.json"));
}

#[tokio::test]
async fn test_start_node_retries_then_fails() {
    let (base, seen) = fake_control_plane(|method, target| match (method, target) {
        ("POST", "/logs") => (200, String::new()),
        _ => (500, "docker unavailable".to_string()),
    })
    .await;

    let err = plane(&base).new_node(&NodeParams::new()).await.unwrap_err();
    match err {
        ControlError::Provision { attempts, last } => {
            assert_eq!(attempts, PROVISION_ATTEMPTS);
            assert!(matches!(*last, ControlError::Status { status: 500, .. }));
        }
        other => panic!("unexpected error: {other}"),
    }

    let seen = seen.lock().await;
    let creates = seen.iter().filter(|r| r.target.starts_with("/nodes")).count();
    assert_eq!(creates, PROVISION_ATTEMPTS as usize);
}

#[tokio::test]
async fn test_subresult_encoding() {
    let (base, seen) = fake_control_plane(|_, _| (200, String::new())).await;

    let result = SubResult {
        name: "suite.json:case".to_string(),
        success: false,
        error: Some("Preconditions failed".to_string()),
        details: SubResultDetails {
            instanceid: Some("node-1".to_string()),
            errors: vec!["Preconditions failed".into()],
            ms: Some(12),
            status: TestStatus::Failed,
            client: None,
        },
    };
    plane(&base).subresult(&result).await.unwrap();

    let seen = seen.lock().await;
    let request = &seen[0];
    assert_eq!(request.method, "POST");
    assert!(request.target.starts_with("/subresults?"));
    assert!(request.target.contains("name=suite.json%3Acase"));
    assert!(request.target.contains("success=false"));
    assert!(request.target.contains("error=Preconditions+failed"));
    assert!(request.body.starts_with("details="));
    assert!(request.body.contains("instanceid"));
}

#[tokio::test]
async fn test_log_and_kill() {
    let (base, seen) = fake_control_plane(|method, _| match method {
        "DELETE" => (500, "already gone".to_string()),
        _ => (200, String::new()),
    })
    .await;
    let plane = plane(&base);

    plane.log("Commencing testfile").await.unwrap();
    let node = probe_rpc::NodeHandle::new("node-9", "127.0.0.1", probe_rpc::MockTransport::new());
    assert!(plane.kill_node(&node).await.is_err());
    // best-effort variant swallows the failure
    plane.release(&node).await;

    let seen = seen.lock().await;
    assert_eq!(seen[0].target, "/logs");
    assert_eq!(seen[0].body, "Commencing testfile");
    assert_eq!(seen[1].method, "DELETE");
    assert_eq!(seen[1].target, "/nodes/node-9");
}

#[tokio::test]
async fn test_list_client_types() {
    let (base, _) = fake_control_plane(|_, target| match target {
        "/clients" => (200, r#"["go-ethereum", "besu"]"#.to_string()),
        _ => (404, String::new()),
    })
    .await;
    let clients = plane(&base).list_client_types().await.unwrap();
    assert_eq!(clients, vec!["go-ethereum", "besu"]);
}
