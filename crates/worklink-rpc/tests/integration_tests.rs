//! Integration tests for the worklink-rpc JSON-RPC server.
//!
//! These tests spawn the real binary against a temp data directory and drive
//! the full client -> admin -> student -> payment -> delivery flow over HTTP.

use serde_json::{json, Value};
use std::path::PathBuf;
use std::process::Stdio;
use std::time::Duration;
use tempfile::TempDir;
use tokio::io::AsyncBufReadExt;

const ADMIN_EMAIL: &str = "root@worklink.test";
const ADMIN_PASSWORD: &str = "super-secret-admin";

/// Make an RPC call to the server, unwrapping the JSON-RPC result.
async fn rpc_call(port: u16, method: &str, params: Value) -> Result<Value, String> {
    let json = rpc_call_raw(port, method, params).await?;
    if let Some(error) = json.get("error") {
        return Err(error.to_string());
    }
    Ok(json.get("result").cloned().unwrap_or(Value::Null))
}

/// Make an RPC call and return the full JSON-RPC payload.
async fn rpc_call_raw(port: u16, method: &str, params: Value) -> Result<Value, String> {
    let client = reqwest::Client::new();
    let response = client
        .post(format!("http://127.0.0.1:{}/rpc", port))
        .json(&json!({
            "jsonrpc": "2.0",
            "method": method,
            "params": params,
            "id": 1
        }))
        .timeout(Duration::from_secs(10))
        .send()
        .await
        .map_err(|e| e.to_string())?;

    response.json::<Value>().await.map_err(|e| e.to_string())
}

/// Check health endpoint.
async fn check_health(port: u16) -> bool {
    let client = reqwest::Client::new();
    if let Ok(response) = client
        .get(format!("http://127.0.0.1:{}/health", port))
        .timeout(Duration::from_secs(5))
        .send()
        .await
    {
        if let Ok(json) = response.json::<Value>().await {
            return json.get("status").and_then(|v| v.as_str()) == Some("ok");
        }
    }
    false
}

/// Wait for server to be ready.
async fn wait_for_server(port: u16, timeout_secs: u64) -> bool {
    let start = std::time::Instant::now();
    while start.elapsed() < Duration::from_secs(timeout_secs) {
        if check_health(port).await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }
    false
}

struct RpcServerHandle {
    child: tokio::process::Child,
    port: u16,
    stdout_drain: Option<tokio::task::JoinHandle<()>>,
    _data_dir: TempDir,
}

impl Drop for RpcServerHandle {
    fn drop(&mut self) {
        if let Some(drain) = self.stdout_drain.take() {
            drain.abort();
        }
        let _ = self.child.start_kill();
    }
}

/// Start the RPC binary against a fresh temp directory and wait for `/health`.
async fn start_rpc_server() -> Result<RpcServerHandle, String> {
    let data_dir = TempDir::new().map_err(|e| e.to_string())?;

    let binary = if let Ok(path) = std::env::var("CARGO_BIN_EXE_worklink-rpc") {
        PathBuf::from(path)
    } else {
        let current_exe = std::env::current_exe()
            .map_err(|e| format!("failed to resolve current_exe for fallback: {e}"))?;
        let target_debug_dir = current_exe
            .parent()
            .and_then(|p| p.parent())
            .ok_or_else(|| "failed to resolve target/debug directory for fallback".to_string())?;

        let mut fallback = target_debug_dir.join("worklink-rpc");
        if cfg!(target_os = "windows") {
            fallback.set_extension("exe");
        }
        if !fallback.exists() {
            return Err(format!(
                "CARGO_BIN_EXE_worklink-rpc not set and fallback binary not found at {}",
                fallback.display()
            ));
        }
        fallback
    };

    let mut child = tokio::process::Command::new(&binary)
        .arg("--host")
        .arg("127.0.0.1")
        .arg("--port")
        .arg("0")
        .arg("--data-root")
        .arg(data_dir.path())
        .env("WORKLINK_ADMIN_EMAIL", ADMIN_EMAIL)
        .env("WORKLINK_ADMIN_PASSWORD", ADMIN_PASSWORD)
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|e| format!("failed to spawn worklink-rpc: {e}"))?;

    let stdout = child
        .stdout
        .take()
        .ok_or_else(|| "failed to capture stdout".to_string())?;
    let mut lines = tokio::io::BufReader::new(stdout).lines();

    let mut discovered_port: Option<u16> = None;
    let deadline = tokio::time::Instant::now() + Duration::from_secs(20);
    while tokio::time::Instant::now() < deadline {
        match tokio::time::timeout(Duration::from_millis(250), lines.next_line()).await {
            Ok(Ok(Some(line))) => {
                if let Some(value) = line.strip_prefix("RPC_PORT=") {
                    let parsed = value
                        .trim()
                        .parse::<u16>()
                        .map_err(|e| format!("invalid RPC_PORT value '{value}': {e}"))?;
                    discovered_port = Some(parsed);
                    break;
                }
            }
            Ok(Ok(None)) => break,
            Ok(Err(err)) => return Err(format!("failed to read worklink-rpc stdout: {err}")),
            Err(_) => continue,
        }
    }

    let port =
        discovered_port.ok_or_else(|| "RPC_PORT line not emitted by worklink-rpc".to_string())?;
    if !wait_for_server(port, 15).await {
        return Err(format!("worklink-rpc failed health check on port {port}"));
    }

    let stdout_drain =
        tokio::spawn(async move { while let Ok(Some(_)) = lines.next_line().await {} });

    Ok(RpcServerHandle {
        child,
        port,
        stdout_drain: Some(stdout_drain),
        _data_dir: data_dir,
    })
}

/// Log in and return the session token.
async fn login(port: u16, email: &str, password: &str) -> String {
    let result = rpc_call(port, "login", json!({"email": email, "password": password}))
        .await
        .expect("login call failed");
    assert_eq!(result["success"], json!(true), "login rejected: {result}");
    result["token"].as_str().expect("token missing").to_string()
}

#[tokio::test]
async fn test_health_and_unknown_method() {
    let server = start_rpc_server().await.expect("server should start");

    let result = rpc_call(server.port, "health_check", json!({})).await.unwrap();
    assert_eq!(result["status"], "ok");

    let err = rpc_call(server.port, "no_such_method", json!({}))
        .await
        .unwrap_err();
    assert!(err.contains("-32603") || err.contains("Method not found"));
}

#[tokio::test]
async fn test_auth_error_codes() {
    let server = start_rpc_server().await.expect("server should start");
    let port = server.port;

    // Bad token -> -32000.
    let raw = rpc_call_raw(port, "list_projects", json!({"token": "bogus"}))
        .await
        .unwrap();
    assert_eq!(raw["error"]["code"], json!(-32000));

    // Missing params -> validation code.
    let raw = rpc_call_raw(port, "login", json!({"email": "x@example.com"}))
        .await
        .unwrap();
    assert_eq!(raw["error"]["code"], json!(-32005));

    // Wrong password is a soft failure, not a JSON-RPC error.
    let result = rpc_call(
        port,
        "login",
        json!({"email": ADMIN_EMAIL, "password": "wrong-password"}),
    )
    .await
    .unwrap();
    assert_eq!(result["success"], json!(false));
}

#[tokio::test]
async fn test_full_marketplace_flow() {
    let server = start_rpc_server().await.expect("server should start");
    let port = server.port;

    let admin_token = login(port, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    // Client signs up and logs in.
    let result = rpc_call(
        port,
        "register_client",
        json!({"name": "Asha", "email": "asha@example.com", "password": "client-pass-1",
               "organization": "Acme"}),
    )
    .await
    .unwrap();
    assert_eq!(result["user"]["role"], "client");
    let client_token = login(port, "asha@example.com", "client-pass-1").await;

    // Student applies; admin approves; student logs in.
    let result = rpc_call(
        port,
        "submit_application",
        json!({"name": "Ravi", "email": "ravi@example.com", "password": "student-pass-1",
               "skills": ["rust", "sql"]}),
    )
    .await
    .unwrap();
    let application_id = result["application"]["id"].as_str().unwrap().to_string();

    rpc_call(
        port,
        "review_application",
        json!({"token": admin_token, "application_id": application_id, "approve": true}),
    )
    .await
    .unwrap();
    let student_token = login(port, "ravi@example.com", "student-pass-1").await;

    let result = rpc_call(port, "get_current_user", json!({"token": student_token}))
        .await
        .unwrap();
    let student_id = result["user"]["id"].as_str().unwrap().to_string();

    // Client posts a project; admin assigns; client approves into a work.
    let result = rpc_call(
        port,
        "create_project",
        json!({"token": client_token, "title": "Landing page", "description": "Build it",
               "budget": 5000, "deadline": "2099-01-01T00:00:00+00:00"}),
    )
    .await
    .unwrap();
    let project_id = result["project"]["id"].as_str().unwrap().to_string();

    rpc_call(
        port,
        "assign_project",
        json!({"token": admin_token, "project_id": project_id, "student_id": student_id}),
    )
    .await
    .unwrap();

    let result = rpc_call(
        port,
        "approve_assignment",
        json!({"token": client_token, "project_id": project_id}),
    )
    .await
    .unwrap();
    let work_id = result["work"]["id"].as_str().unwrap().to_string();
    assert_eq!(result["work"]["stage"], "in_progress");

    // Student submits completion; the client cannot see the deliverable yet.
    rpc_call(
        port,
        "submit_completion",
        json!({"token": student_token, "work_id": work_id,
               "deliverable_ref": "deliverables/site.zip", "note": "done"}),
    )
    .await
    .unwrap();

    let result = rpc_call(
        port,
        "get_deliverable",
        json!({"token": client_token, "work_id": work_id}),
    )
    .await
    .unwrap();
    assert_eq!(result["success"], json!(false));
    assert_eq!(result["locked"], json!(true));

    // Client submits UPI proof; student confirms; admin verifies.
    let result = rpc_call(
        port,
        "submit_payment_proof",
        json!({"token": client_token, "work_id": work_id, "upi_reference": "123456789012",
               "payer_upi": "asha@okbank", "payee_upi": "ravi@okbank", "amount": 5000}),
    )
    .await
    .unwrap();
    assert_eq!(result["work"]["stage"], "payment_submitted");

    rpc_call(
        port,
        "confirm_payment",
        json!({"token": student_token, "work_id": work_id}),
    )
    .await
    .unwrap();

    let result = rpc_call(
        port,
        "verify_payment",
        json!({"token": admin_token, "work_id": work_id, "note": "UTR checked"}),
    )
    .await
    .unwrap();
    assert_eq!(result["work"]["stage"], "delivered");
    assert_eq!(result["work"]["deliverable_unlocked"], json!(true));

    // Delivery is now unlocked for the client.
    let result = rpc_call(
        port,
        "get_deliverable",
        json!({"token": client_token, "work_id": work_id}),
    )
    .await
    .unwrap();
    assert_eq!(result["deliverable_ref"], "deliverables/site.zip");

    // Project completed; performance credited; dashboard adds up.
    let result = rpc_call(
        port,
        "get_project",
        json!({"token": client_token, "project_id": project_id}),
    )
    .await
    .unwrap();
    assert_eq!(result["project"]["status"], "completed");

    let result = rpc_call(
        port,
        "get_student_performance",
        json!({"token": student_token, "student_id": student_id}),
    )
    .await
    .unwrap();
    assert_eq!(result["performance"]["completed_count"], json!(1));
    assert_eq!(result["performance"]["total_earnings"], json!(5000));
    assert_eq!(result["performance"]["completion_rate"], json!(100.0));

    let result = rpc_call(port, "get_dashboard", json!({"token": admin_token}))
        .await
        .unwrap();
    assert_eq!(result["dashboard"]["verified_payment_volume"], json!(5000));
    assert_eq!(result["dashboard"]["works_by_stage"]["delivered"], json!(1));
}

#[tokio::test]
async fn test_lifecycle_violation_maps_to_rpc_code() {
    let server = start_rpc_server().await.expect("server should start");
    let port = server.port;

    let admin_token = login(port, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    rpc_call(
        port,
        "register_client",
        json!({"name": "Asha", "email": "asha@example.com", "password": "client-pass-1"}),
    )
    .await
    .unwrap();
    let client_token = login(port, "asha@example.com", "client-pass-1").await;

    let result = rpc_call(
        port,
        "submit_application",
        json!({"name": "Ravi", "email": "ravi@example.com", "password": "student-pass-1"}),
    )
    .await
    .unwrap();
    let application_id = result["application"]["id"].as_str().unwrap().to_string();
    rpc_call(
        port,
        "review_application",
        json!({"token": admin_token, "application_id": application_id, "approve": true}),
    )
    .await
    .unwrap();
    let student_token = login(port, "ravi@example.com", "student-pass-1").await;
    let result = rpc_call(port, "get_current_user", json!({"token": student_token}))
        .await
        .unwrap();
    let student_id = result["user"]["id"].as_str().unwrap().to_string();

    let result = rpc_call(
        port,
        "create_project",
        json!({"token": client_token, "title": "T", "description": "D",
               "budget": 1000, "deadline": "2099-01-01T00:00:00+00:00"}),
    )
    .await
    .unwrap();
    let project_id = result["project"]["id"].as_str().unwrap().to_string();
    rpc_call(
        port,
        "assign_project",
        json!({"token": admin_token, "project_id": project_id, "student_id": student_id}),
    )
    .await
    .unwrap();
    let result = rpc_call(
        port,
        "approve_assignment",
        json!({"token": client_token, "project_id": project_id}),
    )
    .await
    .unwrap();
    let work_id = result["work"]["id"].as_str().unwrap().to_string();

    // Paying before completion is a lifecycle violation (-32003).
    let raw = rpc_call_raw(
        port,
        "submit_payment_proof",
        json!({"token": client_token, "work_id": work_id, "upi_reference": "123456789012",
               "payer_upi": "asha@okbank", "payee_upi": "ravi@okbank", "amount": 1000}),
    )
    .await
    .unwrap();
    assert_eq!(raw["error"]["code"], json!(-32003));

    // A student acting on another's work is forbidden (-32001).
    let raw = rpc_call_raw(
        port,
        "verify_payment",
        json!({"token": student_token, "work_id": work_id}),
    )
    .await
    .unwrap();
    assert_eq!(raw["error"]["code"], json!(-32001));
}

#[tokio::test]
async fn test_blocked_user_loses_access() {
    let server = start_rpc_server().await.expect("server should start");
    let port = server.port;

    let admin_token = login(port, ADMIN_EMAIL, ADMIN_PASSWORD).await;

    rpc_call(
        port,
        "register_client",
        json!({"name": "Asha", "email": "asha@example.com", "password": "client-pass-1"}),
    )
    .await
    .unwrap();
    let client_token = login(port, "asha@example.com", "client-pass-1").await;
    let result = rpc_call(port, "get_current_user", json!({"token": client_token}))
        .await
        .unwrap();
    let client_id = result["user"]["id"].as_str().unwrap().to_string();

    rpc_call(
        port,
        "block_user",
        json!({"token": admin_token, "user_id": client_id}),
    )
    .await
    .unwrap();

    // The old session is dead and re-login is refused.
    let raw = rpc_call_raw(port, "list_projects", json!({"token": client_token}))
        .await
        .unwrap();
    assert_eq!(raw["error"]["code"], json!(-32000));

    let result = rpc_call(
        port,
        "login",
        json!({"email": "asha@example.com", "password": "client-pass-1"}),
    )
    .await
    .unwrap();
    assert_eq!(result["success"], json!(false));
}
