use axum::body::{Body, to_bytes};
use axum::http::{Method, Request, StatusCode, header};
use serde_json::{Value, json};
use sql_emulator::prelude::*;
use tower::ServiceExt;

fn app(dir: &tempfile::TempDir) -> Result<axum::Router, Box<dyn std::error::Error>> {
    let state = AppState::new(ServerConfig::new(dir.path()))?;
    Ok(router(state))
}

async fn send(
    app: &axum::Router,
    method: Method,
    uri: &str,
    host: Option<&str>,
    body: Option<Value>,
) -> Result<(StatusCode, Value), Box<dyn std::error::Error>> {
    let mut request = Request::builder().method(method).uri(uri);
    if let Some(host) = host {
        request = request.header(header::HOST, host);
    }
    let request = match body {
        Some(body) => request
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(serde_json::to_vec(&body)?))?,
        None => request.body(Body::empty())?,
    };

    let response = app.clone().oneshot(request).await?;
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await?;
    let value = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes)?
    };
    Ok((status, value))
}

fn select_database_name() -> Value {
    json!({"requests": [
        {"type": "execute", "stmt": {"sql": "CREATE TABLE IF NOT EXISTS marker(v TEXT)"}},
        {"type": "execute", "stmt": {"sql": "SELECT count(*) FROM marker"}}
    ]})
}

#[tokio::test(flavor = "multi_thread")]
async fn host_header_selects_the_database() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let app = app(&dir)?;

    let (status, body) = send(
        &app,
        Method::POST,
        "/v2/pipeline",
        Some("tenant1.localhost:8080"),
        Some(select_database_name()),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"][0]["type"], "ok");
    assert!(dir.path().join("tenant1.db").exists());

    let (status, _) = send(
        &app,
        Method::POST,
        "/v3/pipeline",
        Some("127.0.0.1:8080"),
        Some(select_database_name()),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert!(dir.path().join("default.db").exists());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn path_segment_selects_the_database() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let app = app(&dir)?;

    let (status, body) = send(
        &app,
        Method::POST,
        "/db/orders/v2/pipeline",
        Some("localhost:8080"),
        Some(json!({"requests": [
            {"type": "execute", "stmt": {"sql": "CREATE TABLE o(id INTEGER PRIMARY KEY)"}},
            {"type": "execute", "stmt": {"sql": "INSERT INTO o DEFAULT VALUES"}},
            {"type": "get_autocommit"}
        ]})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["baton"], Value::Null);
    assert_eq!(body["base_url"], Value::Null);
    assert_eq!(
        body["results"][1]["response"]["result"]["last_insert_rowid"],
        "1"
    );
    assert_eq!(
        body["results"][2],
        json!({"type": "ok", "response": {"type": "get_autocommit", "is_autocommit": true}})
    );
    assert!(dir.path().join("orders.db").exists());
    assert!(!dir.path().join("default.db").exists());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn invalid_database_names_fail_per_request() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let app = app(&dir)?;

    let (status, body) = send(
        &app,
        Method::POST,
        "/db/bad.name/v2/pipeline",
        None,
        Some(json!({"requests": [
            {"type": "store_sql", "sql_id": 1, "sql": "SELECT 1"},
            {"type": "execute", "stmt": {"sql": "SELECT 1"}}
        ]})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["results"][0]["type"], "ok");
    assert_eq!(body["results"][1]["type"], "error");
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn probes_answer_ok() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let app = app(&dir)?;

    for uri in ["/v2", "/v3", "/db/d1/v2", "/db/d1/v3"] {
        let (status, _) = send(&app, Method::GET, uri, None, None).await?;
        assert_eq!(status, StatusCode::OK, "{uri}");
    }
    let (status, body) = send(&app, Method::GET, "/health", None, None).await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"status": "ok"}));
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn management_create_conflicts_then_recreates() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let app = app(&dir)?;
    let databases = "/v1/organizations/acme/databases";

    let (status, body) = send(
        &app,
        Method::POST,
        databases,
        None,
        Some(json!({"name": "x", "group": "default"})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({"database": {"DbId": "x", "Hostname": "x.localhost", "Name": "x"}})
    );

    let (status, body) = send(
        &app,
        Method::POST,
        databases,
        None,
        Some(json!({"name": "x"})),
    )
    .await?;
    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["error"].is_string());

    let (status, body) = send(
        &app,
        Method::DELETE,
        "/v1/organizations/acme/databases/x",
        None,
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({"database": "x"}));

    let (status, _) = send(
        &app,
        Method::POST,
        databases,
        None,
        Some(json!({"name": "x"})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn management_list_get_and_delete() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let app = app(&dir)?;
    let databases = "/v1/organizations/acme/databases";

    for name in ["beta", "alpha"] {
        let (status, _) = send(
            &app,
            Method::POST,
            databases,
            None,
            Some(json!({ "name": name })),
        )
        .await?;
        assert_eq!(status, StatusCode::OK);
    }

    let (status, body) = send(&app, Method::GET, databases, None, None).await?;
    assert_eq!(status, StatusCode::OK);
    let names: Vec<&str> = body["databases"]
        .as_array()
        .ok_or("databases is not an array")?
        .iter()
        .filter_map(|db| db["Name"].as_str())
        .collect();
    assert_eq!(names, ["alpha", "beta"]);

    let (status, body) = send(
        &app,
        Method::GET,
        "/v1/organizations/acme/databases/alpha",
        None,
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["database"]["Hostname"], "alpha.localhost");

    let (status, _) = send(
        &app,
        Method::GET,
        "/v1/organizations/acme/databases/missing",
        None,
        None,
    )
    .await?;
    assert_eq!(status, StatusCode::NOT_FOUND);

    for _ in 0..2 {
        let (status, _) = send(
            &app,
            Method::DELETE,
            "/v1/organizations/acme/databases/alpha",
            None,
            None,
        )
        .await?;
        assert_eq!(status, StatusCode::OK);
    }
    assert!(!dir.path().join("alpha.db").exists());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn management_rejects_invalid_names() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let app = app(&dir)?;

    let (status, body) = send(
        &app,
        Method::POST,
        "/v1/organizations/acme/databases",
        None,
        Some(json!({"name": "../escape"})),
    )
    .await?;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["error"].is_string());
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn malformed_requests_fail_alone() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let app = app(&dir)?;

    let (status, body) = send(
        &app,
        Method::POST,
        "/db/d1/v2/pipeline",
        None,
        Some(json!({"requests": [
            {"type": "execute", "stmt": {"sql": "SELECT 1"}},
            {"type": "execute", "stmt": {"sql": "SELECT ?", "args": [{"type": "float", "value": "abc"}]}},
            {"type": "execute", "stmt": {"sql": "SELECT ?", "args": [{"type": "boolean", "value": true}]}},
            {"type": "execute"},
            {"type": "execute", "stmt": {"sql": "SELECT ?", "args": [{"type": "integer", "value": "12x"}]}},
            {"type": "execute", "stmt": {"sql": "SELECT 2"}}
        ]})),
    )
    .await?;
    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().ok_or("results is not an array")?;
    assert_eq!(results.len(), 6);
    assert_eq!(
        results[0]["response"]["result"]["rows"],
        json!([[{"type": "integer", "value": "1"}]])
    );
    for failed in &results[1..5] {
        assert_eq!(failed["type"], "error");
        assert_eq!(failed["error"]["code"], "SQLITE_ERROR");
        assert!(
            failed["error"]["message"]
                .as_str()
                .is_some_and(|m| m.starts_with("Value decode error")),
            "{failed}"
        );
    }
    assert_eq!(
        results[5]["response"]["result"]["rows"],
        json!([[{"type": "integer", "value": "2"}]])
    );
    Ok(())
}

#[tokio::test(flavor = "multi_thread")]
async fn misshapen_bodies_still_answer_ok() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempfile::tempdir()?;
    let app = app(&dir)?;

    for body in [json!({"requests": "SELECT 1"}), json!([1, 2]), json!({})] {
        let (status, response) = send(
            &app,
            Method::POST,
            "/v2/pipeline",
            Some("tenant.localhost"),
            Some(body.clone()),
        )
        .await?;
        assert_eq!(status, StatusCode::OK, "{body}");
        assert_eq!(response["results"], json!([]), "{body}");
    }
    Ok(())
}
