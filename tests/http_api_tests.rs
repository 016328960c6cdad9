//! End-to-end tests for the HTTP surface over a real socket.

use apartments::config::AppConfig;
use apartments::server::{AppState, create_app};
use reqwest::{Client, StatusCode};
use serde_json::{Value, json};
use tempfile::TempDir;
use tokio::net::TcpListener;

#[path = "test_utils/mod.rs"]
mod test_utils;
use test_utils::{create_admin, create_resident, setup_test_db};

const TOKEN: &str = "http-test-token";

struct TestServer {
    url: String,
    db: sea_orm::DatabaseConnection,
    _documents: TempDir,
}

/// Starts the full application on an ephemeral port
async fn start_test_server() -> TestServer {
    let db = setup_test_db().await.expect("test database");
    let documents = TempDir::new().expect("temp dir");
    let config = AppConfig {
        api_tokens: vec![TOKEN.to_string()],
        document_root: documents.path().to_path_buf(),
        ..Default::default()
    };

    let app = create_app(AppState::new(config, db.clone()));
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    TestServer {
        url: format!("http://{addr}"),
        db,
        _documents: documents,
    }
}

#[tokio::test]
async fn test_root_endpoint() {
    let server = start_test_server().await;

    let response = Client::new()
        .get(format!("{}/", server.url))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
    assert_eq!(
        response.headers().get("content-type").unwrap(),
        "application/json"
    );
    assert!(response.headers().contains_key("x-trace-id"));

    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["service"], "apartments");
}

#[tokio::test]
async fn test_openapi_endpoint() {
    let server = start_test_server().await;

    let response = Client::new()
        .get(format!("{}/openapi.json", server.url))
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.expect("Failed to parse JSON");
    assert_eq!(body["info"]["title"], "Apartments API");
    assert!(body["paths"].get("/api/v1/gate/toggle").is_some());
    assert!(body["components"]["securitySchemes"].get("bearer_auth").is_some());
}

#[tokio::test]
async fn test_trace_id_is_echoed_in_errors() {
    let server = start_test_server().await;

    let response = Client::new()
        .get(format!("{}/api/v1/me", server.url))
        .header("x-trace-id", "trace-from-client")
        .send()
        .await
        .expect("Failed to execute request");

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get("x-trace-id").unwrap(),
        "trace-from-client"
    );
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["trace_id"], "trace-from-client");
}

#[tokio::test]
async fn test_billing_flow_over_http() {
    let server = start_test_server().await;
    let admin = create_admin(&server.db).await.unwrap();
    let resident = create_resident(&server.db, "Rina").await.unwrap();
    let client = Client::new();

    let service: Value = client
        .post(format!("{}/api/v1/services", server.url))
        .bearer_auth(TOKEN)
        .header("x-user-id", admin.id.to_string())
        .json(&json!({
            "name": "Maintenance",
            "unit_price": 200000,
            "unit": "month",
            "tax_percentage": 10.0
        }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(service["success"], true);
    let service_id = service["data"]["id"].as_str().unwrap().to_string();

    let response = client
        .post(format!("{}/api/v1/billings", server.url))
        .bearer_auth(TOKEN)
        .header("x-user-id", admin.id.to_string())
        .json(&json!({
            "user_id": resident.id,
            "period_year": 2026,
            "period_month": 10,
            "items": [{ "service_id": service_id, "quantity": 1 }]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);
    let billing: Value = response.json().await.unwrap();
    assert_eq!(billing["data"]["total_amount"], 220000);
    assert_eq!(billing["data"]["items"].as_array().unwrap().len(), 1);

    // Residents only see their own billings
    let listed: Value = client
        .get(format!("{}/api/v1/billings", server.url))
        .bearer_auth(TOKEN)
        .header("x-user-id", resident.id.to_string())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(listed["data"].as_array().unwrap().len(), 1);

    let response = client
        .post(format!("{}/api/v1/services", server.url))
        .bearer_auth(TOKEN)
        .header("x-user-id", resident.id.to_string())
        .json(&json!({
            "name": "Gym",
            "unit_price": 1,
            "unit": "visit",
            "tax_percentage": 0.0
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_feed_pagination_over_http() {
    let server = start_test_server().await;
    let resident = create_resident(&server.db, "Rina").await.unwrap();
    let client = Client::new();

    for n in 0..3 {
        let response = client
            .post(format!("{}/api/v1/posts", server.url))
            .bearer_auth(TOKEN)
            .header("x-user-id", resident.id.to_string())
            .json(&json!({ "content": format!("hello {n}") }))
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::CREATED);
    }

    let first: Value = client
        .get(format!("{}/api/v1/posts?limit=2", server.url))
        .bearer_auth(TOKEN)
        .header("x-user-id", resident.id.to_string())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(first["data"]["items"].as_array().unwrap().len(), 2);
    assert_eq!(first["data"]["has_more"], true);
    let cursor = first["data"]["next_cursor"].as_str().unwrap().to_string();

    let second: Value = client
        .get(format!("{}/api/v1/posts", server.url))
        .query(&[("limit", "2"), ("cursor", cursor.as_str())])
        .bearer_auth(TOKEN)
        .header("x-user-id", resident.id.to_string())
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(second["data"]["items"].as_array().unwrap().len(), 1);
    assert_eq!(second["data"]["has_more"], false);
    assert!(second["data"]["next_cursor"].is_null());

    let response = client
        .get(format!("{}/api/v1/posts?cursor=!!!", server.url))
        .bearer_auth(TOKEN)
        .header("x-user-id", resident.id.to_string())
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
