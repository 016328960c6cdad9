//! # Tests for Handlers
//!
//! Drives the full router with `tower::ServiceExt::oneshot` against an
//! in-memory SQLite database and a temporary document directory.

use std::sync::Arc;

use axum::{
    Router,
    body::{Body, to_bytes},
    http::{Method, Request, StatusCode, header},
};
use migration::{Migrator, MigratorTrait};
use sea_orm::{Database, DatabaseConnection};
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;
use uuid::Uuid;

use crate::config::AppConfig;
use crate::models::user::{Model as UserModel, UserRole};
use crate::repositories::{NewUser, UserRepository};
use crate::server::{AppState, create_app};
use crate::storage::LocalDocumentStore;

const TOKEN: &str = "test-token";

struct TestApp {
    router: Router,
    db: DatabaseConnection,
    _documents: TempDir,
}

async fn setup_test_app() -> TestApp {
    let db = Database::connect("sqlite::memory:").await.unwrap();
    Migrator::up(&db, None).await.unwrap();

    let documents = TempDir::new().unwrap();
    let config = AppConfig {
        api_tokens: vec![TOKEN.to_string()],
        document_root: documents.path().to_path_buf(),
        max_document_bytes: 1024,
        ..Default::default()
    };
    let state = AppState {
        documents: Arc::new(LocalDocumentStore::new(
            documents.path().to_path_buf(),
            config.max_document_bytes,
        )),
        config: Arc::new(config),
        db: db.clone(),
    };

    TestApp {
        router: create_app(state),
        db,
        _documents: documents,
    }
}

async fn seed_user(db: &DatabaseConnection, full_name: &str, role: UserRole) -> UserModel {
    UserRepository::new(db)
        .create(NewUser {
            full_name: full_name.to_string(),
            email: format!("{}@example.com", Uuid::new_v4().simple()),
            phone: "081234567890".to_string(),
            role,
            apartment_id: None,
        })
        .await
        .unwrap()
}

fn request(
    method: Method,
    uri: &str,
    acting: Option<Uuid>,
    body: Option<Value>,
) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"));
    if let Some(user_id) = acting {
        builder = builder.header("x-user-id", user_id.to_string());
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

async fn send(app: &TestApp, request: Request<Body>) -> (StatusCode, Value) {
    let response = app.router.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap_or(Value::Null)
    };
    (status, body)
}

#[tokio::test]
async fn test_root_returns_service_info() {
    let app = setup_test_app().await;
    let (status, body) = send(
        &app,
        Request::builder().uri("/").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["service"], "apartments");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn test_healthz_reports_database_ok() {
    let app = setup_test_app().await;
    let (status, body) = send(
        &app,
        Request::builder().uri("/healthz").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "ok");
    assert_eq!(body["database"], "ok");
}

#[tokio::test]
async fn test_unknown_route_returns_error_envelope() {
    let app = setup_test_app().await;
    let (status, body) = send(
        &app,
        Request::builder().uri("/nope").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "NOT_FOUND");
}

#[tokio::test]
async fn test_wrong_method_returns_405_envelope() {
    let app = setup_test_app().await;
    let admin = seed_user(&app.db, "Admin", UserRole::Admin).await;

    let (status, body) = send(
        &app,
        request(Method::PATCH, "/api/v1/users", Some(admin.id), None),
    )
    .await;

    assert_eq!(status, StatusCode::METHOD_NOT_ALLOWED);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "METHOD_NOT_ALLOWED");
}

#[tokio::test]
async fn test_missing_token_is_unauthorized() {
    let app = setup_test_app().await;
    let (status, body) = send(
        &app,
        Request::builder().uri("/api/v1/me").body(Body::empty()).unwrap(),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["success"], false);
    assert_eq!(body["code"], "UNAUTHORIZED");
}

#[tokio::test]
async fn test_unknown_acting_user_is_unauthorized() {
    let app = setup_test_app().await;
    let (status, _) = send(
        &app,
        request(Method::GET, "/api/v1/me", Some(Uuid::new_v4()), None),
    )
    .await;

    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_non_canonical_user_header_is_rejected() {
    let app = setup_test_app().await;
    let resident = seed_user(&app.db, "Rina", UserRole::Resident).await;

    for header_value in [
        resident.id.simple().to_string(),
        format!("{{{}}}", resident.id),
        "not-a-uuid".to_string(),
    ] {
        let request = Request::builder()
            .uri("/api/v1/me")
            .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
            .header("x-user-id", header_value.as_str())
            .body(Body::empty())
            .unwrap();
        let (status, body) = send(&app, request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST, "{header_value}");
        assert_eq!(body["code"], "VALIDATION_FAILED");
        assert_eq!(body["details"]["X-User-Id"], "Must be a valid UUID");
    }
}

#[tokio::test]
async fn test_me_returns_acting_user() {
    let app = setup_test_app().await;
    let resident = seed_user(&app.db, "Rina", UserRole::Resident).await;

    let (status, body) = send(
        &app,
        request(Method::GET, "/api/v1/me", Some(resident.id), None),
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["id"], resident.id.to_string());
    assert_eq!(body["data"]["role"], "resident");
}

#[tokio::test]
async fn test_resident_cannot_list_users() {
    let app = setup_test_app().await;
    let resident = seed_user(&app.db, "Rina", UserRole::Resident).await;

    let (status, body) = send(
        &app,
        request(Method::GET, "/api/v1/users", Some(resident.id), None),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");
}

#[tokio::test]
async fn test_duplicate_email_is_conflict() {
    let app = setup_test_app().await;
    let admin = seed_user(&app.db, "Admin", UserRole::Admin).await;
    let payload = json!({
        "full_name": "Budi Santoso",
        "email": "budi@example.com",
        "phone": "081234567890"
    });

    let (status, body) = send(
        &app,
        request(Method::POST, "/api/v1/users", Some(admin.id), Some(payload.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["role"], "resident");

    let (status, body) = send(
        &app,
        request(Method::POST, "/api/v1/users", Some(admin.id), Some(payload)),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "EMAIL_TAKEN");
}

#[tokio::test]
async fn test_malformed_json_returns_validation_error() {
    let app = setup_test_app().await;
    let resident = seed_user(&app.db, "Rina", UserRole::Resident).await;

    let request = Request::builder()
        .method(Method::POST)
        .uri("/api/v1/posts")
        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
        .header("x-user-id", resident.id.to_string())
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{not json"))
        .unwrap();
    let (status, body) = send(&app, request).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_gate_toggle_alternates_entered_and_exited() {
    let app = setup_test_app().await;
    let resident = seed_user(&app.db, "Rina", UserRole::Resident).await;

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/api/v1/vehicles",
            Some(resident.id),
            Some(json!({ "license_plate": "b 1234 xyz" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["vehicle"]["license_plate"], "B1234XYZ");
    let vehicle_id = body["data"]["vehicle"]["id"].as_str().unwrap().to_string();

    let toggle = json!({ "user_id": resident.id });
    let (status, body) = send(
        &app,
        request(Method::POST, "/api/v1/gate/toggle", Some(resident.id), Some(toggle.clone())),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Vehicle entered");
    assert_eq!(body["data"]["event"], "entered");
    assert_eq!(body["data"]["state"], "inside");
    assert!(body["data"]["log"]["exited_at"].is_null());

    let (status, body) = send(
        &app,
        request(Method::POST, "/api/v1/gate/toggle", Some(resident.id), Some(toggle)),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["message"], "Vehicle exited");
    assert_eq!(body["data"]["state"], "outside");

    let (status, body) = send(
        &app,
        request(
            Method::GET,
            &format!("/api/v1/vehicles/{vehicle_id}/logs"),
            Some(resident.id),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let logs = body["data"].as_array().unwrap();
    assert_eq!(logs.len(), 1);
    assert!(!logs[0]["exited_at"].is_null());
}

#[tokio::test]
async fn test_gate_toggle_without_vehicle_is_not_found() {
    let app = setup_test_app().await;
    let resident = seed_user(&app.db, "Rina", UserRole::Resident).await;

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/api/v1/gate/toggle",
            Some(resident.id),
            Some(json!({ "user_id": resident.id })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "vehicle not found for this user");
}

#[tokio::test]
async fn test_resident_cannot_toggle_for_someone_else() {
    let app = setup_test_app().await;
    let rina = seed_user(&app.db, "Rina", UserRole::Resident).await;
    let budi = seed_user(&app.db, "Budi", UserRole::Resident).await;

    let (status, _) = send(
        &app,
        request(
            Method::POST,
            "/api/v1/gate/toggle",
            Some(rina.id),
            Some(json!({ "user_id": budi.id })),
        ),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn test_second_vehicle_is_conflict() {
    let app = setup_test_app().await;
    let resident = seed_user(&app.db, "Rina", UserRole::Resident).await;

    let (status, _) = send(
        &app,
        request(
            Method::POST,
            "/api/v1/vehicles",
            Some(resident.id),
            Some(json!({ "license_plate": "B 1 AA" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/api/v1/vehicles",
            Some(resident.id),
            Some(json!({ "license_plate": "B 2 AA" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "VEHICLE_ALREADY_REGISTERED");
}

#[tokio::test]
async fn test_report_approval_updates_property_status() {
    let app = setup_test_app().await;
    let owner = seed_user(&app.db, "Rina", UserRole::Resident).await;
    let finder = seed_user(&app.db, "Budi", UserRole::Resident).await;

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/api/v1/properties",
            Some(owner.id),
            Some(json!({ "name": "Blue bicycle" })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["status"], "found");
    let property_id = body["data"]["id"].as_str().unwrap().to_string();

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            "/api/v1/property-reports",
            Some(finder.id),
            Some(json!({
                "property_id": property_id,
                "status": "not found",
                "content": "Not in the bike rack since Monday"
            })),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["approved"], false);
    let report_id = body["data"]["id"].as_str().unwrap().to_string();

    // Only the owner or an administrator may approve
    let (status, _) = send(
        &app,
        request(
            Method::POST,
            &format!("/api/v1/property-reports/{report_id}/approve"),
            Some(finder.id),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            &format!("/api/v1/property-reports/{report_id}/approve"),
            Some(owner.id),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["report"]["approved"], true);
    assert_eq!(body["data"]["property"]["status"], "not found");

    let (status, body) = send(
        &app,
        request(
            Method::POST,
            &format!("/api/v1/property-reports/{report_id}/unapprove"),
            Some(owner.id),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["property"]["status"], "found");
}

#[tokio::test]
async fn test_document_upload_and_download() {
    let app = setup_test_app().await;
    let resident = seed_user(&app.db, "Rina", UserRole::Resident).await;
    let uri = format!("/api/v1/users/{}/documents/lease.pdf", resident.id);
    let pdf = b"%PDF-1.7\n1 0 obj\n<<>>\nendobj\n%%EOF\n".to_vec();

    let upload = Request::builder()
        .method(Method::PUT)
        .uri(&uri)
        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
        .header("x-user-id", resident.id.to_string())
        .header(header::CONTENT_TYPE, "application/pdf")
        .body(Body::from(pdf.clone()))
        .unwrap();
    let (status, body) = send(&app, upload).await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["data"]["file_name"], "lease.pdf");
    assert_eq!(body["data"]["size_bytes"], pdf.len());

    let response = app
        .router
        .clone()
        .oneshot(request(Method::GET, &uri, Some(resident.id), None))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/pdf"
    );
    assert!(response.headers().contains_key(header::ETAG));
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    assert_eq!(bytes.as_ref(), pdf.as_slice());

    let (status, body) = send(
        &app,
        request(
            Method::GET,
            &format!("/api/v1/users/{}/documents", resident.id),
            Some(resident.id),
            None,
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn test_document_upload_rejects_wrong_content_type() {
    let app = setup_test_app().await;
    let resident = seed_user(&app.db, "Rina", UserRole::Resident).await;

    let upload = Request::builder()
        .method(Method::PUT)
        .uri(format!("/api/v1/users/{}/documents/notes.pdf", resident.id))
        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
        .header("x-user-id", resident.id.to_string())
        .header(header::CONTENT_TYPE, "text/plain")
        .body(Body::from("%PDF-1.4"))
        .unwrap();
    let (status, body) = send(&app, upload).await;

    assert_eq!(status, StatusCode::UNSUPPORTED_MEDIA_TYPE);
    assert_eq!(body["code"], "UNSUPPORTED_MEDIA_TYPE");
}

#[tokio::test]
async fn test_document_upload_rejects_oversized_body() {
    let app = setup_test_app().await;
    let resident = seed_user(&app.db, "Rina", UserRole::Resident).await;
    let mut pdf = b"%PDF-1.7\n".to_vec();
    pdf.resize(4096, b'0');

    let upload = Request::builder()
        .method(Method::PUT)
        .uri(format!("/api/v1/users/{}/documents/big.pdf", resident.id))
        .header(header::AUTHORIZATION, format!("Bearer {TOKEN}"))
        .header("x-user-id", resident.id.to_string())
        .header(header::CONTENT_TYPE, "application/pdf")
        .body(Body::from(pdf))
        .unwrap();
    let (status, body) = send(&app, upload).await;

    assert_eq!(status, StatusCode::PAYLOAD_TOO_LARGE);
    assert_eq!(body["success"], false);
}

#[tokio::test]
async fn test_other_residents_documents_are_forbidden() {
    let app = setup_test_app().await;
    let rina = seed_user(&app.db, "Rina", UserRole::Resident).await;
    let budi = seed_user(&app.db, "Budi", UserRole::Resident).await;

    let (status, _) = send(
        &app,
        request(
            Method::GET,
            &format!("/api/v1/users/{}/documents", budi.id),
            Some(rina.id),
            None,
        ),
    )
    .await;

    assert_eq!(status, StatusCode::FORBIDDEN);
}
