//! # Server Configuration
//!
//! Router assembly, shared application state and the HTTP server loop.

use std::{sync::Arc, time::Duration};

use anyhow::Context;
use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{
        HeaderName, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    middleware,
    routing::{delete, get, post, put},
};
use sea_orm::DatabaseConnection;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::{
    Modify, OpenApi,
    openapi::security::{Http, HttpAuthScheme, SecurityScheme},
};
use utoipa_swagger_ui::SwaggerUi;

use crate::auth::{USER_ID_HEADER, auth_middleware};
use crate::config::AppConfig;
use crate::handlers::{
    self, apartments, billings, chats, documents, posts, properties, reports, services, users,
    vehicles,
};
use crate::storage::{DocumentStore, LocalDocumentStore};
use crate::telemetry::{TRACE_ID_HEADER, trace_context_middleware};

/// Application state containing shared resources
#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub db: DatabaseConnection,
    pub documents: Arc<dyn DocumentStore>,
}

impl AppState {
    /// State backed by the local document store configured in `config`
    pub fn new(config: AppConfig, db: DatabaseConnection) -> Self {
        let documents =
            LocalDocumentStore::new(config.document_root.clone(), config.max_document_bytes);
        Self {
            config: Arc::new(config),
            db,
            documents: Arc::new(documents),
        }
    }
}

fn api_routes(state: &AppState) -> Router<AppState> {
    // Leaves headroom for the store to report oversize uploads itself
    let document_body_limit = state.config.max_document_bytes.saturating_add(1);

    Router::new()
        .route("/me", get(users::me))
        .route("/users", get(users::list_users).post(users::create_user))
        .route(
            "/users/{id}",
            get(users::get_user)
                .put(users::update_user)
                .delete(users::delete_user),
        )
        .route("/users/{id}/vehicle", get(vehicles::get_user_vehicle))
        .route("/users/{id}/documents", get(documents::list_documents))
        .route(
            "/users/{id}/documents/{file_name}",
            put(documents::upload_document)
                .get(documents::download_document)
                .delete(documents::delete_document)
                .layer(DefaultBodyLimit::max(document_body_limit)),
        )
        .route(
            "/apartments",
            get(apartments::list_apartments).post(apartments::create_apartment),
        )
        .route(
            "/apartments/{id}",
            get(apartments::get_apartment)
                .put(apartments::update_apartment)
                .delete(apartments::delete_apartment),
        )
        .route(
            "/properties",
            get(properties::list_properties).post(properties::create_property),
        )
        .route(
            "/properties/{id}",
            get(properties::get_property)
                .put(properties::update_property)
                .delete(properties::delete_property),
        )
        .route(
            "/property-reports",
            get(reports::list_reports).post(reports::create_report),
        )
        .route(
            "/property-reports/{id}",
            get(reports::get_report).delete(reports::delete_report),
        )
        .route(
            "/property-reports/{id}/approve",
            post(reports::approve_report),
        )
        .route(
            "/property-reports/{id}/unapprove",
            post(reports::unapprove_report),
        )
        .route(
            "/services",
            get(services::list_services).post(services::create_service),
        )
        .route(
            "/services/{id}",
            get(services::get_service)
                .put(services::update_service)
                .delete(services::delete_service),
        )
        .route(
            "/billings",
            get(billings::list_billings).post(billings::create_billing),
        )
        .route(
            "/billings/{id}",
            get(billings::get_billing)
                .patch(billings::update_payment)
                .delete(billings::delete_billing),
        )
        .route("/posts", get(posts::list_posts).post(posts::create_post))
        .route("/posts/{id}", get(posts::get_post).delete(posts::delete_post))
        .route(
            "/posts/{id}/feedbacks",
            get(posts::list_feedbacks).post(posts::create_feedback),
        )
        .route("/feedbacks/{id}", delete(posts::delete_feedback))
        .route("/chats", get(chats::list_chats).post(chats::open_chat))
        .route(
            "/chats/{id}/messages",
            get(chats::list_messages).post(chats::send_message),
        )
        .route(
            "/vehicles",
            get(vehicles::list_vehicles).post(vehicles::register_vehicle),
        )
        .route("/vehicles/{id}/gate", get(vehicles::gate_status))
        .route("/vehicles/{id}/logs", get(vehicles::gate_logs))
        .route("/gate/toggle", post(vehicles::toggle_gate))
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth_middleware,
        ))
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            AUTHORIZATION,
            CONTENT_TYPE,
            HeaderName::from_static(USER_ID_HEADER),
            HeaderName::from_static(TRACE_ID_HEADER),
        ])
        .expose_headers([HeaderName::from_static(TRACE_ID_HEADER)])
        .max_age(Duration::from_secs(60 * 60))
}

/// Creates and configures the Axum application router
pub fn create_app(state: AppState) -> Router {
    let api = api_routes(&state);

    Router::new()
        .route("/", get(handlers::root))
        .route("/healthz", get(handlers::healthz))
        .nest("/api/v1", api)
        .fallback(handlers::route_not_found)
        .method_not_allowed_fallback(handlers::method_not_allowed)
        .with_state(state)
        .merge(SwaggerUi::new("/docs").url("/openapi.json", ApiDoc::openapi()))
        .layer(middleware::from_fn(trace_context_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
}

/// Starts the server and serves until Ctrl-C or SIGTERM
pub async fn run_server(config: AppConfig, db: DatabaseConnection) -> anyhow::Result<()> {
    let addr = config.bind_addr().context("invalid server address")?;
    let profile = config.profile.clone();

    let app = create_app(AppState::new(config, db));

    let listener = TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    tracing::info!(%addr, %profile, "Server listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    tracing::info!("Server shut down");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "Failed to listen for Ctrl-C");
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => tracing::error!(error = %err, "Failed to listen for SIGTERM"),
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "bearer_auth",
                SecurityScheme::Http(Http::new(HttpAuthScheme::Bearer)),
            );
        }
    }
}

/// OpenAPI documentation
#[derive(OpenApi)]
#[openapi(
    paths(
        crate::handlers::root,
        crate::handlers::healthz,
        crate::handlers::users::create_user,
        crate::handlers::users::list_users,
        crate::handlers::users::me,
        crate::handlers::users::get_user,
        crate::handlers::users::update_user,
        crate::handlers::users::delete_user,
        crate::handlers::apartments::create_apartment,
        crate::handlers::apartments::list_apartments,
        crate::handlers::apartments::get_apartment,
        crate::handlers::apartments::update_apartment,
        crate::handlers::apartments::delete_apartment,
        crate::handlers::properties::create_property,
        crate::handlers::properties::list_properties,
        crate::handlers::properties::get_property,
        crate::handlers::properties::update_property,
        crate::handlers::properties::delete_property,
        crate::handlers::reports::create_report,
        crate::handlers::reports::list_reports,
        crate::handlers::reports::get_report,
        crate::handlers::reports::approve_report,
        crate::handlers::reports::unapprove_report,
        crate::handlers::reports::delete_report,
        crate::handlers::services::create_service,
        crate::handlers::services::list_services,
        crate::handlers::services::get_service,
        crate::handlers::services::update_service,
        crate::handlers::services::delete_service,
        crate::handlers::billings::create_billing,
        crate::handlers::billings::list_billings,
        crate::handlers::billings::get_billing,
        crate::handlers::billings::update_payment,
        crate::handlers::billings::delete_billing,
        crate::handlers::posts::create_post,
        crate::handlers::posts::list_posts,
        crate::handlers::posts::get_post,
        crate::handlers::posts::delete_post,
        crate::handlers::posts::create_feedback,
        crate::handlers::posts::list_feedbacks,
        crate::handlers::posts::delete_feedback,
        crate::handlers::chats::open_chat,
        crate::handlers::chats::list_chats,
        crate::handlers::chats::send_message,
        crate::handlers::chats::list_messages,
        crate::handlers::vehicles::register_vehicle,
        crate::handlers::vehicles::list_vehicles,
        crate::handlers::vehicles::get_user_vehicle,
        crate::handlers::vehicles::gate_status,
        crate::handlers::vehicles::gate_logs,
        crate::handlers::vehicles::toggle_gate,
        crate::handlers::documents::list_documents,
        crate::handlers::documents::upload_document,
        crate::handlers::documents::download_document,
        crate::handlers::documents::delete_document,
    ),
    components(
        schemas(
            crate::models::ServiceInfo,
            crate::error::ApiError,
            crate::handlers::HealthStatus,
            crate::handlers::types::MessageResponse,
            crate::models::user::Model,
            crate::models::user::UserRole,
            crate::models::apartment::Model,
            crate::models::property::Model,
            crate::models::property::PropertyKind,
            crate::models::property::PropertyStatus,
            crate::models::property_report::Model,
            crate::models::fee_service::Model,
            crate::models::billing::Model,
            crate::models::billing_item::Model,
            crate::models::post::Model,
            crate::models::feedback::Model,
            crate::models::chat::Model,
            crate::models::message::Model,
            crate::models::vehicle::Model,
            crate::models::vehicle_log::Model,
            crate::gate::GateState,
            crate::gate::GateEvent,
            crate::repositories::BillingWithItems,
            crate::repositories::GateStatus,
            crate::repositories::GateToggle,
            crate::repositories::VehicleRegistration,
            crate::storage::DocumentInfo,
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "root", description = "Service information and health"),
        (name = "users", description = "Resident and administrator accounts"),
        (name = "apartments", description = "Apartment registry"),
        (name = "properties", description = "Property registry"),
        (name = "property-reports", description = "Lost-and-found reports and approvals"),
        (name = "services", description = "Billable services"),
        (name = "billings", description = "Monthly billings"),
        (name = "posts", description = "Social feed and feedback"),
        (name = "chats", description = "Direct messaging"),
        (name = "vehicles", description = "Vehicle registry"),
        (name = "gate", description = "Vehicle gate check-in and check-out"),
        (name = "documents", description = "Per-user PDF documents"),
    ),
    info(
        title = "Apartments API",
        description = "Apartment management backend: residents, properties, billing, feed, messaging, documents and vehicle gate logging",
        version = env!("CARGO_PKG_VERSION"),
    )
)]
pub struct ApiDoc;
