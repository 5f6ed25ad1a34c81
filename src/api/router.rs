//! API router.
//!
//! Returns a composable `Router` with every route nested under `/api/`.
//!
//! Middleware stack (outermost → innermost):
//! CORS → request tracing → `Extension(ApiContext)` → auth resolver → access log

use axum::routing::{get, patch, post, put};
use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::api::endpoints::{
    admin, appointments, auth, centers, consultations, doctors, health, payments, uploads,
};
use crate::api::middleware;
use crate::api::types::ApiContext;

/// Build the API router.
///
/// Public and protected routes share one router: the auth layer only
/// resolves a caller when a bearer token is present, and handlers that
/// need one extract `Principal`.
///
/// Middleware uses `Extension<ApiContext>` (injected as the outermost layer).
/// Endpoint handlers use `State<ApiContext>` (provided via `with_state`).
///
/// NOTE: Path params use `:param` syntax (matchit 0.7 / axum 0.7).
pub fn api_router(ctx: ApiContext) -> Router {
    let api = Router::new()
        .route("/health", get(health::check))
        .route("/auth/login", post(auth::login))
        .route("/me", get(auth::me))
        .route("/uploads/config", get(uploads::config))
        .route(
            "/appointments",
            get(appointments::list).post(appointments::create),
        )
        .route("/appointments/:id", get(appointments::detail))
        .route(
            "/appointments/:id/status",
            patch(appointments::update_status),
        )
        .route(
            "/appointments/:id/documents",
            post(appointments::attach_document),
        )
        .route("/doctors", get(doctors::list).post(doctors::upsert_profile))
        .route("/doctors/:id", get(doctors::detail))
        .route("/doctors/:id/approval", patch(doctors::set_approval))
        .route("/centers", get(centers::list).post(centers::upsert_profile))
        .route("/centers/:id", get(centers::detail))
        .route(
            "/centers/:id/availability",
            get(centers::availability).put(centers::replace_availability),
        )
        .route("/centers/:id/services", put(centers::replace_services))
        .route("/centers/:id/approval", patch(centers::set_approval))
        .route("/payments/order", post(payments::create_order))
        .route("/payments/verify", post(payments::verify))
        .route("/payments/:order_id", get(payments::detail))
        .route(
            "/consultations",
            get(consultations::list).post(consultations::schedule),
        )
        .route(
            "/consultations/:id/meet-link",
            post(consultations::meet_link),
        )
        .route(
            "/consultations/:id/status",
            patch(consultations::update_status),
        )
        .route("/admin/pending", get(admin::pending))
        .with_state(ctx.clone())
        // Middleware stack (innermost first, outermost last):
        .layer(axum::middleware::from_fn(middleware::audit::log_access))
        .layer(axum::middleware::from_fn(middleware::auth::authenticate))
        // Extension must be outermost so middleware can extract ApiContext
        .layer(axum::Extension(ctx));

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
}
