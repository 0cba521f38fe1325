// HTTP routes configuration

use crate::core::state::AppState;
use crate::handlers::{attachment, email, fallback, health, signup, users, welcome};
use crate::utils::auth::require_admin_key;
use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};

fn portal_routes(state: &Arc<AppState>) -> Router<Arc<AppState>> {
    // Public endpoints
    let public = Router::new()
        .route("/health", get(health::health_handler))
        .route("/send_welcome_email", post(welcome::send_welcome_email_handler))
        .route("/signup_user", post(signup::signup_handler));

    // Admin endpoints (require API key when one is configured)
    let admin = Router::new()
        .route("/get_users", get(users::get_users_handler))
        .route("/update_user_status", post(users::update_user_status_handler))
        .route("/remove_user", post(users::remove_user_handler))
        .route("/get_raf_file", get(attachment::get_raf_file_handler))
        .route("/send_update_email", post(email::send_update_email_handler))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(state),
            require_admin_key,
        ));

    public.merge(admin)
}

pub fn build_router(state: Arc<AppState>) -> Router {
    let routes = portal_routes(&state);

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .merge(routes.clone())
        .nest("/api", routes)
        // 404 fallback for all unmatched routes
        .fallback(fallback::fallback_handler)
        .layer(DefaultBodyLimit::max(state.config.server.max_upload_bytes))
        .layer(cors)
        .with_state(state)
}
