use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn physician_routes(state: Arc<AppConfig>) -> Router {
    let public_routes = Router::new()
        .route("/", post(handlers::register_physician));

    let protected_routes = Router::new()
        .route("/profile", get(handlers::get_profile).post(handlers::update_profile))
        .route("/patients", get(handlers::list_my_patients))
        .route(
            "/patients/{patient_id}",
            post(handlers::adopt_patient).delete(handlers::drop_patient),
        )
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
