use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
    middleware,
};

use shared_config::AppConfig;
use shared_utils::extractor::auth_middleware;

use crate::handlers;

pub fn patient_routes(state: Arc<AppConfig>) -> Router {
    let public_routes = Router::new()
        .route("/", post(handlers::register_patient))
        .route("/profileImage/{patient_id}", get(handlers::get_profile_image));

    let protected_routes = Router::new()
        .route("/profile", get(handlers::get_profile).post(handlers::update_profile))
        .route("/search", get(handlers::search_patients))
        .route("/info/{patient_id}", get(handlers::get_patient_info))
        .route("/history/{patient_id}", get(handlers::get_patient_history))
        .route("/all", get(handlers::list_patients))
        .route("/physicians", get(handlers::list_my_physicians))
        .route("/profileImage", post(handlers::upload_profile_image))
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .with_state(state)
}
