use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub mod auth;
pub mod tasks;

/// The JSON API, mounted under `/api`.
pub fn router(state: AppState) -> Router {
    let api = Router::new()
        .route("/tasks", get(tasks::index).post(tasks::store))
        .route(
            "/tasks/:id",
            get(tasks::show).put(tasks::update).delete(tasks::destroy),
        )
        .route("/user/:user_id/tasks", get(tasks::for_user))
        .route("/user", get(auth::me))
        .route("/register", post(auth::register))
        .route("/login", post(auth::login))
        .route("/logout", post(auth::logout));

    Router::new()
        .nest("/api", api)
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}
