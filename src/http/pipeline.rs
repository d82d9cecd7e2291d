//! The application's own request resolution, used for everything outside `/api/`.
//!
//! Serves the built frontend from `app.static_dir` when configured,
//! otherwise answers 404.

use axum::{http::StatusCode, response::IntoResponse, Router};
use tower_http::{services::ServeDir, trace::TraceLayer};

use crate::config::Settings;

pub fn build_pipeline(settings: &Settings) -> Router {
    let router = match &settings.static_dir {
        Some(dir) => {
            tracing::info!(static_dir = %dir.display(), "Serving static files");
            Router::new().fallback_service(ServeDir::new(dir).append_index_html_on_directories(true))
        }
        None => Router::new().fallback(not_found),
    };
    router.layer(TraceLayer::new_for_http())
}

async fn not_found() -> impl IntoResponse {
    (StatusCode::NOT_FOUND, "Not Found")
}
