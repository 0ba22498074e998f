// Route table for the dashboard API
use crate::presentation::app_state::AppState;
use crate::presentation::handlers;
use axum::{
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;
use tower_http::{compression::CompressionLayer, trace::TraceLayer};

pub fn build_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/healthz", get(handlers::health_check))
        .route("/dashboard", get(handlers::get_dashboard))
        .route(
            "/dashboard/add-menu",
            post(handlers::open_add_menu).delete(handlers::close_add_menu),
        )
        .route("/dashboard/add-menu/select", post(handlers::select_chart_type))
        .route("/dashboard/modes", put(handlers::set_modes))
        .route("/dashboard/lock", post(handlers::set_lock))
        .route("/dashboard/widgets/:id/click", post(handlers::click_widget))
        .route("/dashboard/widgets/:id/remove", post(handlers::request_remove))
        .route("/dashboard/remove/confirm", post(handlers::confirm_remove))
        .route("/dashboard/remove/cancel", post(handlers::cancel_remove))
        .route("/dashboard/form/submit", post(handlers::submit_form))
        .route("/dashboard/form/convert", post(handlers::submit_conversion))
        .route("/dashboard/form/cancel", post(handlers::cancel_form))
        .route("/dashboard/form/fetch", post(handlers::fetch_document))
        .route("/dashboard/form/keys", post(handlers::apply_device_keys))
        .route("/dashboard/layouts", put(handlers::replace_layouts))
        .route("/dashboard/reset", post(handlers::reset_dashboard))
        .layer(CompressionLayer::new())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
