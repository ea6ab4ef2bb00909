use axum::{routing::get, Router};
use tower_http::{
    catch_panic::CatchPanicLayer,
    compression::CompressionLayer,
    trace::{DefaultMakeSpan, DefaultOnFailure, DefaultOnRequest, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

pub mod config;
pub mod error;
pub mod state;

pub mod crypto {
    pub mod cbc;
    pub mod token;
}

pub mod models {
    pub mod session;
}

pub mod validation {
    pub mod session;
}

pub mod services {
    pub mod gate;
}

pub mod views {
    pub mod pages;
}

pub mod handlers {
    pub mod demo;
    pub mod op;
    pub mod root;
}

use state::AppState;

/// Builds the application router.
pub fn build_router(state: AppState) -> Router {
    let mut routes = Router::new()
        .route("/", get(handlers::root::welcome))
        .route("/health", get(handlers::root::health))
        .route("/op", get(handlers::op::open_class));

    if state.config.demo_routes {
        tracing::warn!("⚠️ Demo route /encrypt is enabled");
        routes = routes.route("/encrypt", get(handlers::demo::encrypt_sample));
    }

    routes
        .fallback(handlers::root::not_found)
        .with_state(state)
        .layer(CatchPanicLayer::custom(handlers::root::handle_panic))
        .layer(CompressionLayer::new())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::default().include_headers(false))
                .on_request(DefaultOnRequest::default().level(Level::DEBUG))
                .on_response(DefaultOnResponse::default().level(Level::DEBUG))
                .on_failure(DefaultOnFailure::default().level(Level::ERROR)),
        )
}
