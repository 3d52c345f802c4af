//! Admin API for the Bubble Time menu.
//!
//! Thin layer over the hosted backend: every catalog call is forwarded to the
//! [`catalog::CatalogRepository`] picked at startup, the only logic living here
//! is admin sessions and the favourites report.
//!
//! # Routes
//!
//! | Method | Path | Notes |
//! |---|---|---|
//! | POST | `/login` | `{ email, password }`, admins only |
//! | POST | `/logout` | |
//! | GET, POST | `/categories` | |
//! | PATCH, DELETE | `/categories/{id}` | delete fails while items remain |
//! | GET | `/catalog` | categories with their items |
//! | GET, POST | `/menu-items` | `?category_id=` filter |
//! | PATCH, DELETE | `/menu-items/{id}` | |
//! | PUT | `/menu-items/{id}/image` | raw image body, optional `x-file-name` |
//! | GET | `/favourites` | ranked summaries and totals |
//!
//! Everything except `/login` needs `Authorization: Bearer <token>`.
//!
//! # Environment
//!
//! - `RUST_PORT`: default 1111
//! - `CATALOG_BACKEND`: `remote` (default) or `memory`
//! - `BACKEND_URL`, `BACKEND_KEY`: hosted backend, key read from `/run/secrets` first
//! - `CATALOG_SEED`: JSON seed for the memory backend
//! - `IMAGE_BUCKET`: default `menu-images`
//! - `SESSION_TTL_MINUTES`: default 480
//! - `ALLOWED_ORIGIN`: CORS origin, any when unset
use std::{sync::Arc, time::Duration};

use axum::{
    Router,
    extract::DefaultBodyLimit,
    http::{
        HeaderValue, Method,
        header::{AUTHORIZATION, CONTENT_TYPE},
    },
    routing::{get, patch, post, put},
};

#[cfg(unix)]
use tokio::signal::unix::{SignalKind, signal};
use tokio::{net::TcpListener, signal::ctrl_c};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};
use tracing::{info, warn};
use tracing_subscriber::{EnvFilter, fmt};

pub mod config;
pub mod error;
pub mod routes;
pub mod session;
pub mod state;
pub mod utils;

use config::Config;
use error::AppError;
use routes::{
    catalog_handler, create_category_handler, create_menu_item_handler, delete_category_handler,
    delete_menu_item_handler, favourites_handler, list_categories_handler,
    list_menu_items_handler, login_handler, logout_handler, update_category_handler,
    update_menu_item_handler, upload_image_handler,
};
use state::State;
use utils::MAX_IMAGE_BYTES;

pub async fn start_server() -> Result<(), AppError> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Loading config...");
    let config = Config::load().map_err(|e| AppError::InternalError(e.into()))?;

    info!("Initializing state...");
    let state = State::new(config)?;

    info!("Starting server...");

    let address = format!("0.0.0.0:{}", state.config.port);
    let router = app(state);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address)
        .await
        .map_err(|e| AppError::InternalError(e.into()))?;
    info!("Server running on {address}");

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| AppError::InternalError(e.into()))?;

    info!("Server shutting down...");
    Ok(())
}

pub fn app(state: Arc<State>) -> Router {
    Router::new()
        .route("/login", post(login_handler))
        .route("/logout", post(logout_handler))
        .route(
            "/categories",
            get(list_categories_handler).post(create_category_handler),
        )
        .route(
            "/categories/{id}",
            patch(update_category_handler).delete(delete_category_handler),
        )
        .route("/catalog", get(catalog_handler))
        .route(
            "/menu-items",
            get(list_menu_items_handler).post(create_menu_item_handler),
        )
        .route(
            "/menu-items/{id}",
            patch(update_menu_item_handler).delete(delete_menu_item_handler),
        )
        .route(
            "/menu-items/{id}/image",
            put(upload_image_handler).layer(DefaultBodyLimit::max(MAX_IMAGE_BYTES)),
        )
        .route("/favourites", get(favourites_handler))
        .layer(TraceLayer::new_for_http())
        .layer(cors(state.config.allowed_origin.as_deref()))
        .with_state(state)
}

fn cors(allowed_origin: Option<&str>) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([CONTENT_TYPE, AUTHORIZATION])
        .max_age(Duration::from_secs(60 * 60));

    match allowed_origin.map(HeaderValue::from_str) {
        Some(Ok(origin)) => cors.allow_origin(origin),
        Some(Err(e)) => {
            warn!("Ignoring invalid ALLOWED_ORIGIN: {e}");
            cors.allow_origin(Any)
        }
        None => cors.allow_origin(Any),
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = ctrl_c().await {
            warn!("Failed to install Ctrl+C handler: {e}");
            std::future::pending::<()>().await;
        }

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                warn!("Failed to install signal handler: {e}");
                std::future::pending::<()>().await;
            }
        }

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
