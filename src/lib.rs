//! Attendance backend for the org's event platform.
//!
//! The interesting part of the platform lives here: verifying scanned member
//! QR codes and recording event attendance. Everything else (pages, event
//! CRUD, payments) stays in its own services and only talks to this one over
//! HTTP.
//!
//!
//!
//! # Scan pipeline
//!
//! ```text
//! encrypted QR text
//!   -> crypto::decrypt      AES-128-ECB + PKCS#7, Base64, shared secret
//!   -> qr::parse            6 pipe-delimited identity fields
//!   -> identity::verify     registry lookup + name cross-check
//!   -> attendance::time_in / time_out, or registration::register
//! ```
//!
//! A garbled or foreign scan fails at the first two steps and is reported as
//! an invalid QR, never as a server fault. The shared secret is server
//! configuration and never appears in payloads or logs.
//!
//!
//!
//! # Attendance rules
//!
//! 1. A person must be registered for the exact event before timing in.
//! 2. One attendance record per person per event; a time-out needs an open
//!    time-in and lands exactly once.
//! 3. Members with at least an hour between time-in and time-out earn
//!    attendance points.
//! 4. Event staff watch a live feed: one polling loop per viewer, full
//!    snapshot every 3 seconds, stopped the moment the viewer leaves.
//!
//!
//!
//! # Storage
//!
//! All durable state sits behind the [`store::Store`] trait: Redis in
//! production ([`database::RedisStore`], hash layout documented there), a
//! locked in-memory store for tests and local runs. Uniqueness rules are
//! enforced by the store at insert time, not by request-handler checks.
//!
//!
//!
//! # Running
//!
//! Config comes from the environment (`RUST_PORT`, `REDIS_URL`,
//! `REWARD_MIN_MS`) with the QR shared secret read from
//! `/run/secrets/QR_SECRET_KEY`. Logs follow `RUST_LOG`.

use std::time::Duration;

use axum::{
    Router,
    http::{Method, header::CONTENT_TYPE},
    routing::{get, post},
};

use signal::{
    ctrl_c,
    unix::{SignalKind, signal},
};
use tokio::{net::TcpListener, signal};
use tower_http::cors::CorsLayer;
use tracing::info;
use tracing_subscriber::{EnvFilter, fmt};

pub mod attendance;
pub mod config;
pub mod crypto;
pub mod database;
pub mod error;
pub mod feed;
pub mod identity;
pub mod models;
pub mod qr;
pub mod registration;
pub mod rewards;
pub mod routes;
pub mod state;
pub mod store;
pub mod user;

use routes::{
    attendance_feed_handler, attendance_list_handler, check_registration_handler,
    register_handler, scan_attendance_handler, scan_verify_handler,
};
use state::{SharedState, State};

pub fn router(state: SharedState) -> Router {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(60 * 60));

    Router::new()
        .route("/scan/verify", post(scan_verify_handler))
        .route("/scan/attendance", post(scan_attendance_handler))
        .route("/events/{event_id}/registrations", post(register_handler))
        .route(
            "/events/{event_id}/registrations/check",
            post(check_registration_handler),
        )
        .route("/events/{event_id}/attendance", get(attendance_list_handler))
        .route(
            "/events/{event_id}/attendance/stream",
            get(attendance_feed_handler),
        )
        .layer(cors)
        .with_state(state)
}

pub async fn start_server() {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();

    info!("Initializing state...");
    let state = State::new().await;

    info!("Starting server...");
    let app = router(state.clone());

    let address = format!("0.0.0.0:{}", state.config.port);
    info!("Binding to {address}");

    let listener = TcpListener::bind(&address).await.unwrap();
    info!("Server running on {address}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .unwrap();

    println!("Server shutting down...");
}

async fn shutdown_signal() {
    let ctrl_c = async {
        ctrl_c().await.expect("Failed to install Ctrl+C handler");

        info!("Received Ctrl+C, shutting down");
    };

    #[cfg(unix)]
    let terminate = async {
        signal(SignalKind::terminate())
            .expect("Failed to install signal handler")
            .recv()
            .await;

        info!("Received terminate signal, shutting down");
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
