mod api;
mod demo;
mod state;

use std::sync::Arc;

use axum::routing::get;
use ravel::worker::{DataManager, Worker};
use tracing::info;

use crate::state::AppState;

const PORT: u32 = 3000;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().init();

    info!("Building demo snapshot...");
    let manager = Arc::new(DataManager::new(demo::network()));
    let state = Arc::new(AppState {
        worker: Worker::new(manager),
    });

    info!("Starting server...");
    let app = axum::Router::new()
        .route("/status", get(api::status))
        .route("/places", get(api::places))
        .route("/journeys", get(api::journeys))
        .route("/isochrones", get(api::isochrones))
        .with_state(state);

    let address = format!("0.0.0.0:{PORT}");
    let listener = tokio::net::TcpListener::bind(&address)
        .await
        .expect("bind server port");
    info!("Listening on {address}");
    axum::serve(listener, app).await.expect("serve");
}
