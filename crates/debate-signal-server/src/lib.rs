//! Debate Signaling Server Library
//!
//! This module exposes the relay components for testing and embedding.

pub mod api;
pub mod error;
pub mod state;
pub mod webrtc;
pub mod ws;

/// Create the application router together with the state it serves, so
/// callers can inspect the relay while it runs.
pub fn create_app(config: state::Config) -> (axum::Router, state::AppState) {
    let app_state = state::AppState::new(config);
    let router = api::create_router(app_state.clone());
    (router, app_state)
}
