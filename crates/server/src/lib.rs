//! HTTP server for the scheme assistant

pub mod http;
pub mod state;

pub use http::create_router;
pub use state::AppState;
