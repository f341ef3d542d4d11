//! HTTP server

pub mod http;

pub use http::{handle_request, run, AppState};
