//! ThreatScan Server
//!
//! HTTP facade over the inference service: `GET /ping`, `POST /analyze`
//! and `GET /metrics`.

pub mod cli;
pub mod config;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use routes::{create_router, AnalyzeRequest, AnalyzeResponse};
pub use state::AppState;
