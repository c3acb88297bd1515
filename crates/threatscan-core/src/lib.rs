//! ThreatScan Core
//!
//! Types and error handling shared by the ThreatScan classifier and HTTP server.

pub mod error;
pub mod types;

pub use error::{Error, Result};
pub use types::{Prediction, EMPTY_LABEL};

/// Prelude module for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::types::Prediction;
}
