//! HTTP reporting service over `reachgrid_core`

pub mod config;
pub mod error;
pub mod routes;
pub mod state;

pub use config::ServerConfig;
pub use error::{ApiError, StartupError};
pub use routes::router;
pub use state::AppState;
