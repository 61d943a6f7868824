//! SpaceHub Server: HTTP surface, configuration and per-request tenant
//! resolution.

pub mod config;
pub mod error;
pub mod handlers;
pub mod middleware;
pub mod routes;
pub mod server;
pub mod state;

pub use config::{ConfigError, ServerConfig};
pub use error::{ApiError, ApiResult, ErrorResponse};
pub use routes::create_router;
pub use server::ApiServer;
pub use state::AppState;
