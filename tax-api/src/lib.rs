pub mod app;
pub mod config;
pub mod error;
pub mod handlers;
pub mod logging;

pub use app::{AppState, build_registry, router};
pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
