mod albums;
mod books;
pub mod config;
pub mod error;
mod http_layers;
pub mod metrics;
mod reviews;
pub mod server;
mod songs;
pub mod state;

pub use config::ServerConfig;
pub use error::{ApiError, ApiResult};
pub use http_layers::*;
pub use server::{make_app, run_server};
