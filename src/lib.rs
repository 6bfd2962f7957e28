pub mod config;
pub mod error;
pub mod filter;
pub mod proxy;
pub mod registry;
pub mod server;
pub mod translate;
pub mod upstream;

pub use config::ProxyConfig;
pub use error::{ProxyError, Result};
pub use registry::ModelRegistry;
pub use server::{build_router, AppState};
