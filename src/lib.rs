//! On-demand directory archive streaming over HTTP.

pub mod archive;
pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;

pub use config::schema::ServerConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
