pub mod domain;
pub mod application;
pub mod infrastructure;
pub mod interface;
pub mod config;

// bookstore-web version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// Application result type
pub type Result<T> = std::result::Result<T, Error>;

#[derive(thiserror::Error, Debug)]
pub enum  Error {
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Template error: {0}")]
    Template(String),

    #[error("Server error: {0}")]
    Server(String),
}
