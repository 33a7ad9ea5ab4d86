pub mod connection;
pub mod convert;

pub use connection::{MssqlConnector, MssqlDatabase};
