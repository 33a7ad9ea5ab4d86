pub mod database;

pub use database::{Connector, Credentials, Database, DbError};
