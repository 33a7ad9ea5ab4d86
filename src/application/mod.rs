pub mod format;
pub mod guard;
pub mod service;

pub use service::{BookstoreService, CellUpdate, ServiceError, TableAccess};
