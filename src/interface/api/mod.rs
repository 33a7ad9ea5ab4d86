pub mod handler;
pub mod page;
pub mod server;
pub mod session;
pub mod view;

pub use server::{build_router, start_server, AppState};
