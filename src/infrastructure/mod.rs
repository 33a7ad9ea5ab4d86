pub mod mssql;
pub mod session;
pub mod logging;
