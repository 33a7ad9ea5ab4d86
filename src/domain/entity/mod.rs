pub mod value;
pub mod table;
pub mod role;
pub mod statement;

pub use value::Value;
pub use table::{Row, ResultSet};
pub use role::Role;
pub use statement::Statement;
