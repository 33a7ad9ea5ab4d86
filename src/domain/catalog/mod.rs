pub mod report;
pub mod query;
pub mod procedure;

pub use report::{ReportEntry, ReportKind};
pub use query::{QueryEntry, QueryKind};
pub use procedure::{ProcedureEntry, ProcedureKind, ADDITIONAL_PAYMENT_COLUMN};

/// 定義済みSQLの組み立てエラー
#[derive(thiserror::Error, Debug, PartialEq)]
pub enum CatalogError {
    #[error("unknown report type")]
    UnknownReport,

    #[error("unknown query type")]
    UnknownQuery,

    #[error("unknown procedure")]
    UnknownProcedure,

    #[error("a value is required for procedure {0}")]
    MissingArgument(&'static str),

    #[error("invalid date '{0}', expected YYYY-MM-DD")]
    InvalidDate(String),
}
