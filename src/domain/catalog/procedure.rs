use serde::Serialize;
use strum::{EnumIter, EnumString, IntoEnumIterator};

use crate::domain::catalog::CatalogError;
use crate::domain::entity::{Statement, Value};

/// 定義済みストアドプロシージャ
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, EnumIter)]
pub enum ProcedureKind {
    GetExpensiveStockBooks,
    GetOrderDetails,
    InsertPublishers,
    CalculateAdditionalPayment,
}

#[derive(Debug, Clone, Serialize)]
pub struct ProcedureEntry {
    pub key: &'static str,
    pub title: &'static str,
    pub argument: Option<&'static str>,
}

/// 小数の書式を整えるカラム
pub const ADDITIONAL_PAYMENT_COLUMN: &str = "AdditionalPayment";

impl ProcedureKind {
    pub fn key(&self) -> &'static str {
        match self {
            ProcedureKind::GetExpensiveStockBooks => "GetExpensiveStockBooks",
            ProcedureKind::GetOrderDetails => "GetOrderDetails",
            ProcedureKind::InsertPublishers => "InsertPublishers",
            ProcedureKind::CalculateAdditionalPayment => "CalculateAdditionalPayment",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ProcedureKind::GetExpensiveStockBooks => "Expensive books in stock",
            ProcedureKind::GetOrderDetails => "Order details",
            ProcedureKind::InsertPublishers => "Insert publishers",
            ProcedureKind::CalculateAdditionalPayment => "Additional payment for a book",
        }
    }

    /// 引数名（引数なしなら None）
    pub fn argument(&self) -> Option<&'static str> {
        match self {
            ProcedureKind::GetOrderDetails => Some("OrderID"),
            ProcedureKind::CalculateAdditionalPayment => Some("BookCode"),
            ProcedureKind::GetExpensiveStockBooks | ProcedureKind::InsertPublishers => None,
        }
    }

    pub fn entries() -> Vec<ProcedureEntry> {
        ProcedureKind::iter()
            .map(|kind| ProcedureEntry {
                key: kind.key(),
                title: kind.title(),
                argument: kind.argument(),
            })
            .collect()
    }

    /// EXEC文を作る。引数が必要なプロシージャで入力が空ならエラー
    pub fn statement(&self, input_value: &str) -> Result<Statement, CatalogError> {
        match self.argument() {
            None => Ok(Statement::new(format!("EXEC {}", self.key()))),
            Some(argument) => {
                let input = input_value.trim();
                if input.is_empty() {
                    return Err(CatalogError::MissingArgument(self.key()));
                }
                Ok(Statement::new(format!("EXEC {} @{} = @P1", self.key(), argument))
                    .bind(argument_value(input)))
            }
        }
    }
}

// 数値ならそのまま整数でバインドし、それ以外は文字列として渡す
fn argument_value(input: &str) -> Value {
    input
        .parse::<i64>()
        .map(Value::Integer)
        .unwrap_or_else(|_| Value::from(input))
}
