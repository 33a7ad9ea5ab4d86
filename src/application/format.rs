use rust_decimal::Decimal;
use std::str::FromStr;

use crate::domain::entity::Value;

#[derive(thiserror::Error, Debug, PartialEq)]
pub enum FormatError {
    #[error("error converting string to decimal: {0}")]
    InvalidDecimal(String),

    #[error("unsupported type: {0}")]
    UnsupportedType(&'static str),
}

/// 金額カラムの値を小数表記の文字列に整える
///
/// ドライバーによっては数値が文字列で返るため、文字列は小数として解析し直す。
/// 小数は末尾のゼロを取り除き、浮動小数点数は小数点以下2桁で表示する。
pub fn convert_to_decimal(value: &Value) -> Result<String, FormatError> {
    match value {
        Value::Text(s) => Decimal::from_str(s.trim())
            .map(|d| d.normalize().to_string())
            .map_err(|e| FormatError::InvalidDecimal(e.to_string())),
        Value::Decimal(d) => Ok(d.normalize().to_string()),
        Value::Float(f) => Ok(format!("{:.2}", f)),
        other => Err(FormatError::UnsupportedType(other.type_name())),
    }
}
