use crate::domain::entity::value::Value;
use itertools::Itertools;
use std::fmt;

/// バインドパラメータ付きのSQL文
/// パラメータは SQL Server の `@P1`, `@P2`, ... に順番に対応する
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<Value>,
}

impl Statement {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// パラメータを追加する
    pub fn bind(mut self, value: impl Into<Value>) -> Self {
        self.params.push(value.into());
        self
    }
}

// ログ出力用。パラメータの値は出さない
impl fmt::Display for Statement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} [{} params]", self.sql.split_whitespace().join(" "), self.params.len())
    }
}
