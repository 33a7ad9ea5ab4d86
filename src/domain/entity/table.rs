use crate::domain::entity::value::Value;
use serde::{Deserialize, Serialize};

/// 1行のデータを表現する
/// 値は結果セットのカラム順に並ぶ
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Row {
    pub values: Vec<Value>,
}

impl Row {
    /// 値のリストから新しい行を作成する
    pub fn from_values(values: Vec<Value>) -> Self {
        Self { values }
    }

    /// 位置で値を取得する
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.values.get(index)
    }
}

/// クエリ結果セットを表現する
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ResultSet {
    //結果セットのカラム名
    pub columns: Vec<String>,

    pub rows: Vec<Row>,
}

impl ResultSet {
    /// 新しい空の結果セットを作成する
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            columns,
            rows: Vec::new(),
        }
    }

    /// 結果セットに行を追加する
    pub fn add_row(&mut self, row: Row) {
        self.rows.push(row);
    }

    /// ビルダー形式で行を追加する
    pub fn with_row(mut self, values: Vec<Value>) -> Self {
        self.rows.push(Row::from_values(values));
        self
    }

    /// カラムの位置インデックスを取得する
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == name)
    }

    /// 最初の行の最初の値
    pub fn first_value(&self) -> Option<&Value> {
        self.rows.first()?.get(0)
    }
}
