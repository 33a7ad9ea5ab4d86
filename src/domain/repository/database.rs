use async_trait::async_trait;
use std::sync::Arc;
use typed_builder::TypedBuilder;

use crate::domain::entity::{ResultSet, Statement};

// データベースエラー
#[derive(thiserror::Error, Debug)]
pub enum DbError {
    #[error("connection failed: {0}")]
    Connection(String),

    #[error("ping failed: {0}")]
    Ping(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("unsupported column type in {column}: {type_name}")]
    UnsupportedType { column: String, type_name: String },
}

/// ログインフォームで入力された認証情報
#[derive(Clone, TypedBuilder)]
pub struct Credentials {
    #[builder(setter(into))]
    pub login: String,

    #[builder(setter(into))]
    pub password: String,
}

// パスワードはログに出さない
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("login", &self.login)
            .field("password", &"***")
            .finish()
    }
}

/// 1つのデータベース接続 - SQL文を実行するための抽象インターフェース
#[async_trait]
pub trait Database: Send + Sync {
    /// 接続が生きているか確認する
    async fn ping(&self) -> Result<(), DbError>;

    /// 結果セットを返すSQL文を実行する
    /// 複数の結果セットが返る場合は最初のものだけを返す
    async fn query(&self, statement: &Statement) -> Result<ResultSet, DbError>;

    /// 結果セットを返さないSQL文を実行し、影響を受けた行数を返す
    async fn execute(&self, statement: &Statement) -> Result<u64, DbError>;
}

/// 認証情報から接続を開く
#[async_trait]
pub trait Connector: Send + Sync {
    async fn connect(&self, credentials: &Credentials) -> Result<Arc<dyn Database>, DbError>;
}
