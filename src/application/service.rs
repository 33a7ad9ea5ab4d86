use itertools::Itertools;
use std::str::FromStr;
use tracing::{debug, warn};

use crate::application::format::convert_to_decimal;
use crate::application::guard::{is_identifier, quote_identifier};
use crate::domain::catalog::{
    CatalogError, ProcedureKind, QueryKind, ReportKind, ADDITIONAL_PAYMENT_COLUMN,
};
use crate::domain::entity::{ResultSet, Role, Statement, Value};
use crate::domain::repository::{Database, DbError};

/// アプリケーション層のエラー
#[derive(thiserror::Error, Debug)]
pub enum ServiceError {
    #[error("query failed: {0}")]
    Database(#[from] DbError),

    #[error("failed to check user role: {0}")]
    RoleLookup(#[source] DbError),

    #[error("failed to fetch table columns: {0}")]
    Columns(#[source] DbError),

    #[error("{0}")]
    Catalog(#[from] CatalogError),

    #[error("table {0} is not available")]
    TableNotAllowed(String),

    #[error("invalid identifier: {0}")]
    InvalidIdentifier(String),

    #[error("column {column} not found in table {table}")]
    UnknownColumn { column: String, table: String },

    #[error("no values to insert")]
    NoValues,
}

/// ロールごとに閲覧できるテーブルの一覧
#[derive(Debug, Clone)]
pub struct TableAccess {
    user_tables: Vec<String>,
    admin_tables: Vec<String>,
}

impl TableAccess {
    pub fn new(user_tables: Vec<String>, admin_tables: Vec<String>) -> Self {
        Self { user_tables, admin_tables }
    }

    pub fn tables_for(&self, role: Role) -> &[String] {
        match role {
            Role::User => &self.user_tables,
            Role::Admin => &self.admin_tables,
        }
    }

    /// ロールがテーブルにアクセスできるかチェックする
    pub fn check(&self, role: Role, table: &str) -> Result<(), ServiceError> {
        if !is_identifier(table) {
            return Err(ServiceError::InvalidIdentifier(table.to_string()));
        }
        if self.tables_for(role).iter().any(|t| t == table) {
            Ok(())
        } else {
            Err(ServiceError::TableNotAllowed(table.to_string()))
        }
    }
}

/// 1セルの更新要求
#[derive(Debug, Clone)]
pub struct CellUpdate {
    pub table: String,
    pub key_column: String,
    pub key_value: String,
    pub column: String,
    pub new_value: String,
}

/// テーブル閲覧・編集、レポート、クエリ、プロシージャの実行
#[derive(Debug, Clone)]
pub struct BookstoreService {
    access: TableAccess,
}

impl BookstoreService {
    pub fn new(access: TableAccess) -> Self {
        Self { access }
    }

    pub fn tables_for(&self, role: Role) -> &[String] {
        self.access.tables_for(role)
    }

    /// ログイン名からロールを取得する
    ///
    /// `users` テーブルへのクエリが失敗した場合のみ `v_user3_view` を参照する。
    /// 行がない場合やロールが未知の値の場合は `None` を返す。
    pub async fn resolve_role(&self, db: &dyn Database, login: &str) -> Result<Option<Role>, ServiceError> {
        let result = match db.query(&role_statement("users", login)).await {
            Ok(result) => result,
            Err(err) => {
                warn!("users テーブルからロールを取得できませんでした: {}", err);
                db.query(&role_statement("v_user3_view", login))
                    .await
                    .map_err(ServiceError::RoleLookup)?
            }
        };

        let role = match result.first_value() {
            Some(Value::Text(raw)) => Role::from_str(raw.trim()).ok(),
            _ => None,
        };
        Ok(role)
    }

    /// テーブルのカラム名を定義順に取得する
    pub async fn table_columns(&self, db: &dyn Database, table: &str) -> Result<Vec<String>, ServiceError> {
        let statement = Statement::new(
            "SELECT COLUMN_NAME FROM INFORMATION_SCHEMA.COLUMNS WHERE TABLE_NAME = @P1 ORDER BY ORDINAL_POSITION",
        )
        .bind(table);

        let result = db.query(&statement).await.map_err(ServiceError::Columns)?;
        Ok(result
            .rows
            .iter()
            .filter_map(|row| match row.get(0) {
                Some(Value::Text(name)) => Some(name.clone()),
                _ => None,
            })
            .collect())
    }

    /// テーブルの全行を取得する
    pub async fn browse(&self, db: &dyn Database, role: Role, table: &str) -> Result<ResultSet, ServiceError> {
        self.access.check(role, table)?;
        let statement = Statement::new(format!("SELECT * FROM {}", quote_identifier(table)));
        Ok(db.query(&statement).await?)
    }

    /// 挿入フォーム用にカラム名を取得する
    pub async fn insert_form_columns(&self, db: &dyn Database, role: Role, table: &str) -> Result<Vec<String>, ServiceError> {
        self.access.check(role, table)?;
        self.table_columns(db, table).await
    }

    /// キーで特定した行の1カラムを更新する
    pub async fn update_cell(&self, db: &dyn Database, role: Role, update: &CellUpdate) -> Result<u64, ServiceError> {
        self.access.check(role, &update.table)?;
        let columns = self.table_columns(db, &update.table).await?;
        ensure_column(&columns, &update.table, &update.key_column)?;
        ensure_column(&columns, &update.table, &update.column)?;

        let statement = Statement::new(format!(
            "UPDATE {} SET {} = @P1 WHERE {} = @P2",
            quote_identifier(&update.table),
            quote_identifier(&update.column),
            quote_identifier(&update.key_column),
        ))
        .bind(update.new_value.as_str())
        .bind(update.key_value.as_str());

        let affected = db.execute(&statement).await?;
        debug!("{} 行を更新しました: {}", affected, statement);
        Ok(affected)
    }

    /// キーで特定した行を削除する
    pub async fn delete_row(
        &self,
        db: &dyn Database,
        role: Role,
        table: &str,
        key_column: &str,
        key_value: &str,
    ) -> Result<u64, ServiceError> {
        self.access.check(role, table)?;
        let columns = self.table_columns(db, table).await?;
        ensure_column(&columns, table, key_column)?;

        let statement = Statement::new(format!(
            "DELETE FROM {} WHERE {} = @P1",
            quote_identifier(table),
            quote_identifier(key_column),
        ))
        .bind(key_value);

        Ok(db.execute(&statement).await?)
    }

    /// 1行挿入する。空欄のフィールドは省略し、DB側の既定値に任せる
    pub async fn insert_row(
        &self,
        db: &dyn Database,
        role: Role,
        table: &str,
        fields: &[(String, String)],
    ) -> Result<u64, ServiceError> {
        self.access.check(role, table)?;
        let columns = self.table_columns(db, table).await?;

        let fields: Vec<&(String, String)> = fields.iter().filter(|(_, value)| !value.is_empty()).collect();
        if fields.is_empty() {
            return Err(ServiceError::NoValues);
        }
        for (column, _) in &fields {
            ensure_column(&columns, table, column)?;
        }

        let column_list = fields.iter().map(|(column, _)| quote_identifier(column)).join(", ");
        let placeholders = (1..=fields.len()).map(|i| format!("@P{}", i)).join(", ");
        let statement = fields.iter().fold(
            Statement::new(format!(
                "INSERT INTO {} ({}) VALUES ({})",
                quote_identifier(table),
                column_list,
                placeholders
            )),
            |statement, (_, value)| statement.bind(value.as_str()),
        );

        Ok(db.execute(&statement).await?)
    }

    /// レポートを実行する
    pub async fn run_report(
        &self,
        db: &dyn Database,
        role: Role,
        report_type: &str,
        filter_value: &str,
    ) -> Result<(ReportKind, ResultSet), ServiceError> {
        let kind = ReportKind::from_str(report_type)
            .ok()
            .filter(|kind| kind.is_available_to(role))
            .ok_or(CatalogError::UnknownReport)?;
        let result = db.query(&kind.statement(filter_value)).await?;
        Ok((kind, result))
    }

    /// 定義済みクエリを実行する
    pub async fn run_query(&self, db: &dyn Database, query_type: &str, input_value: &str) -> Result<ResultSet, ServiceError> {
        let kind = QueryKind::from_str(query_type).map_err(|_| CatalogError::UnknownQuery)?;
        let statement = kind.statement(input_value)?;
        Ok(db.query(&statement).await?)
    }

    /// ストアドプロシージャを実行し、金額カラムの書式を整える
    pub async fn run_procedure(&self, db: &dyn Database, procedure_name: &str, input_value: &str) -> Result<ResultSet, ServiceError> {
        let kind = ProcedureKind::from_str(procedure_name).map_err(|_| CatalogError::UnknownProcedure)?;
        let statement = kind.statement(input_value)?;
        let mut result = db.query(&statement).await?;

        if let Some(index) = result.column_index(ADDITIONAL_PAYMENT_COLUMN) {
            for row in result.rows.iter_mut() {
                if let Some(value) = row.values.get_mut(index) {
                    // 変換できない値はそのまま表示する
                    if let Ok(formatted) = convert_to_decimal(value) {
                        *value = Value::Text(formatted);
                    }
                }
            }
        }
        Ok(result)
    }
}

fn role_statement(source: &str, login: &str) -> Statement {
    Statement::new(format!("SELECT TOP 1 user_roles FROM {} WHERE login = @P1", source)).bind(login)
}

fn ensure_column(columns: &[String], table: &str, column: &str) -> Result<(), ServiceError> {
    if !is_identifier(column) {
        return Err(ServiceError::InvalidIdentifier(column.to_string()));
    }
    if columns.iter().any(|c| c == column) {
        Ok(())
    } else {
        Err(ServiceError::UnknownColumn {
            column: column.to_string(),
            table: table.to_string(),
        })
    }
}
