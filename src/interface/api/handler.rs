use axum::{
    extract::{Path, Json, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

use crate::application::ServiceError;
use crate::interface::api::server::AppState;
use crate::interface::api::session::CurrentSession;

/// API エラー
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Not connected")]
    Unauthorized,

    #[error("Service error: {0}")]
    Service(#[from] ServiceError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            ApiError::Unauthorized => (StatusCode::UNAUTHORIZED, "Not connected".to_string()),
            ApiError::Service(e) => match e {
                ServiceError::TableNotAllowed(_) => (StatusCode::NOT_FOUND, e.to_string()),
                ServiceError::InvalidIdentifier(_) => (StatusCode::BAD_REQUEST, e.to_string()),
                _ => (StatusCode::BAD_GATEWAY, e.to_string()),
            },
        };

        let body = Json(ErrorResponse {
            error: error_message,
        });

        (status, body).into_response()
    }
}

/// エラーレスポンス
#[derive(Serialize)]
pub struct ErrorResponse {
    error: String,
}

/// テーブルの内容
#[derive(Serialize)]
pub struct TableRowsResponse {
    name: String,
    columns: Vec<String>,
    rows: Vec<serde_json::Value>,
}

/// ヘルスチェックハンドラー
pub async fn health_check_handler() -> impl IntoResponse {
    StatusCode::OK
}

/// テーブル一覧取得ハンドラー
pub async fn get_tables_handler(
    State(state): State<AppState>,
    session: Option<CurrentSession>,
) -> Result<Json<Vec<String>>, ApiError> {
    let CurrentSession(session) = session.ok_or(ApiError::Unauthorized)?;
    Ok(Json(state.service.tables_for(session.role).to_vec()))
}

/// テーブル内容取得ハンドラー
pub async fn get_table_handler(
    State(state): State<AppState>,
    Path(table_name): Path<String>,
    session: Option<CurrentSession>,
) -> Result<Json<TableRowsResponse>, ApiError> {
    let CurrentSession(session) = session.ok_or(ApiError::Unauthorized)?;
    let result = state.service.browse(&*session.db, session.role, &table_name).await?;

    // 結果を変換
    let rows = result.rows.iter().map(|row| {
        let mut obj = serde_json::Map::new();
        for (column, value) in result.columns.iter().zip(row.values.iter()) {
            obj.insert(column.clone(), value.to_json());
        }
        serde_json::Value::Object(obj)
    }).collect();

    Ok(Json(TableRowsResponse {
        name: table_name,
        columns: result.columns.clone(),
        rows,
    }))
}
