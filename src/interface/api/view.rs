use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use minijinja::Environment;
use serde::Serialize;
use tracing::error;

use crate::domain::entity::ResultSet;
use crate::Error;

/// 画面テンプレート
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Template {
    Login,
    UserMain,
    AdminMain,
    TableView,
    AdminEdit,
    AdminReports,
    ReportView,
    UserReports,
    Queries,
    QueryResult,
    AdminProcedures,
    ProcedureResult,
}

impl Template {
    pub fn name(&self) -> &'static str {
        match self {
            Template::Login => "template.html",
            Template::UserMain => "combined_view.html",
            Template::AdminMain => "admin_main.html",
            Template::TableView => "admin_view.html",
            Template::AdminEdit => "admin_edit.html",
            Template::AdminReports => "admin_reports.html",
            Template::ReportView => "report_view.html",
            Template::UserReports => "user_reports.html",
            Template::Queries => "queries.html",
            Template::QueryResult => "query_result.html",
            Template::AdminProcedures => "admin_procedures.html",
            Template::ProcedureResult => "procedure_result.html",
        }
    }
}

// テンプレートはバイナリに埋め込む
const SOURCES: &[(&str, &str)] = &[
    ("layout.html", include_str!("../../../templates/layout.html")),
    ("macros.html", include_str!("../../../templates/macros.html")),
    ("template.html", include_str!("../../../templates/template.html")),
    ("combined_view.html", include_str!("../../../templates/combined_view.html")),
    ("admin_main.html", include_str!("../../../templates/admin_main.html")),
    ("admin_view.html", include_str!("../../../templates/admin_view.html")),
    ("admin_edit.html", include_str!("../../../templates/admin_edit.html")),
    ("admin_reports.html", include_str!("../../../templates/admin_reports.html")),
    ("report_view.html", include_str!("../../../templates/report_view.html")),
    ("user_reports.html", include_str!("../../../templates/user_reports.html")),
    ("queries.html", include_str!("../../../templates/queries.html")),
    ("query_result.html", include_str!("../../../templates/query_result.html")),
    ("admin_procedures.html", include_str!("../../../templates/admin_procedures.html")),
    ("procedure_result.html", include_str!("../../../templates/procedure_result.html")),
];

/// 画面に表示するメッセージ
#[derive(Debug, Clone, Serialize)]
pub struct Notice {
    pub text: String,
    pub is_error: bool,
}

impl Notice {
    pub fn info(text: impl Into<String>) -> Self {
        Self { text: text.into(), is_error: false }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self { text: text.into(), is_error: true }
    }
}

/// テンプレートに渡す表形式のデータ
#[derive(Debug, Clone, Default, Serialize)]
pub struct TableData {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl From<&ResultSet> for TableData {
    fn from(result: &ResultSet) -> Self {
        Self {
            columns: result.columns.clone(),
            rows: result
                .rows
                .iter()
                .map(|row| row.values.iter().map(|v| v.to_string()).collect())
                .collect(),
        }
    }
}

/// 描画する画面
#[derive(Debug)]
pub struct Page {
    pub template: Template,
    pub context: minijinja::Value,
    pub status: StatusCode,
}

impl Page {
    pub fn new<C: Serialize>(template: Template, context: C) -> Self {
        Self {
            template,
            context: minijinja::Value::from_serialize(context),
            status: StatusCode::OK,
        }
    }

    pub fn with_status(mut self, status: StatusCode) -> Self {
        self.status = status;
        self
    }
}

/// テンプレート環境
pub struct Views {
    env: Environment<'static>,
}

impl Views {
    /// すべてのテンプレートを読み込む。構文エラーがあれば起動時に失敗する
    pub fn load() -> crate::Result<Self> {
        let mut env = Environment::new();
        for &(name, source) in SOURCES {
            env.add_template(name, source)
                .map_err(|e| Error::Template(format!("{}: {}", name, e)))?;
        }
        Ok(Self { env })
    }

    pub fn render(&self, page: &Page) -> Result<String, minijinja::Error> {
        self.env.get_template(page.template.name())?.render(&page.context)
    }

    /// 画面を描画してレスポンスにする。描画に失敗した場合は 500 を返す
    pub fn respond(&self, page: Page) -> Response {
        match self.render(&page) {
            Ok(html) => (page.status, Html(html)).into_response(),
            Err(e) => {
                error!("テンプレートの描画に失敗しました ({}): {}", page.template.name(), e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    format!("Template rendering failed: {}", e),
                )
                    .into_response()
            }
        }
    }
}
