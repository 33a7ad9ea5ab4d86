use axum::extract::rejection::FormRejection;
use axum::extract::{Form, Query, State};
use axum::http::HeaderMap;
use axum::response::Response;
use minijinja::context;
use serde::Deserialize;
use std::fmt::Display;
use std::str::FromStr;
use tracing::{info, warn};

use crate::application::guard::contains_sql_keywords;
use crate::application::CellUpdate;
use crate::domain::catalog::{ProcedureKind, QueryKind, ReportKind};
use crate::domain::entity::Role;
use crate::domain::repository::Credentials;
use crate::infrastructure::session::Session;
use crate::interface::api::server::AppState;
use crate::interface::api::session::{
    expired_session_cookie, main_page, session_cookie, session_id, AdminSession, CurrentSession,
};
use crate::interface::api::view::{Notice, Page, TableData, Template};

const FORM_PARSE_ERROR: &str = "Error: failed to parse the form.";
const SQL_INPUT_ERROR: &str = "Error: SQL statements are not allowed in input fields!";
const NO_MATCHING_ROW: &str = "No matching row was found. Nothing was changed.";

/// ログインフォーム
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct LoginForm {
    pub user: String,
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct TableForm {
    pub table_name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReportForm {
    pub report_type: String,
    pub filter_value: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct QueryForm {
    pub query_type: String,
    pub input_value: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct EditForm {
    pub table_name: String,
    pub key_column: String,
    pub key_value: String,
    pub column_name: String,
    pub new_value: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct DeleteForm {
    pub table_name: String,
    pub key_column: String,
    pub key_value: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProcedureForm {
    pub procedure_name: String,
    pub input_value: String,
}

fn error_notice(err: impl Display) -> Notice {
    Notice::error(format!("Error: {}", err))
}

fn login_page(state: &AppState, notice: Notice) -> Response {
    state.views.respond(Page::new(Template::Login, context! { notice => notice }))
}

fn reports_page(template: Template, session: &Session, role: Role, notice: Notice) -> Page {
    Page::new(
        template,
        context! {
            notice => notice,
            login => session.login.clone(),
            role => session.role,
            reports => ReportKind::available_to(role),
        },
    )
}

fn queries_page(session: &Session, notice: Notice) -> Page {
    Page::new(
        Template::Queries,
        context! {
            notice => notice,
            login => session.login.clone(),
            role => session.role,
            queries => QueryKind::entries(),
        },
    )
}

fn procedures_page(session: &Session, notice: Notice) -> Page {
    Page::new(
        Template::AdminProcedures,
        context! {
            notice => notice,
            login => session.login.clone(),
            role => session.role,
            procedures => ProcedureKind::entries(),
        },
    )
}

/// 編集画面。テーブルを読み直して表示する
async fn edit_page(state: &AppState, session: &Session, table_name: &str, notice: Notice) -> Page {
    match state.service.browse(&*session.db, session.role, table_name).await {
        Ok(result) => Page::new(
            Template::AdminEdit,
            context! {
                notice => notice,
                login => session.login.clone(),
                role => session.role,
                table_name => table_name,
                key_column => result.columns.first().cloned().unwrap_or_default(),
                table => TableData::from(&result),
            },
        ),
        Err(e) => {
            // 元のメッセージがエラーならそれを優先する
            let notice = if notice.is_error { notice } else { error_notice(e) };
            Page::new(
                Template::AdminEdit,
                context! {
                    notice => notice,
                    login => session.login.clone(),
                    role => session.role,
                    table_name => table_name,
                },
            )
        }
    }
}

/// ログイン画面
pub async fn index_handler(State(state): State<AppState>) -> Response {
    state.views.respond(Page::new(Template::Login, context! {}))
}

/// 認証情報で接続し、ロールを確認してセッションを作成する
pub async fn connect_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    form: Result<Form<LoginForm>, FormRejection>,
) -> Response {
    let Form(form) = match form {
        Ok(form) => form,
        Err(e) => {
            warn!("ログインフォームを解析できません: {}", e);
            return login_page(&state, Notice::error(FORM_PARSE_ERROR));
        }
    };

    if contains_sql_keywords(&form.user) || contains_sql_keywords(&form.password) {
        warn!("ログインフォームにSQLキーワードが含まれています");
        return login_page(
            &state,
            Notice::error("Error: SQL statements are not allowed in the user and password fields!"),
        );
    }

    let credentials = Credentials::builder()
        .login(form.user)
        .password(form.password)
        .build();

    let db = match state.connector.connect(&credentials).await {
        Ok(db) => db,
        Err(e) => {
            warn!("{} の接続に失敗しました: {}", credentials.login, e);
            return login_page(&state, Notice::error(format!("Connection error: {}", e)));
        }
    };

    if let Err(e) = db.ping().await {
        warn!("{} の接続確認に失敗しました: {}", credentials.login, e);
        return login_page(&state, Notice::error(format!("Could not connect: {}", e)));
    }

    let role = match state.service.resolve_role(&*db, &credentials.login).await {
        Ok(Some(role)) => role,
        Ok(None) => {
            warn!("{} のロールが不明です", credentials.login);
            return login_page(&state, Notice::error("User role is unknown or access denied!"));
        }
        Err(e) => {
            warn!("{} のロールを取得できません: {}", credentials.login, e);
            return login_page(&state, error_notice(e));
        }
    };

    // 同じブラウザの古いセッションは破棄する
    if let Some(previous) = session_id(&headers) {
        state.sessions.remove(&previous).await;
    }
    let session = state.sessions.create(credentials.login.clone(), role, db).await;
    info!(
        "{} が {} としてログインしました (セッション数: {})",
        session.login,
        role,
        state.sessions.len().await
    );

    let message = match role {
        Role::Admin => "✅ Connected as administrator!",
        Role::User => "✅ Connected as user!",
    };
    let mut response = state.views.respond(main_page(&state, &session, Notice::info(message)));
    let (name, value) = session_cookie(&session.id);
    response.headers_mut().insert(name, value);
    response
}

/// セッションを破棄してログイン画面に戻る
pub async fn logout_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if let Some(id) = session_id(&headers) {
        if let Some(session) = state.sessions.remove(&id).await {
            info!("{} がログアウトしました", session.login);
        }
    }
    let mut response = login_page(&state, Notice::info("Disconnected."));
    let (name, value) = expired_session_cookie();
    response.headers_mut().insert(name, value);
    response
}

/// テーブルの全行を表示する
pub async fn view_table_handler(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    form: Result<Form<TableForm>, FormRejection>,
) -> Response {
    let Form(form) = match form {
        Ok(form) => form,
        Err(_) => return state.views.respond(main_page(&state, &session, Notice::error(FORM_PARSE_ERROR))),
    };

    info!("テーブルを表示: {}", form.table_name);
    let page = match state.service.browse(&*session.db, session.role, &form.table_name).await {
        Ok(result) => Page::new(
            Template::TableView,
            context! {
                notice => Notice::info("✅ Data retrieved successfully!"),
                login => session.login.clone(),
                role => session.role,
                table_name => form.table_name,
                table => TableData::from(&result),
            },
        ),
        Err(e) => main_page(&state, &session, error_notice(e)),
    };
    state.views.respond(page)
}

/// 管理者用レポートの選択画面
pub async fn admin_reports_handler(
    State(state): State<AppState>,
    AdminSession(session): AdminSession,
) -> Response {
    state.views.respond(reports_page(
        Template::AdminReports,
        &session,
        Role::Admin,
        Notice::info("Choose a report to view."),
    ))
}

/// 管理者用レポートを実行する
pub async fn view_report_handler(
    State(state): State<AppState>,
    AdminSession(session): AdminSession,
    form: Result<Form<ReportForm>, FormRejection>,
) -> Response {
    run_report(&state, &session, Template::AdminReports, Role::Admin, form, true).await
}

/// 一般ユーザー用レポートの選択画面
pub async fn user_reports_handler(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Response {
    state.views.respond(reports_page(
        Template::UserReports,
        &session,
        Role::User,
        Notice::info("Choose a report to view."),
    ))
}

/// 一般ユーザー用レポートを実行する
pub async fn view_user_report_handler(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    form: Result<Form<ReportForm>, FormRejection>,
) -> Response {
    run_report(&state, &session, Template::UserReports, Role::User, form, false).await
}

async fn run_report(
    state: &AppState,
    session: &Session,
    origin: Template,
    role: Role,
    form: Result<Form<ReportForm>, FormRejection>,
    check_input: bool,
) -> Response {
    let Form(form) = match form {
        Ok(form) => form,
        Err(_) => return state.views.respond(reports_page(origin, session, role, Notice::error(FORM_PARSE_ERROR))),
    };

    if check_input && contains_sql_keywords(&form.filter_value) {
        warn!("{} のレポート条件にSQLキーワードが含まれています", session.login);
        return state.views.respond(reports_page(origin, session, role, Notice::error(SQL_INPUT_ERROR)));
    }

    info!("レポートを実行: {}", form.report_type);
    let page = match state
        .service
        .run_report(&*session.db, role, &form.report_type, &form.filter_value)
        .await
    {
        Ok((kind, result)) => Page::new(
            Template::ReportView,
            context! {
                notice => Notice::info("✅ Data retrieved successfully."),
                login => session.login.clone(),
                role => session.role,
                report_type => kind.key(),
                report_title => kind.title(),
                table => TableData::from(&result),
            },
        ),
        Err(e) => reports_page(origin, session, role, error_notice(e)),
    };
    state.views.respond(page)
}

/// クエリの選択画面
pub async fn queries_handler(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
) -> Response {
    state.views.respond(queries_page(
        &session,
        Notice::info("Choose a query and enter a value if needed."),
    ))
}

/// 定義済みクエリを実行する
pub async fn execute_query_handler(
    State(state): State<AppState>,
    CurrentSession(session): CurrentSession,
    form: Result<Form<QueryForm>, FormRejection>,
) -> Response {
    let Form(form) = match form {
        Ok(form) => form,
        Err(_) => return state.views.respond(queries_page(&session, Notice::error(FORM_PARSE_ERROR))),
    };

    if contains_sql_keywords(&form.input_value) {
        warn!("{} のクエリ入力にSQLキーワードが含まれています", session.login);
        return state.views.respond(queries_page(&session, Notice::error(SQL_INPUT_ERROR)));
    }

    info!("クエリを実行: {}", form.query_type);
    let page = match state
        .service
        .run_query(&*session.db, &form.query_type, &form.input_value)
        .await
    {
        Ok(result) => Page::new(
            Template::QueryResult,
            context! {
                notice => Notice::info("✅ Query executed successfully."),
                login => session.login.clone(),
                role => session.role,
                query_title => QueryKind::from_str(&form.query_type).map(|k| k.title()).unwrap_or("Query result"),
                table => TableData::from(&result),
            },
        ),
        Err(e) => queries_page(&session, error_notice(e)),
    };
    state.views.respond(page)
}

/// 編集画面を表示する
pub async fn edit_table_handler(
    State(state): State<AppState>,
    AdminSession(session): AdminSession,
    Query(query): Query<TableForm>,
) -> Response {
    info!("テーブルを編集: {}", query.table_name);
    let page = match state.service.browse(&*session.db, session.role, &query.table_name).await {
        Ok(result) => Page::new(
            Template::AdminEdit,
            context! {
                notice => Notice::info("✅ Data retrieved for editing!"),
                login => session.login.clone(),
                role => session.role,
                table_name => query.table_name,
                key_column => result.columns.first().cloned().unwrap_or_default(),
                table => TableData::from(&result),
            },
        ),
        Err(e) => main_page(&state, &session, error_notice(e)),
    };
    state.views.respond(page)
}

/// 1セルを更新する
pub async fn update_cell_handler(
    State(state): State<AppState>,
    AdminSession(session): AdminSession,
    form: Result<Form<EditForm>, FormRejection>,
) -> Response {
    let Form(form) = match form {
        Ok(form) => form,
        Err(_) => return state.views.respond(main_page(&state, &session, Notice::error(FORM_PARSE_ERROR))),
    };

    let update = CellUpdate {
        table: form.table_name,
        key_column: form.key_column,
        key_value: form.key_value,
        column: form.column_name,
        new_value: form.new_value,
    };
    let notice = match state.service.update_cell(&*session.db, session.role, &update).await {
        Ok(0) => {
            warn!("{}.{} の更新対象が見つかりません ({} = {})", update.table, update.column, update.key_column, update.key_value);
            Notice::error(NO_MATCHING_ROW)
        }
        Ok(affected) => {
            info!("{}.{} を更新しました ({} 行)", update.table, update.column, affected);
            Notice::info("✅ Changes saved to the database!")
        }
        Err(e) => Notice::error(format!("Failed to update table: {}", e)),
    };
    let page = edit_page(&state, &session, &update.table, notice).await;
    state.views.respond(page)
}

/// 1行削除する
pub async fn delete_row_handler(
    State(state): State<AppState>,
    AdminSession(session): AdminSession,
    form: Result<Form<DeleteForm>, FormRejection>,
) -> Response {
    let Form(form) = match form {
        Ok(form) => form,
        Err(_) => return state.views.respond(main_page(&state, &session, Notice::error(FORM_PARSE_ERROR))),
    };

    let notice = match state
        .service
        .delete_row(&*session.db, session.role, &form.table_name, &form.key_column, &form.key_value)
        .await
    {
        Ok(0) => {
            warn!("{} の削除対象が見つかりません ({} = {})", form.table_name, form.key_column, form.key_value);
            Notice::error(NO_MATCHING_ROW)
        }
        Ok(affected) => {
            info!("{} から {} 行削除しました", form.table_name, affected);
            Notice::info("✅ Row deleted successfully!")
        }
        Err(e) => Notice::error(format!("Failed to delete row: {}", e)),
    };
    let page = edit_page(&state, &session, &form.table_name, notice).await;
    state.views.respond(page)
}

/// 行追加フォームを表示する
pub async fn add_row_form_handler(
    State(state): State<AppState>,
    AdminSession(session): AdminSession,
    Query(query): Query<TableForm>,
) -> Response {
    let page = match state
        .service
        .insert_form_columns(&*session.db, session.role, &query.table_name)
        .await
    {
        Ok(columns) => Page::new(
            Template::AdminEdit,
            context! {
                notice => Notice::info("✅ Columns retrieved. Fill in the fields to add a new row."),
                login => session.login.clone(),
                role => session.role,
                table_name => query.table_name,
                columns => columns,
            },
        ),
        Err(e) => main_page(&state, &session, error_notice(e)),
    };
    state.views.respond(page)
}

/// 1行追加する。`tableName` 以外のフィールドはカラム名として扱う
pub async fn insert_row_handler(
    State(state): State<AppState>,
    AdminSession(session): AdminSession,
    form: Result<Form<Vec<(String, String)>>, FormRejection>,
) -> Response {
    let Form(fields) = match form {
        Ok(form) => form,
        Err(_) => return state.views.respond(main_page(&state, &session, Notice::error(FORM_PARSE_ERROR))),
    };

    let (table, fields): (Vec<_>, Vec<_>) = fields.into_iter().partition(|(name, _)| name == "tableName");
    let table_name = table.into_iter().next().map(|(_, value)| value).unwrap_or_default();

    let notice = match state
        .service
        .insert_row(&*session.db, session.role, &table_name, &fields)
        .await
    {
        Ok(_) => {
            info!("{} に行を追加しました", table_name);
            Notice::info("✅ Row added successfully!")
        }
        Err(e) => Notice::error(format!("Failed to add row: {}", e)),
    };
    let page = edit_page(&state, &session, &table_name, notice).await;
    state.views.respond(page)
}

/// ストアドプロシージャの選択画面
pub async fn admin_procedures_handler(
    State(state): State<AppState>,
    AdminSession(session): AdminSession,
) -> Response {
    state.views.respond(procedures_page(
        &session,
        Notice::info("Choose a stored procedure to execute."),
    ))
}

/// ストアドプロシージャを実行する
pub async fn execute_procedure_handler(
    State(state): State<AppState>,
    AdminSession(session): AdminSession,
    form: Result<Form<ProcedureForm>, FormRejection>,
) -> Response {
    let Form(form) = match form {
        Ok(form) => form,
        Err(_) => return state.views.respond(procedures_page(&session, Notice::error(FORM_PARSE_ERROR))),
    };

    info!("プロシージャを実行: {}", form.procedure_name);
    let page = match state
        .service
        .run_procedure(&*session.db, &form.procedure_name, &form.input_value)
        .await
    {
        Ok(result) => Page::new(
            Template::ProcedureResult,
            context! {
                notice => Notice::info("✅ Procedure executed successfully."),
                login => session.login.clone(),
                role => session.role,
                procedure => form.procedure_name,
                table => TableData::from(&result),
            },
        ),
        Err(e) => procedures_page(&session, error_notice(e)),
    };
    state.views.respond(page)
}

