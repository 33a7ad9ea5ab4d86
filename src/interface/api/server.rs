use axum::{
    Router,
    routing::{get, post},
    Server,
};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::application::{BookstoreService, TableAccess};
use crate::config::AppConfig;
use crate::domain::repository::Connector;
use crate::infrastructure::mssql::MssqlConnector;
use crate::infrastructure::session::SessionStore;
use crate::interface::api::handler::{
    health_check_handler,
    get_tables_handler,
    get_table_handler,
};
use crate::interface::api::page::{
    index_handler,
    connect_handler,
    logout_handler,
    view_table_handler,
    admin_reports_handler,
    view_report_handler,
    user_reports_handler,
    view_user_report_handler,
    queries_handler,
    execute_query_handler,
    edit_table_handler,
    update_cell_handler,
    delete_row_handler,
    add_row_form_handler,
    insert_row_handler,
    admin_procedures_handler,
    execute_procedure_handler,
};
use crate::interface::api::view::Views;
use crate::Error;

/// ハンドラー間で共有する状態
#[derive(Clone)]
pub struct AppState {
    pub connector: Arc<dyn Connector>,
    pub sessions: Arc<SessionStore>,
    pub service: Arc<BookstoreService>,
    pub views: Arc<Views>,
}

impl AppState {
    pub fn new(connector: Arc<dyn Connector>, access: TableAccess, session_ttl: Duration) -> crate::Result<Self> {
        Ok(Self {
            connector,
            sessions: Arc::new(SessionStore::new(session_ttl)),
            service: Arc::new(BookstoreService::new(access)),
            views: Arc::new(Views::load()?),
        })
    }
}

/// ルーターの設定
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/connect", post(connect_handler))
        .route("/logout", get(logout_handler).post(logout_handler))
        .route("/admin_view", post(view_table_handler))
        .route("/admin_reports", get(admin_reports_handler))
        .route("/view_report", post(view_report_handler))
        .route("/user_reports", get(user_reports_handler))
        .route("/view_user_report", post(view_user_report_handler))
        .route("/queries", get(queries_handler))
        .route("/execute_query", post(execute_query_handler))
        .route("/admin_edit", get(edit_table_handler).post(update_cell_handler))
        .route("/delete_row", post(delete_row_handler))
        .route("/add_row", get(add_row_form_handler).post(insert_row_handler))
        .route("/admin_procedures", get(admin_procedures_handler))
        .route("/execute_procedure", post(execute_procedure_handler))
        .route("/health", get(health_check_handler))
        .route("/api/tables", get(get_tables_handler))
        .route("/api/tables/:table_name", get(get_table_handler))
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}

pub async fn start_server(config: AppConfig) -> crate::Result<()> {
    // 接続設定とテンプレートの初期化
    let connector: Arc<dyn Connector> = Arc::new(MssqlConnector::new(config.database.clone()));
    let access = TableAccess::new(config.tables.user.clone(), config.tables.admin.clone());
    let state = AppState::new(connector, access, config.server.session_ttl())?;

    let app = build_router(state);

    // サーバーのアドレス設定
    let addr: SocketAddr = config.server.addr();

    info!("サーバーを{}で起動中...", addr);
    info!(
        "接続先データベース: {}:{}/{}",
        config.database.host, config.database.port, config.database.name
    );

    // サーバーの起動
    Server::try_bind(&addr)
        .map_err(|e| Error::Server(format!("{}にバインドできません: {}", addr, e)))?
        .serve(app.into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| Error::Server(e.to_string()))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("シグナルハンドラーの登録に失敗しました: {}", e);
        std::future::pending::<()>().await;
    }
    info!("サーバーを停止します");
}
