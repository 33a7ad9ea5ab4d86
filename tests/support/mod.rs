//! 結合テスト用のフェイク接続とサーバー起動ヘルパー

use async_trait::async_trait;
use mockall::mock;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use bookstore_web::application::TableAccess;
use bookstore_web::domain::entity::{ResultSet, Statement, Value};
use bookstore_web::domain::repository::{Connector, Credentials, Database, DbError};
use bookstore_web::interface::api::{build_router, AppState};

mock! {
    pub Db {}

    #[async_trait]
    impl Database for Db {
        async fn ping(&self) -> Result<(), DbError>;
        async fn query(&self, statement: &Statement) -> Result<ResultSet, DbError>;
        async fn execute(&self, statement: &Statement) -> Result<u64, DbError>;
    }
}

/// ログイン名ごとに用意した接続を返すコネクタ
#[derive(Default)]
pub struct FakeConnector {
    databases: Mutex<Vec<(String, Arc<dyn Database>)>>,
}

impl FakeConnector {
    pub fn with(self, login: &str, db: MockDb) -> Self {
        if let Ok(mut databases) = self.databases.lock() {
            databases.push((login.to_string(), Arc::new(db)));
        }
        self
    }
}

#[async_trait]
impl Connector for FakeConnector {
    async fn connect(&self, credentials: &Credentials) -> Result<Arc<dyn Database>, DbError> {
        let databases = self.databases.lock().map_err(|e| DbError::Connection(e.to_string()))?;
        databases
            .iter()
            .find(|(login, _)| *login == credentials.login)
            .map(|(_, db)| db.clone())
            .ok_or_else(|| DbError::Connection(format!("Login failed for user '{}'", credentials.login)))
    }
}

pub fn access() -> TableAccess {
    TableAccess::new(
        vec!["Books".into(), "Authors".into()],
        vec!["Books".into(), "Authors".into(), "Orders".into()],
    )
}

/// ロール問い合わせに答えるモック接続
pub fn db_with_role(role: &'static str) -> MockDb {
    let mut db = MockDb::new();
    db.expect_ping().returning(|| Ok(()));
    db.expect_query()
        .withf(|s| s.sql.contains("user_roles"))
        .returning(move |_| Ok(ResultSet::new(vec!["user_roles".into()]).with_row(vec![Value::from(role)])));
    db
}

/// 0番ポートでサーバーを起動し、アドレスを返す
pub async fn spawn_app(connector: FakeConnector) -> SocketAddr {
    let state = AppState::new(Arc::new(connector), access(), Duration::from_secs(600)).expect("templates should load");
    let app = build_router(state);

    let server = axum::Server::bind(&"127.0.0.1:0".parse().expect("valid address"))
        .serve(app.into_make_service());
    let addr = server.local_addr();
    tokio::spawn(async move {
        server.await.expect("server error");
    });
    addr
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .cookie_store(true)
        .redirect(reqwest::redirect::Policy::none())
        .build()
        .expect("client should build")
}

/// ログインしてセッションCookieを持ったクライアントを返す
pub async fn login(addr: SocketAddr, user: &str) -> reqwest::Client {
    let client = client();
    let response = client
        .post(format!("http://{}/connect", addr))
        .form(&[("user", user), ("password", "secret")])
        .send()
        .await
        .expect("login request");
    assert!(response.status().is_success());
    client
}
