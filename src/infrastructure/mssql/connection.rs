use async_trait::async_trait;
use std::sync::Arc;
use tiberius::{AuthMethod, Client, Config};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_util::compat::{Compat, TokioAsyncWriteCompatExt};
use tracing::{debug, info};

use crate::config::DatabaseConfig;
use crate::domain::entity::{ResultSet, Row, Statement};
use crate::domain::repository::{Connector, Credentials, Database, DbError};
use crate::infrastructure::mssql::convert::{build_query, to_value};

type MssqlClient = Client<Compat<TcpStream>>;

/// SQL Server への1本の接続
/// tiberius のクライアントは `&mut` を要求するので、同じセッションの要求はここで直列化される
pub struct MssqlDatabase {
    client: Mutex<MssqlClient>,
}

impl MssqlDatabase {
    pub fn new(client: MssqlClient) -> Self {
        Self {
            client: Mutex::new(client),
        }
    }
}

fn query_error(err: tiberius::error::Error) -> DbError {
    DbError::Query(err.to_string())
}

#[async_trait]
impl Database for MssqlDatabase {
    async fn ping(&self) -> Result<(), DbError> {
        let mut client = self.client.lock().await;
        client
            .simple_query("SELECT 1")
            .await
            .map_err(|e| DbError::Ping(e.to_string()))?
            .into_results()
            .await
            .map_err(|e| DbError::Ping(e.to_string()))?;
        Ok(())
    }

    async fn query(&self, statement: &Statement) -> Result<ResultSet, DbError> {
        debug!("クエリを実行: {}", statement);
        let mut client = self.client.lock().await;
        let mut stream = build_query(statement)
            .query(&mut *client)
            .await
            .map_err(query_error)?;

        // 行がない場合でもカラム名を表示できるよう先に取得する
        let columns: Vec<String> = stream
            .columns()
            .await
            .map_err(query_error)?
            .map(|cols| cols.iter().map(|c| c.name().to_string()).collect())
            .unwrap_or_default();

        let rows = stream.into_first_result().await.map_err(query_error)?;

        let mut result = ResultSet::new(columns);
        for row in rows {
            let values = row
                .into_iter()
                .zip(result.columns.iter())
                .map(|(data, column)| to_value(column, &data))
                .collect::<Result<Vec<_>, _>>()?;
            result.add_row(Row::from_values(values));
        }
        Ok(result)
    }

    async fn execute(&self, statement: &Statement) -> Result<u64, DbError> {
        debug!("SQLを実行: {}", statement);
        let mut client = self.client.lock().await;
        let result = build_query(statement)
            .execute(&mut *client)
            .await
            .map_err(query_error)?;
        Ok(result.total())
    }
}

/// ログインフォームの認証情報で SQL Server に接続する
pub struct MssqlConnector {
    settings: DatabaseConfig,
}

impl MssqlConnector {
    pub fn new(settings: DatabaseConfig) -> Self {
        Self { settings }
    }

    fn client_config(&self, credentials: &Credentials) -> Config {
        let mut config = Config::new();
        config.host(&self.settings.host);
        config.port(self.settings.port);
        config.database(&self.settings.name);
        config.authentication(AuthMethod::sql_server(&credentials.login, &credentials.password));
        if self.settings.trust_cert {
            config.trust_cert();
        }
        config
    }
}

#[async_trait]
impl Connector for MssqlConnector {
    async fn connect(&self, credentials: &Credentials) -> Result<Arc<dyn Database>, DbError> {
        let config = self.client_config(credentials);

        let tcp = TcpStream::connect(config.get_addr())
            .await
            .map_err(|e| DbError::Connection(e.to_string()))?;
        tcp.set_nodelay(true)
            .map_err(|e| DbError::Connection(e.to_string()))?;

        let client = Client::connect(config, tcp.compat_write())
            .await
            .map_err(|e| DbError::Connection(e.to_string()))?;

        info!(
            "{}:{}/{} に {} として接続しました",
            self.settings.host, self.settings.port, self.settings.name, credentials.login
        );
        Ok(Arc::new(MssqlDatabase::new(client)))
    }
}
