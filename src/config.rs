use serde::Deserialize;
use std::net::{IpAddr, SocketAddr};
use std::path::Path;
use std::time::Duration;

use crate::application::guard::is_identifier;

/// 既定の設定ファイル（存在しなければ既定値を使う）
pub const DEFAULT_CONFIG_PATH: &str = "bookstore.toml";

/// 設定エラー
#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    ReadFile {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid value for {field}: {reason}")]
    InvalidValue { field: &'static str, reason: String },
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub tables: TablesConfig,
    pub logging: LoggingConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: IpAddr,
    pub port: u16,
    /// 最後のリクエストからこの秒数が過ぎたセッションは破棄する
    pub session_ttl_secs: u64,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: IpAddr::from([0, 0, 0, 0]),
            port: 8080, // デフォルトポート番号
            session_ttl_secs: 30 * 60,
        }
    }
}

impl ServerConfig {
    pub fn addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_secs)
    }
}

/// 接続先の SQL Server（認証情報はログインフォームから受け取る）
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub host: String,
    pub port: u16,
    pub name: String,
    /// サーバー証明書を検証しない（ローカル開発用）
    pub trust_cert: bool,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            host: "localhost".into(),
            port: 1433,
            name: "bookstore".into(),
            trust_cert: true,
        }
    }
}

/// ロールごとに一覧表示するテーブル
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TablesConfig {
    pub user: Vec<String>,
    pub admin: Vec<String>,
}

impl Default for TablesConfig {
    fn default() -> Self {
        let user: Vec<String> = ["Classifier", "Publishers", "Books", "Authors", "AuthorNames", "Editions", "Warehouse"]
            .iter()
            .map(|t| t.to_string())
            .collect();
        let admin = user
            .iter()
            .cloned()
            .chain(["Orders", "Sales", "Employees"].iter().map(|t| t.to_string()))
            .collect();
        Self { user, admin }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".into(),
            format: LogFormat::Compact,
        }
    }
}

impl AppConfig {
    /// 設定ファイルを読み込む
    /// パスが指定されていない場合、既定のファイルがなければ既定値を返す
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let path = match path {
            Some(path) => path,
            None => {
                let default_path = Path::new(DEFAULT_CONFIG_PATH);
                if !default_path.exists() {
                    return Ok(Self::default());
                }
                default_path
            }
        };

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFile {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml(&content)
    }

    /// コマンドラインのポート指定を反映し、もう一度検証する
    pub fn with_port(mut self, port: Option<u16>) -> Result<Self, ConfigError> {
        if let Some(port) = port {
            self.server.port = port;
        }
        self.validate()?;
        Ok(self)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: AppConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.port",
                reason: "port must not be 0".into(),
            });
        }
        if self.server.session_ttl_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "server.session_ttl_secs",
                reason: "session timeout must not be 0".into(),
            });
        }
        if self.database.host.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "database.host",
                reason: "host cannot be empty".into(),
            });
        }
        if self.database.name.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "database.name",
                reason: "database name cannot be empty".into(),
            });
        }
        for (field, tables) in [("tables.user", &self.tables.user), ("tables.admin", &self.tables.admin)] {
            if let Some(bad) = tables.iter().find(|t| !is_identifier(t)) {
                return Err(ConfigError::InvalidValue {
                    field,
                    reason: format!("'{}' is not a valid table name", bad),
                });
            }
        }
        Ok(())
    }
}
