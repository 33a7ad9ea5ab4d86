use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::RwLock;
use tracing::info;
use uuid::Uuid;

use crate::domain::entity::Role;
use crate::domain::repository::Database;

/// ログイン済みのセッション
/// 接続はセッションごとに持ち、他のセッションと共有しない
pub struct Session {
    pub id: Uuid,
    pub login: String,
    pub role: Role,
    pub db: Arc<dyn Database>,
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for Session {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Session")
            .field("id", &self.id)
            .field("login", &self.login)
            .field("role", &self.role)
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// ストア内のエントリ。最終アクセス時刻で期限を判定する
struct Entry {
    session: Arc<Session>,
    last_seen: Instant,
}

impl Entry {
    fn is_expired(&self, now: Instant, ttl: Duration) -> bool {
        now.saturating_duration_since(self.last_seen) >= ttl
    }
}

/// インメモリのセッションストア
/// 一定時間アクセスのないセッションは `create` と `get` のたびに取り除く
pub struct SessionStore {
    sessions: RwLock<HashMap<Uuid, Entry>>,
    ttl: Duration,
}

impl SessionStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl,
        }
    }

    /// 新しいセッションを登録する
    pub async fn create(&self, login: impl Into<String>, role: Role, db: Arc<dyn Database>) -> Arc<Session> {
        let session = Arc::new(Session {
            id: Uuid::new_v4(),
            login: login.into(),
            role,
            db,
            created_at: Utc::now(),
        });

        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        self.evict_expired(&mut sessions, now);
        sessions.insert(
            session.id,
            Entry {
                session: session.clone(),
                last_seen: now,
            },
        );
        session
    }

    /// セッションを取得し、最終アクセス時刻を更新する
    pub async fn get(&self, id: &Uuid) -> Option<Arc<Session>> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        self.evict_expired(&mut sessions, now);
        sessions.get_mut(id).map(|entry| {
            entry.last_seen = now;
            entry.session.clone()
        })
    }

    /// セッションを削除する（接続は最後の参照が消えた時点で閉じる）
    pub async fn remove(&self, id: &Uuid) -> Option<Arc<Session>> {
        self.sessions.write().await.remove(id).map(|entry| entry.session)
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.sessions.read().await.is_empty()
    }

    fn evict_expired(&self, sessions: &mut HashMap<Uuid, Entry>, now: Instant) {
        sessions.retain(|_, entry| {
            if entry.is_expired(now, self.ttl) {
                info!(
                    "{} のセッションが期限切れになりました (ログイン: {})",
                    entry.session.login, entry.session.created_at
                );
                false
            } else {
                true
            }
        });
    }
}
