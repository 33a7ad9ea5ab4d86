use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::request::Parts;
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use minijinja::context;
use std::sync::Arc;
use tracing::warn;
use uuid::Uuid;

use crate::domain::entity::Role;
use crate::infrastructure::session::Session;
use crate::interface::api::server::AppState;
use crate::interface::api::view::{Notice, Page, Template};

pub const SESSION_COOKIE: &str = "bookstore_session";

/// Cookie ヘッダーからセッションIDを取り出す
pub fn session_id(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .and_then(|(_, value)| Uuid::parse_str(value.trim()).ok())
}

pub fn session_cookie(id: &Uuid) -> (axum::http::HeaderName, HeaderValue) {
    let cookie = format!("{}={}; Path=/; HttpOnly; SameSite=Lax", SESSION_COOKIE, id);
    // UUIDとASCII文字だけなので常に有効なヘッダー値になる
    (SET_COOKIE, HeaderValue::from_str(&cookie).unwrap_or_else(|_| HeaderValue::from_static("")))
}

pub fn expired_session_cookie() -> (axum::http::HeaderName, HeaderValue) {
    (
        SET_COOKIE,
        HeaderValue::from_static("bookstore_session=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0"),
    )
}

/// ロール別のメイン画面
pub fn main_page(state: &AppState, session: &Session, notice: Notice) -> Page {
    let template = match session.role {
        Role::Admin => Template::AdminMain,
        Role::User => Template::UserMain,
    };
    Page::new(
        template,
        context! {
            notice => notice,
            login => session.login.clone(),
            role => session.role,
            tables => state.service.tables_for(session.role),
        },
    )
}

/// ログイン済みのセッション。なければトップページへリダイレクトする
pub struct CurrentSession(pub Arc<Session>);

#[async_trait]
impl FromRequestParts<AppState> for CurrentSession {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let id = match session_id(&parts.headers) {
            Some(id) => id,
            None => return Err(Redirect::to("/").into_response()),
        };
        match state.sessions.get(&id).await {
            Some(session) => Ok(CurrentSession(session)),
            None => Err(Redirect::to("/").into_response()),
        }
    }
}

/// 管理者ロールのセッション。一般ユーザーには 403 でメイン画面を返す
pub struct AdminSession(pub Arc<Session>);

#[async_trait]
impl FromRequestParts<AppState> for AdminSession {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let CurrentSession(session) = CurrentSession::from_request_parts(parts, state).await?;
        if session.role.is_admin() {
            return Ok(AdminSession(session));
        }

        warn!("{} が管理者用の画面 {} にアクセスしようとしました", session.login, parts.uri.path());
        let page = main_page(state, &session, Notice::error("Access denied: administrator role required."))
            .with_status(StatusCode::FORBIDDEN);
        Err(state.views.respond(page))
    }
}
