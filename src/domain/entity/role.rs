use derive_more::Display;
use serde::Serialize;
use strum::EnumString;

/// ログインユーザーのロール
/// `users.user_roles` の値をそのまま解析する（大文字小文字を区別）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize)]
pub enum Role {
    #[strum(serialize = "user")]
    #[display(fmt = "user")]
    #[serde(rename = "user")]
    User,

    #[strum(serialize = "admin")]
    #[display(fmt = "admin")]
    #[serde(rename = "admin")]
    Admin,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}
