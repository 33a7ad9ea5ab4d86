use sqlparser::dialect::MsSqlDialect;
use sqlparser::tokenizer::{Token, Tokenizer};

/// 入力欄で禁止するSQLキーワード
const SQL_KEYWORDS: [&str; 10] = [
    "SELECT", "UPDATE", "INSERT", "DELETE", "DROP", "ALTER", "CREATE", "EXEC", "UNION", "TRUNCATE",
];

/// 入力にSQLキーワードが含まれているかチェックする
/// 大文字に変換した部分文字列で判定するため "selected" も検出される
pub fn contains_sql_keywords(input: &str) -> bool {
    let upper = input.to_uppercase();
    SQL_KEYWORDS.iter().any(|keyword| upper.contains(keyword))
}

/// テーブル名・カラム名として使える識別子かチェックする
///
/// SQL Server方言で字句解析し、引用符なしの単語1つだけで構成されている必要がある。
/// 予約語も許可する（SQL文には常に角括弧で囲んで埋め込むため）。
/// `@` で始まる変数名と `#` で始まる一時テーブル名は対象外。
pub fn is_identifier(name: &str) -> bool {
    if name.starts_with(['@', '#']) {
        return false;
    }

    let dialect = MsSqlDialect {};
    match Tokenizer::new(&dialect, name).tokenize() {
        Ok(tokens) => matches!(
            tokens.as_slice(),
            [Token::Word(word)] if word.quote_style.is_none() && word.value == name
        ),
        Err(_) => false,
    }
}

/// 識別子を角括弧で囲む
pub fn quote_identifier(name: &str) -> String {
    format!("[{}]", name.replace(']', "]]"))
}
