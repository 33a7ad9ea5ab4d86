//! Webインターフェースの結合テスト
//!
//! 実際にサーバーを起動し、フェイク接続を通してログインから各画面までを確認する。

mod support;

use mockall::predicate::eq;
use reqwest::StatusCode;
use rust_decimal::Decimal;

use bookstore_web::domain::entity::{ResultSet, Statement, Value};
use support::{client, db_with_role, login, spawn_app, FakeConnector, MockDb};

fn books() -> ResultSet {
    ResultSet::new(vec!["BookCode".into(), "Name".into(), "Price".into()])
        .with_row(vec![Value::Integer(1), Value::from("Dune"), Value::Decimal(Decimal::new(950, 2))])
        .with_row(vec![Value::Integer(2), Value::from("Solaris"), Value::Null])
}

fn expect_books(db: &mut MockDb) {
    db.expect_query()
        .withf(|s| s.sql == "SELECT * FROM [Books]")
        .returning(|_| Ok(books()));
}

fn expect_columns(db: &mut MockDb) {
    db.expect_query()
        .withf(|s| s.sql.contains("INFORMATION_SCHEMA.COLUMNS"))
        .returning(|_| {
            Ok(["BookCode", "Name", "Price"]
                .iter()
                .fold(ResultSet::new(vec!["COLUMN_NAME".into()]), |rs, name| {
                    rs.with_row(vec![Value::from(*name)])
                }))
        });
}

#[tokio::test]
async fn index_shows_login_form() {
    let addr = spawn_app(FakeConnector::default()).await;

    let response = client().get(format!("http://{}/", addr)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("name=\"user\""));
    assert!(body.contains("name=\"password\""));
}

#[tokio::test]
async fn login_with_sql_keyword_is_rejected() {
    let addr = spawn_app(FakeConnector::default().with("alice", db_with_role("admin"))).await;

    let response = client()
        .post(format!("http://{}/connect", addr))
        .form(&[("user", "alice"), ("password", "x' or 1=1; drop table users")])
        .send()
        .await
        .unwrap();

    assert!(response.headers().get("set-cookie").is_none());
    let body = response.text().await.unwrap();
    assert!(body.contains("SQL statements are not allowed in the user and password fields!"));
}

#[tokio::test]
async fn failed_connection_stays_on_login_page() {
    let addr = spawn_app(FakeConnector::default()).await;

    let response = client()
        .post(format!("http://{}/connect", addr))
        .form(&[("user", "mallory"), ("password", "guess")])
        .send()
        .await
        .unwrap();

    assert!(response.headers().get("set-cookie").is_none());
    let body = response.text().await.unwrap();
    assert!(body.contains("Connection error"));
    assert!(body.contains("name=\"password\""));
}

#[tokio::test]
async fn unknown_role_is_denied() {
    let addr = spawn_app(FakeConnector::default().with("guest", db_with_role("guest"))).await;

    let response = client()
        .post(format!("http://{}/connect", addr))
        .form(&[("user", "guest"), ("password", "secret")])
        .send()
        .await
        .unwrap();

    assert!(response.headers().get("set-cookie").is_none());
    let body = response.text().await.unwrap();
    assert!(body.contains("User role is unknown or access denied!"));
}

#[tokio::test]
async fn admin_login_lands_on_admin_page() {
    let addr = spawn_app(FakeConnector::default().with("alice", db_with_role("admin"))).await;

    let response = client()
        .post(format!("http://{}/connect", addr))
        .form(&[("user", "alice"), ("password", "secret")])
        .send()
        .await
        .unwrap();

    let cookie = response.headers().get("set-cookie").unwrap().to_str().unwrap().to_string();
    assert!(cookie.starts_with("bookstore_session="));
    let body = response.text().await.unwrap();
    assert!(body.contains("Connected as administrator!"));
    assert!(body.contains("Orders"));
}

#[tokio::test]
async fn user_login_lands_on_combined_view() {
    let addr = spawn_app(FakeConnector::default().with("bob", db_with_role("user"))).await;

    let response = client()
        .post(format!("http://{}/connect", addr))
        .form(&[("user", "bob"), ("password", "secret")])
        .send()
        .await
        .unwrap();

    let body = response.text().await.unwrap();
    assert!(body.contains("Connected as user!"));
    assert!(body.contains("Books"));
    assert!(!body.contains("Orders"));
}

#[tokio::test]
async fn pages_without_session_redirect_to_login() {
    let addr = spawn_app(FakeConnector::default()).await;

    for path in ["/queries", "/user_reports", "/admin_reports", "/admin_procedures"] {
        let response = client().get(format!("http://{}{}", addr, path)).send().await.unwrap();
        assert!(response.status().is_redirection(), "{} should redirect", path);
        assert_eq!(response.headers().get("location").unwrap(), "/");
    }
}

#[tokio::test]
async fn user_cannot_open_admin_pages() {
    let addr = spawn_app(FakeConnector::default().with("bob", db_with_role("user"))).await;
    let client = login(addr, "bob").await;

    for path in ["/admin_reports", "/admin_procedures", "/admin_edit?tableName=Books"] {
        let response = client.get(format!("http://{}{}", addr, path)).send().await.unwrap();
        assert_eq!(response.status(), StatusCode::FORBIDDEN, "{}", path);
        let body = response.text().await.unwrap();
        assert!(body.contains("Access denied: administrator role required."));
    }
}

#[tokio::test]
async fn user_browses_allowed_table() {
    let mut db = db_with_role("user");
    expect_books(&mut db);
    let addr = spawn_app(FakeConnector::default().with("bob", db)).await;
    let client = login(addr, "bob").await;

    let response = client
        .post(format!("http://{}/admin_view", addr))
        .form(&[("tableName", "Books")])
        .send()
        .await
        .unwrap();

    let body = response.text().await.unwrap();
    assert!(body.contains("Data retrieved successfully!"));
    assert!(body.contains("Solaris"));
    assert!(body.contains("9.50"));
    assert!(body.contains("NULL"));
}

#[tokio::test]
async fn user_cannot_browse_admin_table() {
    let addr = spawn_app(FakeConnector::default().with("bob", db_with_role("user"))).await;
    let client = login(addr, "bob").await;

    let response = client
        .post(format!("http://{}/admin_view", addr))
        .form(&[("tableName", "Orders")])
        .send()
        .await
        .unwrap();

    let body = response.text().await.unwrap();
    assert!(body.contains("table Orders is not available"));
}

#[tokio::test]
async fn admin_updates_a_cell() {
    let mut db = db_with_role("admin");
    expect_columns(&mut db);
    db.expect_execute()
        .with(eq(Statement::new("UPDATE [Books] SET [Name] = @P1 WHERE [BookCode] = @P2")
            .bind("Dune Messiah")
            .bind("1")))
        .times(1)
        .returning(|_| Ok(1));
    expect_books(&mut db);
    let addr = spawn_app(FakeConnector::default().with("alice", db)).await;
    let client = login(addr, "alice").await;

    let response = client
        .post(format!("http://{}/admin_edit", addr))
        .form(&[
            ("tableName", "Books"),
            ("keyColumn", "BookCode"),
            ("keyValue", "1"),
            ("columnName", "Name"),
            ("newValue", "Dune Messiah"),
        ])
        .send()
        .await
        .unwrap();

    let body = response.text().await.unwrap();
    assert!(body.contains("Changes saved to the database!"));
    assert!(body.contains("Solaris"));
}

#[tokio::test]
async fn admin_inserts_a_row_without_empty_fields() {
    let mut db = db_with_role("admin");
    expect_columns(&mut db);
    db.expect_execute()
        .with(eq(Statement::new("INSERT INTO [Books] ([Name]) VALUES (@P1)").bind("Roadside Picnic")))
        .times(1)
        .returning(|_| Ok(1));
    expect_books(&mut db);
    let addr = spawn_app(FakeConnector::default().with("alice", db)).await;
    let client = login(addr, "alice").await;

    let response = client
        .post(format!("http://{}/add_row", addr))
        .form(&[("tableName", "Books"), ("BookCode", ""), ("Name", "Roadside Picnic"), ("Price", "")])
        .send()
        .await
        .unwrap();

    let body = response.text().await.unwrap();
    assert!(body.contains("Row added successfully!"));
}

#[tokio::test]
async fn query_input_with_sql_keyword_never_reaches_database() {
    // ロール問い合わせ以外のクエリが来たらモックがパニックする
    let addr = spawn_app(FakeConnector::default().with("bob", db_with_role("user"))).await;
    let client = login(addr, "bob").await;

    let response = client
        .post(format!("http://{}/execute_query", addr))
        .form(&[("queryType", "customersByLetter"), ("inputValue", "x; DELETE FROM Books")])
        .send()
        .await
        .unwrap();

    let body = response.text().await.unwrap();
    assert!(body.contains("SQL statements are not allowed in input fields!"));
}

#[tokio::test]
async fn procedure_result_formats_additional_payment() {
    let mut db = db_with_role("admin");
    db.expect_query()
        .withf(|s| s.sql == "EXEC CalculateAdditionalPayment @BookCode = @P1" && s.params == vec![Value::Integer(4)])
        .returning(|_| {
            Ok(ResultSet::new(vec!["BookCode".into(), "AdditionalPayment".into()])
                .with_row(vec![Value::Integer(4), Value::Float(3.14159)]))
        });
    let addr = spawn_app(FakeConnector::default().with("alice", db)).await;
    let client = login(addr, "alice").await;

    let response = client
        .post(format!("http://{}/execute_procedure", addr))
        .form(&[("procedureName", "CalculateAdditionalPayment"), ("inputValue", "4")])
        .send()
        .await
        .unwrap();

    let body = response.text().await.unwrap();
    assert!(body.contains("Procedure executed successfully."));
    assert!(body.contains("3.14"));
    assert!(!body.contains("3.14159"));
}

#[tokio::test]
async fn logout_ends_the_session() {
    let addr = spawn_app(FakeConnector::default().with("bob", db_with_role("user"))).await;
    let client = login(addr, "bob").await;

    let response = client.get(format!("http://{}/queries", addr)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = client.get(format!("http://{}/logout", addr)).send().await.unwrap();
    assert!(response.text().await.unwrap().contains("Disconnected."));

    let response = client.get(format!("http://{}/queries", addr)).send().await.unwrap();
    assert!(response.status().is_redirection());
}

#[tokio::test]
async fn json_api_requires_session() {
    let addr = spawn_app(FakeConnector::default()).await;

    let response = client().get(format!("http://{}/health", addr)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = client().get(format!("http://{}/api/tables", addr)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Not connected");
}

#[tokio::test]
async fn json_api_returns_table_rows() {
    let mut db = db_with_role("user");
    expect_books(&mut db);
    let addr = spawn_app(FakeConnector::default().with("bob", db)).await;
    let client = login(addr, "bob").await;

    let tables: Vec<String> = client
        .get(format!("http://{}/api/tables", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(tables, vec!["Books".to_string(), "Authors".to_string()]);

    let body: serde_json::Value = client
        .get(format!("http://{}/api/tables/Books", addr))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["name"], "Books");
    assert_eq!(body["rows"][0]["Name"], "Dune");
    assert!(body["rows"][1]["Price"].is_null());

    let response = client.get(format!("http://{}/api/tables/Orders", addr)).send().await.unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn admin_deletes_a_row() {
    let mut db = db_with_role("admin");
    expect_columns(&mut db);
    db.expect_execute()
        .with(eq(Statement::new("DELETE FROM [Books] WHERE [BookCode] = @P1").bind("2")))
        .times(1)
        .returning(|_| Ok(1));
    expect_books(&mut db);
    let addr = spawn_app(FakeConnector::default().with("alice", db)).await;
    let client = login(addr, "alice").await;

    let response = client
        .post(format!("http://{}/delete_row", addr))
        .form(&[("tableName", "Books"), ("keyColumn", "BookCode"), ("keyValue", "2")])
        .send()
        .await
        .unwrap();

    let body = response.text().await.unwrap();
    assert!(body.contains("Row deleted successfully!"));
}

#[tokio::test]
async fn delete_and_update_without_match_are_reported() {
    let mut db = db_with_role("admin");
    expect_columns(&mut db);
    db.expect_execute().times(2).returning(|_| Ok(0));
    expect_books(&mut db);
    let addr = spawn_app(FakeConnector::default().with("alice", db)).await;
    let client = login(addr, "alice").await;

    let body = client
        .post(format!("http://{}/delete_row", addr))
        .form(&[("tableName", "Books"), ("keyColumn", "BookCode"), ("keyValue", "NULL")])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("No matching row was found. Nothing was changed."));
    assert!(!body.contains("Row deleted successfully!"));

    let body = client
        .post(format!("http://{}/admin_edit", addr))
        .form(&[
            ("tableName", "Books"),
            ("keyColumn", "BookCode"),
            ("keyValue", "99"),
            ("columnName", "Name"),
            ("newValue", "Ghost"),
        ])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("No matching row was found. Nothing was changed."));
    assert!(!body.contains("Changes saved to the database!"));
}

#[tokio::test]
async fn add_row_form_lists_table_columns() {
    let mut db = db_with_role("admin");
    expect_columns(&mut db);
    let addr = spawn_app(FakeConnector::default().with("alice", db)).await;
    let client = login(addr, "alice").await;

    let response = client
        .get(format!("http://{}/add_row?tableName=Books", addr))
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("Fill in the fields to add a new row."));
    for column in ["BookCode", "Name", "Price"] {
        assert!(body.contains(&format!("name=\"{}\"", column)), "{}", column);
    }
    assert!(body.contains("name=\"tableName\" value=\"Books\""));
}

#[tokio::test]
async fn admin_report_filter_is_keyword_checked() {
    // ロール問い合わせ以外のクエリが来たらモックがパニックする
    let addr = spawn_app(FakeConnector::default().with("alice", db_with_role("admin"))).await;
    let client = login(addr, "alice").await;

    let body = client
        .post(format!("http://{}/view_report", addr))
        .form(&[("reportType", "v_BooksByAuthor"), ("filterValue", "x' union select 1 --")])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("SQL statements are not allowed in input fields!"));
}

#[tokio::test]
async fn admin_runs_sales_report() {
    let mut db = db_with_role("admin");
    db.expect_query()
        .withf(|s| {
            s.sql == "SELECT * FROM v_SalesByEmployeeAndDate WHERE FullName LIKE '%' + @P1 + '%'"
                && s.params == vec![Value::from("Ivan")]
        })
        .times(1)
        .returning(|_| {
            Ok(ResultSet::new(vec!["FullName".into(), "Quantity".into()])
                .with_row(vec![Value::from("Ivan Petrov"), Value::Integer(12)]))
        });
    let addr = spawn_app(FakeConnector::default().with("alice", db)).await;
    let client = login(addr, "alice").await;

    let body = client
        .post(format!("http://{}/view_report", addr))
        .form(&[("reportType", "v_SalesByEmployeeAndDate"), ("filterValue", "Ivan")])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("Sales report by employee"));
    assert!(body.contains("Ivan Petrov"));
}

#[tokio::test]
async fn user_report_filter_is_bound_without_keyword_check() {
    let mut db = db_with_role("user");
    db.expect_query()
        .withf(|s| s.sql.contains("FROM v_BooksByAuthor") && s.params == vec![Value::from("Selected Works")])
        .times(1)
        .returning(|_| {
            Ok(ResultSet::new(vec!["FullName".into(), "Name".into()])
                .with_row(vec![Value::from("Stanislaw Lem"), Value::from("Selected Works")]))
        });
    let addr = spawn_app(FakeConnector::default().with("bob", db)).await;
    let client = login(addr, "bob").await;

    let body = client
        .post(format!("http://{}/view_user_report", addr))
        .form(&[("reportType", "v_BooksByAuthor"), ("filterValue", "Selected Works")])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("Data retrieved successfully."));
    assert!(body.contains("Stanislaw Lem"));
}

#[tokio::test]
async fn user_cannot_run_sales_report() {
    let addr = spawn_app(FakeConnector::default().with("bob", db_with_role("user"))).await;
    let client = login(addr, "bob").await;

    let response = client
        .post(format!("http://{}/view_user_report", addr))
        .form(&[("reportType", "v_SalesByEmployeeAndDate"), ("filterValue", "")])
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = response.text().await.unwrap();
    assert!(body.contains("unknown report type"));
}

#[tokio::test]
async fn malformed_date_never_reaches_database() {
    let addr = spawn_app(FakeConnector::default().with("bob", db_with_role("user"))).await;
    let client = login(addr, "bob").await;

    let body = client
        .post(format!("http://{}/execute_query", addr))
        .form(&[("queryType", "booksSoldOnDate"), ("inputValue", "2024-13-45")])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("expected YYYY-MM-DD"));
}

#[tokio::test]
async fn date_query_binds_a_typed_date() {
    let mut db = db_with_role("user");
    db.expect_query()
        .withf(|s| s.sql.contains("s.SaleDate = @P1") && matches!(s.params.as_slice(), [Value::Date(_)]))
        .times(1)
        .returning(|_| {
            Ok(ResultSet::new(vec!["PublisherName".into()]).with_row(vec![Value::from("Mir")]))
        });
    let addr = spawn_app(FakeConnector::default().with("bob", db)).await;
    let client = login(addr, "bob").await;

    let body = client
        .post(format!("http://{}/execute_query", addr))
        .form(&[("queryType", "publishersByDate"), ("inputValue", "2024-03-05")])
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();
    assert!(body.contains("Query executed successfully."));
    assert!(body.contains("Mir"));
}
