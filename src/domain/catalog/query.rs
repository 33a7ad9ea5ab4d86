use chrono::NaiveDate;
use serde::Serialize;
use strum::{EnumIter, EnumString, IntoEnumIterator};

use crate::domain::catalog::CatalogError;
use crate::domain::entity::Statement;

/// 定義済みクエリ
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, EnumIter)]
#[strum(serialize_all = "camelCase")]
pub enum QueryKind {
    TotalBookCost,
    EmployeeSalesCount,
    CustomersByLetter,
    PublishersByDate,
    BooksSoldOnDate,
}

#[derive(Debug, Clone, Serialize)]
pub struct QueryEntry {
    pub key: &'static str,
    pub title: &'static str,
    pub input: Option<&'static str>,
}

const DATE_FORMAT: &str = "%Y-%m-%d";

impl QueryKind {
    pub fn key(&self) -> &'static str {
        match self {
            QueryKind::TotalBookCost => "totalBookCost",
            QueryKind::EmployeeSalesCount => "employeeSalesCount",
            QueryKind::CustomersByLetter => "customersByLetter",
            QueryKind::PublishersByDate => "publishersByDate",
            QueryKind::BooksSoldOnDate => "booksSoldOnDate",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            QueryKind::TotalBookCost => "Total value of books in the warehouse",
            QueryKind::EmployeeSalesCount => "Copies sold per employee",
            QueryKind::CustomersByLetter => "Customers by first letter",
            QueryKind::PublishersByDate => "Publishers with sales on a date",
            QueryKind::BooksSoldOnDate => "Pre-ordered books sold on a date",
        }
    }

    /// 入力欄のヒント（入力不要なら None）
    pub fn input_hint(&self) -> Option<&'static str> {
        match self {
            QueryKind::TotalBookCost | QueryKind::EmployeeSalesCount => None,
            QueryKind::CustomersByLetter => Some("letter"),
            QueryKind::PublishersByDate | QueryKind::BooksSoldOnDate => Some("YYYY-MM-DD"),
        }
    }

    pub fn entries() -> Vec<QueryEntry> {
        QueryKind::iter()
            .map(|kind| QueryEntry {
                key: kind.key(),
                title: kind.title(),
                input: kind.input_hint(),
            })
            .collect()
    }

    /// 入力値をバインドしたSQL文を作る
    pub fn statement(&self, input_value: &str) -> Result<Statement, CatalogError> {
        let statement = match self {
            QueryKind::TotalBookCost => Statement::new(
                "SELECT s.BookCode, b.Name AS BookName, SUM(s.Price * s.NumberOfCopies) AS TotalValue \
                 FROM Warehouse s \
                 JOIN Books b ON s.BookCode = b.BookCode \
                 GROUP BY s.BookCode, b.Name",
            ),
            QueryKind::EmployeeSalesCount => Statement::new(
                "SELECT e.FullName AS EmployeeName, SUM(s.Quantity) AS TotalSold \
                 FROM Sales s \
                 JOIN Employees e ON s.EmployeeID = e.EmployeeID \
                 GROUP BY e.FullName",
            ),
            QueryKind::CustomersByLetter => Statement::new(
                "SELECT CustomerInfo FROM Orders WHERE CustomerInfo LIKE @P1 + '%'",
            )
            .bind(input_value),
            QueryKind::PublishersByDate => Statement::new(
                "SELECT DISTINCT p.Name AS PublisherName, p.PublisherCode, s.SaleDate \
                 FROM Sales s \
                 JOIN Books b ON s.BookID = b.BookCode \
                 JOIN Publishers p ON s.PublisherID = p.PublisherCode \
                 WHERE s.SaleDate = @P1",
            )
            .bind(parse_date(input_value)?),
            QueryKind::BooksSoldOnDate => Statement::new(
                "SELECT b.Name AS BookTitle, s.Quantity \
                 FROM Sales s \
                 JOIN Books b ON s.BookID = b.BookCode \
                 WHERE s.SaleDate = @P1 AND s.IsOrder = 1",
            )
            .bind(parse_date(input_value)?),
        };
        Ok(statement)
    }
}

// 文字列のまま渡すと DATEFORMAT の設定で解釈が変わるので date 型でバインドする
fn parse_date(input: &str) -> Result<NaiveDate, CatalogError> {
    NaiveDate::parse_from_str(input.trim(), DATE_FORMAT)
        .map_err(|_| CatalogError::InvalidDate(input.to_string()))
}
