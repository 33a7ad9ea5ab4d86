use serde::Serialize;
use strum::{EnumIter, EnumString, IntoEnumIterator};

use crate::domain::entity::{Role, Statement};

/// 定義済みレポート（ビューへの部分一致検索）
#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumString, EnumIter)]
pub enum ReportKind {
    #[strum(serialize = "v_SalesByEmployeeAndDate")]
    SalesByEmployee,

    #[strum(serialize = "v_BooksByAuthor")]
    BooksByAuthor,

    #[strum(serialize = "v_ClassifierBooksInWarehouse")]
    ClassifierBooksInWarehouse,
}

/// テンプレートに渡すレポートの一覧項目
#[derive(Debug, Clone, Serialize)]
pub struct ReportEntry {
    pub key: &'static str,
    pub title: &'static str,
}

impl ReportKind {
    pub fn title(&self) -> &'static str {
        match self {
            ReportKind::SalesByEmployee => "Sales report by employee",
            ReportKind::BooksByAuthor => "Books by author",
            ReportKind::ClassifierBooksInWarehouse => "Books in stock by classifier section",
        }
    }

    /// 売上レポートは管理者のみ
    pub fn is_available_to(&self, role: Role) -> bool {
        match self {
            ReportKind::SalesByEmployee => role.is_admin(),
            ReportKind::BooksByAuthor | ReportKind::ClassifierBooksInWarehouse => true,
        }
    }

    /// ロールが利用できるレポートの一覧
    pub fn available_to(role: Role) -> Vec<ReportEntry> {
        ReportKind::iter()
            .filter(|kind| kind.is_available_to(role))
            .map(|kind| ReportEntry { key: kind.key(), title: kind.title() })
            .collect()
    }

    pub fn key(&self) -> &'static str {
        match self {
            ReportKind::SalesByEmployee => "v_SalesByEmployeeAndDate",
            ReportKind::BooksByAuthor => "v_BooksByAuthor",
            ReportKind::ClassifierBooksInWarehouse => "v_ClassifierBooksInWarehouse",
        }
    }

    /// フィルター値を部分一致でバインドしたSQL文を作る
    pub fn statement(&self, filter_value: &str) -> Statement {
        let (view, column) = match self {
            ReportKind::SalesByEmployee => ("v_SalesByEmployeeAndDate", "FullName"),
            ReportKind::BooksByAuthor => ("v_BooksByAuthor", "FullName"),
            ReportKind::ClassifierBooksInWarehouse => ("v_BooksInStockByClassifier", "Name"),
        };
        Statement::new(format!(
            "SELECT * FROM {} WHERE {} LIKE '%' + @P1 + '%'",
            view, column
        ))
        .bind(filter_value)
    }
}
