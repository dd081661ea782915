//! Personal finance ledger: transactions converted into the target currency.

pub mod category;
pub mod dashboard;
pub mod service;

use chrono::{Months, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt::Display;
use std::str::FromStr;
use thiserror::Error;

use crate::core::error::ResolveError;
use crate::core::rate::{CurrencyCode, Rate};
use crate::store::Record;

pub use category::{Category, CategoryService, NewCategory, category_key};
pub use dashboard::{CategorySummary, CategoryTotal, Dashboard, MonthlyTotal, Summary};
pub use service::TransactionService;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("transaction {0} not found")]
    NotFound(u64),

    #[error("category {0} not found")]
    CategoryNotFound(u64),

    #[error("unknown category: {0}")]
    UnknownCategory(String),

    #[error("category with same name already exists: {0}")]
    DuplicateCategory(String),

    #[error("category {name} is used by {count} transaction(s)")]
    CategoryInUse { name: String, count: usize },

    #[error("invalid input: {0}")]
    Validation(String),

    #[error("total overflowed while summing {0}")]
    Overflow(&'static str),

    #[error("currency conversion failed: {0}")]
    Rate(#[from] ResolveError),

    #[error("storage error: {0}")]
    Store(#[from] anyhow::Error),
}

/// A persisted transaction. `id` is assigned by the store on insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: u64,
    pub owner: String,
    pub amount: Decimal,
    pub currency: CurrencyCode,
    pub rate: Rate,
    pub amount_in_target: Decimal,
    pub is_income: bool,
    pub note: Option<String>,
    pub date: NaiveDate,
    pub category: String,
}

impl Record for Transaction {
    fn id(&self) -> u64 {
        self.id
    }

    fn set_id(&mut self, id: u64) {
        self.id = id;
    }

    fn owner(&self) -> &str {
        &self.owner
    }
}

/// User input for create and update.
#[derive(Debug, Clone, PartialEq)]
pub struct NewTransaction {
    pub owner: String,
    pub amount: Decimal,
    pub currency: CurrencyCode,
    pub is_income: bool,
    pub note: Option<String>,
    pub date: NaiveDate,
    pub category: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Period {
    OneMonth,
    #[default]
    ThreeMonths,
    SixMonths,
    NineMonths,
    TwelveMonths,
    All,
}

impl Period {
    /// First day included in the period, or `None` for no lower bound.
    pub fn start_date(&self, today: NaiveDate) -> Option<NaiveDate> {
        let months = match self {
            Period::OneMonth => 1,
            Period::ThreeMonths => 3,
            Period::SixMonths => 6,
            Period::NineMonths => 9,
            Period::TwelveMonths => 12,
            Period::All => return None,
        };
        today.checked_sub_months(Months::new(months))
    }
}

impl Display for Period {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}",
            match self {
                Period::OneMonth => "1m",
                Period::ThreeMonths => "3m",
                Period::SixMonths => "6m",
                Period::NineMonths => "9m",
                Period::TwelveMonths => "12m",
                Period::All => "all",
            }
        )
    }
}

impl FromStr for Period {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "1m" => Ok(Period::OneMonth),
            "3m" => Ok(Period::ThreeMonths),
            "6m" => Ok(Period::SixMonths),
            "9m" => Ok(Period::NineMonths),
            "12m" => Ok(Period::TwelveMonths),
            "all" => Ok(Period::All),
            _ => Err(anyhow::anyhow!("Invalid period: {}", s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct TransactionFilter {
    pub owner: String,
    pub since: Option<NaiveDate>,
    pub category: Option<String>,
}

impl TransactionFilter {
    pub fn matches(&self, tx: &Transaction) -> bool {
        tx.owner == self.owner
            && self.since.is_none_or(|since| tx.date >= since)
            && self
                .category
                .as_deref()
                .is_none_or(|category| category_key(&tx.category) == category_key(category))
    }
}

/// One-based page request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Page {
    pub number: usize,
    pub size: usize,
}

impl Page {
    pub fn new(number: usize, size: usize) -> Self {
        Self {
            number: number.max(1),
            size: size.max(1),
        }
    }
}

impl Default for Page {
    fn default() -> Self {
        Page::new(1, 10)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PageResult<T> {
    pub total: usize,
    pub page: usize,
    pub page_size: usize,
    pub items: Vec<T>,
}

/// Filters, orders newest first, and slices one page.
pub fn select_page(
    transactions: Vec<Transaction>,
    filter: &TransactionFilter,
    page: Page,
) -> PageResult<Transaction> {
    let mut matching: Vec<_> = transactions
        .into_iter()
        .filter(|tx| filter.matches(tx))
        .collect();
    matching.sort_by(|a, b| b.date.cmp(&a.date).then(b.id.cmp(&a.id)));

    let total = matching.len();
    let items = matching
        .into_iter()
        .skip((page.number - 1) * page.size)
        .take(page.size)
        .collect();

    PageResult {
        total,
        page: page.number,
        page_size: page.size,
        items,
    }
}
