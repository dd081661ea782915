use rust_decimal::Decimal;
use std::collections::BTreeMap;

use super::{LedgerError, Transaction, category_key};
use crate::core::rate::CurrencyCode;

#[derive(Debug, Clone, PartialEq)]
pub struct Summary {
    pub total_income: Decimal,
    pub total_expense: Decimal,
    pub balance: Decimal,
    pub currency: CurrencyCode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryTotal {
    pub category: String,
    pub total: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategorySummary {
    pub income: Vec<CategoryTotal>,
    pub expense: Vec<CategoryTotal>,
    pub currency: CurrencyCode,
}

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyTotal {
    /// `YYYY-MM`
    pub month: String,
    pub income: Decimal,
    pub expense: Decimal,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Dashboard {
    pub summary: Summary,
    pub categories: CategorySummary,
    pub monthly: Vec<MonthlyTotal>,
}

impl Dashboard {
    pub fn build(
        transactions: &[Transaction],
        currency: &CurrencyCode,
    ) -> Result<Self, LedgerError> {
        Ok(Self {
            summary: summarize(transactions, currency)?,
            categories: summarize_by_category(transactions, currency)?,
            monthly: summarize_by_month(transactions)?,
        })
    }
}

fn add(total: Decimal, amount: Decimal, what: &'static str) -> Result<Decimal, LedgerError> {
    total.checked_add(amount).ok_or(LedgerError::Overflow(what))
}

pub fn summarize(
    transactions: &[Transaction],
    currency: &CurrencyCode,
) -> Result<Summary, LedgerError> {
    let mut total_income = Decimal::ZERO;
    let mut total_expense = Decimal::ZERO;
    for tx in transactions {
        if tx.is_income {
            total_income = add(total_income, tx.amount_in_target, "income")?;
        } else {
            total_expense = add(total_expense, tx.amount_in_target, "expense")?;
        }
    }

    Ok(Summary {
        total_income,
        total_expense,
        balance: total_income
            .checked_sub(total_expense)
            .ok_or(LedgerError::Overflow("balance"))?,
        currency: currency.clone(),
    })
}

/// Groups by case-folded name, shown under the first spelling seen.
fn category_totals<'a>(
    transactions: impl Iterator<Item = &'a Transaction>,
) -> Result<Vec<CategoryTotal>, LedgerError> {
    let mut totals: BTreeMap<String, CategoryTotal> = BTreeMap::new();
    for tx in transactions {
        let entry = totals
            .entry(category_key(&tx.category))
            .or_insert_with(|| CategoryTotal {
                category: tx.category.trim().to_string(),
                total: Decimal::ZERO,
            });
        entry.total = add(entry.total, tx.amount_in_target, "category")?;
    }
    Ok(totals.into_values().collect())
}

pub fn summarize_by_category(
    transactions: &[Transaction],
    currency: &CurrencyCode,
) -> Result<CategorySummary, LedgerError> {
    Ok(CategorySummary {
        income: category_totals(transactions.iter().filter(|tx| tx.is_income))?,
        expense: category_totals(transactions.iter().filter(|tx| !tx.is_income))?,
        currency: currency.clone(),
    })
}

pub fn summarize_by_month(transactions: &[Transaction]) -> Result<Vec<MonthlyTotal>, LedgerError> {
    let mut months: BTreeMap<String, (Decimal, Decimal)> = BTreeMap::new();
    for tx in transactions {
        let entry = months.entry(tx.date.format("%Y-%m").to_string()).or_default();
        if tx.is_income {
            entry.0 = add(entry.0, tx.amount_in_target, "monthly income")?;
        } else {
            entry.1 = add(entry.1, tx.amount_in_target, "monthly expense")?;
        }
    }
    Ok(months
        .into_iter()
        .map(|(month, (income, expense))| MonthlyTotal {
            month,
            income,
            expense,
        })
        .collect())
}
