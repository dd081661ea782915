use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info};

use super::{
    Category, Dashboard, LedgerError, NewTransaction, Page, PageResult, Period, Transaction,
    TransactionFilter, category_key, select_page,
};
use crate::core::currency::CurrencyRateProvider;
use crate::core::rate::{CurrencyCode, Rate};
use crate::store::RecordStore;

/// Ledger operations. Amounts are converted into `target` before anything is stored.
pub struct TransactionService {
    transactions: Arc<dyn RecordStore<Transaction>>,
    categories: Arc<dyn RecordStore<Category>>,
    rates: Arc<dyn CurrencyRateProvider>,
    target: CurrencyCode,
}

impl TransactionService {
    pub fn new(
        transactions: Arc<dyn RecordStore<Transaction>>,
        categories: Arc<dyn RecordStore<Category>>,
        rates: Arc<dyn CurrencyRateProvider>,
        target: CurrencyCode,
    ) -> Self {
        Self {
            transactions,
            categories,
            rates,
            target,
        }
    }

    pub fn target(&self) -> &CurrencyCode {
        &self.target
    }

    fn validate(new: &NewTransaction) -> Result<(), LedgerError> {
        if new.amount <= Decimal::ZERO {
            return Err(LedgerError::Validation(format!(
                "amount must be positive, got {}",
                new.amount
            )));
        }
        if new.category.trim().is_empty() {
            return Err(LedgerError::Validation("category is required".to_string()));
        }
        if new.owner.trim().is_empty() {
            return Err(LedgerError::Validation("owner is required".to_string()));
        }
        Ok(())
    }

    /// The owner's category with this name, in its registered spelling.
    async fn resolve_category(&self, owner: &str, name: &str) -> Result<String, LedgerError> {
        let key = category_key(name);
        self.categories
            .all(owner)
            .await?
            .into_iter()
            .find(|c| category_key(&c.name) == key)
            .map(|c| c.name)
            .ok_or_else(|| LedgerError::UnknownCategory(name.trim().to_string()))
    }

    /// Converts into a full row. Fails without side effects when no rate is available.
    async fn convert(&self, id: u64, new: NewTransaction) -> Result<Transaction, LedgerError> {
        Self::validate(&new)?;
        let category = self.resolve_category(&new.owner, &new.category).await?;

        let rate = if new.currency == self.target {
            Rate::ONE
        } else {
            self.rates
                .get_rate(new.currency.as_str(), self.target.as_str())
                .await?
        };
        let amount_in_target = new
            .amount
            .checked_mul(rate.value())
            .ok_or_else(|| LedgerError::Validation("amount too large".to_string()))?;
        debug!(
            amount = %new.amount,
            currency = %new.currency,
            %rate,
            %amount_in_target,
            "Converted amount"
        );

        Ok(Transaction {
            id,
            owner: new.owner,
            amount: new.amount,
            currency: new.currency,
            rate,
            amount_in_target,
            is_income: new.is_income,
            note: new.note.filter(|n| !n.trim().is_empty()),
            date: new.date,
            category,
        })
    }

    pub async fn create(&self, new: NewTransaction) -> Result<Transaction, LedgerError> {
        let transaction = self.convert(0, new).await?;
        let stored = self.transactions.insert(transaction).await?;
        info!(id = stored.id, "Created transaction");
        Ok(stored)
    }

    pub async fn update(&self, id: u64, new: NewTransaction) -> Result<Transaction, LedgerError> {
        if self.transactions.get(&new.owner, id).await?.is_none() {
            return Err(LedgerError::NotFound(id));
        }

        let transaction = self.convert(id, new).await?;
        if !self.transactions.update(transaction.clone()).await? {
            return Err(LedgerError::NotFound(id));
        }
        info!(id, "Updated transaction");
        Ok(transaction)
    }

    pub async fn delete(&self, owner: &str, id: u64) -> Result<(), LedgerError> {
        if !self.transactions.delete(owner, id).await? {
            return Err(LedgerError::NotFound(id));
        }
        info!(id, "Deleted transaction");
        Ok(())
    }

    pub async fn list(
        &self,
        owner: &str,
        period: Period,
        category: Option<String>,
        page: Page,
    ) -> Result<PageResult<Transaction>, LedgerError> {
        let today = chrono::Local::now().date_naive();
        let filter = TransactionFilter {
            owner: owner.to_string(),
            since: period.start_date(today),
            category,
        };
        let rows = self.transactions.all(owner).await?;
        Ok(select_page(rows, &filter, page))
    }

    pub async fn dashboard(&self, owner: &str) -> Result<Dashboard, LedgerError> {
        let transactions = self.transactions.all(owner).await?;
        Dashboard::build(&transactions, &self.target)
    }
}
