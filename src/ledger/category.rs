use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

use super::{LedgerError, Transaction};
use crate::store::{Record, RecordStore};

const MAX_NAME_LEN: usize = 150;

/// Comparison key for category names. Names are unique per owner ignoring case.
pub fn category_key(name: &str) -> String {
    name.trim().to_lowercase()
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Category {
    pub id: u64,
    pub owner: String,
    pub name: String,
    pub description: Option<String>,
}

impl Category {
    pub fn new(owner: &str, name: &str, description: Option<&str>) -> Self {
        Self {
            id: 0,
            owner: owner.to_string(),
            name: name.to_string(),
            description: description.map(str::to_string),
        }
    }
}

impl Record for Category {
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

#[derive(Debug, Clone, PartialEq)]
pub struct NewCategory {
    pub owner: String,
    pub name: String,
    pub description: Option<String>,
}

/// Per-owner category registry. Transactions may only use names registered here.
pub struct CategoryService {
    categories: Arc<dyn RecordStore<Category>>,
    transactions: Arc<dyn RecordStore<Transaction>>,
}

impl CategoryService {
    pub fn new(
        categories: Arc<dyn RecordStore<Category>>,
        transactions: Arc<dyn RecordStore<Transaction>>,
    ) -> Self {
        Self {
            categories,
            transactions,
        }
    }

    fn validate(new: &NewCategory) -> Result<(), LedgerError> {
        let name = new.name.trim();
        if name.is_empty() {
            return Err(LedgerError::Validation(
                "category name is required".to_string(),
            ));
        }
        if name.chars().count() > MAX_NAME_LEN {
            return Err(LedgerError::Validation(format!(
                "category name is longer than {MAX_NAME_LEN} characters"
            )));
        }
        Ok(())
    }

    /// Fails when another category of the owner already uses the name.
    async fn ensure_unique(
        &self,
        owner: &str,
        name: &str,
        except: Option<u64>,
    ) -> Result<(), LedgerError> {
        let key = category_key(name);
        let clash = self
            .categories
            .all(owner)
            .await?
            .into_iter()
            .any(|c| Some(c.id) != except && category_key(&c.name) == key);
        if clash {
            return Err(LedgerError::DuplicateCategory(name.trim().to_string()));
        }
        Ok(())
    }

    pub async fn list(&self, owner: &str) -> Result<Vec<Category>, LedgerError> {
        Ok(self.categories.all(owner).await?)
    }

    pub async fn get(&self, owner: &str, id: u64) -> Result<Category, LedgerError> {
        self.categories
            .get(owner, id)
            .await?
            .ok_or(LedgerError::CategoryNotFound(id))
    }

    pub async fn create(&self, new: NewCategory) -> Result<Category, LedgerError> {
        Self::validate(&new)?;
        self.ensure_unique(&new.owner, &new.name, None).await?;

        let category = Category {
            id: 0,
            owner: new.owner,
            name: new.name.trim().to_string(),
            description: new.description.filter(|d| !d.trim().is_empty()),
        };
        let stored = self.categories.insert(category).await?;
        info!(id = stored.id, name = %stored.name, "Created category");
        Ok(stored)
    }

    /// Renaming also renames the category on the owner's transactions.
    pub async fn update(&self, id: u64, new: NewCategory) -> Result<Category, LedgerError> {
        Self::validate(&new)?;
        let existing = self.get(&new.owner, id).await?;
        self.ensure_unique(&new.owner, &new.name, Some(id)).await?;

        let category = Category {
            id,
            owner: new.owner,
            name: new.name.trim().to_string(),
            description: new.description.filter(|d| !d.trim().is_empty()),
        };
        if !self.categories.update(category.clone()).await? {
            return Err(LedgerError::CategoryNotFound(id));
        }

        if existing.name != category.name {
            let old_key = category_key(&existing.name);
            let mut renamed = 0;
            for mut tx in self.transactions.all(&category.owner).await? {
                if category_key(&tx.category) == old_key {
                    tx.category = category.name.clone();
                    self.transactions.update(tx).await?;
                    renamed += 1;
                }
            }
            info!(id, renamed, "Renamed category on transactions");
        }

        info!(id, "Updated category");
        Ok(category)
    }

    /// Refuses to delete a category that transactions still use.
    pub async fn delete(&self, owner: &str, id: u64) -> Result<(), LedgerError> {
        let existing = self.get(owner, id).await?;

        let key = category_key(&existing.name);
        let count = self
            .transactions
            .all(owner)
            .await?
            .iter()
            .filter(|tx| category_key(&tx.category) == key)
            .count();
        if count > 0 {
            return Err(LedgerError::CategoryInUse {
                name: existing.name,
                count,
            });
        }

        if !self.categories.delete(owner, id).await? {
            return Err(LedgerError::CategoryNotFound(id));
        }
        info!(id, "Deleted category");
        Ok(())
    }
}
