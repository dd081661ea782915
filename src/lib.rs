pub mod cli;
pub mod core;
pub mod ledger;
pub mod providers;
pub mod store;

use anyhow::{Context, Result};
use chrono::NaiveDate;
use rust_decimal::Decimal;
use std::sync::Arc;
use tracing::{debug, info};

use crate::core::RateResolver;
use crate::core::config::AppConfig;
use crate::ledger::{
    Category, CategoryService, NewCategory, NewTransaction, Page, Period, Transaction,
    TransactionService,
};
use crate::store::{LedgerDb, RecordStore};

/// Transaction fields as entered on the command line.
#[derive(Debug, Clone)]
pub struct TransactionInput {
    pub amount: Decimal,
    pub currency: String,
    pub category: String,
    pub is_income: bool,
    pub note: Option<String>,
    /// Defaults to today.
    pub date: Option<NaiveDate>,
}

impl TransactionInput {
    fn into_new(self, owner: &str) -> Result<NewTransaction> {
        Ok(NewTransaction {
            owner: owner.to_string(),
            amount: self.amount,
            currency: self
                .currency
                .parse()
                .with_context(|| format!("Invalid currency: {}", self.currency))?,
            is_income: self.is_income,
            note: self.note,
            date: self
                .date
                .unwrap_or_else(|| chrono::Local::now().date_naive()),
            category: self.category,
        })
    }
}

#[derive(Debug, Clone)]
pub enum CategoryCommand {
    Add {
        name: String,
        description: Option<String>,
    },
    List,
    Show {
        id: u64,
    },
    Edit {
        id: u64,
        name: String,
        description: Option<String>,
    },
    Delete {
        id: u64,
    },
}

#[derive(Debug, Clone)]
pub enum AppCommand {
    Rate { from: String, to: Option<String> },
    Latest,
    Add(TransactionInput),
    Edit { id: u64, input: TransactionInput },
    Delete { id: u64 },
    List {
        period: Period,
        category: Option<String>,
        page: Page,
    },
    Dashboard,
    Category(CategoryCommand),
}

struct Ledger {
    transactions: Arc<dyn RecordStore<Transaction>>,
    categories: Arc<dyn RecordStore<Category>>,
}

impl Ledger {
    fn open(config: &AppConfig) -> Result<Self> {
        let data_path = config.default_data_path()?;
        debug!("Using data path: {}", data_path.display());
        let db = LedgerDb::open(&data_path)?;
        Ok(Self {
            transactions: Arc::new(db.collection::<Transaction>("transactions")?),
            categories: Arc::new(db.collection::<Category>("categories")?),
        })
    }

    fn transactions(&self, resolver: Arc<RateResolver>) -> TransactionService {
        let target = resolver.target().clone();
        TransactionService::new(
            self.transactions.clone(),
            self.categories.clone(),
            resolver,
            target,
        )
    }

    fn categories(&self) -> CategoryService {
        CategoryService::new(self.categories.clone(), self.transactions.clone())
    }
}

async fn run_category_command(command: CategoryCommand, config: &AppConfig) -> Result<()> {
    let service = Ledger::open(config)?.categories();
    let owner = config.owner.as_str();
    let new_category = |name: String, description: Option<String>| NewCategory {
        owner: owner.to_string(),
        name,
        description,
    };

    match command {
        CategoryCommand::Add { name, description } => {
            cli::categories::add(&service, new_category(name, description)).await
        }
        CategoryCommand::List => cli::categories::list(&service, owner).await,
        CategoryCommand::Show { id } => cli::categories::show(&service, owner, id).await,
        CategoryCommand::Edit {
            id,
            name,
            description,
        } => cli::categories::edit(&service, id, new_category(name, description)).await,
        CategoryCommand::Delete { id } => cli::categories::delete(&service, owner, id).await,
    }
}

pub async fn run_command(command: AppCommand, config_path: Option<&str>) -> Result<()> {
    info!("fintrack starting...");

    let config = match config_path {
        Some(path) => AppConfig::load_from_path(path)?,
        None => AppConfig::load()?,
    };
    debug!("Loaded config: {config:#?}");

    let resolver = Arc::new(providers::build_resolver(&config)?);
    let owner = config.owner.as_str();

    match command {
        AppCommand::Rate { from, to } => cli::rates::rate(&resolver, &from, to.as_deref()).await,
        AppCommand::Latest => cli::rates::latest(&resolver, &config.watchlist).await,
        AppCommand::Add(input) => {
            let service = Ledger::open(&config)?.transactions(resolver);
            cli::ledger::add(&service, input.into_new(owner)?).await
        }
        AppCommand::Edit { id, input } => {
            let service = Ledger::open(&config)?.transactions(resolver);
            cli::ledger::edit(&service, id, input.into_new(owner)?).await
        }
        AppCommand::Delete { id } => {
            let service = Ledger::open(&config)?.transactions(resolver);
            cli::ledger::delete(&service, owner, id).await
        }
        AppCommand::List {
            period,
            category,
            page,
        } => {
            let service = Ledger::open(&config)?.transactions(resolver);
            cli::ledger::list(&service, owner, period, category, page).await
        }
        AppCommand::Dashboard => {
            let service = Ledger::open(&config)?.transactions(resolver);
            cli::ledger::dashboard(&service, owner).await
        }
        AppCommand::Category(command) => run_category_command(command, &config).await,
    }
}
