use anyhow::Result;
use chrono::NaiveDate;
use clap::{Args, CommandFactory, Parser, Subcommand};
use fintrack::core::log::init_logging;
use fintrack::ledger::{Page, Period};
use rust_decimal::Decimal;

#[derive(Parser)]
#[command(version, about)]
struct Cli {
    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to optional configuration file
    #[arg(short, long, global = true)]
    config_path: Option<String>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Args)]
struct TransactionArgs {
    /// Amount in the transaction currency
    #[arg(long)]
    amount: Decimal,
    /// Three letter currency code, e.g. USD
    #[arg(long)]
    currency: String,
    #[arg(long)]
    category: String,
    /// Record as income instead of expense
    #[arg(long)]
    income: bool,
    #[arg(long)]
    note: Option<String>,
    /// Transaction date (YYYY-MM-DD), defaults to today
    #[arg(long)]
    date: Option<NaiveDate>,
}

impl From<TransactionArgs> for fintrack::TransactionInput {
    fn from(args: TransactionArgs) -> Self {
        fintrack::TransactionInput {
            amount: args.amount,
            currency: args.currency,
            category: args.category,
            is_income: args.income,
            note: args.note,
            date: args.date,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Create default configuration
    Setup,
    /// Resolve the rate of a currency into the target currency
    Rate {
        from: String,
        /// Defaults to the configured currency
        #[arg(long)]
        to: Option<String>,
    },
    /// Display current rates for the watchlist
    Latest,
    /// Record a transaction
    Add(TransactionArgs),
    /// Replace a transaction
    Edit {
        id: u64,
        #[command(flatten)]
        transaction: TransactionArgs,
    },
    /// Delete a transaction
    Delete { id: u64 },
    /// List transactions, newest first
    List {
        /// One of 1m, 3m, 6m, 9m, 12m, all
        #[arg(long, default_value = "3m")]
        period: Period,
        #[arg(long)]
        category: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: usize,
        #[arg(long, default_value_t = 10)]
        page_size: usize,
    },
    /// Display income, expense and balance totals
    Dashboard,
    /// Manage transaction categories
    Category {
        #[command(subcommand)]
        command: CategoryCommands,
    },
}

#[derive(Subcommand)]
enum CategoryCommands {
    /// Register a category
    Add {
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// List categories
    List,
    /// Show one category
    Show { id: u64 },
    /// Rename a category; its transactions follow the new name
    Edit {
        id: u64,
        name: String,
        #[arg(long)]
        description: Option<String>,
    },
    /// Delete a category no transaction uses
    Delete { id: u64 },
}

impl From<CategoryCommands> for fintrack::CategoryCommand {
    fn from(cmd: CategoryCommands) -> Self {
        match cmd {
            CategoryCommands::Add { name, description } => {
                fintrack::CategoryCommand::Add { name, description }
            }
            CategoryCommands::List => fintrack::CategoryCommand::List,
            CategoryCommands::Show { id } => fintrack::CategoryCommand::Show { id },
            CategoryCommands::Edit {
                id,
                name,
                description,
            } => fintrack::CategoryCommand::Edit {
                id,
                name,
                description,
            },
            CategoryCommands::Delete { id } => fintrack::CategoryCommand::Delete { id },
        }
    }
}

impl From<Commands> for fintrack::AppCommand {
    fn from(cmd: Commands) -> fintrack::AppCommand {
        match cmd {
            Commands::Rate { from, to } => fintrack::AppCommand::Rate { from, to },
            Commands::Latest => fintrack::AppCommand::Latest,
            Commands::Add(args) => fintrack::AppCommand::Add(args.into()),
            Commands::Edit { id, transaction } => fintrack::AppCommand::Edit {
                id,
                input: transaction.into(),
            },
            Commands::Delete { id } => fintrack::AppCommand::Delete { id },
            Commands::List {
                period,
                category,
                page,
                page_size,
            } => fintrack::AppCommand::List {
                period,
                category,
                page: Page::new(page, page_size),
            },
            Commands::Dashboard => fintrack::AppCommand::Dashboard,
            Commands::Category { command } => fintrack::AppCommand::Category(command.into()),
            Commands::Setup => unreachable!("Setup command should be handled separately"),
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    init_logging(cli.verbose);

    let result = match cli.command {
        Some(Commands::Setup) => match cli.config_path.as_deref() {
            Some(path) => fintrack::cli::setup::setup_at_path(path),
            None => fintrack::cli::setup::setup(),
        },
        Some(cmd) => fintrack::run_command(cmd.into(), cli.config_path.as_deref()).await,
        None => {
            Cli::command().print_help()?;
            Ok(())
        }
    };

    if let Err(e) = &result {
        tracing::error!(error = %e, "Application failed");
    }
    result
}
