pub mod categories;
pub mod ledger;
pub mod rates;
pub mod setup;
pub mod ui;
