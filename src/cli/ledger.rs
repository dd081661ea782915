use super::ui;
use crate::ledger::{
    CategoryTotal, Dashboard, NewTransaction, Page, PageResult, Period, Transaction,
    TransactionService,
};
use anyhow::Result;
use comfy_table::{Cell, Table};

pub async fn add(service: &TransactionService, new: NewTransaction) -> Result<()> {
    let tx = service.create(new).await?;
    println!(
        "Added transaction {}: {} {} = {} {}",
        ui::style_text(&tx.id.to_string(), ui::StyleType::TotalLabel),
        tx.amount,
        tx.currency,
        ui::style_text(
            &format!("{:.2}", tx.amount_in_target.round_dp(2)),
            ui::StyleType::TotalValue
        ),
        service.target()
    );
    Ok(())
}

pub async fn edit(service: &TransactionService, id: u64, new: NewTransaction) -> Result<()> {
    let tx = service.update(id, new).await?;
    println!(
        "Updated transaction {}: {} {} = {:.2} {}",
        ui::style_text(&tx.id.to_string(), ui::StyleType::TotalLabel),
        tx.amount,
        tx.currency,
        tx.amount_in_target.round_dp(2),
        service.target()
    );
    Ok(())
}

pub async fn delete(service: &TransactionService, owner: &str, id: u64) -> Result<()> {
    service.delete(owner, id).await?;
    println!("Deleted transaction {id}");
    Ok(())
}

pub async fn list(
    service: &TransactionService,
    owner: &str,
    period: Period,
    category: Option<String>,
    page: Page,
) -> Result<()> {
    let result = service.list(owner, period, category, page).await?;

    if result.items.is_empty() {
        println!(
            "{}",
            ui::style_text("No transactions found", ui::StyleType::Subtle)
        );
        return Ok(());
    }

    println!("{}", transactions_table(&result, service.target().as_str()));

    let pages = result.total.div_ceil(result.page_size);
    println!(
        "{}",
        ui::style_text(
            &format!(
                "Page {} of {} ({} transactions, period {period})",
                result.page, pages, result.total
            ),
            ui::StyleType::Subtle
        )
    );
    Ok(())
}

fn transactions_table(result: &PageResult<Transaction>, target: &str) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("ID"),
        ui::header_cell("Date"),
        ui::header_cell("Category"),
        ui::header_cell("Amount"),
        ui::header_cell("Rate"),
        ui::header_cell(&format!("Amount ({target})")),
        ui::header_cell("Note"),
    ]);

    for tx in &result.items {
        table.add_row(vec![
            Cell::new(tx.id),
            Cell::new(tx.date),
            Cell::new(&tx.category),
            Cell::new(format!("{} {}", tx.amount, tx.currency)),
            Cell::new(tx.rate),
            ui::amount_cell(tx.amount_in_target, tx.is_income),
            Cell::new(tx.note.as_deref().unwrap_or("")),
        ]);
    }
    table
}

pub async fn dashboard(service: &TransactionService, owner: &str) -> Result<()> {
    let dashboard = service.dashboard(owner).await?;
    println!("{}", display_dashboard(&dashboard));
    Ok(())
}

fn category_table(title: &str, totals: &[CategoryTotal]) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![ui::header_cell(title), ui::header_cell("Total")]);
    for total in totals {
        table.add_row(vec![Cell::new(&total.category), ui::money_cell(total.total)]);
    }
    table
}

fn display_dashboard(dashboard: &Dashboard) -> String {
    let summary = &dashboard.summary;
    let currency = summary.currency.as_str();

    let mut output = format!(
        "{}\n\n",
        ui::style_text(&format!("Dashboard ({currency})"), ui::StyleType::Title)
    );

    let mut totals = ui::new_styled_table();
    totals.set_header(vec![
        ui::header_cell("Income"),
        ui::header_cell("Expense"),
        ui::header_cell("Balance"),
    ]);
    totals.add_row(vec![
        ui::money_cell(summary.total_income),
        ui::money_cell(summary.total_expense),
        ui::money_cell(summary.balance),
    ]);
    output.push_str(&totals.to_string());

    if !dashboard.categories.income.is_empty() {
        output.push_str("\n\n");
        output.push_str(
            &category_table("Income by category", &dashboard.categories.income).to_string(),
        );
    }
    if !dashboard.categories.expense.is_empty() {
        output.push_str("\n\n");
        output.push_str(
            &category_table("Expense by category", &dashboard.categories.expense).to_string(),
        );
    }

    if !dashboard.monthly.is_empty() {
        let mut monthly = ui::new_styled_table();
        monthly.set_header(vec![
            ui::header_cell("Month"),
            ui::header_cell("Income"),
            ui::header_cell("Expense"),
        ]);
        for month in &dashboard.monthly {
            monthly.add_row(vec![
                Cell::new(&month.month),
                ui::money_cell(month.income),
                ui::money_cell(month.expense),
            ]);
        }
        output.push_str("\n\n");
        output.push_str(&monthly.to_string());
    }

    output.push_str(&format!(
        "\n\nBalance ({}): {}",
        ui::style_text(currency, ui::StyleType::TotalLabel),
        ui::style_text(
            &format!("{:.2}", summary.balance.round_dp(2)),
            ui::StyleType::TotalValue
        )
    ));
    output
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ledger::tests::sample;
    use rust_decimal_macros::dec;

    #[test]
    fn test_transactions_table_columns() {
        let mut tx = sample(7, "me", "2026-03-14", "Food");
        tx.note = Some("market".to_string());
        let result = PageResult {
            total: 1,
            page: 1,
            page_size: 10,
            items: vec![tx],
        };

        let rendered = transactions_table(&result, "TRY").to_string();

        assert!(rendered.contains("Amount (TRY)"));
        assert!(rendered.contains("2026-03-14"));
        assert!(rendered.contains("Food"));
        assert!(rendered.contains("market"));
    }

    #[test]
    fn test_dashboard_output_sections() {
        let mut salary = sample(1, "me", "2026-01-05", "Salary");
        salary.is_income = true;
        salary.amount_in_target = dec!(1000);
        let mut rent = sample(2, "me", "2026-01-06", "Rent");
        rent.amount_in_target = dec!(400);

        let dashboard = Dashboard::build(&[salary, rent], &"TRY".parse().unwrap()).unwrap();
        let output = display_dashboard(&dashboard);

        assert!(output.contains("Income by category"));
        assert!(output.contains("Expense by category"));
        assert!(output.contains("2026-01"));
        assert!(output.contains("600.00"));
    }

    #[test]
    fn test_empty_dashboard_has_no_breakdowns() {
        let dashboard = Dashboard::build(&[], &"TRY".parse().unwrap()).unwrap();
        let output = display_dashboard(&dashboard);

        assert!(!output.contains("by category"));
        assert!(output.contains("0.00"));
    }
}
