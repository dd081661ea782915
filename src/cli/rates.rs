use super::ui;
use crate::core::{CurrencyCode, Rate, RateResolver, ResolveError};
use anyhow::Result;
use comfy_table::{Cell, CellAlignment, Table};
use futures::future::join_all;

/// Resolves a single pair and prints it. `to` defaults to the configured target.
pub async fn rate(resolver: &RateResolver, from: &str, to: Option<&str>) -> Result<()> {
    let from: CurrencyCode = from.parse()?;
    let to: CurrencyCode = match to {
        Some(to) => to.parse()?,
        None => resolver.target().clone(),
    };

    let pb = ui::new_progress_bar(1, "Resolving rate...");
    let rate = resolver.resolve(from.as_str(), to.as_str()).await;
    pb.finish_and_clear();

    println!("{}", rate_line(&from, &to, &rate?));
    Ok(())
}

fn rate_line(from: &CurrencyCode, to: &CurrencyCode, rate: &Rate) -> String {
    format!(
        "1 {} = {} {}",
        ui::style_text(from.as_str(), ui::StyleType::TotalLabel),
        ui::style_text(&rate.to_string(), ui::StyleType::TotalValue),
        to
    )
}

/// Resolves every watchlist currency concurrently and prints a table.
/// A currency that cannot be resolved is shown as N/A; it does not fail the command.
pub async fn latest(resolver: &RateResolver, watchlist: &[String]) -> Result<()> {
    let target = resolver.target().as_str();
    let pb = ui::new_progress_bar(watchlist.len() as u64, "Fetching rates...");

    let futures = watchlist.iter().map(|currency| {
        let pb_clone = pb.clone();
        async move {
            let res = resolver.resolve(currency, target).await;
            pb_clone.inc(1);
            (currency.trim().to_uppercase(), res)
        }
    });

    let results = join_all(futures).await;
    pb.finish_and_clear();

    println!(
        "Rates in {}\n",
        ui::style_text(target, ui::StyleType::Title)
    );
    println!("{}", latest_table(target, &results));

    for (currency, res) in &results {
        if let Err(e) = res {
            println!(
                "{}",
                ui::style_text(&format!("{currency}: {e}"), ui::StyleType::Error)
            );
        }
    }
    Ok(())
}

fn latest_table(target: &str, results: &[(String, Result<Rate, ResolveError>)]) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("Currency"),
        ui::header_cell(&format!("Rate ({target})")),
    ]);

    for (currency, res) in results {
        let rate_cell = match res {
            Ok(rate) => Cell::new(rate.to_string()).set_alignment(CellAlignment::Right),
            Err(_) => ui::na_cell(true),
        };
        table.add_row(vec![Cell::new(currency), rate_cell]);
    }
    table
}
