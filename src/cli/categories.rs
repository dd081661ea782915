use super::ui;
use crate::ledger::{Category, CategoryService, NewCategory};
use anyhow::Result;
use comfy_table::{Cell, Table};

pub async fn add(service: &CategoryService, new: NewCategory) -> Result<()> {
    let category = service.create(new).await?;
    println!(
        "Added category {}: {}",
        ui::style_text(&category.id.to_string(), ui::StyleType::TotalLabel),
        category.name
    );
    Ok(())
}

pub async fn edit(service: &CategoryService, id: u64, new: NewCategory) -> Result<()> {
    let category = service.update(id, new).await?;
    println!(
        "Updated category {}: {}",
        ui::style_text(&category.id.to_string(), ui::StyleType::TotalLabel),
        category.name
    );
    Ok(())
}

pub async fn delete(service: &CategoryService, owner: &str, id: u64) -> Result<()> {
    service.delete(owner, id).await?;
    println!("Deleted category {id}");
    Ok(())
}

pub async fn show(service: &CategoryService, owner: &str, id: u64) -> Result<()> {
    let category = service.get(owner, id).await?;
    println!("{}", categories_table(std::slice::from_ref(&category)));
    Ok(())
}

pub async fn list(service: &CategoryService, owner: &str) -> Result<()> {
    let categories = service.list(owner).await?;
    if categories.is_empty() {
        println!(
            "{}",
            ui::style_text("No categories found", ui::StyleType::Subtle)
        );
        return Ok(());
    }

    println!("{}", categories_table(&categories));
    Ok(())
}

fn categories_table(categories: &[Category]) -> Table {
    let mut table = ui::new_styled_table();
    table.set_header(vec![
        ui::header_cell("ID"),
        ui::header_cell("Name"),
        ui::header_cell("Description"),
    ]);
    for category in categories {
        table.add_row(vec![
            Cell::new(category.id),
            Cell::new(&category.name),
            Cell::new(category.description.as_deref().unwrap_or("")),
        ]);
    }
    table
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_categories_table_rows() {
        let mut food = Category::new("me", "Food", Some("Groceries and dining"));
        food.id = 1;
        let mut rent = Category::new("me", "Rent", None);
        rent.id = 2;

        let rendered = categories_table(&[food, rent]).to_string();

        assert!(rendered.contains("Description"));
        assert!(rendered.contains("Groceries and dining"));
        assert!(rendered.contains("Rent"));
    }
}
