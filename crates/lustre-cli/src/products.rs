//! Read-only catalog queries.

use lustre_core::Product;

fn truncate(value: &str, max: usize) -> String {
    if value.chars().count() > max {
        format!("{}...", value.chars().take(max).collect::<String>())
    } else {
        value.to_string()
    }
}

/// Print products, newest first, optionally limited to one category.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_products_list(
    pool: &sqlx::PgPool,
    category: Option<&str>,
) -> anyhow::Result<()> {
    let rows = match category.filter(|c| !c.eq_ignore_ascii_case("all")) {
        Some(category) => lustre_db::list_products_by_category(pool, category).await?,
        None => lustre_db::list_products(pool).await?,
    };
    let products: Vec<Product> = rows.into_iter().map(Product::from).collect();

    if products.is_empty() {
        println!(
            "no products found{}; run `import <file>` first",
            category.map(|c| format!(" in category {c}")).unwrap_or_default()
        );
        return Ok(());
    }

    println!(
        "{:<38}{:<32}{:<16}{:>10}{:>7}  SIZES",
        "ID", "NAME", "CATEGORY", "PRICE", "STOCK"
    );
    for product in &products {
        println!(
            "{:<38}{:<32}{:<16}{:>10}{:>7}  {}",
            product.id,
            truncate(&product.name, 28),
            truncate(&product.category, 12),
            product.price,
            product.stock,
            product.sizes.len()
        );
    }

    Ok(())
}

/// Print products whose stock has fallen below the low-stock threshold.
///
/// # Errors
///
/// Returns an error if the database query fails.
pub(crate) async fn run_products_low_stock(pool: &sqlx::PgPool) -> anyhow::Result<()> {
    let products: Vec<Product> = lustre_db::list_products(pool)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();

    let low = lustre_core::analytics::low_stock(&products);
    if low.is_empty() {
        println!(
            "no products below {} units",
            lustre_core::analytics::LOW_STOCK_THRESHOLD
        );
        return Ok(());
    }

    println!("{:<38}{:<32}{:>7}", "ID", "NAME", "STOCK");
    for item in &low {
        println!("{:<38}{:<32}{:>7}", item.id, truncate(&item.name, 28), item.stock);
    }

    Ok(())
}
