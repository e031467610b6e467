//! Aggregates behind the admin dashboard.

use std::collections::BTreeMap;

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use crate::catalog::Product;

/// Products with fewer units than this are flagged as low stock.
pub const LOW_STOCK_THRESHOLD: i32 = 5;
/// Number of products in the valuation leaderboard.
pub const TOP_VALUATION_LIMIT: usize = 10;
const INVENTORY_LABEL_MAX_CHARS: usize = 15;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LowStockItem {
    pub id: Uuid,
    pub name: String,
    pub stock: i32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryCount {
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Valuation {
    pub name: String,
    pub value: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InventoryRow {
    /// Display label, truncated for chart axes.
    pub name: String,
    pub full_name: String,
    pub stock: i32,
    /// `(price - cost) * stock`; a missing cost counts as zero.
    pub potential_profit: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DashboardSummary {
    pub product_count: usize,
    pub total_stock: i64,
    pub total_value: Decimal,
    pub low_stock: Vec<LowStockItem>,
    pub categories: Vec<CategoryCount>,
    pub top_valuations: Vec<Valuation>,
    pub inventory: Vec<InventoryRow>,
}

#[must_use]
pub fn dashboard(products: &[Product]) -> DashboardSummary {
    DashboardSummary {
        product_count: products.len(),
        total_stock: total_stock(products),
        total_value: total_value(products),
        low_stock: low_stock(products),
        categories: category_counts(products),
        top_valuations: top_valuations(products, TOP_VALUATION_LIMIT),
        inventory: products
            .iter()
            .map(|p| InventoryRow {
                name: truncate_label(&p.name, INVENTORY_LABEL_MAX_CHARS),
                full_name: p.name.clone(),
                stock: p.stock,
                potential_profit: potential_profit(p),
            })
            .collect(),
    }
}

#[must_use]
pub fn low_stock(products: &[Product]) -> Vec<LowStockItem> {
    products
        .iter()
        .filter(|p| p.stock < LOW_STOCK_THRESHOLD)
        .map(|p| LowStockItem {
            id: p.id,
            name: p.name.clone(),
            stock: p.stock,
        })
        .collect()
}

#[must_use]
pub fn total_stock(products: &[Product]) -> i64 {
    products.iter().map(|p| i64::from(p.stock)).sum()
}

/// Σ price × stock.
#[must_use]
pub fn total_value(products: &[Product]) -> Decimal {
    products.iter().map(Product::inventory_value).sum()
}

/// Product counts per category, largest first, ties by name.
#[must_use]
pub fn category_counts(products: &[Product]) -> Vec<CategoryCount> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for product in products {
        *counts.entry(product.category.as_str()).or_default() += 1;
    }

    let mut rows: Vec<CategoryCount> = counts
        .into_iter()
        .map(|(name, count)| CategoryCount {
            name: name.to_string(),
            count,
        })
        .collect();
    // BTreeMap yields names in order, so a stable sort keeps ties alphabetical.
    rows.sort_by(|a, b| b.count.cmp(&a.count));
    rows
}

#[must_use]
pub fn top_valuations(products: &[Product], limit: usize) -> Vec<Valuation> {
    let mut rows: Vec<Valuation> = products
        .iter()
        .map(|p| Valuation {
            name: p.name.clone(),
            value: p.inventory_value(),
        })
        .collect();
    rows.sort_by(|a, b| b.value.cmp(&a.value));
    rows.truncate(limit);
    rows
}

fn potential_profit(product: &Product) -> Decimal {
    (product.price - product.cost.unwrap_or(Decimal::ZERO)) * Decimal::from(product.stock)
}

fn truncate_label(name: &str, max_chars: usize) -> String {
    if name.chars().count() > max_chars {
        let head: String = name.chars().take(max_chars).collect();
        format!("{head}...")
    } else {
        name.to_string()
    }
}
