use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// One of the standard print sizes offered for every art print.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PrintSize {
    /// Display label stored on the product, e.g. `8" x 10"`.
    pub label: &'static str,
    /// Column suffix used by the CSV import, e.g. `8x10` for `price_8x10`.
    pub column_suffix: &'static str,
}

impl PrintSize {
    #[must_use]
    pub fn price_column(&self) -> String {
        format!("price_{}", self.column_suffix)
    }

    #[must_use]
    pub fn cost_column(&self) -> String {
        format!("cost_{}", self.column_suffix)
    }
}

/// Standard print sizes in display order, smallest first.
pub const STANDARD_PRINT_SIZES: [PrintSize; 8] = [
    PrintSize {
        label: "8\" x 10\"",
        column_suffix: "8x10",
    },
    PrintSize {
        label: "11\" x 14\"",
        column_suffix: "11x14",
    },
    PrintSize {
        label: "12\" x 18\"",
        column_suffix: "12x18",
    },
    PrintSize {
        label: "16\" x 20\"",
        column_suffix: "16x20",
    },
    PrintSize {
        label: "18\" x 24\"",
        column_suffix: "18x24",
    },
    PrintSize {
        label: "20\" x 30\"",
        column_suffix: "20x30",
    },
    PrintSize {
        label: "24\" x 32\"",
        column_suffix: "24x32",
    },
    PrintSize {
        label: "24\" x 36\"",
        column_suffix: "24x36",
    },
];

/// A named size variant of a product with its own price and cost of goods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProductSize {
    pub label: String,
    pub price: Decimal,
    #[serde(default)]
    pub cost: Decimal,
}

/// A catalog product as stored in the `products` table.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    /// Base selling price, used when no size is selected.
    pub price: Decimal,
    /// Cost of goods sold, if known.
    pub cost: Option<Decimal>,
    pub category: String,
    /// Free-form grouping such as `"Single Print"` or `"3-piece Set"`.
    pub product_type: Option<String>,
    pub image_url: String,
    pub video_url: Option<String>,
    pub stock: i32,
    pub sizes: Vec<ProductSize>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Product {
    /// Returns the size variant with the given label, if the product offers it.
    #[must_use]
    pub fn find_size(&self, label: &str) -> Option<&ProductSize> {
        self.sizes.iter().find(|s| s.label == label)
    }

    /// Unit price for a purchase of this product.
    ///
    /// With a size label the size-specific price is returned, or `None` when the
    /// product has no such size. Without one the base price applies.
    #[must_use]
    pub fn unit_price(&self, size_label: Option<&str>) -> Option<Decimal> {
        match size_label {
            Some(label) => self.find_size(label).map(|s| s.price),
            None => Some(self.price),
        }
    }

    /// Stock value at selling price (`price * stock`).
    #[must_use]
    pub fn inventory_value(&self) -> Decimal {
        self.price * Decimal::from(self.stock)
    }
}

/// Looks up a standard print size by its display label or its column
/// suffix (`8" x 10"` or `8x10`).
#[must_use]
pub fn standard_size(name: &str) -> Option<&'static PrintSize> {
    let name = name.trim();
    STANDARD_PRINT_SIZES
        .iter()
        .find(|s| s.label == name || s.column_suffix.eq_ignore_ascii_case(name))
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;

    pub(crate) fn make_product(price: i64, sizes: &[(&str, i64)]) -> Product {
        Product {
            id: Uuid::new_v4(),
            name: "Crane at Dawn".to_string(),
            description: "Ukiyo-e print".to_string(),
            price: Decimal::from(price),
            cost: None,
            category: "Art Prints".to_string(),
            product_type: Some("Single Print".to_string()),
            image_url: "https://cdn.example.com/crane.jpg".to_string(),
            video_url: None,
            stock: 10,
            sizes: sizes
                .iter()
                .map(|(label, p)| ProductSize {
                    label: (*label).to_string(),
                    price: Decimal::from(*p),
                    cost: Decimal::ZERO,
                })
                .collect(),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn unit_price_without_size_is_base_price() {
        let product = make_product(120, &[("8\" x 10\"", 80)]);
        assert_eq!(product.unit_price(None), Some(Decimal::from(120)));
    }

    #[test]
    fn unit_price_with_size_uses_size_price() {
        let product = make_product(120, &[("8\" x 10\"", 80), ("24\" x 36\"", 260)]);
        assert_eq!(
            product.unit_price(Some("24\" x 36\"")),
            Some(Decimal::from(260))
        );
    }

    #[test]
    fn unit_price_with_unknown_size_is_none() {
        let product = make_product(120, &[("8\" x 10\"", 80)]);
        assert_eq!(product.unit_price(Some("A0")), None);
    }

    #[test]
    fn inventory_value_multiplies_price_by_stock() {
        let product = make_product(25, &[]);
        assert_eq!(product.inventory_value(), Decimal::from(250));
    }

    #[test]
    fn standard_sizes_have_matching_columns() {
        let size = standard_size("11\" x 14\"").expect("standard size");
        assert_eq!(size.price_column(), "price_11x14");
        assert_eq!(size.cost_column(), "cost_11x14");
        assert!(standard_size("5\" x 7\"").is_none());
    }

    #[test]
    fn standard_size_accepts_column_suffix() {
        let size = standard_size("24X36").expect("suffix lookup");
        assert_eq!(size.label, "24\" x 36\"");
        assert!(standard_size("5x7").is_none());
    }

    #[test]
    fn product_size_cost_defaults_to_zero_when_missing() {
        let size: ProductSize =
            serde_json::from_str(r#"{"label":"8\" x 10\"","price":"45"}"#).expect("parse size");
        assert_eq!(size.cost, Decimal::ZERO);
        assert_eq!(size.price, Decimal::from(45));
    }
}
