//! Shopping cart state container.
//!
//! A cart is an ordered list of line items. A line is identified by the pair
//! (product id, selected size label); adding an item whose identity already
//! exists bumps the quantity of that row instead of appending a duplicate.

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::Product;

/// The size a shopper picked for a line item, with the price it carried.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SelectedSize {
    pub label: String,
    pub price: Decimal,
}

/// One cart row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LineItem {
    pub product_id: Uuid,
    pub name: String,
    /// Base product price.
    pub price: Decimal,
    pub image_url: String,
    pub selected_size: Option<SelectedSize>,
    pub quantity: u32,
}

/// Identity of a cart row.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LineKey {
    pub product_id: Uuid,
    pub size_label: Option<String>,
}

impl LineKey {
    #[must_use]
    pub fn new(product_id: Uuid, size_label: Option<&str>) -> Self {
        Self {
            product_id,
            size_label: size_label.map(ToOwned::to_owned),
        }
    }
}

impl std::fmt::Display for LineKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{}",
            self.product_id,
            self.size_label.as_deref().unwrap_or("none")
        )
    }
}

impl LineItem {
    /// Builds a line for `product`, optionally at one of its sizes.
    ///
    /// Returns `None` when `size_label` names a size the product does not offer.
    #[must_use]
    pub fn from_product(product: &Product, size_label: Option<&str>, quantity: u32) -> Option<Self> {
        let selected_size = match size_label {
            Some(label) => {
                let size = product.find_size(label)?;
                Some(SelectedSize {
                    label: size.label.clone(),
                    price: size.price,
                })
            }
            None => None,
        };

        Some(Self {
            product_id: product.id,
            name: product.name.clone(),
            price: product.price,
            image_url: product.image_url.clone(),
            selected_size,
            quantity,
        })
    }

    #[must_use]
    pub fn key(&self) -> LineKey {
        LineKey::new(self.product_id, self.size_label())
    }

    #[must_use]
    pub fn size_label(&self) -> Option<&str> {
        self.selected_size.as_ref().map(|s| s.label.as_str())
    }

    /// Size price when a size is selected, otherwise the base price.
    #[must_use]
    pub fn unit_price(&self) -> Decimal {
        self.selected_size
            .as_ref()
            .map_or(self.price, |size| size.price)
    }

    #[must_use]
    pub fn line_total(&self) -> Decimal {
        self.unit_price() * Decimal::from(self.quantity)
    }

    fn matches(&self, product_id: Uuid, size_label: Option<&str>) -> bool {
        self.product_id == product_id && self.size_label() == size_label
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Cart {
    items: Vec<LineItem>,
}

impl Cart {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a single unit of `item`, ignoring whatever quantity it carries.
    pub fn add(&mut self, item: LineItem) {
        self.add_quantity(item, 1);
    }

    /// Adds `quantity` units of `item`, merging into an existing row with the
    /// same identity. A zero quantity is a no-op.
    pub fn add_quantity(&mut self, mut item: LineItem, quantity: u32) {
        if quantity == 0 {
            return;
        }

        let size_label = item.size_label().map(ToOwned::to_owned);
        if let Some(index) = self
            .items
            .iter()
            .position(|row| row.matches(item.product_id, size_label.as_deref()))
        {
            let existing = &mut self.items[index];
            existing.quantity = existing.quantity.saturating_add(quantity);
        } else {
            item.quantity = quantity;
            self.items.push(item);
        }
    }

    /// Deletes the row with the given identity, if present.
    pub fn remove(&mut self, product_id: Uuid, size_label: Option<&str>) {
        self.items.retain(|row| !row.matches(product_id, size_label));
    }

    /// Sets the quantity of a row. Zero or negative quantities delete it.
    pub fn update_quantity(&mut self, product_id: Uuid, size_label: Option<&str>, quantity: i64) {
        if quantity <= 0 {
            self.remove(product_id, size_label);
            return;
        }

        let quantity = u32::try_from(quantity).unwrap_or(u32::MAX);
        if let Some(row) = self
            .items
            .iter_mut()
            .find(|row| row.matches(product_id, size_label))
        {
            row.quantity = quantity;
        }
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }

    #[must_use]
    pub fn items(&self) -> &[LineItem] {
        &self.items
    }

    #[must_use]
    pub fn get(&self, key: &LineKey) -> Option<&LineItem> {
        self.items
            .iter()
            .find(|row| row.matches(key.product_id, key.size_label.as_deref()))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Sum of `unit price * quantity` over all rows.
    #[must_use]
    pub fn total(&self) -> Decimal {
        self.items.iter().map(LineItem::line_total).sum()
    }

    /// Total number of units across all rows.
    #[must_use]
    pub fn count(&self) -> u32 {
        self.items
            .iter()
            .fold(0u32, |acc, row| acc.saturating_add(row.quantity))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item(product_id: Uuid, price: i64, size: Option<(&str, i64)>) -> LineItem {
        LineItem {
            product_id,
            name: "Koi Pond".to_string(),
            price: Decimal::from(price),
            image_url: "koi.jpg".to_string(),
            selected_size: size.map(|(label, p)| SelectedSize {
                label: label.to_string(),
                price: Decimal::from(p),
            }),
            quantity: 1,
        }
    }

    #[test]
    fn adding_same_identity_increments_quantity() {
        let id = Uuid::new_v4();
        let mut cart = Cart::new();
        cart.add(item(id, 100, Some(("8\" x 10\"", 60))));
        cart.add(item(id, 100, Some(("8\" x 10\"", 60))));

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.items()[0].quantity, 2);
    }

    #[test]
    fn different_sizes_are_separate_rows() {
        let id = Uuid::new_v4();
        let mut cart = Cart::new();
        cart.add(item(id, 100, Some(("8\" x 10\"", 60))));
        cart.add(item(id, 100, Some(("24\" x 36\"", 240))));
        cart.add(item(id, 100, None));

        assert_eq!(cart.len(), 3);
        assert_eq!(cart.count(), 3);
    }

    #[test]
    fn add_ignores_incoming_quantity() {
        let id = Uuid::new_v4();
        let mut incoming = item(id, 50, None);
        incoming.quantity = 7;

        let mut cart = Cart::new();
        cart.add(incoming);
        assert_eq!(cart.items()[0].quantity, 1);
    }

    #[test]
    fn add_quantity_merges_and_zero_is_noop() {
        let id = Uuid::new_v4();
        let mut cart = Cart::new();
        cart.add_quantity(item(id, 50, None), 3);
        cart.add_quantity(item(id, 50, None), 2);
        cart.add_quantity(item(Uuid::new_v4(), 50, None), 0);

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.count(), 5);
    }

    #[test]
    fn remove_only_deletes_matching_size() {
        let id = Uuid::new_v4();
        let mut cart = Cart::new();
        cart.add(item(id, 100, Some(("8\" x 10\"", 60))));
        cart.add(item(id, 100, None));

        cart.remove(id, Some("8\" x 10\""));

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.items()[0].size_label(), None);
    }

    #[test]
    fn update_quantity_to_zero_or_less_removes_row() {
        let id = Uuid::new_v4();
        let mut cart = Cart::new();
        cart.add(item(id, 100, None));
        cart.update_quantity(id, None, 0);
        assert!(cart.is_empty());

        cart.add(item(id, 100, None));
        cart.update_quantity(id, None, -4);
        assert!(cart.is_empty());
    }

    #[test]
    fn update_quantity_sets_value_and_ignores_unknown_rows() {
        let id = Uuid::new_v4();
        let mut cart = Cart::new();
        cart.add(item(id, 100, None));
        cart.update_quantity(id, None, 6);
        cart.update_quantity(Uuid::new_v4(), None, 9);

        assert_eq!(cart.len(), 1);
        assert_eq!(cart.items()[0].quantity, 6);
    }

    #[test]
    fn total_uses_size_price_when_selected() {
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();
        let mut cart = Cart::new();
        cart.add_quantity(item(a, 100, Some(("12\" x 18\"", 150))), 2);
        cart.add_quantity(item(b, 40, None), 3);

        // 2 * 150 + 3 * 40
        assert_eq!(cart.total(), Decimal::from(420));
        assert_eq!(cart.count(), 5);
    }

    #[test]
    fn insertion_order_is_preserved() {
        let ids: Vec<Uuid> = (0..3).map(|_| Uuid::new_v4()).collect();
        let mut cart = Cart::new();
        for id in &ids {
            cart.add(item(*id, 10, None));
        }
        cart.add(item(ids[0], 10, None));

        let order: Vec<Uuid> = cart.items().iter().map(|i| i.product_id).collect();
        assert_eq!(order, ids);
    }

    #[test]
    fn empty_cart_totals_are_zero() {
        let cart = Cart::new();
        assert_eq!(cart.total(), Decimal::ZERO);
        assert_eq!(cart.count(), 0);
    }

    #[test]
    fn line_key_display_uses_none_for_missing_size() {
        let id = Uuid::nil();
        assert_eq!(
            LineKey::new(id, None).to_string(),
            "00000000-0000-0000-0000-000000000000/none"
        );
    }

    #[test]
    fn from_product_rejects_unknown_size() {
        let product = crate::catalog::tests::make_product(90, &[("8\" x 10\"", 70)]);
        assert!(LineItem::from_product(&product, Some("A3"), 1).is_none());

        let line = LineItem::from_product(&product, Some("8\" x 10\""), 2).expect("line");
        assert_eq!(line.unit_price(), Decimal::from(70));
        assert_eq!(line.line_total(), Decimal::from(140));
    }

    #[test]
    fn cart_serializes_as_plain_array() {
        let mut cart = Cart::new();
        cart.add(item(Uuid::new_v4(), 10, None));
        let json = serde_json::to_value(&cart).expect("serialize");
        assert!(json.is_array());
        let back: Cart = serde_json::from_value(json).expect("deserialize");
        assert_eq!(back, cart);
    }
}
