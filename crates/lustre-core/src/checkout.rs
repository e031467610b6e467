//! Checkout: form validation, shipping resolution, and order totals.
//!
//! Totals are computed server-side from catalog prices. Client-supplied prices
//! are never trusted; [`price_cart`] rebuilds the cart from product records.

use std::sync::LazyLock;

use regex::Regex;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::cart::{Cart, LineItem};
use crate::catalog::Product;
use crate::orders::ShippingAddress;
use crate::shipping::{ShippingRate, INTL_COUNTRY_CODE};

/// Sales tax applied to the subtotal (10%).
pub const TAX_RATE: Decimal = Decimal::from_parts(10, 0, 0, false, 2);

static EMAIL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email regex")
});

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub message: &'static str,
}

#[derive(Debug, Error)]
pub enum CheckoutError {
    #[error("cart is empty")]
    EmptyCart,

    #[error("checkout form is invalid: {}", .0.iter().map(|e| e.field).collect::<Vec<_>>().join(", "))]
    Validation(Vec<FieldError>),

    #[error("no shipping rate available for {country}")]
    NoShippingRate { country: String },

    #[error("shipping rate {0} is not available for this destination")]
    UnknownShippingRate(String),

    #[error("product {0} not found")]
    UnknownProduct(Uuid),

    #[error("product {product_id} has no size {size:?}")]
    UnknownSize { product_id: Uuid, size: String },
}

/// Buyer details submitted at checkout. Missing fields read as empty.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct CheckoutForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub postal_code: String,
    pub country: String,
    pub shipping_rate_id: String,
}

impl CheckoutForm {
    /// Checks every field and reports all failures in field order.
    ///
    /// # Errors
    ///
    /// Returns the list of failing fields.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let mut errors = Vec::new();

        require_len(
            &mut errors,
            "first_name",
            &self.first_name,
            2,
            "First name must be at least 2 characters",
        );
        require_len(
            &mut errors,
            "last_name",
            &self.last_name,
            2,
            "Last name must be at least 2 characters",
        );
        if !EMAIL_RE.is_match(self.email.trim()) {
            errors.push(FieldError {
                field: "email",
                message: "Invalid email address",
            });
        }
        require_len(
            &mut errors,
            "address",
            &self.address,
            5,
            "Address must be at least 5 characters",
        );
        require_len(
            &mut errors,
            "city",
            &self.city,
            2,
            "City must be at least 2 characters",
        );
        require_len(&mut errors, "state", &self.state, 2, "State/Province is required");
        require_len(
            &mut errors,
            "postal_code",
            &self.postal_code,
            3,
            "Postal code is required",
        );
        require_len(&mut errors, "country", &self.country, 2, "Country is required");
        require_len(
            &mut errors,
            "shipping_rate_id",
            &self.shipping_rate_id,
            1,
            "Please select a shipping method",
        );

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// The selected shipping rate id, if one was chosen.
    ///
    /// # Errors
    ///
    /// Returns [`CheckoutError::UnknownShippingRate`] when the value is not a UUID.
    pub fn selected_rate_id(&self) -> Result<Option<Uuid>, CheckoutError> {
        let raw = self.shipping_rate_id.trim();
        if raw.is_empty() {
            return Ok(None);
        }
        Uuid::parse_str(raw)
            .map(Some)
            .map_err(|_| CheckoutError::UnknownShippingRate(raw.to_string()))
    }

    #[must_use]
    pub fn shipping_address(&self) -> ShippingAddress {
        ShippingAddress {
            first_name: self.first_name.trim().to_string(),
            last_name: self.last_name.trim().to_string(),
            address: self.address.trim().to_string(),
            city: self.city.trim().to_string(),
            state: self.state.trim().to_string(),
            postal_code: self.postal_code.trim().to_string(),
            country: self.country.trim().to_string(),
        }
    }
}

fn require_len(
    errors: &mut Vec<FieldError>,
    field: &'static str,
    value: &str,
    min: usize,
    message: &'static str,
) {
    if value.trim().chars().count() < min {
        errors.push(FieldError { field, message });
    }
}

/// A cart line as submitted by a client: identity and quantity only.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLineRequest {
    pub product_id: Uuid,
    #[serde(default)]
    pub size: Option<String>,
    pub quantity: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CheckoutTotals {
    pub subtotal: Decimal,
    pub tax: Decimal,
    pub shipping: Decimal,
    pub total: Decimal,
}

/// Rebuilds a cart from client lines using catalog prices.
///
/// Lines with the same identity are merged; zero quantities are dropped.
///
/// # Errors
///
/// Returns [`CheckoutError::UnknownProduct`] or [`CheckoutError::UnknownSize`]
/// when a line does not match the catalog.
pub fn price_cart(lines: &[CartLineRequest], catalog: &[Product]) -> Result<Cart, CheckoutError> {
    let mut cart = Cart::new();

    for line in lines {
        let product = catalog
            .iter()
            .find(|p| p.id == line.product_id)
            .ok_or(CheckoutError::UnknownProduct(line.product_id))?;

        let size = line.size.as_deref().filter(|s| !s.is_empty());
        let item = LineItem::from_product(product, size, line.quantity).ok_or_else(|| {
            CheckoutError::UnknownSize {
                product_id: product.id,
                size: size.unwrap_or_default().to_string(),
            }
        })?;

        cart.add_quantity(item, line.quantity);
    }

    Ok(cart)
}

/// Rates offered for `country`: its own rates plus the `INTL` rates.
#[must_use]
pub fn available_rates<'a>(rates: &'a [ShippingRate], country: &str) -> Vec<&'a ShippingRate> {
    rates
        .iter()
        .filter(|r| r.country_code == country || r.country_code == INTL_COUNTRY_CODE)
        .collect()
}

/// Resolves the shipping rate for an order.
///
/// An explicit selection must be one of [`available_rates`]. Without one, the
/// first country-specific rate wins, then the first `INTL` rate.
///
/// # Errors
///
/// Returns [`CheckoutError::UnknownShippingRate`] for a selection that is not
/// offered, or [`CheckoutError::NoShippingRate`] when nothing applies.
pub fn select_shipping_rate<'a>(
    rates: &'a [ShippingRate],
    country: &str,
    selected: Option<Uuid>,
) -> Result<&'a ShippingRate, CheckoutError> {
    let available = available_rates(rates, country);

    if let Some(id) = selected {
        return available
            .into_iter()
            .find(|r| r.id == id)
            .ok_or_else(|| CheckoutError::UnknownShippingRate(id.to_string()));
    }

    available
        .iter()
        .find(|r| r.country_code == country)
        .or_else(|| available.iter().find(|r| r.is_international()))
        .copied()
        .ok_or_else(|| CheckoutError::NoShippingRate {
            country: country.to_string(),
        })
}

/// Tax on `subtotal`, rounded to cents.
#[must_use]
pub fn compute_tax(subtotal: Decimal) -> Decimal {
    (subtotal * TAX_RATE).round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
}

#[must_use]
pub fn compute_totals(subtotal: Decimal, shipping: Decimal) -> CheckoutTotals {
    let tax = compute_tax(subtotal);
    CheckoutTotals {
        subtotal,
        tax,
        shipping,
        total: subtotal + tax + shipping,
    }
}

/// Totals for `cart` shipped to `country`.
///
/// # Errors
///
/// Returns [`CheckoutError::EmptyCart`] for an empty cart, or a shipping
/// resolution error from [`select_shipping_rate`].
pub fn quote(
    cart: &Cart,
    rates: &[ShippingRate],
    country: &str,
    selected: Option<Uuid>,
) -> Result<(CheckoutTotals, ShippingRate), CheckoutError> {
    if cart.is_empty() {
        return Err(CheckoutError::EmptyCart);
    }
    let rate = select_shipping_rate(rates, country, selected)?;
    Ok((compute_totals(cart.total(), rate.price), rate.clone()))
}

#[cfg(test)]
#[path = "checkout_test.rs"]
mod tests;
