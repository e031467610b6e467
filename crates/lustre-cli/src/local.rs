//! Cart and favorites held on the local machine.
//!
//! Both containers are loaded from the [`LocalStore`], mutated, and written
//! back on every command. Commands that need catalog data (adding a line,
//! quoting a checkout) reach the database; the rest work offline.

use lustre_core::{
    Cart, CartLineRequest, CheckoutTotals, Favorites, LineItem, LocalStore, Product,
    ShippingRate, CART_STORAGE_KEY, FAVORITES_STORAGE_KEY,
};
use rust_decimal::Decimal;
use uuid::Uuid;

/// Maps a standard size suffix such as `8x10` to the label stored on
/// products; anything else passes through unchanged.
pub(crate) fn resolve_size(size: Option<&str>) -> Option<&str> {
    size.map(|s| lustre_core::standard_size(s).map_or(s, |standard| standard.label))
}

fn money(value: Decimal) -> String {
    format!("${:.2}", value.round_dp(2))
}

pub(crate) fn load_cart(store: &LocalStore) -> Cart {
    store.load(CART_STORAGE_KEY)
}

pub(crate) fn load_favorites(store: &LocalStore) -> Favorites {
    store.load(FAVORITES_STORAGE_KEY)
}

pub(crate) fn print_cart(cart: &Cart) {
    if cart.is_empty() {
        println!("cart is empty");
        return;
    }

    println!(
        "{:<38}{:<28}{:<12}{:>5}{:>12}",
        "PRODUCT", "NAME", "SIZE", "QTY", "LINE TOTAL"
    );
    for item in cart.items() {
        println!(
            "{:<38}{:<28}{:<12}{:>5}{:>12}",
            item.product_id,
            item.name,
            item.size_label().unwrap_or("-"),
            item.quantity,
            money(item.line_total())
        );
    }
    println!("{} item(s), subtotal {}", cart.count(), money(cart.total()));
}

pub(crate) fn print_favorites(favorites: &Favorites) {
    if favorites.is_empty() {
        println!("no favorites yet");
        return;
    }
    for id in favorites.ids() {
        println!("{id}");
    }
}

/// Add `quantity` units of `product` to the stored cart, merging with an
/// existing line of the same product and size.
///
/// # Errors
///
/// Returns an error if the product does not offer `size` or the cart cannot
/// be saved.
pub(crate) fn add_to_cart(
    store: &LocalStore,
    product: &Product,
    size: Option<&str>,
    quantity: u32,
) -> anyhow::Result<Cart> {
    let size = resolve_size(size);
    let item = LineItem::from_product(product, size, quantity).ok_or_else(|| {
        anyhow::anyhow!(
            "product '{}' has no size '{}'",
            product.name,
            size.unwrap_or_default()
        )
    })?;

    let mut cart = load_cart(store);
    cart.add_quantity(item, quantity);
    store.save(CART_STORAGE_KEY, &cart)?;
    Ok(cart)
}

/// Look up `product_id` and add it to the cart.
///
/// # Errors
///
/// Returns an error if the product does not exist, the size is unknown, or
/// the cart cannot be saved.
pub(crate) async fn run_cart_add(
    pool: &sqlx::PgPool,
    store: &LocalStore,
    product_id: Uuid,
    size: Option<&str>,
    quantity: u32,
) -> anyhow::Result<()> {
    let product = lustre_db::get_product(pool, product_id)
        .await?
        .map(Product::from)
        .ok_or_else(|| anyhow::anyhow!("product {product_id} not found"))?;

    let cart = add_to_cart(store, &product, size, quantity)?;
    tracing::debug!(%product_id, lines = cart.len(), "cart updated");
    print_cart(&cart);
    Ok(())
}

pub(crate) fn cart_remove(
    store: &LocalStore,
    product_id: Uuid,
    size: Option<&str>,
) -> anyhow::Result<()> {
    let mut cart = load_cart(store);
    cart.remove(product_id, resolve_size(size));
    store.save(CART_STORAGE_KEY, &cart)?;
    print_cart(&cart);
    Ok(())
}

pub(crate) fn cart_set(
    store: &LocalStore,
    product_id: Uuid,
    size: Option<&str>,
    quantity: i64,
) -> anyhow::Result<()> {
    let mut cart = load_cart(store);
    cart.update_quantity(product_id, resolve_size(size), quantity);
    store.save(CART_STORAGE_KEY, &cart)?;
    print_cart(&cart);
    Ok(())
}

pub(crate) fn cart_clear(store: &LocalStore) -> anyhow::Result<()> {
    store.remove(CART_STORAGE_KEY)?;
    println!("cart cleared");
    Ok(())
}

pub(crate) fn favorites_toggle(store: &LocalStore, product_id: Uuid) -> anyhow::Result<()> {
    let mut favorites = load_favorites(store);
    let favorited = favorites.toggle(product_id);
    store.save(FAVORITES_STORAGE_KEY, &favorites)?;
    if favorited {
        println!("added {product_id} to favorites");
    } else {
        println!("removed {product_id} from favorites");
    }
    Ok(())
}

/// Reprice `cart` against the current catalog and quote it for `country`.
///
/// # Errors
///
/// Returns a [`lustre_core::CheckoutError`] when a line no longer matches the
/// catalog, the cart is empty, or no rate ships to `country`.
pub(crate) fn quote_cart(
    cart: &Cart,
    catalog: &[Product],
    rates: &[ShippingRate],
    country: &str,
) -> Result<(Cart, CheckoutTotals, ShippingRate), lustre_core::CheckoutError> {
    let lines: Vec<CartLineRequest> = cart
        .items()
        .iter()
        .map(|item| CartLineRequest {
            product_id: item.product_id,
            size: item.size_label().map(ToOwned::to_owned),
            quantity: item.quantity,
        })
        .collect();

    let priced = lustre_core::price_cart(&lines, catalog)?;
    let (totals, rate) =
        lustre_core::quote(&priced, rates, &country.trim().to_ascii_uppercase(), None)?;
    Ok((priced, totals, rate))
}

/// Print the stored cart with tax and shipping for `country`.
///
/// # Errors
///
/// Returns an error if the database query fails or the cart cannot be quoted.
pub(crate) async fn run_cart_quote(
    pool: &sqlx::PgPool,
    store: &LocalStore,
    country: &str,
) -> anyhow::Result<()> {
    let cart = load_cart(store);
    if cart.is_empty() {
        println!("cart is empty");
        return Ok(());
    }

    let ids: Vec<Uuid> = cart.items().iter().map(|item| item.product_id).collect();
    let catalog: Vec<Product> = lustre_db::get_products_by_ids(pool, &ids)
        .await?
        .into_iter()
        .map(Product::from)
        .collect();
    let rates: Vec<ShippingRate> = lustre_db::list_shipping_rates(pool)
        .await?
        .into_iter()
        .map(ShippingRate::from)
        .collect();

    let (priced, totals, rate) = quote_cart(&cart, &catalog, &rates, country)?;

    print_cart(&priced);
    println!("{:<12}{:>12}", "tax", money(totals.tax));
    println!(
        "{:<12}{:>12}  ({} {})",
        "shipping",
        money(totals.shipping),
        rate.name,
        rate.country_code
    );
    println!("{:<12}{:>12}", "total", money(totals.total));

    Ok(())
}
