pub mod analytics;
pub mod app_config;
pub mod cart;
pub mod catalog;
pub mod checkout;
pub mod config;
pub mod favorites;
pub mod import;
pub mod local_store;
pub mod orders;
pub mod shipping;

pub use app_config::{AppConfig, Environment};
pub use cart::{Cart, LineItem, LineKey, SelectedSize};
pub use catalog::{standard_size, PrintSize, Product, ProductSize, STANDARD_PRINT_SIZES};
pub use analytics::{dashboard, DashboardSummary};
pub use checkout::{
    available_rates, compute_totals, price_cart, quote, select_shipping_rate, CartLineRequest,
    CheckoutError, CheckoutForm, CheckoutTotals, FieldError, TAX_RATE,
};
pub use config::{load_app_config, load_app_config_from_env};
pub use favorites::Favorites;
pub use import::{
    import_template, parse_csv, validate_csv_upload, ImportError, ImportReport, ImportSummary,
    ParsedProduct,
};
pub use local_store::{LocalStore, StoreError, CART_STORAGE_KEY, FAVORITES_STORAGE_KEY};
pub use orders::{generate_order_id, OrderItem, OrderStatus, PaymentStatus, ShippingAddress};
pub use shipping::{
    load_shipping_rates, ShippingRate, ShippingRateConfig, ShippingRatesFile, INTL_COUNTRY_CODE,
};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingEnvVar(String),

    #[error("invalid value for {var}: {reason}")]
    InvalidEnvVar { var: String, reason: String },

    #[error("failed to read shipping rates file {path}: {source}")]
    ShippingRatesFileIo {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse shipping rates file: {0}")]
    ShippingRatesFileParse(#[source] serde_yaml::Error),

    #[error("invalid shipping rate config: {0}")]
    Validation(String),
}

#[derive(Debug, Error)]
pub enum CoreError {
    #[error("invalid order status: {0}")]
    InvalidOrderStatus(String),

    #[error("invalid payment status: {0}")]
    InvalidPaymentStatus(String),
}
