use std::collections::HashSet;
use std::path::Path;

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::ConfigError;

/// Country code of the catch-all rate used when a country has no rate of its own.
pub const INTL_COUNTRY_CODE: &str = "INTL";

/// A shipping rate as stored in the `shipping_rates` table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingRate {
    pub id: Uuid,
    pub name: String,
    pub country_code: String,
    pub price: Decimal,
}

impl ShippingRate {
    #[must_use]
    pub fn is_international(&self) -> bool {
        self.country_code == INTL_COUNTRY_CODE
    }
}

/// A rate entry in `config/shipping_rates.yaml`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingRateConfig {
    pub name: String,
    pub country_code: String,
    pub price: Decimal,
}

#[derive(Debug, Deserialize)]
pub struct ShippingRatesFile {
    pub rates: Vec<ShippingRateConfig>,
}

/// `true` for `INTL` or a two-letter uppercase ISO country code.
#[must_use]
pub fn is_valid_country_code(code: &str) -> bool {
    code == INTL_COUNTRY_CODE || (code.len() == 2 && code.chars().all(|c| c.is_ascii_uppercase()))
}

/// Load and validate the seed shipping rates from a YAML file.
///
/// # Errors
///
/// Returns `ConfigError` if the file cannot be read, parsed, or fails validation.
pub fn load_shipping_rates(path: &Path) -> Result<ShippingRatesFile, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::ShippingRatesFileIo {
        path: path.display().to_string(),
        source: e,
    })?;

    let rates_file: ShippingRatesFile =
        serde_yaml::from_str(&content).map_err(ConfigError::ShippingRatesFileParse)?;

    validate_shipping_rates(&rates_file)?;

    Ok(rates_file)
}

fn validate_shipping_rates(rates_file: &ShippingRatesFile) -> Result<(), ConfigError> {
    let mut seen = HashSet::new();

    for rate in &rates_file.rates {
        if rate.name.trim().is_empty() {
            return Err(ConfigError::Validation(
                "shipping rate name must be non-empty".to_string(),
            ));
        }

        if !is_valid_country_code(&rate.country_code) {
            return Err(ConfigError::Validation(format!(
                "shipping rate '{}' has invalid country code '{}'; must be INTL or two uppercase letters",
                rate.name, rate.country_code
            )));
        }

        if rate.price.is_sign_negative() {
            return Err(ConfigError::Validation(format!(
                "shipping rate '{}' has negative price {}",
                rate.name, rate.price
            )));
        }

        if !seen.insert((rate.country_code.clone(), rate.name.to_lowercase())) {
            return Err(ConfigError::Validation(format!(
                "duplicate shipping rate '{}' for {}",
                rate.name, rate.country_code
            )));
        }
    }

    Ok(())
}
