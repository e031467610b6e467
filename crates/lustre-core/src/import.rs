//! CSV bulk import for catalog products.
//!
//! The importer is a single pass over the file. Header problems abort the whole
//! import; row problems are recorded against the row and the row is skipped,
//! so one malformed line never costs the rest of the batch.
//!
//! Per-row checks run in a fixed order and stop at the first failure:
//! required fields non-empty, stock is a non-negative number, at least one
//! size price that reads as a number, then the image suffix. Sizes whose price
//! is not a positive number are left out of the product.

use std::collections::HashMap;
use std::str::FromStr;

use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::catalog::{ProductSize, STANDARD_PRINT_SIZES};

pub const REQUIRED_HEADERS: [&str; 4] = ["name", "category", "stock", "imageUrl"];
pub const OPTIONAL_HEADERS: [&str; 2] = ["description", "videoUrl"];
pub const VALID_IMAGE_EXTENSIONS: [&str; 4] = [".jpg", ".jpeg", ".png", ".webp"];
/// Largest accepted upload, in bytes (5 MiB).
pub const MAX_FILE_SIZE: u64 = 5 * 1024 * 1024;

const STORAGE_OBJECT_PATH: &str = "storage/v1/object/public/product-images/products";

// Unreserved characters stay readable in generated storage URLs.
const FILENAME_ENCODE_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'.')
    .remove(b'-')
    .remove(b'_')
    .remove(b'~');

#[derive(Debug, Error)]
pub enum ImportError {
    #[error("CSV file is empty or contains no data rows")]
    NoDataRows,

    #[error("Missing required headers: {}", .0.join(", "))]
    MissingHeaders(Vec<String>),

    #[error("failed to read CSV header: {0}")]
    Header(#[source] csv::Error),

    #[error("File must be a CSV (.csv extension)")]
    NotCsv,

    #[error("File is empty")]
    EmptyFile,

    #[error("File size exceeds maximum ({}MB)", .max_bytes / 1024 / 1024)]
    TooLarge { max_bytes: u64 },
}

/// A product row that passed validation and is ready to be inserted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParsedProduct {
    pub name: String,
    pub category: String,
    pub description: String,
    /// Rounded mean of the size prices.
    pub price: Decimal,
    /// Rounded mean of the size costs.
    pub cost: Decimal,
    pub image_url: String,
    pub stock: i32,
    pub sizes: Vec<ProductSize>,
    pub video_url: Option<String>,
}

/// Outcome of parsing a CSV file.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportReport {
    pub imported: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
    pub products: Vec<ParsedProduct>,
}

impl ImportReport {
    /// `true` when at least one row produced a product.
    #[must_use]
    pub fn success(&self) -> bool {
        self.imported > 0
    }
}

/// Outcome of persisting an [`ImportReport`]: rows that parsed but failed to
/// insert are counted separately from rows skipped during parsing.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ImportSummary {
    pub imported: usize,
    pub failed: usize,
    pub skipped: usize,
    pub errors: Vec<String>,
    pub failed_products: Vec<String>,
}

impl ImportSummary {
    /// Combines the parse report with the per-product insert failures.
    ///
    /// Each entry of `failed_products` is formatted `"<name> (<reason>)"`.
    #[must_use]
    pub fn new(report: &ImportReport, failed_products: Vec<String>) -> Self {
        Self {
            imported: report.products.len().saturating_sub(failed_products.len()),
            failed: failed_products.len(),
            skipped: report.skipped,
            errors: report.errors.clone(),
            failed_products,
        }
    }
}

/// Checks an uploaded file's name and size before its content is read.
///
/// # Errors
///
/// Returns [`ImportError::NotCsv`], [`ImportError::EmptyFile`], or
/// [`ImportError::TooLarge`].
pub fn validate_csv_upload(filename: &str, size: u64) -> Result<(), ImportError> {
    if !filename.to_lowercase().ends_with(".csv") {
        return Err(ImportError::NotCsv);
    }
    if size > MAX_FILE_SIZE {
        return Err(ImportError::TooLarge {
            max_bytes: MAX_FILE_SIZE,
        });
    }
    if size == 0 {
        return Err(ImportError::EmptyFile);
    }
    Ok(())
}

/// Parses CSV text into validated products.
///
/// `storage_url` is the public base URL of the image bucket; bare image
/// filenames are expanded against it.
///
/// # Errors
///
/// Returns [`ImportError::NoDataRows`] when there is no header plus at least one
/// data row, [`ImportError::MissingHeaders`] when a required column is absent,
/// and [`ImportError::Header`] when the header line cannot be decoded. Row-level
/// problems never produce an `Err`; they are collected in the report.
pub fn parse_csv(text: &str, storage_url: Option<&str>) -> Result<ImportReport, ImportError> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect();

    if lines.len() < 2 {
        return Err(ImportError::NoDataRows);
    }

    let joined = lines.join("\n");
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(joined.as_bytes());

    let headers = reader.headers().map_err(ImportError::Header)?.clone();
    let columns = ColumnMap::new(&headers);

    let missing: Vec<String> = REQUIRED_HEADERS
        .iter()
        .filter(|h| !columns.contains(h))
        .map(|h| (*h).to_string())
        .collect();
    if !missing.is_empty() {
        return Err(ImportError::MissingHeaders(missing));
    }

    let mut report = ImportReport::default();

    for (index, record) in reader.records().enumerate() {
        // The header is file row 1, so the first data row is row 2.
        let row_number = index + 2;

        let record = match record {
            Ok(record) => record,
            Err(e) => {
                report
                    .errors
                    .push(format!("Row {row_number}: Failed to parse product - {e}"));
                report.skipped += 1;
                continue;
            }
        };

        let row = Row {
            record: &record,
            columns: &columns,
        };

        match parse_row(&row, row_number, storage_url) {
            Ok(product) => {
                report.products.push(product);
                report.imported += 1;
            }
            Err(message) => {
                tracing::debug!(row = row_number, %message, "skipping csv row");
                report.errors.push(message);
                report.skipped += 1;
            }
        }
    }

    Ok(report)
}

/// Expands a bare image filename into a storage URL.
///
/// Absolute `http(s)` URLs are returned unchanged, as are filenames when no
/// storage URL is configured.
#[must_use]
pub fn normalize_image_url(value: &str, storage_url: Option<&str>) -> String {
    let trimmed = value.trim();
    if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        return trimmed.to_string();
    }

    match storage_url {
        Some(base) => format!(
            "{}/{STORAGE_OBJECT_PATH}/{}",
            base.trim_end_matches('/'),
            utf8_percent_encode(trimmed, FILENAME_ENCODE_SET)
        ),
        None => trimmed.to_string(),
    }
}

/// `true` when the value ends with one of [`VALID_IMAGE_EXTENSIONS`].
#[must_use]
pub fn has_valid_image_extension(value: &str) -> bool {
    let lower = value.to_lowercase();
    VALID_IMAGE_EXTENSIONS
        .iter()
        .any(|ext| lower.ends_with(*ext))
}

/// Column layout for the template endpoint and the admin UI help text.
#[derive(Debug, Clone, Serialize)]
pub struct ImportTemplate {
    pub required_headers: Vec<&'static str>,
    pub optional_headers: Vec<&'static str>,
    pub size_columns: Vec<SizeColumns>,
    pub example: serde_json::Value,
}

#[derive(Debug, Clone, Serialize)]
pub struct SizeColumns {
    pub label: &'static str,
    pub price_column: String,
    pub cost_column: String,
}

#[must_use]
pub fn import_template() -> ImportTemplate {
    ImportTemplate {
        required_headers: REQUIRED_HEADERS.to_vec(),
        optional_headers: OPTIONAL_HEADERS.to_vec(),
        size_columns: STANDARD_PRINT_SIZES
            .iter()
            .map(|size| SizeColumns {
                label: size.label,
                price_column: size.price_column(),
                cost_column: size.cost_column(),
            })
            .collect(),
        example: serde_json::json!({
            "name": "Mountain Landscape Print",
            "category": "Art Prints",
            "stock": 50,
            "imageUrl": "mountain-landscape.jpg",
            "description": "Beautiful mountain landscape",
            "price_8x10": 89,
            "cost_8x10": 30,
            "price_24x36": 189,
            "cost_24x36": 85,
        }),
    }
}

// ---------------------------------------------------------------------------
// Row parsing
// ---------------------------------------------------------------------------

/// Case-insensitive header name to column index.
struct ColumnMap {
    by_name: HashMap<String, usize>,
}

impl ColumnMap {
    fn new(headers: &csv::StringRecord) -> Self {
        let mut by_name = HashMap::new();
        for (index, header) in headers.iter().enumerate() {
            let name = header.trim().trim_matches('"').to_lowercase();
            by_name.entry(name).or_insert(index);
        }
        Self { by_name }
    }

    fn contains(&self, name: &str) -> bool {
        self.by_name.contains_key(&name.to_lowercase())
    }

    fn index(&self, name: &str) -> Option<usize> {
        self.by_name.get(&name.to_lowercase()).copied()
    }
}

struct Row<'a> {
    record: &'a csv::StringRecord,
    columns: &'a ColumnMap,
}

impl Row<'_> {
    /// Trimmed cell value; absent columns and short rows read as empty.
    fn get(&self, name: &str) -> &str {
        self.columns
            .index(name)
            .and_then(|i| self.record.get(i))
            .map_or("", |v| v.trim().trim_matches('"'))
    }
}

fn parse_row(
    row: &Row<'_>,
    row_number: usize,
    storage_url: Option<&str>,
) -> Result<ParsedProduct, String> {
    for field in REQUIRED_HEADERS {
        if row.get(field).is_empty() {
            return Err(format!(
                "Row {row_number}: Missing required field \"{field}\""
            ));
        }
    }

    let raw_stock = row.get("stock");
    let stock = leading_number(raw_stock)
        .map(|n| n.trunc())
        .filter(|n| *n >= Decimal::ZERO)
        .and_then(|n| n.to_i32())
        .ok_or_else(|| {
            format!(
                "Row {row_number}: Invalid stock \"{raw_stock}\" (must be a non-negative number)"
            )
        })?;

    if !has_size_price(row) {
        return Err(format!(
            "Row {row_number}: At least one size price must be provided (e.g., price_8x10, price_11x14, etc.)"
        ));
    }

    let image = row.get("imageUrl");
    if !has_valid_image_extension(image) {
        return Err(format!(
            "Row {row_number}: Invalid imageUrl \"{image}\" (must end with .jpg, .jpeg, .png, or .webp)"
        ));
    }

    let sizes = parse_sizes(row, row_number)?;

    let description = row.get("description").to_string();
    let video_url = Some(row.get("videoUrl"))
        .filter(|v| !v.is_empty())
        .map(ToOwned::to_owned);

    Ok(ParsedProduct {
        name: row.get("name").to_string(),
        category: row.get("category").to_string(),
        description,
        price: rounded_mean(sizes.iter().map(|s| s.price)),
        cost: rounded_mean(sizes.iter().map(|s| s.cost)),
        image_url: normalize_image_url(image, storage_url),
        stock,
        sizes,
        video_url,
    })
}

/// Step 4 of row validation: some `price_*` cell holds a number.
fn has_size_price(row: &Row<'_>) -> bool {
    STANDARD_PRINT_SIZES
        .iter()
        .any(|size| leading_number(row.get(&size.price_column())).is_some())
}

/// Builds size variations from the `price_*`/`cost_*` columns.
///
/// A size is offered only when its price parses to a positive amount; other
/// price cells are left out. A non-empty cost that is not a number fails the
/// row.
fn parse_sizes(row: &Row<'_>, row_number: usize) -> Result<Vec<ProductSize>, String> {
    let mut sizes = Vec::new();

    for size in &STANDARD_PRINT_SIZES {
        let Some(price) = leading_number(row.get(&size.price_column())) else {
            continue;
        };
        if price <= Decimal::ZERO {
            continue;
        }

        let cost_column = size.cost_column();
        let raw_cost = row.get(&cost_column);
        let cost = if raw_cost.is_empty() {
            Decimal::ZERO
        } else {
            leading_number(raw_cost)
                .ok_or_else(|| format!("Row {row_number}: Invalid {cost_column} \"{raw_cost}\""))?
        };

        sizes.push(ProductSize {
            label: size.label.to_string(),
            price: round_whole(price),
            cost: round_whole(cost),
        });
    }

    Ok(sizes)
}

/// Reads the numeric prefix of a cell: an optional sign, digits, and an
/// optional fraction (`"12.5 USD"` reads as 12.5, `"2.5"` as 2.5). `None`
/// when the cell does not start with a number.
fn leading_number(raw: &str) -> Option<Decimal> {
    let raw = raw.trim();
    let bytes = raw.as_bytes();
    let mut end = usize::from(matches!(bytes.first(), Some(b'+' | b'-')));

    let int_start = end;
    while bytes.get(end).is_some_and(u8::is_ascii_digit) {
        end += 1;
    }
    let mut digits = end - int_start;

    if bytes.get(end) == Some(&b'.') {
        let frac_start = end + 1;
        let mut frac_end = frac_start;
        while bytes.get(frac_end).is_some_and(u8::is_ascii_digit) {
            frac_end += 1;
        }
        if frac_end > frac_start {
            digits += frac_end - frac_start;
            end = frac_end;
        }
    }

    if digits == 0 {
        return None;
    }
    Decimal::from_str(raw[..end].trim_start_matches('+')).ok()
}

fn round_whole(value: Decimal) -> Decimal {
    value.round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

fn rounded_mean(values: impl Iterator<Item = Decimal>) -> Decimal {
    let (sum, count) = values.fold((Decimal::ZERO, 0u32), |(sum, n), v| (sum + v, n + 1));
    if count == 0 {
        return Decimal::ZERO;
    }
    round_whole(sum / Decimal::from(count))
}

#[cfg(test)]
#[path = "import_test.rs"]
mod tests;
