//! `import` subcommand: bulk product import from a CSV file.

use std::path::Path;

use futures::{stream, StreamExt};
use lustre_core::{AppConfig, ImportReport, ImportSummary, ParsedProduct};

/// Validate and parse a CSV file from disk.
///
/// # Errors
///
/// Returns an error if the file cannot be read, fails the upload checks
/// (extension, size), is not UTF-8, or lacks the required headers.
pub(crate) fn read_report(path: &Path, storage_url: Option<&str>) -> anyhow::Result<ImportReport> {
    let filename = path
        .file_name()
        .and_then(|n| n.to_str())
        .ok_or_else(|| anyhow::anyhow!("invalid file path: {}", path.display()))?;

    let size = std::fs::metadata(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?
        .len();
    lustre_core::validate_csv_upload(filename, size)?;

    let text = std::fs::read_to_string(path)
        .map_err(|e| anyhow::anyhow!("failed to read {}: {e}", path.display()))?;

    Ok(lustre_core::parse_csv(&text, storage_url)?)
}

/// Parse `path`, print the report, and insert the parsed products.
///
/// When `dry_run` is `true` nothing is written and no database connection is
/// opened. Individual insert failures are reported, not propagated.
///
/// # Errors
///
/// Returns an error if the file is rejected or the database is unreachable.
pub(crate) async fn run_import(config: &AppConfig, path: &Path, dry_run: bool) -> anyhow::Result<()> {
    let report = read_report(path, config.storage_url.as_deref())?;

    println!(
        "parsed {} product(s), skipped {} row(s)",
        report.imported, report.skipped
    );
    for error in &report.errors {
        println!("  {error}");
    }

    if dry_run {
        for product in &report.products {
            println!(
                "dry-run: would import {:<40}{:>10}  {} size(s)",
                product.name,
                product.price,
                product.sizes.len()
            );
        }
        return Ok(());
    }

    if report.products.is_empty() {
        println!("nothing to import");
        return Ok(());
    }

    let pool = crate::db::connect(config).await?;
    let concurrency = config.import_concurrency.max(1);

    let failed: Vec<String> = stream::iter(report.products.iter())
        .map(|product| insert_one(&pool, product))
        .buffered(concurrency)
        .filter_map(|result| async move { result })
        .collect()
        .await;

    let summary = ImportSummary::new(&report, failed);
    tracing::info!(
        imported = summary.imported,
        failed = summary.failed,
        skipped = summary.skipped,
        "import complete"
    );

    println!(
        "imported {}, failed {}, skipped {}",
        summary.imported, summary.failed, summary.skipped
    );
    for name in &summary.failed_products {
        println!("  failed: {name}");
    }

    Ok(())
}

async fn insert_one(pool: &sqlx::PgPool, product: &ParsedProduct) -> Option<String> {
    match lustre_db::create_product(pool, &lustre_db::NewProduct::from(product)).await {
        Ok(_) => None,
        Err(e) => {
            tracing::warn!(name = %product.name, error = %e, "failed to import product");
            Some(format!("{} ({e})", product.name))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_file(dir: &tempfile::TempDir, name: &str, content: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        let mut file = std::fs::File::create(&path).expect("create file");
        file.write_all(content.as_bytes()).expect("write file");
        path
    }

    #[test]
    fn reads_report_from_disk() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_file(
            &dir,
            "prints.csv",
            "name,category,stock,imageUrl,price_8x10\n\
             Koi,Art Prints,4,koi.jpg,80\n\
             ,Art Prints,1,x.jpg,10\n",
        );

        let report = read_report(&path, Some("https://cdn.example.com")).expect("report");
        assert_eq!(report.imported, 1);
        assert_eq!(report.skipped, 1);
        assert_eq!(report.products[0].name, "Koi");
    }

    #[test]
    fn rejects_non_csv_extension() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_file(&dir, "prints.txt", "name\n");

        let err = read_report(&path, None).expect_err("should reject");
        assert!(err.to_string().contains("must be a CSV"));
    }

    #[test]
    fn rejects_empty_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = write_file(&dir, "empty.csv", "");

        let err = read_report(&path, None).expect_err("should reject");
        assert_eq!(err.to_string(), "File is empty");
    }

    #[test]
    fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().expect("tempdir");
        let err = read_report(&dir.path().join("nope.csv"), None).expect_err("should fail");
        assert!(err.to_string().starts_with("failed to read"));
    }
}
