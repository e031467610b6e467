use rust_decimal::Decimal;

use super::*;

const HEADER: &str = "name,category,stock,imageUrl,description,price_8x10,cost_8x10,price_24x36,cost_24x36";

fn csv_with_rows(rows: &[&str]) -> String {
    let mut text = String::from(HEADER);
    for row in rows {
        text.push('\n');
        text.push_str(row);
    }
    text
}

#[test]
fn parses_valid_row_with_two_sizes() {
    let text = csv_with_rows(&["Mountain,Art Prints,50,mountain.jpg,Peaks,89,30,189,85"]);
    let report = parse_csv(&text, None).expect("parse");

    assert!(report.success());
    assert_eq!(report.imported, 1);
    assert_eq!(report.skipped, 0);
    assert!(report.errors.is_empty());

    let product = &report.products[0];
    assert_eq!(product.name, "Mountain");
    assert_eq!(product.stock, 50);
    assert_eq!(product.sizes.len(), 2);
    assert_eq!(product.sizes[0].label, "8\" x 10\"");
    assert_eq!(product.sizes[1].label, "24\" x 36\"");
    // (89 + 189) / 2 and (30 + 85) / 2 = 57.5
    assert_eq!(product.price, Decimal::from(139));
    assert_eq!(product.cost, Decimal::from(58));
    assert_eq!(product.video_url, None);
}

#[test]
fn empty_input_is_fatal() {
    assert!(matches!(parse_csv("", None), Err(ImportError::NoDataRows)));
    assert!(matches!(
        parse_csv(&format!("{HEADER}\n\n   \n"), None),
        Err(ImportError::NoDataRows)
    ));
}

#[test]
fn no_data_rows_message_is_stable() {
    let err = parse_csv(HEADER, None).unwrap_err();
    assert_eq!(err.to_string(), "CSV file is empty or contains no data rows");
}

#[test]
fn missing_headers_are_listed_in_order() {
    let err = parse_csv("name,description\nFoo,Bar", None).unwrap_err();
    match &err {
        ImportError::MissingHeaders(missing) => {
            assert_eq!(missing, &["category", "stock", "imageUrl"]);
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(
        err.to_string(),
        "Missing required headers: category, stock, imageUrl"
    );
}

#[test]
fn headers_match_case_insensitively_and_ignore_quotes() {
    let text = "\"NAME\",Category,STOCK,imageurl,PRICE_8X10\nWave,Prints,3,wave.png,40";
    let report = parse_csv(text, None).expect("parse");
    assert_eq!(report.imported, 1);
    assert_eq!(report.products[0].sizes[0].price, Decimal::from(40));
}

#[test]
fn missing_required_field_is_reported_first() {
    let text = csv_with_rows(&["Mountain,,abc,mountain.gif,Peaks,,,,"]);
    let report = parse_csv(&text, None).expect("parse");

    assert_eq!(report.skipped, 1);
    assert_eq!(
        report.errors,
        vec!["Row 2: Missing required field \"category\"".to_string()]
    );
}

#[test]
fn invalid_stock_beats_missing_price() {
    let text = csv_with_rows(&[
        "A,Prints,abc,a.jpg,,,,,",
        "B,Prints,-1,b.jpg,,89,,,",
    ]);
    let report = parse_csv(&text, None).expect("parse");

    assert_eq!(report.imported, 0);
    assert_eq!(
        report.errors,
        vec![
            "Row 2: Invalid stock \"abc\" (must be a non-negative number)".to_string(),
            "Row 3: Invalid stock \"-1\" (must be a non-negative number)".to_string(),
        ]
    );
}

#[test]
fn fractional_stock_is_truncated() {
    let text = csv_with_rows(&["A,Prints,2.5,a.jpg,,89,,,", "B,Prints,7 units,b.jpg,,89,,,"]);
    let report = parse_csv(&text, None).expect("parse");

    assert!(report.errors.is_empty());
    assert_eq!(report.products[0].stock, 2);
    assert_eq!(report.products[1].stock, 7);
}

#[test]
fn missing_price_beats_bad_image() {
    let text = csv_with_rows(&["A,Prints,1,a.gif,,,,,"]);
    let report = parse_csv(&text, None).expect("parse");

    assert_eq!(
        report.errors,
        vec![
            "Row 2: At least one size price must be provided (e.g., price_8x10, price_11x14, etc.)"
                .to_string()
        ]
    );
}

#[test]
fn zero_price_counts_as_present_so_image_is_checked() {
    let text = "name,category,stock,imageUrl,price_8x10\nA,Prints,1,a.gif,0";
    let report = parse_csv(text, None).expect("parse");

    assert_eq!(
        report.errors,
        vec![
            "Row 2: Invalid imageUrl \"a.gif\" (must end with .jpg, .jpeg, .png, or .webp)"
                .to_string()
        ]
    );
}

#[test]
fn row_with_only_non_positive_prices_imports_without_sizes() {
    let text = csv_with_rows(&["A,Prints,1,a.jpg,,0,5,-3,"]);
    let report = parse_csv(&text, None).expect("parse");

    assert_eq!(report.imported, 1);
    let product = &report.products[0];
    assert!(product.sizes.is_empty());
    assert_eq!(product.price, Decimal::ZERO);
    assert_eq!(product.cost, Decimal::ZERO);
}

#[test]
fn bad_image_extension_is_rejected() {
    let text = csv_with_rows(&["A,Prints,1,a.gif,,10,,,"]);
    let report = parse_csv(&text, None).expect("parse");

    assert_eq!(
        report.errors,
        vec![
            "Row 2: Invalid imageUrl \"a.gif\" (must end with .jpg, .jpeg, .png, or .webp)"
                .to_string()
        ]
    );
}

#[test]
fn image_extension_check_is_case_insensitive() {
    assert!(has_valid_image_extension("PHOTO.JPEG"));
    assert!(has_valid_image_extension("https://cdn.example.com/a.WebP"));
    assert!(!has_valid_image_extension("photo.tiff"));
}

#[test]
fn unparseable_price_is_skipped_when_another_size_parses() {
    let text = "name,category,stock,imageUrl,price_8x10,price_24x36\nA,Prints,1,a.jpg,ten,100";
    let report = parse_csv(text, None).expect("parse");

    assert!(report.errors.is_empty());
    let product = &report.products[0];
    assert_eq!(product.sizes.len(), 1);
    assert_eq!(product.sizes[0].label, "24\" x 36\"");
    assert_eq!(product.price, Decimal::from(100));
}

#[test]
fn only_unparseable_prices_count_as_missing() {
    let text = csv_with_rows(&["A,Prints,1,a.jpg,,ten,,,"]);
    let report = parse_csv(&text, None).expect("parse");

    assert_eq!(
        report.errors,
        vec![
            "Row 2: At least one size price must be provided (e.g., price_8x10, price_11x14, etc.)"
                .to_string()
        ]
    );
}

#[test]
fn unparseable_cost_fails_the_row() {
    let text = csv_with_rows(&["B,Prints,1,b.jpg,,10,cheap,,"]);
    let report = parse_csv(&text, None).expect("parse");

    assert_eq!(
        report.errors,
        vec!["Row 2: Invalid cost_8x10 \"cheap\"".to_string()]
    );
}

#[test]
fn price_cells_read_their_numeric_prefix() {
    let text = csv_with_rows(&["A,Prints,1,a.jpg,,12.5 USD,4,,"]);
    let report = parse_csv(&text, None).expect("parse");

    assert_eq!(report.products[0].sizes[0].price, Decimal::from(13));
}

#[test]
fn bad_rows_do_not_abort_the_batch() {
    let text = csv_with_rows(&[
        "Good One,Prints,1,one.jpg,,10,,,",
        ",Prints,1,two.jpg,,10,,,",
        "Good Three,Prints,1,three.jpg,,10,,,",
    ]);
    let report = parse_csv(&text, None).expect("parse");

    assert_eq!(report.imported, 2);
    assert_eq!(report.skipped, 1);
    assert_eq!(report.errors.len(), 1);
    assert!(report.errors[0].starts_with("Row 3:"));
}

#[test]
fn blank_lines_are_dropped_before_numbering_rows() {
    let text = format!("{HEADER}\n\nA,Prints,1,a.jpg,,10,,,\n\n,Prints,1,b.jpg,,10,,,\n");
    let report = parse_csv(&text, None).expect("parse");

    assert_eq!(report.imported, 1);
    assert_eq!(
        report.errors,
        vec!["Row 3: Missing required field \"name\"".to_string()]
    );
}

#[test]
fn quoted_fields_keep_embedded_commas() {
    let text = csv_with_rows(&[
        "\"Sunset, Redux\",Prints,4,sunset.webp,\"Warm, orange\",12.5,4.5,,",
    ]);
    let report = parse_csv(&text, None).expect("parse");

    let product = &report.products[0];
    assert_eq!(product.name, "Sunset, Redux");
    assert_eq!(product.description, "Warm, orange");
    // Half-units round away from zero.
    assert_eq!(product.sizes[0].price, Decimal::from(13));
    assert_eq!(product.sizes[0].cost, Decimal::from(5));
}

#[test]
fn non_positive_prices_are_dropped_from_sizes() {
    let text = csv_with_rows(&["A,Prints,1,a.jpg,,0,5,60,20"]);
    let report = parse_csv(&text, None).expect("parse");

    let product = &report.products[0];
    assert_eq!(product.sizes.len(), 1);
    assert_eq!(product.sizes[0].label, "24\" x 36\"");
    assert_eq!(product.price, Decimal::from(60));
    assert_eq!(product.cost, Decimal::from(20));
}

#[test]
fn short_rows_read_missing_cells_as_empty() {
    let text = "name,category,stock,imageUrl,price_8x10,videoUrl\nA,Prints,1,a.jpg,15";
    let report = parse_csv(text, None).expect("parse");

    assert_eq!(report.imported, 1);
    assert_eq!(report.products[0].video_url, None);
}

#[test]
fn video_url_is_carried_when_present() {
    let text = "name,category,stock,imageUrl,price_8x10,videoUrl\nA,Prints,1,a.jpg,15,https://v.example.com/a.mp4";
    let report = parse_csv(text, None).expect("parse");
    assert_eq!(
        report.products[0].video_url.as_deref(),
        Some("https://v.example.com/a.mp4")
    );
}

#[test]
fn bare_filenames_expand_against_storage_url() {
    let text = csv_with_rows(&["A,Prints,1,my print.jpg,,10,,,"]);
    let report = parse_csv(&text, Some("https://abc.supabase.co/")).expect("parse");

    assert_eq!(
        report.products[0].image_url,
        "https://abc.supabase.co/storage/v1/object/public/product-images/products/my%20print.jpg"
    );
}

#[test]
fn absolute_urls_and_unconfigured_storage_are_left_alone() {
    assert_eq!(
        normalize_image_url("https://cdn.example.com/a.jpg", Some("https://store")),
        "https://cdn.example.com/a.jpg"
    );
    assert_eq!(normalize_image_url(" a.jpg ", None), "a.jpg");
}

#[test]
fn upload_checks() {
    assert!(validate_csv_upload("products.CSV", 10).is_ok());
    assert!(matches!(
        validate_csv_upload("products.xlsx", 10),
        Err(ImportError::NotCsv)
    ));
    assert!(matches!(
        validate_csv_upload("products.csv", 0),
        Err(ImportError::EmptyFile)
    ));
    let err = validate_csv_upload("products.csv", MAX_FILE_SIZE + 1).unwrap_err();
    assert_eq!(err.to_string(), "File size exceeds maximum (5MB)");
}

#[test]
fn summary_subtracts_insert_failures() {
    let text = csv_with_rows(&[
        "A,Prints,1,a.jpg,,10,,,",
        "B,Prints,1,b.jpg,,10,,,",
        ",Prints,1,c.jpg,,10,,,",
    ]);
    let report = parse_csv(&text, None).expect("parse");
    let summary = ImportSummary::new(&report, vec!["B (duplicate key)".to_string()]);

    assert_eq!(summary.imported, 1);
    assert_eq!(summary.failed, 1);
    assert_eq!(summary.skipped, 1);
    assert_eq!(summary.errors.len(), 1);
}

#[test]
fn template_lists_every_size_column() {
    let template = import_template();
    assert_eq!(template.required_headers, REQUIRED_HEADERS.to_vec());
    assert_eq!(template.size_columns.len(), STANDARD_PRINT_SIZES.len());
    assert_eq!(template.size_columns[0].price_column, "price_8x10");
    assert_eq!(template.example["imageUrl"], "mountain-landscape.jpg");
}
