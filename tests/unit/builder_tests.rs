//! Unit tests for mapping assembly and cross-table validation

use pretty_assertions::assert_eq;

use ingest_mapping::model::{build_mapping, validate_mapping, ColumnDefinition, PartitionsStyle};
use ingest_mapping::workbook::{CellValue, Workbook, Worksheet};
use ingest_mapping::{CompilerConfig, MappingError};

fn sheet(title: &str, rows: &[&[&str]]) -> Worksheet {
    let rows = rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|v| {
                    if v.is_empty() {
                        CellValue::Empty
                    } else {
                        CellValue::text(*v)
                    }
                })
                .collect()
        })
        .collect();
    Worksheet::new(title, rows)
}

/// Ingestion worksheet with the given `#CONFIG` rows and `new_name|data_type|key|nullable` rows.
fn ingestion_sheet(title: &str, config: &[&[&str]], columns: &[&[&str]]) -> Worksheet {
    let mut rows: Vec<&[&str]> = Vec::new();
    rows.push(&["TYPE"]);
    rows.push(&["#INGESTION"]);
    rows.push(&["#CONFIG"]);
    rows.extend_from_slice(config);
    rows.push(&["#SELECT"]);
    rows.push(&["new_name", "data_type", "key", "nullable"]);
    rows.extend_from_slice(columns);
    sheet(title, &rows)
}

fn config() -> CompilerConfig {
    CompilerConfig {
        source_schema: "raw".to_string(),
        target_schema: "lake".to_string(),
        batch_profile: "batch".to_string(),
        datalake_profile: "datalake".to_string(),
        batch_location: "s3://acme-batch".to_string(),
        datalake_location: "s3://acme-lake/".to_string(),
        ..Default::default()
    }
}

fn partition(source: &str, target: &str, data_type: &str) -> ColumnDefinition {
    ColumnDefinition {
        source_column: source.to_string(),
        source_formula: None,
        target_column: target.to_string(),
        description: format!("Partition {}", source),
        data_type: data_type.to_string(),
        format: None,
        is_key: false,
        is_index: false,
        is_nullable: false,
        is_partition: true,
    }
}

// ============================================================================
// End-to-End Table Tests
// ============================================================================

#[test]
fn test_orders_worksheet_compiles() {
    let workbook = Workbook::from_sheets(vec![ingestion_sheet(
        "orders",
        &[&["source_table", "orders"]],
        &[&["id", "integer", "yes", "no"]],
    )]);
    let mapping = build_mapping(&workbook, "Sales", &config()).unwrap();

    assert_eq!(mapping.table_names(), vec!["sales_orders"]);
    let table = mapping.get("sales_orders").unwrap();
    assert_eq!(table.flow, "sales");
    assert_eq!(table.source_table, "sales_orders");
    assert_eq!(table.source_schema, "raw");
    assert_eq!(table.target_schema, "lake");
    assert_eq!(table.source_format, "csv");
    assert_eq!(table.field_delimiter, "|");
    assert_eq!(table.partitions, vec!["year", "month", "day"]);

    // delimited sources use positional source names
    assert_eq!(
        table.columns,
        vec![
            ColumnDefinition {
                source_column: "col1".to_string(),
                source_formula: None,
                target_column: "id".to_string(),
                description: String::new(),
                data_type: "integer".to_string(),
                format: None,
                is_key: true,
                is_index: false,
                is_nullable: false,
                is_partition: false,
            },
            partition("year", "year", "char(4)"),
            partition("month", "month", "char(2)"),
            partition("day", "day", "char(2)"),
        ]
    );
}

#[test]
fn test_derived_locations() {
    let workbook = Workbook::from_sheets(vec![ingestion_sheet(
        "orders",
        &[&["source_table", "orders"], &["target_table", "order_facts"]],
        &[&["id", "integer", "", ""]],
    )]);
    let mapping = build_mapping(&workbook, "sales", &config()).unwrap();
    let table = mapping.get("sales_order_facts").unwrap();

    assert_eq!(table.source_location, "s3://acme-batch/sales/orders/");
    assert_eq!(table.target_location, "s3://acme-lake/sales/order_facts/");
}

#[test]
fn test_explicit_locations_get_trailing_separator() {
    let workbook = Workbook::from_sheets(vec![ingestion_sheet(
        "orders",
        &[
            &["source_table", "orders"],
            &["source_location", "s3://landing/orders"],
            &["target_location", "s3://curated/orders/"],
        ],
        &[&["id", "integer", "", ""]],
    )]);
    let mapping = build_mapping(&workbook, "sales", &config()).unwrap();
    let table = mapping.get("sales_orders").unwrap();

    assert_eq!(table.source_location, "s3://landing/orders/");
    assert_eq!(table.target_location, "s3://curated/orders/");
}

#[test]
fn test_source_table_from_filename() {
    let workbook = Workbook::from_sheets(vec![ingestion_sheet(
        "lines",
        &[&["source_filename", "{{ ds }}-Order-Lines.2024.csv"]],
        &[&["id", "integer", "", ""]],
    )]);
    let mapping = build_mapping(&workbook, "sales", &config()).unwrap();
    let table = mapping.get("sales_order_lines").unwrap();
    assert_eq!(table.source_table, "sales_order_lines");
    assert_eq!(
        table.source_filename.as_deref(),
        Some("{{ ds }}-Order-Lines.2024.csv")
    );
}

#[test]
fn test_missing_filename_is_reported() {
    let workbook = Workbook::from_sheets(vec![ingestion_sheet(
        "lines",
        &[&["source_format", "csv"]],
        &[&["id", "integer", "", ""]],
    )]);
    let err = build_mapping(&workbook, "sales", &config()).unwrap_err();
    assert_eq!(
        err,
        MappingError::InvalidFilename {
            worksheet: "lines".to_string(),
            filename: None,
        }
    );
}

#[test]
fn test_namespaced_names_are_not_prefixed_twice() {
    let workbook = Workbook::from_sheets(vec![ingestion_sheet(
        "orders",
        &[&["source_table", "SALES_Orders"], &["target_table", "sales_orders"]],
        &[&["id", "integer", "", ""]],
    )]);
    let mapping = build_mapping(&workbook, "sales", &config()).unwrap();
    assert_eq!(mapping.table_names(), vec!["sales_orders"]);
    assert_eq!(mapping.get("sales_orders").unwrap().source_table, "sales_orders");
}

// ============================================================================
// Partition Tests
// ============================================================================

#[test]
fn test_hive_partitions_from_setting() {
    let workbook = Workbook::from_sheets(vec![ingestion_sheet(
        "orders",
        &[&["source_table", "orders"], &["partitions", "year, source , hour"]],
        &[&["id", "integer", "", ""]],
    )]);
    let mapping = build_mapping(&workbook, "sales", &config()).unwrap();
    let table = mapping.get("sales_orders").unwrap();

    assert_eq!(table.partitions, vec!["year", "source", "hour"]);
    assert_eq!(
        table.columns[1..].to_vec(),
        vec![
            partition("year", "year", "char(4)"),
            partition("source", "source", "varchar(20)"),
            partition("hour", "hour", "char(2)"),
        ]
    );
}

#[test]
fn test_non_hive_partitions_are_positional() {
    let workbook = Workbook::from_sheets(vec![ingestion_sheet(
        "orders",
        &[&["source_table", "orders"], &["partitions_style", "non-hive"]],
        &[&["id", "integer", "", ""]],
    )]);
    let mapping = build_mapping(&workbook, "sales", &config()).unwrap();
    let table = mapping.get("sales_orders").unwrap();

    assert_eq!(table.partitions_style, PartitionsStyle::NonHive);
    assert_eq!(
        table.columns[1..].to_vec(),
        vec![
            partition("partition_0", "year", "char(4)"),
            partition("partition_1", "month", "char(2)"),
            partition("partition_2", "day", "char(2)"),
        ]
    );
}

#[test]
fn test_empty_partitions_setting_means_none() {
    let workbook = Workbook::from_sheets(vec![ingestion_sheet(
        "orders",
        &[&["source_table", "orders"], &["partitions", ""]],
        &[&["id", "integer", "", ""]],
    )]);
    let mapping = build_mapping(&workbook, "sales", &config()).unwrap();
    let table = mapping.get("sales_orders").unwrap();

    assert!(table.partitions.is_empty());
    assert_eq!(table.columns.len(), 1);
}

#[test]
fn test_partition_keys_are_lower_cased() {
    let workbook = Workbook::from_sheets(vec![ingestion_sheet(
        "orders",
        &[&["source_table", "orders"], &["partitions", "Year, MONTH"]],
        &[&["id", "integer", "", ""]],
    )]);
    let mapping = build_mapping(&workbook, "sales", &config()).unwrap();
    let table = mapping.get("sales_orders").unwrap();

    assert_eq!(table.partitions, vec!["year", "month"]);
    assert_eq!(
        table.columns[1..].to_vec(),
        vec![
            partition("year", "year", "char(4)"),
            partition("month", "month", "char(2)"),
        ]
    );
}

#[test]
fn test_default_partition_keys_are_lower_cased() {
    let config = CompilerConfig {
        default_partitions: vec!["Year".to_string(), "Hour".to_string()],
        ..config()
    };
    let workbook = Workbook::from_sheets(vec![ingestion_sheet(
        "orders",
        &[&["source_table", "orders"]],
        &[&["id", "integer", "", ""]],
    )]);
    let mapping = build_mapping(&workbook, "sales", &config).unwrap();
    assert_eq!(mapping.get("sales_orders").unwrap().partitions, vec!["year", "hour"]);
}

#[test]
fn test_invalid_partition_key_is_rejected() {
    for key in ["load date", "load.date", "load-date"] {
        let partitions = format!("year, {}", key);
        let workbook = Workbook::from_sheets(vec![ingestion_sheet(
            "orders",
            &[&["source_table", "orders"], &["partitions", partitions.as_str()]],
            &[&["id", "integer", "", ""]],
        )]);
        let err = build_mapping(&workbook, "sales", &config()).unwrap_err();
        assert_eq!(
            err,
            MappingError::InvalidPartition {
                table: "sales_orders".to_string(),
                partition: key.to_string(),
            }
        );
    }
}

#[test]
fn test_invalid_partitions_style() {
    let workbook = Workbook::from_sheets(vec![ingestion_sheet(
        "orders",
        &[&["source_table", "orders"], &["partitions_style", "flat"]],
        &[&["id", "integer", "", ""]],
    )]);
    let err = build_mapping(&workbook, "sales", &config()).unwrap_err();
    assert_eq!(
        err,
        MappingError::InvalidPartitionsStyle {
            table: "sales_orders".to_string(),
            style: "flat".to_string(),
        }
    );
}

// ============================================================================
// Workbook-Level Tests
// ============================================================================

#[test]
fn test_tables_keep_worksheet_order_and_skip_other_sheets() {
    let workbook = Workbook::from_sheets(vec![
        ingestion_sheet("b", &[&["source_table", "zeta"]], &[&["id", "integer", "", ""]]),
        sheet("README", &[&["How to fill this workbook"]]),
        ingestion_sheet("a", &[&["source_table", "alpha"]], &[&["id", "integer", "", ""]]),
    ]);
    let mapping = build_mapping(&workbook, "sales", &config()).unwrap();
    assert_eq!(mapping.table_names(), vec!["sales_zeta", "sales_alpha"]);
    assert_eq!(mapping.get("sales_alpha").unwrap().worksheet, "a");
}

#[test]
fn test_duplicate_target_tables_are_reported_together() {
    let workbook = Workbook::from_sheets(vec![
        ingestion_sheet("o1", &[&["source_table", "orders"]], &[&["id", "integer", "", ""]]),
        ingestion_sheet("o2", &[&["source_table", "orders"]], &[&["id", "integer", "", ""]]),
        ingestion_sheet("l1", &[&["source_table", "lines"]], &[&["id", "integer", "", ""]]),
        ingestion_sheet("l2", &[&["target_table", "Lines"], &["source_table", "x"]], &[]),
    ]);
    let err = build_mapping(&workbook, "sales", &config()).unwrap_err();
    assert_eq!(
        err,
        MappingError::DuplicateTargetTables {
            tables: vec!["sales_orders".to_string(), "sales_lines".to_string()],
        }
    );
}

#[test]
fn test_repeated_target_table_is_listed_once() {
    let workbook = Workbook::from_sheets(vec![
        ingestion_sheet("o1", &[&["source_table", "orders"]], &[&["id", "integer", "", ""]]),
        ingestion_sheet("o2", &[&["source_table", "orders"]], &[&["id", "integer", "", ""]]),
        ingestion_sheet("o3", &[&["source_table", "orders"]], &[&["id", "integer", "", ""]]),
    ]);
    let err = build_mapping(&workbook, "sales", &config()).unwrap_err();
    assert_eq!(
        err,
        MappingError::DuplicateTargetTables {
            tables: vec!["sales_orders".to_string()],
        }
    );
}

#[test]
fn test_shared_source_table_collides_in_batch_documents() {
    let workbook = Workbook::from_sheets(vec![
        ingestion_sheet(
            "orders_a",
            &[&["source_table", "orders"], &["target_table", "orders_a"]],
            &[&["id", "integer", "", ""]],
        ),
        ingestion_sheet(
            "orders_b",
            &[&["source_table", "orders"], &["target_table", "orders_b"]],
            &[&["id", "integer", "", ""]],
        ),
    ]);
    let err = build_mapping(&workbook, "sales", &config()).unwrap_err();
    assert_eq!(
        err,
        MappingError::DuplicateSourceDocuments {
            documents: vec!["batch__sales_orders".to_string()],
        }
    );
}

#[test]
fn test_shared_profile_across_kinds_is_not_a_collision() {
    let config = CompilerConfig {
        batch_profile: "dbt".to_string(),
        datalake_profile: "dbt".to_string(),
        ..config()
    };
    let workbook = Workbook::from_sheets(vec![ingestion_sheet(
        "orders",
        &[&["source_table", "orders"]],
        &[&["id", "integer", "", ""]],
    )]);
    assert!(build_mapping(&workbook, "sales", &config).is_ok());
}

#[test]
fn test_excluded_table_is_dropped() {
    let workbook = Workbook::from_sheets(vec![
        ingestion_sheet(
            "orders",
            &[&["source_table", "orders"], &["exclude_table", "yes"]],
            &[&["id", "integer", "", ""]],
        ),
        ingestion_sheet("lines", &[&["source_table", "lines"]], &[&["id", "integer", "", ""]]),
    ]);
    let mapping = build_mapping(&workbook, "sales", &config()).unwrap();
    assert_eq!(mapping.table_names(), vec!["sales_lines"]);
}

#[test]
fn test_excluded_table_still_counts_as_duplicate() {
    let workbook = Workbook::from_sheets(vec![
        ingestion_sheet(
            "orders_old",
            &[&["source_table", "orders"], &["exclude_table", "yes"]],
            &[&["id", "integer", "", ""]],
        ),
        ingestion_sheet("orders", &[&["source_table", "orders"]], &[&["id", "integer", "", ""]]),
    ]);
    let err = build_mapping(&workbook, "sales", &config()).unwrap_err();
    assert!(matches!(err, MappingError::DuplicateTargetTables { .. }));
}

#[test]
fn test_duplicate_columns_name_the_table() {
    let workbook = Workbook::from_sheets(vec![ingestion_sheet(
        "orders",
        &[&["source_table", "orders"], &["partitions", ""]],
        &[&["id", "integer", "", ""], &["ID", "bigint", "", ""]],
    )]);
    let err = build_mapping(&workbook, "sales", &config()).unwrap_err();
    assert_eq!(err.to_string(), "duplicated columns: column 'id' in table 'sales_orders'");
}

#[test]
fn test_data_column_clashing_with_partition_is_duplicate() {
    let workbook = Workbook::from_sheets(vec![ingestion_sheet(
        "orders",
        &[&["source_table", "orders"], &["partitions", "year"]],
        &[&["year", "integer", "", ""]],
    )]);
    let err = build_mapping(&workbook, "sales", &config()).unwrap_err();
    match err {
        MappingError::DuplicateColumns { duplicates } => {
            assert_eq!(duplicates.len(), 1);
            assert_eq!(duplicates[0].column, "year");
        }
        other => panic!("Expected duplicate columns, got {:?}", other),
    }
}

#[test]
fn test_validate_accepts_compiled_mapping() {
    let workbook = Workbook::from_sheets(vec![ingestion_sheet(
        "orders",
        &[&["source_table", "orders"]],
        &[&["id", "integer", "yes", "no"], &["amount", "decimal", "", "yes"]],
    )]);
    let mapping = build_mapping(&workbook, "sales", &config()).unwrap();
    assert!(validate_mapping(&mapping).is_ok());
}

// ============================================================================
// Table Setting Tests
// ============================================================================

#[test]
fn test_table_settings_override_config() {
    let workbook = Workbook::from_sheets(vec![ingestion_sheet(
        "events",
        &[
            &["source_table", "events"],
            &["source_format", "json"],
            &["source_schema", "landing"],
            &["batch_profile", "batch_events"],
            &["compression_type", "gzip"],
            &["description", "Click events"],
            &["tags", "web  daily"],
        ],
        &[&["EventId", "varchar", "yes", "no"]],
    )]);
    let mapping = build_mapping(&workbook, "web", &config()).unwrap();
    let table = mapping.get("web_events").unwrap();

    assert!(table.is_json_source());
    assert_eq!(table.source_schema, "landing");
    assert_eq!(table.batch_profile, "batch_events");
    assert_eq!(table.datalake_profile, "datalake");
    assert_eq!(table.compression_type.as_deref(), Some("gzip"));
    assert_eq!(table.description.as_deref(), Some("Click events"));
    assert_eq!(
        table.tag_list(),
        Some(vec!["web".to_string(), "daily".to_string()])
    );
    // JSON sources name their columns
    assert_eq!(table.columns[0].source_column, "eventid");
}

#[test]
fn test_unknown_settings_are_preserved() {
    let workbook = Workbook::from_sheets(vec![sheet(
        "orders",
        &[
            &["TYPE"],
            &["#INGESTION"],
            &["#CONFIG"],
            &["source_table", "orders"],
            &["Owner", "data team"],
            &["#WHERE"],
            &["status <> 'X'"],
        ],
    )]);
    let mapping = build_mapping(&workbook, "sales", &config()).unwrap();
    let table = mapping.get("sales_orders").unwrap();

    assert_eq!(table.where_condition.as_deref(), Some("status <> 'X'"));
    assert_eq!(
        table.extra.get("owner"),
        Some(&serde_json::Value::String("data team".to_string()))
    );
    assert!(!table.extra.contains_key("source_table"));
    assert!(!table.extra.contains_key("where_condition"));
}

#[test]
fn test_whitespace_field_delimiter_is_kept() {
    for delimiter in ["\t", " "] {
        let workbook = Workbook::from_sheets(vec![ingestion_sheet(
            "orders",
            &[&["source_table", "orders"], &["field_delimiter", delimiter]],
            &[&["id", "integer", "", ""]],
        )]);
        let mapping = build_mapping(&workbook, "sales", &config()).unwrap();
        let table = mapping.get("sales_orders").unwrap();
        assert_eq!(table.field_delimiter, delimiter);
        assert!(!table.extra.contains_key("field_delimiter"));
    }
}

#[test]
fn test_blank_field_delimiter_uses_default() {
    let workbook = Workbook::from_sheets(vec![ingestion_sheet(
        "orders",
        &[&["source_table", "orders"], &["field_delimiter", ""]],
        &[&["id", "integer", "", ""]],
    )]);
    let mapping = build_mapping(&workbook, "sales", &config()).unwrap();
    assert_eq!(mapping.get("sales_orders").unwrap().field_delimiter, "|");
}
