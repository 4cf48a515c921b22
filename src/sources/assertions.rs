//! Data-quality assertions attached to source documents

use crate::model::{ColumnDefinition, TableDefinition};

use super::document::{ColumnTest, CompoundUnique, TableTest};
use super::SourceKind;

/// `year='{{ var('year') }}' and month='{{ var('month') }}'`; `None` without partitions.
pub fn partition_predicate(partitions: &[String]) -> Option<String> {
    if partitions.is_empty() {
        return None;
    }
    Some(
        partitions
            .iter()
            .map(|p| format!("{p}='{{{{ var('{p}') }}}}'"))
            .collect::<Vec<_>>()
            .join(" and "),
    )
}

/// More than one key column: uniqueness is asserted on the combination.
pub fn has_compound_key(table: &TableDefinition) -> bool {
    table.key_columns().len() > 1
}

/// Assertions of one column, uniqueness first.
pub fn column_tests(
    column: &ColumnDefinition,
    table: &TableDefinition,
    kind: SourceKind,
) -> Vec<ColumnTest> {
    let predicate = partition_predicate(&table.partitions);
    let mut tests = Vec::new();

    if kind == SourceKind::Datalake && column.is_key && !has_compound_key(table) {
        tests.push(ColumnTest::unique_where(predicate.clone()));
    }
    if !column.is_nullable && !column.is_partition {
        tests.push(ColumnTest::not_null(predicate));
    }
    tests
}

/// Table-level assertions (datalake compound keys).
pub fn table_tests(table: &TableDefinition, kind: SourceKind) -> Vec<TableTest> {
    if kind != SourceKind::Datalake || !has_compound_key(table) {
        return Vec::new();
    }
    vec![TableTest {
        unique_columns_where: CompoundUnique {
            combination_of_columns: table
                .key_columns()
                .into_iter()
                .map(str::to_string)
                .collect(),
            condition: partition_predicate(&table.partitions),
        },
    }]
}
