//! The compiled mapping: target table name → table definition

use std::fmt;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use super::TableDefinition;

/// All tables of a flow, in worksheet order.
///
/// Serializes as a JSON object keyed by `target_table`; key order follows the
/// order tables were added.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MappingDocument {
    tables: Vec<TableDefinition>,
}

impl MappingDocument {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, table: TableDefinition) {
        self.tables.push(table);
    }

    pub fn get(&self, target_table: &str) -> Option<&TableDefinition> {
        self.tables.iter().find(|t| t.target_table == target_table)
    }

    pub fn tables(&self) -> &[TableDefinition] {
        &self.tables
    }

    pub fn iter(&self) -> std::slice::Iter<'_, TableDefinition> {
        self.tables.iter()
    }

    /// Target table names in document order
    pub fn table_names(&self) -> Vec<&str> {
        self.tables.iter().map(|t| t.target_table.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl<'a> IntoIterator for &'a MappingDocument {
    type Item = &'a TableDefinition;
    type IntoIter = std::slice::Iter<'a, TableDefinition>;

    fn into_iter(self) -> Self::IntoIter {
        self.tables.iter()
    }
}

impl Serialize for MappingDocument {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.tables.len()))?;
        for table in &self.tables {
            map.serialize_entry(&table.target_table, table)?;
        }
        map.end()
    }
}

struct MappingVisitor;

impl<'de> Visitor<'de> for MappingVisitor {
    type Value = MappingDocument;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str("a map of target table names to table definitions")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut mapping = MappingDocument::new();
        while let Some((name, mut table)) = access.next_entry::<String, TableDefinition>()? {
            // The key is authoritative for the table name
            table.target_table = name;
            mapping.push(table);
        }
        Ok(mapping)
    }
}

impl<'de> Deserialize<'de> for MappingDocument {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(MappingVisitor)
    }
}
