use crate::domain::model::{AggregateTable, Table};
use serde_json::Value;

pub const SOURCE_COLUMN: &str = "source";

/// 把多個來源的表格合併成一張彙總表
pub fn merge(tables: Vec<(Table, String)>) -> AggregateTable {
    let mut aggregate = AggregateTable::new();
    for (table, source_id) in tables {
        merge_into(&mut aggregate, table, &source_id);
    }
    aggregate
}

/// 把單一來源的表格併入彙總表
///
/// 欄位依首次出現順序聯集；新欄位回補 `Value::Null`；每一列
/// 以 `source` 欄標記來源。空表格不貢獻任何列。
pub fn merge_into(aggregate: &mut AggregateTable, table: Table, source_id: &str) {
    if table.is_empty() {
        return;
    }

    for column in &table.columns {
        if !aggregate.columns.contains(column) {
            aggregate.columns.push(column.clone());
        }
    }
    if !aggregate.columns.iter().any(|c| c == SOURCE_COLUMN) {
        aggregate.columns.push(SOURCE_COLUMN.to_string());
    }

    for mut row in table.rows {
        row.insert(
            SOURCE_COLUMN.to_string(),
            Value::String(source_id.to_string()),
        );
        aggregate.rows.push(row);
    }

    for row in &mut aggregate.rows {
        for column in &aggregate.columns {
            if !row.contains_key(column) {
                row.insert(column.clone(), Value::Null);
            }
        }
    }
}
