use crate::domain::model::Table;
use serde_json::{Map, Value};

/// 把記錄清單攤平成表格
///
/// 欄位集合是所有記錄鍵名的聯集，依首次出現順序排列；
/// 缺少某欄位的記錄以 `Value::Null` 補齊。非物件記錄放進 `value` 欄。
pub fn flatten(records: &[Value]) -> Table {
    let mut columns: Vec<String> = Vec::new();
    let mut rows: Vec<Map<String, Value>> = Vec::new();

    for record in records {
        let mut row = Map::new();
        match record {
            Value::Object(fields) => {
                for (name, value) in fields {
                    let column = canonical_column_name(name);
                    if !columns.contains(&column) {
                        columns.push(column.clone());
                    }
                    // 正規化後同名的欄位：後定義者覆蓋前者
                    row.insert(column, value.clone());
                }
            }
            scalar => {
                let column = "value".to_string();
                if !columns.contains(&column) {
                    columns.push(column.clone());
                }
                row.insert(column, scalar.clone());
            }
        }
        rows.push(row);
    }

    for row in &mut rows {
        for column in &columns {
            if !row.contains_key(column) {
                row.insert(column.clone(), Value::Null);
            }
        }
    }

    Table { columns, rows }
}

/// 欄位名正規化：轉小寫、去掉特殊字元、空白改為底線
pub(crate) fn canonical_column_name(name: &str) -> String {
    let kept: String = name
        .to_lowercase()
        .chars()
        .filter(|c| c.is_alphanumeric() || *c == '_' || c.is_whitespace())
        .collect();
    kept.split_whitespace().collect::<Vec<_>>().join("_")
}
