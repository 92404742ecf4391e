use serde::Serialize;
use serde_json::{Map, Value};

/// 正規化成功時的中繼資料
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NormalizeMeta {
    pub count: usize,
    pub root_key: Option<String>,
    pub source_shape: String,
}

/// Shape Normalizer 的輸出：錯誤以資料形式回傳，不走 Err
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum Normalized {
    Records {
        records: Vec<Value>,
        meta: NormalizeMeta,
    },
    Failed {
        error: String,
        original: String,
    },
}

/// 單一來源攤平後的表格
///
/// `columns` 依首次出現順序排列；每一列都覆蓋完整欄位集，
/// 缺值以 `Value::Null` 表示，不會省略。
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Table {
    pub columns: Vec<String>,
    pub rows: Vec<Map<String, Value>>,
}

impl Table {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// 多來源合併後的彙總表格，額外帶 `source` 欄位標記每列的來源 URL
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct AggregateTable {
    pub columns: Vec<String>,
    pub rows: Vec<Map<String, Value>>,
}

impl AggregateTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}
