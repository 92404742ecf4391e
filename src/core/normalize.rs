use crate::domain::model::{NormalizeMeta, Normalized};
use regex::Regex;
use serde_json::{Map, Value};

const PARSE_ERROR: &str = "could not extract structured data";
const PREVIEW_LIMIT: usize = 200;

/// 依序嘗試的字串解析策略，第一個成功者勝出
const STRATEGIES: &[fn(&str) -> Option<Value>] = &[
    parse_whole,
    parse_unfenced,
    parse_embedded_object,
    parse_embedded_array,
];

/// 從任意抽取結果還原記錄清單
///
/// 物件與陣列直接分類；字串依 `STRATEGIES` 還原；其餘輸入視為失敗，
/// 以 `Normalized::Failed` 回傳（含截斷後的原文預覽），不會回傳 Err。
pub fn normalize(raw: &Value) -> Normalized {
    let recovered = match raw {
        Value::Object(_) | Value::Array(_) => Some(raw.clone()),
        Value::String(text) => STRATEGIES.iter().find_map(|strategy| strategy(text)),
        _ => None,
    };

    let Some(value) = recovered else {
        return Normalized::Failed {
            error: PARSE_ERROR.to_string(),
            original: preview(raw),
        };
    };

    let source_shape = shape_name(&value).to_string();
    let (records, root_key) = match classify(value) {
        Shape::WrappedList { key, items } => (items, Some(key)),
        Shape::Object(map) => (vec![Value::Object(map)], None),
        Shape::List(items) => (items, None),
        Shape::Scalar(scalar) => (vec![scalar], None),
    };

    Normalized::Records {
        meta: NormalizeMeta {
            count: records.len(),
            root_key,
            source_shape,
        },
        records,
    }
}

/// 還原後結構的封閉分類
enum Shape {
    /// 單一根鍵包著陣列，例如 `{"results": [...]}`
    WrappedList { key: String, items: Vec<Value> },
    Object(Map<String, Value>),
    List(Vec<Value>),
    Scalar(Value),
}

fn classify(value: Value) -> Shape {
    match value {
        Value::Object(map) => match unwrap_single_list(map) {
            Ok((key, items)) => Shape::WrappedList { key, items },
            Err(map) => Shape::Object(map),
        },
        Value::Array(items) => Shape::List(items),
        scalar => Shape::Scalar(scalar),
    }
}

fn unwrap_single_list(
    map: Map<String, Value>,
) -> std::result::Result<(String, Vec<Value>), Map<String, Value>> {
    if map.len() != 1 {
        return Err(map);
    }
    match map.into_iter().next() {
        Some((key, Value::Array(items))) => Ok((key, items)),
        Some((key, other)) => {
            let mut map = Map::new();
            map.insert(key, other);
            Err(map)
        }
        None => Err(Map::new()),
    }
}

fn parse_whole(text: &str) -> Option<Value> {
    serde_json::from_str(text).ok()
}

fn parse_unfenced(text: &str) -> Option<Value> {
    let fence = Regex::new(r"```(?:json)?").unwrap();
    let stripped = fence.replace_all(text, "");
    let stripped = stripped.trim();
    if stripped == text {
        return None;
    }
    serde_json::from_str(stripped).ok()
}

fn parse_embedded_object(text: &str) -> Option<Value> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

fn parse_embedded_array(text: &str) -> Option<Value> {
    let start = text.find('[')?;
    let end = text.rfind(']')?;
    if end < start {
        return None;
    }
    serde_json::from_str(&text[start..=end]).ok()
}

fn preview(raw: &Value) -> String {
    let text = match raw {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    };
    if text.chars().count() > PREVIEW_LIMIT {
        let truncated: String = text.chars().take(PREVIEW_LIMIT).collect();
        format!("{}...", truncated)
    } else {
        text
    }
}

fn shape_name(value: &Value) -> &'static str {
    match value {
        Value::Object(_) => "object",
        Value::Array(_) => "array",
        Value::String(_) => "string",
        Value::Number(_) => "number",
        Value::Bool(_) => "boolean",
        Value::Null => "null",
    }
}
