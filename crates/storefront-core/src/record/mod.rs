//! Raw catalog records
//!
//! Catalog APIs return records whose field names drift between endpoints and
//! versions. Every logical field is read through an ordered [`FieldChain`]: the
//! first present, non-null raw field wins, the same way a null-coalescing chain
//! behaves. A present value that cannot be coerced does not fall through to the
//! next field.

mod fields;

pub use fields::{
    FieldChain, CHILD_COUNT_FIELDS, FOLDER_FLAG_FIELDS, HIERARCHY_FIELDS, ID_FIELDS, NAME_FIELDS,
    ORDER_INDEX_FIELDS, PARENT_HIERARCHY_FIELDS, PRICE_FIELDS, TYPE_FIELDS,
};

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// One record exactly as the catalog source returned it.
pub type RawRecord = Map<String, Value>;

/// Display name for records that carry none.
pub const DEFAULT_NODE_NAME: &str = "Untitled";

/// Envelope keys that may wrap the record list in an API response.
pub const ENVELOPE_KEYS: [&str; 4] = ["nomenclatures", "records", "result", "items"];

const FOLDER_TYPE_MARKERS: [&str; 3] = ["group", "folder", "category"];

/// Canonical shape of one raw record.
///
/// Ids are resolved later by the tree builder, because a folder without an id
/// borrows its normalized path.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    /// Index of the record in the fetched list.
    pub position: usize,
    pub id: Option<String>,
    pub name: String,
    pub price: Option<f64>,
    /// Raw hierarchy token, before segmentation.
    pub hierarchy: Option<String>,
    /// Raw hierarchy token of the parent folder.
    pub parent_hierarchy: Option<String>,
    /// Explicit order index, when the record carries one. Fractions are kept.
    pub order_index: Option<f64>,
    pub is_folder: bool,
}

impl NormalizedRecord {
    /// Order key used by the sort index: explicit index, else record position.
    pub fn effective_order(&self) -> f64 {
        self.order_index.unwrap_or(self.position as f64)
    }
}

/// Normalize one raw record.
pub fn normalize(record: &RawRecord, position: usize) -> NormalizedRecord {
    let price = PRICE_FIELDS.lookup(record).and_then(as_number);
    NormalizedRecord {
        position,
        id: ID_FIELDS.lookup(record).and_then(as_text),
        name: NAME_FIELDS
            .lookup(record)
            .and_then(as_text)
            .unwrap_or_else(|| DEFAULT_NODE_NAME.to_string()),
        price,
        hierarchy: HIERARCHY_FIELDS.lookup(record).and_then(as_text),
        parent_hierarchy: PARENT_HIERARCHY_FIELDS.lookup(record).and_then(as_text),
        order_index: ORDER_INDEX_FIELDS.lookup(record).and_then(as_number),
        is_folder: has_folder_hint(record) || price.is_none(),
    }
}

/// Whether the record explicitly says it is a folder.
///
/// Absence of a price also classifies a record as a folder, but that rule lives
/// in [`normalize`] so raw statistics can count explicit hints on their own.
pub fn has_folder_hint(record: &RawRecord) -> bool {
    let flagged = FOLDER_FLAG_FIELDS
        .keys
        .iter()
        .any(|key| record.get(*key).is_some_and(is_truthy));
    let has_children = CHILD_COUNT_FIELDS
        .lookup(record)
        .and_then(as_number)
        .is_some_and(|count| count > 0.0);
    let typed = TYPE_FIELDS
        .lookup(record)
        .and_then(Value::as_str)
        .map(str::to_ascii_lowercase)
        .is_some_and(|kind| FOLDER_TYPE_MARKERS.iter().any(|m| kind.contains(m)));
    flagged || has_children || typed
}

/// Pull the record list out of a catalog API response.
///
/// Accepts a top-level array or the first array found under one of
/// [`ENVELOPE_KEYS`]. Non-object entries are skipped.
pub fn extract_records(response: Value) -> Vec<RawRecord> {
    let list = match response {
        Value::Array(list) => list,
        Value::Object(mut envelope) => ENVELOPE_KEYS
            .iter()
            .find_map(|key| match envelope.remove(*key) {
                Some(Value::Array(list)) => Some(list),
                _ => None,
            })
            .unwrap_or_default(),
        _ => Vec::new(),
    };
    list.into_iter()
        .filter_map(|value| match value {
            Value::Object(record) => Some(record),
            _ => None,
        })
        .collect()
}

pub(crate) fn as_text(value: &Value) -> Option<String> {
    let text = match value {
        Value::String(s) => s.trim().to_string(),
        Value::Number(n) => n.to_string(),
        _ => return None,
    };
    (!text.is_empty()).then_some(text)
}

pub(crate) fn as_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) if !s.trim().is_empty() => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    number.is_finite().then_some(number)
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(value: Value) -> RawRecord {
        match value {
            Value::Object(map) => map,
            _ => panic!("test record must be an object"),
        }
    }

    #[test]
    fn test_normalize_reads_first_present_field() {
        let raw = record(json!({
            "externalId": 77,
            "title": "Cola",
            "price": "120.50",
            "hid": 10203,
            "hierarchicalParent": "102",
            "indexNumber": "4"
        }));
        let normalized = normalize(&raw, 3);
        assert_eq!(normalized.id.as_deref(), Some("77"));
        assert_eq!(normalized.name, "Cola");
        assert_eq!(normalized.price, Some(120.5));
        assert_eq!(normalized.hierarchy.as_deref(), Some("10203"));
        assert_eq!(normalized.parent_hierarchy.as_deref(), Some("102"));
        assert_eq!(normalized.order_index, Some(4.0));
        assert_eq!(normalized.position, 3);
        assert!(!normalized.is_folder);
    }

    #[test]
    fn test_present_but_unusable_value_does_not_fall_through() {
        let raw = record(json!({"id": "1", "cost": "n/a", "price": 100}));
        let normalized = normalize(&raw, 0);
        assert_eq!(normalized.price, None);
        assert!(normalized.is_folder);
    }

    #[test]
    fn test_null_value_falls_through_to_next_field() {
        let raw = record(json!({"id": null, "key": "k-1", "cost": null, "amount": 5}));
        let normalized = normalize(&raw, 0);
        assert_eq!(normalized.id.as_deref(), Some("k-1"));
        assert_eq!(normalized.price, Some(5.0));
    }

    #[test]
    fn test_folder_hints() {
        let flagged = record(json!({"id": "1", "price": 10, "isGroup": true}));
        let counted = record(json!({"id": "2", "price": 10, "childrenCount": 3}));
        let typed = record(json!({"id": "3", "price": 10, "nomenclatureType": "Product_Category"}));
        let plain = record(json!({"id": "4", "price": 10, "isGroup": false, "childrenCount": 0}));
        assert!(normalize(&flagged, 0).is_folder);
        assert!(normalize(&counted, 0).is_folder);
        assert!(normalize(&typed, 0).is_folder);
        assert!(!normalize(&plain, 0).is_folder);
    }

    #[test]
    fn test_missing_name_uses_default() {
        let raw = record(json!({"id": "1", "name": "   "}));
        assert_eq!(normalize(&raw, 0).name, DEFAULT_NODE_NAME);
    }

    #[test]
    fn test_effective_order_falls_back_to_position() {
        let raw = record(json!({"id": "1"}));
        assert_eq!(normalize(&raw, 9).effective_order(), 9.0);
        let indexed = record(json!({"id": "1", "indexNumber": 2}));
        assert_eq!(normalize(&indexed, 9).effective_order(), 2.0);
    }

    #[test]
    fn test_fractional_order_index_is_kept() {
        let later = normalize(&record(json!({"id": "a", "indexNumber": 1.9})), 0);
        let earlier = normalize(&record(json!({"id": "b", "indexNumber": "1.2"})), 1);
        assert_eq!(later.order_index, Some(1.9));
        assert_eq!(earlier.order_index, Some(1.2));
        assert!(later.effective_order() > earlier.effective_order());
    }

    #[test]
    fn test_extract_records_unwraps_envelopes() {
        let wrapped = json!({"outcome": {"hasMore": false}, "nomenclatures": [{"id": 1}, 5, {"id": 2}]});
        assert_eq!(extract_records(wrapped).len(), 2);

        let bare = json!([{"id": 1}]);
        assert_eq!(extract_records(bare).len(), 1);

        let records_key = json!({"records": [{"id": 1}, {"id": 2}, {"id": 3}]});
        assert_eq!(extract_records(records_key).len(), 3);

        assert!(extract_records(json!({"error": "nope"})).is_empty());
        assert!(extract_records(json!("text")).is_empty());
    }
}
