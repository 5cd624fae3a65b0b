//! Fallback-chain table, one entry per logical field.

use serde_json::Value;

use super::RawRecord;

/// Ordered raw field names that may carry one logical field.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldChain {
    /// Logical field name, for diagnostics.
    pub field: &'static str,
    /// Raw keys, most preferred first.
    pub keys: &'static [&'static str],
}

impl FieldChain {
    /// First present, non-null value along the chain.
    pub fn lookup<'a>(&self, record: &'a RawRecord) -> Option<&'a Value> {
        self.keys
            .iter()
            .find_map(|key| record.get(*key).filter(|value| !value.is_null()))
    }

    /// Raw key that supplied the value, if any.
    pub fn source_key(&self, record: &RawRecord) -> Option<&'static str> {
        self.keys
            .iter()
            .copied()
            .find(|key| record.get(*key).is_some_and(|value| !value.is_null()))
    }
}

pub const ID_FIELDS: FieldChain = FieldChain {
    field: "id",
    keys: &["id", "externalId", "nomNumber", "nomenclatureId", "key"],
};

pub const NAME_FIELDS: FieldChain = FieldChain {
    field: "name",
    keys: &["name", "title", "caption"],
};

pub const PRICE_FIELDS: FieldChain = FieldChain {
    field: "price",
    keys: &["cost", "price", "priceWithDiscount", "amount"],
};

pub const HIERARCHY_FIELDS: FieldChain = FieldChain {
    field: "hierarchy",
    keys: &["hierarchicalId", "hierarchyId", "hid", "path"],
};

pub const PARENT_HIERARCHY_FIELDS: FieldChain = FieldChain {
    field: "parent_hierarchy",
    keys: &["hierarchicalParent", "hierarchyParent"],
};

pub const ORDER_INDEX_FIELDS: FieldChain = FieldChain {
    field: "order_index",
    keys: &["indexNumber"],
};

/// Every key here is checked; any truthy one marks a folder.
pub const FOLDER_FLAG_FIELDS: FieldChain = FieldChain {
    field: "folder_flag",
    keys: &[
        "isParent",
        "isGroup",
        "isFolder",
        "isCategory",
        "hasChildren",
        "group",
        "folder",
    ],
};

pub const CHILD_COUNT_FIELDS: FieldChain = FieldChain {
    field: "child_count",
    keys: &["childrenCount"],
};

pub const TYPE_FIELDS: FieldChain = FieldChain {
    field: "type",
    keys: &["type", "nomenclatureType"],
};

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_source_key_reports_winning_field() {
        let record = match json!({"nomNumber": "A1", "key": "B2"}) {
            Value::Object(map) => map,
            _ => unreachable!(),
        };
        assert_eq!(ID_FIELDS.source_key(&record), Some("nomNumber"));
        assert_eq!(
            ID_FIELDS.lookup(&record).and_then(Value::as_str),
            Some("A1")
        );
        assert_eq!(NAME_FIELDS.source_key(&record), None);
    }
}
