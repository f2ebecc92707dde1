//! Collection queries: array-containment filters, ordering, limit

use crate::path::CollectionPath;
use crate::schema::{lookup, Fields};
use crate::snapshot::DocumentSnapshot;
use serde_json::Value;
use std::cmp::Ordering;

#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    /// Matches documents whose array `field` contains `value` as an element
    ArrayContains { field: String, value: Value },
}

impl Filter {
    pub fn matches(&self, fields: &Fields) -> bool {
        match self {
            Filter::ArrayContains { field, value } => lookup(fields, field)
                .and_then(Value::as_array)
                .map(|items| items.contains(value))
                .unwrap_or(false),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Ascending,
    Descending,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OrderBy {
    pub field: String,
    pub direction: Direction,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    pub collection: CollectionPath,
    pub filters: Vec<Filter>,
    pub order_by: Vec<OrderBy>,
    pub limit: Option<usize>,
}

impl Query {
    pub fn new(collection: CollectionPath) -> Self {
        Self {
            collection,
            filters: Vec::new(),
            order_by: Vec::new(),
            limit: None,
        }
    }

    pub fn where_array_contains(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.filters.push(Filter::ArrayContains {
            field: field.to_string(),
            value: value.into(),
        });
        self
    }

    pub fn order_by(mut self, field: &str, direction: Direction) -> Self {
        self.order_by.push(OrderBy {
            field: field.to_string(),
            direction,
        });
        self
    }

    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Filter membership. Documents missing an `order_by` field never match.
    pub fn matches(&self, doc: &DocumentSnapshot) -> bool {
        self.collection.contains(&doc.path)
            && self.filters.iter().all(|f| f.matches(&doc.fields))
            && self
                .order_by
                .iter()
                .all(|o| lookup(&doc.fields, &o.field).is_some())
    }

    /// Filter, sort and truncate a candidate set
    pub fn apply<I>(&self, candidates: I) -> Vec<DocumentSnapshot>
    where
        I: IntoIterator<Item = DocumentSnapshot>,
    {
        let mut docs: Vec<DocumentSnapshot> =
            candidates.into_iter().filter(|d| self.matches(d)).collect();
        docs.sort_by(|a, b| self.compare(a, b));
        if let Some(limit) = self.limit {
            docs.truncate(limit);
        }
        docs
    }

    fn compare(&self, a: &DocumentSnapshot, b: &DocumentSnapshot) -> Ordering {
        for order in &self.order_by {
            let left = lookup(&a.fields, &order.field).unwrap_or(&Value::Null);
            let right = lookup(&b.fields, &order.field).unwrap_or(&Value::Null);
            let ord = compare_values(left, right);
            let ord = match order.direction {
                Direction::Ascending => ord,
                Direction::Descending => ord.reverse(),
            };
            if ord != Ordering::Equal {
                return ord;
            }
        }
        // Ties break on document path so snapshots are deterministic
        a.path.cmp(&b.path)
    }
}

fn type_rank(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Bool(_) => 1,
        Value::Number(_) => 2,
        Value::String(_) => 3,
        Value::Array(_) => 4,
        Value::Object(_) => 5,
    }
}

/// Total order over JSON values: null < bool < number < string < array < object
pub fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => match (x.as_i64(), y.as_i64()) {
            (Some(x), Some(y)) => x.cmp(&y),
            _ => {
                let x = x.as_f64().unwrap_or(0.0);
                let y = y.as_f64().unwrap_or(0.0);
                x.partial_cmp(&y).unwrap_or(Ordering::Equal)
            }
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        (Value::Array(x), Value::Array(y)) => {
            for (l, r) in x.iter().zip(y.iter()) {
                let ord = compare_values(l, r);
                if ord != Ordering::Equal {
                    return ord;
                }
            }
            x.len().cmp(&y.len())
        }
        _ => type_rank(a).cmp(&type_rank(b)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use serde_json::json;

    fn doc(id: &str, value: Value) -> DocumentSnapshot {
        let now = Utc::now();
        DocumentSnapshot {
            path: CollectionPath::root("posts").doc(id),
            fields: value.as_object().cloned().unwrap(),
            create_time: now,
            update_time: now,
        }
    }

    #[test]
    fn test_order_desc_with_limit() {
        let query = Query::new(CollectionPath::root("posts"))
            .order_by("createdAt", Direction::Descending)
            .limit(2);
        let result = query.apply(vec![
            doc("a", json!({"createdAt": 1})),
            doc("b", json!({"createdAt": 3})),
            doc("c", json!({"createdAt": 2})),
        ]);
        let ids: Vec<&str> = result.iter().map(|d| d.id()).collect();
        assert_eq!(ids, vec!["b", "c"]);
    }

    #[test]
    fn test_missing_order_field_excluded() {
        let query = Query::new(CollectionPath::root("posts"))
            .order_by("createdAt", Direction::Ascending);
        let result = query.apply(vec![doc("a", json!({})), doc("b", json!({"createdAt": 1}))]);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].id(), "b");
    }

    #[test]
    fn test_array_contains_is_exact_element_match() {
        let query = Query::new(CollectionPath::root("posts"))
            .where_array_contains("keywords", "ana");
        let matching = doc("a", json!({"keywords": ["ana", "lee"]}));
        let partial = doc("b", json!({"keywords": ["anabel"]}));
        let not_array = doc("c", json!({"keywords": "ana"}));
        assert!(query.matches(&matching));
        assert!(!query.matches(&partial));
        assert!(!query.matches(&not_array));
    }

    #[test]
    fn test_other_collection_never_matches() {
        let query = Query::new(CollectionPath::root("users"));
        assert!(!query.matches(&doc("a", json!({}))));
    }

    #[test]
    fn test_compare_values_across_types() {
        assert_eq!(compare_values(&json!(null), &json!(false)), Ordering::Less);
        assert_eq!(compare_values(&json!(10), &json!("1")), Ordering::Less);
        assert_eq!(compare_values(&json!(2.5), &json!(2)), Ordering::Greater);
        assert_eq!(compare_values(&json!([1, 2]), &json!([1])), Ordering::Greater);
    }
}
