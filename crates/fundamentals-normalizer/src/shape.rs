//! Payload shape adapters.
//!
//! Upstream endpoints return the record either bare, as a one-element array,
//! or nested under a `data` wrapper (again bare or as an array). Each adapter
//! is a predicate plus an extractor; the first matching adapter wins, which
//! keeps provider-schema churn out of the field-extraction code.

use serde_json::Value;

type Predicate = fn(&Value) -> bool;
type Extractor = for<'a> fn(&'a Value) -> Option<&'a Value>;

pub struct ShapeAdapter {
    pub name: &'static str,
    matches: Predicate,
    extract: Extractor,
}

fn data_member(payload: &Value) -> Option<&Value> {
    payload.as_object().and_then(|obj| obj.get("data"))
}

const ADAPTERS: &[ShapeAdapter] = &[
    ShapeAdapter {
        name: "data-wrapped array",
        matches: |v| data_member(v).and_then(Value::as_array).is_some_and(|a| !a.is_empty()),
        extract: |v| data_member(v).and_then(Value::as_array).and_then(|a| a.first()),
    },
    ShapeAdapter {
        name: "data-wrapped object",
        matches: |v| data_member(v).is_some_and(Value::is_object),
        extract: data_member,
    },
    ShapeAdapter {
        name: "bare array",
        matches: |v| v.as_array().is_some_and(|a| !a.is_empty()),
        extract: |v| v.as_array().and_then(|a| a.first()),
    },
    ShapeAdapter {
        name: "bare object",
        // an object carrying a `data` key is a wrapper, not a record; an
        // empty or scalar `data` member means no record at all
        matches: |v| v.is_object() && data_member(v).is_none(),
        extract: |v| Some(v),
    },
];

/// Resolve a payload to its record object, whatever shape the provider
/// chose this week. `None` when nothing record-like is present (empty
/// array, scalar, null).
pub fn first_record(payload: &Value) -> Option<&Value> {
    let adapter = ADAPTERS.iter().find(|a| (a.matches)(payload))?;
    let record = (adapter.extract)(payload)?;
    record.is_object().then_some(record)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn unwraps_data_array() {
        let payload = json!({"data": [{"price": 150.0}, {"price": 1.0}]});
        let record = first_record(&payload).unwrap();
        assert_eq!(record["price"], 150.0);
    }

    #[test]
    fn unwraps_data_object() {
        let payload = json!({"data": {"price": 150.0}});
        assert_eq!(first_record(&payload).unwrap()["price"], 150.0);
    }

    #[test]
    fn unwraps_bare_array() {
        let payload = json!([{"symbol": "AAPL"}]);
        assert_eq!(first_record(&payload).unwrap()["symbol"], "AAPL");
    }

    #[test]
    fn passes_through_bare_object() {
        let payload = json!({"symbol": "AAPL", "price": 150.0});
        assert_eq!(first_record(&payload).unwrap()["symbol"], "AAPL");
    }

    #[test]
    fn rejects_empty_and_scalar_payloads() {
        assert!(first_record(&json!([])).is_none());
        assert!(first_record(&json!({"data": []})).is_none());
        assert!(first_record(&json!(42)).is_none());
        assert!(first_record(&json!(null)).is_none());
        // array of scalars is not a record
        assert!(first_record(&json!([1, 2, 3])).is_none());
    }
}
