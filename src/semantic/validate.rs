use serde_json::Value;

use super::error::SemanticError;
use super::types::{Operator, SemanticQuery};

/// Check the structural invariants the compiler relies on.
///
/// The compiler renders anything well-typed, so this is advisory: it
/// reports the first problem found and leaves the query untouched.
pub fn validate(query: &SemanticQuery) -> Result<(), SemanticError> {
    if query.tables.is_empty() {
        return Err(SemanticError::NoTables);
    }

    for condition in &query.conditions {
        let invalid = |reason: &str| SemanticError::InvalidCondition {
            column: condition.column.clone(),
            reason: reason.to_string(),
        };
        match (condition.operator, &condition.value) {
            (Operator::In, Some(Value::Array(items))) if items.is_empty() => {
                return Err(invalid("IN requires at least one value"));
            }
            (Operator::Between, Some(Value::Array(bounds))) if bounds.len() == 2 => {}
            (Operator::Between, Some(_)) => {
                return Err(invalid("BETWEEN requires exactly 2 values"));
            }
            _ => {}
        }
    }

    for aggregation in &query.aggregations {
        if aggregation.column.trim().is_empty() {
            return Err(SemanticError::InvalidAggregation(format!(
                "{} requires a column",
                aggregation.function
            )));
        }
    }

    Ok(())
}

/// Cap `limit` at `max_limit` when one is configured.
pub fn clamp_limit(query: &mut SemanticQuery, max_limit: Option<u64>) {
    if let (Some(limit), Some(max)) = (query.limit, max_limit) {
        if limit > max {
            tracing::warn!("Limit {} exceeds max {}, capping to max", limit, max);
            query.limit = Some(max);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn query(value: Value) -> SemanticQuery {
        serde_json::from_value(value).unwrap()
    }

    #[test]
    fn requires_tables() {
        assert!(matches!(validate(&SemanticQuery::default()), Err(SemanticError::NoTables)));
    }

    #[test]
    fn accepts_well_formed_query() {
        let q = query(json!({
            "tables": ["t"],
            "conditions": [
                { "column": "age", "operator": "BETWEEN", "value": [1, 2] },
                { "column": "city", "operator": "IN", "value": ["a"] }
            ],
            "aggregations": [{ "function": "count", "column": "*" }]
        }));
        assert!(validate(&q).is_ok());
    }

    #[test]
    fn rejects_bad_between_and_empty_in() {
        let between = query(json!({
            "tables": ["t"],
            "conditions": [{ "column": "age", "operator": "BETWEEN", "value": [1, 2, 3] }]
        }));
        assert!(matches!(validate(&between), Err(SemanticError::InvalidCondition { .. })));

        let scalar_between = query(json!({
            "tables": ["t"],
            "conditions": [{ "column": "age", "operator": "BETWEEN", "value": 4 }]
        }));
        assert!(validate(&scalar_between).is_err());

        let empty_in = query(json!({
            "tables": ["t"],
            "conditions": [{ "column": "city", "operator": "IN", "value": [] }]
        }));
        assert!(validate(&empty_in).is_err());
    }

    #[test]
    fn rejects_aggregation_without_column() {
        let q = query(json!({
            "tables": ["t"],
            "aggregations": [{ "function": "SUM", "column": " " }]
        }));
        assert!(matches!(validate(&q), Err(SemanticError::InvalidAggregation(_))));
    }

    #[test]
    fn clamps_limit() {
        let mut q = query(json!({ "tables": ["t"], "limit": 5000 }));
        clamp_limit(&mut q, Some(1000));
        assert_eq!(q.limit, Some(1000));

        clamp_limit(&mut q, None);
        assert_eq!(q.limit, Some(1000));
    }
}
