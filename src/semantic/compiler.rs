use serde_json::Value;

use super::error::SemanticError;
use super::types::{Condition, Operator, SemanticQuery};

/// Renders a [`SemanticQuery`] as a single SQL statement.
///
/// Clause order is fixed: SELECT, FROM, JOIN*, WHERE, GROUP BY,
/// ORDER BY, LIMIT. Output depends only on the input, so compiling the
/// same query twice gives identical text.
pub struct SqlCompiler;

impl SqlCompiler {
    /// Compile to SQL text. Never fails: a query that cannot be rendered
    /// becomes `SELECT 1; -- <reason>`.
    pub fn compile(query: &SemanticQuery) -> String {
        match Self::try_compile(query) {
            Ok(sql) => sql,
            Err(e) => {
                tracing::warn!("Semantic query not compiled, emitting placeholder: {}", e);
                Self::placeholder(&e.to_string())
            }
        }
    }

    pub fn try_compile(query: &SemanticQuery) -> Result<String, SemanticError> {
        let anchor = query.tables.first().ok_or(SemanticError::NoTables)?;

        let mut parts = vec![
            format!("SELECT {}", Self::build_select_clause(query)),
            format!("FROM {}", Self::build_from_clause(query, anchor)),
        ];
        parts.extend(Self::build_join_clauses(query, anchor));
        parts.push(Self::build_where_clause(&query.conditions));
        parts.push(Self::build_group_by_clause(query));
        parts.push(Self::build_order_by_clause(query));
        parts.push(Self::build_limit_clause(query));

        Ok(parts.into_iter().filter(|s| !s.is_empty()).collect::<Vec<_>>().join(" "))
    }

    pub fn placeholder(reason: &str) -> String {
        format!("SELECT 1; -- {}", reason)
    }

    fn build_select_clause(query: &SemanticQuery) -> String {
        if query.columns.is_empty() {
            "*".to_string()
        } else {
            query.columns.join(", ")
        }
    }

    fn build_from_clause(query: &SemanticQuery, anchor: &str) -> String {
        // With joins, every other table must arrive through a JOIN clause.
        if query.joins.is_empty() {
            query.tables.join(", ")
        } else {
            anchor.to_string()
        }
    }

    /// Picks the side of each join that is not the anchor. Chains where
    /// neither side is the anchor always join `table1`.
    fn build_join_clauses(query: &SemanticQuery, anchor: &str) -> Vec<String> {
        query
            .joins
            .iter()
            .map(|join| {
                let joined = if join.table1 == anchor { &join.table2 } else { &join.table1 };
                format!("{} JOIN {} ON {}", join.join_type.as_sql(), joined, join.condition)
            })
            .collect()
    }

    fn build_where_clause(conditions: &[Condition]) -> String {
        let rendered: Vec<String> = conditions.iter().filter_map(Self::build_condition).collect();
        if rendered.is_empty() {
            String::new()
        } else {
            format!("WHERE {}", rendered.join(" AND "))
        }
    }

    fn build_condition(condition: &Condition) -> Option<String> {
        let value = condition.value.as_ref()?;
        let rendered = match condition.operator {
            Operator::In => match value {
                Value::Array(items) => {
                    format!("({})", items.iter().map(Self::quote).collect::<Vec<_>>().join(", "))
                }
                scalar => format!("({})", Self::quote(scalar)),
            },
            Operator::Between => match value {
                Value::Array(bounds) if bounds.len() == 2 => {
                    format!("{} AND {}", Self::quote(&bounds[0]), Self::quote(&bounds[1]))
                }
                // Wrong arity yields no usable bound; the value is rendered as-is.
                other => Self::quote(other),
            },
            _ => Self::quote(value),
        };
        Some(format!("{} {} {}", condition.column, condition.operator.as_sql(), rendered))
    }

    fn build_group_by_clause(query: &SemanticQuery) -> String {
        if query.group_by.is_empty() {
            String::new()
        } else {
            format!("GROUP BY {}", query.group_by.join(", "))
        }
    }

    fn build_order_by_clause(query: &SemanticQuery) -> String {
        if query.order_by.is_empty() {
            return String::new();
        }
        let items: Vec<String> = query
            .order_by
            .iter()
            .map(|o| format!("{} {}", o.column, o.direction.as_sql()))
            .collect();
        format!("ORDER BY {}", items.join(", "))
    }

    fn build_limit_clause(query: &SemanticQuery) -> String {
        match query.limit {
            Some(limit) => format!("LIMIT {}", limit),
            None => String::new(),
        }
    }

    /// Strings become single-quoted literals with embedded quotes doubled;
    /// everything else renders in its JSON text form.
    fn quote(value: &Value) -> String {
        match value {
            Value::String(s) => format!("'{}'", s.replace('\'', "''")),
            other => other.to_string(),
        }
    }
}
