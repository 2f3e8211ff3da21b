use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

/// Declares a SQL keyword enum that parses case-insensitively and
/// serializes back to its canonical SQL spelling.
macro_rules! sql_keyword {
    (
        $(#[$meta:meta])*
        $name:ident, $kind:literal, default = $default:ident,
        { $($variant:ident => $sql:literal $(| $alias:literal)*),+ $(,)? }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum $name {
            $($variant),+
        }

        impl $name {
            pub fn as_sql(&self) -> &'static str {
                match self {
                    $($name::$variant => $sql),+
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                $name::$default
            }
        }

        impl FromStr for $name {
            type Err = String;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                let token = s.trim();
                $(
                    if token.eq_ignore_ascii_case($sql) $(|| token.eq_ignore_ascii_case($alias))* {
                        return Ok($name::$variant);
                    }
                )+
                Err(format!("unsupported {}: {}", $kind, token))
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_sql())
            }
        }

        impl Serialize for $name {
            fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
                serializer.serialize_str(self.as_sql())
            }
        }

        impl<'de> Deserialize<'de> for $name {
            fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
                let raw = String::deserialize(deserializer)?;
                raw.parse().map_err(serde::de::Error::custom)
            }
        }
    };
}

sql_keyword! {
    /// Comparison operator of a WHERE condition.
    Operator, "operator", default = Eq,
    {
        Eq => "=",
        Ne => "!=" | "<>",
        Gt => ">",
        Lt => "<",
        Gte => ">=",
        Lte => "<=",
        Like => "LIKE",
        In => "IN",
        Between => "BETWEEN",
    }
}

sql_keyword! {
    AggregateFunction, "aggregate function", default = Count,
    {
        Count => "COUNT",
        Sum => "SUM",
        Avg => "AVG",
        Max => "MAX",
        Min => "MIN",
    }
}

sql_keyword! {
    JoinType, "join type", default = Inner,
    {
        Inner => "INNER",
        Left => "LEFT",
        Right => "RIGHT",
        Full => "FULL",
    }
}

sql_keyword! {
    SortDirection, "sort direction", default = Asc,
    {
        Asc => "ASC",
        Desc => "DESC",
    }
}

/// Treats an explicit JSON `null` the same as a missing key.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Structured query intent produced from a chat turn.
///
/// `tables[0]` is the FROM anchor whenever `joins` is non-empty. The
/// `aggregations` list is descriptive only: aggregate expressions reach
/// the SELECT list through `columns`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SemanticQuery {
    #[serde(default, deserialize_with = "null_as_default")]
    pub tables: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub columns: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub conditions: Vec<Condition>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub aggregations: Vec<Aggregation>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub joins: Vec<Join>,
    #[serde(default, alias = "orderBy", deserialize_with = "null_as_default")]
    pub order_by: Vec<OrderBy>,
    #[serde(default, alias = "groupBy", deserialize_with = "null_as_default")]
    pub group_by: Vec<String>,
    #[serde(default)]
    pub limit: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    pub column: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub operator: Operator,
    /// Scalar, or a sequence for `IN` / `BETWEEN`. Absent means the
    /// condition is dropped at compile time.
    #[serde(default)]
    pub value: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub table: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregation {
    pub function: AggregateFunction,
    #[serde(default)]
    pub column: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub alias: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Join {
    #[serde(rename = "type", default, deserialize_with = "null_as_default")]
    pub join_type: JoinType,
    pub table1: String,
    pub table2: String,
    pub condition: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub column: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub direction: SortDirection,
}
