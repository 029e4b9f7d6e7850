//! Compiles nested filter groups into a parameterized predicate.
//!
//! ```text
//! compile(group)
//!   └─ compile_group(group, depth = 0)
//!        ├─ depth > max_depth            → FilterTooDeep
//!        ├─ conditions > max_conditions  → TooManyConditions
//!        ├─ no conditions                → "" (caller omits WHERE)
//!        └─ each entry
//!             ├─ group → compile_group(depth + 1), wrapped in (...)
//!             └─ leaf  → compile_condition
//!                          ├─ column:   whitelist + allow-list
//!                          ├─ operator: closed set
//!                          └─ value:    operator-specific shape check
//! ```
//!
//! Siblings are joined with the group's combinator. Nested groups are always
//! parenthesized so mixing AND and OR never depends on SQL precedence.

use crate::ast::{FilterCondition, FilterGroup, FilterNode};
use crate::config::CompilerConfig;
use crate::error::QueryError;
use crate::fragment::Fragment;
use crate::identifier;
use crate::schema::ColumnUniverse;
use sea_query::Value;
use serde_json::Value as JsonValue;
use std::fmt;
use std::str::FromStr;

/// The closed set of filter operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operator {
    Eq,        // =
    NotEq,     // !=
    Gt,        // >
    Lt,        // <
    Gte,       // >=
    Lte,       // <=
    Like,      // LIKE
    NotLike,   // NOT LIKE
    In,        // IN
    NotIn,     // NOT IN
    IsNull,    // IS NULL
    IsNotNull, // IS NOT NULL
    Between,   // BETWEEN
}

impl Operator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Operator::Eq => "=",
            Operator::NotEq => "!=",
            Operator::Gt => ">",
            Operator::Lt => "<",
            Operator::Gte => ">=",
            Operator::Lte => "<=",
            Operator::Like => "LIKE",
            Operator::NotLike => "NOT LIKE",
            Operator::In => "IN",
            Operator::NotIn => "NOT IN",
            Operator::IsNull => "IS NULL",
            Operator::IsNotNull => "IS NOT NULL",
            Operator::Between => "BETWEEN",
        }
    }
}

impl FromStr for Operator {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let op = match s {
            "=" => Operator::Eq,
            "!=" => Operator::NotEq,
            ">" => Operator::Gt,
            "<" => Operator::Lt,
            ">=" => Operator::Gte,
            "<=" => Operator::Lte,
            "LIKE" => Operator::Like,
            "NOT LIKE" => Operator::NotLike,
            "IN" => Operator::In,
            "NOT IN" => Operator::NotIn,
            "IS NULL" => Operator::IsNull,
            "IS NOT NULL" => Operator::IsNotNull,
            "BETWEEN" => Operator::Between,
            _ => {
                return Err(QueryError::InvalidOperator {
                    operator: s.to_string(),
                })
            }
        };
        Ok(op)
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_sql())
    }
}

/// Output of a filter compile. `predicate` is empty when there is nothing to
/// filter on.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct CompiledFilter {
    pub predicate: String,
    pub params: Vec<Value>,
}

impl CompiledFilter {
    pub fn is_empty(&self) -> bool {
        self.predicate.is_empty()
    }
}

impl From<Fragment> for CompiledFilter {
    fn from(fragment: Fragment) -> Self {
        let (predicate, params) = fragment.into_parts();
        Self { predicate, params }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct FilterCompiler {
    max_depth: usize,
    max_conditions: usize,
}

impl Default for FilterCompiler {
    fn default() -> Self {
        Self::from_config(&CompilerConfig::default())
    }
}

impl FilterCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: &CompilerConfig) -> Self {
        Self {
            max_depth: config.max_filter_depth,
            max_conditions: config.max_group_conditions,
        }
    }

    pub fn compile(
        &self,
        group: &FilterGroup,
        available: &ColumnUniverse,
    ) -> Result<CompiledFilter, QueryError> {
        self.compile_group(group, available, 0).map(CompiledFilter::from)
    }

    fn compile_group(
        &self,
        group: &FilterGroup,
        available: &ColumnUniverse,
        depth: usize,
    ) -> Result<Fragment, QueryError> {
        if depth > self.max_depth {
            return Err(QueryError::FilterTooDeep {
                depth,
                max: self.max_depth,
            });
        }
        if group.conditions.len() > self.max_conditions {
            return Err(QueryError::TooManyConditions {
                count: group.conditions.len(),
                max: self.max_conditions,
            });
        }

        let mut parts = Vec::with_capacity(group.conditions.len());
        for node in &group.conditions {
            let part = match node {
                FilterNode::Group(nested) => self
                    .compile_group(nested, available, depth + 1)?
                    .parenthesized(),
                FilterNode::Condition(condition) => compile_condition(condition, available)?,
            };
            parts.push(part);
        }

        let separator = format!(" {} ", group.combinator.as_sql());
        Ok(Fragment::join(parts, &separator))
    }
}

/// Compiles `group` with the default depth and size limits.
pub fn compile_filters(
    group: &FilterGroup,
    available: &ColumnUniverse,
) -> Result<CompiledFilter, QueryError> {
    FilterCompiler::default().compile(group, available)
}

fn compile_condition(
    condition: &FilterCondition,
    available: &ColumnUniverse,
) -> Result<Fragment, QueryError> {
    identifier::check(&condition.column)?;
    identifier::validate_column(&condition.column, available)?;
    let column = identifier::sanitize(available.resolve(&condition.column))?;
    let operator: Operator = condition.operator.parse()?;
    let head = Fragment::raw(format!("{} {}", column, operator.as_sql()));

    let wrong_type = |found: &JsonValue| QueryError::WrongValueType {
        column: condition.column.clone(),
        operator: operator.to_string(),
        found: describe(found).to_string(),
    };

    let fragment = match operator {
        Operator::IsNull | Operator::IsNotNull => head,
        Operator::In | Operator::NotIn => {
            let items = condition
                .value
                .as_array()
                .ok_or_else(|| wrong_type(&condition.value))?;
            if items.is_empty() {
                return Err(QueryError::EmptyInList {
                    column: condition.column.clone(),
                    operator: operator.to_string(),
                });
            }
            let values = items
                .iter()
                .map(|item| to_param(item).ok_or_else(|| wrong_type(item)))
                .collect::<Result<Vec<_>, _>>()?;
            head.then(Fragment::param_list(values).parenthesized())
        }
        Operator::Between => {
            let bounds = match condition.value.as_array() {
                Some(items) if items.len() == 2 => items,
                other => {
                    return Err(QueryError::WrongArity {
                        column: condition.column.clone(),
                        found: other.map_or_else(|| usize::from(!condition.value.is_null()), Vec::len),
                    })
                }
            };
            let low = to_param(&bounds[0]).ok_or_else(|| wrong_type(&bounds[0]))?;
            let high = to_param(&bounds[1]).ok_or_else(|| wrong_type(&bounds[1]))?;
            head.then(Fragment::param(low))
                .then(Fragment::raw("AND"))
                .then(Fragment::param(high))
        }
        Operator::Like | Operator::NotLike => match &condition.value {
            JsonValue::String(pattern) => head.then(Fragment::param(Value::from(pattern.as_str()))),
            other => return Err(wrong_type(other)),
        },
        Operator::Eq
        | Operator::NotEq
        | Operator::Gt
        | Operator::Lt
        | Operator::Gte
        | Operator::Lte => {
            let value = to_param(&condition.value).ok_or_else(|| wrong_type(&condition.value))?;
            head.then(Fragment::param(value))
        }
    };
    Ok(fragment)
}

/// Converts a JSON scalar into a bindable value. Null, arrays and objects
/// have no scalar form.
pub fn to_param(value: &JsonValue) -> Option<Value> {
    match value {
        JsonValue::String(s) => Some(Value::from(s.as_str())),
        JsonValue::Bool(b) => Some(Value::Bool(Some(*b))),
        JsonValue::Number(n) => {
            if let Some(i) = n.as_i64() {
                Some(Value::BigInt(Some(i)))
            } else if let Some(u) = n.as_u64() {
                Some(Value::BigUnsigned(Some(u)))
            } else {
                n.as_f64().map(|f| Value::Double(Some(f)))
            }
        }
        JsonValue::Null | JsonValue::Array(_) | JsonValue::Object(_) => None,
    }
}

fn describe(value: &JsonValue) -> &'static str {
    match value {
        JsonValue::Null => "null",
        JsonValue::Bool(_) => "a boolean",
        JsonValue::Number(_) => "a number",
        JsonValue::String(_) => "a string",
        JsonValue::Array(_) => "an array",
        JsonValue::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::Combinator;
    use serde_json::json;

    fn leaf(column: &str, operator: &str, value: JsonValue) -> FilterNode {
        FilterCondition::new(column, operator, value).into()
    }

    fn columns() -> ColumnUniverse {
        ColumnUniverse::from_names(["status", "amount", "beneficiary", "parentBountyId", "c.category"])
    }

    fn nested(levels: usize) -> FilterGroup {
        let mut group = FilterGroup::and(vec![leaf("status", "=", json!("Active"))]);
        for _ in 0..levels {
            group = FilterGroup::and(vec![group.into()]);
        }
        group
    }

    #[test]
    fn test_single_equality() {
        let group = FilterGroup::and(vec![leaf("status", "=", json!("Active"))]);
        let compiled = compile_filters(&group, &ColumnUniverse::from_names(["status"])).unwrap();
        assert_eq!(compiled.predicate, "\"status\" = ?");
        assert_eq!(compiled.params, vec![Value::from("Active")]);
    }

    #[test]
    fn test_empty_group_yields_empty_predicate() {
        for group in [FilterGroup::and(vec![]), FilterGroup::or(vec![])] {
            let compiled = compile_filters(&group, &columns()).unwrap();
            assert_eq!(compiled, CompiledFilter::default());
            assert!(compiled.is_empty());
        }
    }

    #[test]
    fn test_in_list_emits_one_placeholder_per_value() {
        let group = FilterGroup::and(vec![leaf("status", "IN", json!(["Active", "Executed", "Rejected"]))]);
        let compiled = compile_filters(&group, &columns()).unwrap();
        assert_eq!(compiled.predicate, "\"status\" IN (?, ?, ?)");
        assert_eq!(
            compiled.params,
            vec![Value::from("Active"), Value::from("Executed"), Value::from("Rejected")]
        );

        let group = FilterGroup::and(vec![leaf("amount", "NOT IN", json!([1, 2]))]);
        let compiled = compile_filters(&group, &columns()).unwrap();
        assert_eq!(compiled.predicate, "\"amount\" NOT IN (?, ?)");
        assert_eq!(compiled.params, vec![Value::BigInt(Some(1)), Value::BigInt(Some(2))]);
    }

    #[test]
    fn test_empty_in_list_fails() {
        let group = FilterGroup::and(vec![leaf("status", "IN", json!([]))]);
        let err = compile_filters(&group, &columns()).unwrap_err();
        assert!(matches!(err, QueryError::EmptyInList { .. }));

        let group = FilterGroup::and(vec![leaf("status", "NOT IN", json!("Active"))]);
        let err = compile_filters(&group, &columns()).unwrap_err();
        assert!(matches!(err, QueryError::WrongValueType { .. }));
    }

    #[test]
    fn test_between_arity() {
        let group = FilterGroup::and(vec![leaf("amount", "BETWEEN", json!([10, 20.5]))]);
        let compiled = compile_filters(&group, &columns()).unwrap();
        assert_eq!(compiled.predicate, "\"amount\" BETWEEN ? AND ?");
        assert_eq!(compiled.params, vec![Value::BigInt(Some(10)), Value::Double(Some(20.5))]);

        for (value, found) in [
            (json!([1]), 1),
            (json!([1, 2, 3]), 3),
            (json!([]), 0),
            (json!(5), 1),
            (JsonValue::Null, 0),
        ] {
            let group = FilterGroup::and(vec![leaf("amount", "BETWEEN", value)]);
            match compile_filters(&group, &columns()) {
                Err(QueryError::WrongArity { found: f, .. }) => assert_eq!(f, found),
                other => panic!("expected WrongArity, got {:?}", other),
            }
        }
    }

    #[test]
    fn test_null_checks_take_no_params() {
        let group = FilterGroup::or(vec![
            leaf("beneficiary", "IS NULL", JsonValue::Null),
            leaf("beneficiary", "IS NOT NULL", json!("ignored")),
        ]);
        let compiled = compile_filters(&group, &columns()).unwrap();
        assert_eq!(compiled.predicate, "\"beneficiary\" IS NULL OR \"beneficiary\" IS NOT NULL");
        assert!(compiled.params.is_empty());
    }

    #[test]
    fn test_like_requires_string() {
        let group = FilterGroup::and(vec![leaf("beneficiary", "NOT LIKE", json!("%foundation%"))]);
        let compiled = compile_filters(&group, &columns()).unwrap();
        assert_eq!(compiled.predicate, "\"beneficiary\" NOT LIKE ?");

        let group = FilterGroup::and(vec![leaf("beneficiary", "LIKE", json!(42))]);
        assert!(matches!(
            compile_filters(&group, &columns()),
            Err(QueryError::WrongValueType { .. })
        ));
    }

    #[test]
    fn test_comparison_rejects_null_and_arrays() {
        for value in [JsonValue::Null, json!([1, 2]), json!({ "a": 1 })] {
            let group = FilterGroup::and(vec![leaf("amount", ">=", value)]);
            assert!(matches!(
                compile_filters(&group, &columns()),
                Err(QueryError::WrongValueType { .. })
            ));
        }
    }

    #[test]
    fn test_invalid_operator_aborts_whole_compile() {
        let group = FilterGroup::and(vec![
            leaf("status", "=", json!("Active")),
            leaf("amount", "~", json!(1)),
        ]);
        match compile_filters(&group, &columns()) {
            Err(QueryError::InvalidOperator { operator }) => assert_eq!(operator, "~"),
            other => panic!("expected InvalidOperator, got {:?}", other),
        }

        // Operators are matched exactly.
        let group = FilterGroup::and(vec![leaf("beneficiary", "like", json!("x"))]);
        assert!(matches!(
            compile_filters(&group, &columns()),
            Err(QueryError::InvalidOperator { .. })
        ));
    }

    #[test]
    fn test_unknown_column_is_rejected_before_operator() {
        let group = FilterGroup::and(vec![leaf("Status", "~", json!(1))]);
        assert!(matches!(
            compile_filters(&group, &columns()),
            Err(QueryError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn test_nested_groups_are_parenthesized() {
        let group = FilterGroup {
            combinator: Combinator::Or,
            conditions: vec![
                leaf("status", "=", json!("Active")),
                FilterGroup::and(vec![
                    leaf("amount", ">", json!(100)),
                    leaf("c.category", "IN", json!(["Infra", "Marketing"])),
                ])
                .into(),
            ],
        };
        let compiled = compile_filters(&group, &columns()).unwrap();
        assert_eq!(
            compiled.predicate,
            "\"status\" = ? OR (\"amount\" > ? AND \"c\".\"category\" IN (?, ?))"
        );
        assert_eq!(
            compiled.params,
            vec![
                Value::from("Active"),
                Value::BigInt(Some(100)),
                Value::from("Infra"),
                Value::from("Marketing"),
            ]
        );
    }

    #[test]
    fn test_empty_nested_group_is_omitted() {
        let group = FilterGroup::and(vec![
            FilterGroup::or(vec![]).into(),
            leaf("status", "=", json!("Active")),
        ]);
        let compiled = compile_filters(&group, &columns()).unwrap();
        assert_eq!(compiled.predicate, "\"status\" = ?");
    }

    #[test]
    fn test_depth_limit() {
        assert!(compile_filters(&nested(10), &columns()).is_ok());
        match compile_filters(&nested(11), &columns()) {
            Err(QueryError::FilterTooDeep { depth, max }) => {
                assert_eq!(depth, 11);
                assert_eq!(max, 10);
            }
            other => panic!("expected FilterTooDeep, got {:?}", other),
        }
    }

    #[test]
    fn test_condition_count_limit() {
        let siblings = |n: usize| {
            FilterGroup::or((0..n).map(|i| leaf("amount", "=", json!(i))).collect())
        };
        let compiled = compile_filters(&siblings(100), &columns()).unwrap();
        assert_eq!(compiled.params.len(), 100);
        assert!(matches!(
            compile_filters(&siblings(101), &columns()),
            Err(QueryError::TooManyConditions { count: 101, max: 100 })
        ));
    }

    #[test]
    fn test_limits_follow_config() {
        let config = CompilerConfig {
            max_filter_depth: 2,
            max_group_conditions: 3,
            ..Default::default()
        };
        let compiler = FilterCompiler::from_config(&config);
        assert!(compiler.compile(&nested(2), &columns()).is_ok());
        assert!(compiler.compile(&nested(3), &columns()).is_err());
    }

    #[test]
    fn test_compile_is_deterministic() {
        let group = FilterGroup::and(vec![
            leaf("status", "IN", json!(["a", "b"])),
            FilterGroup::or(vec![leaf("amount", "<", json!(3)), leaf("beneficiary", "IS NULL", JsonValue::Null)]).into(),
        ]);
        let first = compile_filters(&group, &columns()).unwrap();
        let second = compile_filters(&group, &columns()).unwrap();
        assert_eq!(first, second);
    }
}
