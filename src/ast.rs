//! Query descriptions as they arrive from the dashboard client.
//!
//! Everything here is plain data deserialized from JSON. Nothing is validated
//! at this layer; operators and sort directions stay as raw strings so the
//! compiler can reject them with a precise error kind.

use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

/// The root of a query description.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryConfig {
    pub source_table: String,
    #[serde(default)]
    pub columns: Vec<ColumnSelection>,
    #[serde(default)]
    pub expression_columns: Vec<ExpressionColumn>,
    #[serde(default)]
    pub joins: Vec<JoinSpec>,
    #[serde(default)]
    pub filters: Option<Filters>,
    #[serde(default)]
    pub group_by: Vec<String>,
    #[serde(default)]
    pub order_by: Vec<OrderBy>,
    #[serde(default)]
    pub limit: Option<u64>,
    #[serde(default)]
    pub offset: Option<u64>,
}

/// A single column in the SELECT list, optionally aggregated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ColumnSelection {
    pub column: String,
    #[serde(default)]
    pub alias: Option<String>,
    #[serde(default)]
    pub aggregate_function: Option<AggregateFunction>,
}

impl ColumnSelection {
    pub fn new(column: impl Into<String>) -> Self {
        Self {
            column: column.into(),
            alias: None,
            aggregate_function: None,
        }
    }

    pub fn with_alias(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self
    }

    pub fn aggregate(mut self, function: AggregateFunction) -> Self {
        self.aggregate_function = Some(function);
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AggregateFunction {
    Count,
    Sum,
    Avg,
    Min,
    Max,
}

impl AggregateFunction {
    pub fn as_str(&self) -> &'static str {
        match self {
            AggregateFunction::Count => "COUNT",
            AggregateFunction::Sum => "SUM",
            AggregateFunction::Avg => "AVG",
            AggregateFunction::Min => "MIN",
            AggregateFunction::Max => "MAX",
        }
    }

    /// SUM and AVG only make sense over numeric columns.
    pub fn requires_numeric(&self) -> bool {
        matches!(self, AggregateFunction::Sum | AggregateFunction::Avg)
    }
}

/// A computed column. The expression text is emitted as-is; only the alias is
/// quoted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExpressionColumn {
    pub expression: String,
    pub alias: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinSpec {
    #[serde(rename = "type")]
    pub join_type: JoinKind,
    pub table: String,
    #[serde(default)]
    pub alias: Option<String>,
    pub on: JoinOn,
}

impl JoinSpec {
    /// The name other clauses use to qualify this join's columns.
    pub fn qualifier(&self) -> &str {
        self.alias.as_deref().unwrap_or(&self.table)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum JoinKind {
    Left,
    Inner,
    Right,
}

/// `left` and `right` are `qualifier.column` references, never expressions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JoinOn {
    pub left: String,
    pub right: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderBy {
    pub column: String,
    #[serde(default = "default_direction")]
    pub direction: String,
}

fn default_direction() -> String {
    "ASC".to_string()
}

/// Filters arrive either as a bare list (implicitly AND-ed) or as a group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Filters {
    Group(FilterGroup),
    List(Vec<FilterNode>),
}

impl Filters {
    /// Normalizes both accepted shapes into a single group.
    pub fn into_group(self) -> FilterGroup {
        match self {
            Filters::Group(group) => group,
            Filters::List(conditions) => FilterGroup {
                combinator: Combinator::And,
                conditions,
            },
        }
    }
}

/// A boolean combination of leaves and nested groups.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterGroup {
    pub combinator: Combinator,
    pub conditions: Vec<FilterNode>,
}

impl FilterGroup {
    pub fn and(conditions: Vec<FilterNode>) -> Self {
        Self {
            combinator: Combinator::And,
            conditions,
        }
    }

    pub fn or(conditions: Vec<FilterNode>) -> Self {
        Self {
            combinator: Combinator::Or,
            conditions,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterNode {
    Group(FilterGroup),
    Condition(FilterCondition),
}

impl From<FilterCondition> for FilterNode {
    fn from(condition: FilterCondition) -> Self {
        FilterNode::Condition(condition)
    }
}

impl From<FilterGroup> for FilterNode {
    fn from(group: FilterGroup) -> Self {
        FilterNode::Group(group)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Combinator {
    #[serde(rename = "AND", alias = "and")]
    And,
    #[serde(rename = "OR", alias = "or")]
    Or,
}

impl Combinator {
    pub fn as_sql(&self) -> &'static str {
        match self {
            Combinator::And => "AND",
            Combinator::Or => "OR",
        }
    }
}

/// A single `column operator value` predicate.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterCondition {
    pub column: String,
    pub operator: String,
    #[serde(default)]
    pub value: JsonValue,
}

impl FilterCondition {
    pub fn new(column: impl Into<String>, operator: impl Into<String>, value: JsonValue) -> Self {
        Self {
            column: column.into(),
            operator: operator.into(),
            value,
        }
    }
}
