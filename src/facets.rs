//! Distinct-value counts used to populate filter pickers.
//!
//! Each target column gets its own derived query: the base query's filters
//! with that column's own leaves removed, grouped by the column, counted.
//! Every derived query goes through the regular compiler, so it is validated
//! exactly like a hand-written one.

use crate::ast::{
    ColumnSelection, ExpressionColumn, FilterGroup, FilterNode, Filters, OrderBy, QueryConfig,
};
use crate::error::QueryError;
use crate::executor::{run, Executor, Row};
use crate::schema::SchemaRegistry;
use crate::sql_compiler::{CompiledQuery, QueryCompiler};
use anyhow::anyhow;
use serde::Serialize;
use serde_json::Value as JsonValue;
use std::collections::HashMap;
use tracing::{debug, info};

pub const VALUE_ALIAS: &str = "value";
pub const COUNT_ALIAS: &str = "cnt";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FacetValue {
    pub value: JsonValue,
    pub count: u64,
}

pub type Facets = HashMap<String, Vec<FacetValue>>;

/// Removes every leaf filtering on `column`, at any depth. A leaf written as
/// `<source>.column` counts as the same column as bare `column`. Groups left
/// empty by the removal are dropped as well.
pub fn strip_column(group: &FilterGroup, column: &str, source: &str) -> FilterGroup {
    let target = unqualified(column, source);
    let conditions = group
        .conditions
        .iter()
        .filter_map(|node| match node {
            FilterNode::Condition(condition) if unqualified(&condition.column, source) == target => {
                None
            }
            FilterNode::Condition(condition) => Some(FilterNode::Condition(condition.clone())),
            FilterNode::Group(nested) => {
                let stripped = strip_column(nested, column, source);
                (!stripped.is_empty()).then_some(FilterNode::Group(stripped))
            }
        })
        .collect();

    FilterGroup {
        combinator: group.combinator,
        conditions,
    }
}

fn unqualified<'a>(column: &'a str, source: &str) -> &'a str {
    column
        .strip_prefix(source)
        .and_then(|rest| rest.strip_prefix('.'))
        .unwrap_or(column)
}

/// The derived query counting the distinct values of `target` under every
/// filter of `base` except the ones on `target` itself.
pub fn facet_query(base: &QueryConfig, target: &str) -> QueryConfig {
    let filters = base
        .filters
        .clone()
        .map(|filters| {
            Filters::Group(strip_column(&filters.into_group(), target, &base.source_table))
        });

    QueryConfig {
        source_table: base.source_table.clone(),
        columns: vec![ColumnSelection::new(target).with_alias(VALUE_ALIAS)],
        expression_columns: vec![ExpressionColumn {
            expression: "COUNT(*)".to_string(),
            alias: COUNT_ALIAS.to_string(),
        }],
        joins: base.joins.clone(),
        filters,
        group_by: vec![target.to_string()],
        order_by: vec![
            OrderBy {
                column: COUNT_ALIAS.to_string(),
                direction: "DESC".to_string(),
            },
            OrderBy {
                column: VALUE_ALIAS.to_string(),
                direction: "ASC".to_string(),
            },
        ],
        limit: None,
        offset: None,
    }
}

#[derive(Debug, Clone, Default)]
pub struct FacetEngine {
    compiler: QueryCompiler,
}

impl FacetEngine {
    pub fn new(compiler: QueryCompiler) -> Self {
        Self { compiler }
    }

    pub fn compile_facet<S>(
        &self,
        base: &QueryConfig,
        target: &str,
        schema: &S,
    ) -> Result<CompiledQuery, QueryError>
    where
        S: SchemaRegistry + ?Sized,
    {
        self.compiler.compile(&facet_query(base, target), schema)
    }

    /// One compile and one execution per target; no scan is shared.
    pub fn compute<S, E>(
        &self,
        base: &QueryConfig,
        targets: &[String],
        schema: &S,
        executor: &E,
    ) -> Result<Facets, QueryError>
    where
        S: SchemaRegistry + ?Sized,
        E: Executor + ?Sized,
    {
        info!(source = %base.source_table, facets = targets.len(), "computing facets");
        let mut facets = Facets::with_capacity(targets.len());

        for target in targets {
            let compiled = self.compile_facet(base, target, schema)?;
            let rows = run(executor, &compiled.statement, &compiled.params)?;
            let values = rows
                .iter()
                .map(|row| facet_value(target, row))
                .collect::<Result<Vec<_>, _>>()?;
            debug!(column = %target, distinct = values.len(), "facet computed");
            facets.insert(target.clone(), values);
        }

        Ok(facets)
    }
}

/// Computes facets with default compiler bounds.
pub fn compute_facets<S, E>(
    base: &QueryConfig,
    targets: &[String],
    schema: &S,
    executor: &E,
) -> Result<Facets, QueryError>
where
    S: SchemaRegistry + ?Sized,
    E: Executor + ?Sized,
{
    FacetEngine::default().compute(base, targets, schema, executor)
}

fn facet_value(target: &str, row: &Row) -> Result<FacetValue, QueryError> {
    let count = row
        .get(COUNT_ALIAS)
        .and_then(JsonValue::as_u64)
        .ok_or_else(|| {
            QueryError::ExecutionFailed(anyhow!("facet row for '{}' has no count", target))
        })?;
    let value = row.get(VALUE_ALIAS).cloned().unwrap_or(JsonValue::Null);
    Ok(FacetValue { value, count })
}
