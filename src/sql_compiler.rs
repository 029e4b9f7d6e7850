//! SQL compiler that turns a query description into a parameterized
//! statement using sea-query.
//!
//! Clauses are validated and emitted in a fixed order; the first violation
//! aborts the compile. Identifiers are always double-quoted and values are
//! always `?` placeholders, bound by position.

use crate::ast::{AggregateFunction, ColumnSelection, JoinKind, JoinSpec, QueryConfig};
use crate::config::{CompilerConfig, ExpressionPolicy};
use crate::error::QueryError;
use crate::expression::{check_placeholders, validate_expression};
use crate::filter_compiler::FilterCompiler;
use crate::identifier::{self, checked_column};
use crate::schema::{ColumnUniverse, SchemaRegistry};
use sea_query::{
    Alias, Asterisk, ColumnRef, Expr, Func, IntoColumnRef, JoinType, Order, SelectStatement,
    SimpleExpr, SqliteQueryBuilder, Value,
};
use std::collections::HashSet;
use std::fmt::Write;
use tracing::{debug, warn};

/// A statement ready for the execution adapter. The n-th `?` in `statement`
/// binds `params[n]`.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledQuery {
    pub statement: String,
    pub params: Vec<Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortDirection {
    Asc,
    Desc,
}

impl SortDirection {
    pub fn parse(direction: &str) -> Result<Self, QueryError> {
        match direction {
            "ASC" => Ok(SortDirection::Asc),
            "DESC" => Ok(SortDirection::Desc),
            _ => Err(QueryError::InvalidSortDirection {
                direction: direction.to_string(),
            }),
        }
    }

    fn order(&self) -> Order {
        match self {
            SortDirection::Asc => Order::Asc,
            SortDirection::Desc => Order::Desc,
        }
    }
}

/// SQL compiler for dashboard query descriptions. Stateless apart from its
/// bounds, so one instance can serve concurrent requests.
#[derive(Debug, Clone, Default)]
pub struct QueryCompiler {
    config: CompilerConfig,
    filters: FilterCompiler,
}

impl QueryCompiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_config(config: CompilerConfig) -> Self {
        let filters = FilterCompiler::from_config(&config);
        Self { config, filters }
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compile a query description into a statement and its parameters.
    pub fn compile<S>(&self, query: &QueryConfig, schema: &S) -> Result<CompiledQuery, QueryError>
    where
        S: SchemaRegistry + ?Sized,
    {
        // 1-2. Source table, join tables, extended column universe.
        let universe = self.column_universe(query, schema)?;

        // 3. SELECT list.
        let mut select = SelectStatement::new();
        let aliases = self.compile_select_list(&mut select, query, &universe)?;

        // 4. FROM and JOINs, in input order.
        select.from(Alias::new(query.source_table.as_str()));
        for join in &query.joins {
            compile_join(&mut select, join, &universe)?;
        }

        // 5. WHERE. The filter predicate carries its own params, which
        // sea-query splices in at the position of each `?`.
        if let Some(filters) = &query.filters {
            let group = filters.clone().into_group();
            let compiled = self.filters.compile(&group, &universe)?;
            if !compiled.is_empty() {
                select.and_where(Expr::cust_with_values(compiled.predicate, compiled.params));
            }
        }

        // 6. GROUP BY.
        for column in &query.group_by {
            select.group_by_col(checked_column(column, &universe)?);
        }

        // 7. ORDER BY, over universe columns or select-list aliases.
        for order in &query.order_by {
            let direction = SortDirection::parse(&order.direction)?;
            identifier::check(&order.column)?;
            let target = if aliases.contains(&order.column) {
                Alias::new(order.column.as_str()).into_column_ref()
            } else {
                checked_column(&order.column, &universe)?
            };
            select.order_by(target, direction.order());
        }

        let (mut statement, values) = select.build(SqliteQueryBuilder);

        // 8. LIMIT is always present; OFFSET only when asked for. Both are
        // integers, so they are written inline rather than bound.
        let limit = self.effective_limit(query.limit);
        let offset = checked_offset(query.offset)?;
        write!(statement, " LIMIT {}", limit).ok();
        if let Some(offset) = offset {
            write!(statement, " OFFSET {}", offset).ok();
        }

        let compiled = CompiledQuery {
            statement,
            params: values.0,
        };
        debug!(
            source = %query.source_table,
            statement = %compiled.statement,
            params = compiled.params.len(),
            "compiled query"
        );
        Ok(compiled)
    }

    /// Validates the source and join tables and returns every column
    /// reference the rest of the query may use.
    pub fn column_universe<S>(&self, query: &QueryConfig, schema: &S) -> Result<ColumnUniverse, QueryError>
    where
        S: SchemaRegistry + ?Sized,
    {
        let source = schema
            .table(&query.source_table)
            .ok_or_else(|| QueryError::InvalidSourceTable {
                table: query.source_table.clone(),
            })?;
        identifier::check(&query.source_table)?;

        let mut universe = ColumnUniverse::new();
        universe.extend_from_table(source, None);
        universe.extend_from_table(source, Some(&query.source_table));

        let mut qualifiers: HashSet<&str> = HashSet::new();
        qualifiers.insert(query.source_table.as_str());
        let mut joined_names: HashSet<&str> = HashSet::new();

        for join in &query.joins {
            let invalid = || QueryError::InvalidJoinTable {
                table: join.table.clone(),
            };
            let table = schema.table(&join.table).ok_or_else(invalid)?;
            identifier::check(&join.table)?;
            if let Some(alias) = &join.alias {
                identifier::check(alias)?;
            }
            // A join must be distinguishable from the source and from every
            // other join by its qualifier.
            if !qualifiers.insert(join.qualifier()) {
                return Err(invalid());
            }
            universe.extend_from_table(table, Some(join.qualifier()));
            joined_names.extend(table.columns.iter().map(|c| c.name.as_str()));
        }

        for column in &source.columns {
            if joined_names.contains(column.name.as_str()) {
                universe.qualify(&column.name, &query.source_table);
            }
        }

        Ok(universe)
    }

    /// Clamps the requested limit to the configured ceiling.
    pub fn effective_limit(&self, requested: Option<u64>) -> u64 {
        let limit = requested.unwrap_or(self.config.default_limit);
        if limit > self.config.max_limit {
            warn!(requested = limit, max = self.config.max_limit, "limit clamped");
            return self.config.max_limit;
        }
        limit
    }

    /// Adds plain, aggregate and expression columns; returns the aliases they
    /// declare.
    fn compile_select_list(
        &self,
        select: &mut SelectStatement,
        query: &QueryConfig,
        universe: &ColumnUniverse,
    ) -> Result<HashSet<String>, QueryError> {
        let mut aliases = HashSet::new();

        for selection in &query.columns {
            let col = checked_column(&selection.column, universe)?;
            match selection.aggregate_function {
                Some(function) => {
                    check_aggregatable(selection, function, universe)?;
                    let alias = selection
                        .alias
                        .clone()
                        .unwrap_or_else(|| default_aggregate_alias(function, &selection.column));
                    identifier::check(&alias)?;
                    select.expr_as(aggregate(function, col), Alias::new(alias.as_str()));
                    aliases.insert(alias);
                }
                None => match &selection.alias {
                    Some(alias) => {
                        identifier::check(alias)?;
                        select.expr_as(Expr::col(col), Alias::new(alias.as_str()));
                        aliases.insert(alias.clone());
                    }
                    None => {
                        select.column(col);
                    }
                },
            }
        }

        for computed in &query.expression_columns {
            identifier::check(&computed.alias)?;
            match self.config.expression_policy {
                ExpressionPolicy::Validated => {
                    validate_expression(&computed.expression, universe, &aliases)?
                }
                ExpressionPolicy::Trusted => check_placeholders(&computed.expression)?,
            }
            select.expr_as(
                Expr::cust(computed.expression.as_str()),
                Alias::new(computed.alias.as_str()),
            );
            aliases.insert(computed.alias.clone());
        }

        if query.columns.is_empty() && query.expression_columns.is_empty() {
            select.column(Asterisk);
        }

        Ok(aliases)
    }
}

/// Compiles with default bounds.
pub fn compile_query<S>(query: &QueryConfig, schema: &S) -> Result<CompiledQuery, QueryError>
where
    S: SchemaRegistry + ?Sized,
{
    QueryCompiler::new().compile(query, schema)
}

fn compile_join(
    select: &mut SelectStatement,
    join: &JoinSpec,
    universe: &ColumnUniverse,
) -> Result<(), QueryError> {
    let left = join_column(&join.on.left, universe)?;
    let right = join_column(&join.on.right, universe)?;
    let condition = Expr::col(left).equals(right);
    let join_type = match join.join_type {
        JoinKind::Left => JoinType::LeftJoin,
        JoinKind::Inner => JoinType::InnerJoin,
        JoinKind::Right => JoinType::RightJoin,
    };

    let table = Alias::new(join.table.as_str());
    match &join.alias {
        Some(alias) => {
            select.join_as(join_type, table, Alias::new(alias.as_str()), condition);
        }
        None => {
            select.join(join_type, table, condition);
        }
    }
    Ok(())
}

/// SQLite offsets are signed 64-bit.
fn checked_offset(offset: Option<u64>) -> Result<Option<u64>, QueryError> {
    let max = i64::MAX as u64;
    match offset {
        Some(offset) if offset > max => Err(QueryError::InvalidOffset { offset, max }),
        _ => Ok(offset),
    }
}

/// Join conditions only accept `qualifier.column` references.
fn join_column(reference: &str, universe: &ColumnUniverse) -> Result<ColumnRef, QueryError> {
    identifier::check(reference)?;
    if identifier::split_qualified(reference).is_none() {
        return Err(QueryError::UnknownColumn {
            column: reference.to_string(),
        });
    }
    checked_column(reference, universe)
}

fn check_aggregatable(
    selection: &ColumnSelection,
    function: AggregateFunction,
    universe: &ColumnUniverse,
) -> Result<(), QueryError> {
    let numeric = universe
        .kind(&selection.column)
        .map_or(true, |kind| kind.is_numeric());
    if function.requires_numeric() && !numeric {
        return Err(QueryError::NonAggregatableColumn {
            column: selection.column.clone(),
            function: function.as_str().to_string(),
        });
    }
    Ok(())
}

fn aggregate(function: AggregateFunction, col: ColumnRef) -> SimpleExpr {
    let expr = Expr::col(col);
    match function {
        AggregateFunction::Count => Func::count(expr).into(),
        AggregateFunction::Sum => Func::sum(expr).into(),
        AggregateFunction::Avg => Func::avg(expr).into(),
        AggregateFunction::Min => Func::min(expr).into(),
        AggregateFunction::Max => Func::max(expr).into(),
    }
}

/// `sum_amount`, `count_c_id`, ...
pub fn default_aggregate_alias(function: AggregateFunction, column: &str) -> String {
    let column: String = column
        .chars()
        .map(|c| if c == '.' || c.is_whitespace() { '_' } else { c })
        .collect();
    format!("{}_{}", function.as_str().to_lowercase(), column)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{ExpressionColumn, FilterCondition, FilterGroup, Filters, JoinOn, OrderBy};
    use crate::schema::{ColumnDef, ColumnKind, StaticSchema};
    use serde_json::json;

    fn schema() -> StaticSchema {
        StaticSchema::new()
            .with_table(
                "Referenda",
                vec![
                    ColumnDef::new("id", ColumnKind::Integer),
                    ColumnDef::new("title", ColumnKind::Text),
                    ColumnDef::new("status", ColumnKind::Text),
                    ColumnDef::new("amount", ColumnKind::Real),
                    ColumnDef::new("category_id", ColumnKind::Integer),
                ],
            )
            .with_table(
                "Categories",
                vec![
                    ColumnDef::new("id", ColumnKind::Integer),
                    ColumnDef::new("category", ColumnKind::Text),
                ],
            )
    }

    fn query() -> QueryConfig {
        QueryConfig {
            source_table: "Referenda".to_string(),
            ..Default::default()
        }
    }

    fn category_join() -> JoinSpec {
        JoinSpec {
            join_type: JoinKind::Left,
            table: "Categories".to_string(),
            alias: Some("c".to_string()),
            on: JoinOn {
                left: "Referenda.category_id".to_string(),
                right: "c.id".to_string(),
            },
        }
    }

    #[test]
    fn test_minimal_query() {
        let compiled = compile_query(&query(), &schema()).unwrap();
        assert_eq!(compiled.statement, r#"SELECT * FROM "Referenda" LIMIT 1000"#);
        assert!(compiled.params.is_empty());
    }

    #[test]
    fn test_unknown_source_table() {
        let mut q = query();
        q.source_table = "NonExistentTable".to_string();
        match compile_query(&q, &schema()) {
            Err(QueryError::InvalidSourceTable { table }) => assert_eq!(table, "NonExistentTable"),
            other => panic!("expected InvalidSourceTable, got {:?}", other),
        }
    }

    #[test]
    fn test_join_with_alias() {
        let mut q = query();
        q.columns = vec![
            ColumnSelection::new("title"),
            ColumnSelection::new("c.category").with_alias("category"),
        ];
        q.joins = vec![category_join()];

        let compiled = compile_query(&q, &schema()).unwrap();
        assert!(compiled.statement.contains(r#"LEFT JOIN "Categories" AS "c""#));
        assert!(compiled
            .statement
            .contains(r#"ON "Referenda"."category_id" = "c"."id""#));
        assert!(compiled.statement.contains(r#""c"."category" AS "category""#));
    }

    #[test]
    fn test_join_table_must_exist() {
        let mut q = query();
        let mut join = category_join();
        join.table = "Missing".to_string();
        q.joins = vec![join];
        assert!(matches!(
            compile_query(&q, &schema()),
            Err(QueryError::InvalidJoinTable { .. })
        ));
    }

    #[test]
    fn test_join_qualifiers_must_be_distinct() {
        let mut q = query();
        q.joins = vec![category_join(), category_join()];
        assert!(matches!(
            compile_query(&q, &schema()),
            Err(QueryError::InvalidJoinTable { .. })
        ));

        // Self-join needs an alias.
        let mut q = query();
        q.joins = vec![JoinSpec {
            join_type: JoinKind::Inner,
            table: "Referenda".to_string(),
            alias: None,
            on: JoinOn {
                left: "Referenda.id".to_string(),
                right: "Referenda.id".to_string(),
            },
        }];
        assert!(matches!(
            compile_query(&q, &schema()),
            Err(QueryError::InvalidJoinTable { .. })
        ));
    }

    #[test]
    fn test_join_condition_must_be_qualified() {
        let mut q = query();
        let mut join = category_join();
        join.on.left = "category_id".to_string();
        q.joins = vec![join];
        assert!(matches!(
            compile_query(&q, &schema()),
            Err(QueryError::UnknownColumn { .. })
        ));

        let mut q = query();
        let mut join = category_join();
        join.on.right = "c.id = 1 OR 1".to_string();
        q.joins = vec![join];
        assert!(matches!(
            compile_query(&q, &schema()),
            Err(QueryError::InvalidIdentifier { .. })
        ));
    }

    #[test]
    fn test_joined_column_requires_qualification() {
        let mut q = query();
        q.columns = vec![ColumnSelection::new("category")];
        q.joins = vec![category_join()];
        assert!(matches!(
            compile_query(&q, &schema()),
            Err(QueryError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn test_aggregates_and_default_alias() {
        let mut q = query();
        q.columns = vec![
            ColumnSelection::new("status"),
            ColumnSelection::new("amount").aggregate(AggregateFunction::Sum),
            ColumnSelection::new("id")
                .aggregate(AggregateFunction::Count)
                .with_alias("proposals"),
        ];
        q.group_by = vec!["status".to_string()];

        let compiled = compile_query(&q, &schema()).unwrap();
        assert!(compiled.statement.contains(r#"SUM("amount") AS "sum_amount""#));
        assert!(compiled.statement.contains(r#"COUNT("id") AS "proposals""#));
        assert!(compiled.statement.contains(r#"GROUP BY "status""#));
    }

    #[test]
    fn test_sum_over_text_column_is_rejected() {
        let mut q = query();
        q.columns = vec![ColumnSelection::new("title").aggregate(AggregateFunction::Avg)];
        assert!(matches!(
            compile_query(&q, &schema()),
            Err(QueryError::NonAggregatableColumn { .. })
        ));

        // MAX is fine over any kind.
        q.columns = vec![ColumnSelection::new("title").aggregate(AggregateFunction::Max)];
        assert!(compile_query(&q, &schema()).is_ok());
    }

    #[test]
    fn test_default_aggregate_alias() {
        assert_eq!(default_aggregate_alias(AggregateFunction::Avg, "amount"), "avg_amount");
        assert_eq!(default_aggregate_alias(AggregateFunction::Count, "c.id"), "count_c_id");
        assert_eq!(
            default_aggregate_alias(AggregateFunction::Max, "total spent"),
            "max_total_spent"
        );
    }

    #[test]
    fn test_expression_column_passes_through() {
        let mut q = query();
        q.expression_columns = vec![ExpressionColumn {
            expression: "amount / 1000".to_string(),
            alias: "amount_k".to_string(),
        }];
        let compiled = compile_query(&q, &schema()).unwrap();
        assert!(compiled.statement.contains(r#"amount / 1000 AS "amount_k""#));
        assert!(!compiled.statement.contains('*'));
    }

    #[test]
    fn test_expression_alias_is_sanitized() {
        let mut q = query();
        q.expression_columns = vec![ExpressionColumn {
            expression: "amount".to_string(),
            alias: "x\" FROM secrets --".to_string(),
        }];
        assert!(matches!(
            compile_query(&q, &schema()),
            Err(QueryError::InvalidIdentifier { .. })
        ));
    }

    #[test]
    fn test_validated_expression_policy() {
        let compiler = QueryCompiler::from_config(CompilerConfig {
            expression_policy: ExpressionPolicy::Validated,
            ..Default::default()
        });
        let mut q = query();
        q.expression_columns = vec![ExpressionColumn {
            expression: "SUM(amount); DELETE FROM Referenda".to_string(),
            alias: "total".to_string(),
        }];
        assert!(matches!(
            compiler.compile(&q, &schema()),
            Err(QueryError::UnsafeExpression { .. })
        ));

        q.expression_columns[0].expression = "SUM(amount)".to_string();
        assert!(compiler.compile(&q, &schema()).is_ok());
    }

    #[test]
    fn test_where_clause_and_param_order() {
        let mut q = query();
        q.columns = vec![ColumnSelection::new("c.category").with_alias("category")];
        q.joins = vec![category_join()];
        q.filters = Some(Filters::List(vec![
            FilterCondition::new("status", "IN", json!(["Executed", "Approved"])).into(),
            FilterCondition::new("c.category", "=", json!("Infrastructure")).into(),
            FilterCondition::new("amount", "BETWEEN", json!([100, 5000])).into(),
        ]));

        let compiled = compile_query(&q, &schema()).unwrap();
        assert!(compiled.statement.contains(
            r#"WHERE "status" IN (?, ?) AND "c"."category" = ? AND "amount" BETWEEN ? AND ?"#
        ));
        assert_eq!(
            compiled.params,
            vec![
                Value::from("Executed"),
                Value::from("Approved"),
                Value::from("Infrastructure"),
                Value::BigInt(Some(100)),
                Value::BigInt(Some(5000)),
            ]
        );
        assert_eq!(compiled.statement.matches('?').count(), compiled.params.len());
    }

    #[test]
    fn test_empty_filters_emit_no_where() {
        let mut q = query();
        q.filters = Some(Filters::Group(FilterGroup::or(vec![])));
        let compiled = compile_query(&q, &schema()).unwrap();
        assert!(!compiled.statement.contains("WHERE"));
    }

    #[test]
    fn test_filter_errors_propagate() {
        let mut q = query();
        q.filters = Some(Filters::List(vec![FilterCondition::new("secret", "=", json!(1)).into()]));
        assert!(matches!(
            compile_query(&q, &schema()),
            Err(QueryError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn test_order_by() {
        let mut q = query();
        q.columns = vec![
            ColumnSelection::new("status"),
            ColumnSelection::new("amount").aggregate(AggregateFunction::Sum).with_alias("total"),
        ];
        q.group_by = vec!["status".to_string()];
        q.order_by = vec![
            OrderBy {
                column: "total".to_string(),
                direction: "DESC".to_string(),
            },
            OrderBy {
                column: "status".to_string(),
                direction: "ASC".to_string(),
            },
        ];
        let compiled = compile_query(&q, &schema()).unwrap();
        assert!(compiled
            .statement
            .contains(r#"ORDER BY "total" DESC, "status" ASC"#));
    }

    #[test]
    fn test_invalid_sort_direction() {
        let mut q = query();
        q.order_by = vec![OrderBy {
            column: "status".to_string(),
            direction: "SIDEWAYS".to_string(),
        }];
        match compile_query(&q, &schema()) {
            Err(QueryError::InvalidSortDirection { direction }) => assert_eq!(direction, "SIDEWAYS"),
            other => panic!("expected InvalidSortDirection, got {:?}", other),
        }
    }

    #[test]
    fn test_limit_and_offset() {
        let mut q = query();
        q.limit = Some(25);
        q.offset = Some(50);
        let compiled = compile_query(&q, &schema()).unwrap();
        assert!(compiled.statement.ends_with("LIMIT 25 OFFSET 50"));

        q.limit = Some(1_000_000);
        q.offset = None;
        let compiled = compile_query(&q, &schema()).unwrap();
        assert!(compiled.statement.ends_with("LIMIT 10000"));
        assert!(!compiled.statement.contains("OFFSET"));
    }

    #[test]
    fn test_group_by_rejects_unknown_column() {
        let mut q = query();
        q.group_by = vec!["nope".to_string()];
        assert!(matches!(
            compile_query(&q, &schema()),
            Err(QueryError::UnknownColumn { .. })
        ));
    }

    #[test]
    fn test_right_join() {
        let mut q = query();
        q.columns = vec![ColumnSelection::new("c.category")];
        let mut join = category_join();
        join.join_type = JoinKind::Right;
        q.joins = vec![join];

        let compiled = compile_query(&q, &schema()).unwrap();
        assert!(compiled
            .statement
            .contains(r#"RIGHT JOIN "Categories" AS "c" ON "Referenda"."category_id" = "c"."id""#));
    }

    #[test]
    fn test_shared_column_names_are_source_qualified() {
        let mut q = query();
        q.columns = vec![ColumnSelection::new("id"), ColumnSelection::new("title")];
        q.joins = vec![category_join()];
        q.filters = Some(Filters::List(vec![
            FilterCondition::new("id", "=", json!(10)).into(),
            FilterCondition::new("status", "=", json!("Executed")).into(),
        ]));
        q.group_by = vec!["id".to_string()];
        q.order_by = vec![OrderBy {
            column: "id".to_string(),
            direction: "DESC".to_string(),
        }];

        let compiled = compile_query(&q, &schema()).unwrap();
        assert!(compiled
            .statement
            .starts_with(r#"SELECT "Referenda"."id", "title" FROM"#));
        assert!(compiled
            .statement
            .contains(r#"WHERE "Referenda"."id" = ? AND "status" = ?"#));
        assert!(compiled.statement.contains(r#"GROUP BY "Referenda"."id""#));
        assert!(compiled.statement.contains(r#"ORDER BY "Referenda"."id" DESC"#));

        // Without a join nothing is ambiguous.
        q.joins.clear();
        let compiled = compile_query(&q, &schema()).unwrap();
        assert!(compiled.statement.contains(r#"WHERE "id" = ?"#));
    }

    #[test]
    fn test_offset_out_of_range() {
        let mut q = query();
        q.offset = Some(u64::MAX);
        match compile_query(&q, &schema()) {
            Err(err @ QueryError::InvalidOffset { .. }) => assert_eq!(err.status_code(), 400),
            other => panic!("expected InvalidOffset, got {:?}", other),
        }

        q.offset = Some(i64::MAX as u64);
        assert!(compile_query(&q, &schema()).is_ok());
    }

    #[test]
    fn test_trusted_expression_cannot_add_placeholders() {
        let mut q = query();
        q.expression_columns = vec![ExpressionColumn {
            expression: "amount + ?".to_string(),
            alias: "shifted".to_string(),
        }];
        q.filters = Some(Filters::List(vec![FilterCondition::new("status", "=", json!("Executed")).into()]));
        assert!(matches!(
            compile_query(&q, &schema()),
            Err(QueryError::UnsafeExpression { .. })
        ));

        q.expression_columns[0].expression = "amount * 2".to_string();
        let compiled = compile_query(&q, &schema()).unwrap();
        assert_eq!(compiled.statement.matches('?').count(), compiled.params.len());
    }
}
