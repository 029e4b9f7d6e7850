//! Execution adapter contract and its SQLite implementation.
//!
//! The compiler never opens a connection; it hands `{statement, params}` to
//! an [`Executor`]. Whatever goes wrong in there comes back to callers as an
//! opaque `ExecutionFailed`.

use crate::ast::QueryConfig;
use crate::error::QueryError;
use crate::schema::{ColumnDef, ColumnKind, SchemaRegistry, StaticSchema};
use crate::sql_compiler::{CompiledQuery, QueryCompiler};
use anyhow::Context;
use rusqlite::types::{Value as SqlValue, ValueRef};
use rusqlite::{params_from_iter, Connection};
use sea_query::Value;
use serde::Serialize;
use serde_json::{json, Map, Value as JsonValue};
use std::path::Path;
use tracing::{debug, info};

/// One result row, keyed by result column name.
pub type Row = Map<String, JsonValue>;

pub trait Executor {
    /// Runs `statement`, binding `params` to its `?` placeholders by position.
    fn execute(&self, statement: &str, params: &[Value]) -> anyhow::Result<Vec<Row>>;
}

/// Rows together with the statement that produced them.
#[derive(Debug, Clone, Serialize)]
pub struct QueryResult {
    pub statement: String,
    #[serde(skip)]
    pub params: Vec<Value>,
    pub rows: Vec<Row>,
}

impl QueryResult {
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}

/// Compiles `query` and runs it through `executor`.
pub fn execute_query<S, E>(
    compiler: &QueryCompiler,
    query: &QueryConfig,
    schema: &S,
    executor: &E,
) -> Result<QueryResult, QueryError>
where
    S: SchemaRegistry + ?Sized,
    E: Executor + ?Sized,
{
    let CompiledQuery { statement, params } = compiler.compile(query, schema)?;
    let rows = run(executor, &statement, &params)?;
    Ok(QueryResult {
        statement,
        params,
        rows,
    })
}

/// Runs a compiled statement, hiding adapter detail behind `ExecutionFailed`.
pub fn run<E>(executor: &E, statement: &str, params: &[Value]) -> Result<Vec<Row>, QueryError>
where
    E: Executor + ?Sized,
{
    executor
        .execute(statement, params)
        .map_err(QueryError::ExecutionFailed)
}

/// Executor over a single SQLite connection.
pub struct SqliteExecutor {
    conn: Connection,
}

impl SqliteExecutor {
    pub fn open<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let conn = Connection::open(path)
            .with_context(|| format!("cannot open sqlite database {}", path.display()))?;
        info!(path = %path.display(), "opened sqlite database");
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> anyhow::Result<Self> {
        Ok(Self {
            conn: Connection::open_in_memory()?,
        })
    }

    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    /// Builds a registry from every user table and view in the database.
    pub fn introspect_schema(&self) -> anyhow::Result<StaticSchema> {
        let mut tables = self.conn.prepare(
            "SELECT name FROM sqlite_master WHERE type IN ('table', 'view') \
             AND name NOT LIKE 'sqlite_%' ORDER BY name",
        )?;
        let names = tables
            .query_map([], |row| row.get::<_, String>(0))?
            .collect::<Result<Vec<_>, _>>()?;

        let mut schema = StaticSchema::new();
        let mut columns = self
            .conn
            .prepare("SELECT name, type FROM pragma_table_info(?1) ORDER BY cid")?;
        for name in names {
            let defs = columns
                .query_map([&name], |row| {
                    let column: String = row.get(0)?;
                    let decl: Option<String> = row.get(1)?;
                    Ok(ColumnDef::new(
                        column,
                        ColumnKind::from_sqlite_decl(decl.as_deref().unwrap_or_default()),
                    ))
                })?
                .collect::<Result<Vec<_>, _>>()?;
            schema.insert(name, defs);
        }

        info!(tables = schema.len(), "introspected sqlite schema");
        Ok(schema)
    }
}

impl Executor for SqliteExecutor {
    fn execute(&self, statement: &str, params: &[Value]) -> anyhow::Result<Vec<Row>> {
        debug!(statement, params = params.len(), "executing");
        let mut stmt = self.conn.prepare(statement)?;
        let names: Vec<String> = stmt.column_names().into_iter().map(String::from).collect();
        let bound: Vec<SqlValue> = params.iter().map(to_sqlite).collect();

        let mut rows = stmt.query(params_from_iter(bound.iter()))?;
        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut map = Map::new();
            for (idx, name) in names.iter().enumerate() {
                map.insert(name.clone(), to_json(row.get_ref(idx)?));
            }
            out.push(map);
        }
        Ok(out)
    }
}

fn to_sqlite(value: &Value) -> SqlValue {
    match value {
        Value::Bool(Some(v)) => SqlValue::Integer(i64::from(*v)),
        Value::TinyInt(Some(v)) => SqlValue::Integer(i64::from(*v)),
        Value::SmallInt(Some(v)) => SqlValue::Integer(i64::from(*v)),
        Value::Int(Some(v)) => SqlValue::Integer(i64::from(*v)),
        Value::BigInt(Some(v)) => SqlValue::Integer(*v),
        Value::TinyUnsigned(Some(v)) => SqlValue::Integer(i64::from(*v)),
        Value::SmallUnsigned(Some(v)) => SqlValue::Integer(i64::from(*v)),
        Value::Unsigned(Some(v)) => SqlValue::Integer(i64::from(*v)),
        Value::BigUnsigned(Some(v)) => match i64::try_from(*v) {
            Ok(v) => SqlValue::Integer(v),
            Err(_) => SqlValue::Real(*v as f64),
        },
        Value::Float(Some(v)) => SqlValue::Real(f64::from(*v)),
        Value::Double(Some(v)) => SqlValue::Real(*v),
        Value::String(Some(v)) => SqlValue::Text((**v).clone()),
        Value::Char(Some(v)) => SqlValue::Text(v.to_string()),
        Value::Bytes(Some(v)) => SqlValue::Blob((**v).clone()),
        _ => SqlValue::Null,
    }
}

fn to_json(value: ValueRef<'_>) -> JsonValue {
    match value {
        ValueRef::Null => JsonValue::Null,
        ValueRef::Integer(v) => json!(v),
        ValueRef::Real(v) => json!(v),
        ValueRef::Text(v) => JsonValue::String(String::from_utf8_lossy(v).into_owned()),
        ValueRef::Blob(v) => json!(v),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn executor() -> SqliteExecutor {
        let executor = SqliteExecutor::open_in_memory().unwrap();
        executor
            .connection()
            .execute_batch(
                r#"
                CREATE TABLE "Referenda" (id INTEGER PRIMARY KEY, status TEXT, amount REAL);
                INSERT INTO "Referenda" VALUES (1, 'Executed', 10.5), (2, 'Rejected', NULL), (3, 'Executed', 4.0);
                CREATE VIEW "Executed Referenda" AS SELECT * FROM "Referenda" WHERE status = 'Executed';
                "#,
            )
            .unwrap();
        executor
    }

    #[test]
    fn test_positional_binding() {
        let rows = executor()
            .execute(
                r#"SELECT "id", "amount" FROM "Referenda" WHERE "status" = ? AND "amount" > ? ORDER BY "id""#,
                &[Value::from("Executed"), Value::Double(Some(5.0))],
            )
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["id"], json!(1));
        assert_eq!(rows[0]["amount"], json!(10.5));
    }

    #[test]
    fn test_nulls_become_json_null() {
        let rows = executor()
            .execute(r#"SELECT "amount" FROM "Referenda" WHERE "id" = ?"#, &[Value::BigInt(Some(2))])
            .unwrap();
        assert_eq!(rows[0]["amount"], JsonValue::Null);
    }

    #[test]
    fn test_driver_errors_are_opaque() {
        let err = run(&executor(), "SELECT nope FROM nowhere", &[]).unwrap_err();
        assert!(matches!(err, QueryError::ExecutionFailed(_)));
        assert_eq!(err.status_code(), 500);
    }

    #[test]
    fn test_introspect_schema() {
        let schema = executor().introspect_schema().unwrap();
        assert_eq!(
            schema.table_names(),
            vec!["Executed Referenda".to_string(), "Referenda".to_string()]
        );
        let referenda = schema.table("Referenda").unwrap();
        assert_eq!(referenda.columns[0], ColumnDef::new("id", ColumnKind::Integer));
        assert_eq!(referenda.columns[2], ColumnDef::new("amount", ColumnKind::Real));
    }
}
