//! Declarative query compiler for the treasury spending dashboard.
//!
//! A JSON query description ([`ast::QueryConfig`]) is validated against a
//! [`schema::SchemaRegistry`] and compiled into a statement with double-quoted
//! identifiers and positional `?` parameters. [`facets`] derives per-column
//! distinct-value counts on top of the same compiler.

pub mod ast;
pub mod config;
pub mod error;
pub mod executor;
pub mod expression;
pub mod facets;
pub mod filter_compiler;
pub mod fragment;
pub mod identifier;
pub mod lexer;
pub mod schema;
pub mod sql_compiler;
pub mod token;

pub use ast::{FilterCondition, FilterGroup, Filters, QueryConfig};
pub use config::{CompilerConfig, ExpressionPolicy, SchemaConfig};
pub use error::{ConfigError, QueryError};
pub use executor::{execute_query, Executor, QueryResult, Row, SqliteExecutor};
pub use facets::{compute_facets, FacetEngine, FacetValue, Facets};
pub use filter_compiler::{compile_filters, CompiledFilter, FilterCompiler};
pub use schema::{ColumnUniverse, SchemaRegistry, StaticSchema};
pub use sql_compiler::{compile_query, CompiledQuery, QueryCompiler};
