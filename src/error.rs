use thiserror::Error;

/// Every way compiling or executing a query description can fail.
///
/// Validation variants carry the offending identifier or value so the HTTP
/// layer can render a precise message. None of them are recoverable inside
/// the compiler: the first one aborts the whole compile.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid identifier '{name}'")]
    InvalidIdentifier { name: String },

    #[error("unknown column '{column}'")]
    UnknownColumn { column: String },

    #[error("invalid source table '{table}'")]
    InvalidSourceTable { table: String },

    #[error("invalid join table '{table}'")]
    InvalidJoinTable { table: String },

    #[error("invalid operator '{operator}'")]
    InvalidOperator { operator: String },

    #[error("{operator} on '{column}' requires a non-empty list")]
    EmptyInList { column: String, operator: String },

    #[error("BETWEEN on '{column}' requires exactly 2 values, got {found}")]
    WrongArity { column: String, found: usize },

    #[error("{operator} on '{column}' cannot take {found}")]
    WrongValueType {
        column: String,
        operator: String,
        found: String,
    },

    #[error("filter nesting depth {depth} exceeds the limit of {max}")]
    FilterTooDeep { depth: usize, max: usize },

    #[error("filter group has {count} conditions, the limit is {max}")]
    TooManyConditions { count: usize, max: usize },

    #[error("invalid sort direction '{direction}'")]
    InvalidSortDirection { direction: String },

    #[error("offset {offset} exceeds the limit of {max}")]
    InvalidOffset { offset: u64, max: u64 },

    #[error("{function} cannot be applied to non-numeric column '{column}'")]
    NonAggregatableColumn { column: String, function: String },

    #[error("expression '{expression}' rejected at '{token}'")]
    UnsafeExpression { expression: String, token: String },

    #[error("query execution failed")]
    ExecutionFailed(#[source] anyhow::Error),
}

impl QueryError {
    /// Stable machine-readable kind, used as the `kind` field of error responses.
    pub fn kind(&self) -> &'static str {
        match self {
            QueryError::InvalidIdentifier { .. } => "InvalidIdentifier",
            QueryError::UnknownColumn { .. } => "UnknownColumn",
            QueryError::InvalidSourceTable { .. } => "InvalidSourceTable",
            QueryError::InvalidJoinTable { .. } => "InvalidJoinTable",
            QueryError::InvalidOperator { .. } => "InvalidOperator",
            QueryError::EmptyInList { .. } => "EmptyInList",
            QueryError::WrongArity { .. } => "WrongArity",
            QueryError::WrongValueType { .. } => "WrongValueType",
            QueryError::FilterTooDeep { .. } => "FilterTooDeep",
            QueryError::TooManyConditions { .. } => "TooManyConditions",
            QueryError::InvalidSortDirection { .. } => "InvalidSortDirection",
            QueryError::InvalidOffset { .. } => "InvalidOffset",
            QueryError::NonAggregatableColumn { .. } => "NonAggregatableColumn",
            QueryError::UnsafeExpression { .. } => "UnsafeExpression",
            QueryError::ExecutionFailed(_) => "ExecutionFailed",
        }
    }

    /// HTTP status class: validation failures are the caller's fault,
    /// execution failures are ours.
    pub fn status_code(&self) -> u16 {
        match self {
            QueryError::ExecutionFailed(_) => 500,
            _ => 400,
        }
    }

    pub fn is_validation(&self) -> bool {
        self.status_code() == 400
    }
}

/// Failure loading the schema/settings file.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config file not found: {0}")]
    NotFound(String),

    #[error("cannot read config file {path}: {source}")]
    Unreadable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot parse config file {path}: {source}")]
    Malformed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}
