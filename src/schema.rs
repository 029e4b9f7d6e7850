//! Read-only view of the table registry the compiler validates against.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

/// Coarse column type, only used to decide aggregate eligibility.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ColumnKind {
    Integer,
    Real,
    Numeric,
    Text,
    Date,
    Boolean,
    /// The registry did not declare a type; every aggregate is allowed.
    #[default]
    Unknown,
}

impl ColumnKind {
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            ColumnKind::Integer | ColumnKind::Real | ColumnKind::Numeric | ColumnKind::Unknown
        )
    }

    /// Maps a SQLite declared type onto a kind, following SQLite's affinity
    /// rules with a couple of extra buckets for dates and booleans.
    pub fn from_sqlite_decl(decl: &str) -> Self {
        let decl = decl.to_ascii_uppercase();
        if decl.is_empty() || decl.contains("BLOB") {
            ColumnKind::Unknown
        } else if decl.contains("INT") {
            ColumnKind::Integer
        } else if decl.contains("CHAR") || decl.contains("CLOB") || decl.contains("TEXT") {
            ColumnKind::Text
        } else if decl.contains("REAL") || decl.contains("FLOA") || decl.contains("DOUB") {
            ColumnKind::Real
        } else if decl.contains("BOOL") {
            ColumnKind::Boolean
        } else if decl.contains("DATE") || decl.contains("TIME") {
            ColumnKind::Date
        } else {
            ColumnKind::Numeric
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "ColumnEntry")]
pub struct ColumnDef {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: ColumnKind,
}

impl ColumnDef {
    pub fn new(name: impl Into<String>, kind: ColumnKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }
}

/// Columns may be listed as bare names or as `{ "name", "type" }` objects.
#[derive(Deserialize)]
#[serde(untagged)]
enum ColumnEntry {
    Name(String),
    Typed {
        name: String,
        #[serde(rename = "type", default)]
        kind: ColumnKind,
    },
}

impl From<ColumnEntry> for ColumnDef {
    fn from(entry: ColumnEntry) -> Self {
        match entry {
            ColumnEntry::Name(name) => ColumnDef::new(name, ColumnKind::Unknown),
            ColumnEntry::Typed { name, kind } => ColumnDef::new(name, kind),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TableSchema {
    pub columns: Vec<ColumnDef>,
}

impl TableSchema {
    pub fn new(columns: Vec<ColumnDef>) -> Self {
        Self { columns }
    }

    pub fn column_names(&self) -> Vec<String> {
        self.columns.iter().map(|c| c.name.clone()).collect()
    }
}

/// The external table registry. Implementations must be safe to read from
/// many compilations at once; the compiler never mutates it.
pub trait SchemaRegistry {
    fn table(&self, name: &str) -> Option<&TableSchema>;

    fn table_names(&self) -> Vec<String>;

    /// Legal column names of `name`, or `None` if the table is not registered.
    fn table_columns(&self, name: &str) -> Option<Vec<String>> {
        self.table(name).map(TableSchema::column_names)
    }
}

/// A registry backed by an in-memory map, usually loaded from JSON.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StaticSchema {
    tables: BTreeMap<String, TableSchema>,
}

impl StaticSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_table(mut self, name: impl Into<String>, columns: Vec<ColumnDef>) -> Self {
        self.insert(name, columns);
        self
    }

    pub fn insert(&mut self, name: impl Into<String>, columns: Vec<ColumnDef>) {
        self.tables.insert(name.into(), TableSchema::new(columns));
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl SchemaRegistry for StaticSchema {
    fn table(&self, name: &str) -> Option<&TableSchema> {
        self.tables.get(name)
    }

    fn table_names(&self) -> Vec<String> {
        self.tables.keys().cloned().collect()
    }
}

/// The set of column references legal in one query: source columns (bare and
/// table-qualified) plus every joined table's columns qualified by its alias
/// or table name.
///
/// A bare source column whose name also appears in a joined table is emitted
/// in its source-qualified form, so the statement stays unambiguous.
#[derive(Debug, Clone, Default)]
pub struct ColumnUniverse {
    columns: HashMap<String, ColumnKind>,
    qualified: HashMap<String, String>,
}

impl ColumnUniverse {
    pub fn new() -> Self {
        Self::default()
    }

    /// A flat allow-list with no type information.
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let columns = names
            .into_iter()
            .map(|n| (n.into(), ColumnKind::Unknown))
            .collect();
        Self {
            columns,
            qualified: HashMap::new(),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, kind: ColumnKind) {
        self.columns.insert(name.into(), kind);
    }

    /// Adds every column of `table`, prefixed with `qualifier.` when given.
    pub fn extend_from_table(&mut self, table: &TableSchema, qualifier: Option<&str>) {
        for column in &table.columns {
            let name = match qualifier {
                Some(q) => format!("{}.{}", q, column.name),
                None => column.name.clone(),
            };
            self.columns.insert(name, column.kind);
        }
    }

    /// Emits the bare column `name` as `qualifier.name` from now on.
    pub fn qualify(&mut self, name: &str, qualifier: &str) {
        self.qualified
            .insert(name.to_string(), format!("{}.{}", qualifier, name));
    }

    /// The reference to write into the statement for a validated `name`.
    pub fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.qualified.get(name).map_or(name, String::as_str)
    }

    /// Exact, case-sensitive membership.
    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn kind(&self, name: &str) -> Option<ColumnKind> {
        self.columns.get(name).copied()
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }
}
