//! Statement values and classification.
//!
//! A [`Statement`] is an immutable pair of SQL text and positional scalar
//! parameters, in the MySQL calling convention the application was written
//! against. Classification uses [sqlparser](https://docs.rs/sqlparser/) with
//! the MySQL dialect; statements it cannot parse (legacy function spellings,
//! fragments) fall back to a keyword scan so classification is total.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use sqlparser::ast::Statement as Ast;
use sqlparser::dialect::MySqlDialect;
use sqlparser::parser::Parser;

/// A parameter value for `?`-style positional placeholders.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QueryParam {
    /// NULL value
    Null,
    /// Boolean value
    Bool(bool),
    /// Integer value (stored as i64 for maximum range)
    Int(i64),
    /// Floating point value
    Float(f64),
    /// String value (dates travel as formatted strings, as in the legacy client)
    String(String),
}

impl QueryParam {
    /// Check if this parameter is null.
    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Get the type name of this parameter for debugging.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
        }
    }
}

impl From<i64> for QueryParam {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<f64> for QueryParam {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<bool> for QueryParam {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<&str> for QueryParam {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<String> for QueryParam {
    fn from(v: String) -> Self {
        Self::String(v)
    }
}

/// An immutable (text, positional parameters) pair.
#[derive(Debug, Clone, PartialEq)]
pub struct Statement {
    pub sql: String,
    pub params: Vec<QueryParam>,
}

impl Statement {
    /// Create a statement with no parameters.
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            sql: sql.into(),
            params: Vec::new(),
        }
    }

    /// Create a statement with positional parameters.
    pub fn with_params(sql: impl Into<String>, params: Vec<QueryParam>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    /// Classify this statement's text.
    pub fn kind(&self) -> StatementKind {
        classify(&self.sql)
    }
}

/// Coarse statement category driving translation and result shaping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StatementKind {
    /// SELECT and other row-returning reads.
    Select,
    /// INSERT, with the target table name when it could be parsed.
    Insert { table: Option<String> },
    /// UPDATE, DELETE and other writes.
    Write,
    /// BEGIN, COMMIT, ROLLBACK, SAVEPOINT, START TRANSACTION.
    TransactionControl,
    /// Anything else (SET, DDL, unparseable text).
    Other,
}

impl StatementKind {
    pub fn is_insert(&self) -> bool {
        matches!(self, Self::Insert { .. })
    }

    pub fn is_transaction_control(&self) -> bool {
        matches!(self, Self::TransactionControl)
    }
}

static INSERT_TABLE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^\s*INSERT\s+INTO\s+`?([A-Za-z_][A-Za-z0-9_]*)`?")
        .expect("valid insert table regex")
});

/// Classify SQL text into a [`StatementKind`]. Total: never errors.
pub fn classify(sql: &str) -> StatementKind {
    match Parser::parse_sql(&MySqlDialect {}, sql) {
        Ok(statements) if !statements.is_empty() => match &statements[0] {
            Ast::Query(_) => StatementKind::Select,
            Ast::Insert(_) => StatementKind::Insert {
                table: insert_table_name(sql),
            },
            Ast::Update { .. } | Ast::Delete(_) => StatementKind::Write,
            Ast::StartTransaction { .. }
            | Ast::Commit { .. }
            | Ast::Rollback { .. }
            | Ast::Savepoint { .. }
            | Ast::ReleaseSavepoint { .. } => StatementKind::TransactionControl,
            _ => StatementKind::Other,
        },
        // The MySQL-dialect call sites use function spellings sqlparser may
        // reject; fall back to a leading-keyword scan.
        _ => classify_by_keyword(sql),
    }
}

fn classify_by_keyword(sql: &str) -> StatementKind {
    let head: String = sql
        .trim_start()
        .chars()
        .take_while(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_ascii_uppercase();

    match head.as_str() {
        "SELECT" | "SHOW" | "EXPLAIN" | "DESCRIBE" | "WITH" => StatementKind::Select,
        "INSERT" => StatementKind::Insert {
            table: insert_table_name(sql),
        },
        "UPDATE" | "DELETE" => StatementKind::Write,
        "BEGIN" | "COMMIT" | "ROLLBACK" | "SAVEPOINT" | "START" => {
            StatementKind::TransactionControl
        }
        _ => StatementKind::Other,
    }
}

/// Extract the target table of an INSERT. None when the text is not in the
/// well-known `INSERT INTO <table>` form; callers degrade to the default
/// identifier column.
pub fn insert_table_name(sql: &str) -> Option<String> {
    INSERT_TABLE_RE
        .captures(sql)
        .map(|caps| caps[1].to_ascii_lowercase())
}
