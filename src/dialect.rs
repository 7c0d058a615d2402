//! Text conventions of the target dialect.

use serde::{Deserialize, Serialize};

use crate::ast::{PrimitiveKind, Value};
use crate::config::DialectConfig;

/// Hooks the SQL writer and lowering visitor go through for dialect-specific text.
pub trait SqlDialect {
    fn quote_identifier(&self, name: &str) -> String;

    /// Name of the `index`-th generated parameter (1-based).
    fn parameter_name(&self, index: usize) -> String;

    /// Reference to a named command parameter.
    fn parameter_ref(&self, name: &str) -> String;

    fn bool_literal(&self, value: bool) -> String;

    /// Escape a literal so it matches verbatim inside a single-quoted LIKE pattern.
    fn escape_like(&self, value: &str) -> String;

    /// Schema-qualified, quoted table name. The default schema is left out.
    fn table_name(&self, schema: Option<&str>, table: &str) -> String;

    /// Pseudo column numbering result rows.
    fn row_index(&self) -> &str;
}

/// The Xugu dialect, driven by [`DialectConfig`].
#[derive(Debug, Clone, Default)]
pub struct XuguDialect {
    config: DialectConfig,
}

impl XuguDialect {
    pub fn new(config: DialectConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DialectConfig {
        &self.config
    }
}

impl SqlDialect for XuguDialect {
    fn quote_identifier(&self, name: &str) -> String {
        let q = &self.config.identifier_quote;
        format!("{}{}{}", q, name.replace(q.as_str(), &q.repeat(2)), q)
    }

    fn parameter_name(&self, index: usize) -> String {
        format!(
            "{}{}{}",
            self.config.parameter_prefix, self.config.parameter_stem, index
        )
    }

    fn parameter_ref(&self, name: &str) -> String {
        format!("{}{}", self.config.parameter_prefix, name)
    }

    fn bool_literal(&self, value: bool) -> String {
        if value { "1".to_string() } else { "0".to_string() }
    }

    fn escape_like(&self, value: &str) -> String {
        value
            .replace('\\', "\\\\\\\\")
            .replace('\'', "\\'")
            .replace('\0', "\\0")
            .replace('%', "\\%")
            .replace('_', "\\_")
    }

    fn table_name(&self, schema: Option<&str>, table: &str) -> String {
        match schema {
            Some(s) if !s.is_empty() && s != self.config.default_schema => {
                format!("{}.{}", self.quote_identifier(s), self.quote_identifier(table))
            }
            _ => self.quote_identifier(table),
        }
    }

    fn row_index(&self) -> &str {
        &self.config.row_index
    }
}

/// Provider type of a bound parameter.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DbType {
    Binary,
    Boolean,
    Byte,
    SByte,
    Int16,
    Int32,
    Int64,
    Single,
    Double,
    Decimal,
    String,
    DateTime,
    DateTimeOffset,
    Time,
    Guid,
}

impl From<PrimitiveKind> for DbType {
    fn from(kind: PrimitiveKind) -> Self {
        match kind {
            PrimitiveKind::Binary => DbType::Binary,
            PrimitiveKind::Boolean => DbType::Boolean,
            PrimitiveKind::Byte => DbType::Byte,
            PrimitiveKind::SByte => DbType::SByte,
            PrimitiveKind::Int16 => DbType::Int16,
            PrimitiveKind::Int32 => DbType::Int32,
            PrimitiveKind::Int64 => DbType::Int64,
            PrimitiveKind::Single => DbType::Single,
            PrimitiveKind::Double => DbType::Double,
            PrimitiveKind::Decimal => DbType::Decimal,
            PrimitiveKind::String => DbType::String,
            PrimitiveKind::DateTime => DbType::DateTime,
            PrimitiveKind::DateTimeOffset => DbType::DateTimeOffset,
            PrimitiveKind::Time => DbType::Time,
            PrimitiveKind::Guid => DbType::Guid,
        }
    }
}

/// Normalize a constant for binding: GUID text becomes a GUID.
pub fn normalize_value(kind: PrimitiveKind, value: &Value) -> Value {
    match (kind, value) {
        (PrimitiveKind::Guid, Value::String(s)) => match uuid::Uuid::parse_str(s) {
            Ok(g) => Value::Guid(g),
            Err(_) => value.clone(),
        },
        _ => value.clone(),
    }
}
