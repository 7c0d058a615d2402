//! Error types for xgsql.

use thiserror::Error;

/// The error type for command-tree lowering.
#[derive(Debug, Error, PartialEq)]
pub enum SqlGenError {
    /// A construct the Xugu dialect has no rendering for.
    #[error("{construct} is not supported in this dialect")]
    Unsupported { construct: String },

    /// An expression kind with no lowering for the statement being generated.
    #[error("{kind} is not implemented for {statement} statements")]
    NotImplemented {
        kind: &'static str,
        statement: &'static str,
    },

    /// An internal shape assumption failed.
    #[error("Malformed command tree: expected {expected}, found {found}")]
    MalformedShape { expected: &'static str, found: String },

    /// A niladic function was called with arguments.
    #[error("Niladic function '{function}' cannot have arguments")]
    NiladicArguments { function: String },

    /// More than one key member lacks a value and must be read back from the server.
    #[error("Cannot resolve more than one server generated key on '{table}'")]
    AmbiguousGeneratedKey { table: String },

    /// A property path whose prefix is not bound in any enclosing scope.
    #[error("Unbound variable in property path '{path}'")]
    UnboundVariable { path: String },

    /// Lowering exceeded the configured depth.
    #[error("Command tree nesting exceeds the maximum depth of {depth}")]
    RecursionLimit { depth: usize },
}

impl SqlGenError {
    pub fn unsupported(construct: impl Into<String>) -> Self {
        Self::Unsupported {
            construct: construct.into(),
        }
    }

    /// Shape violation carrying the offending node's debug rendering.
    pub fn malformed(expected: &'static str, found: &impl std::fmt::Debug) -> Self {
        Self::MalformedShape {
            expected,
            found: format!("{:?}", found),
        }
    }
}

/// Result type alias for lowering operations.
pub type GenResult<T> = Result<T, SqlGenError>;

/// Errors raised while loading a [`GeneratorConfig`](crate::config::GeneratorConfig).
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error reading {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid config {path}: {source}")]
    Parse {
        path: String,
        #[source]
        source: toml::de::Error,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SqlGenError::unsupported("Intersect");
        assert_eq!(err.to_string(), "Intersect is not supported in this dialect");

        let err = SqlGenError::NiladicArguments {
            function: "CURRENT_USER".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Niladic function 'CURRENT_USER' cannot have arguments"
        );
    }

    #[test]
    fn test_malformed_carries_node() {
        let err = SqlGenError::malformed("NewInstance", &vec![1, 2]);
        assert_eq!(
            err.to_string(),
            "Malformed command tree: expected NewInstance, found [1, 2]"
        );
    }
}
