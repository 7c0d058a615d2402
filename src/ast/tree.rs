use serde::{Deserialize, Serialize};

use crate::ast::{Binding, Expr, FunctionMeta};

/// A `property := value` assignment of an insert or update.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetClause {
    /// Property expression against the target binding.
    pub property: Expr,
    pub value: Expr,
}

/// A command tree: the unit handed to [`crate::generate`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum CommandTree {
    Query(Expr),
    Insert {
        target: Binding,
        set_clauses: Vec<SetClause>,
        #[serde(default)]
        returning: Option<Expr>,
    },
    Update {
        target: Binding,
        set_clauses: Vec<SetClause>,
        predicate: Expr,
        #[serde(default)]
        returning: Option<Expr>,
    },
    Delete {
        target: Binding,
        predicate: Expr,
    },
    Function {
        function: FunctionMeta,
    },
}

impl CommandTree {
    pub fn kind(&self) -> &'static str {
        match self {
            CommandTree::Query(_) => "query",
            CommandTree::Insert { .. } => "insert",
            CommandTree::Update { .. } => "update",
            CommandTree::Delete { .. } => "delete",
            CommandTree::Function { .. } => "function",
        }
    }

    /// Parse a command tree from its JSON form.
    pub fn from_json(text: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(text)
    }
}
