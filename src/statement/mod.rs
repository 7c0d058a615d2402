//! Statement builders: one entry point per command-tree kind.
//!
//! [`generate`] lowers a [`CommandTree`] into SQL text plus the parameters
//! bound while lowering. Modification statements may append a "returning"
//! select that reads back the affected row.

pub mod delete;
pub mod function;
pub mod insert;
pub mod select;
pub mod update;

#[cfg(test)]
mod tests;

use serde::Serialize;
use tracing::debug;

use crate::ast::{Binding, CommandTree, Expr};
use crate::config::GeneratorConfig;
use crate::dialect::SqlDialect;
use crate::error::{GenResult, SqlGenError};
use crate::fragment::{Fragment, Input, InputId, SelectStatement};
use crate::generator::{Generator, Parameter};

/// Alias every modification target is also bound under.
pub const TARGET_ALIAS: &str = "target";

/// How the host should execute the generated text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum CommandType {
    Text,
    StoredProcedure,
}

/// SQL produced for one command tree.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeneratedCommand {
    pub sql: String,
    pub parameters: Vec<Parameter>,
    pub command_type: CommandType,
}

impl GeneratedCommand {
    pub(crate) fn text(g: Generator, sql: String) -> Self {
        Self {
            sql,
            parameters: g.into_parameters(),
            command_type: CommandType::Text,
        }
    }
}

/// Generate SQL for a command tree.
///
/// # Example
///
/// ```
/// use xgsql::ast::builders::*;
/// use xgsql::ast::{CommandTree, PrimitiveKind};
/// use xgsql::{GeneratorConfig, generate};
///
/// let users = entity_set(
///     "Users",
///     entity("User", &[("Id", PrimitiveKind::Int32), ("Name", PrimitiveKind::String)], &["Id"]),
/// );
/// let tree = CommandTree::Query(filter(bind(scan(users), "u"), eq(col("u", "Id"), int(7))));
/// let cmd = generate(&tree, &GeneratorConfig::default()).unwrap();
/// assert_eq!(cmd.sql, r#"SELECT * FROM "Users" AS "u" WHERE "u"."Id" = 7"#);
/// ```
pub fn generate(tree: &CommandTree, config: &GeneratorConfig) -> GenResult<GeneratedCommand> {
    let command = match tree {
        CommandTree::Query(root) => select::build_select(root, config)?,
        CommandTree::Insert {
            target,
            set_clauses,
            returning,
        } => insert::build_insert(target, set_clauses, returning.as_ref(), config)?,
        CommandTree::Update {
            target,
            set_clauses,
            predicate,
            returning,
        } => update::build_update(target, set_clauses, predicate, returning.as_ref(), config)?,
        CommandTree::Delete { target, predicate } => {
            delete::build_delete(target, predicate, config)?
        }
        CommandTree::Function { function } => function::build_function(function, config),
    };
    debug!(
        kind = tree.kind(),
        parameters = command.parameters.len(),
        "generated statement"
    );
    Ok(command)
}

/// Bind the scanned target table under its variable and [`TARGET_ALIAS`].
/// The table stays unnamed so its columns render unqualified.
pub(crate) fn dml_target(g: &mut Generator, target: &Binding) -> GenResult<InputId> {
    let Expr::Scan(set) = target.expr.as_ref() else {
        return Err(SqlGenError::NotImplemented {
            kind: target.expr.kind_name(),
            statement: g.statement,
        });
    };
    let table = g.scan(set);
    g.scope.bind(TARGET_ALIAS, table);
    g.scope.bind(&target.var, table);
    Ok(table)
}

/// Quoted, schema-qualified name of the target table.
pub(crate) fn target_name(g: &Generator, table: InputId) -> GenResult<String> {
    match g.arena.get(table) {
        Input::Table(t) => Ok(g.dialect.table_name(t.schema.as_deref(), &t.table)),
        other => Err(SqlGenError::malformed("table", other)),
    }
}

/// Column name assigned by a set clause.
pub(crate) fn set_column(g: &mut Generator, property: &Expr) -> GenResult<String> {
    match g.scalar(property)? {
        Fragment::Column(c) if c.literal.is_none() => c
            .name
            .ok_or_else(|| SqlGenError::malformed("named column", property)),
        other => Err(SqlGenError::malformed("property column", &other)),
    }
}

/// `SELECT <returning> FROM <target> WHERE <locate>`.
pub(crate) fn returning_select(
    g: &mut Generator,
    table: InputId,
    returning: &Expr,
    locate: Fragment,
) -> GenResult<InputId> {
    let Expr::NewInstance(fields) = returning else {
        return Err(SqlGenError::malformed("NewInstance", returning));
    };
    let mut select = SelectStatement::from_input(table);
    select.columns = g.new_instance(fields)?;
    select.where_clause = Some(locate);
    Ok(g.arena.alloc(Input::Select(select)))
}

/// `row_count() > 0`, the guard in front of every re-location predicate.
pub(crate) fn row_count_check(g: &Generator) -> Fragment {
    Fragment::Literal(g.dialect.config().row_count_check.clone())
}
