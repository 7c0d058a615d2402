//! INSERT generation.

use std::collections::HashMap;

use crate::ast::{Binding, Expr, PrimitiveKind, Property, SetClause};
use crate::config::GeneratorConfig;
use crate::dialect::SqlDialect;
use crate::error::{GenResult, SqlGenError};
use crate::fragment::{BinaryFragment, ColumnFragment, Fragment, InputId};
use crate::generator::Generator;
use crate::statement::{
    GeneratedCommand, dml_target, returning_select, row_count_check, set_column, target_name,
};

/// `INSERT INTO "T"("a", "b") VALUES (x, y)`, optionally followed by a
/// select reading the inserted row back.
pub fn build_insert(
    target: &Binding,
    set_clauses: &[SetClause],
    returning: Option<&Expr>,
    config: &GeneratorConfig,
) -> GenResult<GeneratedCommand> {
    let mut g = Generator::new(config, "insert");
    let table = dml_target(&mut g, target)?;

    let mut columns = Vec::with_capacity(set_clauses.len());
    let mut values = Vec::with_capacity(set_clauses.len());
    let mut assigned = HashMap::new();
    for clause in set_clauses {
        let column = set_column(&mut g, &clause.property)?;
        let value = g.scalar(&clause.value)?;
        if !matches!(clause.value, Expr::Null) {
            assigned.insert(column.clone(), value.clone());
        }
        columns.push(column);
        values.push(value);
    }

    let returning = match returning {
        Some(r) => {
            let locate = locate_inserted(&g, table, &assigned)?;
            Some(returning_select(&mut g, table, r, locate)?)
        }
        None => None,
    };

    let writer = g.writer();
    let mut sql = String::from("INSERT INTO ");
    sql.push_str(&target_name(&g, table)?);
    sql.push('(');
    sql.push_str(
        &columns
            .iter()
            .map(|c| g.dialect.quote_identifier(c))
            .collect::<Vec<_>>()
            .join(", "),
    );
    sql.push_str(") VALUES (");
    sql.push_str(
        &values
            .iter()
            .map(|v| writer.fragment(v))
            .collect::<Vec<_>>()
            .join(", "),
    );
    sql.push(')');
    if let Some(select) = returning {
        sql.push_str(";\n");
        sql.push_str(&writer.query(select));
    }
    Ok(GeneratedCommand::text(g, sql))
}

/// Re-locate the inserted row: every key member equals its assigned value,
/// except a server generated key, which is read from the identity source.
fn locate_inserted(
    g: &Generator,
    table: InputId,
    assigned: &HashMap<String, Fragment>,
) -> GenResult<Fragment> {
    let Some(t) = g.arena.table(table) else {
        return Err(SqlGenError::malformed("table", g.arena.get(table)));
    };
    let mut locate = row_count_check(g);
    let mut generated = false;
    for key in t.entity.key_properties() {
        let value = match assigned.get(&key.name) {
            Some(v) if !key.is_server_generated() => v.clone(),
            _ => {
                if generated {
                    return Err(SqlGenError::AmbiguousGeneratedKey {
                        table: t.table.clone(),
                    });
                }
                generated = true;
                generated_key(g, key, &t.table)?
            }
        };
        let column = Fragment::Column(ColumnFragment::new(None, key.name.clone()));
        let test = Fragment::Binary(BinaryFragment::new(column, "=", value));
        locate = Fragment::Binary(BinaryFragment::new(locate, "AND", test));
    }
    Ok(locate)
}

fn generated_key(g: &Generator, key: &Property, table: &str) -> GenResult<Fragment> {
    let config = g.dialect.config();
    if key.kind.is_integral() {
        return Ok(Fragment::Literal(config.identity_function.clone()));
    }
    if key.kind == PrimitiveKind::Guid {
        return Ok(Fragment::Literal(format!(
            "ANY(SELECT guid FROM {}{})",
            config.guid_identity_table, table
        )));
    }
    Err(SqlGenError::unsupported(format!(
        "server generated key '{}' of kind {:?}",
        key.name, key.kind
    )))
}
