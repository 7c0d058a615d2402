//! UPDATE generation.

use std::collections::HashSet;

use crate::ast::{Binding, Expr, SetClause};
use crate::config::GeneratorConfig;
use crate::dialect::SqlDialect;
use crate::error::{GenResult, SqlGenError};
use crate::fragment::{BinaryFragment, Fragment};
use crate::generator::Generator;
use crate::statement::{
    GeneratedCommand, dml_target, returning_select, row_count_check, set_column, target_name,
};

/// `UPDATE "T" SET "a" = x WHERE p`, optionally followed by a select reading
/// the updated row back.
///
/// With no set clauses only the read-back select is produced.
pub fn build_update(
    target: &Binding,
    set_clauses: &[SetClause],
    predicate: &Expr,
    returning: Option<&Expr>,
    config: &GeneratorConfig,
) -> GenResult<GeneratedCommand> {
    let mut g = Generator::new(config, "update");
    let table = dml_target(&mut g, target)?;

    let mut assignments = Vec::with_capacity(set_clauses.len());
    for clause in set_clauses {
        let column = set_column(&mut g, &clause.property)?;
        let value = g.scalar(&clause.value)?;
        assignments.push((column, value));
    }
    let lowered_predicate = g.scalar(predicate)?;

    let returning = match returning {
        Some(r) => {
            let mut stale: HashSet<String> = assignments.iter().map(|(c, _)| c.clone()).collect();
            if let Some(t) = g.arena.table(table) {
                stale.extend(
                    t.entity
                        .properties
                        .iter()
                        .filter(|p| p.is_server_generated())
                        .map(|p| p.name.clone()),
                );
            }
            let relocate = match strip_stale(predicate, &stale) {
                Some(p) => Some(g.scalar(&p)?),
                None => None,
            };
            let locate = if assignments.is_empty() {
                relocate.unwrap_or_else(|| Fragment::literal("1 = 1"))
            } else {
                let guard = row_count_check(&g);
                match relocate {
                    Some(p) => {
                        let wrap = matches!(&p, Fragment::Binary(b) if b.op == "OR");
                        let mut b = BinaryFragment::new(guard, "AND", p);
                        b.wrap_right = wrap;
                        Fragment::Binary(b)
                    }
                    None => guard,
                }
            };
            Some(returning_select(&mut g, table, r, locate)?)
        }
        None => None,
    };

    let writer = g.writer();
    let mut sql = String::new();
    if !assignments.is_empty() {
        sql.push_str("UPDATE ");
        sql.push_str(&target_name(&g, table)?);
        sql.push_str(" SET ");
        sql.push_str(
            &assignments
                .iter()
                .map(|(c, v)| format!("{} = {}", g.dialect.quote_identifier(c), writer.fragment(v)))
                .collect::<Vec<_>>()
                .join(", "),
        );
        sql.push_str(" WHERE ");
        sql.push_str(&writer.fragment(&lowered_predicate));
    }
    match returning {
        Some(select) => {
            if !sql.is_empty() {
                sql.push_str(";\n");
            }
            sql.push_str(&writer.query(select));
        }
        None if sql.is_empty() => {
            return Err(SqlGenError::malformed("set clauses or returning", target));
        }
        None => {}
    }
    Ok(GeneratedCommand::text(g, sql))
}

/// The predicate without comparisons on `stale` properties, whose
/// pre-update values no longer identify the row.
fn strip_stale(predicate: &Expr, stale: &HashSet<String>) -> Option<Expr> {
    match predicate {
        Expr::And(left, right) => match (strip_stale(left, stale), strip_stale(right, stale)) {
            (Some(l), Some(r)) => Some(Expr::And(Box::new(l), Box::new(r))),
            (kept, None) | (None, kept) => kept,
        },
        Expr::Comparison { left, right, .. }
            if touches(left, stale) || touches(right, stale) =>
        {
            None
        }
        other => Some(other.clone()),
    }
}

fn touches(e: &Expr, stale: &HashSet<String>) -> bool {
    match e {
        Expr::Property { instance, property } => {
            matches!(instance.as_ref(), Expr::VariableRef(_)) && stale.contains(property)
        }
        _ => false,
    }
}
