//! DELETE generation.

use crate::ast::{Binding, Expr};
use crate::config::GeneratorConfig;
use crate::error::GenResult;
use crate::generator::Generator;
use crate::statement::{GeneratedCommand, dml_target, target_name};

pub fn build_delete(
    target: &Binding,
    predicate: &Expr,
    config: &GeneratorConfig,
) -> GenResult<GeneratedCommand> {
    let mut g = Generator::new(config, "delete");
    let table = dml_target(&mut g, target)?;
    let predicate = g.scalar(predicate)?;

    let mut sql = String::from("DELETE FROM ");
    sql.push_str(&target_name(&g, table)?);
    sql.push_str(" WHERE ");
    sql.push_str(&g.writer().fragment(&predicate));
    Ok(GeneratedCommand::text(g, sql))
}
