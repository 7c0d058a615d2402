//! SELECT generation.

use crate::ast::Expr;
use crate::config::GeneratorConfig;
use crate::error::GenResult;
use crate::fragment::{ColumnFragment, Input, SelectStatement};
use crate::generator::{Generator, Lowered};
use crate::optimizer;
use crate::statement::GeneratedCommand;

pub fn build_select(root: &Expr, config: &GeneratorConfig) -> GenResult<GeneratedCommand> {
    let mut g = Generator::new(config, "select");
    let root = match g.lower(root)? {
        Lowered::Input(id) if matches!(g.arena.get(id), Input::Select(_) | Input::Union(_)) => id,
        Lowered::Input(id) => g
            .arena
            .alloc(Input::Select(SelectStatement::from_input(id))),
        // A bare scalar query: SELECT <value>
        Lowered::Scalar(value) => g.arena.alloc(Input::Select(SelectStatement {
            columns: vec![ColumnFragment::computed(value)],
            ..Default::default()
        })),
    };

    optimizer::fuse_tree(&mut g.arena, root);
    optimizer::flatten_group_by(&mut g.arena, root);

    let sql = g.writer().query(root);
    Ok(GeneratedCommand::text(g, sql))
}
