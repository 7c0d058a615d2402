//! Statement tests, grouped by category.

mod functions;
mod query;

use crate::ast::builders::*;
use crate::ast::{CommandTree, EntitySet, Expr, PrimitiveKind, Property, StoreGenerated};
use crate::config::GeneratorConfig;
use crate::error::GenResult;
use crate::statement::{GeneratedCommand, generate};

/// `Users(Id identity key, Name, Age)`.
fn users() -> EntitySet {
    let mut set = entity_set(
        "Users",
        entity(
            "User",
            &[
                ("Id", PrimitiveKind::Int32),
                ("Name", PrimitiveKind::String),
                ("Age", PrimitiveKind::Int32),
            ],
            &["Id"],
        ),
    );
    set.element.properties[0] =
        Property::new("Id", PrimitiveKind::Int32).generated(StoreGenerated::Identity);
    set
}

/// `Orders(Id key, UserId, Total)`.
fn orders() -> EntitySet {
    entity_set(
        "Orders",
        entity(
            "Order",
            &[
                ("Id", PrimitiveKind::Int32),
                ("UserId", PrimitiveKind::Int32),
                ("Total", PrimitiveKind::Decimal),
            ],
            &["Id"],
        ),
    )
}

fn run(tree: &CommandTree) -> GenResult<GeneratedCommand> {
    generate(tree, &GeneratorConfig::default())
}

fn query(root: Expr) -> GeneratedCommand {
    run(&CommandTree::Query(root)).unwrap()
}

fn sql(root: Expr) -> String {
    query(root).sql
}
