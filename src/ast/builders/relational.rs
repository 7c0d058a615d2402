//! Collection-valued builders (scans, bindings, filters, projections, joins).

use crate::ast::{
    Aggregate, ApplyKind, Binding, EntitySet, EntityType, Expr, Field, FunctionMeta, GroupBinding,
    JoinKind, PrimitiveKind, Property, QuantifierKind, SortKey,
};

/// Entity type with the given scalar properties and key members.
pub fn entity(name: &str, properties: &[(&str, PrimitiveKind)], keys: &[&str]) -> EntityType {
    EntityType {
        name: name.to_string(),
        properties: properties
            .iter()
            .map(|(n, k)| Property::new(*n, *k))
            .collect(),
        keys: keys.iter().map(|k| k.to_string()).collect(),
    }
}

/// Entity set in the default `SYSDBA` container, with no annotations.
pub fn entity_set(name: &str, element: EntityType) -> EntitySet {
    EntitySet {
        name: name.to_string(),
        container: "SYSDBA".to_string(),
        schema: None,
        table: None,
        defining_query: None,
        is_view: false,
        element,
    }
}

pub fn scan(set: EntitySet) -> Expr {
    Expr::Scan(set)
}

pub fn bind(expr: Expr, var: &str) -> Binding {
    Binding {
        expr: Box::new(expr),
        var: var.to_string(),
    }
}

pub fn group_bind(expr: Expr, var: &str, group_var: &str) -> GroupBinding {
    GroupBinding {
        expr: Box::new(expr),
        var: var.to_string(),
        group_var: group_var.to_string(),
    }
}

pub fn filter(input: Binding, predicate: Expr) -> Expr {
    Expr::Filter {
        input,
        predicate: Box::new(predicate),
    }
}

/// `Project` over a row constructor with the named fields.
pub fn project(input: Binding, fields: Vec<(&str, Expr)>) -> Expr {
    Expr::Project {
        input,
        projection: Box::new(Expr::NewInstance(
            fields
                .into_iter()
                .map(|(name, value)| Field {
                    name: name.to_string(),
                    value,
                })
                .collect(),
        )),
    }
}

pub fn join(kind: JoinKind, left: Binding, right: Binding, condition: Option<Expr>) -> Expr {
    Expr::Join {
        kind,
        left,
        right,
        condition: condition.map(Box::new),
    }
}

pub fn cross_join(inputs: Vec<Binding>) -> Expr {
    Expr::CrossJoin(inputs)
}

pub fn apply(kind: ApplyKind, input: Binding, apply: Binding) -> Expr {
    Expr::Apply { kind, input, apply }
}

pub fn asc(expr: Expr) -> SortKey {
    SortKey {
        expr,
        ascending: true,
    }
}

pub fn desc(expr: Expr) -> SortKey {
    SortKey {
        expr,
        ascending: false,
    }
}

pub fn sort(input: Binding, keys: Vec<SortKey>) -> Expr {
    Expr::Sort { input, keys }
}

pub fn skip(input: Binding, keys: Vec<SortKey>, count: Expr) -> Expr {
    Expr::Skip {
        input,
        keys,
        count: Box::new(count),
    }
}

pub fn limit(argument: Expr, limit: Expr) -> Expr {
    Expr::Limit {
        argument: Box::new(argument),
        limit: Box::new(limit),
    }
}

pub fn distinct(argument: Expr) -> Expr {
    Expr::Distinct(Box::new(argument))
}

pub fn element(argument: Expr) -> Expr {
    Expr::Element(Box::new(argument))
}

pub fn union_all(left: Expr, right: Expr) -> Expr {
    Expr::UnionAll {
        left: Box::new(left),
        right: Box::new(right),
    }
}

/// Canonical aggregate (`Count`, `Sum`, ...) exposed as output property `name`.
pub fn aggregate(name: &str, function: &str, args: Vec<Expr>) -> Aggregate {
    Aggregate {
        name: name.to_string(),
        function: FunctionMeta::canonical(function),
        distinct: false,
        args,
    }
}

pub fn group_by(input: GroupBinding, keys: Vec<(&str, Expr)>, aggregates: Vec<Aggregate>) -> Expr {
    Expr::GroupBy {
        input,
        keys: keys
            .into_iter()
            .map(|(name, value)| Field {
                name: name.to_string(),
                value,
            })
            .collect(),
        aggregates,
    }
}

pub fn is_empty(argument: Expr) -> Expr {
    Expr::IsEmpty(Box::new(argument))
}

/// `Any(input, predicate)`.
pub fn any(input: Binding, predicate: Expr) -> Expr {
    Expr::Quantifier {
        kind: QuantifierKind::Any,
        input,
        predicate: Box::new(predicate),
    }
}

/// `All(input, predicate)`.
pub fn all(input: Binding, predicate: Expr) -> Expr {
    Expr::Quantifier {
        kind: QuantifierKind::All,
        input,
        predicate: Box::new(predicate),
    }
}
