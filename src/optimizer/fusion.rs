//! Select fusion: fold a wrapping select into its inner select.
//!
//! ```text
//! SELECT * FROM (SELECT t.a AS x FROM T AS t WHERE p) AS s WHERE s.x = 1
//!   → SELECT s.a AS x FROM T AS s WHERE p AND s.a = 1
//! ```

use std::collections::HashMap;

use tracing::trace;

use crate::fragment::{Arena, ColumnFragment, Fragment, InputId, SelectStatement};

/// Whether `outer`'s clauses can be evaluated together with `inner`'s in one select.
/// An inner skip or limit numbers its own rows and is never merged.
fn compatible(inner: &SelectStatement, outer: &SelectStatement) -> bool {
    if inner.distinct != outer.distinct || inner.limit.is_some() || inner.skip.is_some() {
        return false;
    }
    if outer.where_clause.is_some() && !inner.group_by.is_empty() {
        return false;
    }
    if !outer.group_by.is_empty() && (!inner.group_by.is_empty() || !inner.order_by.is_empty()) {
        return false;
    }
    outer.order_by.is_empty() || inner.order_by.is_empty()
}

/// Fuse the select `id` with the select in its `FROM` when that select reads a
/// plain table. Returns whether anything changed.
pub fn try_fuse(arena: &mut Arena, id: InputId) -> bool {
    let Some(outer) = arena.select(id) else {
        return false;
    };
    let Some(inner_id) = outer.from.filter(|_| outer.columns.is_empty()) else {
        return false;
    };
    let Some(inner) = arena.select(inner_id) else {
        return false;
    };
    let Some(table_id) = inner.from else {
        return false;
    };
    let Some(table) = arena.table(table_id) else {
        return false;
    };
    let Some(new_name) = inner.name.clone() else {
        return false;
    };
    let old_name = table.name.clone();
    let own_columns = inner
        .output_columns()
        .iter()
        .all(|c| c.literal.is_none() && c.table == old_name);
    if !own_columns || !compatible(inner, outer) {
        return false;
    }

    let inner = inner.clone();
    let renames: HashMap<String, ColumnFragment> = inner
        .output_columns()
        .iter()
        .filter_map(|c| Some((c.output_name()?.to_string(), c.clone())))
        .collect();
    let Some(slot) = arena.select_mut(id) else {
        return false;
    };
    let mut outer = std::mem::take(slot);
    let old = old_name.as_deref();
    let rename = |arena: &mut Arena, f: &mut Fragment| {
        arena.replace_table_name(f, old, &new_name, Some(&renames));
    };

    arena.set_name(table_id, Some(new_name.clone()));
    outer.from = Some(table_id);
    outer.default_columns = inner
        .output_columns()
        .iter()
        .map(|c| ColumnFragment {
            table: Some(new_name.clone()),
            ..c.clone()
        })
        .collect();
    outer.where_clause = match (inner.where_clause, outer.where_clause.take()) {
        (Some(i), Some(o)) => Some(Fragment::and(i, o)),
        (i, o) => i.or(o),
    };
    if outer.group_by.is_empty() {
        outer.group_by = inner.group_by;
    }
    if outer.order_by.is_empty() {
        outer.order_by = inner.order_by;
    }
    for f in outer
        .where_clause
        .iter_mut()
        .chain(outer.limit.iter_mut())
        .chain(outer.skip.iter_mut())
        .chain(outer.group_by.iter_mut())
        .chain(outer.order_by.iter_mut().map(|o| &mut o.expr))
    {
        rename(arena, f);
    }

    if let Some(slot) = arena.select_mut(id) {
        *slot = outer;
    }
    trace!(outer = ?id, inner = ?inner_id, table = %new_name, "fused select");
    true
}

/// Fuse the root select until it no longer reads a fusable select.
pub fn fuse_tree(arena: &mut Arena, root: InputId) {
    while try_fuse(arena, root) {}
}
