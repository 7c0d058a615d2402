//! Group-by flattening.
//!
//! An aggregate over a grouping is sometimes lowered as a distinct key list
//! with one correlated subquery per key:
//!
//! ```text
//! SELECT k.Key, (SELECT COUNT(t2.Id) FROM T AS t2 WHERE t2.Key = k.Key)
//! FROM (SELECT DISTINCT t.Key FROM T AS t WHERE p) AS k
//! ```
//!
//! When both levels read the same table this collapses to
//!
//! ```text
//! SELECT t.Key, COUNT(t.Id) FROM T AS t WHERE p GROUP BY t.Key
//! ```
//!
//! The aggregate's own predicate, apart from the correlation, must restate
//! `p`; otherwise the grouped count would cover fewer rows. Only this exact
//! shape is recognized.

use tracing::trace;

use crate::fragment::{Arena, BinaryFragment, ColumnFragment, Fragment, InputId, SelectStatement};

fn bare(s: &SelectStatement) -> bool {
    s.group_by.is_empty() && s.order_by.is_empty() && s.limit.is_none() && s.skip.is_none()
}

struct Shape {
    table: InputId,
    key: ColumnFragment,
    key_alias: Option<String>,
    function: Fragment,
    function_alias: Option<String>,
    where_clause: Option<Fragment>,
    /// Aggregate predicate besides the correlation; must restate `where_clause`.
    aggregate_filter: Option<Fragment>,
    correlated_table: Option<String>,
}

fn recognize(arena: &Arena, root: InputId) -> Option<Shape> {
    let outer = arena.select(root)?;
    if !bare(outer) || outer.distinct || outer.where_clause.is_some() || outer.columns.len() != 2 {
        return None;
    }

    let keys_id = outer.from?;
    let keys = arena.select(keys_id)?;
    let keys_name = keys.name.as_deref()?;
    let [key] = keys.columns.as_slice() else {
        return None;
    };
    if !keys.distinct || !bare(keys) || key.literal.is_some() {
        return None;
    }
    let table_id = keys.from?;
    let table = arena.table(table_id)?;
    let key_output = key.output_name()?;

    let projected_key = &outer.columns[0];
    if projected_key.literal.is_some()
        || projected_key.table.as_deref() != Some(keys_name)
        || projected_key.name.as_deref() != Some(key_output)
    {
        return None;
    }

    let Fragment::Query(aggregate_id) = outer.columns[1].literal.as_deref()? else {
        return None;
    };
    let aggregate = arena.select(*aggregate_id)?;
    let [function] = aggregate.columns.as_slice() else {
        return None;
    };
    if !bare(aggregate) || aggregate.distinct {
        return None;
    }
    let function_fragment = function.literal.as_deref()?;
    if !matches!(function_fragment, Fragment::Function { .. }) {
        return None;
    }
    let correlated = arena.table(aggregate.from?)?;
    if correlated.table != table.table || correlated.schema != table.schema {
        return None;
    }

    let (correlation, filter) = match &aggregate.where_clause {
        Some(Fragment::Binary(b)) if b.op == "AND" && !b.negated => {
            if correlates(&b.right, correlated.name.as_deref(), key, keys_name, key_output) {
                (b.right.as_ref(), Some(b.left.as_ref()))
            } else {
                (b.left.as_ref(), Some(b.right.as_ref()))
            }
        }
        Some(w) => (w, None),
        None => return None,
    };
    if !correlates(correlation, correlated.name.as_deref(), key, keys_name, key_output) {
        return None;
    }

    Some(Shape {
        table: table_id,
        key: ColumnFragment {
            alias: None,
            origin: Vec::new(),
            ..key.clone()
        },
        key_alias: projected_key.alias.clone(),
        function: function_fragment.clone(),
        function_alias: outer.columns[1].alias.clone(),
        where_clause: keys.where_clause.clone(),
        aggregate_filter: filter.cloned(),
        correlated_table: correlated.name.clone(),
    })
}

/// `inner.key = keys.key` between the aggregate's table and the key select.
fn correlates(
    fragment: &Fragment,
    correlated_table: Option<&str>,
    key: &ColumnFragment,
    keys_name: &str,
    key_output: &str,
) -> bool {
    let Fragment::Binary(BinaryFragment {
        left,
        op: "=",
        right,
        negated: false,
        ..
    }) = fragment
    else {
        return false;
    };
    let (Fragment::Column(inner_key), Fragment::Column(outer_key)) = (left.as_ref(), right.as_ref())
    else {
        return false;
    };
    inner_key.literal.is_none()
        && inner_key.table.as_deref() == correlated_table
        && inner_key.name == key.name
        && outer_key.table.as_deref() == Some(keys_name)
        && outer_key.name.as_deref() == Some(key_output)
}

/// The key filter restated against `table`, with column origins dropped.
fn normalized(filter: Option<&Fragment>, from: Option<&str>, table: &str) -> Option<Fragment> {
    let mut filter = filter?.clone();
    filter.for_each_column_mut(&mut |c| {
        if from.is_some() && c.table.as_deref() == from {
            c.table = Some(table.to_string());
        }
        c.origin.clear();
    });
    Some(filter)
}

/// Collapse the distinct-keys-plus-correlated-aggregate shape at `root`.
/// Returns whether the select was rewritten.
pub fn flatten_group_by(arena: &mut Arena, root: InputId) -> bool {
    let Some(shape) = recognize(arena, root) else {
        return false;
    };
    let table_name = arena.name(shape.table).unwrap_or_default().to_string();
    // Rows the aggregate counts must be exactly the rows the keys came from.
    let key_filter = normalized(shape.where_clause.as_ref(), None, &table_name);
    let aggregate_filter = normalized(
        shape.aggregate_filter.as_ref(),
        shape.correlated_table.as_deref(),
        &table_name,
    );
    if key_filter != aggregate_filter {
        return false;
    }
    let mut function = shape.function;
    arena.replace_table_name(
        &mut function,
        shape.correlated_table.as_deref(),
        &table_name,
        None,
    );

    let mut key_column = shape.key.clone();
    key_column.alias = shape.key_alias;
    let mut aggregate_column = ColumnFragment::computed(function);
    aggregate_column.alias = shape.function_alias;

    let Some(select) = arena.select_mut(root) else {
        return false;
    };
    select.columns = vec![key_column, aggregate_column];
    select.from = Some(shape.table);
    select.where_clause = shape.where_clause;
    select.group_by = vec![Fragment::Column(shape.key)];
    trace!(root = ?root, table = %table_name, "flattened group by");
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{EntityType, PrimitiveKind, Property};
    use crate::dialect::XuguDialect;
    use crate::fragment::{Input, SqlWriter, TableFragment};

    fn table(arena: &mut Arena, name: &str) -> InputId {
        arena.alloc(Input::Table(TableFragment {
            schema: None,
            table: "Orders".into(),
            defining_query: None,
            name: Some(name.into()),
            entity: EntityType {
                name: "Order".into(),
                properties: vec![
                    Property::new("Id", PrimitiveKind::Int32),
                    Property::new("Customer", PrimitiveKind::Int32),
                ],
                keys: vec!["Id".into()],
            },
            scoped: false,
        }))
    }

    fn column(table: &str, name: &str) -> ColumnFragment {
        ColumnFragment::new(Some(table.into()), name)
    }

    fn over_hundred(table: &str) -> Fragment {
        Fragment::Binary(BinaryFragment::new(
            Fragment::Column(column(table, "Id")),
            ">",
            Fragment::literal("100"),
        ))
    }

    fn nested(arena: &mut Arena, correlated_table: &str) -> InputId {
        nested_filtered(arena, correlated_table, false, false)
    }

    fn nested_filtered(
        arena: &mut Arena,
        correlated_table: &str,
        filter_keys: bool,
        filter_aggregate: bool,
    ) -> InputId {
        let t = table(arena, "o");
        let mut keys = SelectStatement::from_input(t);
        keys.columns.push(column("o", "Customer"));
        if filter_keys {
            keys.where_clause = Some(over_hundred("o"));
        }
        keys.distinct = true;
        keys.name = Some("k".into());
        keys.scoped = true;
        let keys = arena.alloc(Input::Select(keys));

        let t2 = table(arena, "o2");
        if let Input::Table(t) = arena.get_mut(t2) {
            t.table = correlated_table.into();
        }
        let mut aggregate = SelectStatement::from_input(t2);
        aggregate.columns.push(ColumnFragment::computed(Fragment::Function {
            name: "COUNT".into(),
            args: vec![Fragment::Column(column("o2", "Id"))],
            distinct: false,
            niladic: false,
        }));
        let correlation = Fragment::Binary(BinaryFragment::new(
            Fragment::Column(column("o2", "Customer")),
            "=",
            Fragment::Column(column("k", "Customer")),
        ));
        aggregate.where_clause = Some(if filter_aggregate {
            Fragment::and(over_hundred("o2"), correlation)
        } else {
            correlation
        });
        let aggregate = arena.alloc(Input::Select(aggregate));

        let mut outer = SelectStatement::from_input(keys);
        let mut key = column("k", "Customer");
        key.alias = Some("Customer".into());
        outer.columns.push(key);
        let mut count = ColumnFragment::computed(Fragment::Query(aggregate));
        count.alias = Some("Total".into());
        outer.columns.push(count);
        arena.alloc(Input::Select(outer))
    }

    #[test]
    fn test_flatten_distinct_keys_with_correlated_count() {
        let mut arena = Arena::new();
        let root = nested(&mut arena, "Orders");
        assert!(flatten_group_by(&mut arena, root));
        let dialect = XuguDialect::default();
        assert_eq!(
            SqlWriter::new(&arena, &dialect).query(root),
            "SELECT \"o\".\"Customer\", COUNT(\"o\".\"Id\") AS \"Total\" \
             FROM \"Orders\" AS \"o\" GROUP BY \"o\".\"Customer\""
        );
    }

    #[test]
    fn test_different_tables_are_left_alone() {
        let mut arena = Arena::new();
        let root = nested(&mut arena, "Invoices");
        assert!(!flatten_group_by(&mut arena, root));
    }

    #[test]
    fn test_filtered_keys_with_unfiltered_count_are_left_alone() {
        let mut arena = Arena::new();
        let root = nested_filtered(&mut arena, "Orders", true, false);
        assert!(!flatten_group_by(&mut arena, root));
    }

    #[test]
    fn test_filtered_count_without_key_filter_is_left_alone() {
        let mut arena = Arena::new();
        let root = nested_filtered(&mut arena, "Orders", false, true);
        assert!(!flatten_group_by(&mut arena, root));
    }

    #[test]
    fn test_flatten_keeps_shared_filter() {
        let mut arena = Arena::new();
        let root = nested_filtered(&mut arena, "Orders", true, true);
        assert!(flatten_group_by(&mut arena, root));
        let dialect = XuguDialect::default();
        assert_eq!(
            SqlWriter::new(&arena, &dialect).query(root),
            "SELECT \"o\".\"Customer\", COUNT(\"o\".\"Id\") AS \"Total\" \
             FROM \"Orders\" AS \"o\" WHERE \"o\".\"Id\" > 100 GROUP BY \"o\".\"Customer\""
        );
    }
}
