//! SELECT generation tests.

use pretty_assertions::assert_eq;

use super::*;
use crate::ast::{ApplyKind, Binding, JoinKind};
use crate::dialect::DbType;
use crate::error::SqlGenError;

#[test]
fn test_filter_over_scan() {
    let cmd = query(filter(
        bind(scan(users()), "u"),
        eq(col("u", "Name"), string("x")),
    ));
    assert_eq!(
        cmd.sql,
        "SELECT * FROM \"Users\" AS \"u\" WHERE \"u\".\"Name\" = :gp1"
    );
    assert_eq!(cmd.parameters.len(), 1);
    assert_eq!(cmd.parameters[0].name, ":gp1");
    assert_eq!(cmd.parameters[0].db_type, DbType::String);
}

#[test]
fn test_project_aliases() {
    let e = project(
        bind(scan(users()), "u"),
        vec![("Id", col("u", "Id")), ("UserName", col("u", "Name"))],
    );
    assert_eq!(
        sql(e),
        "SELECT \"u\".\"Id\", \"u\".\"Name\" AS \"UserName\" FROM \"Users\" AS \"u\""
    );
}

#[test]
fn test_filter_over_projection_uses_source_column() {
    let inner = project(bind(scan(users()), "u"), vec![("N", col("u", "Name"))]);
    let e = filter(bind(inner, "p"), eq(col("p", "N"), string("x")));
    assert_eq!(
        sql(e),
        "SELECT \"p\".\"Name\" AS \"N\" FROM \"Users\" AS \"p\" WHERE \"p\".\"Name\" = :gp1"
    );
}

#[test]
fn test_three_level_path_through_subquery_uses_its_column() {
    // `a.v.Name` reaches the right join side through the derived table `a`,
    // where that column is exposed as `Name1`.
    let pair = join(
        JoinKind::Inner,
        bind(scan(users()), "u"),
        bind(scan(users()), "v"),
        Some(eq(col("u", "Id"), col("v", "Id"))),
    );
    let paged = skip(bind(pair, "j"), vec![asc(prop(col("j", "u"), "Id"))], int(2));
    let e = filter(
        bind(paged, "a"),
        eq(prop(col("a", "v"), "Name"), string("x")),
    );
    assert_eq!(
        sql(e),
        "SELECT * FROM (SELECT \"u\".\"Id\", \"u\".\"Name\", \"u\".\"Age\", \
         \"v\".\"Id\" AS \"Id1\", \"v\".\"Name\" AS \"Name1\", \"v\".\"Age\" AS \"Age1\" \
         FROM \"Users\" AS \"u\" INNER JOIN \"Users\" AS \"v\" ON \"u\".\"Id\" = \"v\".\"Id\" \
         WHERE ROWNUM > 2 ORDER BY \"u\".\"Id\") AS \"a\" WHERE \"a\".\"Name1\" = :gp1"
    );
}

#[test]
fn test_stacked_filters_fuse() {
    let inner = filter(bind(scan(users()), "u"), gt(col("u", "Age"), int(18)));
    let e = filter(bind(inner, "v"), eq(col("v", "Name"), string("x")));
    assert_eq!(
        sql(e),
        "SELECT \"v\".\"Id\", \"v\".\"Name\", \"v\".\"Age\" FROM \"Users\" AS \"v\" \
         WHERE (\"v\".\"Age\" > 18) AND (\"v\".\"Name\" = :gp1)"
    );
}

#[test]
fn test_skip_then_limit_wraps() {
    let skipped = skip(
        bind(scan(users()), "u"),
        vec![asc(col("u", "Id"))],
        int(2),
    );
    assert_eq!(
        sql(limit(skipped, int(1))),
        "SELECT * FROM (SELECT \"u\".\"Id\", \"u\".\"Name\", \"u\".\"Age\" FROM \"Users\" AS \"u\" \
         WHERE ROWNUM > 2 ORDER BY \"u\".\"Id\") AS \"Alias1\" LIMIT 1"
    );
}

#[test]
fn test_sort_descending() {
    let e = sort(bind(scan(users()), "u"), vec![desc(col("u", "Age"))]);
    assert_eq!(
        sql(e),
        "SELECT * FROM \"Users\" AS \"u\" ORDER BY \"u\".\"Age\" DESC"
    );
}

#[test]
fn test_element_is_limit_one() {
    let e = element(filter(bind(scan(users()), "u"), eq(col("u", "Id"), int(3))));
    assert_eq!(
        sql(e),
        "SELECT * FROM \"Users\" AS \"u\" WHERE \"u\".\"Id\" = 3 LIMIT 1"
    );
}

#[test]
fn test_distinct_projection() {
    let e = distinct(project(
        bind(scan(users()), "u"),
        vec![("Age", col("u", "Age"))],
    ));
    assert_eq!(sql(e), "SELECT DISTINCT \"u\".\"Age\" FROM \"Users\" AS \"u\"");
}

#[test]
fn test_group_by_count() {
    let e = group_by(
        group_bind(scan(users()), "u", "g"),
        vec![("Age", col("u", "Age"))],
        vec![aggregate("Count", "Count", vec![])],
    );
    assert_eq!(
        sql(e),
        "SELECT \"u\".\"Age\" AS \"K1\", COUNT(*) AS \"Count\" FROM \"Users\" AS \"u\" \
         GROUP BY \"u\".\"Age\""
    );
}

#[test]
fn test_group_by_distinct_aggregate() {
    let mut total = aggregate("Customers", "Count", vec![col("o", "UserId")]);
    total.distinct = true;
    let e = group_by(group_bind(scan(orders()), "o", "g"), vec![], vec![total]);
    assert_eq!(
        sql(e),
        "SELECT COUNT(DISTINCT \"o\".\"UserId\") AS \"Customers\" FROM \"Orders\" AS \"o\""
    );
}

#[test]
fn test_count_over_filtered_keys_stays_correlated() {
    let big = filter(bind(scan(orders()), "o"), gt(col("o", "Total"), int(100)));
    let keys = distinct(project(
        bind(big, "o"),
        vec![("Customer", col("o", "UserId"))],
    ));
    let all_orders = filter(
        bind(scan(orders()), "o2"),
        eq(col("o2", "UserId"), col("k", "Customer")),
    );
    let e = project(
        bind(keys, "k"),
        vec![
            ("Customer", col("k", "Customer")),
            ("Total", call("Count", vec![all_orders])),
        ],
    );
    let text = sql(e);
    assert!(!text.contains("GROUP BY"), "{text}");
    assert!(text.contains("(SELECT COUNT(*)"), "{text}");
}

#[test]
fn test_inner_join() {
    let e = join(
        JoinKind::Inner,
        bind(scan(users()), "u"),
        bind(scan(orders()), "o"),
        Some(eq(col("u", "Id"), col("o", "UserId"))),
    );
    assert_eq!(
        sql(e),
        "SELECT * FROM \"Users\" AS \"u\" INNER JOIN \"Orders\" AS \"o\" ON \"u\".\"Id\" = \"o\".\"UserId\""
    );
}

#[test]
fn test_project_over_join() {
    let j = join(
        JoinKind::Inner,
        bind(scan(users()), "u"),
        bind(scan(orders()), "o"),
        Some(eq(col("u", "Id"), col("o", "UserId"))),
    );
    let e = project(
        bind(j, "j"),
        vec![
            ("Name", prop(col("j", "u"), "Name")),
            ("Total", prop(col("j", "o"), "Total")),
        ],
    );
    assert_eq!(
        sql(e),
        "SELECT \"u\".\"Name\", \"o\".\"Total\" FROM \"Users\" AS \"u\" \
         INNER JOIN \"Orders\" AS \"o\" ON \"u\".\"Id\" = \"o\".\"UserId\""
    );
}

#[test]
fn test_cross_join_chain() {
    let e = cross_join(vec![
        bind(scan(users()), "a"),
        bind(scan(orders()), "b"),
        bind(scan(users()), "c"),
    ]);
    assert_eq!(
        sql(e),
        "SELECT * FROM \"Users\" AS \"a\" CROSS JOIN \"Orders\" AS \"b\" CROSS JOIN \"Users\" AS \"c\""
    );
}

#[test]
fn test_cross_join_needs_two_inputs() {
    let err = run(&CommandTree::Query(cross_join(vec![bind(scan(users()), "a")]))).unwrap_err();
    assert!(matches!(err, SqlGenError::MalformedShape { .. }));
}

#[test]
fn test_union_all() {
    let left = project(bind(scan(users()), "a"), vec![("Name", col("a", "Name"))]);
    let right = project(bind(scan(users()), "b"), vec![("Name", col("b", "Name"))]);
    assert_eq!(
        sql(union_all(left, right)),
        "(SELECT \"a\".\"Name\" FROM \"Users\" AS \"a\") UNION ALL (SELECT \"b\".\"Name\" FROM \"Users\" AS \"b\")"
    );
}

#[test]
fn test_union_all_requires_projections() {
    let err = run(&CommandTree::Query(union_all(scan(users()), scan(users())))).unwrap_err();
    assert!(matches!(
        err,
        SqlGenError::MalformedShape {
            expected: "Project",
            ..
        }
    ));
}

#[test]
fn test_or_chain_becomes_in_list() {
    let age = |n| eq(col("u", "Age"), int(n));
    let left_deep = filter(
        bind(scan(users()), "u"),
        or(or(age(1), age(2)), age(3)),
    );
    let right_deep = filter(
        bind(scan(users()), "u"),
        or(age(1), or(age(2), age(3))),
    );
    let expected = "SELECT * FROM \"Users\" AS \"u\" WHERE \"u\".\"Age\" IN (1, 2, 3)";
    assert_eq!(sql(left_deep), expected);
    assert_eq!(sql(right_deep), expected);
}

#[test]
fn test_index_of_promotes_to_like() {
    let e = filter(
        bind(scan(users()), "u"),
        eq(
            call("IndexOf", vec![string("abc"), col("u", "Name")]),
            int(1),
        ),
    );
    let cmd = query(e);
    assert_eq!(
        cmd.sql,
        "SELECT * FROM \"Users\" AS \"u\" WHERE \"u\".\"Name\" LIKE 'abc%'"
    );
    assert!(cmd.parameters.is_empty());
}

#[test]
fn test_index_of_parameter_promotes_to_like() {
    let name = || col("u", "Name");
    let starts = eq(call("IndexOf", vec![param("p"), name()]), int(1));
    let ends = eq(
        call(
            "IndexOf",
            vec![
                call("Reverse", vec![param("p")]),
                call("Reverse", vec![name()]),
            ],
        ),
        int(1),
    );
    let contains = gt(call("IndexOf", vec![param("p"), name()]), int(0));
    for predicate in [starts, ends, contains] {
        let cmd = query(filter(bind(scan(users()), "u"), predicate));
        assert_eq!(
            cmd.sql,
            "SELECT * FROM \"Users\" AS \"u\" WHERE \"u\".\"Name\" LIKE :p"
        );
        assert!(cmd.parameters.is_empty());
    }
}

#[test]
fn test_any_and_all() {
    let any_order = filter(
        bind(scan(users()), "u"),
        any(
            bind(scan(orders()), "o"),
            eq(col("o", "UserId"), col("u", "Id")),
        ),
    );
    assert_eq!(
        sql(any_order),
        "SELECT * FROM \"Users\" AS \"u\" WHERE EXISTS(SELECT * FROM \"Orders\" AS \"o\" \
         WHERE \"o\".\"UserId\" = \"u\".\"Id\")"
    );

    let all_small = filter(
        bind(scan(users()), "u"),
        all(bind(scan(orders()), "o"), gt(col("o", "Total"), int(100))),
    );
    assert_eq!(
        sql(all_small),
        "SELECT * FROM \"Users\" AS \"u\" WHERE NOT EXISTS(SELECT * FROM \"Orders\" AS \"o\" \
         WHERE NOT (\"o\".\"Total\" > 100))"
    );
}

#[test]
fn test_is_empty() {
    let e = filter(
        bind(scan(users()), "u"),
        is_empty(filter(
            bind(scan(orders()), "o"),
            eq(col("o", "UserId"), col("u", "Id")),
        )),
    );
    assert_eq!(
        sql(e),
        "SELECT * FROM \"Users\" AS \"u\" WHERE NOT EXISTS(SELECT * FROM \"Orders\" AS \"o\" \
         WHERE \"o\".\"UserId\" = \"u\".\"Id\")"
    );
}

fn order_totals() -> Binding {
    let correlated = filter(
        bind(scan(orders()), "o"),
        eq(col("o", "UserId"), col("u", "Id")),
    );
    bind(
        project(bind(correlated, "f"), vec![("Total", col("f", "Total"))]),
        "a",
    )
}

#[test]
fn test_cross_apply() {
    let e = apply(ApplyKind::Cross, bind(scan(users()), "u"), order_totals());
    assert_eq!(
        sql(e),
        "SELECT \"u\".\"Id\", \"u\".\"Name\", \"u\".\"Age\", \
         (SELECT \"o\".\"Total\" FROM \"Orders\" AS \"o\" WHERE \"o\".\"UserId\" = \"u\".\"Id\") AS \"Total\" \
         FROM \"Users\" AS \"u\" \
         WHERE EXISTS(SELECT \"o\".\"Total\" FROM \"Orders\" AS \"o\" WHERE \"o\".\"UserId\" = \"u\".\"Id\")"
    );
}

#[test]
fn test_outer_apply_keeps_every_row() {
    let e = apply(ApplyKind::Outer, bind(scan(users()), "u"), order_totals());
    assert_eq!(
        sql(e),
        "SELECT \"u\".\"Id\", \"u\".\"Name\", \"u\".\"Age\", \
         (SELECT \"o\".\"Total\" FROM \"Orders\" AS \"o\" WHERE \"o\".\"UserId\" = \"u\".\"Id\") AS \"Total\" \
         FROM \"Users\" AS \"u\""
    );
}

#[test]
fn test_defining_query_and_schema() {
    let mut set = users();
    set.defining_query = Some(" SELECT * FROM legacy_users ".into());
    assert_eq!(
        sql(scan(set)),
        "SELECT * FROM (SELECT * FROM legacy_users)"
    );

    let mut set = orders();
    set.schema = Some("SALES".into());
    set.table = Some("ORDER_T".into());
    assert_eq!(sql(scan(set)), "SELECT * FROM \"SALES\".\"ORDER_T\"");
}

#[test]
fn test_scalar_root() {
    assert_eq!(sql(arith(crate::ast::ArithOp::Plus, vec![int(1), int(2)])), "SELECT 1 + 2");
}

#[test]
fn test_unsupported_constructs() {
    let e = Expr::Intersect {
        left: Box::new(scan(users())),
        right: Box::new(scan(users())),
    };
    let err = run(&CommandTree::Query(e)).unwrap_err();
    assert_eq!(err, SqlGenError::unsupported("Intersect"));

    let e = filter(bind(scan(users()), "u"), eq(col("x", "Id"), int(1)));
    assert!(matches!(
        run(&CommandTree::Query(e)).unwrap_err(),
        SqlGenError::UnboundVariable { .. }
    ));
}

#[test]
fn test_generation_is_deterministic() {
    let tree = CommandTree::Query(filter(
        bind(scan(users()), "u"),
        and(
            eq(col("u", "Name"), string("x")),
            lt(col("u", "Age"), int(40)),
        ),
    ));
    let first = run(&tree).unwrap();
    let second = run(&tree).unwrap();
    assert_eq!(first, second);
}
