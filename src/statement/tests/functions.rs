//! Function calls inside generated queries.

use pretty_assertions::assert_eq;

use super::*;
use crate::ast::FunctionMeta;
use crate::error::SqlGenError;

#[test]
fn test_template_function_in_projection() {
    let e = project(
        bind(scan(users()), "u"),
        vec![
            ("Upper", call("ToUpper", vec![col("u", "Name")])),
            ("Rounded", call("Round", vec![col("u", "Age")])),
        ],
    );
    assert_eq!(
        sql(e),
        "SELECT UPPER(\"u\".\"Name\") AS \"Upper\", ROUND(\"u\".\"Age\", 0) AS \"Rounded\" \
         FROM \"Users\" AS \"u\""
    );
}

#[test]
fn test_count_of_correlated_collection() {
    let orders_of_user = filter(
        bind(scan(orders()), "o"),
        eq(col("o", "UserId"), col("u", "Id")),
    );
    let e = project(
        bind(scan(users()), "u"),
        vec![
            ("Name", col("u", "Name")),
            ("Orders", call("Count", vec![orders_of_user])),
        ],
    );
    assert_eq!(
        sql(e),
        "SELECT \"u\".\"Name\", (SELECT COUNT(*) AS \"Count\" FROM \"Orders\" AS \"o\" \
         WHERE \"o\".\"UserId\" = \"u\".\"Id\") AS \"Orders\" FROM \"Users\" AS \"u\""
    );
}

#[test]
fn test_sum_of_projected_collection() {
    let totals = project(
        bind(scan(orders()), "o"),
        vec![("Total", col("o", "Total"))],
    );
    let e = filter(
        bind(scan(users()), "u"),
        gt(call("Sum", vec![totals]), int(100)),
    );
    assert_eq!(
        sql(e),
        "SELECT * FROM \"Users\" AS \"u\" WHERE \
         ((SELECT SUM(\"o\".\"Total\") AS \"Sum\" FROM \"Orders\" AS \"o\")) > 100"
    );
}

#[test]
fn test_store_function_in_filter() {
    let mut score = FunctionMeta::store("App", "Score");
    score.schema = Some("APP".into());
    score.store_name = Some("score".into());
    let e = filter(
        bind(scan(users()), "u"),
        gt(store_call(score, vec![col("u", "Id")]), int(3)),
    );
    assert_eq!(
        sql(e),
        "SELECT * FROM \"Users\" AS \"u\" WHERE (\"APP\".\"score\"(\"u\".\"Id\")) > 3"
    );
}

#[test]
fn test_niladic_function_with_arguments() {
    let mut now = FunctionMeta::store("App", "SYSDATE");
    now.built_in = true;
    now.niladic = true;
    let e = project(
        bind(scan(users()), "u"),
        vec![("At", store_call(now, vec![int(1)]))],
    );
    let err = run(&CommandTree::Query(e)).unwrap_err();
    assert_eq!(
        err,
        SqlGenError::NiladicArguments {
            function: "App.SYSDATE".into()
        }
    );
}
