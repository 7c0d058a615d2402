//! Command trees arriving as JSON, end to end.

use pretty_assertions::assert_eq;
use xgsql::prelude::*;

const DELETE_TREE: &str = r#"{
  "Delete": {
    "target": {
      "expr": {
        "Scan": {
          "name": "Orders",
          "container": "SYSDBA",
          "element": {
            "name": "Order",
            "properties": [
              { "name": "Id", "kind": "Int32" },
              { "name": "Note", "kind": "String" }
            ],
            "keys": ["Id"]
          }
        }
      },
      "var": "t"
    },
    "predicate": {
      "Comparison": {
        "op": "Eq",
        "left": { "Property": { "instance": { "VariableRef": "t" }, "property": "Note" } },
        "right": { "Constant": { "kind": "String", "value": { "String": "stale" } } }
      }
    }
  }
}"#;

#[test]
fn test_delete_from_json() {
    let tree = CommandTree::from_json(DELETE_TREE).unwrap();
    let cmd = generate(&tree, &GeneratorConfig::default()).unwrap();
    assert_eq!(cmd.sql, "DELETE FROM \"Orders\" WHERE \"Note\" = :gp1");
    assert_eq!(cmd.command_type, CommandType::Text);

    let out = serde_json::to_value(&cmd).unwrap();
    assert_eq!(out["parameters"][0]["name"], ":gp1");
    assert_eq!(out["parameters"][0]["db_type"], "String");
    assert_eq!(out["parameters"][0]["value"]["String"], "stale");
    assert_eq!(out["command_type"], "Text");
}

#[test]
fn test_serialized_tree_generates_same_sql() {
    let users = entity_set(
        "Users",
        entity(
            "User",
            &[
                ("Id", PrimitiveKind::Int32),
                ("Name", PrimitiveKind::String),
            ],
            &["Id"],
        ),
    );
    let tree = CommandTree::Query(sort(
        bind(
            filter(bind(scan(users), "u"), like(col("u", "Name"), string("A%"))),
            "s",
        ),
        vec![desc(col("s", "Id"))],
    ));
    let config = GeneratorConfig::default();
    let direct = generate(&tree, &config).unwrap();

    let json = serde_json::to_string(&tree).unwrap();
    let reparsed = CommandTree::from_json(&json).unwrap();
    assert_eq!(reparsed, tree);
    assert_eq!(generate(&reparsed, &config).unwrap(), direct);
    assert_eq!(
        direct.sql,
        "SELECT * FROM \"Users\" AS \"u\" WHERE \"u\".\"Name\" LIKE :gp1 ORDER BY \"u\".\"Id\" DESC"
    );
}

#[test]
fn test_config_changes_rendering() {
    let config = GeneratorConfig::from_toml(
        r#"
        [dialect]
        parameter_stem = "p"
        default_schema = "APP"
        "#,
    )
    .unwrap();
    let tree = CommandTree::from_json(DELETE_TREE).unwrap();
    let cmd = generate(&tree, &config).unwrap();
    assert_eq!(
        cmd.sql,
        "DELETE FROM \"SYSDBA\".\"Orders\" WHERE \"Note\" = :p1"
    );
}

#[test]
fn test_malformed_json_is_rejected() {
    assert!(CommandTree::from_json(r#"{ "Truncate": {} }"#).is_err());
}

#[test]
fn test_numeric_constant_with_text_value_is_rejected() {
    let tree = DELETE_TREE
        .replace(r#""kind": "String", "value""#, r#""kind": "Int32", "value""#)
        .replace("stale", "1 OR 1 = 1");
    let tree = CommandTree::from_json(&tree).unwrap();
    let err = generate(&tree, &GeneratorConfig::default()).unwrap_err();
    assert!(matches!(err, SqlGenError::MalformedShape { .. }), "{err}");
}
