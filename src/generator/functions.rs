//! Function dispatch: canonical functions through static template tables,
//! everything else through the user-defined function path.

use crate::ast::{Expr, FunctionMeta};
use crate::dialect::SqlDialect;
use crate::error::{GenResult, SqlGenError};
use crate::fragment::{BinaryFragment, ColumnFragment, Fragment, Input, SelectStatement};
use crate::generator::Generator;

/// Bitwise family: infix operators. `BitwiseNot` is unary.
pub const BITWISE: &[(&str, &str)] = &[
    ("BitwiseAnd", "&"),
    ("BitwiseOr", "|"),
    ("BitwiseXor", "^"),
    ("BitwiseNot", "~"),
];

pub const DATE: &[(&str, &str)] = &[
    ("AddDays", "DATE_ADD({0}, INTERVAL {1} DAY)"),
    ("AddHours", "DATE_ADD({0}, INTERVAL {1} HOUR)"),
    ("AddMilliseconds", "DATE_ADD({0}, INTERVAL ({1}) * 1000 MICROSECOND)"),
    ("AddMinutes", "DATE_ADD({0}, INTERVAL {1} MINUTE)"),
    ("AddMonths", "DATE_ADD({0}, INTERVAL {1} MONTH)"),
    ("AddSeconds", "DATE_ADD({0}, INTERVAL {1} SECOND)"),
    ("AddYears", "DATE_ADD({0}, INTERVAL {1} YEAR)"),
    ("CurrentDateTime", "NOW()"),
    ("CurrentUtcDateTime", "UTC_TIMESTAMP()"),
    ("Day", "DAYOFMONTH({0})"),
    ("DayOfYear", "DAYOFYEAR({0})"),
    ("DiffDays", "TIMESTAMPDIFF(DAY, {0}, {1})"),
    ("DiffHours", "TIMESTAMPDIFF(HOUR, {0}, {1})"),
    ("DiffMilliseconds", "TIMESTAMPDIFF(MICROSECOND, {0}, {1}) / 1000"),
    ("DiffMinutes", "TIMESTAMPDIFF(MINUTE, {0}, {1})"),
    ("DiffMonths", "TIMESTAMPDIFF(MONTH, {0}, {1})"),
    ("DiffSeconds", "TIMESTAMPDIFF(SECOND, {0}, {1})"),
    ("DiffYears", "TIMESTAMPDIFF(YEAR, {0}, {1})"),
    ("Hour", "HOUR({0})"),
    ("Millisecond", "MICROSECOND({0}) / 1000"),
    ("Minute", "MINUTE({0})"),
    ("Month", "MONTH({0})"),
    ("Second", "SECOND({0})"),
    ("TruncateTime", "DATE({0})"),
    ("Year", "YEAR({0})"),
];

pub const STRING: &[(&str, &str)] = &[
    ("Concat", "CONCAT({0}, {1})"),
    ("IndexOf", "LOCATE({0}, {1})"),
    ("Left", "LEFT({0}, {1})"),
    ("Length", "LENGTH({0})"),
    ("LTrim", "LTRIM({0})"),
    ("Replace", "REPLACE({0}, {1}, {2})"),
    ("Reverse", "REVERSE({0})"),
    ("Right", "RIGHT({0}, {1})"),
    ("RTrim", "RTRIM({0})"),
    ("Substring", "SUBSTRING({0}, {1}, {2})"),
    ("ToLower", "LOWER({0})"),
    ("ToUpper", "UPPER({0})"),
    ("Trim", "TRIM({0})"),
];

pub const MATH: &[(&str, &str)] = &[
    ("Abs", "ABS({0})"),
    ("Ceiling", "CEILING({0})"),
    ("Floor", "FLOOR({0})"),
    ("Power", "POW({0}, {1})"),
    ("Round", "ROUND({0}, {1})"),
    ("Truncate", "TRUNCATE({0}, {1})"),
];

/// Spatial functions; none are mapped yet.
pub const GEO: &[(&str, &str)] = &[];

/// Canonical aggregates and their SQL function names.
pub const AGGREGATES: &[(&str, &str)] = &[
    ("Avg", "AVG"),
    ("BigCount", "COUNT"),
    ("Count", "COUNT"),
    ("Max", "MAX"),
    ("Min", "MIN"),
    ("StDev", "STDDEV_SAMP"),
    ("StDevP", "STDDEV_POP"),
    ("Sum", "SUM"),
    ("Var", "VAR_SAMP"),
    ("VarP", "VAR_POP"),
];

fn lookup(table: &'static [(&'static str, &'static str)], name: &str) -> Option<&'static str> {
    table.iter().find(|(n, _)| *n == name).map(|(_, sql)| *sql)
}

/// Every mapped canonical function, grouped by family, in lookup order.
pub fn function_tables() -> [(&'static str, &'static [(&'static str, &'static str)]); 6] {
    [
        ("bitwise", BITWISE),
        ("date", DATE),
        ("string", STRING),
        ("math", MATH),
        ("geo", GEO),
        ("aggregate", AGGREGATES),
    ]
}

/// Highest `{n}` placeholder plus one.
fn template_arity(template: &str) -> usize {
    let mut arity = 0;
    let mut rest = template;
    while let Some(open) = rest.find('{') {
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            break;
        };
        if let Ok(n) = after[..close].parse::<usize>() {
            arity = arity.max(n + 1);
        }
        rest = &after[close + 1..];
    }
    arity
}

impl Generator {
    pub(crate) fn function(&mut self, meta: &FunctionMeta, args: &[Expr]) -> GenResult<Fragment> {
        if !meta.is_canonical() {
            return self.user_function(meta, args);
        }
        let name = meta.name.as_str();
        if lookup(AGGREGATES, name).is_some() {
            if let [argument] = args {
                if argument.is_relational() {
                    return self.collection_aggregate(meta, argument);
                }
            }
        }
        if let Some(op) = lookup(BITWISE, name) {
            return match (name, args) {
                ("BitwiseNot", [argument]) => Ok(Fragment::Template {
                    template: "~({0})",
                    args: vec![self.scalar(argument)?],
                }),
                (n, [left, right]) if n != "BitwiseNot" => {
                    let mut b = BinaryFragment::new(self.scalar(left)?, op, self.scalar(right)?);
                    b.wrap_left = !left.is_atomic();
                    b.wrap_right = !right.is_atomic();
                    Ok(Fragment::Binary(b))
                }
                ("BitwiseNot", _) => Err(SqlGenError::malformed("one operand", &meta.name)),
                _ => Err(SqlGenError::malformed("two operands", &meta.name)),
            };
        }
        let template = [DATE, STRING, MATH, GEO]
            .into_iter()
            .find_map(|table| lookup(table, name));
        let Some(template) = template else {
            return self.user_function(meta, args);
        };
        let mut lowered = args
            .iter()
            .map(|a| self.scalar(a))
            .collect::<GenResult<Vec<_>>>()?;
        if name == "Round" && lowered.len() == 1 {
            lowered.push(Fragment::literal("0"));
        }
        if lowered.len() < template_arity(template) {
            return Err(SqlGenError::malformed(template, &meta.name));
        }
        Ok(Fragment::Template {
            template,
            args: lowered,
        })
    }

    /// Aggregate over already lowered arguments, as used by group-by.
    pub(crate) fn aggregate(
        &mut self,
        meta: &FunctionMeta,
        distinct: bool,
        args: Vec<Fragment>,
    ) -> GenResult<Fragment> {
        if meta.is_canonical() {
            if let Some(sql) = lookup(AGGREGATES, &meta.name) {
                let args = if args.is_empty() && sql == "COUNT" {
                    vec![Fragment::literal("*")]
                } else {
                    args
                };
                return Ok(Fragment::Function {
                    name: sql.to_string(),
                    args,
                    distinct,
                    niladic: false,
                });
            }
        }
        self.store_function(meta, args, distinct)
    }

    fn user_function(&mut self, meta: &FunctionMeta, args: &[Expr]) -> GenResult<Fragment> {
        let args = args
            .iter()
            .map(|a| self.scalar(a))
            .collect::<GenResult<Vec<_>>>()?;
        self.store_function(meta, args, false)
    }

    fn store_function(
        &self,
        meta: &FunctionMeta,
        args: Vec<Fragment>,
        distinct: bool,
    ) -> GenResult<Fragment> {
        if meta.niladic && !args.is_empty() {
            return Err(SqlGenError::NiladicArguments {
                function: meta.full_name(),
            });
        }
        let physical = meta.physical_name();
        let name = if meta.built_in {
            physical.to_string()
        } else if meta.schema.is_some() {
            self.dialect.table_name(meta.schema.as_deref(), physical)
        } else {
            self.dialect.quote_identifier(physical)
        };
        Ok(Fragment::Function {
            name,
            args,
            distinct,
            niladic: meta.niladic,
        })
    }

    /// `Count(collection)` and friends as a scalar subquery projecting only the aggregate.
    fn collection_aggregate(&mut self, meta: &FunctionMeta, argument: &Expr) -> GenResult<Fragment> {
        let checkpoint = self.scope.checkpoint();
        let mut select = self.ensure_select(argument, None)?;
        let shaped = self.arena.select(select).is_some_and(|s| {
            s.distinct || s.limit.is_some() || s.skip.is_some() || !s.group_by.is_empty()
        });
        let columns = if shaped {
            self.arena.wrap(select, &mut self.scope);
            let inner = select;
            select = self
                .arena
                .alloc(Input::Select(SelectStatement::from_input(inner)));
            self.arena.output_columns(inner)
        } else {
            self.select_mut(select)?.columns.clone()
        };
        let counts_rows = lookup(AGGREGATES, &meta.name) == Some("COUNT");
        let args = match columns.as_slice() {
            [column] => vec![column_value(column)],
            _ if counts_rows => Vec::new(),
            _ => return Err(SqlGenError::malformed("single column aggregate input", argument)),
        };
        let function = self.aggregate(meta, false, args)?;
        let mut column = ColumnFragment::computed(function);
        column.alias = Some(meta.name.clone());
        self.select_mut(select)?.columns = vec![column];
        self.scope.restore(checkpoint);
        Ok(Fragment::Query(select))
    }
}

fn column_value(column: &ColumnFragment) -> Fragment {
    match &column.literal {
        Some(literal) => (**literal).clone(),
        None => Fragment::Column(ColumnFragment {
            alias: None,
            origin: Vec::new(),
            ..column.clone()
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::builders::*;
    use crate::ast::PrimitiveKind;
    use crate::config::GeneratorConfig;

    fn lower(e: &Expr) -> GenResult<String> {
        let mut g = Generator::new(&GeneratorConfig::default(), "select");
        let f = g.scalar(e)?;
        Ok(g.writer().fragment(&f))
    }

    #[test]
    fn test_template_arity() {
        assert_eq!(template_arity("NOW()"), 0);
        assert_eq!(template_arity("REPLACE({0}, {1}, {2})"), 3);
        assert_eq!(template_arity("TIMESTAMPDIFF(DAY, {0}, {1})"), 2);
    }

    #[test]
    fn test_date_and_string_templates() {
        assert_eq!(lower(&call("AddDays", vec![param("d"), int(3)])).unwrap(), "DATE_ADD(:d, INTERVAL 3 DAY)");
        assert_eq!(lower(&call("ToUpper", vec![param("s")])).unwrap(), "UPPER(:s)");
        assert_eq!(lower(&call("CurrentDateTime", vec![])).unwrap(), "NOW()");
    }

    #[test]
    fn test_round_default_scale() {
        assert_eq!(lower(&call("Round", vec![param("x")])).unwrap(), "ROUND(:x, 0)");
        assert_eq!(lower(&call("Round", vec![param("x"), int(2)])).unwrap(), "ROUND(:x, 2)");
    }

    #[test]
    fn test_bitwise_operators() {
        assert_eq!(lower(&call("BitwiseAnd", vec![param("a"), int(4)])).unwrap(), ":a & 4");
        assert_eq!(lower(&call("BitwiseNot", vec![param("a")])).unwrap(), "~(:a)");
    }

    #[test]
    fn test_bitwise_operand_count() {
        assert!(matches!(
            lower(&call("BitwiseAnd", vec![param("a")])),
            Err(SqlGenError::MalformedShape { .. })
        ));
        assert!(matches!(
            lower(&call("BitwiseNot", vec![param("a"), param("b")])),
            Err(SqlGenError::MalformedShape { .. })
        ));
    }

    #[test]
    fn test_missing_template_argument() {
        assert!(matches!(
            lower(&call("Replace", vec![param("a")])),
            Err(SqlGenError::MalformedShape { .. })
        ));
    }

    #[test]
    fn test_user_defined_functions() {
        let mut meta = FunctionMeta::store("Store", "score");
        meta.schema = Some("APP".into());
        assert_eq!(
            lower(&store_call(meta.clone(), vec![int(1)])).unwrap(),
            "\"APP\".\"score\"(1)"
        );

        meta.schema = None;
        meta.store_name = Some("sysdate".into());
        meta.built_in = true;
        meta.niladic = true;
        assert_eq!(lower(&store_call(meta.clone(), vec![])).unwrap(), "sysdate");
        assert_eq!(
            lower(&store_call(meta, vec![int(1)])).unwrap_err(),
            SqlGenError::NiladicArguments {
                function: "Store.score".into()
            }
        );
    }

    #[test]
    fn test_unmapped_canonical_falls_back() {
        assert_eq!(lower(&call("NewGuid", vec![])).unwrap(), "\"NewGuid\"()");
    }

    #[test]
    fn test_count_over_collection() {
        let users = entity_set(
            "Users",
            entity(
                "User",
                &[("Id", PrimitiveKind::Int32), ("Name", PrimitiveKind::String)],
                &["Id"],
            ),
        );
        let e = call("Count", vec![scan(users)]);
        assert_eq!(
            lower(&e).unwrap(),
            "(SELECT COUNT(*) AS \"Count\" FROM \"Users\")"
        );
    }
}
