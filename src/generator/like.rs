//! LIKE promotion for the starts-with, ends-with and contains shapes.
//!
//! | shape                                     | pattern   |
//! |-------------------------------------------|-----------|
//! | `IndexOf(c, x) = 1`                       | `'c%'`    |
//! | `IndexOf(Reverse(c), Reverse(x)) = 1`     | `'%c'`    |
//! | `IndexOf(c, x) > 0`                       | `'%c%'`   |
//! | `Right(x, Length(c)) = c`                 | `'%c'`    |
//! | `IndexOf(:p, x.P) = 1`                    | `:p`      |
//! | `IndexOf(Reverse(:p), Reverse(x.P)) = 1`  | `:p`      |
//! | `IndexOf(:p, x) > 0`                      | `:p`      |
//!
//! A constant `c` is escaped and wrapped with wildcards here. A parameter
//! already carries its wildcards and is used as the pattern unchanged.

use crate::ast::{Constant, Expr, Value};
use crate::dialect::SqlDialect;
use crate::error::GenResult;
use crate::fragment::Fragment;
use crate::generator::Generator;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Anchor {
    Start,
    End,
    Anywhere,
}

#[derive(Debug)]
enum Pattern<'e> {
    Text(String, Anchor),
    Parameter(&'e Expr),
}

fn constant(e: &Expr) -> Option<&Constant> {
    match e {
        Expr::Constant(c) if c.value != Value::Null => Some(c),
        _ => None,
    }
}

fn text(c: &Constant) -> String {
    match &c.value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn is_parameter(e: &Expr) -> bool {
    matches!(e, Expr::ParameterRef(_))
}

fn is_property(e: &Expr) -> bool {
    matches!(e, Expr::Property { .. })
}

/// Match `left op right` against the table above.
fn recognize<'e>(left: &'e Expr, right: &'e Expr, op: &str) -> Option<(&'e Expr, Pattern<'e>)> {
    let bound = constant(right)?;
    let (name, args) = left.canonical_call()?;
    match (name, args, op) {
        ("IndexOf", [search, target], "=" | ">") => {
            let expected = if op == "=" { 1 } else { 0 };
            if bound.as_i64() != Some(expected) {
                return None;
            }
            if let Some(c) = constant(search) {
                let anchor = if op == "=" { Anchor::Start } else { Anchor::Anywhere };
                return Some((target, Pattern::Text(text(c), anchor)));
            }
            if is_parameter(search) {
                let promotes = op == ">" || is_property(target);
                return promotes.then_some((target, Pattern::Parameter(search)));
            }
            if op != "=" {
                return None;
            }
            let (reversed_search, [c]) = search.canonical_call()? else {
                return None;
            };
            let (reversed_target, [x]) = target.canonical_call()? else {
                return None;
            };
            if reversed_search != "Reverse" || reversed_target != "Reverse" {
                return None;
            }
            if is_parameter(c) {
                return is_property(x).then_some((x, Pattern::Parameter(c)));
            }
            Some((x, Pattern::Text(text(constant(c)?), Anchor::End)))
        }
        ("Right", [x, length], "=") => {
            let ("Length", [c]) = length.canonical_call()? else {
                return None;
            };
            let c = constant(c)?;
            (text(c) == text(bound)).then(|| (x, Pattern::Text(text(c), Anchor::End)))
        }
        _ => None,
    }
}

impl Generator {
    pub(crate) fn try_promote_to_like(
        &mut self,
        left: &Expr,
        right: &Expr,
        op: &'static str,
    ) -> GenResult<Option<Fragment>> {
        let Some((argument, pattern)) = recognize(left, right, op) else {
            return Ok(None);
        };
        let pattern = match pattern {
            Pattern::Parameter(p) => self.scalar(p)?,
            Pattern::Text(value, anchor) => {
                let escaped = self.dialect.escape_like(&value);
                Fragment::Literal(match anchor {
                    Anchor::Start => format!("'{}%'", escaped),
                    Anchor::End => format!("'%{}'", escaped),
                    Anchor::Anywhere => format!("'%{}%'", escaped),
                })
            }
        };
        Ok(Some(Fragment::Like {
            argument: Box::new(self.scalar(argument)?),
            pattern: Box::new(pattern),
            escape: None,
            negated: false,
        }))
    }
}
