//! Fragment model: the intermediate form between command trees and SQL text.
//!
//! Scalar pieces are owned [`Fragment`] values. Input pieces (tables,
//! selects, joins, unions) live in an [`Arena`] and are addressed by
//! [`InputId`], so the scope table and the fragment tree observe the same
//! node when it is renamed, wrapped or fused.

pub mod input;
pub mod render;

pub use self::input::{
    Arena, ClauseKind, Input, InputId, JoinFragment, SelectStatement, SortFragment,
    TableFragment, UnionFragment,
};
pub use self::render::SqlWriter;

/// A column reference, or a computed projection carried in `literal`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ColumnFragment {
    /// Alias of the owning input; `None` renders the column unqualified.
    pub table: Option<String>,
    pub name: Option<String>,
    /// Output alias in a projection list.
    pub alias: Option<String>,
    pub literal: Option<Box<Fragment>>,
    /// Property path outer scopes use to address this column.
    pub origin: Vec<String>,
}

impl ColumnFragment {
    pub fn new(table: Option<String>, name: impl Into<String>) -> Self {
        Self {
            table,
            name: Some(name.into()),
            ..Default::default()
        }
    }

    pub fn computed(literal: Fragment) -> Self {
        Self {
            literal: Some(Box::new(literal)),
            ..Default::default()
        }
    }

    /// Name under which the column is visible to an enclosing select.
    pub fn output_name(&self) -> Option<&str> {
        self.alias.as_deref().or(self.name.as_deref())
    }

    /// Same underlying value, ignoring alias and origin.
    pub fn same_source(&self, other: &ColumnFragment) -> bool {
        self.table == other.table && self.name == other.name && self.literal == other.literal
    }
}

/// `left <op> right`.
#[derive(Debug, Clone, PartialEq)]
pub struct BinaryFragment {
    pub left: Box<Fragment>,
    pub op: &'static str,
    pub right: Box<Fragment>,
    pub wrap_left: bool,
    pub wrap_right: bool,
    pub negated: bool,
}

impl BinaryFragment {
    pub fn new(left: Fragment, op: &'static str, right: Fragment) -> Self {
        Self {
            left: Box::new(left),
            op,
            right: Box::new(right),
            wrap_left: false,
            wrap_right: false,
            negated: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Fragment {
    Literal(String),
    Column(ColumnFragment),
    Binary(BinaryFragment),
    /// `name(args)`; niladic functions render without parentheses.
    Function {
        name: String,
        args: Vec<Fragment>,
        distinct: bool,
        niladic: bool,
    },
    /// Positional template with `{n}` placeholders.
    Template {
        template: &'static str,
        args: Vec<Fragment>,
    },
    /// Comma separated list.
    List(Vec<Fragment>),
    In {
        argument: Box<Fragment>,
        list: Vec<Fragment>,
        negated: bool,
    },
    Like {
        argument: Box<Fragment>,
        pattern: Box<Fragment>,
        escape: Option<Box<Fragment>>,
        negated: bool,
    },
    IsNull {
        argument: Box<Fragment>,
        negated: bool,
    },
    Case {
        branches: Vec<(Fragment, Fragment)>,
        otherwise: Option<Box<Fragment>>,
    },
    Exists {
        input: InputId,
        negated: bool,
    },
    /// Scalar subquery.
    Query(InputId),
    Not(Box<Fragment>),
}

impl Fragment {
    pub fn literal(text: impl Into<String>) -> Self {
        Fragment::Literal(text.into())
    }

    pub fn and(left: Fragment, right: Fragment) -> Self {
        let mut b = BinaryFragment::new(left, "AND", right);
        b.wrap_left = true;
        b.wrap_right = true;
        Fragment::Binary(b)
    }

    /// Logical negation: negatable fragments flip their flag, others are wrapped.
    pub fn negate(self) -> Self {
        match self {
            Fragment::Binary(mut b) => {
                b.negated = !b.negated;
                Fragment::Binary(b)
            }
            Fragment::In {
                argument,
                list,
                negated,
            } => Fragment::In {
                argument,
                list,
                negated: !negated,
            },
            Fragment::Like {
                argument,
                pattern,
                escape,
                negated,
            } => Fragment::Like {
                argument,
                pattern,
                escape,
                negated: !negated,
            },
            Fragment::IsNull { argument, negated } => Fragment::IsNull {
                argument,
                negated: !negated,
            },
            Fragment::Exists { input, negated } => Fragment::Exists {
                input,
                negated: !negated,
            },
            Fragment::Not(inner) => *inner,
            other => Fragment::Not(Box::new(other)),
        }
    }

    pub fn as_column(&self) -> Option<&ColumnFragment> {
        match self {
            Fragment::Column(c) => Some(c),
            _ => None,
        }
    }

    /// Visit every column in this fragment, not descending into subqueries.
    pub fn for_each_column_mut(&mut self, f: &mut dyn FnMut(&mut ColumnFragment)) {
        match self {
            Fragment::Column(c) => {
                if let Some(lit) = c.literal.as_mut() {
                    lit.for_each_column_mut(f);
                }
                f(c);
            }
            Fragment::Binary(b) => {
                b.left.for_each_column_mut(f);
                b.right.for_each_column_mut(f);
            }
            Fragment::Function { args, .. }
            | Fragment::Template { args, .. }
            | Fragment::List(args) => {
                for a in args {
                    a.for_each_column_mut(f);
                }
            }
            Fragment::In { argument, list, .. } => {
                argument.for_each_column_mut(f);
                for a in list {
                    a.for_each_column_mut(f);
                }
            }
            Fragment::Like {
                argument,
                pattern,
                escape,
                ..
            } => {
                argument.for_each_column_mut(f);
                pattern.for_each_column_mut(f);
                if let Some(e) = escape {
                    e.for_each_column_mut(f);
                }
            }
            Fragment::IsNull { argument, .. } | Fragment::Not(argument) => {
                argument.for_each_column_mut(f)
            }
            Fragment::Case {
                branches,
                otherwise,
            } => {
                for (w, t) in branches {
                    w.for_each_column_mut(f);
                    t.for_each_column_mut(f);
                }
                if let Some(o) = otherwise {
                    o.for_each_column_mut(f);
                }
            }
            Fragment::Literal(_) | Fragment::Exists { .. } | Fragment::Query(_) => {}
        }
    }

    /// Subquery inputs referenced from this fragment.
    pub fn collect_inputs(&self, out: &mut Vec<InputId>) {
        match self {
            Fragment::Exists { input, .. } | Fragment::Query(input) => out.push(*input),
            Fragment::Column(c) => {
                if let Some(lit) = &c.literal {
                    lit.collect_inputs(out);
                }
            }
            Fragment::Binary(b) => {
                b.left.collect_inputs(out);
                b.right.collect_inputs(out);
            }
            Fragment::Function { args, .. }
            | Fragment::Template { args, .. }
            | Fragment::List(args) => args.iter().for_each(|a| a.collect_inputs(out)),
            Fragment::In { argument, list, .. } => {
                argument.collect_inputs(out);
                list.iter().for_each(|a| a.collect_inputs(out));
            }
            Fragment::Like {
                argument, pattern, ..
            } => {
                argument.collect_inputs(out);
                pattern.collect_inputs(out);
            }
            Fragment::IsNull { argument, .. } | Fragment::Not(argument) => {
                argument.collect_inputs(out)
            }
            Fragment::Case {
                branches,
                otherwise,
            } => {
                for (w, t) in branches {
                    w.collect_inputs(out);
                    t.collect_inputs(out);
                }
                if let Some(o) = otherwise {
                    o.collect_inputs(out);
                }
            }
            Fragment::Literal(_) => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn column(table: &str, name: &str) -> Fragment {
        Fragment::Column(ColumnFragment::new(Some(table.to_string()), name))
    }

    #[test]
    fn test_negate_flips_flags() {
        let b = Fragment::Binary(BinaryFragment::new(column("t", "A"), "=", Fragment::literal("1")));
        match b.negate() {
            Fragment::Binary(b) => assert!(b.negated),
            other => panic!("unexpected {:?}", other),
        }

        let n = Fragment::IsNull {
            argument: Box::new(column("t", "A")),
            negated: false,
        };
        assert!(matches!(n.negate(), Fragment::IsNull { negated: true, .. }));
    }

    #[test]
    fn test_double_negation_unwraps() {
        let f = Fragment::literal("1").negate();
        assert!(matches!(f, Fragment::Not(_)));
        assert_eq!(f.negate(), Fragment::literal("1"));
    }

    #[test]
    fn test_same_source_ignores_alias() {
        let mut a = ColumnFragment::new(Some("t".into()), "Id");
        let b = ColumnFragment::new(Some("t".into()), "Id");
        a.alias = Some("Key".into());
        assert!(a.same_source(&b));
        assert!(!a.same_source(&ColumnFragment::new(Some("u".into()), "Id")));
    }
}
