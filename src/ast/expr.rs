use serde::{Deserialize, Serialize};

use crate::ast::{Constant, EntitySet, FunctionMeta, PrimitiveKind};

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompareOp {
    Eq,
    Ne,
    Gt,
    Ge,
    Lt,
    Le,
}

impl CompareOp {
    pub fn as_sql(&self) -> &'static str {
        match self {
            CompareOp::Eq => "=",
            CompareOp::Ne => "<>",
            CompareOp::Gt => ">",
            CompareOp::Ge => ">=",
            CompareOp::Lt => "<",
            CompareOp::Le => "<=",
        }
    }
}

/// Arithmetic operators. `Negate` is the only unary one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ArithOp {
    Plus,
    Minus,
    Multiply,
    Divide,
    Modulo,
    Negate,
}

/// The five join kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JoinKind {
    Cross,
    Inner,
    LeftOuter,
    RightOuter,
    FullOuter,
}

impl JoinKind {
    pub fn as_sql(&self) -> &'static str {
        match self {
            JoinKind::Cross => "CROSS JOIN",
            JoinKind::Inner => "INNER JOIN",
            JoinKind::LeftOuter => "LEFT OUTER JOIN",
            JoinKind::RightOuter => "RIGHT OUTER JOIN",
            JoinKind::FullOuter => "FULL OUTER JOIN",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ApplyKind {
    Cross,
    Outer,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuantifierKind {
    Any,
    All,
}

/// An input expression bound to a range variable.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Binding {
    pub expr: Box<Expr>,
    pub var: String,
}

/// Group-by input: rows are bound to `var`, the grouped collection to `group_var`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupBinding {
    pub expr: Box<Expr>,
    pub var: String,
    pub group_var: String,
}

/// A named member of a row constructor or a group key.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Field {
    pub name: String,
    pub value: Expr,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SortKey {
    pub expr: Expr,
    #[serde(default = "ascending_default")]
    pub ascending: bool,
}

fn ascending_default() -> bool {
    true
}

/// A function aggregate computed per group, exposed as output property `name`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Aggregate {
    pub name: String,
    pub function: FunctionMeta,
    #[serde(default)]
    pub distinct: bool,
    pub args: Vec<Expr>,
}

/// One command-tree operator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    Constant(Constant),
    Null,
    ParameterRef(String),
    VariableRef(String),
    Property {
        instance: Box<Expr>,
        property: String,
    },
    Scan(EntitySet),
    Filter {
        input: Binding,
        predicate: Box<Expr>,
    },
    Project {
        input: Binding,
        projection: Box<Expr>,
    },
    /// Row constructor; the projection payload of `Project`.
    NewInstance(Vec<Field>),
    Join {
        kind: JoinKind,
        left: Binding,
        right: Binding,
        #[serde(default)]
        condition: Option<Box<Expr>>,
    },
    CrossJoin(Vec<Binding>),
    Apply {
        kind: ApplyKind,
        input: Binding,
        apply: Binding,
    },
    GroupBy {
        input: GroupBinding,
        keys: Vec<Field>,
        aggregates: Vec<Aggregate>,
    },
    Sort {
        input: Binding,
        keys: Vec<SortKey>,
    },
    Skip {
        input: Binding,
        keys: Vec<SortKey>,
        count: Box<Expr>,
    },
    Limit {
        argument: Box<Expr>,
        limit: Box<Expr>,
    },
    Distinct(Box<Expr>),
    Element(Box<Expr>),
    UnionAll {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Intersect {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Except {
        left: Box<Expr>,
        right: Box<Expr>,
    },
    IsEmpty(Box<Expr>),
    Quantifier {
        kind: QuantifierKind,
        input: Binding,
        predicate: Box<Expr>,
    },
    Case {
        when: Vec<Expr>,
        then: Vec<Expr>,
        #[serde(default)]
        otherwise: Option<Box<Expr>>,
    },
    Function {
        function: FunctionMeta,
        args: Vec<Expr>,
    },
    Comparison {
        op: CompareOp,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    Arithmetic {
        op: ArithOp,
        args: Vec<Expr>,
    },
    And(Box<Expr>, Box<Expr>),
    Or(Box<Expr>, Box<Expr>),
    Not(Box<Expr>),
    IsNull(Box<Expr>),
    Like {
        argument: Box<Expr>,
        pattern: Box<Expr>,
        #[serde(default)]
        escape: Option<Box<Expr>>,
    },
    In {
        item: Box<Expr>,
        list: Vec<Expr>,
    },
    Cast {
        argument: Box<Expr>,
        target: PrimitiveKind,
    },
    Treat {
        argument: Box<Expr>,
        type_name: String,
    },
    OfType {
        argument: Box<Expr>,
        type_name: String,
    },
    IsOf {
        argument: Box<Expr>,
        type_name: String,
    },
    Ref(Box<Expr>),
    Deref(Box<Expr>),
    RefKey(Box<Expr>),
    EntityRef(Box<Expr>),
    Navigation {
        source: Box<Expr>,
        relationship: String,
    },
    Lambda {
        params: Vec<String>,
        body: Box<Expr>,
    },
}

impl Expr {
    /// Node kind name used in diagnostics.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Expr::Constant(_) => "Constant",
            Expr::Null => "Null",
            Expr::ParameterRef(_) => "ParameterReference",
            Expr::VariableRef(_) => "VariableReference",
            Expr::Property { .. } => "Property",
            Expr::Scan(_) => "Scan",
            Expr::Filter { .. } => "Filter",
            Expr::Project { .. } => "Project",
            Expr::NewInstance(_) => "NewInstance",
            Expr::Join { .. } => "Join",
            Expr::CrossJoin(_) => "CrossJoin",
            Expr::Apply { kind: ApplyKind::Cross, .. } => "CrossApply",
            Expr::Apply { kind: ApplyKind::Outer, .. } => "OuterApply",
            Expr::GroupBy { .. } => "GroupBy",
            Expr::Sort { .. } => "Sort",
            Expr::Skip { .. } => "Skip",
            Expr::Limit { .. } => "Limit",
            Expr::Distinct(_) => "Distinct",
            Expr::Element(_) => "Element",
            Expr::UnionAll { .. } => "UnionAll",
            Expr::Intersect { .. } => "Intersect",
            Expr::Except { .. } => "Except",
            Expr::IsEmpty(_) => "IsEmpty",
            Expr::Quantifier { kind: QuantifierKind::Any, .. } => "Any",
            Expr::Quantifier { kind: QuantifierKind::All, .. } => "All",
            Expr::Case { .. } => "Case",
            Expr::Function { .. } => "Function",
            Expr::Comparison { .. } => "Comparison",
            Expr::Arithmetic { .. } => "Arithmetic",
            Expr::And(..) => "And",
            Expr::Or(..) => "Or",
            Expr::Not(_) => "Not",
            Expr::IsNull(_) => "IsNull",
            Expr::Like { .. } => "Like",
            Expr::In { .. } => "In",
            Expr::Cast { .. } => "Cast",
            Expr::Treat { .. } => "Treat",
            Expr::OfType { .. } => "OfType",
            Expr::IsOf { .. } => "IsOf",
            Expr::Ref(_) => "Ref",
            Expr::Deref(_) => "Deref",
            Expr::RefKey(_) => "RefKey",
            Expr::EntityRef(_) => "EntityRef",
            Expr::Navigation { .. } => "RelationshipNavigation",
            Expr::Lambda { .. } => "Lambda",
        }
    }

    /// Operands that render without surrounding parentheses.
    pub fn is_atomic(&self) -> bool {
        matches!(
            self,
            Expr::Property { .. } | Expr::ParameterRef(_) | Expr::Constant(_)
        )
    }

    /// Collection-valued operators, lowered to input fragments.
    pub fn is_relational(&self) -> bool {
        matches!(
            self,
            Expr::Scan(_)
                | Expr::Filter { .. }
                | Expr::Project { .. }
                | Expr::Join { .. }
                | Expr::CrossJoin(_)
                | Expr::Apply { .. }
                | Expr::GroupBy { .. }
                | Expr::Sort { .. }
                | Expr::Skip { .. }
                | Expr::Limit { .. }
                | Expr::Distinct(_)
                | Expr::UnionAll { .. }
                | Expr::Intersect { .. }
                | Expr::Except { .. }
        )
    }

    /// Canonical function name when this node calls a function of the canonical library.
    pub fn canonical_call(&self) -> Option<(&str, &[Expr])> {
        match self {
            Expr::Function { function, args } if function.is_canonical() => {
                Some((function.name.as_str(), args.as_slice()))
            }
            _ => None,
        }
    }
}
