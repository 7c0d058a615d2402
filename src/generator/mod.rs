//! Expression lowering: command-tree nodes to fragments.
//!
//! One [`Generator`] lowers one statement. It owns the input arena, the
//! scope table and the parameters collected along the way.

pub mod functions;
pub mod like;
pub mod relational;

use serde::Serialize;

use crate::ast::{ArithOp, Constant, Expr, PrimitiveKind, Value};
use crate::config::GeneratorConfig;
use crate::dialect::{DbType, SqlDialect, XuguDialect, normalize_value};
use crate::error::{GenResult, SqlGenError};
use crate::fragment::{
    Arena, BinaryFragment, ColumnFragment, Fragment, Input, InputId, SelectStatement, SqlWriter,
};
use crate::optimizer::in_list;
use crate::scope::Scope;

/// A bound parameter produced for a non-numeric constant.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Parameter {
    pub name: String,
    pub db_type: DbType,
    pub value: Value,
}

/// Result of lowering one node.
#[derive(Debug, Clone, PartialEq)]
pub enum Lowered {
    Scalar(Fragment),
    Input(InputId),
}

pub struct Generator {
    pub(crate) arena: Arena,
    pub(crate) scope: Scope,
    pub(crate) dialect: XuguDialect,
    parameters: Vec<Parameter>,
    max_depth: usize,
    depth: usize,
    /// Statement kind, for diagnostics.
    pub(crate) statement: &'static str,
}

impl Generator {
    pub fn new(config: &GeneratorConfig, statement: &'static str) -> Self {
        Self {
            arena: Arena::new(),
            scope: Scope::new(),
            dialect: XuguDialect::new(config.dialect.clone()),
            parameters: Vec::new(),
            max_depth: config.max_depth,
            depth: 0,
            statement,
        }
    }

    pub fn writer(&self) -> SqlWriter<'_> {
        SqlWriter::new(&self.arena, &self.dialect)
    }

    pub fn into_parameters(self) -> Vec<Parameter> {
        self.parameters
    }

    /// Lower one node, bounded by the configured depth.
    pub fn lower(&mut self, e: &Expr) -> GenResult<Lowered> {
        if self.depth >= self.max_depth {
            return Err(SqlGenError::RecursionLimit {
                depth: self.max_depth,
            });
        }
        self.depth += 1;
        let result = self.dispatch(e);
        self.depth -= 1;
        result
    }

    /// Lower a node in value position. Collection operators become scalar subqueries
    /// and their range variables do not outlive them.
    pub fn scalar(&mut self, e: &Expr) -> GenResult<Fragment> {
        let checkpoint = e.is_relational().then(|| self.scope.checkpoint());
        let lowered = self.lower(e)?;
        if let Some(cp) = checkpoint {
            self.scope.restore(cp);
        }
        Ok(match lowered {
            Lowered::Scalar(f) => f,
            Lowered::Input(id) => Fragment::Query(id),
        })
    }

    /// Lower a node that must produce an input fragment.
    pub fn input(&mut self, e: &Expr) -> GenResult<InputId> {
        match self.lower(e)? {
            Lowered::Input(id) => Ok(id),
            Lowered::Scalar(_) => Err(SqlGenError::malformed("collection expression", e)),
        }
    }

    pub(crate) fn select_mut(&mut self, id: InputId) -> GenResult<&mut SelectStatement> {
        match self.arena.get_mut(id) {
            Input::Select(s) => Ok(s),
            other => Err(SqlGenError::malformed("select", &*other)),
        }
    }

    fn dispatch(&mut self, e: &Expr) -> GenResult<Lowered> {
        let scalar = match e {
            Expr::Constant(c) => self.constant(c)?,
            Expr::Null => Fragment::literal("NULL"),
            Expr::ParameterRef(name) => Fragment::Literal(self.dialect.parameter_ref(name)),
            Expr::VariableRef(_) => return Err(SqlGenError::malformed("property access", e)),
            Expr::Property { .. } => self.property(e)?,
            Expr::NewInstance(_) => {
                return Err(SqlGenError::NotImplemented {
                    kind: e.kind_name(),
                    statement: self.statement,
                });
            }
            Expr::Scan(set) => return Ok(Lowered::Input(self.scan(set))),
            Expr::Filter { input, predicate } => {
                return self.filter(input, predicate).map(Lowered::Input);
            }
            Expr::Project { input, projection } => {
                return self.project(input, projection).map(Lowered::Input);
            }
            Expr::Join {
                kind,
                left,
                right,
                condition,
            } => {
                return self
                    .join(*kind, left, right, condition.as_deref())
                    .map(Lowered::Input);
            }
            Expr::CrossJoin(inputs) => return self.cross_join(e, inputs).map(Lowered::Input),
            Expr::Apply { kind, input, apply } => {
                return self.apply(*kind, input, apply).map(Lowered::Input);
            }
            Expr::GroupBy {
                input,
                keys,
                aggregates,
            } => return self.group_by(input, keys, aggregates).map(Lowered::Input),
            Expr::Sort { input, keys } => return self.sort(input, keys).map(Lowered::Input),
            Expr::Skip { input, keys, count } => {
                return self.skip(input, keys, count).map(Lowered::Input);
            }
            Expr::Limit { argument, limit } => {
                let limit = self.scalar(limit)?;
                return self.limit(argument, limit).map(Lowered::Input);
            }
            Expr::Element(argument) => {
                return self
                    .limit(argument, Fragment::literal("1"))
                    .map(Lowered::Input);
            }
            Expr::Distinct(argument) => return self.distinct(argument).map(Lowered::Input),
            Expr::UnionAll { left, right } => {
                return self.union_all(left, right).map(Lowered::Input);
            }
            Expr::IsEmpty(argument) => self.is_empty(argument)?,
            Expr::Quantifier {
                kind,
                input,
                predicate,
            } => self.quantifier(*kind, input, predicate)?,
            Expr::Case {
                when,
                then,
                otherwise,
            } => self.case(e, when, then, otherwise.as_deref())?,
            Expr::Function { function, args } => self.function(function, args)?,
            Expr::Comparison { op, left, right } => self.binary(left, right, op.as_sql())?,
            Expr::Arithmetic { op, args } => self.arithmetic(e, *op, args)?,
            Expr::And(left, right) => self.binary(left, right, "AND")?,
            Expr::Or(left, right) => in_list::promote_to_in(self.binary(left, right, "OR")?),
            Expr::Not(argument) => self.scalar(argument)?.negate(),
            Expr::IsNull(argument) => Fragment::IsNull {
                argument: Box::new(self.scalar(argument)?),
                negated: false,
            },
            Expr::Like {
                argument,
                pattern,
                escape,
            } => Fragment::Like {
                argument: Box::new(self.scalar(argument)?),
                pattern: Box::new(self.scalar(pattern)?),
                escape: match escape {
                    Some(esc) => Some(Box::new(self.scalar(esc)?)),
                    None => None,
                },
                negated: false,
            },
            Expr::In { item, list } => {
                let argument = self.scalar(item)?;
                let list = list
                    .iter()
                    .map(|i| self.scalar(i))
                    .collect::<GenResult<Vec<_>>>()?;
                Fragment::In {
                    argument: Box::new(argument),
                    list,
                    negated: false,
                }
            }
            Expr::Cast { argument, .. } => return self.lower(argument),
            Expr::Intersect { .. }
            | Expr::Except { .. }
            | Expr::Treat { .. }
            | Expr::OfType { .. }
            | Expr::IsOf { .. }
            | Expr::Ref(_)
            | Expr::Deref(_)
            | Expr::RefKey(_)
            | Expr::EntityRef(_)
            | Expr::Navigation { .. }
            | Expr::Lambda { .. } => return Err(SqlGenError::unsupported(e.kind_name())),
        };
        Ok(Lowered::Scalar(scalar))
    }

    /// Numeric kinds render inline, booleans as `1`/`0`, everything else is bound.
    fn constant(&mut self, c: &Constant) -> GenResult<Fragment> {
        if c.value == Value::Null {
            return Ok(Fragment::literal("NULL"));
        }
        if c.kind == PrimitiveKind::Boolean {
            let b = match &c.value {
                Value::Bool(b) => *b,
                other => c.as_i64().map(|n| n != 0).unwrap_or(other.to_string() == "true"),
            };
            return Ok(Fragment::Literal(self.dialect.bool_literal(b)));
        }
        if c.kind.is_numeric() {
            return match &c.value {
                Value::Int(n) => Ok(Fragment::Literal(n.to_string())),
                Value::Decimal(d) => Ok(Fragment::Literal(d.to_string())),
                Value::Float(f) if f.is_finite() => Ok(Fragment::Literal(f.to_string())),
                _ => Err(SqlGenError::malformed("finite numeric constant", c)),
            };
        }
        let name = self.dialect.parameter_name(self.parameters.len() + 1);
        self.parameters.push(Parameter {
            name: name.clone(),
            db_type: DbType::from(c.kind),
            value: normalize_value(c.kind, &c.value),
        });
        Ok(Fragment::Literal(name))
    }

    /// Flatten `a.b.c` into `[a, b, c]`. Each link counts against the depth limit.
    fn property_chain(&self, e: &Expr) -> GenResult<Vec<String>> {
        let mut chain = Vec::new();
        let mut node = e;
        loop {
            if self.depth + chain.len() >= self.max_depth {
                return Err(SqlGenError::RecursionLimit {
                    depth: self.max_depth,
                });
            }
            match node {
                Expr::VariableRef(name) => {
                    chain.push(name.clone());
                    break;
                }
                Expr::Property { instance, property } => {
                    chain.push(property.clone());
                    node = instance;
                }
                other => return Err(SqlGenError::malformed("property path", other)),
            }
        }
        chain.reverse();
        Ok(chain)
    }

    /// Resolve a property path to a column of the input that owns its prefix.
    fn property(&mut self, e: &Expr) -> GenResult<Fragment> {
        let chain = self.property_chain(e)?;
        let (owner, x) = self
            .scope
            .find_input(&self.arena, &chain)
            .ok_or_else(|| SqlGenError::UnboundVariable {
                path: chain.join("."),
            })?;
        let last = chain[chain.len() - 1].clone();
        let owner_name = self.arena.name(owner).map(str::to_string);
        let mut column = ColumnFragment::new(owner_name.clone(), last.clone());
        column.origin = chain.clone();

        match self.arena.get(owner) {
            Input::Table(_) => {
                // A fused select hands its table its own name; undo its renames.
                let renamed = owner_name
                    .as_deref()
                    .and_then(|n| self.scope.get(n))
                    .and_then(|id| self.arena.select(id))
                    .and_then(|s| {
                        s.columns.iter().find(|c| {
                            c.literal.is_none() && c.alias.as_deref() == Some(last.as_str())
                        })
                    });
                if let Some(source) = renamed {
                    column.name = source.name.clone();
                    column.alias = source.alias.clone();
                }
            }
            Input::Select(_) | Input::Union(_) => {
                let suffix = &chain[x + 1..];
                let outputs = self.arena.output_columns(owner);
                let found = outputs
                    .iter()
                    .find(|c| c.origin == suffix)
                    .or_else(|| outputs.iter().find(|c| c.output_name() == Some(last.as_str())));
                if let Some(out) = found.and_then(|c| c.output_name()) {
                    column.name = Some(out.to_string());
                }
            }
            Input::Join(_) => {}
        }
        Ok(Fragment::Column(column))
    }

    /// Comparison and logical operators, after trying LIKE promotion.
    fn binary(&mut self, left: &Expr, right: &Expr, op: &'static str) -> GenResult<Fragment> {
        if let Some(like) = self.try_promote_to_like(left, right, op)? {
            return Ok(like);
        }
        let mut b = BinaryFragment::new(self.scalar(left)?, op, self.scalar(right)?);
        b.wrap_left = !left.is_atomic();
        b.wrap_right = !right.is_atomic();
        Ok(Fragment::Binary(b))
    }

    fn arithmetic(&mut self, e: &Expr, op: ArithOp, args: &[Expr]) -> GenResult<Fragment> {
        let symbol = match op {
            ArithOp::Negate => {
                let [argument] = args else {
                    return Err(SqlGenError::malformed("one operand", e));
                };
                return Ok(Fragment::Template {
                    template: "-({0})",
                    args: vec![self.scalar(argument)?],
                });
            }
            ArithOp::Plus => "+",
            ArithOp::Minus => "-",
            ArithOp::Multiply => "*",
            ArithOp::Divide => "/",
            ArithOp::Modulo => "%",
        };
        let [left, right] = args else {
            return Err(SqlGenError::malformed("two operands", e));
        };
        self.binary(left, right, symbol)
    }

    fn case(
        &mut self,
        e: &Expr,
        when: &[Expr],
        then: &[Expr],
        otherwise: Option<&Expr>,
    ) -> GenResult<Fragment> {
        if when.len() != then.len() {
            return Err(SqlGenError::malformed("matching WHEN and THEN counts", e));
        }
        let mut branches = Vec::with_capacity(when.len());
        for (w, t) in when.iter().zip(then) {
            branches.push((self.scalar(w)?, self.scalar(t)?));
        }
        let otherwise = match otherwise {
            Some(Expr::Null) | None => None,
            Some(o) => Some(Box::new(self.scalar(o)?)),
        };
        Ok(Fragment::Case {
            branches,
            otherwise,
        })
    }
}
