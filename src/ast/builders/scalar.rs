//! Scalar builders (literals, references, predicates, function calls).

use crate::ast::{ArithOp, CompareOp, Constant, Expr, FunctionMeta, PrimitiveKind, Value};

pub fn var(name: &str) -> Expr {
    Expr::VariableRef(name.to_string())
}

pub fn prop(instance: Expr, property: &str) -> Expr {
    Expr::Property {
        instance: Box::new(instance),
        property: property.to_string(),
    }
}

/// `var.property`
pub fn col(var_name: &str, property: &str) -> Expr {
    prop(var(var_name), property)
}

pub fn param(name: &str) -> Expr {
    Expr::ParameterRef(name.to_string())
}

pub fn null() -> Expr {
    Expr::Null
}

pub fn int(n: i64) -> Expr {
    Expr::Constant(Constant::new(PrimitiveKind::Int32, n))
}

pub fn float(n: f64) -> Expr {
    Expr::Constant(Constant::new(PrimitiveKind::Double, n))
}

pub fn string(s: &str) -> Expr {
    Expr::Constant(Constant::new(PrimitiveKind::String, s))
}

pub fn boolean(b: bool) -> Expr {
    Expr::Constant(Constant::new(PrimitiveKind::Boolean, Value::Bool(b)))
}

pub fn compare(op: CompareOp, left: Expr, right: Expr) -> Expr {
    Expr::Comparison {
        op,
        left: Box::new(left),
        right: Box::new(right),
    }
}

pub fn eq(left: Expr, right: Expr) -> Expr {
    compare(CompareOp::Eq, left, right)
}

pub fn ne(left: Expr, right: Expr) -> Expr {
    compare(CompareOp::Ne, left, right)
}

pub fn gt(left: Expr, right: Expr) -> Expr {
    compare(CompareOp::Gt, left, right)
}

pub fn ge(left: Expr, right: Expr) -> Expr {
    compare(CompareOp::Ge, left, right)
}

pub fn lt(left: Expr, right: Expr) -> Expr {
    compare(CompareOp::Lt, left, right)
}

pub fn le(left: Expr, right: Expr) -> Expr {
    compare(CompareOp::Le, left, right)
}

pub fn and(left: Expr, right: Expr) -> Expr {
    Expr::And(Box::new(left), Box::new(right))
}

pub fn or(left: Expr, right: Expr) -> Expr {
    Expr::Or(Box::new(left), Box::new(right))
}

pub fn not(argument: Expr) -> Expr {
    Expr::Not(Box::new(argument))
}

pub fn is_null(argument: Expr) -> Expr {
    Expr::IsNull(Box::new(argument))
}

pub fn like(argument: Expr, pattern: Expr) -> Expr {
    Expr::Like {
        argument: Box::new(argument),
        pattern: Box::new(pattern),
        escape: None,
    }
}

pub fn in_list(item: Expr, list: Vec<Expr>) -> Expr {
    Expr::In {
        item: Box::new(item),
        list,
    }
}

pub fn arith(op: ArithOp, args: Vec<Expr>) -> Expr {
    Expr::Arithmetic { op, args }
}

pub fn negate(argument: Expr) -> Expr {
    arith(ArithOp::Negate, vec![argument])
}

/// Call to a canonical library function.
pub fn call(name: &str, args: Vec<Expr>) -> Expr {
    Expr::Function {
        function: FunctionMeta::canonical(name),
        args,
    }
}

pub fn store_call(function: FunctionMeta, args: Vec<Expr>) -> Expr {
    Expr::Function { function, args }
}

pub fn case(when: Vec<Expr>, then: Vec<Expr>, otherwise: Option<Expr>) -> Expr {
    Expr::Case {
        when,
        then,
        otherwise: otherwise.map(Box::new),
    }
}
