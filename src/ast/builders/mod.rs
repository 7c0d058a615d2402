//! Ergonomic builder functions for command-tree nodes.
//!
//! These construct [`Expr`](crate::ast::Expr) values and metadata without
//! spelling out boxed struct variants.
//!
//! # Modules
//!
//! - `relational` - entity sets, scans, bindings and the collection operators
//! - `scalar` - literals, comparisons, logical operators and function calls
//!
//! # Example
//! ```ignore
//! use xgsql::ast::builders::*;
//! use xgsql::ast::PrimitiveKind::*;
//!
//! let users = entity_set("Users", entity("User", &[("Id", Int32), ("Name", String)], &["Id"]));
//! let query = filter(bind(scan(users), "u"), eq(col("u", "Name"), string("x")));
//! ```

pub mod relational;
pub mod scalar;

pub use relational::{
    aggregate, all, any, apply, asc, bind, cross_join, desc, distinct, element, entity,
    entity_set, filter, group_bind, group_by, is_empty, join, limit, project, scan, skip, sort,
    union_all,
};
pub use scalar::{
    and, arith, boolean, call, case, col, compare, eq, float, ge, gt, in_list, int, is_null, le,
    like, lt, ne, negate, not, null, or, param, prop, store_call, string, var,
};
