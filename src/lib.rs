//! # xgsql
//!
//! Lowers provider command trees (query, insert, update, delete and
//! function invocations) into SQL text for the Xugu database.
//!
//! ## Quick Example
//!
//! ```
//! use xgsql::prelude::*;
//!
//! let users = entity_set(
//!     "Users",
//!     entity("User", &[("Id", PrimitiveKind::Int32), ("Name", PrimitiveKind::String)], &["Id"]),
//! );
//! let tree = CommandTree::Query(project(
//!     bind(scan(users), "u"),
//!     vec![("Key", col("u", "Id"))],
//! ));
//!
//! let cmd = generate(&tree, &GeneratorConfig::default()).unwrap();
//! assert_eq!(cmd.sql, r#"SELECT "u"."Id" AS "Key" FROM "Users" AS "u""#);
//! ```
//!
//! ## Pipeline
//!
//! | Stage      | Module        | Output                               |
//! |------------|---------------|--------------------------------------|
//! | Lowering   | [`generator`] | fragments in an [`fragment::Arena`]  |
//! | Rewriting  | [`optimizer`] | fused selects, IN lists, GROUP BY    |
//! | Assembly   | [`statement`] | [`GeneratedCommand`]                 |

pub mod ast;
pub mod config;
pub mod dialect;
pub mod error;
pub mod fragment;
pub mod generator;
pub mod optimizer;
pub mod scope;
pub mod statement;

pub use config::GeneratorConfig;
pub use error::{ConfigError, GenResult, SqlGenError};
pub use generator::Parameter;
pub use statement::{CommandType, GeneratedCommand, generate};

pub mod prelude {
    pub use crate::ast::builders::*;
    pub use crate::ast::*;
    pub use crate::config::GeneratorConfig;
    pub use crate::error::*;
    pub use crate::statement::{CommandType, GeneratedCommand, generate};
}
