//! Query-shape passes over lowered fragments.
//!
//! - [`fusion`]: fold a wrapping select into the select it reads from
//! - [`group_by`]: collapse distinct keys plus a correlated aggregate into GROUP BY
//! - [`in_list`]: merge OR-ed equality tests on one column into IN
//!
//! LIKE promotion works on command-tree shapes and lives with the generator.

pub mod fusion;
pub mod group_by;
pub mod in_list;

pub use fusion::{fuse_tree, try_fuse};
pub use group_by::flatten_group_by;
pub use in_list::promote_to_in;
