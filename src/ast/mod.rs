pub mod builders;
pub mod expr;
pub mod metadata;
pub mod tree;
pub mod values;

pub use self::expr::{
    Aggregate, ApplyKind, ArithOp, Binding, CompareOp, Expr, Field, GroupBinding, JoinKind,
    QuantifierKind, SortKey,
};
pub use self::metadata::{
    CANONICAL_NAMESPACE, EntitySet, EntityType, FunctionMeta, PrimitiveKind, Property,
    StoreGenerated,
};
pub use self::tree::{CommandTree, SetClause};
pub use self::values::{Constant, Value};
