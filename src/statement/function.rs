//! Function command generation.

use crate::ast::FunctionMeta;
use crate::config::GeneratorConfig;
use crate::dialect::{SqlDialect, XuguDialect};
use crate::statement::{CommandType, GeneratedCommand};

/// A function with command text runs that text; anything else is invoked
/// as a stored procedure by its schema-qualified store name.
pub fn build_function(function: &FunctionMeta, config: &GeneratorConfig) -> GeneratedCommand {
    if let Some(text) = &function.command_text {
        return GeneratedCommand {
            sql: text.clone(),
            parameters: Vec::new(),
            command_type: CommandType::Text,
        };
    }
    let dialect = XuguDialect::new(config.dialect.clone());
    GeneratedCommand {
        sql: dialect.table_name(function.schema.as_deref(), function.physical_name()),
        parameters: Vec::new(),
        command_type: CommandType::StoredProcedure,
    }
}
