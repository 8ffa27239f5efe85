// This module handles query construction and compilation.

pub mod builder;
pub mod condition;
pub mod errors;
pub mod formatter;
pub mod range;
pub mod statement;

pub use builder::{delete, insert, select, update, FilterBuilder};
pub use condition::{Condition, ConditionNode, Connective, Operand, Operator};
pub use errors::CompileError;
pub use formatter::{
    CompiledStatement, Formatter, GenericFormatter, MySqlFormatter, PostgresFormatter, SqliteFormatter,
};
pub use range::Range;
pub use statement::{LockMode, OrderDirection, Projection, Statement};
