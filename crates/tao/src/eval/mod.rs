//! Tree-walking execution
//!
//! Two traits drive the walk: statements [`Execute`], expressions
//! [`Evaluate`]. Control flow (`break`, `return`) propagates as flags on
//! scopes, bubbled up by block executors, never as unwinding.

mod call;
mod expr;
mod stmt;

pub use call::{call_function, call_value, schedule_call};
pub use stmt::execute_block;

use crate::context::EvalContext;
use crate::error::Result;
use crate::scope::ScopeRef;
use crate::value::Value;

/// Evaluating an AST node to a value.
pub trait Evaluate {
    /// Evaluate this node in `scope`.
    fn evaluate(&self, scope: &ScopeRef, ctx: &EvalContext) -> Result<Value>;
}

/// Executing a statement for its effects.
pub trait Execute {
    /// Execute this node in `scope`.
    fn execute(&self, scope: &ScopeRef, ctx: &EvalContext) -> Result<()>;
}
