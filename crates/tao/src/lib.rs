//! # Tao
//!
//! A tree-walking interpreter for the Tao scripting language: a small
//! dynamically-typed, expression-oriented language with first-class
//! functions, lexical closures, JavaScript-style arrays, and an
//! event-loop-backed concurrency surface (`setTimeout`, promises,
//! buffered channels).
//!
//! ## Architecture
//!
//! - **Lexer**: byte stream to tokens, with undo and checkpoint frames
//! - **Parser**: precedence-climbing recursive descent to a tagged AST
//! - **Value / Object**: the runtime value sum and the fused
//!   plain-object/array collection type
//! - **Evaluator**: statement/expression walkers over scope chains
//! - **Runtime**: single-threaded event loop driving timers, promises,
//!   and channels
//!
//! ## Embedding
//!
//! ```no_run
//! use tao::Program;
//!
//! let mut program = Program::new();
//! program
//!     .load("function main() { println(\"hello\"); }")
//!     .unwrap();
//! program.call("main", &[]).unwrap();
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod ast;
pub mod builtins;
pub mod context;
pub mod error;
pub mod eval;
pub mod lexer;
pub mod object;
pub mod parser;
pub mod program;
pub mod runtime;
pub mod scope;
pub mod token;
pub mod value;

pub use context::EvalContext;
pub use error::{Error, Result};
pub use eval::{Evaluate, Execute};
pub use lexer::Lexer;
pub use object::Object;
pub use parser::Parser;
pub use program::Program;
pub use scope::{Scope, ScopeRef};
pub use token::{Token, TokenKind};
pub use value::Value;

/// Tao version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
