//! Embedding surface
//!
//! A [`Program`] owns the runtime: global scope, event loop, and
//! evaluation context. `load` parses and executes top-level statements;
//! `call` invokes a top-level function by name and then drains the event
//! loop to quiescence, so timers and promise chains complete before the
//! call returns.

use std::io::Read;

use tracing::debug;

use crate::builtins;
use crate::context::EvalContext;
use crate::error::{Error, Result};
use crate::eval::{call_value, Execute};
use crate::lexer::Lexer;
use crate::parser::Parser;
use crate::runtime::EventLoop;
use crate::scope::{Scope, ScopeRef};
use crate::value::Value;

/// An embeddable Tao runtime.
pub struct Program {
    scope: ScopeRef,
    event_loop: EventLoop,
    ctx: EvalContext,
}

impl Default for Program {
    fn default() -> Self {
        Self::new()
    }
}

impl Program {
    /// Create a runtime with the global object prepared.
    pub fn new() -> Self {
        let event_loop = EventLoop::new();
        let ctx = EvalContext::new(event_loop.handle());
        let scope = Scope::new("--global--", None);
        builtins::install_global(&scope).expect("fresh global scope");
        Program {
            scope,
            event_loop,
            ctx,
        }
    }

    /// Parse `source` and execute its top-level statements.
    pub fn load(&mut self, source: &str) -> Result<()> {
        self.load_bytes(source.as_bytes().to_vec())
    }

    /// Read all of `reader` and load it.
    pub fn load_input(&mut self, mut reader: impl Read) -> Result<()> {
        let mut source = Vec::new();
        reader
            .read_to_end(&mut source)
            .map_err(|err| Error::Internal(format!("cannot read input: {}", err)))?;
        self.load_bytes(source)
    }

    fn load_bytes(&mut self, source: Vec<u8>) -> Result<()> {
        let mut parser = Parser::new(Lexer::new(source));
        let program = parser.parse()?;
        debug!(stmts = program.stmts.len(), "program loaded");
        for stmt in &program.stmts {
            stmt.execute(&self.scope, &self.ctx)?;
        }
        Ok(())
    }

    /// Invoke a top-level function by name, then drain the event loop.
    pub fn call(&mut self, name: &str, args: &[Value]) -> Result<Value> {
        let callable = self.scope.must_find(name, true)?;
        let result = call_value(&self.ctx, &callable, args.to_vec())?;
        self.event_loop.drain();
        Ok(result)
    }

    /// Run queued tasks until the loop is quiescent.
    pub fn run_events(&self) {
        self.event_loop.drain();
    }

    /// Redirect the `print`/`println` sink.
    pub fn set_stdout(&self, writer: Box<dyn std::io::Write + Send>) {
        self.ctx.set_stdout(writer);
    }

    /// Redirect the error sink (task errors land here).
    pub fn set_stderr(&self, writer: Box<dyn std::io::Write + Send>) {
        self.ctx.set_stderr(writer);
    }

    /// Request interruption of running walks.
    pub fn interrupt(&self) {
        self.ctx.interrupt();
    }

    /// The root scope (tests and embedders can inspect bindings).
    pub fn global_scope(&self) -> &ScopeRef {
        &self.scope
    }
}
