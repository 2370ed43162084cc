//! Statement execution
//!
//! Block executors bubble the `broke`/`hasret` flags from the scope a
//! statement ran in up to the enclosing scope. `for` and `switch`
//! consume `broke`; the function-call scope consumes `hasret`.

use tracing::trace;

use crate::ast::{Block, Stmt};
use crate::context::EvalContext;
use crate::error::{Error, Result};
use crate::scope::{Scope, ScopeRef};
use crate::value::Value;

use super::expr::reject_bound_method;
use super::{call_value, Evaluate, Execute};

/// Execute a statement list in `scope`. Nested blocks get a child scope;
/// everything else runs directly in `scope`. Stops early when a `break`
/// or `return` flag appears.
pub fn execute_block(block: &Block, scope: &ScopeRef, ctx: &EvalContext) -> Result<()> {
    for stmt in &block.stmts {
        stmt.execute(scope, ctx)?;
        if scope.broke() {
            break;
        }
        if scope.has_return() {
            return Ok(());
        }
    }
    Ok(())
}

/// Run a block in a fresh child scope and adopt its control-flow flags.
fn execute_child_block(block: &Block, scope: &ScopeRef, ctx: &EvalContext) -> Result<()> {
    let child = Scope::new("--block--", Some(scope.clone()));
    execute_block(block, &child, ctx)?;
    adopt_flags(&child, scope);
    Ok(())
}

fn adopt_flags(child: &ScopeRef, scope: &ScopeRef) {
    if child.broke() {
        scope.set_break();
    }
    if child.has_return() {
        scope.set_return(child.return_value());
    }
}

impl Execute for Stmt {
    fn execute(&self, scope: &ScopeRef, ctx: &EvalContext) -> Result<()> {
        match self {
            Stmt::Empty => Ok(()),

            Stmt::Let { name, init } => {
                let value = match init {
                    Some(expr) => {
                        let value = expr.evaluate(scope, ctx)?;
                        reject_bound_method(&value)?;
                        value
                    }
                    None => Value::Nil,
                };
                scope.add_symbol(name, value)
            }

            Stmt::Function(func) => {
                let value = Value::function(func.clone(), scope.clone());
                if let Some(name) = &func.name {
                    scope.add_symbol(name, value)?;
                }
                Ok(())
            }

            Stmt::Return(expr) => {
                let retval = match expr {
                    Some(expr) => expr.evaluate(scope, ctx)?,
                    None => Value::Nil,
                };
                scope.set_return(retval);
                Ok(())
            }

            Stmt::Block(block) => execute_child_block(block, scope, ctx),

            Stmt::Expression(expr) => {
                // The value is dropped.
                expr.evaluate(scope, ctx)?;
                Ok(())
            }

            Stmt::If {
                cond,
                then,
                otherwise,
            } => {
                if cond.evaluate(scope, ctx)?.truth() {
                    execute_child_block(then, scope, ctx)
                } else {
                    match otherwise.as_deref() {
                        None => Ok(()),
                        Some(Stmt::Block(block)) => execute_child_block(block, scope, ctx),
                        // `else if` chains re-enter here.
                        Some(stmt @ Stmt::If { .. }) => stmt.execute(scope, ctx),
                        Some(_) => Err(Error::Internal("bad else statement".to_string())),
                    }
                }
            }

            Stmt::For {
                init,
                test,
                incr,
                body,
            } => {
                if let Some(init) = init {
                    init.execute(scope, ctx)?;
                }
                loop {
                    if ctx.is_interrupted() {
                        return Err(Error::Internal("evaluation interrupted".to_string()));
                    }
                    if let Some(test) = test {
                        if !test.evaluate(scope, ctx)?.truth() {
                            break;
                        }
                    }
                    let iter_scope = Scope::new("--for-block--", Some(scope.clone()));
                    execute_block(body, &iter_scope, ctx)?;
                    if iter_scope.has_return() {
                        scope.set_return(iter_scope.return_value());
                        return Ok(());
                    }
                    if iter_scope.broke() {
                        // The loop consumes the break.
                        break;
                    }
                    if let Some(incr) = incr {
                        incr.evaluate(scope, ctx)?;
                    }
                }
                Ok(())
            }

            Stmt::Break => {
                scope.set_break();
                Ok(())
            }

            Stmt::Switch {
                cond,
                cases,
                default,
            } => {
                let scrutinee = cond.evaluate(scope, ctx)?;
                // Case expressions evaluate left to right, only until the
                // first match. Literal arms match by equality; any other
                // arm is an arbitrary boolean guard.
                let mut matched = None;
                'groups: for group in cases {
                    for case in &group.matches {
                        let hit = if case.is_literal() {
                            case.evaluate(scope, ctx)?.equals(&scrutinee)
                        } else {
                            case.evaluate(scope, ctx)?.truth()
                        };
                        if hit {
                            matched = Some(&group.body);
                            break 'groups;
                        }
                    }
                }
                let body = match matched {
                    Some(body) => body,
                    None => match default {
                        Some(body) => body,
                        None => return Ok(()),
                    },
                };
                let case_scope = Scope::new("--case--", Some(scope.clone()));
                execute_block(body, &case_scope, ctx)?;
                // A break inside the case is consumed here.
                if case_scope.has_return() {
                    scope.set_return(case_scope.return_value());
                }
                Ok(())
            }

            Stmt::Tao { callee, args } => {
                // Callee and arguments resolve in the current scope; only
                // the call itself moves to the background task, so no two
                // walks execute on one scope chain concurrently.
                let callable = callee.evaluate(scope, ctx)?;
                let mut actuals = Vec::with_capacity(args.len());
                for arg in args {
                    actuals.push(arg.evaluate(scope, ctx)?);
                }
                let guard = ctx.task_guard();
                let task_ctx = ctx.fork();
                trace!("tao task spawned");
                std::thread::spawn(move || {
                    let _guard = guard;
                    if let Err(err) = call_value(&task_ctx, &callable, actuals) {
                        task_ctx.report_error(&err);
                    }
                });
                Ok(())
            }
        }
    }
}
