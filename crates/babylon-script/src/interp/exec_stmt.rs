// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Statement execution.

use babylon_runtime::{Tag, TagSet, Value};

use crate::ast::{ExprKind, Stmt, StmtKind};

use super::{Interpreter, RuntimeDiagnostic, RuntimeError};

impl Interpreter {
    /// Execute one statement, reporting it to listeners. The result is the
    /// statement's value, or `None` for control structures.
    pub(super) fn exec_stmt(&mut self, stmt: &Stmt) -> Result<Option<Value>, RuntimeDiagnostic> {
        self.tick(stmt.span)?;
        let events = self.node_events(stmt.span, TagSet::of(&[Tag::Statement]));
        if let Some(events) = &events {
            self.notify_enter(events, stmt.span)?;
        }

        let result = self.exec_stmt_kind(stmt);

        if let Some(events) = &events {
            match &result {
                Ok(value) => self.notify_return(events, value.as_ref(), stmt.span)?,
                Err(diag) => match &diag.error {
                    RuntimeError::Return(value) => {
                        self.notify_return(events, Some(value), stmt.span)?
                    }
                    error if !error.is_control_flow() => self.notify_exceptional(events, diag),
                    _ => {}
                },
            }
        }
        result
    }

    fn exec_stmt_kind(&mut self, stmt: &Stmt) -> Result<Option<Value>, RuntimeDiagnostic> {
        match &stmt.kind {
            StmtKind::Expr(expr) => self.eval_expr(expr).map(Some),

            StmtKind::Let { name, init } => {
                let value = self.eval_expr(init)?;
                self.env_mut().define(name.clone(), value.clone());
                Ok(Some(value))
            }

            StmtKind::Assign { name, value } => {
                let value = self.eval_expr(value)?;
                if !self.assign_var(name, value.clone()) {
                    return Err(RuntimeDiagnostic::new(
                        RuntimeError::UndefinedVariable(name.clone()),
                        stmt.span,
                    ));
                }
                Ok(Some(value))
            }

            StmtKind::IndexAssign {
                target,
                index,
                value,
            } => {
                let ExprKind::Ident(name) = &target.kind else {
                    return Err(RuntimeDiagnostic::new(
                        RuntimeError::TypeError("only list variables can be assigned by index".into()),
                        target.span,
                    ));
                };
                let index_val = self.eval_expr(index)?;
                let value = self.eval_expr(value)?;
                self.store_index(name, &index_val, value.clone())
                    .map_err(|e| RuntimeDiagnostic::new(e, stmt.span))?;
                Ok(Some(value))
            }

            StmtKind::Return(expr) => {
                let value = match expr {
                    Some(e) => self.eval_expr(e)?,
                    None => Value::Null,
                };
                Err(RuntimeDiagnostic::new(RuntimeError::Return(value), stmt.span))
            }

            StmtKind::If {
                cond,
                then_branch,
                else_branch,
            } => {
                if self.eval_expr(cond)?.is_truthy() {
                    self.exec_block(then_branch)?;
                } else if let Some(else_branch) = else_branch {
                    self.exec_block(else_branch)?;
                }
                Ok(None)
            }

            StmtKind::While { cond, body } => {
                while self.eval_expr(cond)?.is_truthy() {
                    match self.exec_block(body) {
                        Ok(()) => {}
                        Err(diag) if matches!(diag.error, RuntimeError::Break) => break,
                        Err(diag) if matches!(diag.error, RuntimeError::Continue) => continue,
                        Err(diag) => return Err(diag),
                    }
                }
                Ok(None)
            }

            StmtKind::Break => Err(RuntimeDiagnostic::new(RuntimeError::Break, stmt.span)),
            StmtKind::Continue => Err(RuntimeDiagnostic::new(RuntimeError::Continue, stmt.span)),
        }
    }

    fn exec_block(&mut self, stmts: &[Stmt]) -> Result<(), RuntimeDiagnostic> {
        self.env_mut().push_scope();
        let result = stmts.iter().try_for_each(|stmt| self.exec_stmt(stmt).map(|_| ()));
        self.env_mut().pop_scope();
        result
    }

    fn store_index(&mut self, name: &str, index: &Value, value: Value) -> Result<(), RuntimeError> {
        let Value::Int(i) = index else {
            return Err(RuntimeError::TypeError(format!(
                "list index must be an int, got {}",
                index.type_name()
            )));
        };
        let slot = if self.env().get(name).is_some() {
            self.env_mut().get_mut(name)
        } else {
            self.globals.get_mut(name)
        }
        .ok_or_else(|| RuntimeError::UndefinedVariable(name.to_string()))?;
        let items = match slot {
            Value::List(items) => items,
            other => {
                return Err(RuntimeError::TypeError(format!(
                    "cannot assign by index into {}",
                    other.type_name()
                )))
            }
        };
        let len = items.len();
        let idx = usize::try_from(*i)
            .ok()
            .filter(|idx| *idx < len)
            .ok_or(RuntimeError::IndexOutOfBounds { index: *i, len })?;
        items[idx] = value;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::run_source;
    use super::super::RuntimeError;
    use babylon_runtime::Value;

    #[test]
    fn index_assignment_updates_list() {
        let (result, _) = run_source("let xs = [1, 2, 3]\nxs[1] = 20\nxs");
        assert_eq!(
            result.unwrap(),
            Some(Value::List(vec![Value::Int(1), Value::Int(20), Value::Int(3)]))
        );
        let (result, _) = run_source("let xs = [1]\nxs[4] = 0");
        assert_eq!(
            result.unwrap_err().error,
            RuntimeError::IndexOutOfBounds { index: 4, len: 1 }
        );
    }

    #[test]
    fn block_scopes_are_dropped() {
        let (result, _) = run_source("if (true) { let inner = 1 }\ninner");
        assert_eq!(
            result.unwrap_err().error,
            RuntimeError::UndefinedVariable("inner".into())
        );
    }

    #[test]
    fn break_leaves_loop() {
        let (result, _) = run_source("let i = 0\nwhile (true) { i = i + 1; if (i > 2) { break } }\ni");
        assert_eq!(result.unwrap(), Some(Value::Int(3)));
        let (result, _) = run_source("break");
        assert_eq!(result.unwrap_err().error, RuntimeError::StrayLoopControl);
    }

    #[test]
    fn assigning_undeclared_variable_fails() {
        let (result, _) = run_source("x = 1");
        assert_eq!(
            result.unwrap_err().error,
            RuntimeError::UndefinedVariable("x".into())
        );
    }
}
