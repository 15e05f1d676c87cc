// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Expression evaluation.

use babylon_runtime::{Tag, TagSet, Value};

use crate::ast::{BinOp, Expr, ExprKind};

use super::{Interpreter, NodeEvents, RuntimeDiagnostic, RuntimeError};

/// Instrumentation tags of an expression node.
pub(super) fn expr_tags(kind: &ExprKind) -> TagSet {
    let tags = TagSet::of(&[Tag::Expression]);
    match kind {
        ExprKind::Ident(_) => tags.with(Tag::ReadVariable),
        ExprKind::Call { .. } => tags.with(Tag::Call),
        kind if kind.is_literal() => tags.with(Tag::Literal),
        _ => tags,
    }
}

impl Interpreter {
    pub(super) fn eval_expr(&mut self, expr: &Expr) -> Result<Value, RuntimeDiagnostic> {
        let events = self.node_events(expr.span, expr_tags(&expr.kind));
        if let Some(events) = &events {
            self.notify_enter(events, expr.span)?;
        }

        let result = self.eval_expr_kind(expr, events.as_ref());

        if let Some(events) = &events {
            match &result {
                Ok(value) => self.notify_return(events, Some(value), expr.span)?,
                Err(diag) if !diag.error.is_control_flow() => self.notify_exceptional(events, diag),
                Err(_) => {}
            }
        }
        result
    }

    /// Evaluate a child and report it as input `index` of its parent.
    fn eval_input(
        &mut self,
        parent: Option<&NodeEvents>,
        child: &Expr,
        index: usize,
    ) -> Result<Value, RuntimeDiagnostic> {
        let value = self.eval_expr(child)?;
        self.notify_input(parent, child, index, &value)?;
        Ok(value)
    }

    fn eval_expr_kind(
        &mut self,
        expr: &Expr,
        events: Option<&NodeEvents>,
    ) -> Result<Value, RuntimeDiagnostic> {
        match &expr.kind {
            ExprKind::Int(n) => Ok(Value::Int(*n)),
            ExprKind::Float(n) => Ok(Value::Float(*n)),
            ExprKind::String(s) => Ok(Value::Str(s.clone())),
            ExprKind::Bool(b) => Ok(Value::Bool(*b)),
            ExprKind::Null => Ok(Value::Null),

            ExprKind::List(items) => {
                let mut values = Vec::with_capacity(items.len());
                for (i, item) in items.iter().enumerate() {
                    values.push(self.eval_input(events, item, i)?);
                }
                Ok(Value::List(values))
            }

            ExprKind::Ident(name) => {
                if let Some(value) = self.lookup(name) {
                    return Ok(value.clone());
                }
                if self.is_callable_name(name) {
                    return Ok(Value::Function(name.clone()));
                }
                Err(RuntimeDiagnostic::new(
                    RuntimeError::UndefinedVariable(name.clone()),
                    expr.span,
                ))
            }

            ExprKind::Binary { op, left, right } => {
                let lhs = self.eval_input(events, left, 0)?;
                match op {
                    BinOp::And if !lhs.is_truthy() => return Ok(Value::Bool(false)),
                    BinOp::Or if lhs.is_truthy() => return Ok(Value::Bool(true)),
                    _ => {}
                }
                let rhs = self.eval_input(events, right, 1)?;
                match op {
                    BinOp::And | BinOp::Or => Ok(Value::Bool(rhs.is_truthy())),
                    _ => self
                        .eval_binop(*op, lhs, rhs)
                        .map_err(|e| RuntimeDiagnostic::new(e, expr.span)),
                }
            }

            ExprKind::Unary { op, operand } => {
                let value = self.eval_input(events, operand, 0)?;
                self.eval_unary(*op, value)
                    .map_err(|e| RuntimeDiagnostic::new(e, expr.span))
            }

            ExprKind::Call { callee, args } => {
                let name = match &callee.kind {
                    ExprKind::Ident(name) if self.lookup(name).is_none() => name.clone(),
                    _ => match self.eval_expr(callee)? {
                        Value::Function(name) => name,
                        other => {
                            return Err(RuntimeDiagnostic::new(
                                RuntimeError::TypeError(format!("{} is not callable", other.type_name())),
                                callee.span,
                            ))
                        }
                    },
                };
                let mut values = Vec::with_capacity(args.len());
                for (i, arg) in args.iter().enumerate() {
                    values.push(self.eval_input(events, arg, i)?);
                }
                self.call_named(&name, values, expr.span)
            }

            ExprKind::Index { target, index } => {
                let target_val = self.eval_input(events, target, 0)?;
                let index_val = self.eval_input(events, index, 1)?;
                self.index_value(&target_val, &index_val)
                    .map_err(|e| RuntimeDiagnostic::new(e, expr.span))
            }
        }
    }

    fn index_value(&self, target: &Value, index: &Value) -> Result<Value, RuntimeError> {
        let Value::Int(i) = index else {
            return Err(RuntimeError::TypeError(format!(
                "index must be an int, got {}",
                index.type_name()
            )));
        };
        let (len, item) = match target {
            Value::List(items) => (
                items.len(),
                usize::try_from(*i).ok().and_then(|idx| items.get(idx).cloned()),
            ),
            Value::Str(s) => (
                s.chars().count(),
                usize::try_from(*i)
                    .ok()
                    .and_then(|idx| s.chars().nth(idx))
                    .map(|c| Value::Str(c.to_string())),
            ),
            other => {
                return Err(RuntimeError::TypeError(format!(
                    "cannot index into {}",
                    other.type_name()
                )))
            }
        };
        item.ok_or(RuntimeError::IndexOutOfBounds { index: *i, len })
    }
}

#[cfg(test)]
mod tests {
    use super::super::tests::run_source;
    use super::super::RuntimeError;
    use super::*;

    #[test]
    fn tags_by_expression_kind() {
        let ident = ExprKind::Ident("x".into());
        assert!(expr_tags(&ident).contains(Tag::ReadVariable));
        assert!(expr_tags(&ExprKind::Int(1)).contains(Tag::Literal));
        assert!(!expr_tags(&ExprKind::Int(1)).contains(Tag::Statement));
    }

    #[test]
    fn function_values_can_be_called() {
        let (result, _) = run_source("function inc(x) { return x + 1 }\nlet f = inc\nf(1)");
        assert_eq!(result.unwrap(), Some(Value::Int(2)));
        let (result, _) = run_source("let f = 3\nf(1)");
        assert_eq!(
            result.unwrap_err().error,
            RuntimeError::TypeError("int is not callable".into())
        );
    }

    #[test]
    fn indexing() {
        let (result, _) = run_source("[10, 20][1]");
        assert_eq!(result.unwrap(), Some(Value::Int(20)));
        let (result, _) = run_source("\"abc\"[2]");
        assert_eq!(result.unwrap(), Some(Value::Str("c".into())));
        let (result, _) = run_source("[1][-1]");
        assert_eq!(
            result.unwrap_err().error,
            RuntimeError::IndexOutOfBounds { index: -1, len: 1 }
        );
    }

    #[test]
    fn logical_operators_short_circuit() {
        let (result, _) = run_source("false && missing");
        assert_eq!(result.unwrap(), Some(Value::Bool(false)));
        let (result, _) = run_source("1 || missing");
        assert_eq!(result.unwrap(), Some(Value::Bool(true)));
    }
}
