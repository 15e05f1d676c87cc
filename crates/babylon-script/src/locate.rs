// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Position queries over a parsed program.

use babylon_runtime::{ArgumentDeclaration, FunctionDeclaration, NodeInfo, NodeKind, Value};
use babylon_source::{Source, Span};

use crate::ast::{Expr, ExprKind, Program, Stmt, StmtKind};

/// Functions declared in `program`, with 1-based line ranges.
pub(crate) fn declarations(program: &Program, source: &Source) -> Vec<FunctionDeclaration> {
    let map = source.map();
    program
        .functions()
        .filter_map(|decl| {
            let start_line = map.offset_to_line(decl.span.start).ok()?;
            let last = decl.span.end.saturating_sub(1).max(decl.span.start);
            let end_line = map.offset_to_line(last).ok()?;
            let arguments = decl
                .params
                .iter()
                .map(|param| ArgumentDeclaration {
                    name: param.name.clone(),
                    default_value: param
                        .default
                        .as_ref()
                        .and_then(|expr| span_text(source, expr.span))
                        .map(str::to_string),
                })
                .collect();
            Some(FunctionDeclaration {
                name: decl.name.clone(),
                start_line,
                end_line,
                arguments,
            })
        })
        .collect()
}

/// The innermost statement or expression at a 1-based position.
///
/// The search is confined to the enclosing root: a function body when the
/// position is inside a declaration, the top-level statements otherwise.
pub(crate) fn node_at(program: &Program, source: &Source, line: usize, col: usize) -> Option<NodeInfo> {
    let offset = source.map().position_to_offset(line, col).ok()?;

    let top_level: Vec<&Stmt> = program.statements().collect();
    let root: Vec<&Stmt> = match program.functions().find(|decl| decl.span.contains(offset)) {
        Some(decl) => decl.body.iter().collect(),
        None => top_level,
    };

    let stmt = innermost_stmt(root.iter().copied(), offset)?;
    let (span, kind) = match innermost_expr_in_stmt(stmt, offset) {
        Some(expr) => (expr.span, expr_kind(expr)),
        None => (stmt.span, NodeKind::Statement),
    };

    let mut ordered = Vec::new();
    for s in &root {
        preorder(s, &mut ordered);
    }
    // Pre-order puts enclosing statements ahead of their children, so the
    // innermost one already executed comes last.
    let preceding = ordered
        .into_iter()
        .filter(|s| s.span.end <= span.start || encloses(s.span, span))
        .filter_map(|s| source.section(s.span).ok())
        .collect();

    Some(NodeInfo {
        section: source.section(span).ok()?,
        kind,
        preceding,
    })
}

fn encloses(outer: Span, inner: Span) -> bool {
    outer.start <= inner.start && inner.end <= outer.end
}

fn span_text(source: &Source, span: Span) -> Option<&str> {
    source.text().get(span.start..span.end)
}

fn expr_kind(expr: &Expr) -> NodeKind {
    match &expr.kind {
        ExprKind::Int(n) => NodeKind::Literal(Value::Int(*n)),
        ExprKind::Float(x) => NodeKind::Literal(Value::Float(*x)),
        ExprKind::String(s) => NodeKind::Literal(Value::Str(s.clone())),
        ExprKind::Bool(b) => NodeKind::Literal(Value::Bool(*b)),
        ExprKind::Null => NodeKind::Literal(Value::Null),
        ExprKind::Ident(name) => NodeKind::ReadVariable(name.clone()),
        _ => NodeKind::Expression,
    }
}

fn child_blocks(stmt: &Stmt) -> Vec<&[Stmt]> {
    match &stmt.kind {
        StmtKind::If {
            then_branch,
            else_branch,
            ..
        } => {
            let mut blocks = vec![then_branch.as_slice()];
            if let Some(else_branch) = else_branch {
                blocks.push(else_branch.as_slice());
            }
            blocks
        }
        StmtKind::While { body, .. } => vec![body.as_slice()],
        _ => Vec::new(),
    }
}

fn stmt_exprs(stmt: &Stmt) -> Vec<&Expr> {
    match &stmt.kind {
        StmtKind::Let { init, .. } => vec![init],
        StmtKind::Assign { value, .. } => vec![value],
        StmtKind::IndexAssign {
            target,
            index,
            value,
        } => vec![target, index, value],
        StmtKind::Return(expr) => expr.iter().collect(),
        StmtKind::If { cond, .. } | StmtKind::While { cond, .. } => vec![cond],
        StmtKind::Expr(expr) => vec![expr],
        StmtKind::Break | StmtKind::Continue => Vec::new(),
    }
}

fn expr_children(expr: &Expr) -> Vec<&Expr> {
    match &expr.kind {
        ExprKind::List(items) => items.iter().collect(),
        ExprKind::Binary { left, right, .. } => vec![&**left, &**right],
        ExprKind::Unary { operand, .. } => vec![&**operand],
        ExprKind::Call { callee, args } => std::iter::once(callee.as_ref()).chain(args).collect(),
        ExprKind::Index { target, index } => vec![&**target, &**index],
        _ => Vec::new(),
    }
}

fn innermost_stmt<'a>(stmts: impl Iterator<Item = &'a Stmt>, offset: usize) -> Option<&'a Stmt> {
    let mut stmts = stmts;
    let stmt = stmts.find(|s| s.span.contains(offset))?;
    let nested = child_blocks(stmt)
        .into_iter()
        .find_map(|block| innermost_stmt(block.iter(), offset));
    nested.or(Some(stmt))
}

fn innermost_expr_in_stmt(stmt: &Stmt, offset: usize) -> Option<&Expr> {
    stmt_exprs(stmt)
        .into_iter()
        .find_map(|expr| innermost_expr(expr, offset))
}

fn innermost_expr(expr: &Expr, offset: usize) -> Option<&Expr> {
    if !expr.span.contains(offset) {
        return None;
    }
    expr_children(expr)
        .into_iter()
        .find_map(|child| innermost_expr(child, offset))
        .or(Some(expr))
}

fn preorder<'a>(stmt: &'a Stmt, out: &mut Vec<&'a Stmt>) {
    out.push(stmt);
    for block in child_blocks(stmt) {
        for s in block {
            preorder(s, out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::runtime::parse_program;
    use pretty_assertions::assert_eq;

    fn locate(src: &str, line: usize, col: usize) -> Option<NodeInfo> {
        let source = Source::new("file:///w/a.bab", src);
        let program = parse_program(src).unwrap();
        node_at(&program, &source, line, col)
    }

    #[test]
    fn declarations_with_defaults() {
        let src = "let a = 1\nfunction area(w, h = 2 + 1) {\n  return w * h\n}\n";
        let source = Source::new("a.bab", src);
        let program = parse_program(src).unwrap();
        assert_eq!(
            declarations(&program, &source),
            vec![FunctionDeclaration {
                name: "area".into(),
                start_line: 2,
                end_line: 4,
                arguments: vec![
                    ArgumentDeclaration {
                        name: "w".into(),
                        default_value: None
                    },
                    ArgumentDeclaration {
                        name: "h".into(),
                        default_value: Some("2 + 1".into())
                    },
                ],
            }]
        );
    }

    #[test]
    fn variable_read_is_innermost() {
        let node = locate("let a = 1\nlet b = a + 2", 2, 9).unwrap();
        assert_eq!(node.kind, NodeKind::ReadVariable("a".into()));
        assert_eq!((node.section.start_line, node.section.start_col), (2, 9));
        let lines: Vec<usize> = node.preceding.iter().map(|s| s.start_line).collect();
        assert_eq!(lines, vec![1, 2]);
    }

    #[test]
    fn literals_and_statements() {
        let node = locate("let a = 42", 1, 10).unwrap();
        assert_eq!(node.kind, NodeKind::Literal(Value::Int(42)));
        let node = locate("let a = 42", 1, 2).unwrap();
        assert_eq!(node.kind, NodeKind::Statement);
        assert!(locate("let a = 42\n\n", 2, 1).is_none());
    }

    #[test]
    fn search_stays_inside_function_body() {
        let src = "let x = 1\nfunction f(n) {\n  let y = n\n  return y * 2\n}";
        let node = locate(src, 4, 10).unwrap();
        assert_eq!(node.kind, NodeKind::ReadVariable("y".into()));
        let lines: Vec<usize> = node.preceding.iter().map(|s| s.start_line).collect();
        assert_eq!(lines, vec![3, 4]);
    }

    #[test]
    fn nested_blocks_are_searched() {
        let src = "let i = 0\nwhile (i < 3) {\n  i = i + 1\n}";
        let node = locate(src, 3, 7).unwrap();
        assert_eq!(node.kind, NodeKind::ReadVariable("i".into()));
        let lines: Vec<usize> = node.preceding.iter().map(|s| s.start_line).collect();
        assert_eq!(lines, vec![1, 2, 3]);
    }
}
