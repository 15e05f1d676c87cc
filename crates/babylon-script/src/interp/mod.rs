// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Instrumented tree-walk interpreter.
//!
//! Statements and expressions report to the listeners in the shared
//! [`Instrumenter`]; a listener that breaks out unwinds the whole run through
//! [`RuntimeError::Escape`].

mod builtins;
mod eval_expr;
mod exec_stmt;
mod operators;

use std::cell::RefCell;
use std::collections::HashMap;
use std::ops::ControlFlow;
use std::rc::Rc;

use tracing::trace;

use babylon_runtime::{EventContext, GuestError, GuestErrorKind, TagSet, Value};
use babylon_source::{Source, Span};

use crate::ast::{Expr, FnDecl, Program};
use crate::env::{Environment, FrameView};
use crate::instrument::{Hook, Instrumenter};

/// A user function and the document it was declared in.
#[derive(Debug, Clone)]
pub(crate) struct Callee {
    pub decl: Rc<FnDecl>,
    pub source: Rc<Source>,
}

pub(crate) type FunctionTable = HashMap<String, Callee>;

/// One parsed document of a linked program.
#[derive(Debug)]
pub(crate) struct Unit {
    pub source: Rc<Source>,
    pub program: Program,
}

/// Execution bounds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Statements plus calls a single run may execute.
    pub step_limit: u64,
    pub max_call_depth: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            step_limit: 1_000_000,
            max_call_depth: 128,
        }
    }
}

impl Limits {
    pub fn with_step_limit(step_limit: u64) -> Self {
        Self {
            step_limit,
            ..Self::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum RuntimeError {
    #[error("undefined variable `{0}`")]
    UndefinedVariable(String),

    #[error("undefined function `{0}`")]
    UndefinedFunction(String),

    #[error("{0}")]
    TypeError(String),

    #[error("division by zero")]
    DivisionByZero,

    #[error("`{name}` expects {expected} argument{}, got {got}", if *.expected == 1 { "" } else { "s" })]
    ArityMismatch {
        name: String,
        expected: usize,
        got: usize,
    },

    #[error("index {index} out of bounds (length is {len})")]
    IndexOutOfBounds { index: i64, len: usize },

    #[error("{0}")]
    Panic(String),

    #[error("step limit of {0} exceeded; the program may not terminate")]
    StepLimit(u64),

    #[error("call depth exceeded {0}")]
    StackOverflow(usize),

    #[error("`break` or `continue` outside of a loop")]
    StrayLoopControl,

    #[error("exit with code {0}")]
    Exit(i32),

    // Control flow (not actual errors)
    #[error("return")]
    Return(Value),

    #[error("break")]
    Break,

    #[error("continue")]
    Continue,

    /// A listener ended the run early with a value.
    #[error("escape")]
    Escape(Value),
}

impl RuntimeError {
    pub fn is_control_flow(&self) -> bool {
        matches!(
            self,
            RuntimeError::Exit(_)
                | RuntimeError::Return(_)
                | RuntimeError::Break
                | RuntimeError::Continue
                | RuntimeError::Escape(_)
        )
    }
}

/// Runtime error with source location for diagnostic display.
#[derive(Debug)]
pub struct RuntimeDiagnostic {
    pub error: RuntimeError,
    pub span: Span,
}

impl RuntimeDiagnostic {
    pub fn new(error: RuntimeError, span: Span) -> Self {
        Self { error, span }
    }

    pub fn to_guest_error(&self) -> GuestError {
        GuestError {
            kind: GuestErrorKind::Runtime,
            message: self.error.to_string(),
            span: Some(self.span),
        }
    }
}

impl std::fmt::Display for RuntimeDiagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for RuntimeDiagnostic {}

/// Event context and interested listeners for one node.
pub(super) struct NodeEvents {
    ctx: EventContext,
    hooks: Vec<Hook>,
}

pub(crate) struct Interpreter {
    functions: Rc<FunctionTable>,
    globals: Environment,
    /// Call stack; empty while running top-level code.
    frames: Vec<Environment>,
    /// Document of the code currently executing.
    source: Rc<Source>,
    hooks: Option<Rc<Instrumenter>>,
    limits: Limits,
    steps: u64,
    output: Rc<RefCell<String>>,
}

impl Interpreter {
    pub fn new(
        functions: Rc<FunctionTable>,
        source: Rc<Source>,
        limits: Limits,
        output: Rc<RefCell<String>>,
    ) -> Self {
        Self {
            functions,
            globals: Environment::new(),
            frames: Vec::new(),
            source,
            hooks: None,
            limits,
            steps: 0,
            output,
        }
    }

    pub fn with_hooks(mut self, hooks: Rc<Instrumenter>) -> Self {
        self.hooks = Some(hooks);
        self
    }

    /// Seed a top-level variable, used for inline evaluation in a frame.
    pub fn define_global(&mut self, name: String, value: Value) {
        self.globals.define(name, value);
    }

    /// Run every unit's top-level statements in order. The result is the
    /// value of the last value-producing statement of the final unit.
    pub fn run(&mut self, units: &[Unit]) -> Result<Option<Value>, RuntimeDiagnostic> {
        let mut last = None;
        for unit in units {
            self.source = Rc::clone(&unit.source);
            last = None;
            for stmt in unit.program.statements() {
                match self.exec_stmt(stmt) {
                    Ok(Some(value)) => last = Some(value),
                    Ok(None) => {}
                    Err(diag) => match diag.error {
                        RuntimeError::Return(value) => return Ok(Some(value)),
                        RuntimeError::Break | RuntimeError::Continue => {
                            return Err(RuntimeDiagnostic::new(
                                RuntimeError::StrayLoopControl,
                                diag.span,
                            ))
                        }
                        _ => return Err(diag),
                    },
                }
            }
        }
        Ok(last)
    }

    /// Evaluate a lone expression at top level.
    pub fn eval(&mut self, expr: &Expr) -> Result<Value, RuntimeDiagnostic> {
        self.eval_expr(expr)
    }

    // =========================================================================
    // Environment
    // =========================================================================

    fn env(&self) -> &Environment {
        self.frames.last().unwrap_or(&self.globals)
    }

    fn env_mut(&mut self) -> &mut Environment {
        match self.frames.last_mut() {
            Some(frame) => frame,
            None => &mut self.globals,
        }
    }

    fn lookup(&self, name: &str) -> Option<&Value> {
        self.env().get(name).or_else(|| {
            if self.frames.is_empty() {
                None
            } else {
                self.globals.get(name)
            }
        })
    }

    fn assign_var(&mut self, name: &str, value: Value) -> bool {
        if self.env_mut().assign(name, value.clone()) {
            return true;
        }
        !self.frames.is_empty() && self.globals.assign(name, value)
    }

    fn frame_view(&self) -> FrameView<'_> {
        FrameView {
            locals: self.frames.last(),
            globals: &self.globals,
        }
    }

    fn tick(&mut self, span: Span) -> Result<(), RuntimeDiagnostic> {
        self.steps += 1;
        if self.steps > self.limits.step_limit {
            return Err(RuntimeDiagnostic::new(
                RuntimeError::StepLimit(self.limits.step_limit),
                span,
            ));
        }
        Ok(())
    }

    // =========================================================================
    // Instrumentation
    // =========================================================================

    fn node_events(&self, span: Span, tags: TagSet) -> Option<NodeEvents> {
        let instrumenter = self.hooks.as_ref()?;
        if !instrumenter.is_active() {
            return None;
        }
        let section = self.source.section(span).ok()?;
        let hooks = instrumenter.hooks_for(&section, tags);
        if hooks.is_empty() {
            return None;
        }
        Some(NodeEvents {
            ctx: EventContext {
                section,
                tags,
                source: Rc::clone(&self.source),
            },
            hooks,
        })
    }

    fn notify_enter(&self, events: &NodeEvents, span: Span) -> Result<(), RuntimeDiagnostic> {
        let frame = self.frame_view();
        for hook in &events.hooks {
            let Ok(mut listener) = hook.listener.try_borrow_mut() else {
                trace!("skipping re-entrant listener");
                continue;
            };
            if let ControlFlow::Break(value) = listener.on_enter(&events.ctx, &frame) {
                return Err(RuntimeDiagnostic::new(RuntimeError::Escape(value), span));
            }
        }
        Ok(())
    }

    fn notify_return(
        &self,
        events: &NodeEvents,
        result: Option<&Value>,
        span: Span,
    ) -> Result<(), RuntimeDiagnostic> {
        let frame = self.frame_view();
        for hook in &events.hooks {
            let Ok(mut listener) = hook.listener.try_borrow_mut() else {
                trace!("skipping re-entrant listener");
                continue;
            };
            if let ControlFlow::Break(value) = listener.on_return_value(&events.ctx, &frame, result) {
                return Err(RuntimeDiagnostic::new(RuntimeError::Escape(value), span));
            }
        }
        Ok(())
    }

    fn notify_exceptional(&self, events: &NodeEvents, diag: &RuntimeDiagnostic) {
        let frame = self.frame_view();
        let error = diag.to_guest_error();
        for hook in &events.hooks {
            if let Ok(mut listener) = hook.listener.try_borrow_mut() {
                listener.on_return_exceptional(&events.ctx, &frame, &error);
            }
        }
    }

    /// Report a child's value to listeners of the parent whose input filter
    /// matches the child.
    fn notify_input(
        &self,
        parent: Option<&NodeEvents>,
        child: &Expr,
        index: usize,
        value: &Value,
    ) -> Result<(), RuntimeDiagnostic> {
        let Some(parent) = parent else {
            return Ok(());
        };
        if parent.hooks.iter().all(|hook| hook.input_filter.is_none()) {
            return Ok(());
        }
        let Ok(section) = self.source.section(child.span) else {
            return Ok(());
        };
        let input = EventContext {
            section,
            tags: eval_expr::expr_tags(&child.kind),
            source: Rc::clone(&self.source),
        };
        let frame = self.frame_view();
        for hook in &parent.hooks {
            let Some(filter) = &hook.input_filter else {
                continue;
            };
            if !filter.matches(&input.section, input.tags) {
                continue;
            }
            let Ok(mut listener) = hook.listener.try_borrow_mut() else {
                continue;
            };
            if let ControlFlow::Break(escaped) =
                listener.on_input_value(&parent.ctx, &frame, &input, index, value)
            {
                return Err(RuntimeDiagnostic::new(RuntimeError::Escape(escaped), child.span));
            }
        }
        Ok(())
    }

    // =========================================================================
    // Calls
    // =========================================================================

    fn call_function(
        &mut self,
        callee: &Callee,
        args: Vec<Value>,
        span: Span,
    ) -> Result<Value, RuntimeDiagnostic> {
        let decl = Rc::clone(&callee.decl);
        if args.len() > decl.params.len() {
            return Err(RuntimeDiagnostic::new(
                RuntimeError::ArityMismatch {
                    name: decl.name.clone(),
                    expected: decl.params.len(),
                    got: args.len(),
                },
                span,
            ));
        }
        if self.frames.len() >= self.limits.max_call_depth {
            return Err(RuntimeDiagnostic::new(
                RuntimeError::StackOverflow(self.limits.max_call_depth),
                span,
            ));
        }
        self.tick(span)?;

        let caller_source = std::mem::replace(&mut self.source, Rc::clone(&callee.source));
        self.frames.push(Environment::new());
        let result = self.run_body(&decl, args, span);
        self.frames.pop();
        self.source = caller_source;
        result
    }

    fn run_body(&mut self, decl: &FnDecl, args: Vec<Value>, span: Span) -> Result<Value, RuntimeDiagnostic> {
        let given = args.len();
        let mut args = args.into_iter();
        for param in &decl.params {
            let value = match (args.next(), &param.default) {
                (Some(value), _) => value,
                (None, Some(default)) => self.eval_expr(default)?,
                (None, None) => {
                    return Err(RuntimeDiagnostic::new(
                        RuntimeError::ArityMismatch {
                            name: decl.name.clone(),
                            expected: decl.params.len(),
                            got: given,
                        },
                        span,
                    ))
                }
            };
            self.env_mut().define(param.name.clone(), value);
        }

        for stmt in &decl.body {
            match self.exec_stmt(stmt) {
                Ok(_) => {}
                Err(diag) => match diag.error {
                    RuntimeError::Return(value) => return Ok(value),
                    RuntimeError::Break | RuntimeError::Continue => {
                        return Err(RuntimeDiagnostic::new(RuntimeError::StrayLoopControl, diag.span))
                    }
                    _ => return Err(diag),
                },
            }
        }
        Ok(Value::Null)
    }

    fn call_named(&mut self, name: &str, args: Vec<Value>, span: Span) -> Result<Value, RuntimeDiagnostic> {
        if let Some(callee) = self.functions.get(name).cloned() {
            return self.call_function(&callee, args, span);
        }
        if builtins::is_builtin(name) {
            return self
                .call_builtin(name, args)
                .map_err(|e| RuntimeDiagnostic::new(e, span));
        }
        Err(RuntimeDiagnostic::new(
            RuntimeError::UndefinedFunction(name.to_string()),
            span,
        ))
    }

    fn is_callable_name(&self, name: &str) -> bool {
        self.functions.contains_key(name) || builtins::is_builtin(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lexer::Lexer;
    use crate::parser::Parser;

    pub(crate) fn run_source(src: &str) -> (Result<Option<Value>, RuntimeDiagnostic>, String) {
        run_with_limits(src, Limits::default())
    }

    pub(crate) fn run_with_limits(
        src: &str,
        limits: Limits,
    ) -> (Result<Option<Value>, RuntimeDiagnostic>, String) {
        let tokens = Lexer::new(src).tokenize().tokens;
        let program = Parser::new(tokens).parse().program;
        let source = Rc::new(Source::new("test.bab", src));
        let mut functions = FunctionTable::new();
        for decl in program.functions() {
            functions.insert(
                decl.name.clone(),
                Callee {
                    decl: Rc::clone(decl),
                    source: Rc::clone(&source),
                },
            );
        }
        let output = Rc::new(RefCell::new(String::new()));
        let mut interp = Interpreter::new(Rc::new(functions), Rc::clone(&source), limits, Rc::clone(&output));
        let result = interp.run(&[Unit { source, program }]);
        let printed = output.borrow().clone();
        (result, printed)
    }

    #[test]
    fn arithmetic_and_functions() {
        let (result, _) = run_source("function sq(x) { return x * x; }\nsq(3) + 1");
        assert_eq!(result.unwrap(), Some(Value::Int(10)));
    }

    #[test]
    fn loops_and_assignment() {
        let src = "let total = 0\nlet i = 0\nwhile (i < 5) { i = i + 1; if (i == 3) { continue } total = total + i }\ntotal";
        let (result, _) = run_source(src);
        assert_eq!(result.unwrap(), Some(Value::Int(12)));
    }

    #[test]
    fn default_parameters() {
        let (result, _) = run_source("function f(a, b = a + 1) { return a * b }\nf(3)");
        assert_eq!(result.unwrap(), Some(Value::Int(12)));
        let (result, _) = run_source("function f(a, b) { return a }\nf(3)");
        assert_eq!(
            result.unwrap_err().error,
            RuntimeError::ArityMismatch {
                name: "f".into(),
                expected: 2,
                got: 1
            }
        );
    }

    #[test]
    fn functions_see_globals() {
        let (result, _) = run_source("let base = 10\nfunction f(x) { base = base + x; return base }\nf(1)\nf(2)");
        assert_eq!(result.unwrap(), Some(Value::Int(13)));
    }

    #[test]
    fn step_limit_stops_runaway_loops() {
        let limits = Limits {
            step_limit: 50,
            ..Limits::default()
        };
        let (result, _) = run_with_limits("while (true) { 1 }", limits);
        assert_eq!(result.unwrap_err().error, RuntimeError::StepLimit(50));
    }

    #[test]
    fn deep_recursion_is_an_error() {
        let (result, _) = run_source("function f(n) { return f(n + 1) }\nf(0)");
        assert!(matches!(
            result.unwrap_err().error,
            RuntimeError::StackOverflow(_)
        ));
    }

    #[test]
    fn print_goes_to_captured_output() {
        let (result, out) = run_source("print(\"a\", 1)\nprint([1, \"b\"])");
        assert_eq!(result.unwrap(), Some(Value::Null));
        assert_eq!(out, "a 1\n[1, \"b\"]\n");
    }

    #[test]
    fn exit_and_error_builtins() {
        let (result, _) = run_source("exit(3)\n1");
        assert_eq!(result.unwrap_err().error, RuntimeError::Exit(3));
        let (result, _) = run_source("error(\"bad input\")");
        let diag = result.unwrap_err();
        assert_eq!(diag.to_string(), "bad input");
        assert_eq!(diag.span, Span::new(0, 18));
    }
}
