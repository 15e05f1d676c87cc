// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! `Runtime` implementation for Babylon script.

use std::cell::RefCell;
use std::collections::{HashMap, HashSet};
use std::rc::Rc;

use tracing::{debug, warn};

use babylon_runtime::{
    Callable, DocumentStore, Evaluable, EventFilter, Frame, FunctionDeclaration, GuestError,
    NodeInfo, Outcome, Runtime, SharedListener, Subscription, Value,
};
use babylon_source::{resolve_sibling_uri, Source, SourceSection};

use crate::ast::Program;
use crate::instrument::Instrumenter;
use crate::interp::{Callee, FunctionTable, Interpreter, Limits, RuntimeError, Unit};
use crate::lexer::Lexer;
use crate::locate;
use crate::parser::Parser;

/// Lex and parse a whole document, failing on the first error.
pub(crate) fn parse_program(text: &str) -> Result<Program, GuestError> {
    let lexed = Lexer::new(text).tokenize();
    if let Some(err) = lexed.errors.into_iter().next() {
        return Err(GuestError::syntax(err.message, err.span));
    }
    let parsed = Parser::new(lexed.tokens).parse();
    if let Some(err) = parsed.errors.into_iter().next() {
        return Err(GuestError::syntax(err.message, err.span));
    }
    Ok(parsed.program)
}

/// The reference guest runtime.
///
/// Listeners attached here see every program parsed by this runtime.
/// `print` output is collected rather than written to stdout; drain it with
/// [`ScriptRuntime::take_output`].
pub struct ScriptRuntime {
    documents: Rc<dyn DocumentStore>,
    instrumenter: Rc<Instrumenter>,
    limits: Limits,
    /// Function tables of parsed programs, by the URI of each of their units.
    programs: RefCell<HashMap<String, Rc<FunctionTable>>>,
    output: Rc<RefCell<String>>,
}

impl ScriptRuntime {
    pub fn new(documents: Rc<dyn DocumentStore>) -> Self {
        Self {
            documents,
            instrumenter: Instrumenter::new(),
            limits: Limits::default(),
            programs: RefCell::new(HashMap::new()),
            output: Rc::new(RefCell::new(String::new())),
        }
    }

    pub fn with_limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> Limits {
        self.limits
    }

    pub fn take_output(&self) -> String {
        std::mem::take(&mut *self.output.borrow_mut())
    }

    /// Number of listeners currently attached.
    pub fn listener_count(&self) -> usize {
        self.instrumenter.binding_count()
    }

    /// Parse `root` and everything it imports, dependencies first.
    fn link(&self, root: Rc<Source>) -> Result<Vec<Unit>, GuestError> {
        let mut units = Vec::new();
        let mut seen = HashSet::new();
        self.load_unit(root, &mut units, &mut seen)?;
        Ok(units)
    }

    fn load_unit(
        &self,
        source: Rc<Source>,
        units: &mut Vec<Unit>,
        seen: &mut HashSet<String>,
    ) -> Result<(), GuestError> {
        if !seen.insert(source.uri().to_string()) {
            return Ok(());
        }
        let program = parse_program(source.text())?;
        let imports: Vec<_> = program
            .imports()
            .map(|(path, span)| (path.to_string(), span))
            .collect();
        for (path, span) in imports {
            let uri = resolve_sibling_uri(source.uri(), &path);
            if seen.contains(&uri) {
                continue;
            }
            let Some(text) = self.documents.text(&uri) else {
                return Err(GuestError::syntax(
                    format!("cannot import \"{}\": document not found", path),
                    span,
                ));
            };
            debug!(%uri, "importing");
            self.load_unit(Rc::new(Source::new(uri, text)), units, seen)?;
        }
        units.push(Unit { source, program });
        Ok(())
    }
}

impl Runtime for ScriptRuntime {
    fn language(&self) -> &str {
        "babylon-script"
    }

    fn parse(&self, source: Rc<Source>) -> Result<Box<dyn Callable>, GuestError> {
        let units = self.link(Rc::clone(&source))?;

        let mut functions = FunctionTable::new();
        for unit in &units {
            for decl in unit.program.functions() {
                functions.insert(
                    decl.name.clone(),
                    Callee {
                        decl: Rc::clone(decl),
                        source: Rc::clone(&unit.source),
                    },
                );
            }
        }
        let functions = Rc::new(functions);
        {
            let mut programs = self.programs.borrow_mut();
            for unit in &units {
                programs.insert(unit.source.uri().to_string(), Rc::clone(&functions));
            }
        }

        Ok(Box::new(ScriptProgram {
            root: source,
            units,
            functions,
            instrumenter: Rc::clone(&self.instrumenter),
            limits: self.limits,
            output: Rc::clone(&self.output),
        }))
    }

    fn parse_inline(
        &self,
        code: &str,
        enclosing: &SourceSection,
        _frame: &dyn Frame,
    ) -> Result<Box<dyn Evaluable>, GuestError> {
        let program = parse_program(code)?;
        if program.imports().next().is_some() || program.functions().next().is_some() {
            return Err(GuestError::runtime(
                "inline code cannot declare functions or imports",
            ));
        }
        let functions = match self.programs.borrow().get(&enclosing.uri) {
            Some(functions) => Rc::clone(functions),
            None => {
                warn!(uri = %enclosing.uri, "inline code outside any parsed program");
                Rc::new(FunctionTable::new())
            }
        };
        Ok(Box::new(InlineSnippet {
            unit: Unit {
                source: Rc::new(Source::new(enclosing.uri.clone(), code)),
                program,
            },
            functions,
            limits: self.limits,
            output: Rc::clone(&self.output),
        }))
    }

    fn attach_listener(
        &self,
        filter: EventFilter,
        input_filter: Option<EventFilter>,
        listener: SharedListener,
    ) -> Subscription {
        self.instrumenter.attach(filter, input_filter, listener)
    }

    fn declarations(&self, source: &Source) -> Result<Vec<FunctionDeclaration>, GuestError> {
        let program = parse_program(source.text())?;
        Ok(locate::declarations(&program, source))
    }

    fn node_at(
        &self,
        source: &Source,
        line: usize,
        col: usize,
    ) -> Result<Option<NodeInfo>, GuestError> {
        let program = parse_program(source.text())?;
        Ok(locate::node_at(&program, source, line, col))
    }
}

struct ScriptProgram {
    root: Rc<Source>,
    units: Vec<Unit>,
    functions: Rc<FunctionTable>,
    instrumenter: Rc<Instrumenter>,
    limits: Limits,
    output: Rc<RefCell<String>>,
}

impl Callable for ScriptProgram {
    fn call(&self) -> Result<Outcome, GuestError> {
        let mut interp = Interpreter::new(
            Rc::clone(&self.functions),
            Rc::clone(&self.root),
            self.limits,
            Rc::clone(&self.output),
        )
        .with_hooks(Rc::clone(&self.instrumenter));

        match interp.run(&self.units) {
            Ok(value) => Ok(Outcome::Returned(value.unwrap_or(Value::Null))),
            Err(diag) => match diag.error {
                RuntimeError::Exit(code) => Ok(Outcome::Exited(code)),
                RuntimeError::Escape(value) => Ok(Outcome::Escaped(value)),
                _ => Err(diag.to_guest_error()),
            },
        }
    }
}

/// Code parsed for evaluation inside a captured frame. Runs without
/// instrumentation.
struct InlineSnippet {
    unit: Unit,
    functions: Rc<FunctionTable>,
    limits: Limits,
    output: Rc<RefCell<String>>,
}

impl Evaluable for InlineSnippet {
    fn execute(&self, frame: &dyn Frame) -> Result<Value, GuestError> {
        let mut interp = Interpreter::new(
            Rc::clone(&self.functions),
            Rc::clone(&self.unit.source),
            self.limits,
            Rc::clone(&self.output),
        );
        for (name, value) in frame.materialize().iter() {
            interp.define_global(name.clone(), value.clone());
        }
        interp
            .run(std::slice::from_ref(&self.unit))
            .map(|value| value.unwrap_or(Value::Null))
            .map_err(|diag| diag.to_guest_error())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use babylon_runtime::{MaterializedFrame, MemoryDocuments};

    fn runtime_with(docs: &[(&str, &str)]) -> ScriptRuntime {
        let mut documents = MemoryDocuments::new();
        for (uri, text) in docs {
            documents.insert(*uri, *text);
        }
        ScriptRuntime::new(Rc::new(documents))
    }

    #[test]
    fn run_returns_last_value() {
        let runtime = runtime_with(&[]);
        let program = runtime
            .parse(Rc::new(Source::new("file:///w/a.bab", "let x = 2\nx * 21")))
            .unwrap();
        assert_eq!(program.call().unwrap(), Outcome::Returned(Value::Int(42)));
    }

    #[test]
    fn imports_resolve_next_to_the_importer() {
        let runtime = runtime_with(&[(
            "file:///w/lib.bab",
            "function double(x) { return x * 2 }\nlet base = 5",
        )]);
        let program = runtime
            .parse(Rc::new(Source::new(
                "file:///w/main.bab",
                "import \"lib.bab\"\ndouble(base)",
            )))
            .unwrap();
        assert_eq!(program.call().unwrap(), Outcome::Returned(Value::Int(10)));
    }

    #[test]
    fn missing_import_is_a_syntax_error() {
        let runtime = runtime_with(&[]);
        let err = runtime
            .parse(Rc::new(Source::new("file:///w/main.bab", "import \"nope.bab\"")))
            .err()
            .unwrap();
        assert_eq!(err.message, "cannot import \"nope.bab\": document not found");
    }

    #[test]
    fn import_cycles_terminate() {
        let runtime = runtime_with(&[("file:///w/b.bab", "import \"a.bab\"\nlet b = 1")]);
        let program = runtime
            .parse(Rc::new(Source::new("file:///w/a.bab", "import \"b.bab\"\nb + 1")))
            .unwrap();
        assert_eq!(program.call().unwrap(), Outcome::Returned(Value::Int(2)));
    }

    #[test]
    fn exit_and_faults() {
        let runtime = runtime_with(&[]);
        let exited = runtime
            .parse(Rc::new(Source::new("a.bab", "exit(2)")))
            .unwrap()
            .call();
        assert_eq!(exited.unwrap(), Outcome::Exited(2));

        let faulted = runtime
            .parse(Rc::new(Source::new("a.bab", "1 / 0")))
            .unwrap()
            .call();
        assert_eq!(faulted.unwrap_err().message, "division by zero");
    }

    #[test]
    fn inline_sees_frame_and_functions() {
        let runtime = runtime_with(&[]);
        let source = Rc::new(Source::new("file:///w/a.bab", "function sq(x) { return x * x }"));
        runtime.parse(Rc::clone(&source)).unwrap();
        let enclosing = source.section(babylon_source::Span::new(0, 8)).unwrap();
        let frame = MaterializedFrame::new().with("n", Value::Int(4));
        let snippet = runtime.parse_inline("sq(n) + 1", &enclosing, &frame).unwrap();
        assert_eq!(snippet.execute(&frame).unwrap(), Value::Int(17));
    }

    #[test]
    fn syntax_errors_carry_spans() {
        let runtime = runtime_with(&[]);
        let err = runtime
            .parse(Rc::new(Source::new("a.bab", "let = 1")))
            .err()
            .unwrap();
        assert_eq!(err.kind, babylon_runtime::GuestErrorKind::Syntax);
        assert_eq!(err.span, Some(babylon_source::Span::new(4, 5)));
    }

    #[test]
    fn print_is_captured() {
        let runtime = runtime_with(&[]);
        runtime
            .parse(Rc::new(Source::new("a.bab", "print(\"hi\")")))
            .unwrap()
            .call()
            .unwrap();
        assert_eq!(runtime.take_output(), "hi\n");
        assert_eq!(runtime.take_output(), "");
    }
}
