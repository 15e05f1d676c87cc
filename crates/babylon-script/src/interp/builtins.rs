// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Built-in functions.

use babylon_runtime::Value;

use super::{Interpreter, RuntimeError};

const BUILTINS: &[&str] = &["print", "len", "str", "error", "exit"];

pub(super) fn is_builtin(name: &str) -> bool {
    BUILTINS.contains(&name)
}

fn expect_args(name: &str, args: &[Value], expected: usize) -> Result<(), RuntimeError> {
    if args.len() != expected {
        return Err(RuntimeError::ArityMismatch {
            name: name.to_string(),
            expected,
            got: args.len(),
        });
    }
    Ok(())
}

impl Interpreter {
    pub(super) fn call_builtin(&mut self, name: &str, args: Vec<Value>) -> Result<Value, RuntimeError> {
        match name {
            "print" => {
                let line = args
                    .iter()
                    .map(|arg| arg.to_string())
                    .collect::<Vec<_>>()
                    .join(" ");
                let mut output = self.output.borrow_mut();
                output.push_str(&line);
                output.push('\n');
                Ok(Value::Null)
            }
            "len" => {
                expect_args(name, &args, 1)?;
                match &args[0] {
                    Value::Str(s) => Ok(Value::Int(s.chars().count() as i64)),
                    Value::List(items) => Ok(Value::Int(items.len() as i64)),
                    other => Err(RuntimeError::TypeError(format!(
                        "len() expects a string or list, got {}",
                        other.type_name()
                    ))),
                }
            }
            "str" => {
                expect_args(name, &args, 1)?;
                Ok(Value::Str(args[0].to_string()))
            }
            "error" => {
                let message = match args.first() {
                    Some(value) => value.to_string(),
                    None => "error".to_string(),
                };
                Err(RuntimeError::Panic(message))
            }
            "exit" => {
                let code = match args.first() {
                    None => 0,
                    Some(Value::Int(n)) => i32::try_from(*n).unwrap_or(1),
                    Some(other) => {
                        return Err(RuntimeError::TypeError(format!(
                            "exit() expects an int, got {}",
                            other.type_name()
                        )))
                    }
                };
                Err(RuntimeError::Exit(code))
            }
            _ => Err(RuntimeError::UndefinedFunction(name.to_string())),
        }
    }
}
