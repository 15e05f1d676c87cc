// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Code lenses and the commands they trigger.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;
use tower_lsp::lsp_types::{CodeLens, Command, Position, Range};

use babylon_annotate::{Example, ExampleScaffold, ProbeMode};
use babylon_runtime::FunctionDeclaration;

pub const ADD_EXAMPLE: &str = "babylon.addExample";
pub const RUN_EXAMPLES: &str = "babylon.runExamples";

/// Placeholder the "Add Example" lens offers for every argument.
const ANY: &str = "any";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunExamplesArgs {
    pub uri: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddExampleLensArgs {
    pub uri: String,
    pub line: usize,
    pub input_mapping: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddExampleArgs {
    pub uri: String,
    /// 1-based line of the function the example is for.
    pub line: usize,
    pub example_name: String,
    #[serde(default)]
    pub probe_mode: ProbeMode,
    /// Argument name to literal text.
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
}

/// Decode the single argument object of a command.
pub fn parse_args<T: for<'de> Deserialize<'de>>(arguments: Vec<Json>) -> Result<T, String> {
    let first = arguments
        .into_iter()
        .next()
        .ok_or_else(|| "missing command argument".to_string())?;
    serde_json::from_value(first).map_err(|err| format!("invalid command argument: {}", err))
}

/// "Add Example" above every function, "Run examples" above every example.
pub fn code_lenses(uri: &str, declarations: &[FunctionDeclaration], examples: &[Example]) -> Vec<CodeLens> {
    let mut lenses = Vec::new();
    for decl in declarations {
        let args = AddExampleLensArgs {
            uri: uri.to_string(),
            line: decl.start_line,
            input_mapping: decl
                .argument_names()
                .map(|name| (name.to_string(), ANY.to_string()))
                .collect(),
        };
        lenses.push(lens(decl.start_line, "Add Example", ADD_EXAMPLE, &args));
    }
    for example in examples {
        let args = RunExamplesArgs {
            uri: uri.to_string(),
        };
        let title = format!("{} Run examples", example.glyph());
        lenses.push(lens(example.definition_line, &title, RUN_EXAMPLES, &args));
    }
    lenses
}

fn lens(line: usize, title: &str, command: &str, args: &impl Serialize) -> CodeLens {
    let position = Position::new(line.saturating_sub(1) as u32, 0);
    CodeLens {
        range: Range::new(position, position),
        command: Some(Command {
            title: title.to_string(),
            command: command.to_string(),
            arguments: serde_json::to_value(args).ok().map(|value| vec![value]),
        }),
        data: None,
    }
}

/// The annotation line for an "Add Example" request.
///
/// Bindings follow the declaration's argument order. Arguments the request
/// leaves out fall back to their default, then to `placeholder`.
pub fn scaffold(args: &AddExampleArgs, decl: Option<&FunctionDeclaration>, placeholder: &str) -> String {
    let mut scaffold = ExampleScaffold::new(args.example_name.clone()).with_probe_mode(args.probe_mode);
    match decl {
        Some(decl) => {
            for arg in &decl.arguments {
                let value = args
                    .variables
                    .get(&arg.name)
                    .map(String::as_str)
                    .or(arg.default_value.as_deref())
                    .unwrap_or(placeholder);
                scaffold = scaffold.bind(arg.name.clone(), value);
            }
        }
        None => {
            for (name, value) in &args.variables {
                scaffold = scaffold.bind(name.clone(), value.clone());
            }
        }
    }
    scaffold.render()
}

#[cfg(test)]
mod tests {
    use super::*;
    use babylon_runtime::ArgumentDeclaration;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn decl() -> FunctionDeclaration {
        FunctionDeclaration {
            name: "area".into(),
            start_line: 3,
            end_line: 5,
            arguments: vec![
                ArgumentDeclaration {
                    name: "w".into(),
                    default_value: None,
                },
                ArgumentDeclaration {
                    name: "h".into(),
                    default_value: Some("2".into()),
                },
            ],
        }
    }

    #[test]
    fn add_example_arguments() {
        let args: AddExampleArgs = parse_args(vec![json!({
            "uri": "file:///w/a.bab",
            "line": 3,
            "exampleName": "wide",
            "probeMode": "all",
            "variables": {"w": "10"}
        })])
        .unwrap();
        assert_eq!(args.probe_mode, ProbeMode::All);
        assert_eq!(
            scaffold(&args, Some(&decl()), "null"),
            "/* <Example :name=\"wide\" :probe-mode=\"all\" w=10 h=2 /> */"
        );
    }

    #[test]
    fn defaults_and_bad_arguments() {
        let args: AddExampleArgs = parse_args(vec![json!({
            "uri": "a.bab",
            "line": 1,
            "exampleName": "e"
        })])
        .unwrap();
        assert_eq!(args.probe_mode, ProbeMode::Default);
        assert_eq!(scaffold(&args, Some(&decl()), "null"), "/* <Example :name=\"e\" w=null h=2 /> */");
        assert!(parse_args::<AddExampleArgs>(Vec::new()).is_err());
        assert!(parse_args::<RunExamplesArgs>(vec![json!({"url": "a"})]).is_err());
    }

    #[test]
    fn lens_per_function() {
        let lenses = code_lenses("a.bab", &[decl()], &[]);
        assert_eq!(lenses.len(), 1);
        assert_eq!(lenses[0].range.start, Position::new(2, 0));
        let command = lenses[0].command.as_ref().unwrap();
        assert_eq!(command.command, ADD_EXAMPLE);
        assert_eq!(
            command.arguments.as_ref().unwrap()[0],
            json!({"uri": "a.bab", "line": 3, "inputMapping": {"w": "any", "h": "any"}})
        );
    }
}
