// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Example extraction against declarations from the script runtime.

use std::rc::Rc;

use pretty_assertions::assert_eq;

use babylon_annotate::{AssertionPayload, Literal, ParseContext, ProbeMode, ProbeSite};
use babylon_runtime::{MemoryDocuments, Runtime};
use babylon_script::ScriptRuntime;
use babylon_source::Source;

const AREA: &str = r#"/* <Example :name="foo" x=1 y=2 /> */
function foo(x, y) {
  // <Probe />
  let sum = x + y
  // <Probe expression="sum * 2" />
  let twice = sum * 2
  // <Assertion example="foo" expected=3 />
  return sum
}

// <Assertion example="other" expected=1 />
// <Assertion example="foo" expression="foo(0, 0) == 0" />
let unused = 0
"#;

fn parse(text: &str) -> Vec<babylon_annotate::Example> {
    let runtime = ScriptRuntime::new(Rc::new(MemoryDocuments::new()));
    let source = Source::new("file:///w/area.bab", text);
    let declarations = runtime.declarations(&source).unwrap();
    ParseContext::new().unwrap().parse_examples(text, &declarations, source.uri())
}

#[test]
fn example_from_declared_function() {
    let examples = parse(AREA);
    assert_eq!(examples.len(), 1);
    let example = &examples[0];
    assert_eq!(example.name, "foo");
    assert_eq!(example.invocation, "foo(1, 2)");
    assert_eq!(example.function_line, 2);
    assert_eq!(example.definition_line, 1);
    assert_eq!(example.probe_mode, ProbeMode::Default);
    assert_eq!(example.uri, "file:///w/area.bab");
    assert!(example.result.is_none());
    assert_eq!(
        example.probe_sites,
        vec![
            ProbeSite {
                line: 3,
                expression: None
            },
            ProbeSite {
                line: 5,
                expression: Some("sum * 2".into())
            },
        ]
    );
    let sites: Vec<_> = example
        .assertion_sites
        .iter()
        .map(|site| (site.line, site.payload.clone()))
        .collect();
    assert_eq!(
        sites,
        vec![
            (7, AssertionPayload::Expected(Literal::Int(3))),
            (12, AssertionPayload::Expression("foo(0, 0) == 0".into())),
        ]
    );
}

#[test]
fn reparsing_is_deterministic() {
    assert_eq!(parse(AREA), parse(AREA));
}

#[test]
fn examples_serialize_for_reports() {
    let json = serde_json::to_value(&parse(AREA)[0]).unwrap();
    assert_eq!(json["probe_mode"], "default");
    assert_eq!(json["invocation"], "foo(1, 2)");
    assert_eq!(json["result"], serde_json::Value::Null);
}
