use std::fmt::Write as _;

use serde_json::Value;

use crate::config::{HarnessFlavor, ParamKind, ProblemConfig, ProblemSchema};

use super::JudgeError;

/// A generated, runnable program wrapping the user's code.
///
/// Harness contract: the program JSON-decodes its argument vector from its
/// first process argument, invokes the solution entry point, prints the
/// JSON-encoded result to stdout, and writes to stderr only on failure —
/// a single `ErrorKind: message` line for the interpreted flavors.
#[derive(Debug)]
pub(super) enum Harness {
    /// Single source file handed to an interpreter
    Interpreted { source: String },
    /// Generated driver plus the user's solution type, compiled together
    Compiled {
        driver_source: String,
        solution_source: String,
    },
}

const JS_TEMPLATE: &str = r#""use strict";
const __candidates = %CANDIDATES%;
const __source = %USER_SOURCE%;

try {
  const __probes = __candidates
    .map((__name) => "typeof " + __name + " === \"function\" ? " + __name + " : null")
    .join(", ");
  const __values = new Function(__source + "\n;return [" + __probes + "];")();
  const __entry = __values.find((__value) => __value !== null);
  if (__entry === undefined) {
    throw new Error("no solution function found (expected one of: " + __candidates.join(", ") + ")");
  }
  const __args = JSON.parse(process.argv[2]);
  const __result = Array.isArray(__args) ? __entry(...__args) : __entry(__args);
  console.log(JSON.stringify(__result));
} catch (__err) {
  const __kind = (__err && __err.name) || "Error";
  const __message = __err && __err.message !== undefined ? __err.message : String(__err);
  console.error(__kind + ": " + __message);
}
"#;

const PY_TEMPLATE: &str = r#"import json
import sys

_CANDIDATES = %CANDIDATES%
_SOURCE = %USER_SOURCE%


def _resolve_entry(namespace):
    for name in _CANDIDATES:
        value = namespace.get(name)
        if callable(value):
            return value
    return None


def _main():
    namespace = {}
    exec(compile(_SOURCE, "<solution>", "exec"), namespace)
    entry = _resolve_entry(namespace)
    if entry is None:
        raise RuntimeError("no solution function found (expected one of: %s)" % ", ".join(_CANDIDATES))
    args = json.loads(sys.argv[1])
    result = entry(*args) if isinstance(args, list) else entry(args)
    print(json.dumps(result, separators=(",", ":")))


try:
    _main()
except BaseException as exc:
    print("%s: %s" % (type(exc).__name__, exc), file=sys.stderr)
"#;

/// Produces the complete runnable harness for one request.
///
/// The interpreted flavors embed the user code and an ordered, data-driven
/// entry-point candidate list; probing and calling-convention dispatch
/// (JSON array argument vectors are spread positionally, anything else is
/// passed as a single argument) happen inside the generated program. The
/// compiled flavor instead generates a driver from the problem's declared
/// entry schema and fails with a configuration error when there is none.
pub(super) fn generate(
    flavor: HarnessFlavor,
    user_code: &str,
    problem: &ProblemConfig,
) -> Result<Harness, JudgeError> {
    match flavor {
        HarnessFlavor::Javascript => Ok(Harness::Interpreted {
            source: javascript_harness(user_code, &problem.entry_points),
        }),
        HarnessFlavor::Python => Ok(Harness::Interpreted {
            source: python_harness(user_code, &python_candidates(&problem.entry_points)),
        }),
        HarnessFlavor::Java => {
            let schema = problem
                .schema
                .as_ref()
                .ok_or_else(|| JudgeError::MissingSchema(problem.title.clone()))?;
            Ok(Harness::Compiled {
                driver_source: java_driver(schema),
                solution_source: user_code.to_string(),
            })
        }
    }
}

// Both interpreted harnesses embed the user source as a string literal and
// compile it at runtime, inside the try block. A syntax error or top-level
// raise in the user code is then an ordinary caught exception, reported as
// a single `ErrorKind: message` stderr line instead of a native stack trace.

fn javascript_harness(user_code: &str, candidates: &[String]) -> String {
    JS_TEMPLATE
        .replace("%CANDIDATES%", &candidate_list(candidates))
        .replace("%USER_SOURCE%", &source_literal(user_code))
}

fn python_harness(user_code: &str, candidates: &[String]) -> String {
    PY_TEMPLATE
        .replace("%CANDIDATES%", &candidate_list(candidates))
        .replace("%USER_SOURCE%", &source_literal(user_code))
}

/// JSON string literal of the user source; valid in both JavaScript and Python.
fn source_literal(user_code: &str) -> String {
    Value::String(user_code.to_string()).to_string()
}

/// JSON array literal of candidate names; valid in both JavaScript and Python.
fn candidate_list(candidates: &[String]) -> String {
    Value::from(candidates.to_vec()).to_string()
}

/// Expands entry-point candidates with their snake_case variants, so a
/// problem configured with one canonical name covers both conventions.
pub(super) fn python_candidates(entry_points: &[String]) -> Vec<String> {
    let mut candidates = Vec::with_capacity(entry_points.len() * 2);
    for name in entry_points {
        if !candidates.contains(name) {
            candidates.push(name.clone());
        }
        let snake = camel_to_snake(name);
        if !candidates.contains(&snake) {
            candidates.push(snake);
        }
    }
    candidates
}

fn camel_to_snake(name: &str) -> String {
    let mut out = String::with_capacity(name.len() + 4);
    for ch in name.chars() {
        if ch.is_ascii_uppercase() {
            if !out.is_empty() {
                out.push('_');
            }
            out.push(ch.to_ascii_lowercase());
        } else {
            out.push(ch);
        }
    }
    out
}

// ===== Compiled-path driver generation =====

const JAVA_PARSE_INT_ARRAY: &str = r#"    static int[] parseIntArray(String raw) {
        if (raw.isEmpty()) {
            return new int[0];
        }
        String[] parts = raw.split(",");
        int[] values = new int[parts.length];
        for (int i = 0; i < parts.length; i++) {
            values[i] = Integer.parseInt(parts[i].trim());
        }
        return values;
    }
"#;

const JAVA_PARSE_STRING_ARRAY: &str = r#"    static String[] parseStringArray(String raw) {
        if (raw.isEmpty()) {
            return new String[0];
        }
        // Elements are taken verbatim; whitespace is significant in strings.
        return raw.split(",");
    }
"#;

const JAVA_FORMAT_INT_ARRAY: &str = r#"    static String formatIntArray(int[] values) {
        StringBuilder out = new StringBuilder("[");
        for (int i = 0; i < values.length; i++) {
            if (i > 0) {
                out.append(",");
            }
            out.append(values[i]);
        }
        return out.append("]").toString();
    }
"#;

const JAVA_FORMAT_STRING_ARRAY: &str = r#"    static String formatStringArray(String[] values) {
        StringBuilder out = new StringBuilder("[");
        for (int i = 0; i < values.length; i++) {
            if (i > 0) {
                out.append(",");
            }
            String escaped = values[i].replace("\\", "\\\\").replace("\"", "\\\"");
            out.append("\"").append(escaped).append("\"");
        }
        return out.append("]").toString();
    }
"#;

/// Generates the `Main` driver for the compiled path from a problem's entry
/// schema: parse each process argument into the declared parameter type,
/// instantiate the user's `Solution`, invoke the declared method, and print
/// the result following the interpreted harnesses' JSON conventions
/// (arrays without internal whitespace, strings quoted).
fn java_driver(schema: &ProblemSchema) -> String {
    let mut src = String::new();
    src.push_str("public class Main {\n");
    src.push_str("    public static void main(String[] args) {\n");
    src.push_str("        Solution solution = new Solution();\n");
    for (i, kind) in schema.params.iter().enumerate() {
        let _ = writeln!(
            src,
            "        {} arg{i} = {};",
            java_type(*kind),
            java_parse_expr(*kind, i)
        );
    }
    let call_args = (0..schema.params.len())
        .map(|i| format!("arg{i}"))
        .collect::<Vec<_>>()
        .join(", ");
    let _ = writeln!(
        src,
        "        {} result = solution.{}({call_args});",
        java_type(schema.returns),
        schema.method
    );
    let _ = writeln!(src, "        {}", java_print_stmt(schema.returns));
    src.push_str("    }\n");
    for helper in java_helpers(schema) {
        src.push('\n');
        src.push_str(helper);
    }
    src.push_str("}\n");
    src
}

fn java_type(kind: ParamKind) -> &'static str {
    match kind {
        ParamKind::Int => "int",
        ParamKind::Long => "long",
        ParamKind::Double => "double",
        ParamKind::Bool => "boolean",
        ParamKind::String => "String",
        ParamKind::IntArray => "int[]",
        ParamKind::StringArray => "String[]",
    }
}

fn java_parse_expr(kind: ParamKind, index: usize) -> String {
    match kind {
        ParamKind::Int => format!("Integer.parseInt(args[{index}])"),
        ParamKind::Long => format!("Long.parseLong(args[{index}])"),
        ParamKind::Double => format!("Double.parseDouble(args[{index}])"),
        ParamKind::Bool => format!("Boolean.parseBoolean(args[{index}])"),
        ParamKind::String => format!("args[{index}]"),
        ParamKind::IntArray => format!("parseIntArray(args[{index}])"),
        ParamKind::StringArray => format!("parseStringArray(args[{index}])"),
    }
}

fn java_print_stmt(kind: ParamKind) -> &'static str {
    match kind {
        ParamKind::Int | ParamKind::Long | ParamKind::Double | ParamKind::Bool => {
            "System.out.println(result);"
        }
        ParamKind::String => r#"System.out.println("\"" + result + "\"");"#,
        ParamKind::IntArray => "System.out.println(formatIntArray(result));",
        ParamKind::StringArray => "System.out.println(formatStringArray(result));",
    }
}

fn java_helpers(schema: &ProblemSchema) -> Vec<&'static str> {
    let mut helpers = Vec::new();
    let uses = |kind: ParamKind| schema.params.contains(&kind);

    if uses(ParamKind::IntArray) {
        helpers.push(JAVA_PARSE_INT_ARRAY);
    }
    if uses(ParamKind::StringArray) {
        helpers.push(JAVA_PARSE_STRING_ARRAY);
    }
    if schema.returns == ParamKind::IntArray {
        helpers.push(JAVA_FORMAT_INT_ARRAY);
    }
    if schema.returns == ParamKind::StringArray {
        helpers.push(JAVA_FORMAT_STRING_ARRAY);
    }
    helpers
}

// ===== Argument handling =====

/// Wraps the caller-supplied comma-joined input into the JSON argument
/// vector the interpreted harnesses decode.
pub(super) fn wrapped_argument(input: &str) -> String {
    format!("[{input}]")
}

/// Decodes the argument input into its argument vector, rejecting malformed
/// input before any artifact or process exists.
pub(super) fn decode_argument_vector(input: &str) -> Result<Vec<Value>, JudgeError> {
    match serde_json::from_str::<Value>(&wrapped_argument(input)) {
        Ok(Value::Array(items)) => Ok(items),
        Ok(_) => Err(JudgeError::MalformedInput(
            "input did not decode to an argument vector".to_string(),
        )),
        Err(e) => Err(JudgeError::MalformedInput(e.to_string())),
    }
}

/// Reflows a decoded argument vector into the flat command-line form the
/// compiled driver parses: arrays become comma-joined scalars, strings are
/// passed raw, other scalars keep their JSON text.
pub(super) fn reformat_compiled_args(
    args: &[Value],
    schema: &ProblemSchema,
) -> Result<Vec<String>, JudgeError> {
    if args.len() != schema.params.len() {
        return Err(JudgeError::MalformedInput(format!(
            "expected {} argument(s) for method {}, got {}",
            schema.params.len(),
            schema.method,
            args.len()
        )));
    }
    args.iter().map(flatten_argument).collect()
}

fn flatten_argument(value: &Value) -> Result<String, JudgeError> {
    match value {
        Value::Array(items) => {
            let mut parts = Vec::with_capacity(items.len());
            for item in items {
                match item {
                    Value::String(s) => parts.push(s.clone()),
                    Value::Array(_) | Value::Object(_) => {
                        return Err(JudgeError::MalformedInput(
                            "nested containers cannot be passed to the compiled driver"
                                .to_string(),
                        ));
                    }
                    scalar => parts.push(scalar.to_string()),
                }
            }
            Ok(parts.join(","))
        }
        Value::String(s) => Ok(s.clone()),
        Value::Object(_) => Err(JudgeError::MalformedInput(
            "objects cannot be passed to the compiled driver".to_string(),
        )),
        scalar => Ok(scalar.to_string()),
    }
}
