//! Python: interpreted, entry point detected from the first `def`.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tokio::process::Command;

use super::{LanguageRuntime, PreparedUnit, DEFAULT_ENTRY_POINT};
use crate::types::{Language, TestCase};

const SOURCE_FILE: &str = "main.py";

pub struct PythonRuntime;

fn def_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?m)^\s*def\s+(\w+)\s*\(").expect("valid regex"))
}

/// First top-level-ish `def NAME(` in the code, else `solve`.
fn entry_point(code: &str) -> &str {
    def_pattern()
        .captures(code)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(DEFAULT_ENTRY_POINT)
}

/// Render a test-case input as a Python literal.
///
/// JSON and Python literal syntax agree except for `true`/`false`/`null`,
/// so valid JSON is re-rendered value by value; anything else is treated
/// as a plain string.
fn python_literal(input: &str) -> String {
    match serde_json::from_str::<serde_json::Value>(input.trim()) {
        Ok(value) => render_value(&value),
        Err(_) => render_value(&serde_json::Value::String(input.trim().to_string())),
    }
}

fn render_value(value: &serde_json::Value) -> String {
    use serde_json::Value;
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        // serde_json string encoding is valid Python string syntax.
        Value::String(s) => serde_json::to_string(s).unwrap_or_else(|_| format!("{s:?}")),
        Value::Array(items) => {
            let inner: Vec<String> = items.iter().map(render_value).collect();
            format!("[{}]", inner.join(", "))
        }
        Value::Object(map) => {
            let inner: Vec<String> = map
                .iter()
                .map(|(k, v)| {
                    format!(
                        "{}: {}",
                        serde_json::to_string(k).unwrap_or_else(|_| format!("{k:?}")),
                        render_value(v)
                    )
                })
                .collect();
            format!("{{{}}}", inner.join(", "))
        }
    }
}

impl LanguageRuntime for PythonRuntime {
    fn language(&self) -> Language {
        Language::Python
    }

    fn prepare(&self, code: &str, case: &TestCase) -> PreparedUnit {
        let entry = entry_point(code);
        let literal = python_literal(&case.input);
        let source = format!(
            "{code}\n\n\
             if __name__ == \"__main__\":\n\
             \x20   _result = {entry}({literal})\n\
             \x20   if _result is not None:\n\
             \x20       print(_result)\n"
        );
        PreparedUnit {
            file_name: SOURCE_FILE.to_string(),
            source,
        }
    }

    fn compile_command(&self, _dir: &Path, _unit: &PreparedUnit) -> Option<Command> {
        None
    }

    fn run_command(&self, dir: &Path, unit: &PreparedUnit) -> Command {
        let mut cmd = Command::new("python3");
        cmd.arg(dir.join(&unit.file_name));
        cmd
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_first_def() {
        let code = "import math\n\ndef total(nums):\n    return sum(nums)\n";
        assert_eq!(entry_point(code), "total");
    }

    #[test]
    fn falls_back_to_solve() {
        assert_eq!(entry_point("x = 1\n"), "solve");
    }

    #[test]
    fn prepare_injects_call_and_keeps_code() {
        let case = TestCase::new("[1,2,3]", "6");
        let unit = PythonRuntime.prepare("def total(nums):\n    return sum(nums)", &case);
        assert_eq!(unit.file_name, "main.py");
        assert!(unit.source.contains("def total(nums):"));
        assert!(unit.source.contains("_result = total([1, 2, 3])"));
        assert!(unit.source.contains("print(_result)"));
    }

    #[test]
    fn python_literal_translates_json_keywords() {
        assert_eq!(python_literal("true"), "True");
        assert_eq!(python_literal("null"), "None");
        assert_eq!(python_literal("[true, false, null]"), "[True, False, None]");
        assert_eq!(
            python_literal("{\"a\": true}"),
            "{\"a\": True}"
        );
    }

    #[test]
    fn python_literal_quotes_plain_text() {
        assert_eq!(python_literal("hello"), "\"hello\"");
        assert_eq!(python_literal("12abc"), "\"12abc\"");
    }

    #[test]
    fn interpreted_language_has_no_compile_step() {
        let case = TestCase::new("1", "1");
        let unit = PythonRuntime.prepare("def f(x):\n    return x", &case);
        assert!(PythonRuntime
            .compile_command(Path::new("/tmp"), &unit)
            .is_none());
    }
}
