//! Java: compiled with javac, run by class name.
//!
//! Solutions that already carry a `main` are used as-is (the file is
//! named after their public class). Otherwise the user code is wrapped
//! into a `Main` class whose `main` calls the detected static entry
//! point and prints the result.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tokio::process::Command;

use super::{json_style_literal, LanguageRuntime, PreparedUnit, DEFAULT_ENTRY_POINT};
use crate::types::{Language, TestCase};

const WRAPPER_CLASS: &str = "Main";

pub struct JavaRuntime;

fn class_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"public\s+class\s+(\w+)").expect("valid regex"))
}

fn method_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"static\s+[\w<>\[\],\s]+?\s(\w+)\s*\(").expect("valid regex")
    })
}

fn has_main(code: &str) -> bool {
    code.contains("public static void main")
}

/// Public class name for self-contained solutions, else `Main`.
fn class_name(code: &str) -> &str {
    class_pattern()
        .captures(code)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
        .unwrap_or(WRAPPER_CLASS)
}

/// First static method that is not `main`, else `solve`.
fn entry_point(code: &str) -> &str {
    method_pattern()
        .captures_iter(code)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .find(|name| *name != "main")
        .unwrap_or(DEFAULT_ENTRY_POINT)
}

fn indent(code: &str) -> String {
    code.lines()
        .map(|l| {
            if l.is_empty() {
                String::new()
            } else {
                format!("    {l}")
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

impl LanguageRuntime for JavaRuntime {
    fn language(&self) -> Language {
        Language::Java
    }

    fn prepare(&self, code: &str, case: &TestCase) -> PreparedUnit {
        if has_main(code) {
            return PreparedUnit {
                file_name: format!("{}.java", class_name(code)),
                source: code.to_string(),
            };
        }

        let entry = entry_point(code);
        let literal = json_style_literal(&case.input);
        let source = format!(
            "import java.util.*;\n\n\
             public class {WRAPPER_CLASS} {{\n\
             {}\n\n\
             \x20   public static void main(String[] args) {{\n\
             \x20       System.out.println({entry}({literal}));\n\
             \x20   }}\n\
             }}\n",
            indent(code)
        );
        PreparedUnit {
            file_name: format!("{WRAPPER_CLASS}.java"),
            source,
        }
    }

    fn compile_command(&self, dir: &Path, unit: &PreparedUnit) -> Option<Command> {
        let mut cmd = Command::new("javac");
        cmd.arg(dir.join(&unit.file_name));
        Some(cmd)
    }

    fn run_command(&self, dir: &Path, unit: &PreparedUnit) -> Command {
        let class = unit
            .file_name
            .strip_suffix(".java")
            .unwrap_or(WRAPPER_CLASS);
        let mut cmd = Command::new("java");
        cmd.arg("-cp").arg(dir).arg(class);
        cmd
    }
}
