//! JavaScript: interpreted via node, entry point from `function` or
//! arrow-function bindings.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tokio::process::Command;

use super::{json_style_literal, LanguageRuntime, PreparedUnit, DEFAULT_ENTRY_POINT};
use crate::types::{Language, TestCase};

const SOURCE_FILE: &str = "main.js";

pub struct JavascriptRuntime;

fn function_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?m)^\s*(?:function\s+(\w+)\s*\(|(?:const|let|var)\s+(\w+)\s*=\s*(?:async\s+)?(?:function\b|\())")
            .expect("valid regex")
    })
}

fn entry_point(code: &str) -> &str {
    function_pattern()
        .captures(code)
        .and_then(|c| c.get(1).or_else(|| c.get(2)))
        .map(|m| m.as_str())
        .unwrap_or(DEFAULT_ENTRY_POINT)
}

impl LanguageRuntime for JavascriptRuntime {
    fn language(&self) -> Language {
        Language::Javascript
    }

    fn prepare(&self, code: &str, case: &TestCase) -> PreparedUnit {
        let entry = entry_point(code);
        let literal = json_style_literal(&case.input);
        let source = format!(
            "{code}\n\n\
             const __result = {entry}({literal});\n\
             if (__result !== undefined) {{\n\
             \x20   console.log(typeof __result === \"object\" ? JSON.stringify(__result) : __result);\n\
             }}\n"
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
        let mut cmd = Command::new("node");
        cmd.arg(dir.join(&unit.file_name));
        cmd
    }
}
