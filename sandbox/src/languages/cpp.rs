//! C++: compiled with g++, run as a native binary.

use std::path::Path;
use std::sync::OnceLock;

use regex::Regex;
use tokio::process::Command;

use super::{json_style_literal, LanguageRuntime, PreparedUnit, DEFAULT_ENTRY_POINT};
use crate::types::{Language, TestCase};

const SOURCE_FILE: &str = "main.cpp";
const BINARY_FILE: &str = "main";

pub struct CppRuntime;

fn function_pattern() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // Return type, name, parameter list, opening brace. Loose on purpose:
    // model output ranges from `int solve(...)` to `vector<int> f(...)`.
    RE.get_or_init(|| {
        Regex::new(r"(?m)^[\w:<>,\s\*&]+?\b(\w+)\s*\([^;{]*\)\s*\{").expect("valid regex")
    })
}

fn has_main(code: &str) -> bool {
    code.contains("int main(") || code.contains("int main (")
}

/// First free function that is not `main`, else `solve`.
fn entry_point(code: &str) -> &str {
    function_pattern()
        .captures_iter(code)
        .filter_map(|c| c.get(1))
        .map(|m| m.as_str())
        .find(|name| *name != "main")
        .unwrap_or(DEFAULT_ENTRY_POINT)
}

impl LanguageRuntime for CppRuntime {
    fn language(&self) -> Language {
        Language::Cpp
    }

    fn prepare(&self, code: &str, case: &TestCase) -> PreparedUnit {
        if has_main(code) {
            return PreparedUnit {
                file_name: SOURCE_FILE.to_string(),
                source: code.to_string(),
            };
        }

        let entry = entry_point(code);
        let literal = json_style_literal(&case.input);
        let source = format!(
            "#include <iostream>\n\
             #include <string>\n\
             #include <vector>\n\
             using namespace std;\n\n\
             {code}\n\n\
             int main() {{\n\
             \x20   auto __result = {entry}({literal});\n\
             \x20   cout << __result << endl;\n\
             \x20   return 0;\n\
             }}\n"
        );
        PreparedUnit {
            file_name: SOURCE_FILE.to_string(),
            source,
        }
    }

    fn compile_command(&self, dir: &Path, unit: &PreparedUnit) -> Option<Command> {
        let mut cmd = Command::new("g++");
        cmd.arg(dir.join(&unit.file_name))
            .arg("-O2")
            .arg("-o")
            .arg(dir.join(BINARY_FILE));
        Some(cmd)
    }

    fn run_command(&self, dir: &Path, _unit: &PreparedUnit) -> Command {
        Command::new(dir.join(BINARY_FILE))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detects_free_function() {
        let code = "int add(int a, int b) {\n    return a + b;\n}";
        assert_eq!(entry_point(code), "add");
    }

    #[test]
    fn detects_templated_return_type() {
        let code = "vector<int> twoSum(vector<int>& nums, int target) {\n    return {};\n}";
        assert_eq!(entry_point(code), "twoSum");
    }

    #[test]
    fn skips_main_when_detecting() {
        let code = "int helper(int x) {\n    return x;\n}\nint main() { return 0; }";
        assert_eq!(entry_point(code), "helper");
    }

    #[test]
    fn wraps_code_without_main() {
        let case = TestCase::new("7", "14");
        let unit = CppRuntime.prepare("int dbl(int x) {\n    return 2 * x;\n}", &case);
        assert!(unit.source.contains("auto __result = dbl(7);"));
        assert!(unit.source.contains("#include <iostream>"));
    }

    #[test]
    fn existing_main_kept_verbatim() {
        let code = "#include <cstdio>\nint main() { puts(\"ok\"); }";
        let case = TestCase::new("", "ok");
        let unit = CppRuntime.prepare(code, &case);
        assert_eq!(unit.source, code);
    }
}
