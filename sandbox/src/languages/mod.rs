//! Per-language code preparation and toolchain invocation.
//!
//! Each supported language implements [`LanguageRuntime`]: turn raw
//! solution code plus one test case into a self-contained source unit,
//! then describe how to compile (if needed) and run it. The runner owns
//! process spawning, timeouts, and cleanup — runtimes only build
//! sources and `Command`s, so adding a language is additive.

use std::path::Path;

use tokio::process::Command;

use crate::types::{Language, TestCase};

mod cpp;
mod java;
mod javascript;
mod python;

pub use cpp::CppRuntime;
pub use java::JavaRuntime;
pub use javascript::JavascriptRuntime;
pub use python::PythonRuntime;

/// A self-contained source unit ready to be staged on disk.
#[derive(Debug, Clone)]
pub struct PreparedUnit {
    /// File name inside the staging directory (Java requires the file
    /// name to match the public class).
    pub file_name: String,
    /// Complete source: user code with the entry-point call injected.
    pub source: String,
}

/// Language-specific preparation and toolchain commands.
pub trait LanguageRuntime: Send + Sync {
    fn language(&self) -> Language;

    /// Build a self-contained executable unit: the user's functions and
    /// classes unmodified, plus an injected call to the detected entry
    /// point with the test case's input.
    fn prepare(&self, code: &str, case: &TestCase) -> PreparedUnit;

    /// Compile command, or `None` for interpreted languages.
    fn compile_command(&self, dir: &Path, unit: &PreparedUnit) -> Option<Command>;

    /// Run command for the prepared (and compiled, where applicable) unit.
    fn run_command(&self, dir: &Path, unit: &PreparedUnit) -> Command;
}

/// Look up the runtime for a language.
pub fn runtime_for(language: Language) -> &'static dyn LanguageRuntime {
    match language {
        Language::Python => &PythonRuntime,
        Language::Javascript => &JavascriptRuntime,
        Language::Java => &JavaRuntime,
        Language::Cpp => &CppRuntime,
    }
}

/// Entry-point name used when detection finds nothing.
pub(crate) const DEFAULT_ENTRY_POINT: &str = "solve";

/// Render a test-case input as a source literal for JSON-compatible
/// languages (JavaScript, Java, C++): valid JSON is inlined as-is,
/// anything else becomes a quoted string literal.
pub(crate) fn json_style_literal(input: &str) -> String {
    let trimmed = input.trim();
    if serde_json::from_str::<serde_json::Value>(trimmed).is_ok() {
        trimmed.to_string()
    } else {
        // serde_json string encoding doubles as a source escape.
        serde_json::to_string(trimmed).unwrap_or_else(|_| format!("{trimmed:?}"))
    }
}
