//! Output normalization and comparison.
//!
//! Model-generated programs are sloppy about whitespace, so the verdict
//! must not hinge on trailing newlines or padded columns. Comparison is
//! three-tiered: exact match, JSON value equality, then
//! whitespace-normalized string equality.

/// Trim and collapse all whitespace runs to single spaces.
pub fn normalize(raw: &str) -> String {
    raw.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Whether an actual output satisfies the expected output.
pub fn outputs_match(actual: &str, expected: &str) -> bool {
    if actual == expected {
        return true;
    }

    // JSON-aware equality: "[1, 2, 3]" matches "[1,2,3]".
    if let (Ok(a), Ok(e)) = (
        serde_json::from_str::<serde_json::Value>(actual.trim()),
        serde_json::from_str::<serde_json::Value>(expected.trim()),
    ) {
        if a == e {
            return true;
        }
    }

    normalize(actual) == normalize(expected)
}
