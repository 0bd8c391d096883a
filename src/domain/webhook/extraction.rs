//! Ordered JSON path probing.
//!
//! Providers put the same logical field under different keys and nesting
//! levels. Each field is described by a list of candidate paths; the first
//! path yielding a non-empty value wins.

use serde_json::Value;

/// Key sequence into a JSON object, e.g. `["transaction", "id"]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonPath(pub &'static [&'static str]);

impl JsonPath {
    /// Scalar at this path as a trimmed string. Strings and integers count;
    /// empty strings, objects, arrays, booleans and null do not.
    pub fn extract(&self, root: &Value) -> Option<String> {
        let mut current = root;
        for key in self.0 {
            current = current.as_object()?.get(*key)?;
        }
        match current {
            Value::String(s) => {
                let trimmed = s.trim();
                (!trimmed.is_empty()).then(|| trimmed.to_string())
            }
            Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
            _ => None,
        }
    }
}

/// First non-empty value across `paths`, in order.
pub fn first_non_empty(root: &Value, paths: &[JsonPath]) -> Option<String> {
    paths.iter().find_map(|path| path.extract(root))
}

/// Every distinct non-empty value across `paths`, in path order.
pub fn collect_candidates(root: &Value, paths: &[JsonPath]) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for value in paths.iter().filter_map(|path| path.extract(root)) {
        if !out.contains(&value) {
            out.push(value);
        }
    }
    out
}
