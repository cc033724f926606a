//! Partial reference scanning.

use std::sync::OnceLock;

use regex::Regex;

fn partial_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"\{\{>\s*([\w-]+)\s*\}\}").expect("static pattern"))
}

/// Names of the partials a template source references, unique, in order of
/// first appearance.
pub fn scan_partials(source: &str) -> Vec<String> {
    let mut names: Vec<String> = Vec::new();
    for captures in partial_pattern().captures_iter(source) {
        let name = &captures[1];
        if !names.iter().any(|n| n == name) {
            names.push(name.to_string());
        }
    }
    names
}
