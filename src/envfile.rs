//! Line-oriented rewriting of remote `KEY=value` environment files.

/// Outcome of a single-variable rewrite.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Rewrite {
    /// The value changed; carries the full new file content.
    Changed(String),
    /// The variable already holds the target value.
    Unchanged,
    /// No line starts with `key=`; the input is left as-is.
    KeyMissing,
}

/// Replace the value of `key` in `KEY=value` file content.
///
/// The key must match exactly at line start. Every other line, the
/// line order, and the trailing-newline state are preserved byte for
/// byte - the substitution touches nothing but the matched value.
#[must_use]
pub fn rewrite(content: &str, key: &str, value: &str) -> Rewrite {
    let mut found = false;
    let mut changed = false;

    let lines: Vec<String> = content
        .lines()
        .map(|line| match line.strip_prefix(key) {
            Some(rest) if rest.starts_with('=') => {
                found = true;
                let replacement = format!("{key}={value}");
                if replacement != line {
                    changed = true;
                }
                replacement
            }
            _ => line.to_string(),
        })
        .collect();

    if !found {
        return Rewrite::KeyMissing;
    }
    if !changed {
        return Rewrite::Unchanged;
    }

    let mut out = lines.join("\n");
    if content.ends_with('\n') {
        out.push('\n');
    }
    Rewrite::Changed(out)
}
