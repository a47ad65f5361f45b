//! Token-set similarity over free-text descriptions

use std::collections::HashSet;

/// Lowercased alphanumeric tokens of `text`
///
/// Anything that is not a letter or digit separates tokens, except a `.`
/// between two digits, so `99.9` stays one token.
pub fn tokenize(text: &str) -> HashSet<String> {
    let mut tokens = HashSet::new();
    let mut current = String::new();
    let mut chars = text.chars().peekable();
    let mut prev: Option<char> = None;

    while let Some(c) = chars.next() {
        let decimal_point = c == '.'
            && prev.is_some_and(|p| p.is_ascii_digit())
            && chars.peek().is_some_and(|n| n.is_ascii_digit());

        if c.is_alphanumeric() || decimal_point {
            current.extend(c.to_lowercase());
        } else if !current.is_empty() {
            tokens.insert(std::mem::take(&mut current));
        }
        prev = Some(c);
    }
    if !current.is_empty() {
        tokens.insert(current);
    }

    tokens
}

/// Jaccard similarity (intersection over union) of two token sets
///
/// Two empty sets are not considered similar.
pub fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    let union = a.union(b).count();
    if union == 0 {
        return 0.0;
    }
    a.intersection(b).count() as f64 / union as f64
}

/// Share of `query` tokens that also appear in `target`
pub fn overlap_coefficient(query: &HashSet<String>, target: &HashSet<String>) -> f64 {
    if query.is_empty() {
        return 0.0;
    }
    query.intersection(target).count() as f64 / query.len() as f64
}
