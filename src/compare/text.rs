//! Approximate string similarity for free-text references

/// Token-sort similarity between two reference strings, as an integer in
/// `[0, 100]`
///
/// Both sides are lowercased, stripped of punctuation, and re-assembled from
/// their sorted tokens before comparison, so `"ACME corp payout"` and
/// `"Payout - Acme Corp"` compare equal. Non-equal strings score by
/// Levenshtein distance relative to the longer normalized form.
pub fn token_sort_ratio(left: &str, right: &str) -> u32 {
    let left = normalize(left);
    let right = normalize(right);

    if left == right {
        return 100;
    }
    if left.is_empty() || right.is_empty() {
        return 0;
    }

    let distance = strsim::levenshtein(&left, &right);
    let longest = left.chars().count().max(right.chars().count());
    ((1.0 - distance as f64 / longest as f64) * 100.0).round() as u32
}

/// Lowercase, replace non-alphanumerics with spaces, then sort and rejoin the
/// tokens
fn normalize(value: &str) -> String {
    let cleaned: String = value
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { ' ' })
        .collect();

    let mut tokens: Vec<&str> = cleaned.split_whitespace().collect();
    tokens.sort_unstable();
    tokens.join(" ")
}
