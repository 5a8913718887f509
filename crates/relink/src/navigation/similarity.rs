//! Character-run string similarity used to compare handles and paths.
//!
//! The score is `2 * common / (len(a) + len(b))`, where `common` is found by
//! taking the longest common substring and recursing into the pieces on
//! either side of it. The matcher's cutoffs (0.6, 0.7, ...) are tuned to this
//! exact metric, including its tie-breaking, so keep it byte-for-byte.

/// Similarity of two strings in `[0.0, 1.0]`, ASCII case-insensitive.
///
/// The underlying run search is order dependent; both argument orders are
/// evaluated and the larger count is kept so the result is symmetric.
pub fn similarity(a: &str, b: &str) -> f64 {
    let a = a.to_ascii_lowercase();
    let b = b.to_ascii_lowercase();
    if a == b {
        return 1.0;
    }

    let (a, b) = (a.as_bytes(), b.as_bytes());
    let total = a.len() + b.len();
    if total == 0 {
        return 0.0;
    }

    let common = common_chars(a, b).max(common_chars(b, a));
    (common * 2) as f64 / total as f64
}

/// Longest common run between `a` and `b`.
///
/// Returns `(pos_a, pos_b, len, improvements)`; the first run found wins ties
/// and `improvements` counts how often the best run was replaced.
fn longest_run(a: &[u8], b: &[u8]) -> (usize, usize, usize, usize) {
    let (mut pos_a, mut pos_b, mut max, mut improvements) = (0, 0, 0, 0);
    for i in 0..a.len() {
        for j in 0..b.len() {
            let len = a[i..]
                .iter()
                .zip(&b[j..])
                .take_while(|(x, y)| x == y)
                .count();
            if len > max {
                max = len;
                improvements += 1;
                pos_a = i;
                pos_b = j;
            }
        }
    }
    (pos_a, pos_b, max, improvements)
}

fn common_chars(a: &[u8], b: &[u8]) -> usize {
    let (pos_a, pos_b, max, improvements) = longest_run(a, b);
    if max == 0 {
        return 0;
    }

    let mut sum = max;
    // The left side is only revisited when the best run was not the first
    // candidate found.
    if pos_a > 0 && pos_b > 0 && improvements > 1 {
        sum += common_chars(&a[..pos_a], &b[..pos_b]);
    }
    if pos_a + max < a.len() && pos_b + max < b.len() {
        sum += common_chars(&a[pos_a + max..], &b[pos_b + max..]);
    }
    sum
}
