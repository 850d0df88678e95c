/// Near-duplicate cut-off used when no threshold is configured.
pub const DEFAULT_SIMILARITY_THRESHOLD: f64 = 0.9;

/// Length of the longest common subsequence of two token lists.
pub fn lcs_length<T: PartialEq>(a: &[T], b: &[T]) -> usize {
    if a.is_empty() || b.is_empty() {
        return 0;
    }
    let mut prev = vec![0usize; b.len() + 1];
    let mut curr = vec![0usize; b.len() + 1];
    for item_a in a {
        for (j, item_b) in b.iter().enumerate() {
            curr[j + 1] = if item_a == item_b {
                prev[j] + 1
            } else {
                prev[j + 1].max(curr[j])
            };
        }
        std::mem::swap(&mut prev, &mut curr);
    }
    prev[b.len()]
}

/// `lcs / max(len_a, len_b)`, in `[0, 1]`; zero when either side is empty.
pub fn similarity<T: PartialEq>(a: &[T], b: &[T]) -> f64 {
    let longest = a.len().max(b.len());
    if a.is_empty() || b.is_empty() {
        return 0.0;
    }
    lcs_length(a, b) as f64 / longest as f64
}

/// Highest similarity of `candidate` against any of `existing`, with its index.
pub fn closest_match<'a, T, I>(candidate: &[T], existing: I) -> Option<(usize, f64)>
where
    T: PartialEq + 'a,
    I: IntoIterator<Item = &'a [T]>,
{
    existing
        .into_iter()
        .enumerate()
        .map(|(idx, other)| (idx, similarity(candidate, other)))
        .fold(None, |best, (idx, ratio)| match best {
            Some((_, best_ratio)) if best_ratio >= ratio => best,
            _ => Some((idx, ratio)),
        })
}

pub fn is_near_duplicate(ratio: f64, threshold: f64) -> bool {
    ratio >= threshold
}
