use rand::Rng;

/// Uniform pick from a slice; `None` for an empty pool.
pub fn pick<'a, T, R>(pool: &'a [T], rng: &mut R) -> Option<&'a T>
where
    R: Rng + ?Sized,
{
    if pool.is_empty() {
        return None;
    }
    pool.get(rng.random_range(0..pool.len()))
}

/// Two-tier uniform pick: among items satisfying `preferred` if any do,
/// otherwise among the whole pool.
pub fn pick_preferring<'a, T, R, P>(pool: &'a [T], mut preferred: P, rng: &mut R) -> Option<&'a T>
where
    R: Rng + ?Sized,
    P: FnMut(&T) -> bool,
{
    let favoured: Vec<&T> = pool.iter().filter(|item| preferred(*item)).collect();
    if favoured.is_empty() {
        return pick(pool, rng);
    }
    pick(&favoured, rng).copied()
}

/// Draws candidates until one is not rejected, at most `max_attempts` times.
///
/// A draw that yields `None` counts as a spent attempt. Exhaustion is reported as
/// `None` so callers have to decide what running out means for them.
pub fn select_unique<T, D, P>(mut draw: D, mut reject: P, max_attempts: usize) -> Option<T>
where
    D: FnMut() -> Option<T>,
    P: FnMut(&T) -> bool,
{
    for _ in 0..max_attempts {
        let Some(candidate) = draw() else {
            continue;
        };
        if !reject(&candidate) {
            return Some(candidate);
        }
    }
    None
}
