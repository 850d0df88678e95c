use sha2::{Digest, Sha256};

const TOKEN_DELIMITER: &str = "|";

/// Order-independent digest of a class-token set.
///
/// Tokens are de-duplicated and sorted before hashing, so any two collections
/// with the same membership hash identically.
pub fn class_set_hash<I, S>(tokens: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut sorted: Vec<String> = tokens
        .into_iter()
        .map(|token| token.as_ref().trim().to_string())
        .filter(|token| !token.is_empty())
        .collect();
    sorted.sort();
    sorted.dedup();
    let mut hasher = Sha256::new();
    hasher.update(sorted.join(TOKEN_DELIMITER).as_bytes());
    hex::encode(hasher.finalize())
}
