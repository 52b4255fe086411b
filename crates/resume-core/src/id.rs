//! Item identifiers
//!
//! The remote service validates item IDs as CUID2-like strings: lowercase
//! base-36, starting with a letter. IDs generated here are not real CUID2
//! values, they only need to pass that check and be unique enough within
//! one resume.

use chrono::Utc;
use rand::Rng;

/// Length of generated IDs.
pub const ID_LENGTH: usize = 25;

const ALPHABET: &[u8] = b"0123456789abcdefghijklmnopqrstuvwxyz";

/// Generate a new pseudo-CUID.
///
/// Layout: `c` + millisecond timestamp in base 36 + random base-36 padding.
///
/// # Examples
///
/// ```
/// use resume_core::id::{generate_id, looks_like_cuid, ID_LENGTH};
///
/// let id = generate_id();
/// assert_eq!(id.len(), ID_LENGTH);
/// assert!(looks_like_cuid(&id));
/// ```
pub fn generate_id() -> String {
    let millis = Utc::now().timestamp_millis().max(0) as u64;

    let mut id = String::with_capacity(ID_LENGTH);
    id.push('c');
    id.push_str(&to_base36(millis));

    let mut rng = rand::thread_rng();
    while id.len() < ID_LENGTH {
        let idx = rng.gen_range(0..ALPHABET.len());
        id.push(ALPHABET[idx] as char);
    }
    id.truncate(ID_LENGTH);
    id
}

/// Check that a string has the shape the remote schema accepts.
pub fn looks_like_cuid(id: &str) -> bool {
    let mut chars = id.chars();
    match chars.next() {
        Some(first) if first.is_ascii_lowercase() => {}
        _ => return false,
    }
    id.len() >= 2 && chars.all(|c| c.is_ascii_digit() || c.is_ascii_lowercase())
}

fn to_base36(mut value: u64) -> String {
    if value == 0 {
        return "0".to_string();
    }
    let mut digits = Vec::new();
    while value > 0 {
        digits.push(ALPHABET[(value % 36) as usize]);
        value /= 36;
    }
    digits.reverse();
    String::from_utf8(digits).unwrap_or_default()
}
