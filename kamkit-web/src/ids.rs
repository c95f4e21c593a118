//! Random identifiers for records created through admin endpoints

use rand::Rng;
use uuid::Uuid;

/// URL-safe alphabet shared with the nanoid format
const ALPHABET: &[u8; 64] = b"_-0123456789abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVWXYZ";

/// Random version-4 UUID in hyphenated form
pub fn new_uuid() -> String {
    Uuid::new_v4().to_string()
}

/// 21-character URL-safe random id
pub fn nano_id() -> String {
    nano_id_of_len(21)
}

/// 8-character URL-safe random id, for short-lived or human-facing keys
pub fn nano_id_small() -> String {
    nano_id_of_len(8)
}

fn nano_id_of_len(len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| ALPHABET[rng.gen_range(0..ALPHABET.len())] as char)
        .collect()
}
