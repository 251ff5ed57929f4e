//! The upstream's custom 31-bit string hash.

/// Initial accumulator before the seed is mixed in.
const HASH_INIT: i64 = 1_315_423_911;

/// Hashes `s` walking its characters in reverse, with `seed` mixed into the
/// initial state. All arithmetic wraps at 32 bits (shifts are arithmetic).
///
/// The result is masked to 31 bits, so it is always in `0..=i32::MAX`.
pub fn js_hash(s: &str, seed: i32) -> u32 {
    let mut h = (HASH_INIT ^ ((seed as i64) << 16)) as i32;
    for ch in s.chars().rev() {
        let code = ch as u32 as i32;
        let left = h.wrapping_shl(5);
        let right = h >> 2;
        h ^= left.wrapping_add(code).wrapping_add(right);
    }
    (h & 0x7FFF_FFFF) as u32
}

/// `js_hash` formatted as 8 zero-padded lowercase hex digits.
pub fn js_hash_hex(s: &str, seed: i32) -> String {
    format!("{:08x}", js_hash(s, seed))
}
