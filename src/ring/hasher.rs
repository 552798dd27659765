//! Hasher Module
//!
//! Deterministic 32-bit FNV-1a hash used for ring placement.
//! Fast with acceptable avalanche behavior; not cryptographic.

const FNV_OFFSET_BASIS: u32 = 2_166_136_261;
const FNV_PRIME: u32 = 16_777_619;

// == FNV-1a ==
/// Hashes a byte sequence with 32-bit FNV-1a.
///
/// Pure and deterministic: the same input always produces the same hash,
/// so ring placement is reproducible across runs.
pub fn fnv1a(bytes: &[u8]) -> u32 {
    let mut hash = FNV_OFFSET_BASIS;
    for &byte in bytes {
        hash ^= u32::from(byte);
        hash = hash.wrapping_mul(FNV_PRIME);
    }
    hash
}
