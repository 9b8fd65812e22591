//! A hasher which proxies for the integer it's given. Keys that are already
//! well-distributed integers (or pre-computed hash codes) land in the slot
//! their low bits name, which also makes the array tree of a
//! [`NestedHashMap`](crate::NestedHashMap) easy to predict.

use std::hash::{BuildHasher, Hasher};

/// Proxies a single integer write for itself. Further writes are folded in
/// polynomially, so composite keys still hash deterministically.
#[derive(Debug, Default, Clone, Copy)]
pub struct IdentityHasher(u64);

impl IdentityHasher {
    fn fold(&mut self, value: u64) {
        self.0 = self.0.wrapping_mul(31).wrapping_add(value);
    }
}

impl Hasher for IdentityHasher {
    fn write(&mut self, bytes: &[u8]) {
        for chunk in bytes.chunks(8) {
            let mut word = 0u64;
            for byte in chunk.iter().rev() {
                word = (word << 8) | u64::from(*byte);
            }
            self.fold(word);
        }
    }

    fn write_u8(&mut self, i: u8) {
        self.fold(u64::from(i))
    }

    fn write_u16(&mut self, i: u16) {
        self.fold(u64::from(i))
    }

    fn write_u32(&mut self, i: u32) {
        self.fold(u64::from(i))
    }

    fn write_u64(&mut self, i: u64) {
        self.fold(i)
    }

    fn write_usize(&mut self, i: usize) {
        self.fold(i as u64)
    }

    fn write_i32(&mut self, i: i32) {
        self.fold(i as u32 as u64)
    }

    fn write_i64(&mut self, i: i64) {
        self.fold(i as u64)
    }

    fn finish(&self) -> u64 {
        self.0
    }
}

/// Builds new [`IdentityHasher`]s on demand.
#[derive(Debug, Default, Clone, Copy)]
pub struct BuildIdentityHasher;

impl BuildHasher for BuildIdentityHasher {
    type Hasher = IdentityHasher;

    fn build_hasher(&self) -> Self::Hasher {
        IdentityHasher::default()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::hash::Hash;

    fn hash_of<T: Hash>(value: T) -> u64 {
        let mut h = BuildIdentityHasher.build_hasher();
        value.hash(&mut h);
        h.finish()
    }

    #[test]
    fn integers_hash_to_themselves() {
        assert_eq!(hash_of(0xc8c8_c8c8u64), 0xc8c8_c8c8);
        assert_eq!(hash_of(0xc8c8_c8c8_c8c8_c8c8u64), 0xc8c8_c8c8_c8c8_c8c8);
        assert_eq!(hash_of(16u32), 16);
        assert_eq!(hash_of(32usize), 32);
        assert_eq!(hash_of(-1i32), 0xffff_ffff);
    }

    #[test]
    fn raw_bytes_are_little_endian() {
        let mut h = IdentityHasher::default();
        h.write(&0x0102_0304_0506_0708u64.to_le_bytes());
        assert_eq!(h.finish(), 0x0102_0304_0506_0708);
    }

    #[test]
    fn composite_keys_are_deterministic() {
        assert_eq!(hash_of((1u64, 2u64)), hash_of((1u64, 2u64)));
        assert_ne!(hash_of((1u64, 2u64)), hash_of((2u64, 1u64)));
    }
}
