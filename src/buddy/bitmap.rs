//! Per-order state table
//!
//! A word-packed boolean vector indexed by block number at one order.

use alloc::vec;
use alloc::vec::Vec;

const BITS_PER_WORD: usize = u64::BITS as usize;

/// Fixed-length bitmap backed by `u64` words
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuddyBitmap {
    words: Vec<u64>,
    len: usize,
}

impl BuddyBitmap {
    /// Create a bitmap of `len` bits, all set to `value`
    pub fn new(len: usize, value: bool) -> Self {
        let mut bitmap = Self {
            words: vec![0; len.div_ceil(BITS_PER_WORD)],
            len,
        };
        bitmap.fill(value);
        bitmap
    }

    /// Number of bits in the table
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    #[inline]
    fn locate(&self, index: usize) -> (usize, u64) {
        assert!(
            index < self.len,
            "bitmap index {} out of range (len {})",
            index,
            self.len
        );
        (index / BITS_PER_WORD, 1u64 << (index % BITS_PER_WORD))
    }

    pub fn get(&self, index: usize) -> bool {
        let (word, mask) = self.locate(index);
        self.words[word] & mask != 0
    }

    pub fn set(&mut self, index: usize) {
        let (word, mask) = self.locate(index);
        self.words[word] |= mask;
    }

    pub fn clear(&mut self, index: usize) {
        let (word, mask) = self.locate(index);
        self.words[word] &= !mask;
    }

    /// Set every bit to `value`
    pub fn fill(&mut self, value: bool) {
        let pattern = if value { u64::MAX } else { 0 };
        for word in &mut self.words {
            *word = pattern;
        }
        // Bits past `len` stay zero so `count_ones` is exact.
        let tail = self.len % BITS_PER_WORD;
        if value && tail != 0 {
            if let Some(last) = self.words.last_mut() {
                *last = (1u64 << tail) - 1;
            }
        }
    }

    /// Number of set bits
    pub fn count_ones(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Iterate over every bit in index order
    pub fn iter(&self) -> impl Iterator<Item = bool> + '_ {
        (0..self.len).map(move |i| self.get(i))
    }
}
