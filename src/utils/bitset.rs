// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

//! A bit vector over dense small-integer sets.
//!
//! The disassembler tracks per-method facts keyed by code-unit offset:
//! which offsets were already decoded, which ones start a basic block.
//! Offsets are dense and bounded by the method's code size, so a flat bit
//! vector beats a hash set on both footprint and iteration order (ascending,
//! which is the block order the builder wants).
//!
//! # Example
//!
//! ```rust,ignore
//! use dexscope::utils::BitSet;
//!
//! let mut leaders = BitSet::new(100);
//! assert!(leaders.insert(0));
//! assert!(leaders.insert(42));
//! assert!(!leaders.insert(42)); // Already present
//!
//! let offsets: Vec<_> = leaders.iter().collect();
//! assert_eq!(offsets, vec![0, 42]);
//! ```

/// A fixed-capacity bit vector used as a set of small integers.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct BitSet {
    /// The bits, stored as a vector of words.
    words: Vec<u64>,
    /// The number of bits in the set.
    len: usize,
}

impl BitSet {
    /// Creates a new empty bit set with the given capacity.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            words: vec![0; capacity.div_ceil(64)],
            len: capacity,
        }
    }

    /// Sets the bit at the given index.
    ///
    /// Returns `true` if the bit was not set before.
    ///
    /// # Panics
    ///
    /// Panics if `index` is at or beyond the capacity.
    pub fn insert(&mut self, index: usize) -> bool {
        assert!(index < self.len, "index out of bounds");
        let word = index / 64;
        let mask = 1u64 << (index % 64);
        let fresh = self.words[word] & mask == 0;
        self.words[word] |= mask;
        fresh
    }

    /// Returns `true` if the bit at the given index is set.
    ///
    /// # Panics
    ///
    /// Panics if `index` is at or beyond the capacity.
    #[must_use]
    pub fn contains(&self, index: usize) -> bool {
        assert!(index < self.len, "index out of bounds");
        (self.words[index / 64] & (1u64 << (index % 64))) != 0
    }

    /// Returns an iterator over the indices of set bits, in ascending order.
    pub fn iter(&self) -> BitSetIter<'_> {
        BitSetIter {
            set: self,
            word_idx: 0,
            bit_idx: 0,
        }
    }
}

impl std::fmt::Debug for BitSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{")?;
        let mut first = true;
        for i in self.iter() {
            if !first {
                write!(f, ", ")?;
            }
            write!(f, "{i}")?;
            first = false;
        }
        write!(f, "}}")
    }
}

/// Iterator over the set bits in a `BitSet`.
pub struct BitSetIter<'a> {
    set: &'a BitSet,
    word_idx: usize,
    bit_idx: usize,
}

impl Iterator for BitSetIter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        while self.word_idx < self.set.words.len() {
            let word = self.set.words[self.word_idx];
            while self.bit_idx < 64 {
                let idx = self.word_idx * 64 + self.bit_idx;
                if idx >= self.set.len {
                    return None;
                }
                self.bit_idx += 1;
                if (word & (1u64 << (self.bit_idx - 1))) != 0 {
                    return Some(idx);
                }
            }
            self.word_idx += 1;
            self.bit_idx = 0;
        }
        None
    }
}
