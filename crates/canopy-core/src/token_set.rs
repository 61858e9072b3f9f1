//! Growable bitset over symbol ids.
//!
//! Used for FIRST sets and LR lookaheads in the compiler, and for lex mode
//! membership at runtime. Equality and hashing ignore trailing zero words, so
//! two sets with the same members compare equal regardless of capacity.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::SymbolId;

#[derive(Clone, Default, Serialize, Deserialize)]
pub struct TokenSet {
    words: Vec<u64>,
}

impl TokenSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty set with room for ids below `capacity`.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            words: vec![0; capacity.div_ceil(64)],
        }
    }

    /// Insert an id, returning `true` if it was not present.
    pub fn insert(&mut self, id: SymbolId) -> bool {
        let (word, bit) = Self::locate(id);
        if word >= self.words.len() {
            self.words.resize(word + 1, 0);
        }
        let mask = 1u64 << bit;
        let fresh = self.words[word] & mask == 0;
        self.words[word] |= mask;
        fresh
    }

    pub fn remove(&mut self, id: SymbolId) -> bool {
        let (word, bit) = Self::locate(id);
        let Some(slot) = self.words.get_mut(word) else {
            return false;
        };
        let mask = 1u64 << bit;
        let present = *slot & mask != 0;
        *slot &= !mask;
        present
    }

    #[inline]
    pub fn contains(&self, id: SymbolId) -> bool {
        let (word, bit) = Self::locate(id);
        self.words
            .get(word)
            .is_some_and(|w| w & (1u64 << bit) != 0)
    }

    /// Add every member of `other`, returning `true` if the set grew.
    pub fn union_with(&mut self, other: &TokenSet) -> bool {
        if other.words.len() > self.words.len() {
            self.words.resize(other.words.len(), 0);
        }
        let mut changed = false;
        for (dst, src) in self.words.iter_mut().zip(&other.words) {
            let merged = *dst | src;
            changed |= merged != *dst;
            *dst = merged;
        }
        changed
    }

    pub fn is_disjoint(&self, other: &TokenSet) -> bool {
        self.words
            .iter()
            .zip(&other.words)
            .all(|(a, b)| a & b == 0)
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|w| *w == 0)
    }

    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Members in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = SymbolId> + '_ {
        self.words.iter().enumerate().flat_map(|(i, &word)| {
            let mut rest = word;
            std::iter::from_fn(move || {
                if rest == 0 {
                    return None;
                }
                let bit = rest.trailing_zeros();
                rest &= rest - 1;
                Some((i * 64 + bit as usize) as SymbolId)
            })
        })
    }

    #[inline]
    fn locate(id: SymbolId) -> (usize, u32) {
        (id as usize / 64, id as u32 % 64)
    }

    fn trimmed(&self) -> &[u64] {
        let len = self
            .words
            .iter()
            .rposition(|w| *w != 0)
            .map_or(0, |last| last + 1);
        &self.words[..len]
    }
}

impl PartialEq for TokenSet {
    fn eq(&self, other: &Self) -> bool {
        self.trimmed() == other.trimmed()
    }
}

impl Eq for TokenSet {}

impl Hash for TokenSet {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.trimmed().hash(state);
    }
}

impl std::fmt::Debug for TokenSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<SymbolId> for TokenSet {
    fn from_iter<I: IntoIterator<Item = SymbolId>>(iter: I) -> Self {
        let mut set = TokenSet::new();
        for id in iter {
            set.insert(id);
        }
        set
    }
}

impl Extend<SymbolId> for TokenSet {
    fn extend<I: IntoIterator<Item = SymbolId>>(&mut self, iter: I) {
        for id in iter {
            self.insert(id);
        }
    }
}
