//! Fixed-width component bitsets.
//!
//! Bit `i` of a signature corresponds to the component type registered with
//! [`ComponentId`] `i`. Width is chosen by the manager's component capacity, so
//! signatures from the same manager always have the same number of words.

use std::fmt;

use crate::component::ComponentId;

const WORD_BITS: usize = u64::BITS as usize;

/// Number of `u64` words needed to hold `bits` bits.
pub(crate) fn words_for(bits: usize) -> usize {
    bits.div_ceil(WORD_BITS)
}

/// `true` if every bit set in `required` is also set in `words`.
pub(crate) fn contains_all(words: &[u64], required: &[u64]) -> bool {
    words
        .iter()
        .zip(required)
        .all(|(have, need)| have & need == *need)
}

/// Positions of the set bits in `words`, lowest first.
pub(crate) fn set_bits(words: &[u64]) -> impl Iterator<Item = usize> + '_ {
    words.iter().enumerate().flat_map(|(w, &word)| {
        let mut remaining = word;
        std::iter::from_fn(move || {
            if remaining == 0 {
                return None;
            }
            let bit = remaining.trailing_zeros() as usize;
            remaining &= remaining - 1;
            Some(w * WORD_BITS + bit)
        })
    })
}

/// An owned component bitset.
#[derive(Clone, PartialEq, Eq, Hash, Default)]
pub struct Signature {
    words: Vec<u64>,
}

impl Signature {
    /// An empty signature wide enough for `bits` component types.
    pub fn with_width(bits: usize) -> Self {
        Self {
            words: vec![0; words_for(bits)],
        }
    }

    pub(crate) fn from_words(words: &[u64]) -> Self {
        Self {
            words: words.to_vec(),
        }
    }

    /// A signature of width `bits` with exactly the given component ids set.
    pub fn from_ids(bits: usize, ids: impl IntoIterator<Item = ComponentId>) -> Self {
        let mut signature = Self::with_width(bits);
        for id in ids {
            signature.set(id);
        }
        signature
    }

    /// Set bit `id`. Ids beyond the signature width are ignored.
    pub fn set(&mut self, id: ComponentId) {
        let (word, mask) = locate(id);
        if let Some(w) = self.words.get_mut(word) {
            *w |= mask;
        }
    }

    pub fn clear(&mut self, id: ComponentId) {
        let (word, mask) = locate(id);
        if let Some(w) = self.words.get_mut(word) {
            *w &= !mask;
        }
    }

    /// Whether bit `id` is set. Ids beyond the signature width are never set.
    pub fn contains(&self, id: ComponentId) -> bool {
        let (word, mask) = locate(id);
        self.words.get(word).is_some_and(|w| w & mask != 0)
    }

    /// Whether every component in `required` is also in `self`.
    pub fn contains_all(&self, required: &Signature) -> bool {
        contains_all(&self.words, &required.words)
    }

    pub fn is_empty(&self) -> bool {
        self.words.iter().all(|&w| w == 0)
    }

    /// Number of set bits.
    pub fn len(&self) -> usize {
        self.words.iter().map(|w| w.count_ones() as usize).sum()
    }

    /// Component ids in this signature, lowest first.
    pub fn iter(&self) -> impl Iterator<Item = ComponentId> + '_ {
        set_bits(&self.words).map(ComponentId::from_index)
    }

    pub(crate) fn words(&self) -> &[u64] {
        &self.words
    }
}

pub(crate) fn locate(id: ComponentId) -> (usize, u64) {
    let index = id.index();
    (index / WORD_BITS, 1u64 << (index % WORD_BITS))
}

impl fmt::Debug for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter().map(|id| id.index())).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(index: usize) -> ComponentId {
        ComponentId::from_index(index)
    }

    #[test]
    fn width_rounds_up_to_words() {
        assert_eq!(words_for(0), 0);
        assert_eq!(words_for(1), 1);
        assert_eq!(words_for(64), 1);
        assert_eq!(words_for(65), 2);
        assert_eq!(words_for(512), 8);
    }

    #[test]
    fn set_clear_contains() {
        let mut sig = Signature::with_width(130);
        sig.set(id(0));
        sig.set(id(129));
        assert!(sig.contains(id(0)));
        assert!(sig.contains(id(129)));
        assert!(!sig.contains(id(64)));
        assert_eq!(sig.len(), 2);

        sig.clear(id(0));
        assert!(!sig.contains(id(0)));
        assert_eq!(sig.iter().collect::<Vec<_>>(), vec![id(129)]);
    }

    #[test]
    fn superset_matching_ignores_extra_bits() {
        let required = Signature::from_ids(128, [id(3), id(70)]);
        let exact = Signature::from_ids(128, [id(3), id(70)]);
        let extra = Signature::from_ids(128, [id(1), id(3), id(70), id(100)]);
        let partial = Signature::from_ids(128, [id(3)]);

        assert!(exact.contains_all(&required));
        assert!(extra.contains_all(&required));
        assert!(!partial.contains_all(&required));
        assert!(partial.contains_all(&Signature::with_width(128)));
    }

    #[test]
    fn set_bits_walks_every_word() {
        let words = [0b1010u64, 0, 1 << 63];
        let bits: Vec<_> = set_bits(&words).collect();
        assert_eq!(bits, vec![1, 3, 191]);
    }

    #[test]
    fn out_of_range_bit_is_absent() {
        let sig = Signature::with_width(8);
        assert!(!sig.contains(id(500)));
    }

    #[test]
    fn out_of_range_set_and_clear_are_ignored() {
        let mut sig = Signature::with_width(8);
        sig.set(id(500));
        assert!(sig.is_empty());
        sig.set(id(2));
        sig.clear(id(700));
        assert_eq!(sig.iter().collect::<Vec<_>>(), vec![id(2)]);
    }
}
