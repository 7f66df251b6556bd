/// A set of board cells backed by a growable bitvector.
///
/// Iteration yields cells in ascending order, so the smallest and largest
/// members double as the numeric domain of position variables.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct CellSet {
    words: Vec<u64>,
    len: usize,
}

impl CellSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(cells: usize) -> Self {
        Self {
            words: vec![0; cells.div_ceil(64)],
            len: 0,
        }
    }

    pub fn contains(&self, cell: usize) -> bool {
        self.words
            .get(cell / 64)
            .is_some_and(|word| word & (1u64 << (cell % 64)) != 0)
    }

    /// Adds a cell, returning `true` if it was not already present.
    pub fn add(&mut self, cell: usize) -> bool {
        let word_idx = cell / 64;
        if word_idx >= self.words.len() {
            self.words.resize(word_idx + 1, 0);
        }
        let mask = 1u64 << (cell % 64);
        if self.words[word_idx] & mask != 0 {
            return false;
        }
        self.words[word_idx] |= mask;
        self.len += 1;
        true
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn first(&self) -> Option<usize> {
        self.iter().next()
    }

    pub fn last(&self) -> Option<usize> {
        self.words
            .iter()
            .enumerate()
            .rev()
            .find(|(_, word)| **word != 0)
            .map(|(idx, word)| idx * 64 + 63 - word.leading_zeros() as usize)
    }

    pub fn iter(&self) -> CellSetIter<'_> {
        CellSetIter {
            words: &self.words,
            word_idx: 0,
            bits: self.words.first().copied().unwrap_or(0),
        }
    }
}

pub struct CellSetIter<'a> {
    words: &'a [u64],
    word_idx: usize,
    bits: u64,
}

impl Iterator for CellSetIter<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.bits != 0 {
                let bit = self.bits.trailing_zeros() as usize;
                self.bits &= self.bits - 1; // Clear the lowest set bit
                return Some(self.word_idx * 64 + bit);
            }

            self.word_idx += 1;
            if self.word_idx >= self.words.len() {
                return None;
            }
            self.bits = self.words[self.word_idx];
        }
    }
}

impl<'a> IntoIterator for &'a CellSet {
    type Item = usize;
    type IntoIter = CellSetIter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl FromIterator<usize> for CellSet {
    fn from_iter<I: IntoIterator<Item = usize>>(iter: I) -> Self {
        let mut set = CellSet::new();
        for cell in iter {
            set.add(cell);
        }
        set
    }
}
