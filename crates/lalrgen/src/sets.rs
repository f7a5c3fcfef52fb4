//! Bit sets over terminal symbols and rules, and a dense boolean matrix.

use crate::{
    digraph,
    grammar::{RuleID, TerminalID},
};
use bit_set::BitSet;
use bit_vec::BitVec;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TerminalSet {
    inner: BitSet,
}

impl TerminalSet {
    pub fn with_capacity(ntokens: usize) -> Self {
        Self {
            inner: BitSet::with_capacity(ntokens),
        }
    }
    pub fn contains(&self, id: TerminalID) -> bool {
        self.inner.contains(id.index())
    }
    pub fn insert(&mut self, id: TerminalID) -> bool {
        self.inner.insert(id.index())
    }
    pub fn remove(&mut self, id: TerminalID) -> bool {
        self.inner.remove(id.index())
    }
    pub fn union_with(&mut self, other: &Self) {
        self.inner.union_with(&other.inner)
    }
    pub fn intersect_with(&mut self, other: &Self) {
        self.inner.intersect_with(&other.inner)
    }
    pub fn difference_with(&mut self, other: &Self) {
        self.inner.difference_with(&other.inner)
    }
    pub fn is_disjoint(&self, other: &Self) -> bool {
        self.inner.is_disjoint(&other.inner)
    }
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
    pub fn len(&self) -> usize {
        self.inner.len()
    }
    /// Iterate over the members in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = TerminalID> + '_ {
        self.inner.iter().map(|raw| TerminalID::from_raw(raw as u16))
    }
}

impl FromIterator<TerminalID> for TerminalSet {
    fn from_iter<I>(iter: I) -> Self
    where
        I: IntoIterator<Item = TerminalID>,
    {
        Self {
            inner: iter.into_iter().map(|t| t.index()).collect(),
        }
    }
}

impl digraph::Set for TerminalSet {
    fn union_with(&mut self, other: &Self) {
        self.union_with(other)
    }
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RuleSet {
    inner: BitSet,
}

impl RuleSet {
    pub fn with_capacity(nrules: usize) -> Self {
        Self {
            inner: BitSet::with_capacity(nrules + 1),
        }
    }
    pub fn insert(&mut self, id: RuleID) -> bool {
        self.inner.insert(id.index())
    }
    pub fn union_with(&mut self, other: &Self) {
        self.inner.union_with(&other.inner)
    }
    pub fn clear(&mut self) {
        self.inner.clear()
    }
    /// Iterate over the members in ascending order.
    pub fn iter(&self) -> impl Iterator<Item = RuleID> + '_ {
        self.inner.iter().map(|raw| RuleID::from_raw(raw as u16))
    }
}

/// A square boolean matrix, stored as one bit vector per row.
#[derive(Debug, Clone)]
pub struct BitMatrix {
    rows: Vec<BitVec>,
}

impl BitMatrix {
    pub fn new(n: usize) -> Self {
        Self {
            rows: vec![BitVec::from_elem(n, false); n],
        }
    }

    pub fn set(&mut self, row: usize, col: usize) {
        self.rows[row].set(col, true);
    }

    /// Iterate over the columns set in `row`.
    pub fn row(&self, row: usize) -> impl Iterator<Item = usize> + '_ {
        self.rows[row]
            .iter()
            .enumerate()
            .filter_map(|(col, bit)| bit.then_some(col))
    }

    /// Replace the relation with its transitive closure (Warshall).
    pub fn transitive_closure(&mut self) {
        for pivot in 0..self.rows.len() {
            let pivot_row = self.rows[pivot].clone();
            for row in &mut self.rows {
                if row[pivot] {
                    row.or(&pivot_row);
                }
            }
        }
    }

    /// Replace the relation with its reflexive transitive closure.
    pub fn reflexive_transitive_closure(&mut self) {
        self.transitive_closure();
        for i in 0..self.rows.len() {
            self.rows[i].set(i, true);
        }
    }
}
