//! Closure of LR(0) item sets.
//!
//! The closure of a kernel adds the first item of every rule that can start
//! the derivation of a nonterminal appearing right after a dot. The rules are
//! found through the precomputed `FDERIVES` relation:
//!
//! ```text
//! FIRSTS[A]   = { B | A =>* B ... }  (reflexive)
//! FDERIVES[A] = { r | B -> ω is r, B \in FIRSTS[A] }
//! ```

use crate::{
    derives::Derives,
    grammar::{Grammar, ItemID, NonterminalID, RItem, SymbolID},
    sets::{BitMatrix, RuleSet},
};

/// Compute the reflexive transitive closure of the relation
/// `A -> B ...` between nonterminals.
pub fn firsts(g: &Grammar, derives: &Derives) -> BitMatrix {
    let mut firsts = BitMatrix::new(g.nvars());
    for &a in g.nonterminals.keys() {
        for &rule in derives.get(a) {
            if let Some(SymbolID::N(b)) = g.rule(rule).right().first() {
                firsts.set(a.index(), b.index());
            }
        }
    }
    firsts.reflexive_transitive_closure();
    firsts
}

pub fn fderives(g: &Grammar, derives: &Derives) -> Vec<RuleSet> {
    let firsts = firsts(g, derives);
    (0..g.nvars())
        .map(|a| {
            let mut rules = RuleSet::with_capacity(g.nrules());
            for b in firsts.row(a) {
                for &rule in derives.get(NonterminalID::from_raw(b as u16)) {
                    rules.insert(rule);
                }
            }
            rules
        })
        .collect()
}

/// The closure engine, holding `FDERIVES` and the scratch buffers reused
/// across calls.
#[derive(Debug)]
pub struct Closure<'g> {
    grammar: &'g Grammar,
    fderives: Vec<RuleSet>,
    ruleset: RuleSet,
    itemset: Vec<ItemID>,
}

impl<'g> Closure<'g> {
    pub fn new(g: &'g Grammar, derives: &Derives) -> Self {
        Self {
            grammar: g,
            fderives: fderives(g, derives),
            ruleset: RuleSet::with_capacity(g.nrules()),
            itemset: vec![],
        }
    }

    /// Compute the closure of `core`, which must be sorted in ascending order.
    ///
    /// The returned items are sorted as well. An empty `core` stands for the
    /// initial state, whose closure starts from the start symbol.
    pub fn closure(&mut self, core: &[ItemID]) -> &[ItemID] {
        debug_assert!(core.windows(2).all(|w| w[0] < w[1]));
        let g = self.grammar;

        self.ruleset.clear();
        if core.is_empty() {
            self.ruleset
                .union_with(&self.fderives[g.start_symbol.index()]);
        } else {
            for &item in core {
                if let RItem::Symbol(SymbolID::N(n)) = g.item(item) {
                    self.ruleset.union_with(&self.fderives[n.index()]);
                }
            }
        }

        // Merge the kernel with the first items of the activated rules.
        self.itemset.clear();
        let mut core = core.iter().copied().peekable();
        for rule in self.ruleset.iter() {
            let start = g.rule(rule).rhs();
            while let Some(item) = core.next_if(|item| *item < start) {
                self.itemset.push(item);
            }
            core.next_if_eq(&start);
            self.itemset.push(start);
        }
        self.itemset.extend(core);

        &self.itemset
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{derives::derives, grammar::examples};

    fn raw(items: &[ItemID]) -> Vec<usize> {
        items.iter().map(|i| i.index()).collect()
    }

    #[test]
    fn firsts_of_arithmetic() {
        let g = Grammar::define(examples::arithmetic).unwrap();
        let firsts = firsts(&g, &derives(&g));
        // E =>* T =>* F
        assert_eq!(firsts.row(0).collect::<Vec<_>>(), [0, 1, 2]);
        assert_eq!(firsts.row(1).collect::<Vec<_>>(), [1, 2]);
        assert_eq!(firsts.row(2).collect::<Vec<_>>(), [2]);
    }

    #[test]
    fn initial_closure() {
        let g = Grammar::define(examples::arithmetic).unwrap();
        let derives = derives(&g);
        let mut closure = Closure::new(&g, &derives);
        // every rule starts at its first item: 0, 4, 6, 10, 12, 16
        assert_eq!(raw(closure.closure(&[])), [0, 4, 6, 10, 12, 16]);
    }

    #[test]
    fn kernel_is_merged_in_order() {
        let g = Grammar::define(examples::arithmetic).unwrap();
        let derives = derives(&g);
        let mut closure = Closure::new(&g, &derives);
        // F : '(' . E ')'
        let core = [ItemID::from_raw(13)];
        assert_eq!(raw(closure.closure(&core)), [0, 4, 6, 10, 12, 13, 16]);
        // E : E '+' . T
        let core = [ItemID::from_raw(2)];
        assert_eq!(raw(closure.closure(&core)), [2, 6, 10, 12, 16]);
        // T : T '*' . F   (nothing but F rules)
        let core = [ItemID::from_raw(8)];
        assert_eq!(raw(closure.closure(&core)), [8, 12, 16]);
        // E : E . '+' T ; T : T . '*' F  (no nonterminal after the dot)
        let core = [ItemID::from_raw(1), ItemID::from_raw(7)];
        assert_eq!(raw(closure.closure(&core)), [1, 7]);
    }

    #[test]
    fn closure_is_idempotent() {
        for (name, example) in examples::ALL {
            let g = Grammar::define(example).unwrap();
            let derives = derives(&g);
            let mut closure = Closure::new(&g, &derives);
            for index in 0..g.items.len() {
                let core = [ItemID::from_raw(index as u32)];
                let once = closure.closure(&core).to_vec();
                let twice = closure.closure(&once).to_vec();
                assert_eq!(once, twice, "grammar `{}', item {}", name, index);
            }
        }
    }
}
