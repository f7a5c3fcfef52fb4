//! The rules derived by each nonterminal.

use crate::grammar::{Grammar, NonterminalID, RuleID};

#[derive(Debug, Clone)]
pub struct Derives {
    inner: Vec<Vec<RuleID>>,
}

impl Derives {
    /// The rules whose left-hand side is `n`, in ascending order.
    pub fn get(&self, n: NonterminalID) -> &[RuleID] {
        &self.inner[n.index()]
    }
}

#[tracing::instrument(skip_all)]
pub fn derives(g: &Grammar) -> Derives {
    let mut inner = vec![vec![]; g.nvars()];
    // `g.rules` iterates in ascending rule number.
    for rule in g.rules.values() {
        inner[rule.left().index()].push(rule.id());
    }
    Derives { inner }
}
