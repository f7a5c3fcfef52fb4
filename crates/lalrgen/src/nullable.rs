//! Nonterminals that derive the empty string.

use crate::{
    grammar::{Grammar, NonterminalID},
    types::Queue,
};

/// `nullable[A]` is `true` iff `A =>* ε`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Nullable {
    inner: Vec<bool>,
}

impl Nullable {
    pub fn contains(&self, n: NonterminalID) -> bool {
        self.inner[n.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = NonterminalID> + '_ {
        self.inner
            .iter()
            .enumerate()
            .filter_map(|(i, &nullable)| nullable.then(|| NonterminalID::from_raw(i as u16)))
    }
}

#[tracing::instrument(skip_all)]
pub fn nullable(g: &Grammar) -> Nullable {
    let mut nullable = vec![false; g.nvars()];
    let mut queue = Queue::with_capacity(g.nvars());

    // Per rule, the number of right-hand side symbols not yet proven nullable.
    // Rules containing a terminal can never become nullable and are skipped.
    let mut rcount = vec![0usize; g.nrules() + 1];
    // For each nonterminal, the rules having it in the right-hand side (with multiplicity).
    let mut rsets = vec![vec![]; g.nvars()];

    for rule in g.rules.values() {
        if rule.right().is_empty() {
            if !nullable[rule.left().index()] {
                nullable[rule.left().index()] = true;
                queue.push(rule.left());
            }
            continue;
        }
        if rule.right().iter().any(|symbol| symbol.is_terminal()) {
            continue;
        }
        for symbol in rule.right() {
            if let Some(n) = symbol.as_nonterminal() {
                rcount[rule.id().index()] += 1;
                rsets[n.index()].push(rule.id());
            }
        }
    }

    while let Some(n) = queue.pop() {
        for &rule in &rsets[n.index()] {
            let count = &mut rcount[rule.index()];
            *count -= 1;
            if *count == 0 {
                let left = g.rule(rule).left();
                if !nullable[left.index()] {
                    nullable[left.index()] = true;
                    queue.push(left);
                }
            }
        }
    }

    tracing::trace!(
        "nullable: {}",
        crate::util::display_fn(|f| {
            for (i, _) in nullable.iter().enumerate().filter(|(_, v)| **v) {
                write!(f, "{} ", g.nonterminals[&NonterminalID::from_raw(i as u16)])?;
            }
            Ok(())
        })
    );

    Nullable { inner: nullable }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::{examples, SymbolID::*};

    #[test]
    fn chains_deeper_than_one() {
        // A : B C ; B : D ; C : /* empty */ ; D : /* empty */ | 'x' ; E : 'x' A | A 'x'
        #[allow(nonstandard_style)]
        let g = Grammar::define(|g| {
            let x = g.terminal("x", None)?;
            let A = g.nonterminal("A")?;
            let B = g.nonterminal("B")?;
            let C = g.nonterminal("C")?;
            let D = g.nonterminal("D")?;
            let E = g.nonterminal("E")?;
            g.rule(A, [N(B), N(C)], None)?;
            g.rule(B, [N(D)], None)?;
            g.rule(C, [], None)?;
            g.rule(D, [], None)?;
            g.rule(D, [T(x)], None)?;
            g.rule(E, [T(x), N(A)], None)?;
            g.rule(E, [N(A), T(x)], None)?;
            Ok(())
        })
        .unwrap();

        let nullable = nullable(&g);
        let names: Vec<_> = nullable
            .iter()
            .map(|n| g.nonterminals[&n].name().to_owned())
            .collect();
        assert_eq!(names, ["A", "B", "C", "D"]);
    }

    #[test]
    fn repeated_symbol_in_right_hand_side() {
        // S : A A ; A : /* empty */
        #[allow(nonstandard_style)]
        let g = Grammar::define(|g| {
            let S = g.nonterminal("S")?;
            let A = g.nonterminal("A")?;
            g.rule(S, [N(A), N(A)], None)?;
            g.rule(A, [], None)?;
            Ok(())
        })
        .unwrap();
        let nullable = nullable(&g);
        assert!(nullable.contains(NonterminalID::from_raw(0)));
        assert!(nullable.contains(NonterminalID::from_raw(1)));
    }

    #[test]
    fn left_recursion_is_not_nullable() {
        let g = Grammar::define(examples::arithmetic).unwrap();
        assert_eq!(nullable(&g).iter().count(), 0);

        let g = Grammar::define(examples::with_nullable).unwrap();
        let names: Vec<_> = nullable(&g)
            .iter()
            .map(|n| g.nonterminals[&n].name().to_owned())
            .collect();
        assert_eq!(names, ["opt", "chain"]);
    }
}
