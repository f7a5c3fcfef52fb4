//! LALR(1) look-ahead sets computation.
//!
//! The algorithm is based on DeRemer and Pennello's method\[1\]:
//!
//! ```text
//! Read(p,A)   = DR(p,A) \cup \bigcup { Read(r,C) | (p,A) reads (r,C) }
//! Follow(p,A) = Read(p,A) \cup \bigcup { Follow(p',B) | (p,A) includes (p',B) }
//! LA(q,A->ω)  = \bigcup { Follow(p,A) | (q,A->ω) lookback (p,A) }
//! ```
//!
//! Only the reductions of inconsistent states get a row in the look-ahead
//! table, since every other state performs its action without peeking.
//!
//! \[1\]: DeRemer and Pennello, Efficient Computation of LALR(1) Look-Ahead Sets
//!       <https://dl.acm.org/doi/10.1145/69622.357187>

use crate::{
    derives::Derives,
    digraph::digraph,
    grammar::{Grammar, NonterminalID, RuleID, SymbolID, TerminalID},
    lr0::{LR0Automaton, LR0State, StateID},
    nullable::Nullable,
    sets::TerminalSet,
};
use std::{fmt, ops::Range};

/// The goto transitions cannot exceed the range of a 16-bit signed integer.
pub const MAX_GOTOS: usize = i16::MAX as usize;

#[derive(Debug, thiserror::Error)]
pub enum LALRError {
    #[error("too many gotos (limit = {limit})")]
    TooManyGotos { limit: usize },

    #[error("no goto transition from {state:?} on the nonterminal {symbol:?}")]
    MissingGoto {
        state: StateID,
        symbol: NonterminalID,
    },

    #[error("no transition from {state:?} on the symbol {symbol:?}")]
    MissingTransition { state: StateID, symbol: SymbolID },

    #[error("no look-ahead row for {rule:?} in {state:?}")]
    MissingLookaheadRow { state: StateID, rule: RuleID },
}

/// The look-ahead table.
///
/// The rows of a state are contiguous and ordered like its reduction list.
#[derive(Debug, Clone)]
pub struct Lookaheads {
    consistent: Vec<bool>,
    offsets: Vec<usize>,
    rules: Vec<RuleID>,
    sets: Vec<TerminalSet>,
}

impl Lookaheads {
    /// Whether `state` can choose its action without a look-ahead token.
    pub fn is_consistent(&self, state: StateID) -> bool {
        self.consistent[state.index()]
    }

    /// The range of rows owned by `state`. Empty for consistent states.
    pub fn rows(&self, state: StateID) -> Range<usize> {
        self.offsets[state.index()]..self.offsets[state.index() + 1]
    }

    pub fn nrows(&self) -> usize {
        self.rules.len()
    }

    /// The rule reduced by `row`.
    pub fn rule(&self, row: usize) -> RuleID {
        self.rules[row]
    }

    pub fn set(&self, row: usize) -> &TerminalSet {
        &self.sets[row]
    }

    pub fn set_mut(&mut self, row: usize) -> &mut TerminalSet {
        &mut self.sets[row]
    }

    pub fn display<'a>(&'a self, g: &'a Grammar) -> impl fmt::Display + 'a {
        crate::util::display_fn(move |f| {
            for (state, _) in self.consistent.iter().enumerate().filter(|(_, c)| !**c) {
                let state = StateID::from_raw(state as u16);
                for row in self.rows(state) {
                    write!(f, "{:?} {} [", state, g.rule(self.rules[row]).display(g))?;
                    for (i, t) in self.sets[row].iter().enumerate() {
                        if i > 0 {
                            f.write_str(" ")?;
                        }
                        write!(f, "{}", g.terminals[&t])?;
                    }
                    writeln!(f, "]")?;
                }
            }
            Ok(())
        })
    }
}

/// The goto transitions of the automaton, grouped by nonterminal.
///
/// Within each group, the transitions are sorted by their source state.
#[derive(Debug, Clone)]
pub struct GotoMap {
    offsets: Vec<usize>,
    from_state: Vec<StateID>,
    to_state: Vec<StateID>,
}

impl GotoMap {
    pub fn len(&self) -> usize {
        self.from_state.len()
    }

    pub fn is_empty(&self) -> bool {
        self.from_state.is_empty()
    }

    pub fn from_state(&self, goto: usize) -> StateID {
        self.from_state[goto]
    }

    pub fn to_state(&self, goto: usize) -> StateID {
        self.to_state[goto]
    }

    /// The index range of the goto transitions labeled with `symbol`.
    pub fn gotos(&self, symbol: NonterminalID) -> Range<usize> {
        self.offsets[symbol.index()]..self.offsets[symbol.index() + 1]
    }

    /// Find the goto transition out of `state` labeled with `symbol`.
    pub fn map_goto(&self, state: StateID, symbol: NonterminalID) -> Result<usize, LALRError> {
        let range = self.gotos(symbol);
        self.from_state[range.clone()]
            .binary_search(&state)
            .map(|i| range.start + i)
            .map_err(|_| LALRError::MissingGoto { state, symbol })
    }
}

#[derive(Debug)]
pub struct LALRData {
    pub lookaheads: Lookaheads,
    pub gotos: GotoMap,
    /// `Follow(p,A)` for each goto transition.
    pub follows: Vec<TerminalSet>,
}

#[tracing::instrument(skip_all)]
pub fn lalr(
    g: &Grammar,
    lr0: &LR0Automaton,
    nullable: &Nullable,
    derives: &Derives,
) -> Result<LALRData, LALRError> {
    let mut lookaheads = initialize_la(g, lr0);
    let gotos = set_goto_map(g, lr0)?;
    tracing::debug!(
        "{} look-ahead rows, {} gotos, longest rule = {}",
        lookaheads.nrows(),
        gotos.len(),
        g.max_rhs()
    );

    let mut follows = initialize_f(g, lr0, nullable, &gotos)?;
    let (includes, lookback) = build_relations(g, lr0, nullable, derives, &gotos, &lookaheads)?;

    // compute FOLLOWS
    digraph(&includes, &mut follows);

    for (row, edges) in lookback.iter().enumerate() {
        let set = &mut lookaheads.sets[row];
        for &goto in edges {
            set.union_with(&follows[goto]);
        }
    }

    Ok(LALRData {
        lookaheads,
        gotos,
        follows,
    })
}

fn initialize_la(g: &Grammar, lr0: &LR0Automaton) -> Lookaheads {
    let mut consistent = Vec::with_capacity(lr0.nstates());
    let mut offsets = Vec::with_capacity(lr0.nstates() + 1);
    let mut rules = vec![];

    for state in &lr0.states {
        let shifts_token = lr0.token_shifts(state.number).next().is_some();
        let shifts_error = lr0
            .token_shifts(state.number)
            .any(|to| lr0.shift_symbol(to) == SymbolID::T(TerminalID::ERROR));
        let is_consistent = !shifts_error
            && (state.reductions.is_empty() || (state.reductions.len() == 1 && !shifts_token));

        offsets.push(rules.len());
        consistent.push(is_consistent);
        if !is_consistent {
            rules.extend_from_slice(&state.reductions);
        }
    }
    offsets.push(rules.len());

    Lookaheads {
        consistent,
        offsets,
        sets: vec![TerminalSet::with_capacity(g.ntokens()); rules.len()],
        rules,
    }
}

fn gotos_of<'a>(
    lr0: &'a LR0Automaton,
    state: &'a LR0State,
) -> impl Iterator<Item = (NonterminalID, StateID)> + 'a {
    state
        .shifts
        .iter()
        .copied()
        .filter_map(move |to| Some((lr0.shift_symbol(to).as_nonterminal()?, to)))
}

fn set_goto_map(g: &Grammar, lr0: &LR0Automaton) -> Result<GotoMap, LALRError> {
    let mut counts = vec![0usize; g.nvars()];
    let mut ngotos = 0;
    for state in &lr0.states {
        for (symbol, _) in gotos_of(lr0, state) {
            ngotos += 1;
            if ngotos > MAX_GOTOS {
                return Err(LALRError::TooManyGotos { limit: MAX_GOTOS });
            }
            counts[symbol.index()] += 1;
        }
    }

    let mut offsets = Vec::with_capacity(g.nvars() + 1);
    let mut k = 0;
    for count in &counts {
        offsets.push(k);
        k += count;
    }
    offsets.push(k);

    let mut next = offsets.clone();
    let mut from_state = vec![StateID::INITIAL; ngotos];
    let mut to_state = vec![StateID::INITIAL; ngotos];
    for state in &lr0.states {
        for (symbol, to) in gotos_of(lr0, state) {
            let slot = &mut next[symbol.index()];
            from_state[*slot] = state.number;
            to_state[*slot] = to;
            *slot += 1;
        }
    }

    Ok(GotoMap {
        offsets,
        from_state,
        to_state,
    })
}

/// Compute `Read(p,A)` for each goto transition.
fn initialize_f(
    g: &Grammar,
    lr0: &LR0Automaton,
    nullable: &Nullable,
    gotos: &GotoMap,
) -> Result<Vec<TerminalSet>, LALRError> {
    let mut sets = vec![TerminalSet::with_capacity(g.ntokens()); gotos.len()];
    let mut reads = vec![vec![]; gotos.len()];

    for (goto, set) in sets.iter_mut().enumerate() {
        let state = gotos.to_state(goto);
        for &to in &lr0.state(state).shifts {
            match lr0.shift_symbol(to) {
                SymbolID::T(t) => {
                    set.insert(t);
                }
                SymbolID::N(n) if nullable.contains(n) => {
                    reads[goto].push(gotos.map_goto(state, n)?);
                }
                SymbolID::N(..) => (),
            }
        }
    }

    digraph(&reads, &mut sets);
    Ok(sets)
}

/// Compute the transposed `includes` relation and the `lookback` edges of
/// each look-ahead row.
fn build_relations(
    g: &Grammar,
    lr0: &LR0Automaton,
    nullable: &Nullable,
    derives: &Derives,
    gotos: &GotoMap,
    lookaheads: &Lookaheads,
) -> Result<(Vec<Vec<usize>>, Vec<Vec<usize>>), LALRError> {
    let mut includes = vec![vec![]; gotos.len()];
    let mut lookback = vec![vec![]; lookaheads.nrows()];
    let mut states = Vec::with_capacity(g.max_rhs() + 1);

    for (goto, left) in g
        .nonterminals
        .keys()
        .flat_map(|&n| gotos.gotos(n).map(move |goto| (goto, n)))
    {
        let from = gotos.from_state(goto);
        for &rule in derives.get(left) {
            let right = g.rule(rule).right();

            // Trace the right-hand side from the source of the goto.
            states.clear();
            states.push(from);
            let mut state = from;
            for &symbol in right {
                state = lr0
                    .transition(state, symbol)
                    .ok_or(LALRError::MissingTransition { state, symbol })?;
                states.push(state);
            }

            if !lookaheads.is_consistent(state) {
                let row = lookaheads
                    .rows(state)
                    .find(|&row| lookaheads.rule(row) == rule)
                    .ok_or(LALRError::MissingLookaheadRow { state, rule })?;
                lookback[row].push(goto);
            }

            // B -> β A γ with γ =>* ε
            for (i, symbol) in right.iter().enumerate().rev() {
                let SymbolID::N(n) = *symbol else {
                    break;
                };
                includes[gotos.map_goto(states[i], n)?].push(goto);
                if !nullable.contains(n) {
                    break;
                }
            }
        }
    }

    Ok((includes, lookback))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{derives::derives, grammar::examples, lr0::lr0, nullable::nullable};

    fn build(example: examples::Example) -> (Grammar, LR0Automaton, LALRData) {
        let g = Grammar::define(example).unwrap();
        let derives = derives(&g);
        let nullable = nullable(&g);
        let lr0 = lr0(&g, &derives).unwrap();
        let lalr = lalr(&g, &lr0, &nullable, &derives).unwrap();
        (g, lr0, lalr)
    }

    fn names(g: &Grammar, set: &TerminalSet) -> Vec<String> {
        set.iter()
            .map(|t| g.terminals[&t].name().to_owned())
            .collect()
    }

    #[test]
    fn textbook_lookaheads() {
        let (g, lr0, lalr) = build(examples::arithmetic);
        let la = &lalr.lookaheads;

        let inconsistent: Vec<_> = lr0
            .states
            .iter()
            .filter(|s| !la.is_consistent(s.number))
            .map(|s| s.number.into_raw())
            .collect();
        assert_eq!(inconsistent, [4, 10]);
        assert_eq!(la.nrows(), 2);

        // E : T .  and  E : E '+' T .
        assert_eq!(la.rows(StateID::from_raw(4)), 0..1);
        assert_eq!(la.rule(0), RuleID::from_raw(2));
        assert_eq!(names(&g, la.set(0)), ["$end", "'+'", "')'"]);
        assert_eq!(la.rows(StateID::from_raw(10)), 1..2);
        assert_eq!(la.rule(1), RuleID::from_raw(1));
        assert_eq!(names(&g, la.set(1)), ["$end", "'+'", "')'"]);

        assert_eq!(lalr.gotos.len(), 9);
        // Follow(0,F) = { $end '+' '*' }
        let f = NonterminalID::from_raw(2);
        let goto = lalr.gotos.map_goto(StateID::INITIAL, f).unwrap();
        assert_eq!(names(&g, &lalr.follows[goto]), ["$end", "'+'", "'*'"]);
    }

    #[test]
    fn goto_map_is_grouped_and_sorted() {
        let (g, lr0, lalr) = build(examples::min_caml);
        let gotos = &lalr.gotos;
        let mut total = 0;
        for &n in g.nonterminals.keys() {
            let range = gotos.gotos(n);
            total += range.len();
            for i in range.clone() {
                let to = gotos.to_state(i);
                assert_eq!(lr0.shift_symbol(to), SymbolID::N(n));
                assert_eq!(gotos.map_goto(gotos.from_state(i), n).unwrap(), i);
            }
            assert!(range
                .clone()
                .zip(range.skip(1))
                .all(|(a, b)| gotos.from_state(a) < gotos.from_state(b)));
        }
        assert_eq!(total, gotos.len());

        let err = gotos
            .map_goto(lr0.termination, NonterminalID::from_raw(0))
            .unwrap_err();
        assert!(matches!(err, LALRError::MissingGoto { .. }));
    }

    #[test]
    fn too_many_gotos() {
        // S : p_i Z    Z : N_j    N_j : 'x'
        //
        // Each of the 200 states reached by `p_i` has a goto on `Z` and on
        // every `N_j`.
        let g = Grammar::define(|g| {
            let s = g.nonterminal("S")?;
            let z = g.nonterminal("Z")?;
            let x = g.terminal("'x'", None)?;
            for j in 0..200 {
                let n = g.nonterminal(format!("N{}", j))?;
                g.rule(z, [SymbolID::N(n)], None)?;
                g.rule(n, [SymbolID::T(x)], None)?;
            }
            for i in 0..200 {
                let p = g.terminal(format!("p{}", i), None)?;
                g.rule(s, [SymbolID::T(p), SymbolID::N(z)], None)?;
            }
            g.start_symbol(s)
        })
        .unwrap();
        let derives = derives(&g);
        let lr0 = lr0(&g, &derives).unwrap();
        let err = lalr(&g, &lr0, &nullable(&g), &derives).unwrap_err();
        assert!(matches!(err, LALRError::TooManyGotos { limit: MAX_GOTOS }));
    }

    #[test]
    fn reads_through_nullable_nonterminal() {
        let (g, lr0, lalr) = build(examples::read_through_nullable);
        let la = &lalr.lookaheads;

        // A : 'x' .  | A : 'x' . 'y'
        let state = lr0
            .states
            .iter()
            .find(|s| s.reductions == [RuleID::from_raw(2)])
            .unwrap()
            .number;
        assert!(!la.is_consistent(state));
        let rows = la.rows(state);
        assert_eq!(rows.len(), 1);
        assert_eq!(names(&g, la.set(rows.start)), ["b", "d"]);

        // B : /* empty */  only applies before 'd'
        let state = lr0
            .states
            .iter()
            .find(|s| s.reductions == [RuleID::from_raw(4)])
            .unwrap()
            .number;
        assert_eq!(names(&g, la.set(la.rows(state).start)), ["d"]);
    }

    #[test]
    fn ambiguous_lookaheads() {
        let (g, _lr0, lalr) = build(examples::ambiguous);
        let la = &lalr.lookaheads;
        assert_eq!(la.nrows(), 1);
        assert_eq!(la.rows(StateID::from_raw(3)), 0..1);
        assert_eq!(names(&g, la.set(0)), ["$end", "a"]);
    }

    #[test]
    fn error_shift_makes_state_inconsistent() {
        let (g, _lr0, lalr) = build(examples::error_recovery);
        let la = &lalr.lookaheads;
        let state = StateID::from_raw(1);
        assert!(!la.is_consistent(state));
        assert_eq!(la.rows(state), 0..1);
        assert_eq!(names(&g, la.set(0)), ["$end"]);
    }

    #[test]
    fn lalr_merges_lookaheads() {
        // LALR(1) merges { A : 'c' . , B : 'c' . } reached after 'a' and 'b'.
        let (g, lr0, lalr) = build(examples::lalr_reduce_reduce);
        let la = &lalr.lookaheads;
        let state = lr0
            .states
            .iter()
            .find(|s| s.reductions.len() == 2)
            .unwrap()
            .number;
        let rows = la.rows(state);
        assert_eq!(rows.len(), 2);
        for row in rows {
            assert_eq!(names(&g, la.set(row)), ["d", "e"]);
        }
    }
}
