//! The LR(0) automaton.
//!
//! States are discovered in breadth-first order: every newly created state is
//! appended to the state vector and processed once the scan reaches it, so the
//! numbering is fully determined by the grammar.

use crate::{
    closure::Closure,
    derives::Derives,
    grammar::{Grammar, ItemID, RItem, RuleID, SymbolID},
    types::Map,
    util::display_fn,
};
use std::fmt;

/// The number of states must stay representable as a 16-bit signed integer.
pub const MAX_STATES: usize = i16::MAX as usize;

#[derive(Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct StateID(u16);

impl fmt::Debug for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S#{:03}", self.0)
    }
}

impl fmt::Display for StateID {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.0, f)
    }
}

impl StateID {
    pub const INITIAL: Self = Self(0);

    pub const fn from_raw(raw: u16) -> Self {
        Self(raw)
    }

    pub const fn into_raw(self) -> u16 {
        self.0
    }

    pub const fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LR0Error {
    #[error("too many states (limit = {limit})")]
    TooManyStates { limit: usize },
}

#[derive(Debug, Clone)]
pub struct LR0State {
    pub number: StateID,
    /// The symbol shifted to enter this state.
    ///
    /// The initial state and the trailing final/termination states use
    /// the end-of-input marker.
    pub accessing_symbol: SymbolID,
    /// The kernel items, sorted in ascending order.
    pub items: Vec<ItemID>,
    /// The successor states, ordered by their accessing symbols.
    pub shifts: Vec<StateID>,
    /// The rules reducible in this state, in the order of the closure scan.
    pub reductions: Vec<RuleID>,
}

#[derive(Debug)]
pub struct LR0Automaton {
    pub states: Vec<LR0State>,
    /// The state reached from the initial state by shifting the start symbol.
    pub next_to_final: StateID,
    /// The state reached from `next_to_final` on the end of input.
    pub final_state: StateID,
    /// The state reached from `final_state`. Shifting into it accepts the input.
    pub termination: StateID,
}

impl LR0Automaton {
    pub fn nstates(&self) -> usize {
        self.states.len()
    }

    pub fn state(&self, id: StateID) -> &LR0State {
        &self.states[id.index()]
    }

    /// The symbol labeling the shift into `target`.
    pub fn shift_symbol(&self, target: StateID) -> SymbolID {
        self.states[target.index()].accessing_symbol
    }

    /// Follow the shift labeled with `symbol` out of `from`.
    pub fn transition(&self, from: StateID, symbol: SymbolID) -> Option<StateID> {
        self.state(from)
            .shifts
            .iter()
            .copied()
            .find(|&to| self.shift_symbol(to) == symbol)
    }

    /// The shifts of `state` labeled with terminal symbols.
    ///
    /// Shift lists are sorted by symbol, so these form a prefix of the list.
    pub fn token_shifts(&self, state: StateID) -> impl Iterator<Item = StateID> + '_ {
        self.state(state)
            .shifts
            .iter()
            .copied()
            .take_while(move |&to| self.shift_symbol(to).is_terminal())
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            for state in &self.states {
                write!(f, "#### State {}", state.number)?;
                if state.number == self.next_to_final {
                    f.write_str(" (next-to-final)")?;
                } else if state.number == self.final_state {
                    f.write_str(" (final)")?;
                } else if state.number == self.termination {
                    f.write_str(" (termination)")?;
                }
                writeln!(f)?;
                for item in &state.items {
                    writeln!(f, "  {}", item.display(g))?;
                }
                for &to in &state.shifts {
                    writeln!(
                        f,
                        "  {} => {:?}",
                        g.symbol_display(self.shift_symbol(to)),
                        to
                    )?;
                }
                for rule in &state.reductions {
                    writeln!(f, "  reduce by {}", g.rule(*rule).display(g))?;
                }
            }
            Ok(())
        })
    }
}

/// Build the LR(0) automaton of `g`, including the trailing accept states.
#[tracing::instrument(skip_all)]
pub fn lr0(g: &Grammar, derives: &Derives) -> Result<LR0Automaton, LR0Error> {
    let mut closure = Closure::new(g, derives);
    let mut builder = Builder {
        states: vec![LR0State {
            number: StateID::INITIAL,
            accessing_symbol: SymbolID::EOI,
            items: vec![],
            shifts: vec![],
            reductions: vec![],
        }],
        kernels: Map::default(),
    };

    let mut current = 0;
    while current < builder.states.len() {
        let itemset = closure.closure(&builder.states[current].items);

        let mut reductions = vec![];
        let mut kernel_base = Map::<SymbolID, Vec<ItemID>>::default();
        for &item in itemset {
            match g.item(item) {
                RItem::End(rule) => reductions.push(rule),
                RItem::Symbol(symbol) => {
                    // `itemset` is sorted, so each kernel stays sorted too.
                    kernel_base.entry(symbol).or_default().push(item.advance());
                }
            }
        }

        kernel_base.sort_keys();
        let mut shifts = Vec::with_capacity(kernel_base.len());
        for (symbol, kernel) in kernel_base {
            shifts.push(builder.get_state(symbol, kernel)?);
        }

        let state = &mut builder.states[current];
        state.reductions = reductions;
        state.shifts = shifts;
        current += 1;
    }

    let nstates = builder.states.len();
    let (next_to_final, final_state, termination) = builder.augment(g)?;
    tracing::debug!(
        "{} states ({} after augmentation)",
        nstates,
        builder.states.len()
    );

    Ok(LR0Automaton {
        states: builder.states,
        next_to_final,
        final_state,
        termination,
    })
}

struct Builder {
    states: Vec<LR0State>,
    kernels: Map<Vec<ItemID>, StateID>,
}

impl Builder {
    fn get_state(&mut self, symbol: SymbolID, kernel: Vec<ItemID>) -> Result<StateID, LR0Error> {
        if let Some(&id) = self.kernels.get(&kernel) {
            return Ok(id);
        }
        let id = self.new_state(symbol, kernel.clone())?;
        self.kernels.insert(kernel, id);
        Ok(id)
    }

    fn new_state(&mut self, symbol: SymbolID, items: Vec<ItemID>) -> Result<StateID, LR0Error> {
        if self.states.len() >= MAX_STATES {
            return Err(LR0Error::TooManyStates { limit: MAX_STATES });
        }
        let number = StateID(self.states.len() as u16);
        tracing::trace!("new state {:?} accessed by {:?}", number, symbol);
        self.states.push(LR0State {
            number,
            accessing_symbol: symbol,
            items,
            shifts: vec![],
            reductions: vec![],
        });
        Ok(number)
    }

    /// Append the next-to-final, final and termination states.
    fn augment(&mut self, g: &Grammar) -> Result<(StateID, StateID, StateID), LR0Error> {
        let start = SymbolID::N(g.start_symbol);

        let found = self.states[0]
            .shifts
            .iter()
            .copied()
            .find(|to| self.states[to.index()].accessing_symbol == start);
        let next_to_final = match found {
            Some(to) => to,
            None => {
                let to = self.new_state(start, vec![])?;
                let states = &mut self.states;
                let position = states[0]
                    .shifts
                    .iter()
                    .position(|s| states[s.index()].accessing_symbol > start)
                    .unwrap_or(states[0].shifts.len());
                states[0].shifts.insert(position, to);
                to
            }
        };

        // The end of input sorts before every other symbol.
        let final_state = self.new_state(SymbolID::EOI, vec![])?;
        self.states[next_to_final.index()]
            .shifts
            .insert(0, final_state);

        let termination = self.new_state(SymbolID::EOI, vec![])?;
        self.states[final_state.index()].shifts.push(termination);

        Ok((next_to_final, final_state, termination))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        derives::derives,
        grammar::{examples, RuleID, TerminalID},
    };

    fn build(example: examples::Example) -> (Grammar, LR0Automaton) {
        let g = Grammar::define(example).unwrap();
        let lr0 = lr0(&g, &derives(&g)).unwrap();
        (g, lr0)
    }

    fn raw(states: &[StateID]) -> Vec<u16> {
        states.iter().map(|s| s.into_raw()).collect()
    }

    #[test]
    fn textbook_numbering() {
        let (_g, lr0) = build(examples::arithmetic);
        assert_eq!(lr0.nstates(), 14);
        assert_eq!(raw(&lr0.states[0].shifts), [1, 2, 3, 4, 5]);
        assert_eq!(raw(&lr0.states[1].shifts), [1, 2, 6, 4, 5]);
        assert_eq!(raw(&lr0.states[6].shifts), [7, 9]);
        assert_eq!(raw(&lr0.states[7].shifts), [1, 2, 10, 5]);
        assert_eq!(raw(&lr0.states[8].shifts), [1, 2, 11]);

        assert_eq!(lr0.next_to_final, StateID(3));
        assert_eq!(lr0.final_state, StateID(12));
        assert_eq!(lr0.termination, StateID(13));
        assert_eq!(raw(&lr0.states[3].shifts), [12, 7]);
        assert_eq!(raw(&lr0.states[12].shifts), [13]);
        assert!(lr0.states[13].shifts.is_empty());

        assert_eq!(lr0.states[4].reductions, [RuleID::from_raw(2)]);
        assert_eq!(raw(&lr0.token_shifts(StateID(4)).collect::<Vec<_>>()), [8]);
        assert_eq!(
            lr0.transition(StateID(4), SymbolID::T(TerminalID::from_raw(3))),
            Some(StateID(8))
        );
    }

    #[test]
    fn well_formed() {
        for (name, example) in examples::ALL {
            let (_g, lr0) = build(*example);
            for (i, state) in lr0.states.iter().enumerate() {
                assert_eq!(state.number.index(), i, "{}", name);
                assert!(state.items.windows(2).all(|w| w[0] < w[1]), "{}", name);
                assert!(
                    state.shifts.iter().all(|s| s.index() < lr0.nstates()),
                    "{}",
                    name
                );
                let symbols: Vec<_> = state.shifts.iter().map(|&s| lr0.shift_symbol(s)).collect();
                assert!(symbols.windows(2).all(|w| w[0] <= w[1]), "{}", name);
            }

            // The termination state is reachable from the initial state.
            let mut visited = vec![false; lr0.nstates()];
            let mut stack = vec![StateID::INITIAL];
            while let Some(s) = stack.pop() {
                if std::mem::replace(&mut visited[s.index()], true) {
                    continue;
                }
                stack.extend(lr0.state(s).shifts.iter().copied());
            }
            assert!(visited[lr0.termination.index()], "{}", name);
            assert!(visited.iter().all(|v| *v), "{}", name);
        }
    }

    #[test]
    fn deterministic() {
        for (_name, example) in examples::ALL {
            let (_, a) = build(*example);
            let (_, b) = build(*example);
            assert_eq!(a.nstates(), b.nstates());
            for (x, y) in a.states.iter().zip(&b.states) {
                assert_eq!(x.items, y.items);
                assert_eq!(x.shifts, y.shifts);
                assert_eq!(x.reductions, y.reductions);
            }
        }
    }

    #[test]
    fn augment_without_any_shift() {
        let (g, lr0) = build(examples::empty_language);
        // 0: S : .     1: next-to-final  2: final  3: termination
        assert_eq!(lr0.nstates(), 4);
        assert_eq!(lr0.states[0].reductions, [RuleID::from_raw(1)]);
        assert_eq!(raw(&lr0.states[0].shifts), [1]);
        assert_eq!(lr0.next_to_final, StateID(1));
        assert_eq!(lr0.shift_symbol(StateID(1)), SymbolID::N(g.start_symbol));
        assert!(lr0.states[1].items.is_empty());
        assert_eq!(raw(&lr0.states[1].shifts), [2]);
        assert_eq!(raw(&lr0.states[2].shifts), [3]);
    }

    #[test]
    fn augment_without_shift_on_start_symbol() {
        let (g, lr0) = build(examples::error_recovery);
        // 0: shift 'x' only
        // 1: S : 'x' .  | S : 'x' . error
        // 2: S : 'x' error .
        assert_eq!(lr0.next_to_final, StateID(3));
        assert_eq!(raw(&lr0.states[0].shifts), [1, 3]);
        assert_eq!(lr0.shift_symbol(StateID(3)), SymbolID::N(g.start_symbol));
        assert_eq!(lr0.final_state, StateID(4));
        assert_eq!(lr0.termination, StateID(5));
    }

    #[test]
    fn too_many_states() {
        // A chain of distinct terminals yields one state per prefix.
        let g = Grammar::define(|g| {
            let s = g.nonterminal("S")?;
            let mut right = vec![];
            for i in 0..MAX_STATES {
                right.push(SymbolID::T(g.terminal(format!("t{}", i), None)?));
            }
            g.rule(s, right, None)?;
            Ok(())
        })
        .unwrap();
        let err = lr0(&g, &derives(&g)).unwrap_err();
        assert!(matches!(err, LR0Error::TooManyStates { limit: MAX_STATES }));
    }
}
