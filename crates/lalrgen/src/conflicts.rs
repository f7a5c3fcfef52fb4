//! Shift/reduce and reduce/reduce conflicts.
//!
//! Conflicts between a shift and a reduction whose rule and token both carry a
//! precedence are resolved in favor of the tighter binding one, or by the
//! associativity of the token for equal levels. Whatever remains unresolved is
//! reported as data: the table construction later prefers the shift and the
//! lowest-numbered look-ahead row.

use crate::{
    grammar::{Assoc, Grammar, RuleID, TerminalID},
    lalr::Lookaheads,
    lr0::{LR0Automaton, StateID},
    sets::TerminalSet,
    util::display_fn,
};
use std::fmt;

/// A shift edge after conflict resolution.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Edge {
    Active(StateID),
    /// A shift removed in favor of a reduction or an explicit error.
    Suppressed,
}

impl Edge {
    pub fn active(self) -> Option<StateID> {
        match self {
            Self::Active(to) => Some(to),
            Self::Suppressed => None,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Resolved {
    Shift,
    Reduce,
    Error,
}

impl fmt::Display for Resolved {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Shift => f.write_str("shift"),
            Self::Reduce => f.write_str("reduce"),
            Self::Error => f.write_str("an error"),
        }
    }
}

/// A shift/reduce conflict settled by precedence.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Resolution {
    pub state: StateID,
    pub rule: RuleID,
    pub token: TerminalID,
    pub resolved: Resolved,
}

impl Resolution {
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            write!(
                f,
                "Conflict in state {} between rule {} and token {} resolved as {}.",
                self.state,
                self.rule.into_raw(),
                g.terminals[&self.token],
                self.resolved
            )
        })
    }
}

#[derive(Debug)]
pub struct Conflicts {
    /// The shift edges of each state, parallel to the LR(0) shift lists.
    pub shifts: Vec<Vec<Edge>>,
    /// Tokens made explicit errors by `%nonassoc`, per state.
    pub errs: Vec<Vec<TerminalID>>,
    /// Whether each state has a conflict not resolved by precedence.
    pub has_conflicts: Vec<bool>,
    pub any_conflicts: bool,
    pub resolutions: Vec<Resolution>,
}

impl Conflicts {
    /// The tokens shifted by `state` after resolution.
    pub fn shift_set(&self, g: &Grammar, lr0: &LR0Automaton, state: StateID) -> TerminalSet {
        let mut set = TerminalSet::with_capacity(g.ntokens());
        for edge in &self.shifts[state.index()] {
            let Some(to) = edge.active() else {
                continue;
            };
            match lr0.shift_symbol(to).as_terminal() {
                Some(t) => {
                    set.insert(t);
                }
                None => break,
            }
        }
        set
    }
}

/// Resolve the conflicts of every inconsistent state.
///
/// Look-ahead bits discarded in favor of a shift or an error are cleared
/// from `lookaheads`.
#[tracing::instrument(skip_all)]
pub fn resolve(g: &Grammar, lr0: &LR0Automaton, lookaheads: &mut Lookaheads) -> Conflicts {
    let mut conflicts = Conflicts {
        shifts: lr0
            .states
            .iter()
            .map(|state| state.shifts.iter().map(|&to| Edge::Active(to)).collect())
            .collect(),
        errs: vec![vec![]; lr0.nstates()],
        has_conflicts: vec![false; lr0.nstates()],
        any_conflicts: false,
        resolutions: vec![],
    };

    for state in &lr0.states {
        if lookaheads.is_consistent(state.number) {
            continue;
        }
        set_conflicts(g, lr0, lookaheads, &mut conflicts, state.number);
    }

    for resolution in &conflicts.resolutions {
        tracing::debug!("{}", resolution.display(g));
    }

    conflicts
}

fn set_conflicts(
    g: &Grammar,
    lr0: &LR0Automaton,
    lookaheads: &mut Lookaheads,
    conflicts: &mut Conflicts,
    state: StateID,
) {
    let mut lookahead_set: TerminalSet = lr0
        .token_shifts(state)
        .filter_map(|to| lr0.shift_symbol(to).as_terminal())
        .collect();

    for row in lookaheads.rows(state) {
        let rule = lookaheads.rule(row);
        let Some(rule_prec) = g.rule(rule).precedence() else {
            continue;
        };
        if lookaheads.set(row).is_disjoint(&lookahead_set) {
            continue;
        }

        let mut candidates = lookaheads.set(row).clone();
        candidates.intersect_with(&lookahead_set);
        for token in candidates.iter() {
            let Some(token_prec) = g.terminals[&token].precedence() else {
                continue;
            };

            let resolved = if token_prec.priority < rule_prec.priority {
                Resolved::Reduce
            } else if token_prec.priority > rule_prec.priority {
                Resolved::Shift
            } else {
                match token_prec.assoc {
                    Assoc::Right => Resolved::Shift,
                    Assoc::Left => Resolved::Reduce,
                    Assoc::Nonassoc => Resolved::Error,
                }
            };

            if resolved != Resolved::Shift {
                lookahead_set.remove(token);
                flush_shift(lr0, conflicts, state, token);
            }
            if resolved != Resolved::Reduce {
                lookaheads.set_mut(row).remove(token);
            }
            if resolved == Resolved::Error {
                conflicts.errs[state.index()].push(token);
            }
            conflicts.resolutions.push(Resolution {
                state,
                rule,
                token,
                resolved,
            });
        }
    }

    // Anything still colliding with a shift or an earlier row is a conflict.
    for row in lookaheads.rows(state) {
        if !lookaheads.set(row).is_disjoint(&lookahead_set) {
            conflicts.has_conflicts[state.index()] = true;
            conflicts.any_conflicts = true;
        }
        lookahead_set.union_with(lookaheads.set(row));
    }
}

fn flush_shift(lr0: &LR0Automaton, conflicts: &mut Conflicts, state: StateID, token: TerminalID) {
    for edge in &mut conflicts.shifts[state.index()] {
        if let Edge::Active(to) = *edge {
            if lr0.shift_symbol(to).as_terminal() == Some(token) {
                *edge = Edge::Suppressed;
            }
        }
    }
}

/// The number of tokens on which `state` may both shift and reduce.
pub fn count_sr(
    g: &Grammar,
    lr0: &LR0Automaton,
    lookaheads: &Lookaheads,
    conflicts: &Conflicts,
    state: StateID,
) -> usize {
    let mut set = TerminalSet::with_capacity(g.ntokens());
    for row in lookaheads.rows(state) {
        set.union_with(lookaheads.set(row));
    }
    set.intersect_with(&conflicts.shift_set(g, lr0, state));
    set.len()
}

/// The number of tokens on which `state` may reduce by two or more rules.
pub fn count_rr(g: &Grammar, lookaheads: &Lookaheads, state: StateID) -> usize {
    let rows = lookaheads.rows(state);
    if rows.len() < 2 {
        return 0;
    }
    g.terminals
        .keys()
        .filter(|&&t| rows.clone().filter(|&row| lookaheads.set(row).contains(t)).count() >= 2)
        .count()
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StateConflicts {
    pub state: StateID,
    pub shift_reduce: usize,
    pub reduce_reduce: usize,
}

/// The conflicts left unresolved after precedence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConflictSummary {
    pub shift_reduce: usize,
    pub reduce_reduce: usize,
    pub states: Vec<StateConflicts>,
}

/// Whether the conflicts match the declared expectation.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Expectation {
    NotDeclared,
    Met,
    Unmet {
        expected: usize,
        found: usize,
        reduce_reduce: usize,
    },
}

impl ConflictSummary {
    pub fn new(
        g: &Grammar,
        lr0: &LR0Automaton,
        lookaheads: &Lookaheads,
        conflicts: &Conflicts,
    ) -> Self {
        let mut summary = Self::default();
        for state in &lr0.states {
            if !conflicts.has_conflicts[state.number.index()] {
                continue;
            }
            let shift_reduce = count_sr(g, lr0, lookaheads, conflicts, state.number);
            let reduce_reduce = count_rr(g, lookaheads, state.number);
            summary.shift_reduce += shift_reduce;
            summary.reduce_reduce += reduce_reduce;
            summary.states.push(StateConflicts {
                state: state.number,
                shift_reduce,
                reduce_reduce,
            });
        }
        summary
    }

    pub fn is_empty(&self) -> bool {
        self.shift_reduce == 0 && self.reduce_reduce == 0
    }

    /// Compare against the declared number of shift/reduce conflicts.
    ///
    /// Reduce/reduce conflicts are never expected.
    pub fn expectation(&self, expected: Option<usize>) -> Expectation {
        match expected {
            None => Expectation::NotDeclared,
            Some(expected) if expected == self.shift_reduce && self.reduce_reduce == 0 => {
                Expectation::Met
            }
            Some(expected) => Expectation::Unmet {
                expected,
                found: self.shift_reduce,
                reduce_reduce: self.reduce_reduce,
            },
        }
    }
}

impl fmt::Display for ConflictSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for state in &self.states {
            write!(f, "State {} contains", state.state)?;
            if state.shift_reduce > 0 {
                write!(f, " {}", plural(state.shift_reduce, "shift/reduce conflict"))?;
                if state.reduce_reduce > 0 {
                    f.write_str(" and")?;
                }
            }
            if state.reduce_reduce > 0 {
                write!(f, " {}", plural(state.reduce_reduce, "reduce/reduce conflict"))?;
            }
            writeln!(f, ".")?;
        }
        write!(
            f,
            "{}, {}",
            plural(self.shift_reduce, "shift/reduce conflict"),
            plural(self.reduce_reduce, "reduce/reduce conflict")
        )
    }
}

fn plural(n: usize, word: &str) -> String {
    if n == 1 {
        format!("{} {}", n, word)
    } else {
        format!("{} {}s", n, word)
    }
}
