//! Parse table construction.

use crate::{
    conflicts::Conflicts,
    grammar::{Grammar, NonterminalID, RuleID, SymbolID, TerminalID},
    lalr::Lookaheads,
    lr0::{LR0Automaton, StateID},
    types::Map,
    util::display_fn,
};
use std::fmt;

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Action {
    Shift(StateID),
    Reduce(RuleID),
    /// Shift into the termination state, which accepts the input.
    Accept,
    /// An explicit syntax error, overriding the default reduction.
    Error,
}

#[derive(Debug, Clone, Default)]
pub struct ParseTableRow {
    /// The explicit actions, in ascending token order.
    pub actions: Map<TerminalID, Action>,
    /// The action taken for every token without an explicit action.
    /// Without a default reduction, such tokens are syntax errors.
    pub default_reduction: Option<RuleID>,
    pub gotos: Map<NonterminalID, StateID>,
}

impl ParseTableRow {
    /// The action taken when `token` is the look-ahead, or `None` for a syntax error.
    pub fn action(&self, token: TerminalID) -> Option<Action> {
        match self.actions.get(&token) {
            Some(Action::Error) => None,
            Some(action) => Some(*action),
            None => self.default_reduction.map(Action::Reduce),
        }
    }
}

#[derive(Debug, Clone)]
pub struct ParseTable {
    pub states: Vec<ParseTableRow>,
}

impl ParseTable {
    pub fn row(&self, state: StateID) -> &ParseTableRow {
        &self.states[state.index()]
    }

    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            for (i, row) in self.states.iter().enumerate() {
                writeln!(f, "State {}:", i)?;
                for (token, action) in &row.actions {
                    let token = &g.terminals[token];
                    match action {
                        Action::Shift(to) => {
                            writeln!(f, "    {:<16} shift, and go to state {}", token, to)?
                        }
                        Action::Reduce(rule) => writeln!(
                            f,
                            "    {:<16} reduce using rule {} ({})",
                            token,
                            rule.into_raw(),
                            g.nonterminals[&g.rule(*rule).left()]
                        )?,
                        Action::Accept => writeln!(f, "    {:<16} accept", token)?,
                        Action::Error => writeln!(f, "    {:<16} error (nonassociative)", token)?,
                    }
                }
                if let Some(rule) = row.default_reduction {
                    writeln!(
                        f,
                        "    {:<16} reduce using rule {} ({})",
                        "$default",
                        rule.into_raw(),
                        g.nonterminals[&g.rule(rule).left()]
                    )?;
                }
                for (symbol, to) in &row.gotos {
                    writeln!(
                        f,
                        "    {:<16} go to state {}",
                        g.nonterminals[symbol].name(),
                        to
                    )?;
                }
                writeln!(f)?;
            }
            Ok(())
        })
    }
}

#[tracing::instrument(skip_all)]
pub fn generate(
    g: &Grammar,
    lr0: &LR0Automaton,
    lookaheads: &Lookaheads,
    conflicts: &Conflicts,
) -> ParseTable {
    let states = lr0
        .states
        .iter()
        .map(|state| action_row(g, lr0, lookaheads, conflicts, state.number))
        .collect();
    ParseTable { states }
}

fn action_row(
    g: &Grammar,
    lr0: &LR0Automaton,
    lookaheads: &Lookaheads,
    conflicts: &Conflicts,
    state: StateID,
) -> ParseTableRow {
    let mut actrow: Vec<Option<Action>> = vec![None; g.ntokens()];
    let reductions = &lr0.state(state).reductions;

    // Scanning backwards, the lowest-numbered row wins a reduce/reduce conflict.
    let rows = lookaheads.rows(state);
    for row in rows.clone().rev() {
        let rule = lookaheads.rule(row);
        for token in lookaheads.set(row).iter() {
            actrow[token.index()] = Some(Action::Reduce(rule));
        }
    }

    let mut nodefault = false;
    let mut gotos = Map::default();
    for edge in &conflicts.shifts[state.index()] {
        let Some(to) = edge.active() else {
            continue;
        };
        match lr0.shift_symbol(to) {
            SymbolID::T(token) => {
                actrow[token.index()] = Some(if to == lr0.termination {
                    Action::Accept
                } else {
                    Action::Shift(to)
                });
                // Recovering from an error needs every action to be explicit.
                if token == TerminalID::ERROR {
                    nodefault = true;
                }
            }
            SymbolID::N(symbol) => {
                gotos.insert(symbol, to);
            }
        }
    }

    for token in &conflicts.errs[state.index()] {
        actrow[token.index()] = Some(Action::Error);
    }

    let mut default_reduction = None;
    if !reductions.is_empty() && !nodefault {
        if lookaheads.is_consistent(state) {
            default_reduction = Some(reductions[0]);
        } else {
            let mut max = 0;
            let mut default_rule = None;
            for row in rows {
                let rule = lookaheads.rule(row);
                let count = actrow
                    .iter()
                    .filter(|action| **action == Some(Action::Reduce(rule)))
                    .count();
                if count > max {
                    max = count;
                    default_rule = Some(rule);
                }
            }
            if let Some(rule) = default_rule {
                for action in &mut actrow {
                    if *action == Some(Action::Reduce(rule)) {
                        *action = None;
                    }
                }
                default_reduction = Some(rule);
            }
        }
    }

    if default_reduction.is_none() {
        for action in &mut actrow {
            if *action == Some(Action::Error) {
                *action = None;
            }
        }
    }

    let actions = actrow
        .into_iter()
        .enumerate()
        .filter_map(|(i, action)| Some((TerminalID::from_raw(i as u16), action?)))
        .collect();

    ParseTableRow {
        actions,
        default_reduction,
        gotos,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        conflicts::resolve, derives::derives, grammar::examples, lalr::lalr, lr0::lr0,
        nullable::nullable,
    };

    fn table(example: examples::Example) -> (Grammar, LR0Automaton, ParseTable) {
        let g = Grammar::define(example).unwrap();
        let derives = derives(&g);
        let lr0 = lr0(&g, &derives).unwrap();
        let mut lookaheads = lalr(&g, &lr0, &nullable(&g), &derives)
            .unwrap()
            .lookaheads;
        let conflicts = resolve(&g, &lr0, &mut lookaheads);
        let table = generate(&g, &lr0, &lookaheads, &conflicts);
        (g, lr0, table)
    }

    fn token(g: &Grammar, name: &str) -> TerminalID {
        g.terminals
            .values()
            .find(|t| t.name() == name)
            .unwrap()
            .id()
    }

    #[test]
    fn consistent_state_reduces_by_default() {
        let (g, _lr0, table) = table(examples::arithmetic);
        // F : id .
        let row = table.row(StateID::from_raw(2));
        assert!(row.actions.is_empty());
        assert_eq!(row.default_reduction, Some(RuleID::from_raw(6)));
        assert_eq!(
            row.action(token(&g, "')'")),
            Some(Action::Reduce(RuleID::from_raw(6)))
        );
    }

    #[test]
    fn inconsistent_state_keeps_only_shifts_explicit() {
        let (g, _lr0, table) = table(examples::arithmetic);
        // E : T .  | T : T . '*' F
        let row = table.row(StateID::from_raw(4));
        assert_eq!(row.default_reduction, Some(RuleID::from_raw(2)));
        assert_eq!(
            row.actions.iter().collect::<Vec<_>>(),
            [(&token(&g, "'*'"), &Action::Shift(StateID::from_raw(8)))]
        );
    }

    #[test]
    fn accept_and_gotos() {
        let (g, lr0, table) = table(examples::arithmetic);
        let row = table.row(lr0.final_state);
        assert_eq!(
            row.actions.get(&TerminalID::EOI),
            Some(&Action::Accept)
        );
        assert_eq!(row.default_reduction, None);

        let row = table.row(lr0.next_to_final);
        assert_eq!(
            row.action(TerminalID::EOI),
            Some(Action::Shift(lr0.final_state))
        );
        assert_eq!(row.action(token(&g, "')'")), None);

        let gotos: Vec<_> = table
            .row(StateID::INITIAL)
            .gotos
            .iter()
            .map(|(n, s)| (g.nonterminals[n].name(), s.into_raw()))
            .collect();
        assert_eq!(gotos, [("E", 3), ("T", 4), ("F", 5)]);
    }

    #[test]
    fn shift_wins_unresolved_conflict() {
        let (g, _lr0, table) = table(examples::ambiguous);
        let row = table.row(StateID::from_raw(3));
        assert_eq!(row.default_reduction, Some(RuleID::from_raw(1)));
        assert_eq!(
            row.actions.iter().collect::<Vec<_>>(),
            [(&token(&g, "a"), &Action::Shift(StateID::from_raw(1)))]
        );
    }

    #[test]
    fn nonassoc_error_is_explicit() {
        let (g, _lr0, table) = table(examples::nonassoc);
        let row = table.row(StateID::from_raw(4));
        assert_eq!(row.default_reduction, Some(RuleID::from_raw(1)));
        assert_eq!(
            row.actions.iter().collect::<Vec<_>>(),
            [(&token(&g, "op"), &Action::Error)]
        );
        assert_eq!(row.action(token(&g, "op")), None);
    }

    #[test]
    fn error_shift_disables_default() {
        let (g, _lr0, table) = table(examples::error_recovery);
        // S : 'x' .  | S : 'x' . error
        let row = table.row(StateID::from_raw(1));
        assert_eq!(row.default_reduction, None);
        assert_eq!(
            row.actions.iter().collect::<Vec<_>>(),
            [
                (&TerminalID::EOI, &Action::Reduce(RuleID::from_raw(1))),
                (&TerminalID::ERROR, &Action::Shift(StateID::from_raw(2))),
            ]
        );
        assert_eq!(row.action(token(&g, "x")), None);
    }

    #[test]
    fn lowest_rule_wins_reduce_reduce() {
        let (_g, lr0, table) = table(examples::lalr_reduce_reduce);
        let state = lr0
            .states
            .iter()
            .find(|s| s.reductions.len() == 2)
            .unwrap();
        let row = table.row(state.number);
        assert_eq!(row.default_reduction, Some(state.reductions[0]));
        assert!(row.actions.is_empty());
    }
}
