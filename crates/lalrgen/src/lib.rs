//! LALR(1) parser table construction.
//!
//! The pipeline builds the LR(0) automaton of a grammar, attaches look-ahead
//! sets to the reductions of its inconsistent states, resolves conflicts by
//! precedence and finally derives the action table:
//!
//! ```text
//! nullable -> derives -> closure -> lr0 -> lalr -> conflicts -> table
//! ```

pub mod closure;
pub mod conflicts;
pub mod derives;
pub mod digraph;
pub mod grammar;
pub mod lalr;
pub mod lr0;
pub mod nullable;
pub mod sets;
pub mod table;
pub mod types;
pub mod util;

use crate::{
    conflicts::{ConflictSummary, Conflicts, Expectation},
    grammar::Grammar,
    lalr::{LALRError, Lookaheads},
    lr0::{LR0Automaton, LR0Error},
    table::ParseTable,
};

#[derive(Debug, Default, Clone)]
pub struct Config {
    expected_conflicts: Option<usize>,
}

impl Config {
    pub const fn new() -> Self {
        Self {
            expected_conflicts: None,
        }
    }

    /// Declare the number of shift/reduce conflicts the grammar is known to have.
    pub fn expect_conflicts(&mut self, n: usize) -> &mut Self {
        self.expected_conflicts = Some(n);
        self
    }

    pub fn generate(&self, g: &Grammar) -> Result<Tables, Error> {
        generate(g, self)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    LR0(#[from] LR0Error),

    #[error(transparent)]
    LALR(#[from] LALRError),
}

/// The outputs of every stage of the construction.
#[derive(Debug)]
pub struct Tables {
    pub automaton: LR0Automaton,
    /// The look-ahead sets after conflict resolution.
    pub lookaheads: Lookaheads,
    pub conflicts: Conflicts,
    pub summary: ConflictSummary,
    pub table: ParseTable,
    pub expectation: Expectation,
}

/// Construct the LALR(1) parse table of `g`.
///
/// Conflicts are not errors; they are reported through [`Tables::summary`]
/// and compared against [`Config::expect_conflicts`].
#[tracing::instrument(skip_all)]
pub fn generate(g: &Grammar, config: &Config) -> Result<Tables, Error> {
    let nullable = nullable::nullable(g);
    let derives = derives::derives(g);
    let automaton = lr0::lr0(g, &derives)?;
    let mut lookaheads = lalr::lalr(g, &automaton, &nullable, &derives)?.lookaheads;
    let conflicts = conflicts::resolve(g, &automaton, &mut lookaheads);
    let summary = ConflictSummary::new(g, &automaton, &lookaheads, &conflicts);
    let table = table::generate(g, &automaton, &lookaheads, &conflicts);

    let expectation = summary.expectation(config.expected_conflicts);
    if !summary.is_empty() {
        tracing::debug!("{}", summary);
    }
    if let Expectation::Unmet {
        expected,
        found,
        reduce_reduce,
    } = expectation
    {
        tracing::warn!(
            "expected {} shift/reduce conflicts, found {} ({} reduce/reduce)",
            expected,
            found,
            reduce_reduce
        );
    }

    Ok(Tables {
        automaton,
        lookaheads,
        conflicts,
        summary,
        table,
        expectation,
    })
}
