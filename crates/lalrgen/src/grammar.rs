//! Grammar types.
//!
//! A [`Grammar`] is the already-reduced input of the table construction. Besides
//! the symbol and rule tables it carries the flattened item vector: the
//! right-hand side of every rule is stored contiguously and terminated by an
//! [`RItem::End`] marker, so that an LR(0) item is just an index into that vector.

use crate::{
    types::{Map, Set},
    util::display_fn,
};
use std::{borrow::Cow, fmt};

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct TerminalID {
    raw: u16,
}

impl TerminalID {
    /// Reserved symbol used as a terminal symbol that means the end of input.
    pub const EOI: Self = Self::from_raw(0);

    /// Reserved symbol used as an error token.
    pub const ERROR: Self = Self::from_raw(1);

    const OFFSET: u16 = 2;

    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn into_raw(self) -> u16 {
        self.raw
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.raw as usize
    }
}

#[derive(Debug)]
pub struct Terminal {
    id: TerminalID,
    name: Cow<'static, str>,
    precedence: Option<Precedence>,
}

impl Terminal {
    pub fn id(&self) -> TerminalID {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn precedence(&self) -> Option<Precedence> {
        self.precedence
    }
}

impl fmt::Display for Terminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.name)
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct NonterminalID {
    raw: u16,
}

impl NonterminalID {
    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn into_raw(self) -> u16 {
        self.raw
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.raw as usize
    }
}

#[derive(Debug)]
pub struct Nonterminal {
    id: NonterminalID,
    name: Cow<'static, str>,
}

impl Nonterminal {
    pub fn id(&self) -> NonterminalID {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl fmt::Display for Nonterminal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(&self.name)
    }
}

/// A grammar symbol.
///
/// The derived ordering is the classic "symbol number" order: every terminal
/// sorts before every nonterminal.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum SymbolID {
    T(TerminalID),
    N(NonterminalID),
}

impl SymbolID {
    pub const EOI: Self = Self::T(TerminalID::EOI);

    pub fn is_terminal(self) -> bool {
        matches!(self, Self::T(..))
    }

    pub fn as_terminal(self) -> Option<TerminalID> {
        match self {
            Self::T(t) => Some(t),
            Self::N(..) => None,
        }
    }

    pub fn as_nonterminal(self) -> Option<NonterminalID> {
        match self {
            Self::T(..) => None,
            Self::N(n) => Some(n),
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct RuleID {
    raw: u16,
}

impl RuleID {
    const OFFSET: u16 = 1;

    #[inline]
    pub const fn from_raw(raw: u16) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn into_raw(self) -> u16 {
        self.raw
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.raw as usize
    }
}

/// An index into the flattened item vector of a grammar.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ItemID {
    raw: u32,
}

impl ItemID {
    #[inline]
    pub const fn from_raw(raw: u32) -> Self {
        Self { raw }
    }

    #[inline]
    pub const fn index(self) -> usize {
        self.raw as usize
    }

    /// The item with the dot moved one position to the right.
    #[inline]
    pub const fn advance(self) -> Self {
        Self { raw: self.raw + 1 }
    }

    pub fn display<'g>(self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(move |f| {
            let (rule, dot) = g.item_position(self);
            let rule = g.rule(rule);
            write!(f, "{} :", g.nonterminals[&rule.left])?;
            for (i, symbol) in rule.right.iter().enumerate() {
                if i == dot {
                    f.write_str(" .")?;
                }
                write!(f, " {}", g.symbol_display(*symbol))?;
            }
            if dot == rule.right.len() {
                f.write_str(" .")?;
            }
            Ok(())
        })
    }
}

/// An entry of the flattened item vector.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum RItem {
    /// A grammar symbol in the right-hand side of a rule.
    Symbol(SymbolID),
    /// The end of the right-hand side of the specified rule.
    End(RuleID),
}

/// The type that represents a production rule in grammar.
#[derive(Debug)]
pub struct Rule {
    id: RuleID,
    left: NonterminalID,
    right: Vec<SymbolID>,
    rhs: ItemID,
    precedence: Option<Precedence>,
    prec_symbol: Option<TerminalID>,
}

impl Rule {
    pub fn id(&self) -> RuleID {
        self.id
    }

    /// Return the left-hand side of this production.
    pub fn left(&self) -> NonterminalID {
        self.left
    }

    /// Return the right-hand side of this production.
    pub fn right(&self) -> &[SymbolID] {
        &self.right[..]
    }

    /// Return the item at the beginning of the right-hand side.
    pub fn rhs(&self) -> ItemID {
        self.rhs
    }

    /// The precedence used to resolve shift/reduce conflicts of this rule.
    pub fn precedence(&self) -> Option<Precedence> {
        self.precedence
    }

    /// The terminal symbol which the precedence of this rule is taken from.
    pub fn prec_symbol(&self) -> Option<TerminalID> {
        self.prec_symbol
    }

    // `"LHS : R1 R2 R3"`
    pub fn display<'g>(&'g self, g: &'g Grammar) -> impl fmt::Display + 'g {
        display_fn(|f| {
            write!(f, "{} :", g.nonterminals[&self.left])?;
            if self.right.is_empty() {
                f.write_str(" /* empty */")?;
            }
            for symbol in &self.right {
                write!(f, " {}", g.symbol_display(*symbol))?;
            }
            Ok(())
        })
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub struct Precedence {
    /// Precedence level, starting from 1. A larger value binds tighter.
    pub priority: u16,
    pub assoc: Assoc,
}

impl Precedence {
    pub const fn new(priority: u16, assoc: Assoc) -> Self {
        Self { priority, assoc }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Assoc {
    Left,
    Right,
    Nonassoc,
}

impl fmt::Display for Assoc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Left => write!(f, "left"),
            Self::Right => write!(f, "right"),
            Self::Nonassoc => write!(f, "nonassoc"),
        }
    }
}

/// The grammar definition used to derive the parser tables.
#[derive(Debug)]
#[non_exhaustive]
pub struct Grammar {
    pub terminals: Map<TerminalID, Terminal>,
    pub nonterminals: Map<NonterminalID, Nonterminal>,
    pub rules: Map<RuleID, Rule>,
    pub items: Vec<RItem>,
    pub start_symbol: NonterminalID,
}

impl Grammar {
    /// Define a grammar using the specified function.
    pub fn define<F>(f: F) -> Result<Self, GrammarDefError>
    where
        F: FnOnce(&mut GrammarDef) -> Result<(), GrammarDefError>,
    {
        let mut def = GrammarDef {
            terminals: Map::default(),
            nonterminals: Map::default(),
            rules: vec![],
            names: Set::default(),
            start: None,
            next_priority: 1,
        };

        def.declare_terminal(TerminalID::EOI, "$end", None);
        def.declare_terminal(TerminalID::ERROR, "error", None);

        f(&mut def)?;

        def.end()
    }

    /// The number of terminal symbols, including the reserved ones.
    pub fn ntokens(&self) -> usize {
        self.terminals.len()
    }

    /// The number of nonterminal symbols.
    pub fn nvars(&self) -> usize {
        self.nonterminals.len()
    }

    pub fn nrules(&self) -> usize {
        self.rules.len()
    }

    pub fn rule(&self, id: RuleID) -> &Rule {
        &self.rules[&id]
    }

    pub fn item(&self, id: ItemID) -> RItem {
        self.items[id.index()]
    }

    /// Return the rule that `item` belongs to and the position of its dot.
    pub fn item_position(&self, item: ItemID) -> (RuleID, usize) {
        let rule = self.items[item.index()..]
            .iter()
            .find_map(|entry| match entry {
                RItem::End(rule) => Some(*rule),
                RItem::Symbol(..) => None,
            })
            .expect("the item vector must be terminated by a rule end");
        (rule, item.index() - self.rule(rule).rhs.index())
    }

    /// The length of the longest right-hand side.
    pub fn max_rhs(&self) -> usize {
        self.rules
            .values()
            .map(|rule| rule.right.len())
            .max()
            .unwrap_or(0)
    }

    pub fn symbol_display(&self, symbol: SymbolID) -> impl fmt::Display + '_ {
        display_fn(move |f| match symbol {
            SymbolID::T(t) => write!(f, "{}", self.terminals[&t]),
            SymbolID::N(n) => write!(f, "{}", self.nonterminals[&n]),
        })
    }
}

impl fmt::Display for Grammar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "## terminals:")?;
        for terminal in self.terminals.values() {
            write!(f, "{}", terminal)?;
            if let Some(prec) = terminal.precedence() {
                write!(f, " (priority={}, assoc={})", prec.priority, prec.assoc)?;
            }
            writeln!(f)?;
        }

        writeln!(f, "\n## nonterminals:")?;
        for nonterminal in self.nonterminals.values() {
            write!(f, "{}", nonterminal)?;
            if nonterminal.id() == self.start_symbol {
                write!(f, " (start)")?;
            }
            writeln!(f)?;
        }

        writeln!(f, "\n## rules:")?;
        for rule in self.rules.values() {
            write!(f, "{:>3}: {}", rule.id.raw, rule.display(self))?;
            if let Some(prec) = &rule.precedence {
                write!(f, " (priority={}, assoc={})", prec.priority, prec.assoc)?;
            }
            writeln!(f)?;
        }

        Ok(())
    }
}

struct RuleDef {
    left: NonterminalID,
    right: Vec<SymbolID>,
    prec: Option<TerminalID>,
}

/// The contextural values for building a `Grammar`.
pub struct GrammarDef {
    terminals: Map<TerminalID, Terminal>,
    nonterminals: Map<NonterminalID, Nonterminal>,
    rules: Vec<RuleDef>,
    names: Set<Cow<'static, str>>,
    start: Option<NonterminalID>,
    next_priority: u16,
}

impl GrammarDef {
    fn declare_terminal(
        &mut self,
        id: TerminalID,
        name: impl Into<Cow<'static, str>>,
        precedence: Option<Precedence>,
    ) {
        let name = name.into();
        self.names.insert(name.clone());
        self.terminals.insert(
            id,
            Terminal {
                id,
                name,
                precedence,
            },
        );
    }

    fn check_name(&self, name: &str) -> Result<(), GrammarDefError> {
        if self.names.contains(name) {
            return Err(GrammarDefError::DuplicatedSymbol { name: name.into() });
        }
        if self.terminals.len() + self.nonterminals.len() >= u16::MAX as usize {
            return Err(GrammarDefError::TooMany {
                kind: "symbols",
                limit: u16::MAX as usize,
            });
        }
        Ok(())
    }

    /// Declare a new precedence level, binding tighter than all previous ones.
    pub fn precedence(&mut self, assoc: Assoc) -> Precedence {
        let prec = Precedence::new(self.next_priority, assoc);
        self.next_priority += 1;
        prec
    }

    /// Declare a terminal symbol used in this grammar.
    pub fn terminal(
        &mut self,
        name: impl Into<Cow<'static, str>>,
        precedence: Option<Precedence>,
    ) -> Result<TerminalID, GrammarDefError> {
        let name = name.into();
        self.check_name(&name)?;
        let id = TerminalID::from_raw(self.terminals.len() as u16);
        debug_assert!(id.raw >= TerminalID::OFFSET);
        self.declare_terminal(id, name, precedence);
        Ok(id)
    }

    /// Declare a nonterminal symbol used in this grammar.
    pub fn nonterminal(
        &mut self,
        name: impl Into<Cow<'static, str>>,
    ) -> Result<NonterminalID, GrammarDefError> {
        let name = name.into();
        self.check_name(&name)?;
        let id = NonterminalID::from_raw(self.nonterminals.len() as u16);
        self.names.insert(name.clone());
        self.nonterminals.insert(id, Nonterminal { id, name });
        Ok(id)
    }

    /// Specify a production rule into this grammar.
    ///
    /// `prec` overrides the precedence of the rule, which otherwise is that of
    /// the last terminal symbol in `right`.
    pub fn rule<I>(
        &mut self,
        left: NonterminalID,
        right: I,
        prec: Option<TerminalID>,
    ) -> Result<RuleID, GrammarDefError>
    where
        I: IntoIterator<Item = SymbolID>,
    {
        let right: Vec<_> = right.into_iter().collect();
        if right.contains(&SymbolID::EOI) {
            return Err(GrammarDefError::EndOfInputInRule);
        }
        if self
            .rules
            .iter()
            .any(|rule| rule.left == left && rule.right == right)
        {
            tracing::warn!(
                "duplicate production rule detected for `{}'",
                self.nonterminals[&left]
            );
        }
        if self.rules.len() >= i16::MAX as usize - 1 {
            return Err(GrammarDefError::TooMany {
                kind: "rules",
                limit: i16::MAX as usize - 1,
            });
        }

        self.rules.push(RuleDef { left, right, prec });
        Ok(RuleID::from_raw(
            RuleID::OFFSET + self.rules.len() as u16 - 1,
        ))
    }

    /// Specify the start symbol for this grammar.
    pub fn start_symbol(&mut self, symbol: NonterminalID) -> Result<(), GrammarDefError> {
        self.start.replace(symbol);
        Ok(())
    }

    fn end(self) -> Result<Grammar, GrammarDefError> {
        // Without an explicit declaration, the left-hand side of the first rule starts the grammar.
        let start_symbol = match self.start {
            Some(start) => start,
            None => self
                .rules
                .first()
                .map(|rule| rule.left)
                .ok_or(GrammarDefError::MissingStartSymbol)?,
        };
        if self.rules.iter().all(|rule| rule.left != start_symbol) {
            return Err(GrammarDefError::StartSymbolWithoutRules {
                name: self.nonterminals[&start_symbol].name.to_string(),
            });
        }
        for nonterminal in self.nonterminals.values() {
            if self.rules.iter().all(|rule| rule.left != nonterminal.id) {
                tracing::warn!(
                    "the nonterminal `{}' has no associated production rule",
                    nonterminal
                );
            }
        }

        let mut items = vec![];
        let mut rules = Map::default();
        for (i, def) in self.rules.into_iter().enumerate() {
            let id = RuleID::from_raw(RuleID::OFFSET + i as u16);
            let rhs = ItemID::from_raw(items.len() as u32);
            items.extend(def.right.iter().map(|symbol| RItem::Symbol(*symbol)));
            items.push(RItem::End(id));

            let prec_symbol = def.prec.or_else(|| {
                def.right
                    .iter()
                    .rev()
                    .find_map(|symbol| symbol.as_terminal())
            });
            let precedence =
                prec_symbol.and_then(|t| self.terminals.get(&t).and_then(|t| t.precedence));

            rules.insert(
                id,
                Rule {
                    id,
                    left: def.left,
                    right: def.right,
                    rhs,
                    precedence,
                    prec_symbol,
                },
            );
        }

        Ok(Grammar {
            terminals: self.terminals,
            nonterminals: self.nonterminals,
            rules,
            items,
            start_symbol,
        })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum GrammarDefError {
    #[error("the symbol `{name}' has already been declared")]
    DuplicatedSymbol { name: String },

    #[error("the end-of-input marker cannot appear in a production rule")]
    EndOfInputInRule,

    #[error("the start symbol is not specified and there are no rules")]
    MissingStartSymbol,

    #[error("the start symbol `{name}' derives no sentence")]
    StartSymbolWithoutRules { name: String },

    #[error("too many {kind} (limit = {limit})")]
    TooMany { kind: &'static str, limit: usize },
}

/// Grammars used by the tests, benchmarks and the command line tool.
pub mod examples {
    use super::*;
    use SymbolID::*;

    pub type Example = fn(&mut GrammarDef) -> Result<(), GrammarDefError>;

    /// The textbook expression grammar.
    ///
    /// ```text
    /// E : E '+' T | T
    /// T : T '*' F | F
    /// F : '(' E ')' | id
    /// ```
    pub fn arithmetic(g: &mut GrammarDef) -> Result<(), GrammarDefError> {
        let plus = g.terminal("'+'", None)?;
        let star = g.terminal("'*'", None)?;
        let lparen = g.terminal("'('", None)?;
        let rparen = g.terminal("')'", None)?;
        let id = g.terminal("id", None)?;

        let e = g.nonterminal("E")?;
        let t = g.nonterminal("T")?;
        let f = g.nonterminal("F")?;

        g.start_symbol(e)?;

        g.rule(e, [N(e), T(plus), N(t)], None)?;
        g.rule(e, [N(t)], None)?;
        g.rule(t, [N(t), T(star), N(f)], None)?;
        g.rule(t, [N(f)], None)?;
        g.rule(f, [T(lparen), N(e), T(rparen)], None)?;
        g.rule(f, [T(id)], None)?;

        Ok(())
    }

    /// `S : S S | a`, ambiguous and without any precedence.
    #[allow(nonstandard_style)]
    pub fn ambiguous(g: &mut GrammarDef) -> Result<(), GrammarDefError> {
        let a = g.terminal("a", None)?;
        let S = g.nonterminal("S")?;

        g.rule(S, [N(S), N(S)], None)?;
        g.rule(S, [T(a)], None)?;

        Ok(())
    }

    fn binary_operators(g: &mut GrammarDef, reversed: bool) -> Result<(), GrammarDefError> {
        let prec_add = g.precedence(Assoc::Left);
        let prec_mul = g.precedence(Assoc::Left);
        let prec_neg = g.precedence(Assoc::Right);

        let plus = g.terminal("'+'", Some(prec_add))?;
        let minus = g.terminal("'-'", Some(prec_add))?;
        let star = g.terminal("'*'", Some(prec_mul))?;
        let slash = g.terminal("'/'", Some(prec_mul))?;
        let uminus = g.terminal("UMINUS", Some(prec_neg))?;
        let lparen = g.terminal("'('", None)?;
        let rparen = g.terminal("')'", None)?;
        let num = g.terminal("NUM", None)?;

        let expr = g.nonterminal("expr")?;

        let mut rules = vec![
            (vec![N(expr), T(plus), N(expr)], None),
            (vec![N(expr), T(minus), N(expr)], None),
            (vec![N(expr), T(star), N(expr)], None),
            (vec![N(expr), T(slash), N(expr)], None),
            (vec![T(minus), N(expr)], Some(uminus)),
            (vec![T(lparen), N(expr), T(rparen)], None),
            (vec![T(num)], None),
        ];
        if reversed {
            rules.reverse();
        }
        for (right, prec) in rules {
            g.rule(expr, right, prec)?;
        }

        Ok(())
    }

    /// An ambiguous expression grammar disambiguated by precedence declarations.
    pub fn operators(g: &mut GrammarDef) -> Result<(), GrammarDefError> {
        binary_operators(g, false)
    }

    /// Same as [`operators`], with the rules declared in the opposite order.
    pub fn operators_reversed(g: &mut GrammarDef) -> Result<(), GrammarDefError> {
        binary_operators(g, true)
    }

    /// `E : E op E | id` where `op` has the specified associativity.
    pub fn single_operator(g: &mut GrammarDef, assoc: Assoc) -> Result<(), GrammarDefError> {
        let prec = g.precedence(assoc);
        let op = g.terminal("op", Some(prec))?;
        let id = g.terminal("id", None)?;
        let e = g.nonterminal("E")?;

        g.rule(e, [N(e), T(op), N(e)], None)?;
        g.rule(e, [T(id)], None)?;

        Ok(())
    }

    pub fn left_assoc(g: &mut GrammarDef) -> Result<(), GrammarDefError> {
        single_operator(g, Assoc::Left)
    }

    pub fn right_assoc(g: &mut GrammarDef) -> Result<(), GrammarDefError> {
        single_operator(g, Assoc::Right)
    }

    pub fn nonassoc(g: &mut GrammarDef) -> Result<(), GrammarDefError> {
        single_operator(g, Assoc::Nonassoc)
    }

    /// The dangling-else grammar, with exactly one shift/reduce conflict.
    pub fn dangling_else(g: &mut GrammarDef) -> Result<(), GrammarDefError> {
        let r#if = g.terminal("IF", None)?;
        let then = g.terminal("THEN", None)?;
        let r#else = g.terminal("ELSE", None)?;
        let cond = g.terminal("COND", None)?;
        let other = g.terminal("OTHER", None)?;

        let stmt = g.nonterminal("stmt")?;

        g.rule(stmt, [T(r#if), T(cond), T(then), N(stmt)], None)?;
        g.rule(
            stmt,
            [T(r#if), T(cond), T(then), N(stmt), T(r#else), N(stmt)],
            None,
        )?;
        g.rule(stmt, [T(other)], None)?;

        Ok(())
    }

    /// Nullable nonterminals chained through several rules.
    ///
    /// ```text
    /// expr : expr '+' opt | term
    /// term : 'a' | '(' expr opt ')' | opt 'a'
    /// opt  : chain | NUM
    /// chain : /* empty */
    /// ```
    pub fn with_nullable(g: &mut GrammarDef) -> Result<(), GrammarDefError> {
        let lparen = g.terminal("'('", None)?;
        let rparen = g.terminal("')'", None)?;
        let plus = g.terminal("'+'", None)?;
        let a = g.terminal("'a'", None)?;
        let num = g.terminal("NUM", None)?;

        let expr = g.nonterminal("expr")?;
        let term = g.nonterminal("term")?;
        let opt = g.nonterminal("opt")?;
        let chain = g.nonterminal("chain")?;

        g.rule(expr, [N(expr), T(plus), N(opt)], None)?;
        g.rule(expr, [N(term)], None)?;

        g.rule(term, [T(a)], None)?;
        g.rule(term, [T(lparen), N(expr), N(opt), T(rparen)], None)?;
        g.rule(term, [N(opt), T(a)], None)?;

        g.rule(opt, [N(chain)], None)?;
        g.rule(opt, [T(num)], None)?;
        g.rule(chain, [], None)?;

        Ok(())
    }

    /// A lookahead that is only visible by reading through a nullable nonterminal.
    ///
    /// ```text
    /// S : 'a' A B 'd'
    /// A : 'x' | 'x' 'y'
    /// B : /* empty */ | 'b'
    /// ```
    #[allow(nonstandard_style)]
    pub fn read_through_nullable(g: &mut GrammarDef) -> Result<(), GrammarDefError> {
        let a = g.terminal("a", None)?;
        let b = g.terminal("b", None)?;
        let d = g.terminal("d", None)?;
        let x = g.terminal("x", None)?;
        let y = g.terminal("y", None)?;

        let S = g.nonterminal("S")?;
        let A = g.nonterminal("A")?;
        let B = g.nonterminal("B")?;

        g.rule(S, [T(a), N(A), N(B), T(d)], None)?;
        g.rule(A, [T(x)], None)?;
        g.rule(A, [T(x), T(y)], None)?;
        g.rule(B, [], None)?;
        g.rule(B, [T(b)], None)?;

        Ok(())
    }

    /// A state that shifts the error token besides a reduction.
    ///
    /// ```text
    /// S : 'x' | 'x' error
    /// ```
    #[allow(nonstandard_style)]
    pub fn error_recovery(g: &mut GrammarDef) -> Result<(), GrammarDefError> {
        let x = g.terminal("x", None)?;
        let S = g.nonterminal("S")?;

        g.rule(S, [T(x)], None)?;
        g.rule(S, [T(x), T(TerminalID::ERROR)], None)?;

        Ok(())
    }

    /// The start symbol only derives the empty string.
    #[allow(nonstandard_style)]
    pub fn empty_language(g: &mut GrammarDef) -> Result<(), GrammarDefError> {
        let S = g.nonterminal("S")?;
        g.rule(S, [], None)?;
        Ok(())
    }

    /// An unambiguous grammar whose LALR(1) automaton has a reduce/reduce conflict.
    #[allow(nonstandard_style)]
    pub fn lalr_reduce_reduce(g: &mut GrammarDef) -> Result<(), GrammarDefError> {
        let a = g.terminal("a", None)?;
        let b = g.terminal("b", None)?;
        let c = g.terminal("c", None)?;
        let d = g.terminal("d", None)?;
        let e = g.terminal("e", None)?;

        let S = g.nonterminal("S")?;
        let A = g.nonterminal("A")?;
        let B = g.nonterminal("B")?;

        g.rule(S, [T(a), N(A), T(d)], None)?;
        g.rule(S, [T(b), N(B), T(d)], None)?;
        g.rule(S, [T(a), N(B), T(e)], None)?;
        g.rule(S, [T(b), N(A), T(e)], None)?;
        g.rule(A, [T(c)], None)?;
        g.rule(B, [T(c)], None)?;

        Ok(())
    }

    pub fn min_caml(g: &mut GrammarDef) -> Result<(), GrammarDefError> {
        let prec_let = g.precedence(Assoc::Right);
        let prec_semi = g.precedence(Assoc::Right);
        let prec_if = g.precedence(Assoc::Right);
        let prec_arrow = g.precedence(Assoc::Right);
        let prec_tuple = g.precedence(Assoc::Nonassoc);
        let prec_comma = g.precedence(Assoc::Left);
        let prec_cmp = g.precedence(Assoc::Left);
        let prec_add = g.precedence(Assoc::Left);
        let prec_mul = g.precedence(Assoc::Left);
        let prec_neg = g.precedence(Assoc::Right);
        let prec_app = g.precedence(Assoc::Left);
        let prec_dot = g.precedence(Assoc::Left);

        let lparen = g.terminal("'('", None)?;
        let rparen = g.terminal("')'", None)?;
        let r#true = g.terminal("TRUE", None)?;
        let r#false = g.terminal("FALSE", None)?;
        let not = g.terminal("NOT", Some(prec_app))?;
        let r#if = g.terminal("IF", None)?;
        let then = g.terminal("THEN", None)?;
        let r#else = g.terminal("ELSE", Some(prec_if))?;
        let r#let = g.terminal("LET", None)?;
        let rec = g.terminal("REC", None)?;
        let r#in = g.terminal("IN", Some(prec_let))?;
        let dot = g.terminal("'.'", Some(prec_dot))?;
        let less_minus = g.terminal("'<-'", Some(prec_arrow))?;
        let comma = g.terminal("','", Some(prec_comma))?;
        let semicolon = g.terminal("';'", Some(prec_semi))?;
        let array_make = g.terminal("ARRAY_MAKE", Some(prec_app))?;

        let integer = g.terminal("INT", None)?;
        let float = g.terminal("FLOAT", None)?;
        let ident = g.terminal("IDENT", None)?;

        let plus = g.terminal("'+'", Some(prec_add))?;
        let plus_dot = g.terminal("'+.'", Some(prec_add))?;
        let minus = g.terminal("'-'", Some(prec_add))?;
        let minus_dot = g.terminal("'-.'", Some(prec_add))?;
        let star_dot = g.terminal("'*.'", Some(prec_mul))?;
        let slash_dot = g.terminal("'/.'", Some(prec_mul))?;

        let equal = g.terminal("'='", Some(prec_cmp))?;
        let less_greater = g.terminal("'<>'", Some(prec_cmp))?;
        let less = g.terminal("'<'", Some(prec_cmp))?;
        let greater = g.terminal("'>'", Some(prec_cmp))?;
        let less_equal = g.terminal("'<='", Some(prec_cmp))?;
        let greater_equal = g.terminal("'>='", Some(prec_cmp))?;

        let uminus = g.terminal("UMINUS", Some(prec_neg))?;
        let app = g.terminal("APP", Some(prec_app))?;
        let tuple = g.terminal("TUPLE", Some(prec_tuple))?;

        let exp = g.nonterminal("exp")?;
        let simple_exp = g.nonterminal("simple_exp")?;
        let fundef = g.nonterminal("fundef")?;
        let formal_args = g.nonterminal("formal_args")?;
        let actual_args = g.nonterminal("actual_args")?;
        let elems = g.nonterminal("elems")?;
        let pat = g.nonterminal("pat")?;

        g.start_symbol(exp)?;

        g.rule(simple_exp, [T(lparen), N(exp), T(rparen)], None)?;
        g.rule(simple_exp, [T(lparen), T(rparen)], None)?;
        g.rule(simple_exp, [T(r#true)], None)?;
        g.rule(simple_exp, [T(r#false)], None)?;
        g.rule(simple_exp, [T(integer)], None)?;
        g.rule(simple_exp, [T(float)], None)?;
        g.rule(simple_exp, [T(ident)], None)?;
        g.rule(
            simple_exp,
            [N(simple_exp), T(dot), T(lparen), N(exp), T(rparen)],
            None,
        )?;

        g.rule(exp, [N(simple_exp)], None)?;
        g.rule(exp, [T(not), N(exp)], None)?;
        g.rule(exp, [T(minus), N(exp)], Some(uminus))?;
        g.rule(exp, [T(minus_dot), N(exp)], Some(uminus))?;
        for op in [
            plus,
            minus,
            plus_dot,
            minus_dot,
            star_dot,
            slash_dot,
            equal,
            less_greater,
            less,
            greater,
            less_equal,
            greater_equal,
        ] {
            g.rule(exp, [N(exp), T(op), N(exp)], None)?;
        }
        g.rule(
            exp,
            [T(r#if), N(exp), T(then), N(exp), T(r#else), N(exp)],
            None,
        )?;
        g.rule(
            exp,
            [T(r#let), T(ident), T(equal), N(exp), T(r#in), N(exp)],
            None,
        )?;
        g.rule(exp, [T(r#let), T(rec), N(fundef), T(r#in), N(exp)], None)?;
        g.rule(
            exp,
            [
                T(r#let),
                T(lparen),
                N(pat),
                T(rparen),
                T(equal),
                N(exp),
                T(r#in),
                N(exp),
            ],
            None,
        )?;
        g.rule(exp, [N(simple_exp), N(actual_args)], Some(app))?;
        g.rule(exp, [N(elems)], Some(tuple))?;
        g.rule(
            exp,
            [
                N(simple_exp),
                T(dot),
                T(lparen),
                N(exp),
                T(rparen),
                T(less_minus),
                N(exp),
            ],
            None,
        )?;
        g.rule(exp, [N(exp), T(semicolon), N(exp)], None)?;
        g.rule(
            exp,
            [T(array_make), N(simple_exp), N(simple_exp)],
            Some(app),
        )?;

        g.rule(fundef, [T(ident), N(formal_args), T(equal), N(exp)], None)?;

        g.rule(formal_args, [T(ident), N(formal_args)], None)?;
        g.rule(formal_args, [T(ident)], None)?;

        g.rule(actual_args, [N(actual_args), N(simple_exp)], Some(app))?;
        g.rule(actual_args, [N(simple_exp)], Some(app))?;

        g.rule(elems, [N(elems), T(comma), N(exp)], None)?;
        g.rule(elems, [N(exp), T(comma), N(exp)], None)?;

        g.rule(pat, [N(pat), T(comma), T(ident)], None)?;
        g.rule(pat, [T(ident), T(comma), T(ident)], None)?;

        Ok(())
    }

    /// All example grammars with their names.
    pub const ALL: &[(&str, Example)] = &[
        ("arithmetic", arithmetic),
        ("ambiguous", ambiguous),
        ("operators", operators),
        ("operators_reversed", operators_reversed),
        ("left_assoc", left_assoc),
        ("right_assoc", right_assoc),
        ("nonassoc", nonassoc),
        ("dangling_else", dangling_else),
        ("with_nullable", with_nullable),
        ("read_through_nullable", read_through_nullable),
        ("error_recovery", error_recovery),
        ("empty_language", empty_language),
        ("lalr_reduce_reduce", lalr_reduce_reduce),
        ("min_caml", min_caml),
    ];
}

#[cfg(test)]
mod tests {
    use super::*;
    use SymbolID::*;

    #[test]
    fn flattened_items() {
        let g = Grammar::define(examples::arithmetic).unwrap();
        assert_eq!(g.ntokens(), 7);
        assert_eq!(g.nvars(), 3);
        assert_eq!(g.nrules(), 6);
        assert_eq!(g.items.len(), 18);

        // E : E '+' T
        let rule1 = g.rule(RuleID::from_raw(1));
        assert_eq!(rule1.rhs(), ItemID::from_raw(0));
        assert_eq!(
            g.item(ItemID::from_raw(3)),
            RItem::End(RuleID::from_raw(1))
        );
        // E : T
        assert_eq!(g.rule(RuleID::from_raw(2)).rhs(), ItemID::from_raw(4));
        assert_eq!(
            g.item_position(ItemID::from_raw(5)),
            (RuleID::from_raw(2), 1)
        );
        assert_eq!(g.max_rhs(), 3);
    }

    #[test]
    fn symbol_order_places_terminals_first() {
        let t = T(TerminalID::from_raw(100));
        let n = N(NonterminalID::from_raw(0));
        assert!(t < n);
        assert!(SymbolID::EOI < t);
    }

    #[test]
    fn rule_precedence_defaults_to_last_terminal() {
        let g = Grammar::define(examples::operators).unwrap();
        let prec_of = |i: u16| g.rule(RuleID::from_raw(i)).precedence();
        // expr '+' expr
        assert_eq!(prec_of(1).map(|p| p.priority), Some(1));
        // expr '*' expr
        assert_eq!(prec_of(3).map(|p| p.priority), Some(2));
        // '-' expr %prec UMINUS
        assert_eq!(prec_of(5).map(|p| p.priority), Some(3));
        assert_eq!(prec_of(5).map(|p| p.assoc), Some(Assoc::Right));
        // '(' expr ')' takes the precedence of ')', which has none.
        assert_eq!(prec_of(6), None);
        assert_eq!(
            g.rule(RuleID::from_raw(6)).prec_symbol().map(|t| g.terminals[&t].name().to_owned()),
            Some("')'".to_owned())
        );
    }

    #[test]
    fn start_symbol_defaults_to_first_rule() {
        let g = Grammar::define(examples::ambiguous).unwrap();
        assert_eq!(g.start_symbol, NonterminalID::from_raw(0));
    }

    #[test]
    fn rejects_invalid_definitions() {
        let err = Grammar::define(|g| {
            g.terminal("a", None)?;
            g.terminal("a", None)?;
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(err, GrammarDefError::DuplicatedSymbol { .. }));

        let err = Grammar::define(|g| {
            let s = g.nonterminal("S")?;
            g.rule(s, [T(TerminalID::EOI)], None)?;
            Ok(())
        })
        .unwrap_err();
        assert!(matches!(err, GrammarDefError::EndOfInputInRule));

        let err = Grammar::define(|g| {
            let s = g.nonterminal("S")?;
            let a = g.nonterminal("A")?;
            g.rule(a, [], None)?;
            g.start_symbol(s)
        })
        .unwrap_err();
        assert!(matches!(err, GrammarDefError::StartSymbolWithoutRules { .. }));

        let err = Grammar::define(|_| Ok(())).unwrap_err();
        assert!(matches!(err, GrammarDefError::MissingStartSymbol));
    }

    #[test]
    fn item_display() {
        let g = Grammar::define(examples::arithmetic).unwrap();
        assert_eq!(
            ItemID::from_raw(1).display(&g).to_string(),
            "E : E . '+' T"
        );
        assert_eq!(ItemID::from_raw(17).display(&g).to_string(), "F : id .");
    }
}
