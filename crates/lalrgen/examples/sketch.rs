use lalrgen::{
    grammar::{Assoc, Grammar, SymbolID::*},
    Config,
};

fn main() -> anyhow::Result<()> {
    // A = E '=' E | ID
    // E = E '+' T | T
    // T = NUM | ID
    #[allow(nonstandard_style)]
    let grammar = Grammar::define(|def| {
        let prec_plus = def.precedence(Assoc::Left);

        let t_ident = def.terminal("ID", None)?;
        let t_num = def.terminal("NUM", None)?;
        let t_plus = def.terminal("PLUS", Some(prec_plus))?;
        let t_equal = def.terminal("EQUAL", None)?;

        let e_A = def.nonterminal("A")?;
        let e_E = def.nonterminal("E")?;
        let e_T = def.nonterminal("T")?;

        def.rule(e_A, [N(e_E), T(t_equal), N(e_E)], None)?;
        def.rule(e_A, [T(t_ident)], None)?;
        def.rule(e_E, [N(e_E), T(t_plus), N(e_T)], None)?;
        def.rule(e_E, [N(e_T)], None)?;
        def.rule(e_T, [T(t_num)], None)?;
        def.rule(e_T, [T(t_ident)], None)?;

        def.start_symbol(e_A)?;

        Ok(())
    })?;
    println!("{}", grammar);

    let tables = Config::new().generate(&grammar)?;
    println!("{}", tables.automaton.display(&grammar));
    println!("{}", tables.table.display(&grammar));
    if !tables.summary.is_empty() {
        println!("{}", tables.summary);
    }

    Ok(())
}
