//! Grammar for Vesper-16 assembly source, built on the combinator engine.
//!
//! Submodules hold the expression state machines, the per-shape instruction
//! parsers, and the data/constant/structure directives. This module owns the
//! shared token parsers and the top-level program parser.

mod directive;
mod expr;
mod instr;

use lazy_static::lazy_static;
use regex::Regex;

use crate::ast::{Expr, Op, Stmt};
use crate::isa::Reg;
use crate::parse::{choice, literal, matching, possibly, symbol, ParseError, Parser};

lazy_static! {
    static ref RE_WHITESPACE: Regex = Regex::new(r"^\s+").unwrap();
    static ref RE_IDENT: Regex = Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*").unwrap();
    static ref RE_HEX: Regex = Regex::new(r"^[0-9A-Fa-f]+").unwrap();
    static ref RE_LINE: Regex = Regex::new(r"^[^\n]+").unwrap();
}

/// Parse a complete program into its statement list. Strict: trailing
/// garbage is a syntax error.
pub fn parse_program(src: &str) -> Result<Vec<Stmt>, ParseError> {
    program().run(src)
}

fn program() -> Parser<Vec<Stmt>> {
    Parser::new(|input| {
        let (_, mut rest) = opt_whitespace().parse(input)?;
        let stmt = choice(vec![
            instr::instruction().map(Some),
            label().map(Some),
            directive::data8().map(Some),
            directive::data16().map(Some),
            directive::constant().map(Some),
            directive::structure().map(Some),
            comment().map(|_| None),
        ]);
        let mut stmts = Vec::new();
        while let Ok((parsed, next)) = stmt.parse(rest) {
            if let Some(s) = parsed {
                stmts.push(s);
            }
            rest = next;
        }
        Ok((stmts, rest))
    })
}

/// `name:` position marker, trailing whitespace consumed.
fn label() -> Parser<Stmt> {
    Parser::new(|input| {
        let (name, rest) = identifier().parse(input)?;
        let (_, rest) = symbol(':').parse(rest)?;
        let (_, rest) = opt_whitespace().parse(rest)?;
        Ok((Stmt::Label(name), rest))
    })
}

pub(crate) fn whitespace() -> Parser<String> {
    matching(&RE_WHITESPACE, "whitespace")
}

pub(crate) fn opt_whitespace() -> Parser<Option<String>> {
    possibly(whitespace())
}

pub(crate) fn identifier() -> Parser<String> {
    matching(&RE_IDENT, "an identifier")
}

/// Matches the given word in all-upper or all-lower case.
pub(crate) fn upper_or_lower(word: &str) -> Parser<String> {
    choice(vec![
        literal(word.to_uppercase()),
        literal(word.to_lowercase()),
    ])
}

/// A register label, upper or lower case.
pub(crate) fn register() -> Parser<Reg> {
    let alternatives = Reg::ALL
        .iter()
        .map(|&reg| upper_or_lower(reg.label()).map(move |_| reg))
        .collect();
    choice(alternatives).expected("a register")
}

/// Raw hex digits folded into a u16 with wraparound.
pub(crate) fn hex_value() -> Parser<u16> {
    matching(&RE_HEX, "a hex value").map(|digits| {
        digits.bytes().fold(0u16, |acc, b| {
            let nibble = match b {
                b'0'..=b'9' => b - b'0',
                b'a'..=b'f' => b - b'a' + 10,
                _ => b - b'A' + 10,
            };
            acc.wrapping_mul(16).wrapping_add(nibble as u16)
        })
    })
}

/// `$ABCD` immediate literal.
pub(crate) fn hex_literal() -> Parser<Expr> {
    symbol('$')
        .and_then(|_| hex_value())
        .map(Expr::Literal)
        .expected("a hex literal")
}

/// `!name` symbolic reference.
pub(crate) fn variable() -> Parser<Expr> {
    symbol('!')
        .and_then(|_| identifier())
        .map(Expr::Variable)
        .expected("a variable")
}

/// `<Struct> sym.member` structure member access.
pub(crate) fn interpreted() -> Parser<Expr> {
    Parser::new(|input| {
        let (_, rest) = symbol('<').parse(input)?;
        let (structure, rest) = identifier().parse(rest)?;
        let (_, rest) = symbol('>').parse(rest)?;
        let (_, rest) = opt_whitespace().parse(rest)?;
        let (sym, rest) = identifier().parse(rest)?;
        let (_, rest) = symbol('.').parse(rest)?;
        let (member, rest) = identifier().parse(rest)?;
        let (_, rest) = opt_whitespace().parse(rest)?;
        Ok((
            Expr::Interpreted {
                structure,
                symbol: sym,
                member,
            },
            rest,
        ))
    })
}

/// `+`, `-`, or `*`.
pub(crate) fn operator() -> Parser<Op> {
    choice(vec![
        symbol('+').map(|_| Op::Plus),
        symbol('-').map(|_| Op::Minus),
        symbol('*').map(|_| Op::Multiply),
    ])
}

/// Comma optionally surrounded by whitespace.
pub(crate) fn comma() -> Parser<()> {
    Parser::new(|input| {
        let (_, rest) = opt_whitespace().parse(input)?;
        let (_, rest) = symbol(',').parse(rest)?;
        let (_, rest) = opt_whitespace().parse(rest)?;
        Ok(((), rest))
    })
}

/// `; …` to end of line, swallowing the newline and following whitespace.
pub(crate) fn comment() -> Parser<()> {
    Parser::new(|input| {
        let (_, rest) = symbol(';').parse(input)?;
        let (_, rest) = possibly(matching(&RE_LINE, "comment text")).parse(rest)?;
        let (_, rest) = opt_whitespace().parse(rest)?;
        Ok(((), rest))
    })
}

/// Trailing run of every statement: whitespace, then an optional comment.
pub(crate) fn statement_end() -> Parser<()> {
    Parser::new(|input| {
        let (_, rest) = opt_whitespace().parse(input)?;
        let (_, rest) = possibly(comment()).parse(rest)?;
        Ok(((), rest))
    })
}
