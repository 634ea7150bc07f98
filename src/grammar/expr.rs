//! Bracketed-expression state machines and operator precedence resolution.
//!
//! Expressions arrive as flat element/operator runs; the parenthesised form
//! may nest. Both machines produce a fully resolved [`Expr`] tree so the
//! rest of the pipeline never sees a flat list.

use crate::ast::{Expr, Op};
use crate::parse::{choice, symbol, ParseError, Parser};

use super::{hex_literal, interpreted, operator, opt_whitespace, variable};

/// A literal, variable, or structure member access. Registers are not legal
/// inside expressions.
fn expression_element() -> Parser<Expr> {
    choice(vec![hex_literal(), variable(), interpreted()])
}

/// Accumulates one flat expression run: a first element, then operator and
/// element pairs. Alternation is enforced by the state machines driving it.
#[derive(Default)]
struct Run {
    first: Option<Expr>,
    tail: Vec<(Op, Expr)>,
    pending_op: Option<Op>,
}

impl Run {
    fn push_element(&mut self, element: Expr) {
        match (&self.first, self.pending_op.take()) {
            (None, _) => self.first = Some(element),
            (Some(_), Some(op)) => self.tail.push((op, element)),
            // The driving state machines never emit two elements in a row.
            (Some(_), None) => unreachable!("expression element without an operator before it"),
        }
    }

    fn push_operator(&mut self, op: Op) {
        self.pending_op = Some(op);
    }

    fn collapse(self, at: usize) -> Result<Expr, ParseError> {
        match self.first {
            Some(first) => Ok(fold_precedence(first, self.tail)),
            None => Err(ParseError {
                at,
                message: "empty expression".to_string(),
            }),
        }
    }
}

/// Collapse a flat run into a tree of binary operations. The highest
/// priority operator binds first; on ties the leftmost occurrence wins. A
/// run with no operators collapses to its single element.
pub(super) fn fold_precedence(first: Expr, tail: Vec<(Op, Expr)>) -> Expr {
    if tail.is_empty() {
        return first;
    }

    let mut elements = Vec::with_capacity(tail.len() + 1);
    let mut ops = Vec::with_capacity(tail.len());
    elements.push(first);
    for (op, element) in tail {
        ops.push(op);
        elements.push(element);
    }

    while ops.len() > 1 {
        let mut best = 0;
        for i in 1..ops.len() {
            if ops[i].priority() > ops[best].priority() {
                best = i;
            }
        }
        let op = ops.remove(best);
        let rhs = elements.remove(best + 1);
        let lhs = elements.remove(best);
        elements.insert(
            best,
            Expr::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            },
        );
    }

    let op = ops.remove(0);
    let rhs = elements.remove(1);
    let lhs = elements.remove(0);
    Expr::Binary {
        op,
        lhs: Box::new(lhs),
        rhs: Box::new(rhs),
    }
}

/// `( … )` expression with arbitrary nesting, driven by a four-state
/// machine. Trailing whitespace after the final `)` is left for the caller.
pub(super) fn bracketed_expr() -> Parser<Expr> {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        OpenBracket,
        OperatorOrClosingBracket,
        ElementOrOpeningBracket,
        CloseBracket,
    }

    Parser::new(|input| {
        let (_, start) = symbol('(').parse(input)?;
        let (_, mut rest) = opt_whitespace().parse(start)?;

        let mut current = Run::default();
        let mut parents: Vec<Run> = Vec::new();
        let mut state = State::ElementOrOpeningBracket;

        loop {
            let next = rest.rest().chars().next();
            match state {
                State::OpenBracket => {
                    let (_, r) = symbol('(').parse(rest)?;
                    let (_, r) = opt_whitespace().parse(r)?;
                    rest = r;
                    parents.push(std::mem::take(&mut current));
                    state = State::ElementOrOpeningBracket;
                }

                State::OperatorOrClosingBracket => {
                    if next == Some(')') {
                        state = State::CloseBracket;
                        continue;
                    }
                    let (op, r) = operator().parse(rest)?;
                    let (_, r) = opt_whitespace().parse(r)?;
                    rest = r;
                    current.push_operator(op);
                    state = State::ElementOrOpeningBracket;
                }

                State::ElementOrOpeningBracket => {
                    if next == Some(')') {
                        return Err(ParseError {
                            at: rest.at(),
                            message: "unexpected end of expression".to_string(),
                        });
                    }
                    if next == Some('(') {
                        state = State::OpenBracket;
                        continue;
                    }
                    let (element, r) = expression_element().parse(rest)?;
                    let (_, r) = opt_whitespace().parse(r)?;
                    rest = r;
                    current.push_element(element);
                    state = State::OperatorOrClosingBracket;
                }

                State::CloseBracket => {
                    let (_, r) = symbol(')').parse(rest)?;
                    rest = r;
                    let closed = std::mem::take(&mut current).collapse(rest.at())?;
                    match parents.pop() {
                        Some(parent) => {
                            current = parent;
                            current.push_element(closed);
                            let (_, r) = opt_whitespace().parse(rest)?;
                            rest = r;
                            state = State::OperatorOrClosingBracket;
                        }
                        None => return Ok((closed, rest)),
                    }
                }
            }
        }
    })
}

/// `[ … ]` expression, the form instructions embed. Elements may themselves
/// be parenthesised expressions. Two states: expect an element, then expect
/// an operator or the closing bracket. Consumes trailing whitespace.
pub(crate) fn square_bracket_expr() -> Parser<Expr> {
    #[derive(Clone, Copy, PartialEq)]
    enum State {
        ExpectElement,
        ExpectOperator,
    }

    Parser::new(|input| {
        let (_, start) = symbol('[').parse(input)?;
        let (_, mut rest) = opt_whitespace().parse(start)?;

        let mut run = Run::default();
        let mut state = State::ExpectElement;

        loop {
            match state {
                State::ExpectElement => {
                    let element = choice(vec![bracketed_expr(), expression_element()]);
                    let (e, r) = element.parse(rest)?;
                    let (_, r) = opt_whitespace().parse(r)?;
                    rest = r;
                    run.push_element(e);
                    state = State::ExpectOperator;
                }

                State::ExpectOperator => {
                    if rest.rest().starts_with(']') {
                        let (_, r) = symbol(']').parse(rest)?;
                        let (_, r) = opt_whitespace().parse(r)?;
                        let expr = run.collapse(r.at())?;
                        return Ok((expr, r));
                    }
                    let (op, r) = operator().parse(rest)?;
                    let (_, r) = opt_whitespace().parse(r)?;
                    rest = r;
                    run.push_operator(op);
                    state = State::ExpectElement;
                }
            }
        }
    })
}
