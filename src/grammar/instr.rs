//! Instruction statement parsers: one builder per operand shape, composed
//! per mnemonic in a fixed preference order.

use crate::ast::{Expr, Operand, Stmt};
use crate::parse::{choice, symbol, Parser};

use super::expr::square_bracket_expr;
use super::{comma, hex_literal, hex_value, register, statement_end, upper_or_lower, whitespace};

/// Top-level instruction parser: every mnemonic, each trying its shapes in
/// preference order.
pub(super) fn instruction() -> Parser<Stmt> {
    use crate::isa::Opcode as O;

    let mov = choice(vec![
        reg_reg(O::MovRegReg),
        lit_reg(O::MovLitReg),
        mem_reg(O::MovMemReg),
        reg_mem(O::MovRegMem),
        lit_mem(O::MovLitMem),
        reg_ind_reg(O::MovRegIndReg),
        lit_off_reg(O::MovLitOffReg),
    ]);
    let add = choice(vec![reg_reg(O::AddRegReg), lit_reg(O::AddLitReg)]);
    let sub = choice(vec![
        reg_reg(O::SubRegReg),
        reg_lit(O::SubRegLit),
        lit_reg(O::SubLitReg),
    ]);
    let mul = choice(vec![reg_reg(O::MulRegReg), lit_reg(O::MulLitReg)]);
    let and = choice(vec![reg_reg(O::AndRegReg), reg_lit(O::AndRegLit)]);
    let or = choice(vec![reg_reg(O::OrRegReg), reg_lit(O::OrRegLit)]);
    let xor = choice(vec![reg_reg(O::XorRegReg), reg_lit(O::XorRegLit)]);
    let lsl = choice(vec![reg_reg(O::LslRegReg), reg_lit(O::LslRegLit)]);
    let lsr = choice(vec![reg_reg(O::LsrRegReg), reg_lit(O::LsrRegLit)]);

    let jne = choice(vec![reg_mem(O::JneReg), lit_mem(O::JneLit)]);
    let jeq = choice(vec![reg_mem(O::JeqReg), lit_mem(O::JeqLit)]);
    let jlt = choice(vec![reg_mem(O::JltReg), lit_mem(O::JltLit)]);
    let jgt = choice(vec![reg_mem(O::JgtReg), lit_mem(O::JgtLit)]);
    let jle = choice(vec![reg_mem(O::JleReg), lit_mem(O::JleLit)]);
    let jge = choice(vec![reg_mem(O::JgeReg), lit_mem(O::JgeLit)]);

    let psh = choice(vec![single_lit(O::PshLit), single_reg(O::PshReg)]);
    let cal = choice(vec![single_lit(O::CalLit), single_reg(O::CalReg)]);

    choice(vec![
        mov,
        add,
        sub,
        mul,
        or,
        and,
        xor,
        single_reg(O::NotReg),
        lsl,
        lsr,
        single_reg(O::IncReg),
        single_reg(O::DecReg),
        jne,
        jeq,
        jlt,
        jgt,
        jle,
        jge,
        psh,
        single_reg(O::PopReg),
        cal,
        no_args(O::Ret),
        no_args(O::Rti),
        single_lit(O::Int),
        no_args(O::Hlt),
    ])
}

/// Mnemonic in upper or lower case, followed by mandatory whitespace.
fn mnemonic(opcode: crate::isa::Opcode) -> Parser<()> {
    let word = upper_or_lower(opcode.mnemonic().as_str());
    Parser::new(move |input| {
        let (_, rest) = word.parse(input)?;
        let (_, rest) = whitespace().parse(rest)?;
        Ok(((), rest))
    })
}

/// `$…` literal or `[…]` expression.
fn lit_operand() -> Parser<Expr> {
    choice(vec![hex_literal(), square_bracket_expr()])
}

/// `&…` address or `&[…]` computed address.
fn mem_operand() -> Parser<Expr> {
    choice(vec![
        symbol('&').and_then(|_| hex_value()).map(Expr::Literal),
        symbol('&').and_then(|_| square_bracket_expr()),
    ])
}

/// `&reg` register-indirect address.
fn ind_register() -> Parser<crate::isa::Reg> {
    symbol('&').and_then(|_| register())
}

fn stmt(opcode: crate::isa::Opcode, operands: Vec<Operand>) -> Stmt {
    Stmt::Instruction { opcode, operands }
}

fn lit_reg(opcode: crate::isa::Opcode) -> Parser<Stmt> {
    Parser::new(move |input| {
        let (_, rest) = mnemonic(opcode).parse(input)?;
        let (lit, rest) = lit_operand().parse(rest)?;
        let (_, rest) = comma().parse(rest)?;
        let (reg, rest) = register().parse(rest)?;
        let (_, rest) = statement_end().parse(rest)?;
        let operands = vec![Operand::Literal(lit), Operand::Register(reg)];
        Ok((stmt(opcode, operands), rest))
    })
}

fn reg_lit(opcode: crate::isa::Opcode) -> Parser<Stmt> {
    Parser::new(move |input| {
        let (_, rest) = mnemonic(opcode).parse(input)?;
        let (reg, rest) = register().parse(rest)?;
        let (_, rest) = comma().parse(rest)?;
        let (lit, rest) = lit_operand().parse(rest)?;
        let (_, rest) = statement_end().parse(rest)?;
        let operands = vec![Operand::Register(reg), Operand::Literal(lit)];
        Ok((stmt(opcode, operands), rest))
    })
}

fn reg_reg(opcode: crate::isa::Opcode) -> Parser<Stmt> {
    Parser::new(move |input| {
        let (_, rest) = mnemonic(opcode).parse(input)?;
        let (r1, rest) = register().parse(rest)?;
        let (_, rest) = comma().parse(rest)?;
        let (r2, rest) = register().parse(rest)?;
        let (_, rest) = statement_end().parse(rest)?;
        let operands = vec![Operand::Register(r1), Operand::Register(r2)];
        Ok((stmt(opcode, operands), rest))
    })
}

fn reg_mem(opcode: crate::isa::Opcode) -> Parser<Stmt> {
    Parser::new(move |input| {
        let (_, rest) = mnemonic(opcode).parse(input)?;
        let (reg, rest) = register().parse(rest)?;
        let (_, rest) = comma().parse(rest)?;
        let (addr, rest) = mem_operand().parse(rest)?;
        let (_, rest) = statement_end().parse(rest)?;
        let operands = vec![Operand::Register(reg), Operand::Address(addr)];
        Ok((stmt(opcode, operands), rest))
    })
}

fn mem_reg(opcode: crate::isa::Opcode) -> Parser<Stmt> {
    Parser::new(move |input| {
        let (_, rest) = mnemonic(opcode).parse(input)?;
        let (addr, rest) = mem_operand().parse(rest)?;
        let (_, rest) = comma().parse(rest)?;
        let (reg, rest) = register().parse(rest)?;
        let (_, rest) = statement_end().parse(rest)?;
        let operands = vec![Operand::Address(addr), Operand::Register(reg)];
        Ok((stmt(opcode, operands), rest))
    })
}

fn lit_mem(opcode: crate::isa::Opcode) -> Parser<Stmt> {
    Parser::new(move |input| {
        let (_, rest) = mnemonic(opcode).parse(input)?;
        let (lit, rest) = lit_operand().parse(rest)?;
        let (_, rest) = comma().parse(rest)?;
        let (addr, rest) = mem_operand().parse(rest)?;
        let (_, rest) = statement_end().parse(rest)?;
        let operands = vec![Operand::Literal(lit), Operand::Address(addr)];
        Ok((stmt(opcode, operands), rest))
    })
}

fn reg_ind_reg(opcode: crate::isa::Opcode) -> Parser<Stmt> {
    Parser::new(move |input| {
        let (_, rest) = mnemonic(opcode).parse(input)?;
        let (base, rest) = ind_register().parse(rest)?;
        let (_, rest) = comma().parse(rest)?;
        let (dest, rest) = register().parse(rest)?;
        let (_, rest) = statement_end().parse(rest)?;
        let operands = vec![Operand::RegisterIndirect(base), Operand::Register(dest)];
        Ok((stmt(opcode, operands), rest))
    })
}

fn lit_off_reg(opcode: crate::isa::Opcode) -> Parser<Stmt> {
    Parser::new(move |input| {
        let (_, rest) = mnemonic(opcode).parse(input)?;
        let (lit, rest) = lit_operand().parse(rest)?;
        let (_, rest) = comma().parse(rest)?;
        let (base, rest) = ind_register().parse(rest)?;
        let (_, rest) = comma().parse(rest)?;
        let (dest, rest) = register().parse(rest)?;
        let (_, rest) = statement_end().parse(rest)?;
        let operands = vec![
            Operand::Literal(lit),
            Operand::RegisterIndirect(base),
            Operand::Register(dest),
        ];
        Ok((stmt(opcode, operands), rest))
    })
}

fn single_reg(opcode: crate::isa::Opcode) -> Parser<Stmt> {
    Parser::new(move |input| {
        let (_, rest) = mnemonic(opcode).parse(input)?;
        let (reg, rest) = register().parse(rest)?;
        let (_, rest) = statement_end().parse(rest)?;
        Ok((stmt(opcode, vec![Operand::Register(reg)]), rest))
    })
}

fn single_lit(opcode: crate::isa::Opcode) -> Parser<Stmt> {
    Parser::new(move |input| {
        let (_, rest) = mnemonic(opcode).parse(input)?;
        let (lit, rest) = lit_operand().parse(rest)?;
        let (_, rest) = statement_end().parse(rest)?;
        Ok((stmt(opcode, vec![Operand::Literal(lit)]), rest))
    })
}

fn no_args(opcode: crate::isa::Opcode) -> Parser<Stmt> {
    let word = upper_or_lower(opcode.mnemonic().as_str());
    Parser::new(move |input| {
        let (_, rest) = word.parse(input)?;
        let (_, rest) = statement_end().parse(rest)?;
        Ok((stmt(opcode, vec![]), rest))
    })
}

#[cfg(test)]
mod tests {
    use crate::ast::Op;
    use crate::isa::{Opcode, Reg};

    use super::*;

    fn parse(src: &str) -> (Opcode, Vec<Operand>) {
        match instruction().run(src).unwrap() {
            Stmt::Instruction { opcode, operands } => (opcode, operands),
            other => panic!("expected instruction, got {other:?}"),
        }
    }

    #[test]
    fn mov_picks_the_right_shape() {
        assert_eq!(
            parse("mov r1, r2"),
            (
                Opcode::MovRegReg,
                vec![Operand::Register(Reg::R1), Operand::Register(Reg::R2)]
            )
        );
        assert_eq!(
            parse("mov $C0DE, r2"),
            (
                Opcode::MovLitReg,
                vec![
                    Operand::Literal(Expr::Literal(0xC0DE)),
                    Operand::Register(Reg::R2)
                ]
            )
        );
        assert_eq!(
            parse("mov &C0DE, r2"),
            (
                Opcode::MovMemReg,
                vec![
                    Operand::Address(Expr::Literal(0xC0DE)),
                    Operand::Register(Reg::R2)
                ]
            )
        );
        assert_eq!(
            parse("mov r2, &C0DE"),
            (
                Opcode::MovRegMem,
                vec![
                    Operand::Register(Reg::R2),
                    Operand::Address(Expr::Literal(0xC0DE))
                ]
            )
        );
        assert_eq!(
            parse("mov $1234, &C0DE"),
            (
                Opcode::MovLitMem,
                vec![
                    Operand::Literal(Expr::Literal(0x1234)),
                    Operand::Address(Expr::Literal(0xC0DE))
                ]
            )
        );
        assert_eq!(
            parse("mov &r1, r2"),
            (
                Opcode::MovRegIndReg,
                vec![
                    Operand::RegisterIndirect(Reg::R1),
                    Operand::Register(Reg::R2)
                ]
            )
        );
        assert_eq!(
            parse("mov $45, &r5, r5"),
            (
                Opcode::MovLitOffReg,
                vec![
                    Operand::Literal(Expr::Literal(0x45)),
                    Operand::RegisterIndirect(Reg::R5),
                    Operand::Register(Reg::R5)
                ]
            )
        );
    }

    #[test]
    fn mov_accepts_expressions_where_literals_go() {
        let (opcode, operands) = parse("mov [$42 + !loc], r1");
        assert_eq!(opcode, Opcode::MovLitReg);
        assert_eq!(
            operands[0],
            Operand::Literal(Expr::Binary {
                op: Op::Plus,
                lhs: Box::new(Expr::Literal(0x42)),
                rhs: Box::new(Expr::Variable("loc".into())),
            })
        );
    }

    #[test]
    fn computed_addresses() {
        let (opcode, operands) = parse("mov &[!base + $2], r1");
        assert_eq!(opcode, Opcode::MovMemReg);
        assert_eq!(
            operands[0],
            Operand::Address(Expr::Binary {
                op: Op::Plus,
                lhs: Box::new(Expr::Variable("base".into())),
                rhs: Box::new(Expr::Literal(2)),
            })
        );
    }

    #[test]
    fn sub_distinguishes_operand_orders() {
        assert_eq!(parse("sub r1, $5").0, Opcode::SubRegLit);
        assert_eq!(parse("sub $5, r1").0, Opcode::SubLitReg);
        assert_eq!(parse("sub r1, r2").0, Opcode::SubRegReg);
    }

    #[test]
    fn shifts_and_bitwise() {
        assert_eq!(parse("lsl r1, $2").0, Opcode::LslRegLit);
        assert_eq!(parse("lsr r1, r2").0, Opcode::LsrRegReg);
        assert_eq!(parse("and r1, $F").0, Opcode::AndRegLit);
        assert_eq!(parse("xor r1, r1").0, Opcode::XorRegReg);
        assert_eq!(parse("not r1").0, Opcode::NotReg);
    }

    #[test]
    fn jumps_take_register_or_literal_comparand() {
        assert_eq!(
            parse("jeq r2, &C0DE"),
            (
                Opcode::JeqReg,
                vec![
                    Operand::Register(Reg::R2),
                    Operand::Address(Expr::Literal(0xC0DE))
                ]
            )
        );
        assert_eq!(parse("jne $3, &[!loop]").0, Opcode::JneLit);
        assert_eq!(parse("jge r1, &0010").0, Opcode::JgeReg);
    }

    #[test]
    fn stack_and_calls() {
        assert_eq!(parse("psh $123").0, Opcode::PshLit);
        assert_eq!(parse("psh r2").0, Opcode::PshReg);
        assert_eq!(parse("pop r1").0, Opcode::PopReg);
        assert_eq!(parse("cal $3000").0, Opcode::CalLit);
        assert_eq!(parse("cal r4").0, Opcode::CalReg);
        assert_eq!(parse("ret").0, Opcode::Ret);
    }

    #[test]
    fn machine_control() {
        assert_eq!(parse("hlt").0, Opcode::Hlt);
        assert_eq!(parse("rti").0, Opcode::Rti);
        assert_eq!(parse("int $3").0, Opcode::Int);
    }

    #[test]
    fn uppercase_mnemonics_and_registers() {
        assert_eq!(
            parse("MOV $AB, R1"),
            (
                Opcode::MovLitReg,
                vec![
                    Operand::Literal(Expr::Literal(0xAB)),
                    Operand::Register(Reg::R1)
                ]
            )
        );
    }

    #[test]
    fn trailing_comment_is_consumed() {
        assert_eq!(parse("add r1, r2 ; accumulate").0, Opcode::AddRegReg);
    }
}
