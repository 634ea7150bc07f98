//! Syntax tree produced by the grammar and consumed by the assembler.

use std::fmt;

use crate::isa::{Opcode, Reg};

/// Binary operator inside a bracketed expression.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Op {
    Plus,
    Minus,
    Multiply,
}

impl Op {
    /// Binding priority used when a flat expression list is collapsed into a
    /// tree. Higher binds tighter; ties go to the leftmost occurrence.
    pub fn priority(self) -> u8 {
        match self {
            Op::Multiply => 2,
            Op::Plus => 1,
            Op::Minus => 0,
        }
    }

    /// Evaluate with 16-bit wraparound.
    pub fn apply(self, lhs: u16, rhs: u16) -> u16 {
        match self {
            Op::Plus => lhs.wrapping_add(rhs),
            Op::Minus => lhs.wrapping_sub(rhs),
            Op::Multiply => lhs.wrapping_mul(rhs),
        }
    }

    pub fn glyph(self) -> char {
        match self {
            Op::Plus => '+',
            Op::Minus => '-',
            Op::Multiply => '*',
        }
    }
}

/// A value expression. Symbolic leaves are resolved against the symbol table
/// during encoding, so forward references parse cleanly.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Expr {
    /// Hex literal, already parsed to its numeric value.
    Literal(u16),
    /// `!name` reference to a label, constant, or data block.
    Variable(String),
    /// `<Struct> sym.member` access: the address of `member` within the
    /// structure laid out at `sym`.
    Interpreted {
        structure: String,
        symbol: String,
        member: String,
    },
    /// Operator application produced by precedence resolution.
    Binary {
        op: Op,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expr::Literal(v) => write!(f, "${v:04X}"),
            Expr::Variable(name) => write!(f, "!{name}"),
            Expr::Interpreted {
                structure,
                symbol,
                member,
            } => write!(f, "<{structure}> {symbol}.{member}"),
            Expr::Binary { op, lhs, rhs } => write!(f, "({lhs} {} {rhs})", op.glyph()),
        }
    }
}

/// One operand of an instruction as it appeared in source.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Operand {
    Register(Reg),
    /// `$…` immediate value.
    Literal(Expr),
    /// `&…` memory address.
    Address(Expr),
    /// `&reg` register-indirect address.
    RegisterIndirect(Reg),
}

impl fmt::Display for Operand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Operand::Register(reg) => write!(f, "{reg}"),
            Operand::Literal(expr) => write!(f, "{expr}"),
            Operand::Address(Expr::Literal(v)) => write!(f, "&{v:04X}"),
            Operand::Address(expr) => write!(f, "&[{expr}]"),
            Operand::RegisterIndirect(reg) => write!(f, "&{reg}"),
        }
    }
}

/// Width of a data block's elements.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DataWidth {
    Byte,
    Word,
}

impl DataWidth {
    pub fn bytes(self) -> u16 {
        match self {
            DataWidth::Byte => 1,
            DataWidth::Word => 2,
        }
    }
}

/// One top-level statement of a program.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Stmt {
    /// Encodable instruction. The opcode fixes the operand shape, so the
    /// assembler never re-inspects operand kinds to pick an encoding.
    Instruction {
        opcode: Opcode,
        operands: Vec<Operand>,
    },
    /// `name:` position marker. Occupies no space.
    Label(String),
    /// `data8`/`data16` block of initialized values.
    Data {
        width: DataWidth,
        name: String,
        exported: bool,
        values: Vec<u16>,
    },
    /// `constant name = $…`. Occupies no space.
    Constant {
        name: String,
        exported: bool,
        value: u16,
    },
    /// `structure Name { member: $size, … }`. Occupies no space.
    Structure {
        name: String,
        exported: bool,
        members: Vec<(String, u16)>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operator_priorities() {
        assert!(Op::Multiply.priority() > Op::Plus.priority());
        assert!(Op::Plus.priority() > Op::Minus.priority());
    }

    #[test]
    fn operators_wrap_at_16_bits() {
        assert_eq!(Op::Plus.apply(0xFFFF, 1), 0);
        assert_eq!(Op::Minus.apply(0, 1), 0xFFFF);
        assert_eq!(Op::Multiply.apply(0x8000, 2), 0);
    }

    #[test]
    fn operand_display_forms() {
        assert_eq!(Operand::Register(Reg::R3).to_string(), "r3");
        assert_eq!(Operand::Literal(Expr::Literal(0x42)).to_string(), "$0042");
        assert_eq!(Operand::Address(Expr::Literal(0xC0DE)).to_string(), "&C0DE");
        assert_eq!(Operand::RegisterIndirect(Reg::Fp).to_string(), "&fp");
        let sum = Expr::Binary {
            op: Op::Plus,
            lhs: Box::new(Expr::Variable("loc".into())),
            rhs: Box::new(Expr::Literal(2)),
        };
        assert_eq!(Operand::Address(sum).to_string(), "&[(!loc + $0002)]");
    }
}
