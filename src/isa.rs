//! Static description of the Vesper-16 instruction set: registers, operand
//! shapes, and the closed opcode catalog shared by the assembler and the CPU.

use std::fmt;
use std::str::FromStr;

/// Number of registers in the bank.
pub const REGISTER_COUNT: usize = 14;

/// One register in the bank. The discriminant is the bank index; a register's
/// byte offset into the flat register block is `index * 2`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Reg {
    R0 = 0,
    R1,
    R2,
    R3,
    R4,
    R5,
    R6,
    R7,
    Acc,
    Mb,
    Im,
    Sp,
    Fp,
    Pc,
}

impl Reg {
    pub const ALL: [Reg; REGISTER_COUNT] = [
        Reg::R0,
        Reg::R1,
        Reg::R2,
        Reg::R3,
        Reg::R4,
        Reg::R5,
        Reg::R6,
        Reg::R7,
        Reg::Acc,
        Reg::Mb,
        Reg::Im,
        Reg::Sp,
        Reg::Fp,
        Reg::Pc,
    ];

    /// Index into the register bank.
    pub fn index(self) -> u8 {
        self as u8
    }

    /// Byte offset into the flat register block.
    pub fn offset(self) -> usize {
        self as usize * 2
    }

    /// Decode an encoded register byte. Out-of-range bytes wrap into the
    /// bank rather than faulting.
    pub fn from_index(byte: u8) -> Reg {
        Reg::ALL[byte as usize % REGISTER_COUNT]
    }

    pub fn label(self) -> &'static str {
        match self {
            Reg::R0 => "r0",
            Reg::R1 => "r1",
            Reg::R2 => "r2",
            Reg::R3 => "r3",
            Reg::R4 => "r4",
            Reg::R5 => "r5",
            Reg::R6 => "r6",
            Reg::R7 => "r7",
            Reg::Acc => "acc",
            Reg::Mb => "mb",
            Reg::Im => "im",
            Reg::Sp => "sp",
            Reg::Fp => "fp",
            Reg::Pc => "pc",
        }
    }
}

impl FromStr for Reg {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Reg::ALL
            .iter()
            .copied()
            .find(|r| r.label().eq_ignore_ascii_case(s))
            .ok_or(())
    }
}

impl fmt::Display for Reg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Operand layout of an instruction. Fixes both how the assembler encodes
/// the operands and how many bytes the encoded instruction occupies.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Shape {
    NoArgs,
    SingleReg,
    SingleLit,
    RegReg,
    RegIndReg,
    LitReg,
    RegLit,
    RegMem,
    MemReg,
    LitMem,
    LitOffReg,
}

impl Shape {
    /// Encoded size in bytes, opcode byte included.
    pub fn size(self) -> u16 {
        match self {
            Shape::NoArgs => 1,
            Shape::SingleReg => 2,
            Shape::SingleLit => 3,
            Shape::RegReg | Shape::RegIndReg => 3,
            Shape::LitReg | Shape::RegLit | Shape::RegMem | Shape::MemReg => 4,
            Shape::LitMem | Shape::LitOffReg => 5,
        }
    }
}

/// Assembly-level instruction name. One mnemonic may map to several opcodes
/// depending on the operand shape it was written with.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Mnemonic {
    Mov,
    Add,
    Sub,
    Mul,
    And,
    Or,
    Xor,
    Lsl,
    Lsr,
    Not,
    Inc,
    Dec,
    Jne,
    Jeq,
    Jlt,
    Jgt,
    Jle,
    Jge,
    Psh,
    Pop,
    Cal,
    Ret,
    Int,
    Rti,
    Hlt,
}

impl Mnemonic {
    pub fn as_str(self) -> &'static str {
        match self {
            Mnemonic::Mov => "mov",
            Mnemonic::Add => "add",
            Mnemonic::Sub => "sub",
            Mnemonic::Mul => "mul",
            Mnemonic::And => "and",
            Mnemonic::Or => "or",
            Mnemonic::Xor => "xor",
            Mnemonic::Lsl => "lsl",
            Mnemonic::Lsr => "lsr",
            Mnemonic::Not => "not",
            Mnemonic::Inc => "inc",
            Mnemonic::Dec => "dec",
            Mnemonic::Jne => "jne",
            Mnemonic::Jeq => "jeq",
            Mnemonic::Jlt => "jlt",
            Mnemonic::Jgt => "jgt",
            Mnemonic::Jle => "jle",
            Mnemonic::Jge => "jge",
            Mnemonic::Psh => "psh",
            Mnemonic::Pop => "pop",
            Mnemonic::Cal => "cal",
            Mnemonic::Ret => "ret",
            Mnemonic::Int => "int",
            Mnemonic::Rti => "rti",
            Mnemonic::Hlt => "hlt",
        }
    }
}

impl fmt::Display for Mnemonic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The closed opcode catalog. Every encodable mnemonic/shape pairing has
/// exactly one opcode byte; the literal and register forms of `cal` are
/// distinct so the decoder never has to guess the operand kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    MovLitReg = 0x10,
    MovRegReg = 0x11,
    MovRegMem = 0x12,
    MovMemReg = 0x13,
    MovLitMem = 0x14,
    MovRegIndReg = 0x15,
    MovLitOffReg = 0x16,
    AddRegReg = 0x17,
    AddLitReg = 0x18,
    SubLitReg = 0x19,
    SubRegLit = 0x1A,
    SubRegReg = 0x1B,
    MulLitReg = 0x1C,
    MulRegReg = 0x1D,
    IncReg = 0x1E,
    DecReg = 0x1F,
    LslRegLit = 0x20,
    LslRegReg = 0x21,
    LsrRegLit = 0x22,
    LsrRegReg = 0x23,
    AndRegLit = 0x24,
    AndRegReg = 0x25,
    OrRegLit = 0x26,
    OrRegReg = 0x27,
    XorRegLit = 0x28,
    XorRegReg = 0x29,
    NotReg = 0x2A,
    JneLit = 0x30,
    JneReg = 0x31,
    JeqLit = 0x32,
    JeqReg = 0x33,
    JltLit = 0x34,
    JltReg = 0x35,
    JgtLit = 0x36,
    JgtReg = 0x37,
    JleLit = 0x38,
    JleReg = 0x39,
    JgeLit = 0x3A,
    JgeReg = 0x3B,
    PshLit = 0x40,
    PshReg = 0x41,
    PopReg = 0x42,
    CalLit = 0x43,
    CalReg = 0x44,
    Ret = 0x45,
    Rti = 0xFC,
    Int = 0xFD,
    Hlt = 0xFF,
}

impl Opcode {
    pub const ALL: [Opcode; 48] = [
        Opcode::MovLitReg,
        Opcode::MovRegReg,
        Opcode::MovRegMem,
        Opcode::MovMemReg,
        Opcode::MovLitMem,
        Opcode::MovRegIndReg,
        Opcode::MovLitOffReg,
        Opcode::AddRegReg,
        Opcode::AddLitReg,
        Opcode::SubLitReg,
        Opcode::SubRegLit,
        Opcode::SubRegReg,
        Opcode::MulLitReg,
        Opcode::MulRegReg,
        Opcode::IncReg,
        Opcode::DecReg,
        Opcode::LslRegLit,
        Opcode::LslRegReg,
        Opcode::LsrRegLit,
        Opcode::LsrRegReg,
        Opcode::AndRegLit,
        Opcode::AndRegReg,
        Opcode::OrRegLit,
        Opcode::OrRegReg,
        Opcode::XorRegLit,
        Opcode::XorRegReg,
        Opcode::NotReg,
        Opcode::JneLit,
        Opcode::JneReg,
        Opcode::JeqLit,
        Opcode::JeqReg,
        Opcode::JltLit,
        Opcode::JltReg,
        Opcode::JgtLit,
        Opcode::JgtReg,
        Opcode::JleLit,
        Opcode::JleReg,
        Opcode::JgeLit,
        Opcode::JgeReg,
        Opcode::PshLit,
        Opcode::PshReg,
        Opcode::PopReg,
        Opcode::CalLit,
        Opcode::CalReg,
        Opcode::Ret,
        Opcode::Rti,
        Opcode::Int,
        Opcode::Hlt,
    ];

    /// The opcode byte as it appears in machine code.
    pub fn byte(self) -> u8 {
        self as u8
    }

    /// Look an opcode up by its encoded byte.
    pub fn decode(byte: u8) -> Option<Opcode> {
        Opcode::ALL.iter().copied().find(|op| op.byte() == byte)
    }

    pub fn mnemonic(self) -> Mnemonic {
        match self {
            Opcode::MovLitReg
            | Opcode::MovRegReg
            | Opcode::MovRegMem
            | Opcode::MovMemReg
            | Opcode::MovLitMem
            | Opcode::MovRegIndReg
            | Opcode::MovLitOffReg => Mnemonic::Mov,
            Opcode::AddRegReg | Opcode::AddLitReg => Mnemonic::Add,
            Opcode::SubLitReg | Opcode::SubRegLit | Opcode::SubRegReg => Mnemonic::Sub,
            Opcode::MulLitReg | Opcode::MulRegReg => Mnemonic::Mul,
            Opcode::IncReg => Mnemonic::Inc,
            Opcode::DecReg => Mnemonic::Dec,
            Opcode::LslRegLit | Opcode::LslRegReg => Mnemonic::Lsl,
            Opcode::LsrRegLit | Opcode::LsrRegReg => Mnemonic::Lsr,
            Opcode::AndRegLit | Opcode::AndRegReg => Mnemonic::And,
            Opcode::OrRegLit | Opcode::OrRegReg => Mnemonic::Or,
            Opcode::XorRegLit | Opcode::XorRegReg => Mnemonic::Xor,
            Opcode::NotReg => Mnemonic::Not,
            Opcode::JneLit | Opcode::JneReg => Mnemonic::Jne,
            Opcode::JeqLit | Opcode::JeqReg => Mnemonic::Jeq,
            Opcode::JltLit | Opcode::JltReg => Mnemonic::Jlt,
            Opcode::JgtLit | Opcode::JgtReg => Mnemonic::Jgt,
            Opcode::JleLit | Opcode::JleReg => Mnemonic::Jle,
            Opcode::JgeLit | Opcode::JgeReg => Mnemonic::Jge,
            Opcode::PshLit | Opcode::PshReg => Mnemonic::Psh,
            Opcode::PopReg => Mnemonic::Pop,
            Opcode::CalLit | Opcode::CalReg => Mnemonic::Cal,
            Opcode::Ret => Mnemonic::Ret,
            Opcode::Rti => Mnemonic::Rti,
            Opcode::Int => Mnemonic::Int,
            Opcode::Hlt => Mnemonic::Hlt,
        }
    }

    pub fn shape(self) -> Shape {
        match self {
            Opcode::Ret | Opcode::Rti | Opcode::Hlt => Shape::NoArgs,
            Opcode::IncReg
            | Opcode::DecReg
            | Opcode::NotReg
            | Opcode::PshReg
            | Opcode::PopReg
            | Opcode::CalReg => Shape::SingleReg,
            Opcode::PshLit | Opcode::CalLit | Opcode::Int => Shape::SingleLit,
            Opcode::MovRegReg
            | Opcode::AddRegReg
            | Opcode::SubRegReg
            | Opcode::MulRegReg
            | Opcode::LslRegReg
            | Opcode::LsrRegReg
            | Opcode::AndRegReg
            | Opcode::OrRegReg
            | Opcode::XorRegReg => Shape::RegReg,
            Opcode::MovRegIndReg => Shape::RegIndReg,
            Opcode::MovLitReg
            | Opcode::AddLitReg
            | Opcode::SubLitReg
            | Opcode::MulLitReg => Shape::LitReg,
            Opcode::SubRegLit
            | Opcode::LslRegLit
            | Opcode::LsrRegLit
            | Opcode::AndRegLit
            | Opcode::OrRegLit
            | Opcode::XorRegLit => Shape::RegLit,
            Opcode::MovRegMem
            | Opcode::JneReg
            | Opcode::JeqReg
            | Opcode::JltReg
            | Opcode::JgtReg
            | Opcode::JleReg
            | Opcode::JgeReg => Shape::RegMem,
            Opcode::MovMemReg => Shape::MemReg,
            Opcode::MovLitMem
            | Opcode::JneLit
            | Opcode::JeqLit
            | Opcode::JltLit
            | Opcode::JgtLit
            | Opcode::JleLit
            | Opcode::JgeLit => Shape::LitMem,
            Opcode::MovLitOffReg => Shape::LitOffReg,
        }
    }

    /// Encoded size in bytes.
    pub fn size(self) -> u16 {
        self.shape().size()
    }
}
