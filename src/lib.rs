// Parsing
pub mod parse;
pub use parse::{ParseError, Parser};
mod ast;
mod grammar;
pub use grammar::parse_program;

// Assembling
mod assembler;
pub use assembler::{assemble, Assembly, DebugRecord};
mod isa;
pub use isa::{Mnemonic, Opcode, Reg};
mod symbol;
pub use symbol::SymbolTable;

// Running
mod cpu;
pub use cpu::Cpu;
mod memory;
pub use memory::{Memory, MemoryMapper, Ram};

mod error;

/// Amount of lines to show as context, each side of focus line (line containing span).
pub const DIAGNOSTIC_CONTEXT_LINES: usize = 8;
