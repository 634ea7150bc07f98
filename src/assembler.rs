//! Two-pass assembler: pass one places every name in the symbol table, pass
//! two encodes statements into big-endian machine code. Forward references
//! always resolve because encoding never starts until the table is complete.

use miette::Result;

use crate::ast::{DataWidth, Operand, Stmt};
use crate::error;
use crate::grammar;
use crate::isa::Opcode;
use crate::symbol::SymbolTable;

/// Machine code plus per-instruction debug metadata.
#[derive(Debug, Default)]
pub struct Assembly {
    pub bytes: Vec<u8>,
    pub debug: Vec<DebugRecord>,
}

/// One encoded instruction: its mnemonic, printable operands, and byte
/// offset into the machine code.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DebugRecord {
    pub mnemonic: &'static str,
    pub args: Vec<String>,
    pub offset: u16,
}

/// Assemble a complete source program. Each call is a fresh session; no
/// state carries over.
pub fn assemble(src: &str) -> Result<Assembly> {
    let stmts = grammar::parse_program(src).map_err(|err| error::asm_syntax(src, &err))?;
    let symbols = collect_symbols(&stmts)?;
    encode(&stmts, &symbols)
}

/// Pass one: walk the statement list accumulating the current address.
/// Labels and data blocks record addresses, constants record values,
/// structures record member layouts. Only instructions and data occupy
/// space.
fn collect_symbols(stmts: &[Stmt]) -> Result<SymbolTable> {
    let mut table = SymbolTable::new();
    let mut address = 0u16;
    for stmt in stmts {
        match stmt {
            Stmt::Label(name) => table.define_value(name, address)?,
            Stmt::Constant { name, value, .. } => table.define_value(name, *value)?,
            Stmt::Structure { name, members, .. } => table.define_structure(name, members)?,
            Stmt::Data {
                name,
                width,
                values,
                ..
            } => {
                table.define_value(name, address)?;
                address = address.wrapping_add(values.len() as u16 * width.bytes());
            }
            Stmt::Instruction { opcode, .. } => {
                address = address.wrapping_add(opcode.size());
            }
        }
    }
    Ok(table)
}

/// Pass two: emit bytes in statement order.
fn encode(stmts: &[Stmt], symbols: &SymbolTable) -> Result<Assembly> {
    let mut out = Assembly::default();
    for stmt in stmts {
        match stmt {
            Stmt::Label(_) | Stmt::Constant { .. } | Stmt::Structure { .. } => {}
            Stmt::Data { width, values, .. } => match width {
                DataWidth::Byte => {
                    for value in values {
                        out.bytes.push(*value as u8);
                    }
                }
                DataWidth::Word => {
                    for value in values {
                        out.bytes.extend_from_slice(&value.to_be_bytes());
                    }
                }
            },
            Stmt::Instruction { opcode, operands } => {
                encode_instruction(&mut out, *opcode, operands, symbols)?;
            }
        }
    }
    Ok(out)
}

/// Opcode byte, then each operand in shape order: registers as their bank
/// index, literals and addresses as evaluated big-endian words.
fn encode_instruction(
    out: &mut Assembly,
    opcode: Opcode,
    operands: &[Operand],
    symbols: &SymbolTable,
) -> Result<()> {
    let offset = out.bytes.len() as u16;
    out.bytes.push(opcode.byte());
    for operand in operands {
        match operand {
            Operand::Register(reg) | Operand::RegisterIndirect(reg) => {
                out.bytes.push(reg.index());
            }
            Operand::Literal(expr) | Operand::Address(expr) => {
                let value = symbols.eval(expr)?;
                out.bytes.extend_from_slice(&value.to_be_bytes());
            }
        }
    }
    debug_assert_eq!(out.bytes.len() as u16 - offset, opcode.size());

    out.debug.push(DebugRecord {
        mnemonic: opcode.mnemonic().as_str(),
        args: operands.iter().map(|op| op.to_string()).collect(),
        offset,
    });
    Ok(())
}
