use miette::{miette, LabeledSpan, Report, Severity};

use crate::parse::ParseError;

// Assembler errors

pub fn asm_syntax(src: &str, err: &ParseError) -> Report {
    let offset = err.at.min(src.len());
    miette!(
        severity = Severity::Error,
        code = "asm::syntax",
        help = "check the statement at the highlighted position against the instruction reference.",
        labels = vec![LabeledSpan::at_offset(offset, "parsing stopped here")],
        "{}",
        err.message,
    )
    .with_source_code(src.to_string())
}

pub fn asm_duplicate_name(name: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "asm::duplicate",
        help = "labels, constants, data blocks, and structures share one namespace.",
        "Can't create \"{name}\" because it has already been declared.",
    )
}

pub fn asm_unresolved_symbol(name: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "asm::unresolved",
        help = "declare a label, constant, or data block with this name.",
        "Symbol \"{name}\" could not be resolved.",
    )
}

pub fn asm_unresolved_structure(name: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "asm::unresolved_structure",
        "Structure \"{name}\" could not be resolved.",
    )
}

pub fn asm_unresolved_member(structure: &str, member: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "asm::unresolved_member",
        "Member \"{member}\" in structure \"{structure}\" could not be resolved.",
    )
}

// Runtime errors

pub fn run_invalid_opcode(byte: u8, addr: u16) -> Report {
    miette!(
        severity = Severity::Error,
        code = "run::invalid_opcode",
        help = "execution likely ran past the end of the program or into data.",
        "Invalid opcode 0x{byte:02X} at address 0x{addr:04X}.",
    )
}

pub fn run_unmapped_read(addr: u16) -> Report {
    miette!(
        severity = Severity::Error,
        code = "run::unmapped",
        "No memory region mapped at read address 0x{addr:04X}.",
    )
}

pub fn run_unmapped_write(addr: u16) -> Report {
    miette!(
        severity = Severity::Error,
        code = "run::unmapped",
        "No memory region mapped at write address 0x{addr:04X}.",
    )
}

pub fn run_unknown_register(label: &str) -> Report {
    miette!(
        severity = Severity::Error,
        code = "run::register",
        help = "valid registers are r0-r7, acc, mb, im, sp, fp, and pc.",
        "No register named \"{label}\".",
    )
}
