//! Name resolution for the assembler: one insertion-ordered table covering
//! labels, constants, data block addresses, and structure layouts. All of
//! those share a single namespace, so any redefinition is fatal.

use fxhash::FxBuildHasher;
use indexmap::IndexMap;
use miette::Result;

use crate::ast::Expr;
use crate::error;

type FxMap<K, V> = IndexMap<K, V, FxBuildHasher>;

/// Placement of one member within a structure layout.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Member {
    pub offset: u16,
    pub size: u16,
}

#[derive(Debug, Default)]
pub struct SymbolTable {
    values: FxMap<String, u16>,
    structures: FxMap<String, FxMap<String, Member>>,
}

impl SymbolTable {
    pub fn new() -> Self {
        Self::default()
    }

    fn taken(&self, name: &str) -> bool {
        self.values.contains_key(name) || self.structures.contains_key(name)
    }

    /// Record a label address, data base address, or constant value.
    pub fn define_value(&mut self, name: &str, value: u16) -> Result<()> {
        if self.taken(name) {
            return Err(error::asm_duplicate_name(name));
        }
        self.values.insert(name.to_string(), value);
        Ok(())
    }

    /// Record a structure layout. Member offsets are the running sum of the
    /// declared member sizes, in declaration order.
    pub fn define_structure(&mut self, name: &str, members: &[(String, u16)]) -> Result<()> {
        if self.taken(name) {
            return Err(error::asm_duplicate_name(name));
        }
        let mut layout = FxMap::default();
        let mut offset = 0u16;
        for (member, size) in members {
            layout.insert(member.clone(), Member { offset, size: *size });
            offset = offset.wrapping_add(*size);
        }
        self.structures.insert(name.to_string(), layout);
        Ok(())
    }

    pub fn value(&self, name: &str) -> Option<u16> {
        self.values.get(name).copied()
    }

    pub fn member(&self, structure: &str, member: &str) -> Option<Member> {
        self.structures
            .get(structure)
            .and_then(|layout| layout.get(member))
            .copied()
    }

    /// Evaluate an expression against this table with 16-bit wraparound.
    /// Unresolved names are fatal.
    pub fn eval(&self, expr: &Expr) -> Result<u16> {
        match expr {
            Expr::Literal(value) => Ok(*value),
            Expr::Variable(name) => self
                .value(name)
                .ok_or_else(|| error::asm_unresolved_symbol(name)),
            Expr::Interpreted {
                structure,
                symbol,
                member,
            } => {
                let layout = self
                    .structures
                    .get(structure)
                    .ok_or_else(|| error::asm_unresolved_structure(structure))?;
                let placed = layout
                    .get(member)
                    .ok_or_else(|| error::asm_unresolved_member(structure, member))?;
                let base = self
                    .value(symbol)
                    .ok_or_else(|| error::asm_unresolved_symbol(symbol))?;
                Ok(base.wrapping_add(placed.offset))
            }
            Expr::Binary { op, lhs, rhs } => Ok(op.apply(self.eval(lhs)?, self.eval(rhs)?)),
        }
    }
}
