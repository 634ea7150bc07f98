//! Data, constant, and structure directives.

use crate::ast::{DataWidth, Expr, Stmt};
use crate::parse::{literal, possibly, symbol, Parser};

use super::{comma, hex_literal, identifier, opt_whitespace, whitespace};

/// `+data8 name = { $…, … }`
pub(super) fn data8() -> Parser<Stmt> {
    data_block(DataWidth::Byte)
}

/// `+data16 name = { $…, … }`
pub(super) fn data16() -> Parser<Stmt> {
    data_block(DataWidth::Word)
}

fn data_block(width: DataWidth) -> Parser<Stmt> {
    let keyword = match width {
        DataWidth::Byte => "data8",
        DataWidth::Word => "data16",
    };
    Parser::new(move |input| {
        let (export, rest) = possibly(symbol('+')).parse(input)?;
        let (_, rest) = literal(keyword).parse(rest)?;
        let (_, rest) = whitespace().parse(rest)?;
        let (name, rest) = identifier().parse(rest)?;
        let (_, rest) = whitespace().parse(rest)?;
        let (_, rest) = symbol('=').parse(rest)?;
        let (_, rest) = whitespace().parse(rest)?;
        let (_, rest) = symbol('{').parse(rest)?;
        let (_, rest) = whitespace().parse(rest)?;
        let (values, rest) = hex_values().parse(rest)?;
        let (_, rest) = opt_whitespace().parse(rest)?;
        let (_, rest) = symbol('}').parse(rest)?;
        let (_, rest) = opt_whitespace().parse(rest)?;
        Ok((
            Stmt::Data {
                width,
                name,
                exported: export.is_some(),
                values,
            },
            rest,
        ))
    })
}

/// `constant name = $C0DE`
pub(super) fn constant() -> Parser<Stmt> {
    Parser::new(|input| {
        let (export, rest) = possibly(symbol('+')).parse(input)?;
        let (_, rest) = literal("constant").parse(rest)?;
        let (_, rest) = whitespace().parse(rest)?;
        let (name, rest) = identifier().parse(rest)?;
        let (_, rest) = whitespace().parse(rest)?;
        let (_, rest) = symbol('=').parse(rest)?;
        let (_, rest) = whitespace().parse(rest)?;
        let (value, rest) = hex_literal_value().parse(rest)?;
        let (_, rest) = opt_whitespace().parse(rest)?;
        Ok((
            Stmt::Constant {
                name,
                exported: export.is_some(),
                value,
            },
            rest,
        ))
    })
}

/// `structure Name { member: $size, … }`
pub(super) fn structure() -> Parser<Stmt> {
    Parser::new(|input| {
        let (export, rest) = possibly(symbol('+')).parse(input)?;
        let (_, rest) = literal("structure").parse(rest)?;
        let (_, rest) = whitespace().parse(rest)?;
        let (name, rest) = identifier().parse(rest)?;
        let (_, rest) = whitespace().parse(rest)?;
        let (_, rest) = symbol('{').parse(rest)?;
        let (_, rest) = whitespace().parse(rest)?;
        let (members, rest) = members().parse(rest)?;
        let (_, rest) = opt_whitespace().parse(rest)?;
        let (_, rest) = symbol('}').parse(rest)?;
        let (_, rest) = opt_whitespace().parse(rest)?;
        Ok((
            Stmt::Structure {
                name,
                exported: export.is_some(),
                members,
            },
            rest,
        ))
    })
}

/// Comma-separated hex literals, yielding their numeric values.
fn hex_values() -> Parser<Vec<u16>> {
    crate::parse::sep_by(comma(), hex_literal_value())
}

/// A `$…` literal reduced to its value.
fn hex_literal_value() -> Parser<u16> {
    Parser::new(|input| {
        let (expr, rest) = hex_literal().parse(input)?;
        match expr {
            Expr::Literal(v) => Ok((v, rest)),
            _ => Err(crate::parse::ParseError {
                at: input.at(),
                message: "expected a hex literal".to_string(),
            }),
        }
    })
}

/// `member: $size` pair inside a structure body.
fn members() -> Parser<Vec<(String, u16)>> {
    let member = Parser::new(|input| {
        let (_, rest) = opt_whitespace().parse(input)?;
        let (key, rest) = identifier().parse(rest)?;
        let (_, rest) = opt_whitespace().parse(rest)?;
        let (_, rest) = symbol(':').parse(rest)?;
        let (_, rest) = opt_whitespace().parse(rest)?;
        let (size, rest) = hex_literal_value().parse(rest)?;
        let (_, rest) = opt_whitespace().parse(rest)?;
        Ok(((key, size), rest))
    });
    crate::parse::sep_by(comma(), member)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn data16_block() {
        let stmt = data16().run("data16 rect = { $A6, $B4, $C9, $DA }").unwrap();
        assert_eq!(
            stmt,
            Stmt::Data {
                width: DataWidth::Word,
                name: "rect".into(),
                exported: false,
                values: vec![0xA6, 0xB4, 0xC9, 0xDA],
            }
        );
    }

    #[test]
    fn exported_data8() {
        let stmt = data8().run("+data8 bytes = { $01 }").unwrap();
        assert_eq!(
            stmt,
            Stmt::Data {
                width: DataWidth::Byte,
                name: "bytes".into(),
                exported: true,
                values: vec![1],
            }
        );
    }

    #[test]
    fn constant_directive() {
        let stmt = constant().run("+constant index = $C0DE").unwrap();
        assert_eq!(
            stmt,
            Stmt::Constant {
                name: "index".into(),
                exported: true,
                value: 0xC0DE,
            }
        );
    }

    #[test]
    fn structure_members_keep_declaration_order() {
        let src = "structure Rectangle {\n  x: $2,\n  y: $2,\n  w: $2,\n  h: $2\n}";
        let stmt = structure().run(src).unwrap();
        assert_eq!(
            stmt,
            Stmt::Structure {
                name: "Rectangle".into(),
                exported: false,
                members: vec![
                    ("x".into(), 2),
                    ("y".into(), 2),
                    ("w".into(), 2),
                    ("h".into(), 2),
                ],
            }
        );
    }

    #[test]
    fn data_requires_braces() {
        assert!(data8().run("data8 x = $01").is_err());
    }

    #[test]
    fn trailing_commas_are_rejected() {
        assert!(data8().run("data8 x = { $01, }").is_err());
        assert!(data16().run("data16 x = { $01, $02, }").is_err());
        assert!(structure().run("structure S { x: $2, }").is_err());
    }
}
