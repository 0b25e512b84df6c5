//! Text formats: molecule strings and molecular formulas.
//!
//! A molecule string lists atoms as symbol plus index, then a space and the
//! comma-separated bonds: `C0C1C2 0:1(1),0:2(2)`. Indices must count up from
//! zero. A formula such as `C2H6O` lists heavy atoms and hydrogens.

use std::str::FromStr;

use crate::{
    error::ParseError,
    molecule::{Bond, Element, Molecule},
};

/// A molecular formula: heavy atoms (sorted) plus an implicit hydrogen count.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Formula {
    pub elements: Vec<Element>,
    pub hydrogens: u32,
}

pub fn parse_molecule_str(s: &str) -> Result<Molecule, ParseError> {
    let s = s.trim();
    let (atoms, bonds) = match s.split_once(char::is_whitespace) {
        Some((atoms, bonds)) => (atoms, bonds.trim()),
        None => (s, ""),
    };

    let mut mol = Molecule::new();
    for (symbol, label) in split_symbols(atoms)? {
        let expected = mol.atom_count();
        let found = label.ok_or_else(|| ParseError::Token(symbol.to_string()))?;
        if found != expected {
            return Err(ParseError::AtomLabel { expected, found });
        }
        mol.add_atom(parse_element(symbol)?);
    }

    for token in bonds.split(',').map(str::trim).filter(|t| !t.is_empty()) {
        let (a, b, bond) = parse_bond(token)?;
        mol.add_bond(a, b, bond)
            .map_err(|_| ParseError::Bond(token.to_string()))?;
    }
    Ok(mol)
}

pub fn parse_formula(s: &str) -> Result<Formula, ParseError> {
    let mut elements = Vec::new();
    let mut hydrogens = 0;
    let symbols = split_symbols(s.trim())?;
    if symbols.is_empty() {
        return Err(ParseError::Formula(s.to_string()));
    }
    for (symbol, count) in symbols {
        let element = parse_element(symbol)?;
        let count = count.unwrap_or(1);
        if element == Element::Hydrogen {
            hydrogens += count as u32;
        } else {
            elements.extend(std::iter::repeat(element).take(count));
        }
    }
    if elements.is_empty() {
        return Err(ParseError::Formula(s.to_string()));
    }
    elements.sort();
    Ok(Formula {
        elements,
        hydrogens,
    })
}

fn parse_element(symbol: &str) -> Result<Element, ParseError> {
    Element::from_str(symbol).map_err(|_| ParseError::Element(symbol.to_string()))
}

/// Split `C0Cl12O` into `[("C", Some(0)), ("Cl", Some(12)), ("O", None)]`.
fn split_symbols(s: &str) -> Result<Vec<(&str, Option<usize>)>, ParseError> {
    let mut out = Vec::new();
    let mut rest = s;
    while !rest.is_empty() {
        let mut chars = rest.char_indices();
        match chars.next() {
            Some((_, c)) if c.is_ascii_uppercase() => (),
            _ => return Err(ParseError::Token(rest.to_string())),
        }
        let symbol_end = chars
            .find(|(_, c)| !c.is_ascii_lowercase())
            .map_or(rest.len(), |(i, _)| i);
        let (symbol, tail) = rest.split_at(symbol_end);
        let digits_end = tail
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(tail.len());
        let (digits, tail) = tail.split_at(digits_end);
        let number = if digits.is_empty() {
            None
        } else {
            Some(
                digits
                    .parse()
                    .map_err(|_| ParseError::Token(digits.to_string()))?,
            )
        };
        out.push((symbol, number));
        rest = tail;
    }
    Ok(out)
}

/// Parse `0:1(2)`.
fn parse_bond(token: &str) -> Result<(usize, usize, Bond), ParseError> {
    let bad = || ParseError::Bond(token.to_string());
    let (pair, order) = token
        .strip_suffix(')')
        .and_then(|t| t.split_once('('))
        .ok_or_else(bad)?;
    let (a, b) = pair.split_once(':').ok_or_else(bad)?;
    let a = a.trim().parse().map_err(|_| bad())?;
    let b = b.trim().parse().map_err(|_| bad())?;
    let order: u32 = order.trim().parse().map_err(|_| bad())?;
    let bond = Bond::try_from(order).map_err(|_| bad())?;
    Ok((a, b, bond))
}
