//! Per-element bonding capacities.
//!
//! A [`Capacities`] table is an explicit configuration value: it is built
//! once (defaults plus overrides) and handed to every component that needs
//! it. Remaining capacity is always recomputed from the molecule.

use std::{collections::HashMap, str::FromStr};

use crate::{
    error::{Error, ParseError},
    molecule::{Element, Molecule},
};

/// How much an atom of some element can bond.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct Capacity {
    /// Maximum sum of bond orders at one atom (its valence).
    pub max_bond_order_sum: u32,
    /// Maximum order of a single bond at one atom.
    pub max_bond_order: u32,
}

impl Capacity {
    pub const fn new(max_bond_order_sum: u32, max_bond_order: u32) -> Self {
        Self {
            max_bond_order_sum,
            max_bond_order,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Capacities {
    table: HashMap<Element, Capacity>,
}

const DEFAULTS: [(Element, Capacity); 8] = [
    (Element::Carbon, Capacity::new(4, 3)),
    (Element::Oxygen, Capacity::new(2, 3)),
    (Element::Nitrogen, Capacity::new(5, 3)),
    (Element::Sulfur, Capacity::new(6, 2)),
    (Element::Phosphorus, Capacity::new(5, 2)),
    (Element::Fluorine, Capacity::new(1, 1)),
    (Element::Iodine, Capacity::new(1, 1)),
    (Element::Chlorine, Capacity::new(1, 1)),
];

impl Default for Capacities {
    fn default() -> Self {
        Self {
            table: HashMap::from(DEFAULTS),
        }
    }
}

impl Capacities {
    /// A table with no elements.
    pub fn empty() -> Self {
        Self {
            table: HashMap::new(),
        }
    }

    /// Set (or replace) the capacity of `element`. Bonds above triple are not
    /// representable and are rejected.
    pub fn insert(&mut self, element: Element, capacity: Capacity) -> Result<(), Error> {
        if capacity.max_bond_order > 3 {
            return Err(Error::BondOrder(capacity.max_bond_order));
        }
        self.table.insert(element, capacity);
        Ok(())
    }

    pub fn with(mut self, element: Element, capacity: Capacity) -> Result<Self, Error> {
        self.insert(element, capacity)?;
        Ok(self)
    }

    pub fn get(&self, element: Element) -> Result<Capacity, Error> {
        self.table
            .get(&element)
            .copied()
            .ok_or(Error::UnknownElement(element))
    }

    /// Remaining capacity of every atom of `mol`, floored at zero.
    pub fn remaining(&self, mol: &Molecule) -> Result<Vec<u32>, Error> {
        (0..mol.atom_count())
            .map(|i| {
                let cap = self.get(mol.element(i))?;
                Ok(cap.max_bond_order_sum.saturating_sub(mol.bond_order_sum(i)))
            })
            .collect()
    }

    /// Number of hydrogens needed to saturate `mol`.
    pub fn implicit_hydrogens(&self, mol: &Molecule) -> Result<u32, Error> {
        Ok(self.remaining(mol)?.iter().sum())
    }

    /// Total valence of a multiset of elements.
    pub fn total_capacity(&self, elements: &[Element]) -> Result<u32, Error> {
        elements
            .iter()
            .map(|&e| Ok(self.get(e)?.max_bond_order_sum))
            .sum()
    }
}

/// Parse an override such as `N=3:3` (element, valence, maximum bond order).
pub fn parse_override(s: &str) -> Result<(Element, Capacity), ParseError> {
    let bad = || ParseError::Capacity(s.to_string());
    let (symbol, rest) = s.split_once('=').ok_or_else(bad)?;
    let (sum, order) = rest.split_once(':').ok_or_else(bad)?;
    let element =
        Element::from_str(symbol.trim()).map_err(|_| ParseError::Element(symbol.to_string()))?;
    let sum = sum.trim().parse().map_err(|_| bad())?;
    let order = order.trim().parse().map_err(|_| bad())?;
    Ok((element, Capacity::new(sum, order)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table() {
        let caps = Capacities::default();
        assert_eq!(caps.get(Element::Carbon), Ok(Capacity::new(4, 3)));
        assert_eq!(caps.get(Element::Sulfur), Ok(Capacity::new(6, 2)));
        assert_eq!(
            caps.get(Element::Boron),
            Err(Error::UnknownElement(Element::Boron))
        );
    }

    #[test]
    fn remaining_capacity_of_ethanol() {
        let caps = Capacities::default();
        let mol: Molecule = "C0C1O2 0:1(1),1:2(1)".parse().unwrap();
        assert_eq!(caps.remaining(&mol), Ok(vec![3, 2, 1]));
        assert_eq!(caps.implicit_hydrogens(&mol), Ok(6));
    }

    #[test]
    fn overrides() {
        assert_eq!(
            parse_override("N=3:3"),
            Ok((Element::Nitrogen, Capacity::new(3, 3)))
        );
        assert!(parse_override("N3:3").is_err());
        assert!(parse_override("Xx=3:3").is_err());
        let caps = Capacities::default()
            .with(Element::Nitrogen, Capacity::new(3, 3))
            .unwrap();
        assert_eq!(caps.get(Element::Nitrogen), Ok(Capacity::new(3, 3)));
        assert!(Capacities::empty()
            .with(Element::Carbon, Capacity::new(4, 4))
            .is_err());
    }
}
