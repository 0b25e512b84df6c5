//! Graph-theoretic representation of a molecule.
//!
//! Atoms are numbered in the order they were added, so the last atom of a
//! molecule produced by atom-wise augmentation is always the newest one.
//! Growth operations copy: [`Molecule::with_atom`] and
//! [`Molecule::with_bond`] return a fresh molecule and leave `self` intact.

use std::{fmt::Display, str::FromStr};

use petgraph::{
    dot::Dot,
    graph::{Graph, NodeIndex},
    visit::EdgeRef,
    Undirected,
};
use thiserror::Error;

use crate::{
    error::{Error, ParseError},
    loader,
    permutation::Permutation,
    utils::{is_connected, is_connected_without},
};

pub(crate) type Index = u32;
pub(crate) type MGraph = Graph<Element, Bond, Undirected, Index>;

/// Thrown by [`Element::from_str`] if the string does not represent a
/// supported chemical element.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
#[error("not a supported element symbol")]
pub struct ParseElementError;

macro_rules! periodic_table {
    ( $(($element:ident, $name:literal),)* ) => {
        #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        /// Represents a chemical element. Elements order by atomic number.
        pub enum Element {
            $( $element, )*
        }

        impl Display for Element {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                match &self {
                    $( Element::$element => write!(f, "{}", $name), )*
                }
            }
        }

        impl FromStr for Element {
            type Err = ParseElementError;
            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $( $name => Ok(Element::$element), )*
                    _ => Err(ParseElementError),
                }
            }
        }
    };
}

periodic_table!(
    (Hydrogen, "H"),
    (Boron, "B"),
    (Carbon, "C"),
    (Nitrogen, "N"),
    (Oxygen, "O"),
    (Fluorine, "F"),
    (Silicon, "Si"),
    (Phosphorus, "P"),
    (Sulfur, "S"),
    (Chlorine, "Cl"),
    (Bromine, "Br"),
    (Iodine, "I"),
);

/// The edges of a [`Molecule`] graph.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Bond {
    Single,
    Double,
    Triple,
}

impl Bond {
    /// Bond order: 1, 2 or 3.
    pub fn order(&self) -> u32 {
        match self {
            Bond::Single => 1,
            Bond::Double => 2,
            Bond::Triple => 3,
        }
    }
}

/// Thrown by [`Bond::try_from`] when given anything other than a 1, 2, or 3.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Error)]
#[error("bond order must be 1, 2 or 3")]
pub struct ParseBondError;

impl TryFrom<u32> for Bond {
    type Error = ParseBondError;
    fn try_from(value: u32) -> Result<Self, Self::Error> {
        match value {
            1 => Ok(Bond::Single),
            2 => Ok(Bond::Double),
            3 => Ok(Bond::Triple),
            _ => Err(ParseBondError),
        }
    }
}

/// Node weights of the subdivided graph handed to the certificate code.
#[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AtomOrBond {
    Atom(Element),
    Bond(Bond),
}

/// A simple, loopless graph with [`Element`]s as nodes and [`Bond`]s as edges.
///
/// Hydrogens are implicit: they fill whatever capacity the heavy atoms have
/// left, see [`crate::capacity::Capacities::implicit_hydrogens`].
#[derive(Debug, Clone, Default)]
pub struct Molecule {
    graph: MGraph,
}

impl Molecule {
    /// An empty molecule.
    pub fn new() -> Self {
        Self::default()
    }

    /// A molecule of unbonded atoms.
    pub fn from_elements(elements: impl IntoIterator<Item = Element>) -> Self {
        let mut mol = Self::new();
        for e in elements {
            mol.add_atom(e);
        }
        mol
    }

    /// Construct a [`Molecule`] from an existing `MGraph`.
    pub(crate) fn from_graph(g: MGraph) -> Self {
        Self { graph: g }
    }

    /// Return a representation of this molecule as an `MGraph`.
    pub(crate) fn graph(&self) -> &MGraph {
        &self.graph
    }

    /// Return a pretty-printable representation of this molecule.
    pub fn info(&self) -> String {
        let dot = Dot::new(&self.graph);
        format!("{dot:?}")
    }

    pub fn atom_count(&self) -> usize {
        self.graph.node_count()
    }

    pub fn bond_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Element of `atom`. Panics if `atom` is out of range.
    pub fn element(&self, atom: usize) -> Element {
        self.graph[NodeIndex::new(atom)]
    }

    pub fn elements(&self) -> impl Iterator<Item = Element> + '_ {
        self.graph.node_weights().copied()
    }

    /// Bonds as `(source, target, bond)` in insertion order.
    pub fn bonds(&self) -> impl Iterator<Item = (usize, usize, Bond)> + '_ {
        self.graph
            .edge_references()
            .map(|e| (e.source().index(), e.target().index(), *e.weight()))
    }

    pub fn bond_between(&self, a: usize, b: usize) -> Option<Bond> {
        if a.max(b) >= self.atom_count() {
            return None;
        }
        self.graph
            .find_edge(NodeIndex::new(a), NodeIndex::new(b))
            .map(|e| self.graph[e])
    }

    /// Sum of the orders of the bonds at `atom`.
    pub fn bond_order_sum(&self, atom: usize) -> u32 {
        self.graph
            .edges(NodeIndex::new(atom))
            .map(|e| e.weight().order())
            .sum()
    }

    pub fn is_connected(&self) -> bool {
        is_connected(&self.graph)
    }

    /// Return `true` iff deleting `atom` would disconnect the other atoms.
    pub fn is_cut_atom(&self, atom: usize) -> bool {
        !is_connected_without(&self.graph, NodeIndex::new(atom))
    }

    /// Append an atom and return its index.
    pub fn add_atom(&mut self, element: Element) -> usize {
        self.graph.add_node(element).index()
    }

    /// Bond `a` to `b`, rejecting self loops, repeated bonds and unknown
    /// atoms.
    pub fn add_bond(&mut self, a: usize, b: usize, bond: Bond) -> Result<(), Error> {
        let count = self.atom_count();
        if let Some(index) = [a, b].into_iter().find(|&i| i >= count) {
            return Err(Error::AtomIndex { index, count });
        }
        if a == b {
            return Err(Error::SelfLoop(a));
        }
        if self.bond_between(a, b).is_some() {
            return Err(Error::DuplicateBond(a, b));
        }
        self.graph
            .add_edge(NodeIndex::new(a), NodeIndex::new(b), bond);
        Ok(())
    }

    /// Copy of this molecule with one more atom of type `element`, bonded to
    /// atom `i` with order `bond_orders[i]` wherever that is non-zero.
    pub fn with_atom(&self, element: Element, bond_orders: &[u32]) -> Result<Molecule, Error> {
        if bond_orders.len() != self.atom_count() {
            return Err(Error::ExtensionLength {
                expected: self.atom_count(),
                found: bond_orders.len(),
            });
        }
        let mut child = self.clone();
        let new = child.add_atom(element);
        for (i, &order) in bond_orders.iter().enumerate() {
            if order > 0 {
                let bond = Bond::try_from(order).map_err(|_| Error::BondOrder(order))?;
                child.add_bond(i, new, bond)?;
            }
        }
        Ok(child)
    }

    /// Copy of this molecule with one more bond, every bond stored as
    /// `(smaller, larger)` and sorted by that pair.
    pub fn with_bond(&self, a: usize, b: usize, bond: Bond) -> Result<Molecule, Error> {
        let mut scratch = self.clone();
        scratch.add_bond(a, b, bond)?;
        let mut bonds: Vec<_> = scratch
            .bonds()
            .map(|(x, y, bond)| (x.min(y), x.max(y), bond))
            .collect();
        bonds.sort();
        let mut child = Molecule::from_elements(self.elements());
        for (x, y, bond) in bonds {
            child.add_bond(x, y, bond)?;
        }
        Ok(child)
    }

    /// Copy of this molecule with atom `v` moved to index `labeling[v]`.
    /// Bonds are stored `(smaller, larger)`, ordered by larger then smaller
    /// atom, as if the molecule had been grown atom by atom.
    pub fn relabel(&self, labeling: &Permutation) -> Result<Molecule, Error> {
        if labeling.len() != self.atom_count() {
            return Err(Error::DegreeMismatch {
                expected: self.atom_count(),
                found: labeling.len(),
            });
        }
        let elements: Vec<Element> = self.elements().collect();
        let mut bonds: Vec<_> = self
            .bonds()
            .map(|(a, b, bond)| {
                let (x, y) = (labeling.get(a), labeling.get(b));
                (x.max(y), x.min(y), bond)
            })
            .collect();
        bonds.sort();
        let mut relabeled = Molecule::from_elements(labeling.apply_to(&elements));
        for (y, x, bond) in bonds {
            relabeled.add_bond(x, y, bond)?;
        }
        Ok(relabeled)
    }
}

/// Text form `C0C1C2 0:1(1),0:2(2)`: each atom's symbol followed by its
/// index, then the bonds in storage order.
impl Display for Molecule {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for (i, e) in self.elements().enumerate() {
            write!(f, "{e}{i}")?;
        }
        for (k, (a, b, bond)) in self.bonds().enumerate() {
            let sep = if k == 0 { " " } else { "," };
            write!(f, "{sep}{a}:{b}({})", bond.order())?;
        }
        Ok(())
    }
}

impl FromStr for Molecule {
    type Err = ParseError;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        loader::parse_molecule_str(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn element_to_string() {
        assert!(Element::Chlorine.to_string() == "Cl")
    }

    #[test]
    fn element_from_string() {
        assert!(str::parse("H") == Ok(Element::Hydrogen));
        assert!(str::parse::<Element>("Foo").is_err());
    }

    #[test]
    fn elements_order_by_atomic_number() {
        assert!(Element::Carbon < Element::Nitrogen);
        assert!(Element::Oxygen < Element::Sulfur);
    }

    #[test]
    fn bond_orders() {
        assert_eq!(Bond::try_from(2), Ok(Bond::Double));
        assert!(Bond::try_from(0).is_err());
        assert!(Bond::try_from(4).is_err());
        assert_eq!(Bond::Triple.order(), 3);
    }

    #[test]
    fn add_bond_rejects_bad_input() {
        let mut mol = Molecule::from_elements([Element::Carbon, Element::Carbon]);
        assert_eq!(mol.add_bond(0, 0, Bond::Single), Err(Error::SelfLoop(0)));
        assert_eq!(
            mol.add_bond(0, 2, Bond::Single),
            Err(Error::AtomIndex { index: 2, count: 2 })
        );
        mol.add_bond(0, 1, Bond::Single).unwrap();
        assert_eq!(
            mol.add_bond(1, 0, Bond::Double),
            Err(Error::DuplicateBond(1, 0))
        );
    }

    #[test]
    fn with_atom_copies() {
        let parent = Molecule::from_elements([Element::Carbon, Element::Carbon]);
        let child = parent.with_atom(Element::Oxygen, &[2, 0]).unwrap();
        assert_eq!(parent.atom_count(), 2);
        assert_eq!(parent.bond_count(), 0);
        assert_eq!(child.to_string(), "C0C1O2 0:2(2)");
        assert_eq!(child.bond_order_sum(0), 2);
        assert!(parent.with_atom(Element::Oxygen, &[1]).is_err());
        assert_eq!(
            parent.with_atom(Element::Oxygen, &[4, 0]).unwrap_err(),
            Error::BondOrder(4)
        );
    }

    #[test]
    fn with_bond_sorts_bonds() {
        let mol: Molecule = "C0C1C2 1:2(1)".parse().unwrap();
        let child = mol.with_bond(1, 0, Bond::Double).unwrap();
        assert_eq!(child.to_string(), "C0C1C2 0:1(2),1:2(1)");
    }

    #[test]
    fn cut_atoms_of_propane() {
        let mol: Molecule = "C0C1C2 0:1(1),1:2(1)".parse().unwrap();
        assert!(!mol.is_cut_atom(0));
        assert!(mol.is_cut_atom(1));
        assert!(!mol.is_cut_atom(2));
        assert!(mol.is_connected());
    }

    #[test]
    fn relabel_moves_atoms() {
        let mol: Molecule = "O0C1C2 0:1(1),1:2(1)".parse().unwrap();
        let p = Permutation::from_images(vec![2, 0, 1]).unwrap();
        let relabeled = mol.relabel(&p).unwrap();
        assert_eq!(relabeled.to_string(), "C0C1O2 0:1(1),0:2(1)");
    }

    #[test]
    fn display_without_bonds() {
        let mol = Molecule::from_elements([Element::Carbon]);
        assert_eq!(mol.to_string(), "C0");
    }
}
